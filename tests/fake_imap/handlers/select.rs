//! SELECT command handler.
//!
//! The fake server has a single mailbox, INBOX. Selecting it reports:
//!
//! - `* N EXISTS` -- number of messages.
//! - `* OK [UIDVALIDITY V]` -- constant, UIDs are never reset.
//! - `* OK [UIDNEXT U]` -- the UID the next delivery will get.
//!
//! Any other name gets `NO`.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle SELECT. Returns whether INBOX is now selected.
pub async fn handle_select<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    if !folder_name.eq_ignore_ascii_case("INBOX") {
        let resp = format!("{tag} NO Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return false;
    }

    let lines = [
        "* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n".to_string(),
        format!("* {} EXISTS\r\n", mailbox.messages.len()),
        "* 0 RECENT\r\n".to_string(),
        "* OK [UIDVALIDITY 1]\r\n".to_string(),
        format!("* OK [UIDNEXT {}]\r\n", mailbox.uid_next()),
        "* OK [PERMANENTFLAGS (\\Seen \\Deleted)] Limited\r\n".to_string(),
        format!("{tag} OK [READ-WRITE] SELECT completed\r\n"),
    ];
    for line in &lines {
        if write_line(stream, line).await.is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::io::capture;

    async fn run(folder_name: &str, mailbox: &Mailbox) -> (String, bool) {
        capture(|mut s| async move {
            let ok = handle_select("A1", folder_name, mailbox, &mut s).await;
            (s, ok)
        })
        .await
    }

    #[tokio::test]
    async fn selects_inbox() {
        let mut mailbox = Mailbox::new();
        mailbox.deliver(b"Subject: one\r\n\r\n");
        mailbox.deliver(b"Subject: two\r\n\r\n");

        let (output, ok) = run("INBOX", &mailbox).await;

        assert!(ok);
        assert!(output.contains("* 2 EXISTS"));
        assert!(output.contains("[UIDNEXT 3]"));
        assert!(output.ends_with("A1 OK [READ-WRITE] SELECT completed\r\n"));
    }

    #[tokio::test]
    async fn other_folders_do_not_exist() {
        let (output, ok) = run("Archive", &Mailbox::new()).await;

        assert!(!ok);
        assert!(output.contains("A1 NO Folder not found"));
    }
}
