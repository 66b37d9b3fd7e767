//! UID FETCH command handler.
//!
//! The probe only ever asks for `RFC822.HEADER`, so that is what every
//! fetch returns, as a **counted literal**:
//!
//! ```text
//! * <seq> FETCH (UID <uid> RFC822.HEADER {<length>}
//! <exactly length bytes of header, ending in a blank line>
//! )
//! ```
//!
//! The `{length}\r\n` marker tells the client that the next `length`
//! bytes are raw data, not protocol text. The sequence number is the
//! 1-based position of the message in the mailbox (RFC 3501 Section
//! 7.4.2). Unknown UIDs are silently skipped.

use super::extract_uids;
use crate::fake_imap::io::{write_bytes, write_line};
use crate::fake_imap::mailbox::Mailbox;
use imap_codec::imap_types::sequence::SequenceSet;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle UID FETCH against the selected INBOX.
pub async fn handle_uid_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    sequence_set: &SequenceSet,
    mailbox: &Mailbox,
    selected: bool,
    stream: &mut BufReader<S>,
) {
    if !selected {
        let resp = format!("{tag} BAD No mailbox selected\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    }

    let max_uid = mailbox.messages.iter().map(|m| m.uid).max().unwrap_or(0);

    for uid in extract_uids(sequence_set, max_uid) {
        let Some((idx, message)) = mailbox.find(uid) else {
            continue;
        };
        let header = message.header();
        let prefix = format!(
            "* {} FETCH (UID {uid} RFC822.HEADER {{{}}}\r\n",
            idx + 1,
            header.len()
        );

        if write_line(stream, &prefix).await.is_err()
            || write_bytes(stream, header).await.is_err()
            || write_line(stream, ")\r\n").await.is_err()
        {
            return;
        }
    }

    let resp = format!("{tag} OK FETCH completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::handlers::uid_set;
    use crate::fake_imap::io::capture;

    async fn run(uid: u32, mailbox: &Mailbox, selected: bool) -> String {
        let set = uid_set(uid);
        let set = &set;
        capture(|mut s| async move {
            handle_uid_fetch("A4", set, mailbox, selected, &mut s).await;
            (s, ())
        })
        .await
        .0
    }

    fn mailbox() -> Mailbox {
        let mut mb = Mailbox::new();
        mb.deliver(b"Subject: first\r\n\r\nbody one");
        mb.deliver(b"Subject: second\r\nX-Hash: abc\r\n\r\nbody two");
        mb
    }

    #[tokio::test]
    async fn returns_header_only_as_literal() {
        let output = run(2, &mailbox(), true).await;

        let expected_header = "Subject: second\r\nX-Hash: abc\r\n\r\n";
        assert!(output.starts_with(&format!(
            "* 2 FETCH (UID 2 RFC822.HEADER {{{}}}\r\n{expected_header})\r\n",
            expected_header.len()
        )));
        assert!(!output.contains("body two"));
        assert!(output.ends_with("A4 OK FETCH completed\r\n"));
    }

    #[tokio::test]
    async fn sequence_number_follows_position() {
        let mut mb = mailbox();
        mb.find_mut(1).unwrap().1.deleted = true;
        mb.expunge();

        let output = run(2, &mb, true).await;
        assert!(output.starts_with("* 1 FETCH (UID 2 "));
    }

    #[tokio::test]
    async fn unknown_uid_is_skipped() {
        let output = run(9, &mailbox(), true).await;
        assert_eq!(output, "A4 OK FETCH completed\r\n");
    }

    #[tokio::test]
    async fn requires_selected_mailbox() {
        let output = run(1, &mailbox(), false).await;
        assert!(output.starts_with("A4 BAD"));
    }
}
