//! The probe message
//!
//! A short plain-text mail whose subject carries the run's start
//! time and token:
//!
//! ```text
//! <prefix> ### 2024-01-15T10:00:00.123456 ### 0cc175b9c0f1b6a831c399e269772661
//! ```
//!
//! The token alone is what the mailbox is searched for. The complete
//! subject is what a fetched header must contain before the message
//! counts as found, so a leftover from another run that happens to
//! share the token is never mistaken for this one.

use crate::token::Token;

/// Separator between the subject's prefix, timestamp and token.
pub const SUBJECT_DELIMITER: &str = " ### ";

const USER_AGENT: &str = "E2E e-mailtest";
const BODY: &str = "This e-mail is part of an end to end test for sending and receiving mail";

/// A composed probe message, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMessage {
    subject: String,
    headers: Vec<String>,
    body: String,
}

impl ProbeMessage {
    /// Compose the message for one run.
    ///
    /// `started_at` is the run's ISO-8601 start time and `local_host`
    /// names the machine sending the probe.
    #[must_use]
    pub fn new(
        token: &Token,
        started_at: &str,
        prefix: &str,
        email_from: &str,
        email_to: &str,
        local_host: &str,
    ) -> Self {
        let subject = format!("{prefix}{SUBJECT_DELIMITER}{started_at}{SUBJECT_DELIMITER}{token}");
        let headers = vec![
            format!("From: e2e test on {local_host} <{email_from}>"),
            format!("To: e2e test party for {local_host} <{email_to}>"),
            format!("Subject: {subject}"),
            format!("User-Agent: {USER_AGENT}"),
            format!("X-Hash: {token}"),
        ];
        Self {
            subject,
            headers,
            body: BODY.to_string(),
        }
    }

    /// The full subject line, without the `Subject:` name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The header block, CRLF separated, without the trailing blank line.
    #[must_use]
    pub fn header_block(&self) -> String {
        self.headers.join("\r\n")
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Headers, blank line, body: the message as handed to DATA.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}\r\n\r\n{}", self.header_block(), self.body).into_bytes()
    }

    /// Whether a fetched header block belongs to this message.
    ///
    /// Folded header lines are unfolded first; the block must then
    /// contain the exact subject.
    #[must_use]
    pub fn matches_header(&self, raw_header: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw_header);
        unfold(&text).contains(&self.subject)
    }
}

/// Undo RFC 5322 header folding: a line break followed by whitespace
/// is a continuation of the previous line.
fn unfold(text: &str) -> String {
    text.replace("\r\n ", " ")
        .replace("\r\n\t", "\t")
        .replace("\n ", " ")
        .replace("\n\t", "\t")
}
