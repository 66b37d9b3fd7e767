//! Probe tokens
//!
//! Every run tags its message with a token that is unique in
//! practice: the MD5 digest of a random number, the local host, the
//! start time, and both endpoints and addresses. The token is not a
//! secret, it only has to be distinct from the tokens of other runs.

use md5::{Digest, Md5};
use std::fmt;

/// Everything that goes into a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSeed {
    pub nonce: u64,
    pub hostname: String,
    /// Start of the run, ISO-8601.
    pub started_at: String,
    pub smtp_host: String,
    pub imap_host: String,
    pub email_from: String,
    pub email_to: String,
}

impl TokenSeed {
    /// Seed a token with a fresh random nonce.
    #[must_use]
    pub fn random(
        hostname: &str,
        started_at: &str,
        smtp_host: &str,
        imap_host: &str,
        email_from: &str,
        email_to: &str,
    ) -> Self {
        Self {
            nonce: rand::random(),
            hostname: hostname.to_string(),
            started_at: started_at.to_string(),
            smtp_host: smtp_host.to_string(),
            imap_host: imap_host.to_string(),
            email_from: email_from.to_string(),
            email_to: email_to.to_string(),
        }
    }
}

/// A 32 character lowercase hex token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Derive the token for a seed. Equal seeds give equal tokens.
    #[must_use]
    pub fn generate(seed: &TokenSeed) -> Self {
        let mut hasher = Md5::new();
        hasher.update(seed.nonce.to_string());
        hasher.update(&seed.hostname);
        hasher.update(&seed.started_at);
        hasher.update(&seed.smtp_host);
        hasher.update(&seed.imap_host);
        hasher.update(&seed.email_from);
        hasher.update(&seed.email_to);
        Self(format!("{:x}", hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
