//! Error types for mail-probe

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the probe itself could not run.
    ///
    /// Everything except a configuration problem is a transport
    /// failure: the servers could not be reached, refused the
    /// handshake, or rejected a command.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
