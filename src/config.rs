//! Probe configuration

use crate::error::{Error, Result};
use crate::tls_mode::TlsMode;
use std::time::Duration;

/// Default subject prefix for probe messages.
pub const DEFAULT_PREFIX: &str = "[e2e email monitoring] ";
/// Default SMTP submission port.
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// Default IMAP port.
pub const DEFAULT_IMAP_PORT: u16 = 143;
/// Default wait between two mailbox checks.
pub const DEFAULT_CHECK_FREQUENCY: Duration = Duration::from_secs(2);
/// Default number of mailbox checks before giving up.
pub const DEFAULT_MAX_CHECKS: u32 = 30;

/// A server to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    /// Skip certificate verification (self-signed test servers).
    pub accept_invalid_certs: bool,
}

impl Endpoint {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, tls: TlsMode) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            accept_invalid_certs: false,
        }
    }

    /// `host:port`, as passed to `TcpStream::connect`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self, what: &str) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config(format!("{what} host is empty")));
        }
        if self.port == 0 {
            return Err(Error::Config(format!("{what} port must not be 0")));
        }
        Ok(())
    }
}

/// Username/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP submission settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub endpoint: Endpoint,
    /// Authenticate only when present with a non-empty username.
    pub credentials: Option<Credentials>,
}

impl SmtpConfig {
    /// Credentials to authenticate with, if any.
    #[must_use]
    pub fn login(&self) -> Option<&Credentials> {
        self.credentials
            .as_ref()
            .filter(|c| !c.username.is_empty())
    }
}

/// IMAP retrieval settings. Login is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapConfig {
    pub endpoint: Endpoint,
    pub credentials: Credentials,
}

/// Everything one probe run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub smtp: SmtpConfig,
    pub imap: ImapConfig,
    pub email_from: String,
    pub email_to: String,
    pub subject_prefix: String,
    /// Wait between two mailbox checks.
    pub check_frequency: Duration,
    /// Number of mailbox checks before the probe is reported failed.
    pub max_checks: u32,
}

impl ProbeConfig {
    /// Check the invariants the probe relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty host, a missing or
    /// malformed address, a zero port, an empty IMAP username, or
    /// `max_checks == 0`.
    pub fn validate(&self) -> Result<()> {
        self.smtp.endpoint.validate("SMTP")?;
        self.imap.endpoint.validate("IMAP")?;

        if self.imap.credentials.username.is_empty() {
            return Err(Error::Config("IMAP username is empty".into()));
        }
        if self.email_from.trim().is_empty() {
            return Err(Error::Config("from address is empty".into()));
        }
        if self.email_to.trim().is_empty() {
            return Err(Error::Config("to address is empty".into()));
        }
        for (what, addr) in [("from", &self.email_from), ("to", &self.email_to)] {
            addr.parse::<lettre::Address>()
                .map_err(|e| Error::Config(format!("{what} address {addr:?}: {e}")))?;
        }
        if self.max_checks == 0 {
            return Err(Error::Config("max checks must be at least 1".into()));
        }
        Ok(())
    }
}
