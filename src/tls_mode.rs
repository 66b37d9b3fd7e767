//! Transport security modes
//!
//! Each endpoint is reached in one of three ways: plaintext, TLS
//! from the first byte (implicit TLS, e.g. SMTPS 465 / IMAPS 993), or
//! plaintext upgraded in-band with STARTTLS (e.g. 587 / 143).

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the connection to an endpoint is secured.
///
/// # Examples
///
/// ```
/// use mail_probe::TlsMode;
///
/// let mode: TlsMode = "starttls".parse().unwrap();
/// assert_eq!(mode, TlsMode::StartTls);
/// assert_eq!(mode.as_str(), "starttls");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plaintext for the whole session.
    None,
    /// TLS handshake immediately after the TCP connect.
    Tls,
    /// Plaintext greeting, then an in-band upgrade.
    #[default]
    StartTls,
}

impl TlsMode {
    /// The command-line name of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::StartTls => "starttls",
        }
    }

    /// Whether the TCP stream starts out in plaintext.
    #[must_use]
    pub const fn starts_plain(self) -> bool {
        matches!(self, Self::None | Self::StartTls)
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else if s.eq_ignore_ascii_case("tls") {
            Ok(Self::Tls)
        } else if s.eq_ignore_ascii_case("starttls") {
            Ok(Self::StartTls)
        } else {
            Err(Error::Config(format!(
                "Invalid TLS mode '{s}' (expected none, tls or starttls)"
            )))
        }
    }
}
