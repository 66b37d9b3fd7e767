//! End-to-end mail delivery probe
//!
//! Sends a uniquely tagged message through an SMTP server, then polls
//! the recipient's INBOX over IMAP until the message shows up or a
//! retry budget runs out. The result carries the outcome, the number
//! of mailbox checks, and timestamps for each phase, and can be
//! rendered as JSON or as an `InfluxDB` line for monitoring.
//!
//! ```no_run
//! use mail_probe::{
//!     Credentials, Endpoint, ImapConfig, Probe, ProbeConfig, SmtpConfig, TlsMode, report,
//! };
//! use std::time::Duration;
//!
//! # async fn run() -> mail_probe::Result<()> {
//! let config = ProbeConfig {
//!     smtp: SmtpConfig {
//!         endpoint: Endpoint::new("smtp.example.com", 587, TlsMode::StartTls),
//!         credentials: Some(Credentials::new("probe@example.com", "secret")),
//!     },
//!     imap: ImapConfig {
//!         endpoint: Endpoint::new("imap.example.com", 993, TlsMode::Tls),
//!         credentials: Credentials::new("inbox@example.com", "secret"),
//!     },
//!     email_from: "probe@example.com".into(),
//!     email_to: "inbox@example.com".into(),
//!     subject_prefix: mail_probe::DEFAULT_PREFIX.into(),
//!     check_frequency: Duration::from_secs(2),
//!     max_checks: 30,
//! };
//!
//! let result = Probe::new(&config).run().await?;
//! println!("{}", report::influx_line(&config, &result));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod imap;
mod message;
mod net;
mod probe;
pub mod report;
pub mod smtp;
mod timeline;
mod tls_mode;
mod token;

pub use config::{
    Credentials, DEFAULT_CHECK_FREQUENCY, DEFAULT_IMAP_PORT, DEFAULT_MAX_CHECKS, DEFAULT_PREFIX,
    DEFAULT_SMTP_PORT, Endpoint, ImapConfig, ProbeConfig, SmtpConfig,
};
pub use error::{Error, Result};
pub use imap::{Inbox, PollOutcome};
pub use message::{ProbeMessage, SUBJECT_DELIMITER};
pub use net::local_hostname;
pub use probe::{Probe, ProbeResult};
pub use report::OutputFormat;
pub use timeline::{Timeline, iso8601};
pub use tls_mode::TlsMode;
pub use token::{Token, TokenSeed};
