//! One end-to-end probe run
//!
//! Compose a tagged message, submit it over SMTP, then poll the
//! recipient's INBOX over IMAP until it arrives or the checks run out.
//! Each phase boundary is timestamped so the report can break the
//! round trip down.

use crate::config::ProbeConfig;
use crate::error::Result;
use crate::message::ProbeMessage;
use crate::timeline::{Timeline, iso8601};
use crate::token::{Token, TokenSeed};
use crate::{imap, net, smtp};
use chrono::{DateTime, Local, TimeDelta};
use tracing::info;

/// What a completed run observed.
///
/// Timestamps are in run order and never decrease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The message came back within the allowed checks.
    pub success: bool,
    pub token: Token,
    pub started_at: DateTime<Local>,
    pub smtp_started_at: DateTime<Local>,
    pub imap_started_at: DateTime<Local>,
    pub search_started_at: DateTime<Local>,
    /// When polling ended, before the mailbox was cleaned up.
    pub finished_at: DateTime<Local>,
    /// Mailbox checks performed.
    pub attempts: u32,
}

impl ProbeResult {
    /// Start of the run to the end of polling.
    #[must_use]
    pub fn total_duration(&self) -> TimeDelta {
        self.finished_at - self.started_at
    }

    /// Start of SMTP submission to the start of the IMAP connection.
    #[must_use]
    pub fn smtp_duration(&self) -> TimeDelta {
        self.imap_started_at - self.smtp_started_at
    }

    /// First mailbox check to the end of polling.
    #[must_use]
    pub fn imap_duration(&self) -> TimeDelta {
        self.finished_at - self.search_started_at
    }
}

/// A probe bound to its configuration.
#[derive(Debug, Clone, Copy)]
pub struct Probe<'a> {
    config: &'a ProbeConfig,
}

impl<'a> Probe<'a> {
    #[must_use]
    pub const fn new(config: &'a ProbeConfig) -> Self {
        Self { config }
    }

    /// Run the probe once.
    ///
    /// A message that never shows up is a normal result with
    /// `success == false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the
    /// configuration is invalid, before any connection is made, and a
    /// transport error if either server cannot be used.
    pub async fn run(&self) -> Result<ProbeResult> {
        let config = self.config;
        config.validate()?;

        let mut timeline = Timeline::new();
        let started_at = timeline.mark();
        let started_iso = iso8601(&started_at);

        let local_host = net::local_hostname();
        let token = Token::generate(&TokenSeed::random(
            &local_host,
            &started_iso,
            &config.smtp.endpoint.host,
            &config.imap.endpoint.host,
            &config.email_from,
            &config.email_to,
        ));
        let message = ProbeMessage::new(
            &token,
            &started_iso,
            &config.subject_prefix,
            &config.email_from,
            &config.email_to,
            &local_host,
        );
        info!("Starting probe {} from {}", token, local_host);

        let smtp_started_at = timeline.mark();
        smtp::send(
            &config.smtp,
            &config.email_from,
            &config.email_to,
            &message,
            &local_host,
        )
        .await?;

        let imap_started_at = timeline.mark();
        let inbox = imap::connect(&config.imap).await?;

        let search_started_at = timeline.mark();
        let outcome = inbox
            .poll(
                &mut timeline,
                &token,
                &message,
                config.max_checks,
                config.check_frequency,
            )
            .await?;

        Ok(ProbeResult {
            success: outcome.found,
            token,
            started_at,
            smtp_started_at,
            imap_started_at,
            search_started_at,
            finished_at: outcome.finished_at,
            attempts: outcome.attempts,
        })
    }
}
