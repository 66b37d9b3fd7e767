//! IMAP side of the probe: connect, log in, open INBOX, and wait for
//! the probe message to show up.

mod poll;

pub use poll::PollOutcome;

use crate::config::{Endpoint, ImapConfig};
use crate::error::{Error, Result};
use crate::message::ProbeMessage;
use crate::timeline::Timeline;
use crate::net::{self, BoxedStream};
use crate::tls_mode::TlsMode;
use crate::token::Token;
use async_imap::Session;
use futures::{StreamExt, TryStreamExt};
use poll::MailSearch;
use std::time::Duration;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

/// The only mailbox the probe looks at.
pub const INBOX: &str = "INBOX";

/// An authenticated IMAP session, plain or encrypted.
type ImapSession = Session<Compat<BoxedStream>>;

/// Open a fresh session with INBOX selected.
///
/// # Errors
///
/// Returns a transport error if the connection, STARTTLS, TLS
/// handshake, LOGIN, or SELECT fails.
pub async fn connect(config: &ImapConfig) -> Result<Inbox> {
    let stream = open_stream(&config.endpoint).await?;
    let client = async_imap::Client::new(stream.compat());

    let mut session = client
        .login(&config.credentials.username, &config.credentials.password)
        .await
        .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

    if let Err(e) = session.select(INBOX).await {
        session.logout().await.ok();
        return Err(Error::Imap(format!("Failed to select {INBOX}: {e}")));
    }

    info!("Connected to IMAP server {}", config.endpoint.address());
    Ok(Inbox { session })
}

/// Connect and secure the stream according to the endpoint's mode.
async fn open_stream(endpoint: &Endpoint) -> Result<BoxedStream> {
    let tcp = net::connect_tcp(endpoint).await?;

    match endpoint.tls {
        TlsMode::None => Ok(Box::new(tcp)),
        TlsMode::Tls => Ok(Box::new(net::upgrade(endpoint, tcp).await?)),
        TlsMode::StartTls => {
            let mut client = async_imap::Client::new(tcp.compat());
            client
                .run_command_and_check_ok("STARTTLS", None)
                .await
                .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;

            let tcp = client.into_inner().into_inner();
            Ok(Box::new(net::upgrade(endpoint, tcp).await?))
        }
    }
}

/// INBOX of a logged-in session.
pub struct Inbox {
    session: ImapSession,
}

impl Inbox {
    /// Check for `message` until it is found or `max_checks` checks
    /// came up empty, sleeping `check_frequency` between checks.
    ///
    /// A found message is flagged `\Deleted` and expunged. The session
    /// is closed and logged out whatever the outcome. The outcome's
    /// `finished_at` is marked on `timeline` as soon as polling ends,
    /// before any of that cleanup.
    ///
    /// # Errors
    ///
    /// Returns a transport error if SEARCH, FETCH or STORE fails.
    pub async fn poll(
        mut self,
        timeline: &mut Timeline,
        token: &Token,
        message: &ProbeMessage,
        max_checks: u32,
        check_frequency: Duration,
    ) -> Result<PollOutcome> {
        poll::run(
            &mut self,
            timeline,
            token,
            message,
            max_checks,
            check_frequency,
        )
        .await
    }
}

impl MailSearch for Inbox {
    async fn search_subject(&mut self, token: &str) -> Result<Vec<u32>> {
        let uids = self
            .session
            .uid_search(format!("SUBJECT \"{token}\""))
            .await
            .map_err(|e| Error::Imap(format!("Search failed: {e}")))?;

        let mut uid_list: Vec<u32> = uids.into_iter().collect();
        uid_list.sort_unstable();
        Ok(uid_list)
    }

    async fn fetch_header(&mut self, uid: u32) -> Result<Option<Vec<u8>>> {
        let mut messages = self
            .session
            .uid_fetch(uid.to_string(), "RFC822.HEADER")
            .await
            .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?;

        let mut header = None;
        while let Some(msg_result) = messages.next().await {
            let msg = msg_result.map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;
            if header.is_none() && msg.uid.is_none_or(|u| u == uid) {
                header = msg.header().map(<[u8]>::to_vec);
            }
        }
        Ok(header)
    }

    async fn mark_deleted(&mut self, uid: u32) -> Result<()> {
        self.session
            .uid_store(uid.to_string(), "+FLAGS (\\Deleted)")
            .await
            .map_err(|e| Error::Imap(format!("Store failed: {e}")))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| Error::Imap(format!("Store error: {e}")))?;
        debug!("Flagged UID {} as deleted", uid);
        Ok(())
    }

    async fn release(&mut self) {
        if let Err(e) = self.session.close().await {
            warn!("CLOSE failed: {e}");
        }
        if let Err(e) = self.session.logout().await {
            warn!("LOGOUT failed: {e}");
        }
    }
}
