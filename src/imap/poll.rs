//! The mailbox poll loop
//!
//! ```text
//!            +--------------------------------------+
//!            v                                      |
//!   --> Polling(n) --match--> Found(n)              |
//!            |                                      |
//!            +--no match, n == max--> Exhausted(n)  |
//!            |                                      |
//!            +--no match, n < max--> Waiting(n) ----+  (sleep, n + 1)
//! ```
//!
//! The run ends at the moment a terminal state is reached: that mark is
//! taken before the found message is flagged and before the session is
//! released, so cleanup round trips are not counted as delivery time.
//! Both terminal states release the session before returning, and so
//! does an error raised while polling.

use crate::error::Result;
use crate::message::ProbeMessage;
use crate::timeline::Timeline;
use crate::token::Token;
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info};

/// The mailbox operations the poll loop needs.
pub(crate) trait MailSearch {
    /// UIDs of messages whose subject contains `token`, ascending.
    async fn search_subject(&mut self, token: &str) -> Result<Vec<u32>>;

    /// The raw header block of one message, if the server returned it.
    async fn fetch_header(&mut self, uid: u32) -> Result<Option<Vec<u8>>>;

    /// Flag a message for removal.
    async fn mark_deleted(&mut self, uid: u32) -> Result<()>;

    /// Expunge, log out, and let go of the connection. Best effort.
    async fn release(&mut self);
}

/// How polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub found: bool,
    /// Number of mailbox checks performed, at least 1.
    pub attempts: u32,
    /// When polling reached its terminal state, before cleanup.
    pub finished_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Polling { attempt: u32 },
    Waiting { attempt: u32 },
    Found { attempt: u32, uid: u32 },
    Exhausted { attempt: u32 },
}

impl PollState {
    /// Where a check that found `matched` leads.
    const fn after_check(attempt: u32, matched: Option<u32>, max_checks: u32) -> Self {
        match matched {
            Some(uid) => Self::Found { attempt, uid },
            None if attempt >= max_checks => Self::Exhausted { attempt },
            None => Self::Waiting { attempt },
        }
    }
}

/// Poll until found or exhausted, then release the mailbox.
pub(crate) async fn run<M: MailSearch>(
    mailbox: &mut M,
    timeline: &mut Timeline,
    token: &Token,
    message: &ProbeMessage,
    max_checks: u32,
    check_frequency: Duration,
) -> Result<PollOutcome> {
    let outcome = drive(mailbox, timeline, token, message, max_checks, check_frequency).await;
    mailbox.release().await;
    outcome
}

async fn drive<M: MailSearch>(
    mailbox: &mut M,
    timeline: &mut Timeline,
    token: &Token,
    message: &ProbeMessage,
    max_checks: u32,
    check_frequency: Duration,
) -> Result<PollOutcome> {
    let mut state = PollState::Polling { attempt: 1 };
    let mut finished_at = None;

    loop {
        state = match state {
            PollState::Polling { attempt } => {
                let matched = check(mailbox, token, message).await?;
                debug!("Check {}/{}: {:?}", attempt, max_checks, matched);
                let next = PollState::after_check(attempt, matched, max_checks);
                if !matches!(next, PollState::Waiting { .. }) {
                    finished_at = Some(timeline.mark());
                }
                next
            }
            PollState::Waiting { attempt } => {
                tokio::time::sleep(check_frequency).await;
                PollState::Polling {
                    attempt: attempt + 1,
                }
            }
            PollState::Found { attempt, uid } => {
                let finished_at = finished_at.unwrap_or_else(|| timeline.mark());
                mailbox.mark_deleted(uid).await?;
                info!("Probe message found after {} check(s)", attempt);
                return Ok(PollOutcome {
                    found: true,
                    attempts: attempt,
                    finished_at,
                });
            }
            PollState::Exhausted { attempt } => {
                let finished_at = finished_at.unwrap_or_else(|| timeline.mark());
                info!("Probe message not found after {} check(s)", attempt);
                return Ok(PollOutcome {
                    found: false,
                    attempts: attempt,
                    finished_at,
                });
            }
        };
    }
}

/// One mailbox check: search by token, confirm by full subject.
async fn check<M: MailSearch>(
    mailbox: &mut M,
    token: &Token,
    message: &ProbeMessage,
) -> Result<Option<u32>> {
    for uid in mailbox.search_subject(token.as_str()).await? {
        if let Some(header) = mailbox.fetch_header(uid).await? {
            if message.matches_header(&header) {
                return Ok(Some(uid));
            }
            debug!("UID {} carries the token but not the subject", uid);
        }
    }
    Ok(None)
}
