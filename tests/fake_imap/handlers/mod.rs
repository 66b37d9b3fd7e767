//! Handlers for the commands the probe issues, grouped by session
//! phase: LOGIN, SELECT, the three UID commands, then CLOSE and LOGOUT.

mod select;
mod uid_fetch;

pub use login::handle_login;
pub use select::handle_select;
pub use teardown::{handle_close, handle_logout};
pub use uid_fetch::handle_uid_fetch;
pub use uid_search::handle_uid_search;
pub use uid_store::{StoreArgs, handle_uid_store};

use imap_codec::imap_types::sequence::{SeqOrUid, Sequence, SequenceSet};

/// Expand a UID set against the highest UID in the mailbox.
///
/// Supports single values and ranges (`3`, `1:4`, `2:*`).
pub fn extract_uids(seq_set: &SequenceSet, max_uid: u32) -> Vec<u32> {
    let resolve = |s: &SeqOrUid| match s {
        SeqOrUid::Value(v) => v.get(),
        SeqOrUid::Asterisk => max_uid,
    };

    let mut uids = Vec::new();
    for seq in seq_set.0.as_ref() {
        match seq {
            Sequence::Single(s) => uids.push(resolve(s)),
            Sequence::Range(a, b) => {
                let (lo, hi) = (resolve(a), resolve(b));
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                uids.extend(lo..=hi);
            }
        }
    }
    uids
}

/// A UID set holding one UID.
#[cfg(test)]
pub fn uid_set(uid: u32) -> SequenceSet {
    SequenceSet(
        vec![Sequence::Single(SeqOrUid::Value(
            std::num::NonZeroU32::new(uid).unwrap(),
        ))]
        .try_into()
        .unwrap(),
    )
}
