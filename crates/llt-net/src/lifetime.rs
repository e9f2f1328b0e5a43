//! Link-lifetime estimation.
//!
//! Two nodes stay reachable roughly as long as both keep dwelling where
//! they are, so the expected lifetime of a link is bounded by the shorter
//! of the two predicted dwell windows.

use llt_mobility::Interval;

/// Expected remaining connectivity window between two nodes, seconds.
///
/// `mine` is the receiver's own predicted dwell interval, `theirs` the one
/// advertised in the peer's REPLY.
#[inline]
pub fn link_lifetime_secs(mine: Interval, theirs: Interval) -> f64 {
    mine.pause_secs().min(theirs.pause_secs())
}
