//! `llt-mobility` — how nodes move and how their movement is learned.
//!
//! Three layers, bottom up:
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`region`]   | the five fixed world regions and position→region mapping  |
//! | [`interval`] | categorical dwell-duration buckets (short/medium/long)    |
//! | [`markov`]   | per-node location & dwell transition matrices             |
//! | [`driver`]   | the pause/walk state machine feeding the predictor        |
//!
//! The predictor is a pure data structure: the driver observes transitions
//! and applies the results; nothing in here schedules events or touches a
//! socket.  The experiment crate owns the timers.

pub mod driver;
pub mod interval;
pub mod markov;
pub mod region;

#[cfg(test)]
mod tests;

pub use driver::{Mobility, WalkLeg};
pub use interval::Interval;
pub use markov::Predictor;
pub use region::RegionMap;
