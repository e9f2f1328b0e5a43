//! `llt-metrics` — what the experiment measures and writes out.
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`counters`] | per-node tallies fed by the PHY taps and app sinks      |
//! | [`row`]      | the per-second CSV row schema                           |
//! | [`csv`]      | one CSV file per node, plus idempotent flushing         |
//! | [`trace`]    | mobility course-change trace                            |
//!
//! Besides producing output, the counter block is the **source of truth**
//! for the allocator: observed Tx rates become `speed_W`/`speed_WD`, and the
//! last window's throughput becomes the bandwidth already in use.

pub mod counters;
pub mod csv;
pub mod error;
pub mod row;
pub mod trace;

#[cfg(test)]
mod tests;

pub use counters::NodeCounters;
pub use csv::MetricsWriter;
pub use error::{MetricsError, MetricsResult};
pub use row::MetricsRow;
pub use trace::MobilityTraceWriter;
