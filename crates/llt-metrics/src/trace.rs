//! Mobility course-change trace.
//!
//! When tracing is enabled, every walk start and arrival appends one row:
//! `(time_s, node, x, y, z)`.  Enough to replay trajectories or plot the
//! arena offline.

use std::fs::File;
use std::path::Path;

use csv::Writer;
use llt_core::{NodeId, SimTime, Vec3};

use crate::MetricsResult;

/// Append-only writer for mobility course changes.
pub struct MobilityTraceWriter {
    writer: Writer<File>,
    finished: bool,
}

impl MobilityTraceWriter {
    pub fn new(path: &Path) -> MetricsResult<Self> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(["time_s", "node", "x", "y", "z"])?;
        Ok(Self { writer, finished: false })
    }

    pub fn record(&mut self, now: SimTime, node: NodeId, pos: Vec3) -> MetricsResult<()> {
        self.writer.write_record(&[
            format!("{:.3}", now.as_secs_f64()),
            node.0.to_string(),
            format!("{:.2}", pos.x),
            format!("{:.2}", pos.y),
            format!("{:.2}", pos.z),
        ])?;
        Ok(())
    }

    /// Flush the file.  Idempotent.
    pub fn finish(&mut self) -> MetricsResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}
