//! CSV output backend: one file per node.
//!
//! Creates `node<i>-<base name>` in the configured output directory, one
//! file per node, each with the 31-column header row.  Rows are serialized
//! via serde, so the schema lives entirely on [`MetricsRow`].

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use llt_core::NodeId;

use crate::{MetricsResult, MetricsRow};

/// Writes per-node metric rows to per-node CSV files.
pub struct MetricsWriter {
    writers: Vec<Writer<File>>,
    finished: bool,
}

impl MetricsWriter {
    /// Open (or create) one CSV per node in `dir`.
    pub fn new(dir: &Path, nodes: usize, base_name: &str) -> MetricsResult<Self> {
        let writers = (0..nodes)
            .map(|i| {
                let path = Self::node_path(dir, i, base_name);
                Ok(Writer::from_path(path)?)
            })
            .collect::<MetricsResult<Vec<_>>>()?;
        Ok(Self { writers, finished: false })
    }

    /// The file a node's rows land in.
    pub fn node_path(dir: &Path, node: usize, base_name: &str) -> PathBuf {
        dir.join(format!("node{node}-{base_name}"))
    }

    /// Append one row to `node`'s file.  The header is written automatically
    /// with the first row.
    pub fn write_row(&mut self, node: NodeId, row: &MetricsRow) -> MetricsResult<()> {
        self.writers[node.index()].serialize(row)?;
        Ok(())
    }

    /// Flush all files.  Idempotent — safe to call more than once.
    pub fn finish(&mut self) -> MetricsResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        for w in &mut self.writers {
            w.flush()?;
        }
        Ok(())
    }
}
