//! The per-node, per-second CSV row.
//!
//! Column names match the historical output format so downstream analysis
//! scripts keep working; serde renames map them onto idiomatic field names.

use serde::{Deserialize, Serialize};

/// One row of the per-node CSV, emitted every simulated second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    /// Simulation second this row closes.
    pub sim_second: f64,

    pub tasks_assigned: u32,
    pub tasks_failed: u32,

    /// Control-plane megabits received this window, per interface.
    #[serde(rename = "mbsDisc")]
    pub mbs_disc: f64,
    #[serde(rename = "mbsWDDisc")]
    pub mbs_wd_disc: f64,
    /// Application megabits received this window, per interface.
    #[serde(rename = "mbsApp")]
    pub mbs_app: f64,
    #[serde(rename = "mbsWDApp")]
    pub mbs_wd_app: f64,

    /// Running mean rates since the first packet of each class, Mbps.
    #[serde(rename = "throughputDisc")]
    pub throughput_disc: f64,
    #[serde(rename = "throughputWDDisc")]
    pub throughput_wd_disc: f64,
    #[serde(rename = "throughputApp")]
    pub throughput_app: f64,
    #[serde(rename = "throughputWDApp")]
    pub throughput_wd_app: f64,

    /// Packets delivered to the sinks this window.
    pub pkt_rx_disc: u32,
    pub pkt_rx_wd_disc: u32,
    pub pkt_rx_app: u32,
    pub pkt_rx_wd_app: u32,

    /// Highest application sequence number seen this window.
    pub seq: u32,
    pub seq_wd: u32,

    /// Last observed PHY rates, Mbps.
    pub tx_rate: f64,
    pub tx_rate_wd: f64,
    pub rx_rate: f64,
    pub rx_rate_wd: f64,

    /// Last application packet delay sample this window, seconds.
    pub delay: f64,
    pub delay_wd: f64,

    /// PHY-tap packet counts this window: application class...
    pub tx_app: u64,
    pub tx_app_wd: u64,
    pub rx_app: u64,
    pub rx_app_wd: u64,

    /// ...and discovery/control class.
    pub tx: u64,
    pub tx_wd: u64,
    pub rx: u64,
    pub rx_wd: u64,
}
