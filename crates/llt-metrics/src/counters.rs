//! Per-node measurement state.
//!
//! Two kinds of field live here:
//!
//! - **Window counters** — bytes, packets, sequence numbers, delay samples
//!   accumulated since the last row.  `snapshot` folds them into a
//!   [`MetricsRow`] and resets them.
//! - **Running state** — task totals, last observed PHY rates, first-send
//!   timestamps (throughput denominators).  These survive snapshots.
//!
//! The PHY taps classify every frame by size: at or above
//! [`APP_PACKET_THRESHOLD`] bytes it is an application packet, below it is
//! discovery/control.  That size split is the only classifier the metrics
//! layer has.

use llt_core::{Iface, SimTime};

use crate::MetricsRow;

/// Frames at least this large count as application traffic.
pub const APP_PACKET_THRESHOLD: usize = 500;

/// Per-interface pair of values, indexed by [`Iface`].
#[derive(Clone, Copy, Debug, Default)]
struct PerIface<T> {
    w: T,
    wd: T,
}

impl<T> PerIface<T> {
    fn get(&self, iface: Iface) -> &T {
        match iface {
            Iface::W => &self.w,
            Iface::Wd => &self.wd,
        }
    }

    fn get_mut(&mut self, iface: Iface) -> &mut T {
        match iface {
            Iface::W => &mut self.w,
            Iface::Wd => &mut self.wd,
        }
    }
}

/// All measurement state for one node.
#[derive(Default)]
pub struct NodeCounters {
    // running totals
    tasks_assigned: u32,
    tasks_failed: u32,

    // window byte accumulators (sink side)
    bytes_disc: PerIface<u64>,
    bytes_app: PerIface<u64>,

    // last window's megabit totals — the allocator's "bandwidth in use"
    mbs_disc: PerIface<f64>,
    mbs_app: PerIface<f64>,

    // window packet counts (sink side)
    pkt_rx_disc: PerIface<u32>,
    pkt_rx_app: PerIface<u32>,

    // window app-stream observations
    seq: PerIface<u32>,
    delay_secs: PerIface<f64>,

    // last observed PHY rates (running)
    tx_rate: PerIface<f64>,
    rx_rate: PerIface<f64>,

    // window PHY-tap packet counts
    phy_tx_app: PerIface<u64>,
    phy_rx_app: PerIface<u64>,
    phy_tx_ctl: PerIface<u64>,
    phy_rx_ctl: PerIface<u64>,

    // first-send timestamps per traffic class (running)
    first_disc_tx: PerIface<Option<SimTime>>,
    first_app_tx: PerIface<Option<SimTime>>,

    // undecodable frames dropped (running)
    malformed_drops: u64,
}

impl NodeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Task accounting ───────────────────────────────────────────────────

    pub fn task_assigned(&mut self) {
        self.tasks_assigned += 1;
    }

    pub fn task_failed(&mut self) {
        self.tasks_failed += 1;
    }

    pub fn tasks_assigned(&self) -> u32 {
        self.tasks_assigned
    }

    pub fn tasks_failed(&self) -> u32 {
        self.tasks_failed
    }

    // ── PHY taps ──────────────────────────────────────────────────────────

    /// A frame left this node's radio.
    pub fn on_phy_tx(&mut self, iface: Iface, size: usize, rate_mbps: f64, now: SimTime) {
        self.on_phy_tx_burst(iface, size, 1, rate_mbps, now);
    }

    /// `packets` same-size frames left this node's radio (aggregated app
    /// slices).
    pub fn on_phy_tx_burst(
        &mut self,
        iface: Iface,
        size: usize,
        packets: u64,
        rate_mbps: f64,
        now: SimTime,
    ) {
        *self.tx_rate.get_mut(iface) = rate_mbps;
        if size >= APP_PACKET_THRESHOLD {
            *self.phy_tx_app.get_mut(iface) += packets;
            self.first_app_tx.get_mut(iface).get_or_insert(now);
        } else {
            *self.phy_tx_ctl.get_mut(iface) += packets;
            self.first_disc_tx.get_mut(iface).get_or_insert(now);
        }
    }

    /// A frame reached this node's radio.
    pub fn on_phy_rx(&mut self, iface: Iface, size: usize, rate_mbps: f64) {
        self.on_phy_rx_burst(iface, size, 1, rate_mbps);
    }

    /// `packets` same-size frames reached this node's radio.
    pub fn on_phy_rx_burst(&mut self, iface: Iface, size: usize, packets: u64, rate_mbps: f64) {
        *self.rx_rate.get_mut(iface) = rate_mbps;
        if size >= APP_PACKET_THRESHOLD {
            *self.phy_rx_app.get_mut(iface) += packets;
        } else {
            *self.phy_rx_ctl.get_mut(iface) += packets;
        }
    }

    /// A received frame failed header decoding and was dropped.
    pub fn on_malformed(&mut self) {
        self.malformed_drops += 1;
    }

    pub fn malformed_drops(&self) -> u64 {
        self.malformed_drops
    }

    // ── Sink deliveries ───────────────────────────────────────────────────

    /// Discovery-plane bytes delivered to this node's sink.
    pub fn on_disc_rx(&mut self, iface: Iface, bytes: usize) {
        *self.bytes_disc.get_mut(iface) += bytes as u64;
        *self.pkt_rx_disc.get_mut(iface) += 1;
    }

    /// Application bytes delivered to this node's sink.
    pub fn on_app_rx(
        &mut self,
        iface: Iface,
        bytes: usize,
        packets: u32,
        seq: u32,
        delay_secs: f64,
    ) {
        *self.bytes_app.get_mut(iface) += bytes as u64;
        *self.pkt_rx_app.get_mut(iface) += packets;
        *self.seq.get_mut(iface) = seq;
        *self.delay_secs.get_mut(iface) = delay_secs;
    }

    // ── Allocator inputs ──────────────────────────────────────────────────

    /// Last observed Tx rate on `iface`, Mbps — the allocator's `speed_*`.
    pub fn tx_rate_mbps(&self, iface: Iface) -> f64 {
        *self.tx_rate.get(iface)
    }

    /// Bandwidth consumed during the last window, Mbps (app + control).
    pub fn used_bandwidth_mbps(&self, iface: Iface) -> f64 {
        self.mbs_app.get(iface) + self.mbs_disc.get(iface)
    }

    // ── Snapshot ──────────────────────────────────────────────────────────

    /// Fold the current window into a row and reset the window counters.
    pub fn snapshot(&mut self, now: SimTime) -> MetricsRow {
        let to_mbits = |bytes: u64| bytes as f64 * 8.0 / 1_000_000.0;

        let mbs_disc = to_mbits(self.bytes_disc.w);
        let mbs_wd_disc = to_mbits(self.bytes_disc.wd);
        let mbs_app = to_mbits(self.bytes_app.w);
        let mbs_wd_app = to_mbits(self.bytes_app.wd);

        let rate_since = |mbits: f64, since: Option<SimTime>| {
            let elapsed = now.since(since.unwrap_or(SimTime::ZERO)).as_secs_f64();
            if elapsed > 0.0 { mbits / elapsed } else { 0.0 }
        };

        let row = MetricsRow {
            sim_second: now.as_secs_f64(),
            tasks_assigned: self.tasks_assigned,
            tasks_failed: self.tasks_failed,
            mbs_disc,
            mbs_wd_disc,
            mbs_app,
            mbs_wd_app,
            throughput_disc: rate_since(mbs_disc, self.first_disc_tx.w),
            throughput_wd_disc: rate_since(mbs_wd_disc, self.first_disc_tx.wd),
            throughput_app: rate_since(mbs_app, self.first_app_tx.w),
            throughput_wd_app: rate_since(mbs_wd_app, self.first_app_tx.wd),
            pkt_rx_disc: self.pkt_rx_disc.w,
            pkt_rx_wd_disc: self.pkt_rx_disc.wd,
            pkt_rx_app: self.pkt_rx_app.w,
            pkt_rx_wd_app: self.pkt_rx_app.wd,
            seq: self.seq.w,
            seq_wd: self.seq.wd,
            tx_rate: self.tx_rate.w,
            tx_rate_wd: self.tx_rate.wd,
            rx_rate: self.rx_rate.w,
            rx_rate_wd: self.rx_rate.wd,
            delay: self.delay_secs.w,
            delay_wd: self.delay_secs.wd,
            tx_app: self.phy_tx_app.w,
            tx_app_wd: self.phy_tx_app.wd,
            rx_app: self.phy_rx_app.w,
            rx_app_wd: self.phy_rx_app.wd,
            tx: self.phy_tx_ctl.w,
            tx_wd: self.phy_tx_ctl.wd,
            rx: self.phy_rx_ctl.w,
            rx_wd: self.phy_rx_ctl.wd,
        };

        // last-window megabit totals stay readable for the allocator
        self.mbs_disc = PerIface { w: mbs_disc, wd: mbs_wd_disc };
        self.mbs_app = PerIface { w: mbs_app, wd: mbs_wd_app };

        self.bytes_disc = PerIface::default();
        self.bytes_app = PerIface::default();
        self.pkt_rx_disc = PerIface::default();
        self.pkt_rx_app = PerIface::default();
        self.seq = PerIface::default();
        self.delay_secs = PerIface::default();
        self.phy_tx_app = PerIface::default();
        self.phy_rx_app = PerIface::default();
        self.phy_tx_ctl = PerIface::default();
        self.phy_rx_ctl = PerIface::default();

        row
    }
}
