//! Top-level experiment configuration.
//!
//! Typically built from CLI arguments by the application crate and passed to
//! the experiment runner.  Serde derives let batch tooling round-trip configs
//! through JSON without the simulator caring.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Iface, SimTime};

/// Per-interface radio parameters for the timed message bus.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Nominal transmission rate, Mbps.
    pub rate_mbps: f64,
    /// Maximum sender→receiver distance for delivery, metres.
    pub range_m: f64,
    /// Independent per-frame drop probability in `[0, 1]`.
    pub loss: f64,
}

impl RadioConfig {
    /// Defaults for one interface: its nominal PHY rate, a range generous
    /// enough to span the whole arena, and a lossless channel.
    pub fn for_iface(iface: Iface) -> Self {
        Self {
            rate_mbps: iface.nominal_rate_mbps(),
            range_m: 750.0,
            loss: 0.0,
        }
    }
}

/// Allocator behavior switches.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AllocOptions {
    /// Try candidates in descending peer-CPU-speed order instead of table
    /// order.
    pub sort_by_cpu_speed: bool,
    /// Ignore link lifetimes and bound transfer windows by the deadline
    /// alone ("use-max-CPU" mode).
    pub use_max_cpu: bool,
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fleet size.
    pub nodes: u16,

    /// Total simulated time.
    pub total_time: SimTime,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Base discovery broadcast period; each round adds `U[-1, +1] s` of
    /// jitter.
    pub service_period: SimTime,

    /// When the allocator first runs.
    pub allocator_start: SimTime,

    /// Per-node metrics row cadence.
    pub metrics_interval: SimTime,

    /// Routing entries older than this (since last packet) are reported by
    /// the inactivity sweep.
    pub inactive_after: SimTime,

    /// Base name for per-node CSV output (`node<i>-<name>`).
    pub csv_file_name: String,

    /// Emit a course-change trace CSV.
    pub trace_mobility: bool,

    /// Radio parameters for the W interface.
    pub radio_w: RadioConfig,

    /// Radio parameters for the WD interface.
    pub radio_wd: RadioConfig,

    /// Allocator switches.
    pub alloc: AllocOptions,
}

impl SimConfig {
    /// Radio parameters for `iface`.
    #[inline]
    pub fn radio(&self, iface: Iface) -> &RadioConfig {
        match iface {
            Iface::W => &self.radio_w,
            Iface::Wd => &self.radio_wd,
        }
    }

    /// Reject configurations the experiment cannot bring up.
    ///
    /// The 254-node ceiling comes from the /24 address plan: host part 0 is
    /// the network address and 255 the broadcast.
    pub fn validate(&self) -> CoreResult<()> {
        if self.nodes == 0 || self.nodes > 254 {
            return Err(CoreError::Config(format!(
                "node count {} outside 1..=254",
                self.nodes
            )));
        }
        if self.total_time == SimTime::ZERO {
            return Err(CoreError::Config("total_time must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.radio_w.loss) || !(0.0..=1.0).contains(&self.radio_wd.loss)
        {
            return Err(CoreError::Config("loss probability outside [0, 1]".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nodes: 5,
            total_time: SimTime::from_secs(250),
            seed: 1,
            service_period: SimTime::from_secs(1),
            allocator_start: SimTime::from_secs(10),
            metrics_interval: SimTime::from_secs(1),
            inactive_after: SimTime::from_secs(5),
            csv_file_name: "manet-sim.output.csv".to_owned(),
            trace_mobility: true,
            radio_w: RadioConfig::for_iface(Iface::W),
            radio_wd: RadioConfig::for_iface(Iface::Wd),
            alloc: AllocOptions::default(),
        }
    }
}
