//! The timed message bus standing in for the radio medium.
//!
//! The simulator's scope is the discovery/allocation plane, not PHY/MAC
//! realism, so the medium is reduced to three knobs per interface: a nominal
//! rate (serialization delay and the value the PHY taps observe), a range
//! (delivery cut-off by sender/receiver distance), and an independent
//! per-frame loss probability.
//!
//! The bus computes *who receives what, when*; the experiment turns each
//! delivery into a scheduled event.

use std::net::Ipv4Addr;

use llt_core::{Iface, NodeId, RadioConfig, SimRng, SimTime, Vec3};

/// Fixed propagation delay added to every delivery.
const PROPAGATION: SimTime = SimTime(1);

// ── Frames ────────────────────────────────────────────────────────────────────

/// What a frame carries.
#[derive(Clone, Debug)]
pub enum Payload {
    /// An encoded discovery-plane header (plus padding).
    Control(Vec<u8>),
    /// One slice of an application stream, aggregated into a single frame.
    Data {
        /// Index of the sending stream, for delivery accounting.
        stream: usize,
        /// Highest sequence number in this slice.
        seq: u32,
        sent_at: SimTime,
        bytes: u32,
        packets: u32,
    },
}

/// A frame in flight on one interface.
#[derive(Clone, Debug)]
pub struct Frame {
    pub iface: Iface,
    pub src: Ipv4Addr,
    /// `None` for broadcast.
    pub dst: Option<Ipv4Addr>,
    pub port: u16,
    pub payload: Payload,
}

impl Frame {
    /// On-the-wire size used for serialization delay and the app/control
    /// classifier.
    pub fn size_bytes(&self) -> usize {
        match &self.payload {
            Payload::Control(bytes) => bytes.len(),
            Payload::Data { bytes, .. } => *bytes as usize,
        }
    }
}

// ── Bus ───────────────────────────────────────────────────────────────────────

/// One delivery decision: `to` gets the frame after `delay`.
#[derive(Copy, Clone, Debug)]
pub struct Delivery {
    pub to: NodeId,
    pub delay: SimTime,
}

/// The per-interface radio medium.
pub struct RadioBus {
    w: RadioConfig,
    wd: RadioConfig,
    rng: SimRng,
}

impl RadioBus {
    pub fn new(w: RadioConfig, wd: RadioConfig, rng: SimRng) -> Self {
        Self { w, wd, rng }
    }

    pub fn config(&self, iface: Iface) -> &RadioConfig {
        match iface {
            Iface::W => &self.w,
            Iface::Wd => &self.wd,
        }
    }

    /// Serialization delay of `size` bytes at the interface rate, plus
    /// propagation.
    pub fn tx_delay(&self, iface: Iface, size: usize) -> SimTime {
        let rate = self.config(iface).rate_mbps;
        SimTime::from_secs_f64(size as f64 * 8.0 / (rate * 1_000_000.0)) + PROPAGATION
    }

    /// Whether one frame survives range and loss to `to`.
    fn reaches(&mut self, iface: Iface, from_pos: Vec3, to_pos: Vec3) -> bool {
        let cfg = self.config(iface);
        if from_pos.distance(to_pos) > cfg.range_m {
            return false;
        }
        let loss = cfg.loss;
        loss <= 0.0 || !self.rng.gen_bool(loss)
    }

    /// Deliveries for a broadcast from `from`: every other node in range,
    /// minus losses.
    pub fn broadcast(
        &mut self,
        iface: Iface,
        from: NodeId,
        size: usize,
        positions: &[Vec3],
    ) -> Vec<Delivery> {
        let delay = self.tx_delay(iface, size);
        let from_pos = positions[from.index()];
        (0..positions.len())
            .filter(|&i| i != from.index())
            .filter(|&i| self.reaches(iface, from_pos, positions[i]))
            .map(|i| Delivery { to: NodeId(i as u16), delay })
            .collect()
    }

    /// Delivery for a unicast from `from` to `to`, or `None` when out of
    /// range or lost.
    pub fn unicast(
        &mut self,
        iface: Iface,
        from: NodeId,
        to: NodeId,
        size: usize,
        positions: &[Vec3],
    ) -> Option<Delivery> {
        let delay = self.tx_delay(iface, size);
        self.reaches(iface, positions[from.index()], positions[to.index()])
            .then_some(Delivery { to, delay })
    }
}
