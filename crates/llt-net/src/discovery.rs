//! Discovery-plane protocol logic.
//!
//! The protocol is two messages per interface:
//!
//! 1. Every `service_period ± 1 s` each node **broadcasts** a DISCOVERY
//!    carrying its address on that interface and its predicted next region.
//! 2. A receiver whose own prediction matches **unicasts** a REPLY back with
//!    its prediction, dwell interval, and CPU speed, and records the sender
//!    in its routing table.  A mismatched prediction drops the packet — the
//!    filter encodes "we expect to co-locate".
//! 3. REPLY receipt records the responder symmetrically and computes the
//!    link lifetime from the two dwell predictions.
//!
//! Handlers here are pure table transitions: they take the decoded header,
//! the receiver's own state, and the routing table, and return what should
//! be sent in response.  The experiment crate owns sockets, timers, and the
//! broadcast medium, which keeps every rule in this file testable without a
//! simulator.

use std::net::Ipv4Addr;

use llt_core::{NodeRng, RegionId, SimTime, Vec3};
use llt_mobility::Interval;
use log::debug;

use crate::lifetime::link_lifetime_secs;
use crate::rtable::{RouteEntry, RouteTable};
use crate::wire::{DiscoveryHeader, ReplyHeader};

// ── Receiver state ────────────────────────────────────────────────────────────

/// The receiving node's side of a handler invocation.
#[derive(Copy, Clone, Debug)]
pub struct ReceiverState {
    /// The receiver's address on the interface the packet arrived on.
    pub my_addr: Ipv4Addr,
    /// The receiver's current position.
    pub my_location: Vec3,
    /// The receiver's predicted next region.
    pub predicted_location: RegionId,
    /// The receiver's predicted next dwell interval.
    pub predicted_interval: Interval,
    /// The receiver's CPU speed, GHz.
    pub cpu_speed: f64,
}

// ── Send side ─────────────────────────────────────────────────────────────────

/// Per-node, per-run send-side state: the broadcast cadence and whether the
/// application is running.
///
/// Starting the service opens both interface sockets and arms the first
/// broadcast; stopping cancels the pending broadcast and closes the sockets.
/// The experiment holds the pending event handle — this type only answers
/// "should I send" and "when next".
pub struct DiscoveryService {
    period: SimTime,
    running: bool,
}

impl DiscoveryService {
    pub fn new(period: SimTime) -> Self {
        Self { period, running: false }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Delay until the next broadcast: the service period plus `U[-1, +1] s`
    /// of jitter, floored at zero.
    pub fn next_delay(&self, rng: &mut NodeRng) -> SimTime {
        let jitter: f64 = rng.gen_range(-1.0..1.0);
        SimTime::from_secs_f64(self.period.as_secs_f64() + jitter)
    }

    /// The DISCOVERY header to broadcast on one interface.
    pub fn announcement(my_addr: Ipv4Addr, predicted: RegionId) -> DiscoveryHeader {
        DiscoveryHeader::new(my_addr, predicted.0 as u32)
    }
}

// ── Receive side ──────────────────────────────────────────────────────────────

/// Process a received DISCOVERY.
///
/// Applies the prediction-agreement filter, then inserts or refreshes the
/// sender's row in `table`.  Returns the REPLY to unicast back to the
/// sender, or `None` when the predictions disagree.
pub fn handle_discovery(
    table: &mut RouteTable,
    header: &DiscoveryHeader,
    rx: &ReceiverState,
    peer_location: Vec3,
    now: SimTime,
) -> Option<ReplyHeader> {
    if header.next_location != rx.predicted_location.0 as u32 {
        debug!(
            "{}: ignoring discovery from {} (they predict {}, we predict {})",
            rx.my_addr, header.src, header.next_location, rx.predicted_location
        );
        return None;
    }

    match table.lookup_mut(header.src, rx.my_addr) {
        None => {
            table.insert(RouteEntry::first_contact(
                rx.my_addr,
                header.src,
                now,
                rx.my_location,
                peer_location,
                header.next_location as u16,
            ));
            debug!("{}: new neighbor {} on discovery", rx.my_addr, header.src);
        }
        Some(entry) => {
            entry.touch(now);
            entry.my_location = rx.my_location;
            entry.peer_location = peer_location;
            entry.next_location = header.next_location as u16;
        }
    }

    Some(ReplyHeader {
        src: rx.my_addr,
        dst: header.src,
        next_location: rx.predicted_location.0 as u16,
        next_interval: rx.predicted_interval.to_wire(),
        cpu_speed: rx.cpu_speed,
    })
}

/// Process a received REPLY.
///
/// Records the responder's prediction and CPU speed and stores the link
/// lifetime derived from both sides' dwell predictions.  Returns the
/// computed lifetime in seconds.
pub fn handle_reply(
    table: &mut RouteTable,
    header: &ReplyHeader,
    rx: &ReceiverState,
    peer_location: Vec3,
    now: SimTime,
) -> f64 {
    let theirs = Interval::from_wire(header.next_interval);
    let llt = link_lifetime_secs(rx.predicted_interval, theirs);

    match table.lookup_mut(header.src, rx.my_addr) {
        None => {
            let mut entry = RouteEntry::first_contact(
                rx.my_addr,
                header.src,
                now,
                rx.my_location,
                peer_location,
                header.next_location,
            );
            entry.next_interval = theirs;
            entry.link_lifetime = llt;
            entry.peer_cpu_speed = header.cpu_speed;
            table.insert(entry);
            debug!("{}: new neighbor {} on reply, llt {llt}s", rx.my_addr, header.src);
        }
        Some(entry) => {
            entry.touch(now);
            entry.next_location = header.next_location;
            entry.next_interval = theirs;
            entry.link_lifetime = llt;
            entry.peer_cpu_speed = header.cpu_speed;
        }
    }

    llt
}
