//! The per-interface routing table.
//!
//! One table exists per interface for the whole experiment, holding every
//! node's view rows side by side: the composite key is
//! `(my_addr, peer_addr)`.  The primary index is the peer address; each
//! peer's bucket holds one entry per local address that has heard from it.
//! Buckets are tiny (bounded by the fleet size), so the secondary lookup is
//! a linear scan.
//!
//! Entries are only ever mutated from discovery/reply handlers; readers
//! (allocator, sweeps, metrics) never write.  Nothing deletes entries during
//! a run — the inactivity sweep reports stale rows but keeps them.

use std::net::Ipv4Addr;

use llt_core::{SimTime, Vec3};
use llt_mobility::Interval;
use rustc_hash::FxHashMap;

/// One neighbor row: everything a node knows about a peer on one interface.
#[derive(Clone, Debug)]
pub struct RouteEntry {
    /// The local interface address this row belongs to.
    pub my_addr: Ipv4Addr,
    /// The neighbor's address on the same interface.
    pub peer_addr: Ipv4Addr,
    /// `time_last_pkt − time_first_pkt` as of the last refresh.
    pub time_connected: SimTime,
    /// When the most recent packet from the peer arrived.
    pub time_last_pkt: SimTime,
    /// When the first packet from the peer arrived.
    pub time_first_pkt: SimTime,
    /// Our position when the row was last refreshed.
    pub my_location: Vec3,
    /// The peer's position when the row was last refreshed.
    pub peer_location: Vec3,
    /// The peer's advertised next region.
    pub next_location: u16,
    /// The peer's advertised next dwell interval.
    pub next_interval: Interval,
    /// Estimated remaining connectivity window, seconds.
    pub link_lifetime: f64,
    /// The peer's advertised CPU speed, GHz.
    pub peer_cpu_speed: f64,
}

impl RouteEntry {
    /// A fresh row for a peer first heard from at `now`.
    pub fn first_contact(
        my_addr: Ipv4Addr,
        peer_addr: Ipv4Addr,
        now: SimTime,
        my_location: Vec3,
        peer_location: Vec3,
        next_location: u16,
    ) -> Self {
        Self {
            my_addr,
            peer_addr,
            time_connected: SimTime::ZERO,
            time_last_pkt: now,
            time_first_pkt: now,
            my_location,
            peer_location,
            next_location,
            next_interval: Interval::Short,
            link_lifetime: 0.0,
            peer_cpu_speed: 0.0,
        }
    }

    /// Refresh the liveness fields on any received packet.
    pub fn touch(&mut self, now: SimTime) {
        self.time_last_pkt = now;
        self.time_connected = now.since(self.time_first_pkt);
    }

    /// `true` once no packet has arrived for longer than `threshold`.
    pub fn inactive_at(&self, now: SimTime, threshold: SimTime) -> bool {
        now.since(self.time_last_pkt) > threshold
    }
}

// ── RouteTable ────────────────────────────────────────────────────────────────

/// Multi-indexed table: peer address → bucket of rows tagged by local
/// address.
#[derive(Default)]
pub struct RouteTable {
    buckets: FxHashMap<Ipv4Addr, Vec<RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row.  The caller is responsible for not inserting a
    /// duplicate `(my_addr, peer_addr)` pair — use [`lookup_mut`] first.
    ///
    /// [`lookup_mut`]: RouteTable::lookup_mut
    pub fn insert(&mut self, entry: RouteEntry) {
        self.buckets.entry(entry.peer_addr).or_default().push(entry);
    }

    /// The row for `(peer, my)`, if any.
    pub fn lookup(&self, peer: Ipv4Addr, my: Ipv4Addr) -> Option<&RouteEntry> {
        self.buckets
            .get(&peer)?
            .iter()
            .find(|e| e.my_addr == my)
    }

    /// Mutable access to the row for `(peer, my)`.
    pub fn lookup_mut(&mut self, peer: Ipv4Addr, my: Ipv4Addr) -> Option<&mut RouteEntry> {
        self.buckets
            .get_mut(&peer)?
            .iter_mut()
            .find(|e| e.my_addr == my)
    }

    /// Drop every row for `peer`, across all local addresses.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove_peer(&mut self, peer: Ipv4Addr) -> bool {
        self.buckets.remove(&peer).is_some()
    }

    /// All rows, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.buckets.values().flatten()
    }

    /// All rows belonging to the local address `my` — one node's neighbor
    /// view on this interface.
    pub fn routes_for(&self, my: Ipv4Addr) -> impl Iterator<Item = &RouteEntry> {
        self.iter().filter(move |e| e.my_addr == my)
    }

    /// Rows that have gone quiet: no packet for longer than `threshold`.
    pub fn inactive_at(
        &self,
        now: SimTime,
        threshold: SimTime,
    ) -> impl Iterator<Item = &RouteEntry> {
        self.iter().filter(move |e| e.inactive_at(now, threshold))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
