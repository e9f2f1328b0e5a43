//! The per-node mobility driver.
//!
//! # State machine
//!
//! ```text
//! Paused(at R) --pause expires--> Walking(to R')
//! Walking(to R') --arrival--> Paused(at R')
//! ```
//!
//! On each pause expiry the driver resolves its current region, feeds the
//! completed `prev → curr` transition to the predictor (when both ends are
//! real regions), samples a destination and dwell interval from the learned
//! rows, and walks to the destination's center at a speed drawn from
//! `U(1, 15) m/s`.  On arrival it pauses for the sampled interval's
//! duration.
//!
//! The driver never schedules anything itself: `begin_walk` returns the leg
//! (including its travel time) and `arrive` returns the pause duration; the
//! experiment turns both into events.  The predictor is passed in by the
//! owner per call, so there are no cross-references between the two.

use llt_core::{NodeRng, RegionId, SimTime, Vec3};
use log::debug;

use crate::{Interval, Predictor, RegionMap};

/// Walking or pausing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Phase {
    Paused,
    Walking,
}

/// One sampled walk leg, returned by [`Mobility::begin_walk`].
#[derive(Copy, Clone, Debug)]
pub struct WalkLeg {
    /// Region the node is heading to.
    pub destination: RegionId,
    /// How long the leg takes.
    pub travel: SimTime,
    /// The sampled walking speed, m/s.
    pub speed: f64,
}

/// Position, velocity, and dwell bookkeeping for one node.
pub struct Mobility {
    phase: Phase,
    leg_start_pos: Vec3,
    velocity: Vec3,
    leg_started: SimTime,
    leg_arrives: SimTime,

    /// Region confirmed at the last walk start (the transition source).
    prev_region: RegionId,
    dest_region: RegionId,

    /// Arrivals completed; the first two pauses are fixed at 1 s before the
    /// sampled interval takes over.
    arrivals: u32,

    /// When the node last arrived in each region.
    arrival_time: [SimTime; RegionId::COUNT],

    /// Dwell-so-far statistics per transition pair, refreshed by the 1 Hz
    /// poll.  Informational; the predictor receives its dwell at transition
    /// time.
    time_spent: [[f64; RegionId::COUNT]; RegionId::COUNT],

    /// Region the dwell poll last saw the node in, and the one before that.
    poll_curr: Option<RegionId>,
    poll_prev: Option<RegionId>,
}

impl Mobility {
    /// Place a node at `pos` at time `now`, paused.
    ///
    /// The starting region resolves through the primary map with the padded
    /// fallback; a position outside both defaults to region 0 so the matrix
    /// bookkeeping always has a valid source.
    pub fn new(pos: Vec3, map: &RegionMap, now: SimTime) -> Self {
        let start = map.resolve(pos).unwrap_or(RegionId(0));
        let mut arrival_time = [SimTime::ZERO; RegionId::COUNT];
        arrival_time[start.index()] = now;
        Self {
            phase: Phase::Paused,
            leg_start_pos: pos,
            velocity: Vec3::ORIGIN,
            leg_started: now,
            leg_arrives: now,
            prev_region: start,
            dest_region: start,
            arrivals: 0,
            arrival_time,
            time_spent: [[0.0; RegionId::COUNT]; RegionId::COUNT],
            poll_curr: Some(start),
            poll_prev: None,
        }
    }

    /// The fixed pause before the very first walk.
    pub fn first_pause() -> SimTime {
        SimTime::from_secs(1)
    }

    /// Current interpolated position.
    pub fn position(&self, now: SimTime) -> Vec3 {
        match self.phase {
            Phase::Paused => self.leg_start_pos,
            Phase::Walking => {
                let t = now.min(self.leg_arrives).since(self.leg_started).as_secs_f64();
                Vec3::new(
                    self.leg_start_pos.x + self.velocity.x * t,
                    self.leg_start_pos.y + self.velocity.y * t,
                    self.leg_start_pos.z + self.velocity.z * t,
                )
            }
        }
    }

    #[inline]
    pub fn is_walking(&self) -> bool {
        self.phase == Phase::Walking
    }

    /// Region the node is heading to (meaningful while walking).
    #[inline]
    pub fn destination(&self) -> RegionId {
        self.dest_region
    }

    /// Dwell-so-far statistic for one transition pair, seconds.
    pub fn time_spent(&self, prev: RegionId, curr: RegionId) -> f64 {
        self.time_spent[prev.index()][curr.index()]
    }

    // ── Pause expiry ──────────────────────────────────────────────────────

    /// End the pause: learn the completed transition, sample the next
    /// destination and interval, and start walking.  Returns the leg so the
    /// caller can schedule the arrival.
    pub fn begin_walk(
        &mut self,
        now: SimTime,
        map: &RegionMap,
        predictor: &mut Predictor,
        rng: &mut NodeRng,
    ) -> WalkLeg {
        let pos = self.position(now);
        let curr = map.resolve(pos);

        if let Some(curr) = curr {
            if curr != self.prev_region {
                let dwell = now.since(self.arrival_time[curr.index()]).as_secs_f64();
                debug!(
                    "transition {} -> {} after {dwell:.1}s dwell",
                    self.prev_region, curr
                );
                predictor.observe_transition(self.prev_region, curr, dwell);
            }
        }

        let destination = match curr {
            Some(c) => {
                let dest = predictor.sample_next_location(c, rng);
                predictor.sample_next_interval(c, dest, rng);
                dest
            }
            // In transit: no row anchors the matrix, draw uniformly and keep
            // the previously advertised interval.
            None => predictor.sample_uniform_location(rng),
        };

        let speed: f64 = rng.gen_range(1.0..15.0);
        let target = map.center(destination);
        let travel = SimTime::from_secs_f64(pos.distance(target) / speed);

        self.leg_start_pos = pos;
        self.velocity = pos.velocity_towards(target, speed);
        self.leg_started = now;
        self.leg_arrives = now + travel;
        self.phase = Phase::Walking;
        self.dest_region = destination;
        if let Some(curr) = curr {
            self.prev_region = curr;
        }

        debug!("walk to {destination} at {speed:.1} m/s, {travel} travel");
        WalkLeg { destination, travel, speed }
    }

    // ── Arrival ───────────────────────────────────────────────────────────

    /// Complete the current leg.  Returns how long to pause before the next
    /// walk: 1 s for the first two arrivals, then the predicted interval's
    /// duration.
    pub fn arrive(&mut self, now: SimTime, map: &RegionMap, predicted: Interval) -> SimTime {
        self.leg_start_pos = map.center(self.dest_region);
        self.velocity = Vec3::ORIGIN;
        self.leg_started = now;
        self.leg_arrives = now;
        self.phase = Phase::Paused;
        self.arrivals += 1;
        self.arrival_time[self.dest_region.index()] = now;

        if self.arrivals >= 3 {
            SimTime::from_secs_f64(predicted.pause_secs())
        } else {
            SimTime::from_secs(1)
        }
    }

    // ── Dwell poll (1 Hz) ─────────────────────────────────────────────────

    /// Refresh the dwell-so-far statistics.  In-transit positions are
    /// ignored so the poll's region memory survives a walk.
    pub fn poll_dwell(&mut self, now: SimTime, map: &RegionMap) {
        let Some(curr) = map.position_to_region(self.position(now)) else {
            return;
        };
        if self.poll_curr != Some(curr) {
            self.poll_prev = self.poll_curr;
            self.poll_curr = Some(curr);
            self.arrival_time[curr.index()] = now;
        } else if let Some(prev) = self.poll_prev {
            if prev != curr {
                self.time_spent[prev.index()][curr.index()] =
                    now.since(self.arrival_time[curr.index()]).as_secs_f64();
            }
        }
    }
}
