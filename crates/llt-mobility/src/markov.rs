//! The per-node Markov predictor.
//!
//! # Structure
//!
//! A 5×5 matrix of location-transition cells; each cell `(prev, curr)`
//! additionally owns a 3×3 matrix of dwell-interval transitions for that
//! specific journey.  Every cell stores `(count, row_total, probability)`
//! with the invariant that each row's probabilities sum to 1 after every
//! update.
//!
//! # Row-sum renormalization
//!
//! After a cell's probability is recomputed from its counters, the row as a
//! whole may drift off 1.  The residual `1 − Σ row` is split equally across
//! the row's *other* cells.  This trades strict count/probability agreement
//! in the non-updated cells for an exact row sum, which is what the CDF
//! sampler depends on.
//!
//! # Seed state
//!
//! Matrices start warm rather than empty: every location cell begins at
//! 100/100 visits with probability 0.2, every interval cell at 100/100 with
//! 0.34 on the diagonal and 0.33 off it.  A fresh node therefore predicts
//! uniformly instead of degenerating, and single early observations move
//! the distribution only slightly.

use llt_core::{NodeRng, RegionId};

use crate::Interval;

const REGIONS: usize = RegionId::COUNT;
const INTERVALS: usize = Interval::COUNT;

// ── Cells ─────────────────────────────────────────────────────────────────────

/// One dwell-interval transition cell.
#[derive(Copy, Clone, Debug)]
struct TimeCell {
    count: u32,
    total: u32,
    prob: f64,
}

/// One location transition cell, owning its interval submatrix.
#[derive(Copy, Clone, Debug)]
struct LocCell {
    visits: u32,
    total_visits: u32,
    prob: f64,
    time: [[TimeCell; INTERVALS]; INTERVALS],
}

fn seeded_loc_cell() -> LocCell {
    let time = std::array::from_fn(|k| {
        std::array::from_fn(|l| TimeCell {
            count: 100,
            total: 100,
            prob: if k == l { 0.34 } else { 0.33 },
        })
    });
    LocCell { visits: 100, total_visits: 100, prob: 0.20, time }
}

// ── Predictor ─────────────────────────────────────────────────────────────────

/// Learns `P(next region | current region)` and
/// `P(next dwell | previous dwell, journey)` from observed transitions, and
/// samples forward predictions from the learned rows.
///
/// All operations are total; the predictor never fails.
pub struct Predictor {
    loc: [[LocCell; REGIONS]; REGIONS],

    /// Previous dwell bucket per journey, the row selector for that
    /// journey's interval submatrix.
    prev_interval: [[Interval; REGIONS]; REGIONS],

    /// Most recently sampled predictions, advertised by discovery.
    next_location: RegionId,
    next_interval: Interval,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor {
    pub fn new() -> Self {
        Self {
            loc: std::array::from_fn(|_| std::array::from_fn(|_| seeded_loc_cell())),
            prev_interval: [[Interval::Short; REGIONS]; REGIONS],
            next_location: RegionId(0),
            next_interval: Interval::Short,
        }
    }

    // ── Learning ──────────────────────────────────────────────────────────

    /// Record one confirmed transition `prev → curr` with the dwell spent at
    /// `curr` before departing.
    ///
    /// No-op when `prev == curr`; in-transit positions never reach here (the
    /// driver filters them).
    pub fn observe_transition(&mut self, prev: RegionId, curr: RegionId, dwell_secs: f64) {
        if prev == curr {
            return;
        }
        self.update_location_row(prev, curr);
        self.update_interval_row(prev, curr, Interval::from_secs(dwell_secs));
    }

    /// Location row update: bump the visited cell, share the row total,
    /// recompute its probability, renormalize the row.
    fn update_location_row(&mut self, prev: RegionId, curr: RegionId) {
        let row = &mut self.loc[prev.index()];

        let row_total: u32 = row.iter().map(|c| c.visits).sum();
        row[curr.index()].visits += 1;
        let new_total = row_total + 1;
        for cell in row.iter_mut() {
            cell.total_visits = new_total;
        }
        row[curr.index()].prob = row[curr.index()].visits as f64 / new_total as f64;

        let row_sum: f64 = row.iter().map(|c| c.prob).sum();
        if row_sum != 1.0 {
            let share = (1.0 - row_sum) / (REGIONS - 1) as f64;
            for (j, cell) in row.iter_mut().enumerate() {
                if j != curr.index() {
                    cell.prob += share;
                }
            }
        }
    }

    /// Interval row update inside the journey cell, same procedure with a
    /// row of three and the residual split two ways.
    fn update_interval_row(&mut self, prev: RegionId, curr: RegionId, bucket: Interval) {
        let prev_bucket = self.prev_interval[prev.index()][curr.index()];
        let row = &mut self.loc[prev.index()][curr.index()].time[prev_bucket.index()];

        let row_total: u32 = row.iter().map(|c| c.count).sum();
        row[bucket.index()].count += 1;
        let new_total = row_total + 1;
        for cell in row.iter_mut() {
            cell.total = new_total;
        }
        row[bucket.index()].prob = row[bucket.index()].count as f64 / new_total as f64;

        let row_sum: f64 = row.iter().map(|c| c.prob).sum();
        if row_sum != 1.0 {
            let share = (1.0 - row_sum) / (INTERVALS - 1) as f64;
            for (l, cell) in row.iter_mut().enumerate() {
                if l != bucket.index() {
                    cell.prob += share;
                }
            }
        }

        self.prev_interval[prev.index()][curr.index()] = bucket;
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// Sample the next destination from the `curr` row and remember it as
    /// the advertised prediction.
    pub fn sample_next_location(&mut self, curr: RegionId, rng: &mut NodeRng) -> RegionId {
        let probs: Vec<f64> = self.loc[curr.index()].iter().map(|c| c.prob).collect();
        let next = RegionId(sample_cdf(&probs, rng.unit()) as u8);
        self.next_location = next;
        next
    }

    /// Sample a destination from the uniform row — used while in transit,
    /// where no current region anchors the matrix.
    pub fn sample_uniform_location(&mut self, rng: &mut NodeRng) -> RegionId {
        let probs = [0.2; REGIONS];
        let next = RegionId(sample_cdf(&probs, rng.unit()) as u8);
        self.next_location = next;
        next
    }

    /// Sample the dwell interval for the journey `curr → next` and remember
    /// it as the advertised prediction.
    pub fn sample_next_interval(
        &mut self,
        curr: RegionId,
        next: RegionId,
        rng: &mut NodeRng,
    ) -> Interval {
        let row_sel = self.prev_interval[curr.index()][next.index()];
        let row = &self.loc[curr.index()][next.index()].time[row_sel.index()];
        let probs: Vec<f64> = row.iter().map(|c| c.prob).collect();
        let interval = Interval::from_index(sample_cdf(&probs, rng.unit()));
        self.next_interval = interval;
        interval
    }

    // ── Advertised predictions ────────────────────────────────────────────

    /// The destination most recently sampled — what discovery broadcasts.
    #[inline]
    pub fn predicted_location(&self) -> RegionId {
        self.next_location
    }

    /// The dwell interval most recently sampled — what REPLY advertises.
    #[inline]
    pub fn predicted_interval(&self) -> Interval {
        self.next_interval
    }

    // ── Introspection (tests, matrix dumps) ───────────────────────────────

    /// Probability of the transition `prev → curr`.
    pub fn location_prob(&self, prev: RegionId, curr: RegionId) -> f64 {
        self.loc[prev.index()][curr.index()].prob
    }

    /// Sum of the `prev` location row — 1 ± ε by invariant.
    pub fn location_row_sum(&self, prev: RegionId) -> f64 {
        self.loc[prev.index()].iter().map(|c| c.prob).sum()
    }

    /// Probability of dwell `curr_b` given `prev_b` on the journey
    /// `prev → curr`.
    pub fn interval_prob(
        &self,
        prev: RegionId,
        curr: RegionId,
        prev_b: Interval,
        curr_b: Interval,
    ) -> f64 {
        self.loc[prev.index()][curr.index()].time[prev_b.index()][curr_b.index()].prob
    }

    /// Sum of one interval row — 1 ± ε by invariant.
    pub fn interval_row_sum(&self, prev: RegionId, curr: RegionId, prev_b: Interval) -> f64 {
        self.loc[prev.index()][curr.index()].time[prev_b.index()]
            .iter()
            .map(|c| c.prob)
            .sum()
    }
}

// ── CDF sampling ──────────────────────────────────────────────────────────────

/// Return the first index whose CDF prefix sum exceeds `u`.
///
/// Ties break towards the lowest index; if accumulated float error leaves
/// the final prefix below `u`, the last index wins.
pub(crate) fn sample_cdf(probs: &[f64], u: f64) -> usize {
    let mut acc = 0.0;
    for (i, p) in probs.iter().enumerate() {
        acc += p;
        if u < acc {
            return i;
        }
    }
    probs.len() - 1
}
