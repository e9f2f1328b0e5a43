//! Splitting one task across the two interfaces.
//!
//! # Algorithm
//!
//! For a task of `size` MB with deadline `D`, against a candidate peer with
//! link lifetimes `llt_W` / `llt_WD` and available bandwidths `B_W` / `B_WD`
//! (Mbps):
//!
//! 1. The usable window per interface is `a = min(D, llt)` — the transfer
//!    cannot outlive either the deadline or the predicted link.  In
//!    "use-max-CPU" mode the lifetime bound is waived and `a = D`.
//! 2. Each interface can move at most `max = min(B · a, size)` within its
//!    window.
//! 3. The interface with the larger `max` carries the bulk; whatever is left
//!    (`size − max`) rides the other interface and takes
//!    `remaining / B_other` seconds.
//! 4. The split is viable iff the two legs together cover the full size and
//!    the remainder finishes within the deadline.
//!
//! Candidates are tried in table order, or in descending peer-CPU-speed
//! order when configured; the first viable split wins.  The planner is a
//! pure function over snapshots — it never touches the queue, the tables,
//! or the clock.

use std::net::Ipv4Addr;

use llt_core::{AllocOptions, Iface};
use log::debug;
use thiserror::Error;

/// Why no transfer plan could be produced.  Never fatal: the caller records
/// a failed outcome and moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
    #[error("no available bandwidth on at least one interface")]
    NoAvailableBandwidth,

    #[error("no routing candidate satisfies the deadline and bandwidth constraints")]
    NoViableRoute,
}

/// The task's transfer demands.
#[derive(Copy, Clone, Debug)]
pub struct TransferRequest {
    pub size_mb: f64,
    pub deadline_secs: f64,
}

/// Headroom per interface: observed PHY rate minus bandwidth already in use.
#[derive(Copy, Clone, Debug)]
pub struct IfaceBandwidth {
    pub available_w_mbps: f64,
    pub available_wd_mbps: f64,
}

/// One neighbor reachable on both interfaces.
#[derive(Copy, Clone, Debug)]
pub struct Candidate {
    pub peer_w: Ipv4Addr,
    pub peer_wd: Ipv4Addr,
    pub llt_w_secs: f64,
    pub llt_wd_secs: f64,
    pub cpu_speed: f64,
}

/// One leg of an emitted plan: push data to `peer` over `iface` at
/// `rate_mbps` for `duration_secs`.
#[derive(Copy, Clone, Debug)]
pub struct TransferLeg {
    pub iface: Iface,
    pub peer: Ipv4Addr,
    pub duration_secs: f64,
    pub rate_mbps: f64,
    pub data_mb: f64,
}

/// The allocator's output: a primary leg and an optional remainder on the
/// other interface.
#[derive(Copy, Clone, Debug)]
pub struct TransferPlan {
    pub primary: TransferLeg,
    pub remainder: Option<TransferLeg>,
}

impl TransferPlan {
    /// Wall time until the slower leg finishes, seconds.
    pub fn total_duration_secs(&self) -> f64 {
        let rem = self.remainder.map_or(0.0, |l| l.duration_secs);
        self.primary.duration_secs.max(rem)
    }
}

/// Produce a transfer plan for `req`, or an error when no candidate works.
pub fn plan_transfer(
    req: TransferRequest,
    bw: IfaceBandwidth,
    candidates: &[Candidate],
    opts: AllocOptions,
) -> Result<TransferPlan, AllocError> {
    let IfaceBandwidth { available_w_mbps: avail_w, available_wd_mbps: avail_wd } = bw;
    if avail_w <= 0.0 || avail_wd <= 0.0 {
        return Err(AllocError::NoAvailableBandwidth);
    }

    let mut ordered: Vec<&Candidate> = candidates.iter().collect();
    if opts.sort_by_cpu_speed {
        ordered.sort_by(|a, b| {
            b.cpu_speed
                .partial_cmp(&a.cpu_speed)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let size = req.size_mb;
    let deadline = req.deadline_secs;
    let t_dt_w = size / avail_w;
    let t_dt_wd = size / avail_wd;

    for cand in ordered {
        let (a_w, a_wd) = if opts.use_max_cpu {
            (deadline, deadline)
        } else {
            (deadline.min(cand.llt_w_secs), deadline.min(cand.llt_wd_secs))
        };

        let max_w = (avail_w * a_w).min(size);
        let max_wd = (avail_wd * a_wd).min(size);

        // The bigger window carries the bulk; ties go to WD, the faster
        // radio.
        let wd_primary = max_wd >= max_w;
        let (carried, rem_rate) = if wd_primary {
            (max_wd, avail_w)
        } else {
            (max_w, avail_wd)
        };
        let remaining = size - carried;
        let remaining_secs = remaining / rem_rate;

        if carried + remaining < size || remaining_secs > deadline {
            debug!(
                "candidate {} rejected: carries {carried:.1}/{size:.1}MB, \
                 remainder {remaining_secs:.1}s vs deadline {deadline:.1}s",
                cand.peer_w
            );
            continue;
        }

        let (primary, remainder) = if wd_primary {
            (
                TransferLeg {
                    iface: Iface::Wd,
                    peer: cand.peer_wd,
                    duration_secs: t_dt_wd.min(deadline),
                    rate_mbps: avail_wd,
                    data_mb: carried,
                },
                (remaining > 0.0).then(|| TransferLeg {
                    iface: Iface::W,
                    peer: cand.peer_w,
                    duration_secs: remaining_secs,
                    rate_mbps: avail_w,
                    data_mb: remaining,
                }),
            )
        } else {
            (
                TransferLeg {
                    iface: Iface::W,
                    peer: cand.peer_w,
                    duration_secs: t_dt_w.min(deadline),
                    rate_mbps: avail_w,
                    data_mb: carried,
                },
                (remaining > 0.0).then(|| TransferLeg {
                    iface: Iface::Wd,
                    peer: cand.peer_wd,
                    duration_secs: remaining_secs,
                    rate_mbps: avail_wd,
                    data_mb: remaining,
                }),
            )
        };

        debug!(
            "task split: {:.1}MB on {} for {:.1}s, {:.1}MB remainder",
            primary.data_mb,
            primary.iface,
            primary.duration_secs,
            remainder.map_or(0.0, |l| l.data_mb),
        );
        return Ok(TransferPlan { primary, remainder });
    }

    Err(AllocError::NoViableRoute)
}
