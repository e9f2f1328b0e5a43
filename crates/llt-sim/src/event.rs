//! The event payloads the queue carries.
//!
//! Each variant names the node (or stream) it acts on — the "context" a
//! handler needs to resolve which state to touch.  The experiment's
//! dispatch function is the single consumer.

use llt_core::{NodeId, TaskId};

use crate::bus::Frame;

/// Everything that can be scheduled.
#[derive(Debug)]
pub enum Event {
    /// A node's pause ran out; start the next walk leg.
    PauseEnd(NodeId),
    /// A node reached its destination region.
    Arrival(NodeId),
    /// 1 Hz dwell-statistics poll for one node.
    DwellPoll(NodeId),
    /// Broadcast a DISCOVERY on both interfaces, then re-arm.
    DiscoverySend(NodeId),
    /// A frame reaches `to`'s radio.
    Deliver { to: NodeId, frame: Frame },
    /// Pop-and-allocate one task, then re-arm while the queue is non-empty.
    AllocatorRun,
    /// Emit the next slice of an application stream.
    StreamSlice(usize),
    /// Deadline audit of a finished transfer window.
    TransferCheck { task: TaskId },
    /// Per-second metrics rows for all nodes.
    MetricsTick,
    /// Report routing entries that have gone quiet.
    InactiveSweep,
}
