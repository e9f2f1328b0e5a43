//! Compute tasks and their recorded outcomes.

use llt_core::{SimTime, TaskId};

/// One offloadable compute task: a payload to move and a hard deadline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: TaskId,
    /// Payload size, megabytes.  At least 1.
    pub size_mb: f64,
    /// Transfer deadline, seconds from assignment.  At least 1.
    pub deadline_secs: f64,
}

/// The fixed workload every run starts with.
pub fn seed_tasks() -> Vec<Task> {
    const SIZES: [f64; 5] = [110.0, 300.0, 190.0, 750.0, 150.0];
    const DEADLINES: [f64; 5] = [10.0, 20.0, 15.0, 30.0, 12.0];
    (0..5)
        .map(|i| Task {
            id: TaskId(i as u16),
            size_mb: SIZES[i],
            deadline_secs: DEADLINES[i],
        })
        .collect()
}

/// What became of one allocation attempt, kept per node in decision order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TaskOutcome {
    pub task: TaskId,
    /// When the allocator took the task on.
    pub assign_time: SimTime,
    pub success: bool,
    /// When data started flowing.  `None` on failure.
    pub transfer_start: Option<SimTime>,
    /// When the last leg finishes.  `None` on failure.
    pub transfer_complete: Option<SimTime>,
}

impl TaskOutcome {
    pub fn failed(task: TaskId, assign_time: SimTime) -> Self {
        Self {
            task,
            assign_time,
            success: false,
            transfer_start: None,
            transfer_complete: None,
        }
    }

    pub fn succeeded(
        task: TaskId,
        assign_time: SimTime,
        transfer_start: SimTime,
        transfer_complete: SimTime,
    ) -> Self {
        Self {
            task,
            assign_time,
            success: true,
            transfer_start: Some(transfer_start),
            transfer_complete: Some(transfer_complete),
        }
    }
}
