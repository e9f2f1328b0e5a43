//! `llt-sim` — the experiment itself.
//!
//! Everything the sub-crates deliberately leave out lives here: the timed
//! radio medium, the event loop, and the wiring that connects mobility,
//! discovery, allocation, and metrics into one run.
//!
//! | Module         | Contents                                              |
//! |----------------|-------------------------------------------------------|
//! | [`bus`]        | per-interface broadcast/unicast medium (rate, range,  |
//! |                | loss)                                                 |
//! | [`event`]      | the payload enum the event queue carries              |
//! | [`experiment`] | node state, dispatch loop, subsystem wiring           |
//! | [`error`]      | fatal bring-up and output errors                      |

pub mod bus;
pub mod error;
pub mod event;
pub mod experiment;

#[cfg(test)]
mod tests;

pub use bus::{Frame, Payload, RadioBus};
pub use error::{SimError, SimResult};
pub use event::Event;
pub use experiment::{Experiment, NodeSummary};
