//! `llt-core` — foundational types for the `llt` MANET task-offloading
//! simulator.
//!
//! This crate is a dependency of every other `llt-*` crate.  It intentionally
//! has no `llt-*` dependencies and minimal external ones (only `rand`,
//! `thiserror`, and `serde` for config derives).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `TaskId`, `RegionId`                        |
//! | [`vec3`]    | `Vec3`, `Box3`, Euclidean distance                    |
//! | [`time`]    | `SimTime` (integer milliseconds)                      |
//! | [`rng`]     | `NodeRng` (per-node), `SimRng` (experiment-level)     |
//! | [`iface`]   | `Iface` enum, ports, nominal rates, address scheme    |
//! | [`config`]  | `SimConfig`, `RadioConfig`                            |
//! | [`error`]   | `CoreError`, `CoreResult`                             |

pub mod config;
pub mod error;
pub mod iface;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vec3;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{AllocOptions, RadioConfig, SimConfig};
pub use error::{CoreError, CoreResult};
pub use iface::Iface;
pub use ids::{NodeId, RegionId, TaskId};
pub use rng::{NodeRng, SimRng};
pub use time::SimTime;
pub use vec3::{Box3, Vec3};
