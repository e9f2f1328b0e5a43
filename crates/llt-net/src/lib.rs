//! `llt-net` — the neighbor-discovery plane.
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`wire`]      | fixed-size DISCOVERY / REPLY header codecs               |
//! | [`rtable`]    | the per-interface routing table                          |
//! | [`lifetime`]  | link-lifetime estimation from dwell predictions          |
//! | [`discovery`] | broadcast/receive protocol logic as table transitions    |
//!
//! Everything here is transport-agnostic: handlers take decoded headers plus
//! the receiver's own state and return what (if anything) should be sent
//! back.  Sockets, timers, and the radio medium live in the experiment
//! crate.

pub mod discovery;
pub mod lifetime;
pub mod rtable;
pub mod wire;


pub use discovery::{DiscoveryService, ReceiverState, handle_discovery, handle_reply};
pub use lifetime::link_lifetime_secs;
pub use rtable::{RouteEntry, RouteTable};
pub use wire::{DiscoveryHeader, ReplyHeader, WireError, WireResult};
