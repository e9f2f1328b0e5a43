//! The two wireless interfaces and their fixed constants.
//!
//! Every node carries two radios: **W** (long-range, low-rate) and **WD**
//! (short-range, high-rate).  Ports, nominal PHY rates, and the address plan
//! are compile-time constants of the interface, not runtime configuration —
//! the two routing tables, the discovery sockets, and the allocator all key
//! off `Iface`.

use std::fmt;
use std::net::Ipv4Addr;

use crate::NodeId;

/// One of the two wireless interfaces on every node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Iface {
    /// The low-rate, long-range radio.
    W,
    /// The high-rate, short-range radio.
    Wd,
}

impl Iface {
    pub const BOTH: [Iface; 2] = [Iface::W, Iface::Wd];

    /// UDP port the discovery service listens on.
    #[inline]
    pub fn discovery_port(self) -> u16 {
        match self {
            Iface::W => 9,
            Iface::Wd => 80,
        }
    }

    /// UDP port application data streams target.
    #[inline]
    pub fn app_port(self) -> u16 {
        match self {
            Iface::W => 10,
            Iface::Wd => 81,
        }
    }

    /// Nominal PHY transmission rate, Mbps.  This is the value the PHY taps
    /// report as the observed Tx/Rx rate on every frame.
    #[inline]
    pub fn nominal_rate_mbps(self) -> f64 {
        match self {
            Iface::W => 11.0,
            Iface::Wd => 36.0,
        }
    }

    /// The interface's address for `node`.
    ///
    /// W lives in 10.1.1.0/24 and WD in 10.1.2.0/24, with host part
    /// `node + 1` (host 0 is the network address).
    pub fn addr(self, node: NodeId) -> Ipv4Addr {
        let host = (node.0 + 1) as u8;
        match self {
            Iface::W => Ipv4Addr::new(10, 1, 1, host),
            Iface::Wd => Ipv4Addr::new(10, 1, 2, host),
        }
    }

    /// The other interface.
    #[inline]
    pub fn other(self) -> Iface {
        match self {
            Iface::W => Iface::Wd,
            Iface::Wd => Iface::W,
        }
    }
}

impl fmt::Display for Iface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iface::W => write!(f, "W"),
            Iface::Wd => write!(f, "WD"),
        }
    }
}
