//! Fixed-size wire encodings for the two discovery-plane headers.
//!
//! # Formats
//!
//! DISCOVERY, 12 bytes:
//!
//! ```text
//! src_ipv4[4] | dst_ipv4[4] | next_location: u32 (network order)
//! ```
//!
//! The destination field is reserved: written as zero on every send and
//! ignored on receipt (the frame is broadcast; the src field is what
//! receivers key on).
//!
//! REPLY, 20 bytes:
//!
//! ```text
//! src_ipv4[4] | dst_ipv4[4] | next_location: u16 (network order)
//!            | next_interval: u16 (network order) | cpu_speed: f64
//! ```
//!
//! The CPU speed is the raw IEEE-754 bit pattern in **little-endian** byte
//! order.  Network order would be the conventional choice, but the field is
//! pinned explicitly so independent implementations agree.
//!
//! Decoding rejects short buffers with [`WireError::MalformedHeader`];
//! trailing bytes beyond the header are permitted (payload padding).

use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("malformed header: need {need} bytes, have {have}")]
    MalformedHeader { need: usize, have: usize },
}

pub type WireResult<T> = Result<T, WireError>;

fn check_len(buf: &[u8], need: usize) -> WireResult<()> {
    if buf.len() < need {
        return Err(WireError::MalformedHeader { need, have: buf.len() });
    }
    Ok(())
}

fn read_addr(buf: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3])
}

// ── DISCOVERY ─────────────────────────────────────────────────────────────────

/// The broadcast discovery announcement: "this is my address on this
/// interface, and this is where I predict I'll be next".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryHeader {
    pub src: Ipv4Addr,
    /// Reserved — zero on the wire.
    pub dst: Ipv4Addr,
    pub next_location: u32,
}

impl DiscoveryHeader {
    pub const SERIALIZED_SIZE: usize = 12;

    pub fn new(src: Ipv4Addr, next_location: u32) -> Self {
        Self { src, dst: Ipv4Addr::UNSPECIFIED, next_location }
    }

    pub fn serialize(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut buf = [0u8; Self::SERIALIZED_SIZE];
        buf[0..4].copy_from_slice(&self.src.octets());
        buf[4..8].copy_from_slice(&Ipv4Addr::UNSPECIFIED.octets());
        buf[8..12].copy_from_slice(&self.next_location.to_be_bytes());
        buf
    }

    pub fn deserialize(buf: &[u8]) -> WireResult<Self> {
        check_len(buf, Self::SERIALIZED_SIZE)?;
        Ok(Self {
            src: read_addr(&buf[0..4]),
            dst: read_addr(&buf[4..8]),
            next_location: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}

// ── REPLY ─────────────────────────────────────────────────────────────────────

/// The unicast answer to a matching discovery: the responder's own
/// prediction plus its processing speed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReplyHeader {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub next_location: u16,
    pub next_interval: u16,
    /// Responder's CPU speed, GHz.
    pub cpu_speed: f64,
}

impl ReplyHeader {
    pub const SERIALIZED_SIZE: usize = 20;

    pub fn serialize(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut buf = [0u8; Self::SERIALIZED_SIZE];
        buf[0..4].copy_from_slice(&self.src.octets());
        buf[4..8].copy_from_slice(&self.dst.octets());
        buf[8..10].copy_from_slice(&self.next_location.to_be_bytes());
        buf[10..12].copy_from_slice(&self.next_interval.to_be_bytes());
        buf[12..20].copy_from_slice(&self.cpu_speed.to_le_bytes());
        buf
    }

    pub fn deserialize(buf: &[u8]) -> WireResult<Self> {
        check_len(buf, Self::SERIALIZED_SIZE)?;
        Ok(Self {
            src: read_addr(&buf[0..4]),
            dst: read_addr(&buf[4..8]),
            next_location: u16::from_be_bytes([buf[8], buf[9]]),
            next_interval: u16::from_be_bytes([buf[10], buf[11]]),
            cpu_speed: f64::from_le_bytes([
                buf[12], buf[13], buf[14], buf[15], buf[16], buf[17], buf[18], buf[19],
            ]),
        })
    }
}
