//! Fatal experiment errors.
//!
//! Only bring-up problems and output I/O are fatal.  Allocation failures,
//! malformed packets, and unreachable peers are all recorded and recovered
//! locally — they never surface here.

use std::net::Ipv4Addr;

use llt_core::CoreError;
use llt_metrics::MetricsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("experiment configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("interface address {0} bound twice")]
    AddrInUse(Ipv4Addr),

    #[error("metrics output: {0}")]
    Metrics(#[from] MetricsError),
}

pub type SimResult<T> = Result<T, SimError>;
