//! Error types for llt-metrics.

use thiserror::Error;

/// Errors that can occur when writing metrics output.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Alias for `Result<T, MetricsError>`.
pub type MetricsResult<T> = Result<T, MetricsError>;
