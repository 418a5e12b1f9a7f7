//! Error types
//!
//! Hanya konstruksi yang bisa gagal. Pipe penuh/kosong bukan error:
//! itu dilaporkan sebagai `false` oleh `dispatch`/`receive`.

use thiserror::Error;

/// Error saat membangun pipe. Pipe tidak pernah dibuat setengah jadi.
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("pipe capacity must be at least 1")]
    ZeroCapacity,

    #[error("pipe capacity {requested} exceeds maximum {max}")]
    CapacityTooLarge { requested: usize, max: usize },

    #[error("message factory failed while building slot {index}")]
    Factory {
        index: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Nama wait strategy tidak dikenal
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown wait strategy `{0}` (expected `spin` or `backoff`)")]
pub struct ParseWaitStrategyError(pub String);
