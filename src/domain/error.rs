// Ingestion error taxonomy
use thiserror::Error;

/// Errors raised while loading, decoding or streaming axis data.
///
/// Setup errors (`InvalidManifest`, `MalformedManifest`, `InvalidCapacity`,
/// `SourceUnavailable`) abort before any session exists. Per-line errors
/// (`MalformedSample`, `ArityMismatch`) are skipped by the read loop, and
/// `StreamInterrupted` ends a session the same way end-of-stream does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    #[error("Arity mismatch: expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl IngestError {
    /// True for errors that only invalidate a single input line.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IngestError::MalformedSample(_) | IngestError::ArityMismatch { .. }
        )
    }
}
