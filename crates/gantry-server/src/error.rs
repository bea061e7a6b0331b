//! Server error types.
//!
//! [`ServerError`] covers bootstrap and transport failures of the dispatcher
//! process. Plugin execution faults never appear here — they are isolated
//! per-call at the service boundary and reported to the gateway as gRPC
//! statuses, so one failing call cannot take the listener down.

use thiserror::Error;

/// Fatal dispatcher failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    // ── Bootstrap ───────────────────────────────────────────────────────────
    /// Invalid or missing bootstrap parameters. Surfaced before bind; the
    /// process exits without attempting to serve.
    #[error("configuration error: {0}")]
    Configuration(String),

    // ── Bind ─────────────────────────────────────────────────────────────────
    /// The listening endpoint could not be bound (address in use,
    /// permission denied, unreachable path, …).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// The underlying bind failure.
        #[source]
        source: std::io::Error,
    },

    // ── Serve ────────────────────────────────────────────────────────────────
    /// A transport-level fault while serving.
    #[error("transport failure: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The serve task ended abnormally (panicked outside any call handler).
    #[error("serve task ended abnormally: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
