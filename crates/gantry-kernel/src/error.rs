//! Contract-level error types for `gantry-kernel`.
//!
//! [`PluginError`] covers failures a plugin implementation can report and the
//! envelope violations the dispatcher detects at the contract boundary.
//! Transport and lifecycle failures (bind errors, drain timeouts, …) belong
//! in the server crate (`gantry-server`).
//!
//! A `continue = false` decision is **not** an error anywhere in this
//! taxonomy — it is an ordinary [`HttpResponse`](crate::HttpResponse) value.

use thiserror::Error;

/// Failure modes of a plugin implementation, as seen at the contract boundary.
///
/// The enum is `#[non_exhaustive]` so future releases can add new failure
/// modes without breaking existing `match` arms.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PluginError {
    // ── Decision envelope ───────────────────────────────────────────────────
    /// A short-circuit decision (`continue = false`) also carried a
    /// `modified_request`. Mutation only makes sense when traffic proceeds.
    #[error("short-circuit decision cannot carry a modified request")]
    ConflictingDecision,

    // ── Configuration ────────────────────────────────────────────────────────
    /// The plugin config is missing a key the plugin requires.
    #[error("plugin config is missing required key '{0}'")]
    MissingConfig(String),

    /// A plugin config value could not be parsed or is out of range.
    #[error("plugin config value for '{0}' is invalid: {1}")]
    InvalidConfig(String, String),

    // ── Handler execution ────────────────────────────────────────────────────
    /// An unrecoverable failure inside a handler. The dispatcher reports this
    /// to the gateway as a protocol-level fault, distinct from any
    /// `continue = false` business decision.
    #[error("handler failure: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, PluginError>;
