//! Example plugins built on the Gantry contract.
//!
//! Each module is a complete, runnable interception strategy (the matching
//! binary lives under `src/bin/`):
//!
//! | Plugin | Flow(s) | Behavior |
//! |--------|---------|----------|
//! | [`BearerAuthPlugin`] | request | Rejects requests without the expected Bearer token (401). |
//! | [`AccessLogPlugin`] | request + response | Structured logging of traffic, sensitive headers redacted. |
//! | [`HeaderInjectPlugin`] | request | Adds one header to every forwarded request. |
//! | [`JsonStampPlugin`] | request | Stamps a `_metadata` object into JSON request bodies. |
//!
//! These are application logic *on* the contract, not part of it — they hold
//! no mutable state beyond construction-time configuration, which is what
//! makes them trivially safe under concurrent invocation.

pub mod auth;
pub mod headers;
pub mod logging;
pub mod transform;

pub use auth::BearerAuthPlugin;
pub use headers::HeaderInjectPlugin;
pub use logging::AccessLogPlugin;
pub use transform::JsonStampPlugin;
