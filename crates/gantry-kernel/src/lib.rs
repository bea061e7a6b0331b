//! Plugin interception contract for the Gantry gateway.
//!
//! This crate defines the *envelope model and trait interface* a Gantry
//! plugin implements. No runtime lives here — binding, dispatch, and
//! lifecycle belong in `gantry-server`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              gantry-kernel  (this crate)                    │
//! │  Plugin trait (default pass-through methods)                │
//! │  Metadata / Capabilities / Flow                             │
//! │  HttpRequest / HttpResponse / UpstreamResponse              │
//! │  PluginConfig    PluginError                                │
//! └──────────────────────────┬──────────────────────────────────┘
//! │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              gantry-server  (runtime crate)                 │
//! │  PluginAdapter: capability gate + panic boundary            │
//! │  PluginServer  (tonic gRPC server, unix/tcp)                │
//! │  ServeConfig   graceful-drain lifecycle                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use gantry_kernel::{
//!     Capabilities, HttpRequest, HttpResponse, Metadata, Plugin, Result,
//! };
//!
//! struct StampPlugin;
//!
//! #[async_trait::async_trait]
//! impl Plugin for StampPlugin {
//!     async fn metadata(&self) -> Metadata {
//!         Metadata::new("stamp", "1.0.0", "adds a header to every request")
//!     }
//!
//!     async fn capabilities(&self) -> Capabilities {
//!         Capabilities::request_only()
//!     }
//!
//!     async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
//!         let modified = req.with_header("X-Stamp", "processed");
//!         Ok(HttpResponse::pass_with(modified))
//!     }
//! }
//! ```

// Generated protobuf code.
#[allow(clippy::all)]
#[allow(missing_docs)]
pub mod proto {
    include!("generated/gantry.plugins.v1.rs");
}

mod envelope;
mod error;
mod flow;
mod plugin;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use error::{PluginError, Result};
pub use flow::{FLOW_REQUEST, FLOW_RESPONSE};
pub use plugin::Plugin;
pub use proto::{
    Capabilities, Flow, HttpRequest, HttpResponse, Metadata, PluginConfig, UpstreamResponse,
};
