//! gRPC dispatcher and lifecycle runtime for Gantry plugins.
//!
//! [`serve()`] is the whole boilerplate a plugin binary needs: it parses the
//! gateway-supplied `--address`/`--network` flags (or falls back to
//! standalone TCP), binds the endpoint, registers the plugin behind the
//! dispatch boundary, serves concurrently, and drains gracefully on
//! SIGINT/SIGTERM.
//!
//! ```rust,no_run
//! use gantry_kernel::Plugin;
//!
//! struct MyPlugin;
//!
//! impl Plugin for MyPlugin {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gantry_server::ServerError> {
//!     // Managed mode: the gateway passes --address and --network.
//!     gantry_server::serve(MyPlugin, Some(std::env::args())).await
//! }
//! ```
//!
//! For finer control — port-0 binds in tests, custom shutdown signals,
//! state-transition observation — use [`PluginServer`] directly:
//!
//! ```rust,no_run
//! # use gantry_kernel::Plugin;
//! # struct MyPlugin;
//! # impl Plugin for MyPlugin {}
//! # async fn run() -> Result<(), gantry_server::ServerError> {
//! use gantry_server::{PluginServer, ServeConfig};
//!
//! let server = PluginServer::bind(ServeConfig::tcp("127.0.0.1:0")).await?;
//! let addr = server.local_addr();
//! let stop = server.shutdown_handle();
//! server.serve(MyPlugin).await
//! # }
//! ```

mod config;
mod error;
mod server;
mod service;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use config::{DEFAULT_GRACE_PERIOD, DEFAULT_MAX_WORKERS, DEFAULT_PORT, Network, ServeConfig};
pub use error::{Result, ServerError};
pub use server::{PluginServer, ServerState, serve};
pub use service::PluginAdapter;
