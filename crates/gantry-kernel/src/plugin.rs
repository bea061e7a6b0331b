//! The plugin contract.
//!
//! A plugin implements [`Plugin`] and overrides only the methods it needs;
//! every method has a contract-defined default. The dispatcher invokes
//! `handle_request`/`handle_response` only for flows the plugin declared via
//! [`capabilities`](Plugin::capabilities) — being invoked on an undeclared
//! flow is a caller bug the dispatcher rejects, never a plugin fault.

use async_trait::async_trait;

use crate::error::Result;
use crate::proto::{Capabilities, HttpRequest, HttpResponse, Metadata, UpstreamResponse};

/// Contract a Gantry plugin implementation satisfies.
///
/// A single plugin instance is shared across all concurrent calls for its
/// lifetime, so implementations must be `Send + Sync`. Any mutable state
/// beyond the configuration captured at construction must be protected by
/// explicit synchronization — the dispatcher deliberately does not serialize
/// calls. Prefer immutable, read-only configuration captured at construction.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Identify the plugin to the gateway and to operators.
    ///
    /// Queried once per plugin instance at registration time and safe for
    /// the gateway to cache; must not fail under normal operation. The
    /// default returns empty placeholder values, never an error.
    async fn metadata(&self) -> Metadata {
        Metadata::default()
    }

    /// Declare which interception flows the gateway may invoke.
    ///
    /// An empty set is legal and means the plugin is purely passive. The
    /// default declares nothing.
    async fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }

    /// Inspect, rewrite, or reject an inbound request.
    ///
    /// Invoked once per inbound request, only if the plugin declared
    /// [`Flow::Request`](crate::Flow::Request). The default passes traffic
    /// through unchanged, so a plugin that declares the flow without
    /// overriding this method degrades to pass-through rather than stalling
    /// the gateway.
    ///
    /// A plugin that wants a specific fallback on its own internal errors
    /// (e.g. fail open) must encode that as an `Ok` decision in its error
    /// branch; an `Err` is reported to the gateway as an execution fault,
    /// distinct from a `continue = false` decision.
    async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let _ = req;
        Ok(HttpResponse::pass())
    }

    /// Inspect or reject an outbound response.
    ///
    /// Invoked once per outbound response, only if the plugin declared
    /// [`Flow::Response`](crate::Flow::Response). Receives the observed
    /// upstream response together with its originating request context; the
    /// returned [`HttpResponse`] is strictly the plugin's decision. Default:
    /// pass-through, same rule as [`handle_request`](Plugin::handle_request).
    async fn handle_response(&self, resp: UpstreamResponse) -> Result<HttpResponse> {
        let _ = resp;
        Ok(HttpResponse::pass())
    }
}
