//! The dispatch boundary between the gRPC transport and a [`Plugin`].
//!
//! [`PluginAdapter`] enforces the contract the gateway relies on:
//!
//! - a flow the plugin did not declare is rejected with
//!   `FAILED_PRECONDITION` rather than silently executed;
//! - a panic or `Err` inside a handler is converted into an `INTERNAL`
//!   status for that call only — distinguishable from a `continue = false`
//!   business decision, and invisible to unrelated in-flight calls;
//! - a decision that violates the envelope invariant (short-circuit plus
//!   `modified_request`) never leaves the process.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::OnceCell;
use tonic::{Request, Response, Status};
use tracing::{debug, error};

use gantry_kernel::proto::plugin_service_server::PluginService;
use gantry_kernel::{
    Capabilities, Flow, HttpRequest, HttpResponse, Metadata, Plugin, UpstreamResponse,
};

/// Bridges a [`Plugin`] implementation onto the generated gRPC service.
///
/// The plugin instance is shared across all concurrent calls; the adapter
/// adds no serialization of its own.
pub struct PluginAdapter<P> {
    plugin: Arc<P>,
    // Declared flows, resolved once per plugin instance and cached for the
    // per-call capability gate.
    declared: OnceCell<Capabilities>,
}

impl<P: Plugin> PluginAdapter<P> {
    /// Wrap a plugin instance.
    pub fn new(plugin: P) -> Self {
        Self::from_arc(Arc::new(plugin))
    }

    /// Wrap an already-shared plugin instance.
    pub fn from_arc(plugin: Arc<P>) -> Self {
        Self {
            plugin,
            declared: OnceCell::new(),
        }
    }

    async fn gate(&self, flow: Flow) -> Result<(), Status> {
        let declared = self
            .declared
            .get_or_init(|| async { self.plugin.capabilities().await })
            .await;
        if declared.declares(flow) {
            Ok(())
        } else {
            Err(Status::failed_precondition(format!(
                "{} is not declared in this plugin's capabilities",
                flow.as_str_name()
            )))
        }
    }

    /// Run a handler future behind the fault boundary.
    ///
    /// The caller's fail-open/fail-closed policy hinges on being able to tell
    /// "plugin rejected the traffic" apart from "plugin crashed", so both
    /// `Err` returns and panics become `INTERNAL` here instead of a decision.
    async fn dispatch<F>(&self, operation: &'static str, handler: F) -> Result<HttpResponse, Status>
    where
        F: Future<Output = gantry_kernel::Result<HttpResponse>>,
    {
        match AssertUnwindSafe(handler).catch_unwind().await {
            Ok(Ok(decision)) => {
                if let Err(violation) = decision.validate() {
                    error!(operation, error = %violation, "plugin returned an invalid decision");
                    return Err(Status::internal(format!(
                        "plugin returned an invalid decision: {violation}"
                    )));
                }
                Ok(decision)
            }
            Ok(Err(fault)) => {
                error!(operation, error = %fault, "plugin handler failed");
                Err(Status::internal(format!(
                    "plugin {operation} failed: {fault}"
                )))
            }
            Err(panic) => {
                let message = panic_message(&panic);
                error!(operation, panic = message, "plugin handler panicked");
                Err(Status::internal(format!(
                    "plugin {operation} panicked: {message}"
                )))
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

#[tonic::async_trait]
impl<P: Plugin> PluginService for PluginAdapter<P> {
    async fn get_metadata(
        &self,
        _request: Request<()>,
    ) -> Result<Response<Metadata>, Status> {
        Ok(Response::new(self.plugin.metadata().await))
    }

    async fn get_capabilities(
        &self,
        _request: Request<()>,
    ) -> Result<Response<Capabilities>, Status> {
        Ok(Response::new(self.plugin.capabilities().await))
    }

    async fn handle_request(
        &self,
        request: Request<HttpRequest>,
    ) -> Result<Response<HttpResponse>, Status> {
        self.gate(Flow::Request).await?;
        let req = request.into_inner();
        debug!(method = %req.method, path = %req.path, "dispatching request flow");
        let decision = self
            .dispatch("handle_request", self.plugin.handle_request(req))
            .await?;
        Ok(Response::new(decision))
    }

    async fn handle_response(
        &self,
        request: Request<UpstreamResponse>,
    ) -> Result<Response<HttpResponse>, Status> {
        self.gate(Flow::Response).await?;
        let resp = request.into_inner();
        debug!(status = resp.status_code, "dispatching response flow");
        let decision = self
            .dispatch("handle_response", self.plugin.handle_response(resp))
            .await?;
        Ok(Response::new(decision))
    }
}
