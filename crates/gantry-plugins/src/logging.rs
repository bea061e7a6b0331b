//! Structured access-logging plugin.
//!
//! Emits `tracing` events on both flows, recording method, URL, remote
//! address, response status, and body sizes. Header values for sensitive
//! headers (`Authorization`, `Cookie`) are redacted before they reach the
//! log stream. The plugin never mutates traffic.

use async_trait::async_trait;
use tracing::{debug, info};

use gantry_kernel::{
    Capabilities, HttpRequest, HttpResponse, Metadata, Plugin, Result, UpstreamResponse,
};

const REDACTED: &str = "***REDACTED***";

/// Plugin that logs HTTP request and response details for observability.
#[derive(Default)]
pub struct AccessLogPlugin;

impl AccessLogPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// Whether a header's value must not appear in logs.
fn is_sensitive(key: &str) -> bool {
    key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("cookie")
}

#[async_trait]
impl Plugin for AccessLogPlugin {
    async fn metadata(&self) -> Metadata {
        Metadata::new(
            "access-log",
            env!("CARGO_PKG_VERSION"),
            "Logs HTTP request and response details for observability",
        )
    }

    async fn capabilities(&self) -> Capabilities {
        Capabilities::both()
    }

    async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
        info!(
            method = %req.method,
            url = %req.url,
            path = %req.path,
            remote_addr = %req.remote_addr,
            body_bytes = req.body.len(),
            "inbound request"
        );
        for (key, value) in &req.headers {
            let shown = if is_sensitive(key) { REDACTED } else { value.as_str() };
            debug!(header = %key, value = %shown, "request header");
        }
        Ok(HttpResponse::pass())
    }

    async fn handle_response(&self, resp: UpstreamResponse) -> Result<HttpResponse> {
        // The originating request rides along on the response flow.
        let path = resp.request.as_ref().map(|r| r.path.as_str()).unwrap_or("");
        info!(
            status = resp.status_code,
            path = %path,
            body_bytes = resp.body.len(),
            "outbound response"
        );
        for (key, value) in &resp.headers {
            let shown = if is_sensitive(key) { REDACTED } else { value.as_str() };
            debug!(header = %key, value = %shown, "response header");
        }
        Ok(HttpResponse::pass())
    }
}
