//! Header-injection plugin.
//!
//! The minimal mutation example: every forwarded request gains one
//! configured header; method, URL, path, body, and the original headers are
//! preserved on the rewritten request.

use async_trait::async_trait;
use tracing::debug;

use gantry_kernel::{Capabilities, HttpRequest, HttpResponse, Metadata, Plugin, Result};

const DEFAULT_HEADER: &str = "X-Gantry-Plugin";
const DEFAULT_VALUE: &str = "processed";

/// Plugin that adds a custom header to every request.
pub struct HeaderInjectPlugin {
    name: String,
    value: String,
}

impl HeaderInjectPlugin {
    /// Inject the given header name/value pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Default for HeaderInjectPlugin {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER, DEFAULT_VALUE)
    }
}

#[async_trait]
impl Plugin for HeaderInjectPlugin {
    async fn metadata(&self) -> Metadata {
        Metadata::new(
            "header-inject",
            env!("CARGO_PKG_VERSION"),
            "Adds a custom header to HTTP requests",
        )
    }

    async fn capabilities(&self) -> Capabilities {
        Capabilities::request_only()
    }

    async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %req.method, url = %req.url, header = %self.name, "injecting header");
        let modified = req.with_header(self.name.clone(), self.value.clone());
        Ok(HttpResponse::pass_with(modified))
    }
}
