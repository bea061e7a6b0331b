//! JSON body-stamping plugin.
//!
//! Rewrites JSON object bodies of mutating requests (`POST`/`PUT`/`PATCH`
//! with `Content-Type: application/json`) by adding a `_metadata` object and
//! fixing up `Content-Length`. Malformed JSON is rejected with `400`; bodies
//! that are valid JSON but not objects, empty bodies, and non-JSON traffic
//! pass through untouched.
//!
//! The serialization error branch deliberately decides `continue = true`:
//! failing open on transform errors is this plugin's policy, encoded as an
//! explicit decision rather than left to propagate as an execution fault.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use gantry_kernel::{Capabilities, HttpRequest, HttpResponse, Metadata, Plugin, Result};

const MUTATING_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// Plugin that transforms JSON request bodies by adding metadata fields.
#[derive(Default)]
pub struct JsonStampPlugin;

impl JsonStampPlugin {
    pub fn new() -> Self {
        Self
    }

    fn invalid_json() -> HttpResponse {
        HttpResponse::short_circuit(400)
            .with_header("Content-Type", "application/json")
            .with_body(&br#"{"error": "Invalid JSON"}"#[..])
    }
}

#[async_trait]
impl Plugin for JsonStampPlugin {
    async fn metadata(&self) -> Metadata {
        Metadata::new(
            "json-stamp",
            env!("CARGO_PKG_VERSION"),
            "Transforms JSON request bodies by adding metadata fields",
        )
    }

    async fn capabilities(&self) -> Capabilities {
        Capabilities::request_only()
    }

    async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let content_type = req.header("Content-Type").unwrap_or("");
        if !MUTATING_METHODS.contains(&req.method.as_str())
            || !content_type.contains("application/json")
        {
            debug!(method = %req.method, "skipping non-JSON or non-mutating request");
            return Ok(HttpResponse::pass());
        }

        if req.body.is_empty() {
            debug!("empty body, skipping transformation");
            return Ok(HttpResponse::pass());
        }

        let parsed: Value = match serde_json::from_slice(&req.body) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to parse JSON body");
                return Ok(Self::invalid_json());
            }
        };

        let Value::Object(mut fields) = parsed else {
            debug!("JSON body is not an object, skipping transformation");
            return Ok(HttpResponse::pass());
        };

        fields.insert(
            "_metadata".to_string(),
            json!({
                "processed_by": "json-stamp",
                "version": env!("CARGO_PKG_VERSION"),
                "client_ip": req.remote_addr,
            }),
        );

        let body = match serde_json::to_vec(&Value::Object(fields)) {
            Ok(body) => body,
            Err(e) => {
                // Fail open: forward the original request untouched.
                error!(error = %e, "failed to serialize transformed body");
                return Ok(HttpResponse::pass());
            }
        };

        debug!(body_bytes = body.len(), "request body transformed");
        let length = body.len().to_string();
        let modified = req.with_body(body).with_header("Content-Length", length);
        Ok(HttpResponse::pass_with(modified))
    }
}
