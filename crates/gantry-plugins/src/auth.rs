//! Bearer-token authentication plugin.
//!
//! Accepts requests that carry `Authorization: Bearer <token>` matching the
//! expected token captured at construction. Everything else receives a
//! `401 Unauthorized` short-circuit with a JSON error body and a
//! `WWW-Authenticate: Bearer` challenge.

use async_trait::async_trait;
use tracing::{info, warn};

use gantry_kernel::{
    Capabilities, HttpRequest, HttpResponse, Metadata, Plugin, PluginConfig, PluginError, Result,
};

/// Environment variable holding the expected token.
pub const TOKEN_ENV: &str = "AUTH_TOKEN";

const DEFAULT_TOKEN: &str = "secret-token-123";

/// Plugin that validates Bearer token authentication.
pub struct BearerAuthPlugin {
    /// The precomputed expected token. Read-only after construction, which
    /// is what makes this plugin safe under concurrent invocation.
    expected_token: String,
}

impl BearerAuthPlugin {
    /// Build the plugin with an explicit expected token.
    pub fn new(expected_token: impl Into<String>) -> Self {
        Self {
            expected_token: expected_token.into(),
        }
    }

    /// Build the plugin from a [`PluginConfig`] carrying a `token` key.
    pub fn from_config(config: &PluginConfig) -> Result<Self> {
        Ok(Self::new(config.require("token")?))
    }

    /// Build the plugin from the `AUTH_TOKEN` environment variable, falling
    /// back to the well-known test token.
    pub fn from_env() -> Self {
        Self::new(std::env::var(TOKEN_ENV).unwrap_or_else(|_| DEFAULT_TOKEN.to_string()))
    }

    fn unauthorized(message: &str) -> HttpResponse {
        HttpResponse::short_circuit(401)
            .with_header("Content-Type", "application/json")
            .with_header("WWW-Authenticate", "Bearer")
            .with_body(format!("{{\"error\": \"{message}\"}}"))
    }
}

#[async_trait]
impl Plugin for BearerAuthPlugin {
    async fn metadata(&self) -> Metadata {
        Metadata::new(
            "bearer-auth",
            env!("CARGO_PKG_VERSION"),
            "Validates Bearer token authentication",
        )
    }

    async fn capabilities(&self) -> Capabilities {
        Capabilities::request_only()
    }

    async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let Some(token) = req
            .header("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
        else {
            warn!(method = %req.method, url = %req.url, "missing or malformed Authorization header");
            return Ok(Self::unauthorized("Missing or invalid Authorization header"));
        };

        if token != self.expected_token {
            warn!(method = %req.method, url = %req.url, "invalid token");
            return Ok(Self::unauthorized("Invalid token"));
        }

        info!(method = %req.method, url = %req.url, "authentication successful");
        Ok(HttpResponse::pass())
    }
}
