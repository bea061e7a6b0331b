//! Constructors and builder helpers for the envelope model.
//!
//! All envelope types are owned, allocation-friendly values so they can be
//! sent across async task boundaries without lifetime complications. A fresh
//! envelope is constructed per call and never retained past it.

use crate::error::PluginError;
use crate::proto::{HttpRequest, HttpResponse, Metadata, PluginConfig, UpstreamResponse};

impl Metadata {
    /// Construct plugin metadata.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
        }
    }
}

impl HttpRequest {
    /// Construct a minimal request with the given method and URL.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Builder helper: set the path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Builder helper: attach a header. Keys are kept case-sensitive as
    /// transmitted; normalization is the gateway's concern, not the contract's.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-sensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

impl HttpResponse {
    /// Decision: let traffic proceed unchanged.
    pub fn pass() -> Self {
        Self {
            r#continue: true,
            ..Default::default()
        }
    }

    /// Decision: let traffic proceed with the given rewritten request.
    pub fn pass_with(modified: HttpRequest) -> Self {
        Self {
            r#continue: true,
            modified_request: Some(modified),
            ..Default::default()
        }
    }

    /// Decision: terminate the request/response path with a synthetic
    /// response carrying the given status.
    pub fn short_circuit(status: u16) -> Self {
        Self {
            r#continue: false,
            status_code: i32::from(status),
            ..Default::default()
        }
    }

    /// Builder helper: attach a header to the synthetic response.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Builder helper: set the synthetic response body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether this decision terminates the traffic path.
    pub fn is_short_circuit(&self) -> bool {
        !self.r#continue
    }

    /// Enforce the decision invariant: a short-circuit must not carry a
    /// `modified_request`. The dispatcher checks this before a decision
    /// leaves the process.
    pub fn validate(&self) -> Result<(), PluginError> {
        if !self.r#continue && self.modified_request.is_some() {
            return Err(PluginError::ConflictingDecision);
        }
        Ok(())
    }
}

impl UpstreamResponse {
    /// Construct an observed upstream response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status_code: i32::from(status),
            ..Default::default()
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builder helper: attach the request that produced this response.
    pub fn with_request(mut self, request: HttpRequest) -> Self {
        self.request = Some(request);
        self
    }
}

impl PluginConfig {
    /// Build a config from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            custom_config: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a config value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.custom_config.get(key).map(String::as_str)
    }

    /// Look up a required config value, reporting a
    /// [`PluginError::MissingConfig`] when absent.
    pub fn require(&self, key: &str) -> Result<&str, PluginError> {
        self.get(key)
            .ok_or_else(|| PluginError::MissingConfig(key.to_string()))
    }
}
