//! Flow constants and capability helpers.

use crate::proto::{Capabilities, Flow};

/// The plugin participates in request interception.
pub const FLOW_REQUEST: Flow = Flow::Request;
/// The plugin participates in response interception.
pub const FLOW_RESPONSE: Flow = Flow::Response;

impl Capabilities {
    /// A capability set declaring no flows — a purely passive plugin that
    /// the gateway never invokes beyond metadata queries.
    pub fn none() -> Self {
        Self { flows: Vec::new() }
    }

    /// Declares only the request flow.
    pub fn request_only() -> Self {
        Self::none().with_flow(Flow::Request)
    }

    /// Declares only the response flow.
    pub fn response_only() -> Self {
        Self::none().with_flow(Flow::Response)
    }

    /// Declares both interception flows.
    pub fn both() -> Self {
        Self::none().with_flow(Flow::Request).with_flow(Flow::Response)
    }

    /// Builder helper: add a flow to the declared set.
    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.push_flows(flow);
        self
    }

    /// Whether the given flow is in the declared set.
    ///
    /// Unknown enum values received over the wire are ignored rather than
    /// treated as a declaration.
    pub fn declares(&self, flow: Flow) -> bool {
        self.flows().any(|f| f == flow)
    }
}
