//! Reusable fixtures for exercising the Gantry contract end-to-end:
//! canned plugin implementations plus helpers that bind a real server on an
//! ephemeral endpoint and hand back a connected client.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

use gantry_kernel::proto::plugin_service_client::PluginServiceClient;
use gantry_kernel::{
    Capabilities, HttpRequest, HttpResponse, Metadata, Plugin, Result, UpstreamResponse,
};
use gantry_server::{PluginServer, ServeConfig, ServerError, ServerState};

// ─────────────────────────────────────────────────────────────────────────────
// Fixture plugins
// ─────────────────────────────────────────────────────────────────────────────

/// Declares no flows at all; the dispatcher must never route traffic to it.
pub struct PassivePlugin;

impl Plugin for PassivePlugin {}

/// Request-only plugin that echoes `method` and `url` into an `X-Echo`
/// header on the rewritten request. Stateless, so N concurrent calls must
/// produce N independent, non-interleaved echoes.
pub struct EchoPlugin;

#[async_trait]
impl Plugin for EchoPlugin {
    async fn metadata(&self) -> Metadata {
        Metadata::new("echo", "0.0.0", "echoes request identity into a header")
    }

    async fn capabilities(&self) -> Capabilities {
        Capabilities::request_only()
    }

    async fn handle_request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let echo = format!("{} {}", req.method, req.url);
        Ok(HttpResponse::pass_with(req.with_header("X-Echo", echo)))
    }
}

/// Holds every request for a fixed delay before passing it through. Used to
/// pin calls in flight across the drain window.
pub struct SlowPlugin {
    delay: Duration,
}

impl SlowPlugin {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Plugin for SlowPlugin {
    async fn capabilities(&self) -> Capabilities {
        Capabilities::request_only()
    }

    async fn handle_request(&self, _req: HttpRequest) -> Result<HttpResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(HttpResponse::pass())
    }
}

/// Panics on the request flow; the dispatcher must convert this into an
/// `INTERNAL` status without taking down the server.
pub struct PanickingPlugin;

#[async_trait]
impl Plugin for PanickingPlugin {
    async fn capabilities(&self) -> Capabilities {
        Capabilities::both()
    }

    async fn handle_request(&self, _req: HttpRequest) -> Result<HttpResponse> {
        panic!("fixture panic");
    }

    async fn handle_response(&self, _resp: UpstreamResponse) -> Result<HttpResponse> {
        panic!("fixture panic");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server harness
// ─────────────────────────────────────────────────────────────────────────────

/// A plugin server running in a background task, with the handles a test
/// needs to drive and observe its lifecycle.
pub struct TestServer {
    /// Bound TCP address (`None` for unix endpoints).
    pub addr: Option<SocketAddr>,
    /// Cancelling this token is equivalent to sending the process SIGTERM.
    pub shutdown: CancellationToken,
    /// Lifecycle state transitions, starting at `Starting`.
    pub state: watch::Receiver<ServerState>,
    /// Completion of the serve future.
    pub task: JoinHandle<std::result::Result<(), ServerError>>,
}

impl TestServer {
    /// Block until the server reaches the given state.
    pub async fn wait_for_state(&mut self, target: ServerState) {
        self.state
            .wait_for(|state| *state == target)
            .await
            .expect("server task dropped the state channel");
    }
}

/// Bind `plugin` on an ephemeral localhost TCP port and start serving.
pub async fn spawn_tcp<P: Plugin>(plugin: P) -> TestServer {
    spawn(plugin, ServeConfig::tcp("127.0.0.1:0")).await
}

/// Bind `plugin` with the given config and start serving.
pub async fn spawn<P: Plugin>(plugin: P, config: ServeConfig) -> TestServer {
    let server = PluginServer::bind(config).await.expect("bind test server");
    let addr = server.local_addr();
    let shutdown = server.shutdown_handle();
    let state = server.state();

    let drain = shutdown.clone();
    let task = tokio::spawn(async move {
        server
            .serve_with_shutdown(plugin, drain.cancelled_owned())
            .await
    });

    TestServer {
        addr,
        shutdown,
        state,
        task,
    }
}

/// Connect a gRPC client to a TCP test server.
pub async fn connect(addr: SocketAddr) -> PluginServiceClient<Channel> {
    PluginServiceClient::connect(format!("http://{addr}"))
        .await
        .expect("connect to test server")
}

/// Connect a gRPC client over a unix domain socket.
pub async fn connect_unix(path: PathBuf) -> PluginServiceClient<Channel> {
    // The URI is required by the HTTP/2 layer but never resolved; the
    // connector dials the socket path instead.
    let channel = Endpoint::try_from("http://[::1]:50051")
        .expect("static endpoint uri")
        .connect_with_connector(service_fn(move |_: Uri| {
            let path = path.clone();
            async move {
                Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?))
            }
        }))
        .await
        .expect("connect to unix test server");
    PluginServiceClient::new(channel)
}
