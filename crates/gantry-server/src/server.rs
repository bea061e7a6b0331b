//! Bind / serve / graceful-drain lifecycle.
//!
//! A [`PluginServer`] walks an explicit state machine:
//!
//! ```text
//! STARTING ──bind + listener start──► RUNNING
//! RUNNING ──termination signal──────► DRAINING   (no new calls accepted)
//! DRAINING ──in-flight calls done────► STOPPED
//!          └─grace period elapsed───► STOPPED   (outstanding calls aborted)
//! ```
//!
//! The drain is driven by a [`CancellationToken`] handed to the accept loop
//! rather than by signal-handler side effects; OS signals merely cancel the
//! token. State transitions are observable through a `watch` channel.

use std::time::Duration;

use tokio::net::{TcpListener, UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{TcpListenerStream, UnixListenerStream};
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{error, info, warn};

use gantry_kernel::proto::plugin_service_server::PluginServiceServer;
use gantry_kernel::Plugin;

use crate::config::{Network, ServeConfig};
use crate::error::ServerError;
use crate::service::PluginAdapter;

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle state
// ─────────────────────────────────────────────────────────────────────────────

/// Observable lifecycle state of a [`PluginServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed; the listener is bound but calls are not served yet.
    Starting,
    /// Accepting and dispatching calls.
    Running,
    /// No new calls accepted; in-flight calls may finish within the grace
    /// period.
    Draining,
    /// Terminal. The listener is closed and any unix socket file removed.
    Stopped,
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginServer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

/// A bound-but-not-yet-serving plugin dispatcher.
///
/// The listening endpoint is exclusively owned by this instance; binding is
/// eager so an address conflict surfaces as a startup error instead of a
/// silent no-op.
#[derive(Debug)]
pub struct PluginServer {
    config: ServeConfig,
    listener: Listener,
    state_tx: watch::Sender<ServerState>,
    shutdown: CancellationToken,
}

impl PluginServer {
    /// Bind the configured endpoint. `STARTING` until [`serve`](Self::serve)
    /// is called.
    ///
    /// For unix endpoints a leftover socket file is rebound only when no
    /// process answers on it; a connectable socket means the address is in
    /// use and binding fails loudly.
    pub async fn bind(config: ServeConfig) -> Result<Self, ServerError> {
        let listener = match config.network {
            Network::Tcp => {
                let listener = TcpListener::bind(&config.address).await.map_err(|source| {
                    ServerError::Bind {
                        addr: config.address.clone(),
                        source,
                    }
                })?;
                Listener::Tcp(listener)
            }
            Network::Unix => Listener::Unix(bind_unix(&config.address).await?),
        };

        let (state_tx, _) = watch::channel(ServerState::Starting);
        Ok(Self {
            config,
            listener,
            state_tx,
            shutdown: CancellationToken::new(),
        })
    }

    /// The bound TCP address, useful after binding port 0.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        match &self.listener {
            Listener::Tcp(listener) => listener.local_addr().ok(),
            Listener::Unix(_) => None,
        }
    }

    /// Subscribe to lifecycle state transitions.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state_tx.subscribe()
    }

    /// A handle that triggers the drain when cancelled, equivalent to an OS
    /// termination signal.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until interrupted or terminated by an OS signal, then drain.
    pub async fn serve<P: Plugin>(self, plugin: P) -> Result<(), ServerError> {
        self.serve_with_shutdown(plugin, shutdown_signal()).await
    }

    /// Serve until `signal` resolves (or the [`shutdown_handle`](Self::shutdown_handle)
    /// token is cancelled), then drain: stop accepting, wait up to
    /// `grace_period` for in-flight calls, and abort whatever is still
    /// outstanding.
    pub async fn serve_with_shutdown<P, F>(self, plugin: P, signal: F) -> Result<(), ServerError>
    where
        P: Plugin,
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            config,
            listener,
            state_tx,
            shutdown,
        } = self;

        let service = PluginServiceServer::new(PluginAdapter::new(plugin));
        let router = Server::builder()
            .concurrency_limit_per_connection(config.max_workers)
            .add_service(service);

        // OS signal (or any external trigger) funnels into the drain token.
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            signal.await;
            trigger.cancel();
        });

        let mut serve_task: JoinHandle<Result<(), tonic::transport::Error>> = match listener {
            Listener::Tcp(listener) => {
                let incoming = TcpListenerStream::new(listener);
                tokio::spawn(
                    router.serve_with_incoming_shutdown(incoming, shutdown.clone().cancelled_owned()),
                )
            }
            Listener::Unix(listener) => {
                let incoming = UnixListenerStream::new(listener);
                tokio::spawn(
                    router.serve_with_incoming_shutdown(incoming, shutdown.clone().cancelled_owned()),
                )
            }
        };

        let _ = state_tx.send(ServerState::Running);
        info!(
            network = %config.network,
            addr = %config.address,
            max_workers = config.max_workers,
            "plugin server started"
        );

        let result = tokio::select! {
            // The accept loop ended on its own: transport fault.
            joined = &mut serve_task => flatten(joined),

            _ = shutdown.cancelled() => {
                let _ = state_tx.send(ServerState::Draining);
                info!(
                    grace_secs = config.grace_period.as_secs_f64(),
                    "draining: refusing new calls, waiting for in-flight calls"
                );
                drain(serve_task, config.grace_period).await
            }
        };

        let _ = state_tx.send(ServerState::Stopped);
        if config.network == Network::Unix {
            let _ = std::fs::remove_file(&config.address);
        }
        info!("plugin server stopped");
        result
    }
}

async fn drain(
    mut serve_task: JoinHandle<Result<(), tonic::transport::Error>>,
    grace_period: Duration,
) -> Result<(), ServerError> {
    match tokio::time::timeout(grace_period, &mut serve_task).await {
        Ok(joined) => {
            info!("in-flight calls completed within the grace period");
            flatten(joined)
        }
        Err(_) => {
            warn!("grace period elapsed; aborting outstanding calls");
            serve_task.abort();
            Ok(())
        }
    }
}

fn flatten(
    joined: Result<Result<(), tonic::transport::Error>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match joined {
        Ok(result) => result.map_err(ServerError::from),
        Err(join_error) => Err(ServerError::Aborted(join_error.to_string())),
    }
}

async fn bind_unix(address: &str) -> Result<UnixListener, ServerError> {
    let path = std::path::Path::new(address);
    if path.exists() {
        match UnixStream::connect(path).await {
            Ok(_) => {
                return Err(ServerError::Bind {
                    addr: address.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::AddrInUse,
                        "socket is in use by another process",
                    ),
                });
            }
            // Nobody answers: a stale file from a dead process.
            Err(_) => {
                let _ = std::fs::remove_file(path);
            }
        }
    }
    UnixListener::bind(path).map_err(|source| ServerError::Bind {
        addr: address.to_string(),
        source,
    })
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to install SIGINT handler");
                return std::future::pending().await;
            }
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                return std::future::pending().await;
            }
        };

        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT, initiating graceful shutdown"),
            _ = terminate.recv() => info!("received SIGTERM, initiating graceful shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to await interrupt signal");
            return std::future::pending().await;
        }
        info!("received interrupt, initiating graceful shutdown");
    }
}

/// Launch a plugin server for `plugin`.
///
/// This is the convenience entry point a plugin binary calls from `main`.
/// With `args` (typically `std::env::args()`), the gateway-supplied
/// `--address`/`--network` flags are honored and `--address` is required.
/// Without `args`, the server runs standalone on TCP using
/// [`DEFAULT_PORT`](crate::DEFAULT_PORT) / `PLUGIN_PORT`.
///
/// Runs until SIGINT/SIGTERM, then drains within the configured grace
/// period. Bind and configuration failures are returned immediately so the
/// caller can exit non-zero.
pub async fn serve<P, I>(plugin: P, args: Option<I>) -> Result<(), ServerError>
where
    P: Plugin,
    I: IntoIterator<Item = String>,
{
    let config = match args {
        Some(args) => ServeConfig::from_args(args)?,
        None => ServeConfig::standalone(),
    };
    let server = PluginServer::bind(config).await?;
    server.serve(plugin).await
}
