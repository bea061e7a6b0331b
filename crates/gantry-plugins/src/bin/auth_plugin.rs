//! Bearer-token authentication plugin binary.
//!
//! Expected token comes from `AUTH_TOKEN`. With command-line arguments the
//! gateway-supplied `--address`/`--network` flags are honored; without any,
//! the server runs standalone on TCP (`PLUGIN_PORT`, default 50051).

use gantry_plugins::BearerAuthPlugin;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let args = (args.len() > 1).then_some(args);

    if let Err(e) = gantry_server::serve(BearerAuthPlugin::from_env(), args).await {
        eprintln!("plugin server error: {e}");
        std::process::exit(1);
    }
}
