//! JSON-stamping plugin binary: adds `_metadata` to JSON request bodies.

use gantry_plugins::JsonStampPlugin;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let args = (args.len() > 1).then_some(args);

    if let Err(e) = gantry_server::serve(JsonStampPlugin::new(), args).await {
        eprintln!("plugin server error: {e}");
        std::process::exit(1);
    }
}
