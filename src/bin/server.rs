use std::env;

use switchboard::server::{serve, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = ServerConfig::new();

    // Simple argument parsing
    for i in 1..args.len() {
        if args[i] == "--port" || args[i] == "-p" {
            if let Some(port_str) = args.get(i + 1) {
                if let Ok(port) = port_str.parse() {
                    config = config.port(port);
                }
            }
        }
        if args[i] == "--host" {
            if let Some(host) = args.get(i + 1) {
                config = config.host(host.clone());
            }
        }
    }

    serve(config).await?;
    Ok(())
}
