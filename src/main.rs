use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use feedrelay::config::Config;
use feedrelay::feed::FeedFetcher;
use feedrelay::registry::Registry;
use feedrelay::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "feedrelay",
    about = "Relay upstream RSS/Atom feeds as JSON, addressed by platform and topic"
)]
struct Args {
    /// Configuration file (optional; defaults apply when missing)
    #[arg(long, value_name = "FILE", default_value = "feedrelay.toml")]
    config: PathBuf,

    /// Listen address, overriding `bind` from the config file
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Print the resolved topic registry and exit
    #[arg(long)]
    list_topics: bool,
}

fn print_registry(registry: &Registry) {
    for (name, platform) in registry.platforms() {
        println!("{} ({})", name, platform.format);
        for (topic, url) in &platform.topics {
            if url.is_empty() {
                continue;
            }
            println!("  {:<24} {}", topic, url);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let registry = config.registry().context("Invalid topic registry")?;

    if args.list_topics {
        print_registry(&registry);
        return Ok(());
    }

    if registry.is_empty() {
        tracing::warn!("No platforms registered, every topic request will return 404");
    }

    let fetcher =
        FeedFetcher::new(config.fetch_options()).context("Failed to build HTTP client")?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    tracing::info!(
        addr = %config.bind,
        platforms = registry.platforms().count(),
        "Listening"
    );

    let state = AppState::new(registry, fetcher);
    server::run(listener, state, server::shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
