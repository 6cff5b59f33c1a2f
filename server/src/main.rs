use anyhow::Result;
use axum::Router;
use clap::Parser;
use designdex::{prepare_search, CacheArgs};
use designdex_cache::SyncOptions;
use designdex_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "designdex-server")]
struct Args {
    #[command(flatten)]
    cache: CacheArgs,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Serve the cached data without contacting the registry
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let cache = args.cache.open()?;
    let search = prepare_search(&cache, SyncOptions::default(), args.offline).await?;
    let app: Router = build_app(search);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
