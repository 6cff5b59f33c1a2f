use anyhow::Result;
use clap::{Parser, Subcommand};
use designdex::{build_search, prepare_search, CacheArgs};
use designdex_cache::{SyncOptions, SyncOutcome};
use designdex_core::{CategoryHit, SearchOptions};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "designdex")]
#[command(about = "Search cached design datasets (colors, icons, components) with BM25", long_about = None)]
struct Cli {
    #[command(flatten)]
    cache: CacheArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the dataset when the registry publishes a new version
    Sync {
        /// Download even if the cached version is current
        #[arg(long)]
        force: bool,
        /// Log progress at info level
        #[arg(long, short)]
        verbose: bool,
    },
    /// Compare the cached version with the registry's latest
    Check,
    /// Search all cached datasets
    Search {
        query: String,
        /// Restrict results to one category
        #[arg(long)]
        category: Option<String>,
        /// Keep only records that apply to this stack
        #[arg(long)]
        stack: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Drop hits scoring at or below this value
        #[arg(long, default_value_t = 0.0)]
        min_score: f32,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Use the cache as is, without contacting the registry
        #[arg(long)]
        offline: bool,
    },
    /// List categories with their record counts
    Categories {
        #[arg(long)]
        offline: bool,
    },
    /// Show cache metadata and cached files
    Info,
    /// Remove all cached data
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let cache = cli.cache.open()?;

    match cli.command {
        Commands::Sync { force, verbose } => {
            match cache.sync(SyncOptions { force, verbose }).await? {
                SyncOutcome::Updated { previous, version, files } => {
                    println!("updated {} -> {version} ({files} files)", previous.as_deref().unwrap_or("none"));
                }
                outcome => println!("up to date ({})", outcome.version()),
            }
        }
        Commands::Check => {
            let check = cache.check_update().await?;
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
        Commands::Search { query, category, stack, limit, min_score, json, offline } => {
            let search = prepare_search(&cache, SyncOptions::default(), offline).await?;
            let options = SearchOptions { category, stack, limit, min_score };
            let hits = search.search(&query, &options);
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("no results for '{query}'");
            } else {
                for hit in &hits {
                    println!("{:>8.3}  {:<20} {}", hit.score, hit.id, summary(hit));
                }
            }
        }
        Commands::Categories { offline } => {
            let search = if offline {
                build_search(&cache)
            } else {
                prepare_search(&cache, SyncOptions::default(), false).await?
            };
            for name in search.get_categories() {
                let count = search.get_category_data(name).map_or(0, |rows| rows.len());
                println!("{name}\t{count}");
            }
        }
        Commands::Info => {
            match cache.metadata() {
                Some(meta) => println!("{}", serde_json::to_string_pretty(&meta)?),
                None => println!("no cached data in {}", cache.dir().display()),
            }
            for file in cache.list_files() {
                println!("  {file}");
            }
        }
        Commands::Clear => {
            cache.clear()?;
            println!("cleared {}", cache.dir().display());
        }
    }
    Ok(())
}

/// First few `key=value` pairs of a hit's record, for one-line output.
fn summary(hit: &CategoryHit) -> String {
    hit.data
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) if !s.is_empty() => Some(format!("{key}={s}")),
            Value::Null | Value::String(_) => None,
            other => Some(format!("{key}={other}")),
        })
        .take(4)
        .collect::<Vec<_>>()
        .join("  ")
}
