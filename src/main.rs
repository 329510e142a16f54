use anyhow::Result;
use clap::{Parser, Subcommand};
use kvstash::config::AppConfig;
use kvstash::log::init_logging;
use kvstash::{DiskBackend, Stash};
use std::sync::Arc;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Namespace to operate in, overriding the configured one
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON literal; bare text is stored as a string
        value: String,
        /// Expiry for this entry, in milliseconds
        #[arg(long)]
        ttl_ms: Option<u64>,
    },
    /// Print the value stored under a key
    Get { key: String },
    /// Delete a key
    Remove { key: String },
    /// List live keys in the namespace
    Keys,
    /// Show metadata for a key
    Info { key: String },
    /// Approximate bytes used by the namespace
    Size,
    /// Delete every key in the namespace
    Clear,
    /// Sweep expired entries
    Cleanup,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = run(&cli);
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}

fn run(cli: &Cli) -> Result<()> {
    let config = match cli.config_path.as_deref() {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    let backend = Arc::new(DiskBackend::open(config.data_path()?)?);
    let stash = Stash::new(backend, config.stash_config(cli.namespace.as_deref()));

    match &cli.command {
        Commands::Set { key, value, ttl_ms } => kvstash::cli::set(&stash, key, value, *ttl_ms),
        Commands::Get { key } => kvstash::cli::get(&stash, key),
        Commands::Remove { key } => kvstash::cli::remove(&stash, key),
        Commands::Keys => kvstash::cli::keys(&stash),
        Commands::Info { key } => kvstash::cli::info(&stash, key),
        Commands::Size => kvstash::cli::size(&stash),
        Commands::Clear => kvstash::cli::clear(&stash),
        Commands::Cleanup => kvstash::cli::cleanup(&stash),
    }
}
