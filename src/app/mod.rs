//! Application wiring
//!
//! Assembles storage, the provider registry and the cache from CLI
//! arguments and configuration, then drives fetch and rendering.

use crate::cache::RepoInfoCache;
use crate::cli::{parse_repo_spec, Args};
use crate::config::ConfigManager;
use crate::display::{self, OutputFormat};
use crate::gateway::{GatewayRegistry, GithubGateway};
use crate::logging::{LogConfig, LogDestination, LogFormat};
use crate::model::{RepoInfoRecord, RepoSource, RepoSummary};
use crate::storage::{JsonFileStorage, MemoryStorage, RepoInfoStorage};
use anyhow::{anyhow, Context, Result};
use futures::future::try_join_all;
use log::{debug, LevelFilter};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Load configuration honouring the `--config-file` flag.
pub fn load_configuration(args: &Args) -> Result<ConfigManager> {
    ConfigManager::load(args.config_file.as_deref())
}

/// Derive the logging configuration from flags and the config file.
pub fn configure_logging(args: &Args, config: &ConfigManager) -> Result<LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config
            .get_log_level("logging", "level")?
            .unwrap_or(LevelFilter::Info)
    };

    let format: LogFormat = args
        .log_format
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let (destination, file_level) = match &args.log_file {
        Some(path) => {
            let file_level = match &args.log_file_level {
                Some(level) => crate::logging::parse_log_level(level)?,
                None => console_level,
            };
            (LogDestination::Both(path.clone()), Some(file_level))
        }
        None => (LogDestination::Console, None),
    };

    Ok(LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Default storage file location under the platform data directory.
fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repopulse")
        .join("repo_info.json")
}

/// Build the cache: storage backend, provider registry and TTL.
pub fn build_cache(args: &Args, config: &ConfigManager) -> Result<RepoInfoCache> {
    let storage: Arc<dyn RepoInfoStorage> = if args.ephemeral {
        debug!("Using ephemeral in-memory storage");
        Arc::new(MemoryStorage::new())
    } else {
        let path = args
            .storage
            .clone()
            .or_else(|| config.storage_path())
            .unwrap_or_else(default_storage_path);
        debug!("Using storage file {}", path.display());
        Arc::new(
            JsonFileStorage::open(&path)
                .with_context(|| format!("Failed to open storage at {}", path.display()))?,
        )
    };

    let token = args.token.clone().or_else(|| config.github_token());
    let api_base = args.api_base.clone().or_else(|| config.github_api_base());

    let mut registry = GatewayRegistry::new();
    registry.register("github", GithubGateway::factory(token, api_base));

    let ttl_seconds = match args.ttl {
        Some(ttl) => ttl,
        None => config.ttl_seconds()?,
    };

    Ok(RepoInfoCache::new(
        storage,
        registry,
        Duration::from_secs(ttl_seconds),
    ))
}

fn parse_sources(args: &Args) -> Result<Vec<RepoSource>> {
    args.repos
        .iter()
        .map(|spec| parse_repo_spec(spec, &args.provider))
        .collect()
}

/// Run the application: fetch the requested repositories and render them.
pub async fn run(args: Args, config: ConfigManager) -> Result<()> {
    let cache = build_cache(&args, &config)?;
    let format: OutputFormat = args.output.parse().map_err(|e: String| anyhow!(e))?;
    let use_colour = std::io::stdout().is_terminal();

    if !args.by_id.is_empty() {
        let records = cache.get_by_ids(&args.by_id).await?;
        print_records(&records, format, use_colour)?;
        return Ok(());
    }

    let sources = parse_sources(&args)?;

    if args.summary {
        let summaries: Vec<RepoSummary> =
            try_join_all(sources.iter().map(|source| cache.summary(source))).await?;
        match format {
            OutputFormat::Table => print!("{}", display::render_summaries_table(&summaries, use_colour)),
            OutputFormat::Json => println!("{}", display::render_json(&summaries)?),
        }
        return Ok(());
    }

    let records: Vec<RepoInfoRecord> =
        try_join_all(sources.iter().map(|source| cache.get_or_fetch(source))).await?;
    print_records(&records, format, use_colour)
}

fn print_records(records: &[RepoInfoRecord], format: OutputFormat, use_colour: bool) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", display::render_records_table(records, use_colour)),
        OutputFormat::Json => println!("{}", display::render_json(records)?),
    }
    Ok(())
}
