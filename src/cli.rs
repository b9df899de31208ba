use crate::model::RepoSource;
use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Repository activity metrics tool
#[derive(Parser, Debug)]
#[command(name = "repopulse")]
#[command(about = "Fetch, cache and compare repository activity metrics (pull requests, contributors, trends) from hosting providers")]
#[command(version)]
pub struct Args {
    /// Repositories to inspect, as `owner/repo` or `provider/owner/repo`
    #[arg(value_name = "REPO")]
    pub repos: Vec<String>,

    /// Default provider for bare `owner/repo` specs
    #[arg(long, value_name = "NAME", default_value = "github")]
    pub provider: String,

    /// Look up previously cached records by storage id instead of fetching
    #[arg(long = "by-id", value_name = "ID", action = ArgAction::Append)]
    pub by_id: Vec<u64>,

    /// Fetch a live counts-only summary, bypassing the cache
    #[arg(long)]
    pub summary: bool,

    /// Cache time-to-live in seconds
    #[arg(long, value_name = "SECONDS")]
    pub ttl: Option<u64>,

    /// Storage file path
    #[arg(long, value_name = "FILE")]
    pub storage: Option<PathBuf>,

    /// Keep records in memory only, without a storage file
    #[arg(long)]
    pub ephemeral: bool,

    /// Hosting provider API token (falls back to GITHUB_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Override the provider API base URL
    #[arg(long = "api-base", value_name = "URL")]
    pub api_base: Option<String>,

    /// Output format: table or json
    #[arg(short = 'o', long, value_name = "FORMAT", default_value = "table")]
    pub output: String,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

/// Validate argument combinations before any work happens
pub fn validate_args(args: &Args) -> Result<()> {
    if args.repos.is_empty() && args.by_id.is_empty() {
        bail!("Nothing to do: pass at least one REPO spec or --by-id");
    }
    if args.verbose && args.quiet {
        bail!("--verbose and --quiet are mutually exclusive");
    }
    if args.summary && !args.by_id.is_empty() {
        bail!("--summary and --by-id are mutually exclusive");
    }
    for spec in &args.repos {
        parse_repo_spec(spec, &args.provider)?;
    }
    Ok(())
}

/// Parse a repository spec into its source identity.
///
/// `owner/repo` uses the default provider; `provider/owner/repo` names one
/// explicitly.
pub fn parse_repo_spec(spec: &str, default_provider: &str) -> Result<RepoSource> {
    let parts: Vec<&str> = spec.split('/').collect();
    let source = match parts.as_slice() {
        [owner, repo] => RepoSource::new(default_provider, *owner, *repo),
        [provider, owner, repo] => RepoSource::new(*provider, *owner, *repo),
        _ => bail!("Invalid repository spec '{}': expected owner/repo or provider/owner/repo", spec),
    };
    if source.provider.is_empty() || source.owner.is_empty() || source.repo.is_empty() {
        bail!("Invalid repository spec '{}': empty component", spec);
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_bare_spec_uses_default_provider() {
        let source = parse_repo_spec("torvalds/linux", "github").unwrap();
        assert_eq!(source, RepoSource::new("github", "torvalds", "linux"));
    }

    #[test]
    fn test_parse_full_spec_overrides_provider() {
        let source = parse_repo_spec("gitlab/group/project", "github").unwrap();
        assert_eq!(source, RepoSource::new("gitlab", "group", "project"));
    }

    #[test]
    fn test_parse_invalid_specs() {
        assert!(parse_repo_spec("linux", "github").is_err());
        assert!(parse_repo_spec("a/b/c/d", "github").is_err());
        assert!(parse_repo_spec("/linux", "github").is_err());
        assert!(parse_repo_spec("torvalds/", "github").is_err());
    }

    #[test]
    fn test_validate_requires_repo_or_id() {
        let args = args_from(&["repopulse"]);
        assert!(validate_args(&args).is_err());

        let args = args_from(&["repopulse", "torvalds/linux"]);
        assert!(validate_args(&args).is_ok());

        let args = args_from(&["repopulse", "--by-id", "3"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_rejects_verbose_and_quiet() {
        let args = args_from(&["repopulse", "-v", "-q", "torvalds/linux"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_summary_with_by_id() {
        let args = args_from(&["repopulse", "--summary", "--by-id", "1", "torvalds/linux"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_spec() {
        let args = args_from(&["repopulse", "not-a-spec"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_flag_defaults() {
        let args = args_from(&["repopulse", "torvalds/linux"]);
        assert_eq!(args.provider, "github");
        assert_eq!(args.output, "table");
        assert_eq!(args.log_format, "text");
        assert!(!args.ephemeral);
        assert!(args.ttl.is_none());
    }

    #[test]
    fn test_by_id_accumulates() {
        let args = args_from(&["repopulse", "--by-id", "1", "--by-id", "2"]);
        assert_eq!(args.by_id, vec![1, 2]);
    }
}
