use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Default time-to-live for cached records, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 60 * 60;

/// Environment variable overriding the cache TTL.
pub const TTL_ENV_VAR: &str = "REPOPULSE_TTL_SECONDS";

/// Environment variable the GitHub token falls back to.
pub const GITHUB_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Configuration manager
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a ConfigManager from an in-memory Configuration (primarily
    /// for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
        }
    }

    /// Load configuration using the discovery hierarchy: an explicit path,
    /// then `./repopulse.toml`, then the user config directory.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load_from_file(path.to_path_buf());
        }

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        debug!("No configuration file found, using empty configuration");
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
        })
    }

    /// Path of the file this configuration was loaded from, if any.
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Get a raw value from the configuration
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        self.config.get(section).and_then(|s| s.get(key))
    }

    /// Get an integer value with type conversion
    pub fn get_u64(&self, section: &str, key: &str) -> Result<Option<u64>> {
        match self.get_value(section, key) {
            Some(value) => value
                .parse::<u64>()
                .map(Some)
                .with_context(|| format!("Invalid integer value for {}.{}: {}", section, key, value)),
            None => Ok(None),
        }
    }

    /// Get a path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Get a log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Cache TTL in seconds: `[cache] ttl-seconds`, then the environment
    /// override, then the one hour default.
    pub fn ttl_seconds(&self) -> Result<u64> {
        if let Some(ttl) = self.get_u64("cache", "ttl-seconds")? {
            return Ok(ttl);
        }
        if let Ok(value) = env::var(TTL_ENV_VAR) {
            return value
                .parse::<u64>()
                .with_context(|| format!("Invalid {} value: {}", TTL_ENV_VAR, value));
        }
        Ok(DEFAULT_TTL_SECONDS)
    }

    /// GitHub API token: `[github] token`, falling back to `GITHUB_TOKEN`.
    pub fn github_token(&self) -> Option<String> {
        self.get_value("github", "token")
            .cloned()
            .or_else(|| env::var(GITHUB_TOKEN_ENV_VAR).ok())
    }

    /// Override for the GitHub API base URL (`[github] api-base`).
    pub fn github_api_base(&self) -> Option<String> {
        self.get_value("github", "api-base").cloned()
    }

    /// Storage file path (`[storage] path`).
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.get_path("storage", "path")
    }
}

/// Candidate configuration file locations, in priority order.
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("repopulse.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("repopulse").join("config.toml"));
    }
    paths
}

/// Parse TOML into the section -> key -> value map. Top-level scalar keys
/// land in the "base" section; nested values are stringified.
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let value: Value = content.parse().context("Invalid TOML")?;
    let mut config = Configuration::new();

    let Value::Table(root) = value else {
        return Ok(config);
    };

    for (key, entry) in root {
        match entry {
            Value::Table(table) => {
                let section = config.entry(key).or_default();
                for (inner_key, inner_value) in table {
                    section.insert(inner_key, stringify_value(&inner_value));
                }
            }
            other => {
                config
                    .entry("base".to_string())
                    .or_default()
                    .insert(key, stringify_value(&other));
            }
        }
    }

    Ok(config)
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_base_keys() {
        let content = r#"
verbose = true

[cache]
ttl-seconds = 1800

[github]
token = "ghp_example"
"#;
        let config = parse_toml_config(content).unwrap();
        assert_eq!(config["base"]["verbose"], "true");
        assert_eq!(config["cache"]["ttl-seconds"], "1800");
        assert_eq!(config["github"]["token"], "ghp_example");
    }

    #[test]
    fn test_parse_invalid_toml_fails() {
        assert!(parse_toml_config("this is [not toml").is_err());
    }

    #[test]
    fn test_get_u64_conversion() {
        let manager = ConfigManager::from_config(
            parse_toml_config("[cache]\nttl-seconds = 900\nbad = \"abc\"").unwrap(),
        );
        assert_eq!(manager.get_u64("cache", "ttl-seconds").unwrap(), Some(900));
        assert_eq!(manager.get_u64("cache", "missing").unwrap(), None);
        assert!(manager.get_u64("cache", "bad").is_err());
    }

    #[test]
    fn test_ttl_prefers_config_over_default() {
        let manager =
            ConfigManager::from_config(parse_toml_config("[cache]\nttl-seconds = 120").unwrap());
        assert_eq!(manager.ttl_seconds().unwrap(), 120);

        let empty = ConfigManager::default();
        // The default only applies when the env override is absent.
        if env::var(TTL_ENV_VAR).is_err() {
            assert_eq!(empty.ttl_seconds().unwrap(), DEFAULT_TTL_SECONDS);
        }
    }

    #[test]
    fn test_github_token_from_config() {
        let manager =
            ConfigManager::from_config(parse_toml_config("[github]\ntoken = \"tok\"").unwrap());
        assert_eq!(manager.github_token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_storage_path() {
        let manager = ConfigManager::from_config(
            parse_toml_config("[storage]\npath = \"/tmp/records.json\"").unwrap(),
        );
        assert_eq!(
            manager.storage_path(),
            Some(PathBuf::from("/tmp/records.json"))
        );
        assert_eq!(ConfigManager::default().storage_path(), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repopulse.toml");
        fs::write(&path, "[cache]\nttl-seconds = 60\n").unwrap();

        let manager = ConfigManager::load_from_file(path.clone()).unwrap();
        assert_eq!(manager.ttl_seconds().unwrap(), 60);
        assert_eq!(manager.config_file_path(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        assert!(ConfigManager::load(Some(Path::new("/nonexistent/repopulse.toml"))).is_err());
    }
}
