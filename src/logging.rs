// Logging module for repopulse
// Provides structured logging with timestamp formatting and multiple output formats
//
// Supports text and JSON line formats, console and/or file destinations,
// and independent log levels for console and file output.

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

/// JSON log entry structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

/// Logger routing formatted lines to the configured destinations
pub struct PulseLogger {
    config: LogConfig,
}

impl PulseLogger {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }

    fn format_line(&self, level: Level, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        match self.config.format {
            LogFormat::Text => {
                format!("{} [{}] {}", timestamp, level.to_string().to_uppercase(), message)
            }
            LogFormat::Json => {
                let entry = JsonLogEntry {
                    timestamp,
                    level: level.to_string().to_uppercase(),
                    message: message.to_string(),
                };
                // Fall back to the plain message if serialization ever fails.
                serde_json::to_string(&entry).unwrap_or_else(|_| message.to_string())
            }
        }
    }

    fn console_enabled(&self, level: Level) -> bool {
        matches!(
            self.config.destination,
            LogDestination::Console | LogDestination::Both(_)
        ) && level <= self.config.console_level
    }

    fn file_enabled(&self, level: Level) -> bool {
        matches!(
            self.config.destination,
            LogDestination::File(_) | LogDestination::Both(_)
        ) && self.config.file_level.is_some_and(|file_level| level <= file_level)
    }

    fn file_path(&self) -> Option<&PathBuf> {
        match &self.config.destination {
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
            LogDestination::Console => None,
        }
    }

    fn write_to_file(&self, line: &str, path: &PathBuf) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = result {
            eprintln!("File logging error for {}: {}", path.display(), e);
        }
    }
}

impl log::Log for PulseLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.console_enabled(metadata.level()) || self.file_enabled(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format_line(record.level(), &record.args().to_string());

        if self.console_enabled(record.level()) {
            let _ = writeln!(io::stderr(), "{}", line);
        }
        if self.file_enabled(record.level()) {
            if let Some(path) = self.file_path() {
                self.write_to_file(&line, path);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = match config.file_level {
        Some(file_level) if file_level > config.console_level => file_level,
        _ => config.console_level,
    };

    log::set_boxed_logger(Box::new(PulseLogger::new(config)))
        .context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

/// Convert string to LevelFilter
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
