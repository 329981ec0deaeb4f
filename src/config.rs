//! Configuration management for tasksync
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::backend::{SortMode, TaskQuery};
use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, CONFIG_GENERATED, DEFAULT_AUTH_HEADER_ENV, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Comment written above each section of a generated config file.
const SECTION_COMMENTS: &[(&str, &str)] = &[
    (
        "server",
        "Task server. The Authorization header value is read from the\n\
         environment variable named by auth_header_env, never from this file.\n\
         timeout_secs applies per request (1-300).",
    ),
    (
        "sync",
        "Query sent with every pull. sort_by is one of: default, created_desc,\n\
         created_asc, completed_desc, due_date.",
    ),
    (
        "storage",
        "Local task store. Set database_path = \"/path/to/tasks.db\" to override\n\
         the default under the data directory, or in_memory = true to keep\n\
         nothing on disk.",
    ),
    (
        "logging",
        "When enabled, logs are also written to a file in the data directory.\n\
         level is one of: off, error, warn, info, debug, trace.",
    ),
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Remote server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the task server, without the `/api` suffix
    pub base_url: String,
    /// Environment variable holding the full `Authorization` header value
    pub auth_header_env: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Server-side ordering used when pulling
    pub sort_by: SortMode,
    /// Pull archived tasks instead of active ones
    pub show_archived: bool,
}

/// Local store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Keep everything in memory (nothing survives a restart)
    pub in_memory: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write log records to the log file
    pub enabled: bool,
    /// Minimum level: off, error, warn, info, debug, trace
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_header_env: DEFAULT_AUTH_HEADER_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level filter.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        log::LevelFilter::from_str(&self.level).map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl SyncConfig {
    /// Default pull query derived from the configuration.
    pub fn default_query(&self) -> TaskQuery {
        TaskQuery {
            sort_by: self.sort_by,
            show_archived: self.show_archived,
            search: None,
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_DIR_NAME).join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base_url = self.server.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("base_url must start with http:// or https://, got '{}'", self.server.base_url);
        }

        if self.server.auth_header_env.trim().is_empty() {
            anyhow::bail!("auth_header_env cannot be empty");
        }

        if self.server.timeout_secs == 0 || self.server.timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!(
                "timeout_secs must be between 1 and {}, got {}",
                MAX_TIMEOUT_SECS,
                self.server.timeout_secs
            );
        }

        if self.storage.in_memory && self.storage.database_path.is_some() {
            anyhow::bail!("database_path cannot be set together with in_memory = true");
        }

        self.logging.level_filter()?;

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# tasksync configuration file\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &Self::annotate_sections(&toml_content);

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Put each section's comment block above its `[section]` header.
    fn annotate_sections(toml_content: &str) -> String {
        let mut out = String::with_capacity(toml_content.len() + 512);
        for line in toml_content.lines() {
            let section = line.trim().strip_prefix('[').and_then(|l| l.strip_suffix(']'));
            if let Some((_, comment)) = section.and_then(|name| SECTION_COMMENTS.iter().find(|(n, _)| *n == name)) {
                for comment_line in comment.lines() {
                    out.push_str("# ");
                    out.push_str(comment_line);
                    out.push('\n');
                }
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
