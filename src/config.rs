//! Configuration types for notification-extractor
//!
//! The configuration file is TOML. Command line flags are layered on top of
//! [`ProcessingConfig`] before the immutable [`RunConfig`] is derived for a run.

use crate::error::{Error, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Database connection configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the database holding the event queue (default: "./eventout.db")
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Maximum open connections (default: 1)
    ///
    /// Every secondary query and delete goes through this pool. With a single
    /// connection all statements are serialized.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds a statement waits for a free connection (default: 86400)
    ///
    /// Workers queue behind the shared connection for as long as the run
    /// lasts, so this is only a backstop against a connection that never
    /// comes back.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Log output configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory for the log file; stdout only when unset
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Default log level filter, overridden by `RUST_LOG` (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            level: default_log_level(),
        }
    }
}

/// How attachments flagged by a notification are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentMode {
    /// Fetch and write every attachment
    #[default]
    Process,
    /// Skip attachment resolution entirely
    Ignore,
    /// Fetch at most this many attachments per record
    Limit(u32),
}

impl AttachmentMode {
    /// Whether attachments are resolved at all
    pub fn enabled(&self) -> bool {
        !matches!(self, AttachmentMode::Ignore)
    }

    /// Row limit to apply to attachment lookups, if any
    pub fn limit(&self) -> Option<u32> {
        match self {
            AttachmentMode::Limit(n) => Some(*n),
            _ => None,
        }
    }
}

/// Record processing behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum records processed in parallel (default: 100)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Leave processed records in the queue (default: false)
    #[serde(default)]
    pub read_only: bool,

    /// Attachment handling (default: process)
    #[serde(default)]
    pub attachments: AttachmentMode,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            read_only: false,
            attachments: AttachmentMode::default(),
        }
    }
}

/// Main configuration for a notification extractor run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Customer tool whose notifications are extracted; matched against destination paths
    pub customer_tool: String,

    /// IANA time zone attachment timestamps are stored in (default: "UTC")
    #[serde(default = "default_tz_code")]
    pub tz_code: String,

    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LogConfig,

    /// Record processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!(
                "unable to read configuration file {}: {}",
                path.display(),
                e
            ),
            key: None,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).map_err(|e| Error::Config {
            message: format!("invalid configuration: {}", e),
            key: None,
        })?;
        config.customer_tool = config.customer_tool.trim().to_uppercase();
        config.tz_code = config.tz_code.trim().to_string();
        if config.tz_code.is_empty() {
            config.tz_code = default_tz_code();
        }
        config.validate()?;
        Ok(config)
    }

    /// Check every setting a run depends on
    pub fn validate(&self) -> Result<()> {
        if self.customer_tool.is_empty() {
            return Err(Error::config(
                "customer_tool",
                "customer tool name was not provided",
            ));
        }
        self.time_zone()?;
        if self.processing.concurrency == 0 {
            return Err(Error::config(
                "processing.concurrency",
                "concurrency must be at least 1",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(Error::config(
                "database.max_connections",
                "at least one database connection is required",
            ));
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err(Error::config(
                "database.acquire_timeout_secs",
                "connection wait must be at least one second",
            ));
        }
        Ok(())
    }

    /// Resolve `tz_code` to a time zone. Names are matched case-insensitively.
    pub fn time_zone(&self) -> Result<Tz> {
        Tz::from_str_insensitive(&self.tz_code).map_err(|_| {
            Error::config(
                "tz_code",
                format!("unknown time zone: {}", self.tz_code),
            )
        })
    }

    /// Name of the log file inside `logging.log_path`
    pub fn log_file_name(&self) -> String {
        format!("{}_NOTIFICATION_EXTRACTOR.log", self.customer_tool)
    }

    /// Freeze this configuration into the value shared by every record task
    pub fn run_config(&self) -> Result<RunConfig> {
        self.validate()?;
        Ok(RunConfig {
            customer_tool: self.customer_tool.clone(),
            time_zone: self.time_zone()?,
            read_only: self.processing.read_only,
            attachments: self.processing.attachments,
            concurrency: self.processing.concurrency,
        })
    }
}

/// Immutable settings for one run, shared by all record tasks
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Customer tool matched against destination paths
    pub customer_tool: String,
    /// Time zone attachment modification times are stored in
    pub time_zone: Tz,
    /// Suppress deletion of processed records
    pub read_only: bool,
    /// Attachment handling
    pub attachments: AttachmentMode,
    /// Maximum records processed in parallel
    pub concurrency: usize,
}

impl RunConfig {
    /// Human-readable run mode, logged at startup
    pub fn describe_mode(&self) -> String {
        let table = if self.read_only {
            "read-only"
        } else {
            "read-write"
        };
        let attachments = match self.attachments {
            AttachmentMode::Process => "attachments are processed".to_string(),
            AttachmentMode::Ignore => "attachments are ignored".to_string(),
            AttachmentMode::Limit(n) => format!("attachments limit: {} file(s)", n),
        };
        format!("eventout is in {} mode, {}", table, attachments)
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./eventout.db")
}

fn default_max_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_concurrency() -> usize {
    100
}

fn default_tz_code() -> String {
    "UTC".to_string()
}
