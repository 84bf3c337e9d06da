//! Configuration management for broterm.
//!
//! Loads configuration from ${BROTERM_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod paths {
    //! BROTERM_HOME resolution order:
    //! 1. BROTERM_HOME environment variable (if set)
    //! 2. ~/.config/broterm (default)

    use std::path::PathBuf;

    pub fn broterm_home() -> PathBuf {
        if let Ok(home) = std::env::var("BROTERM_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_default()
            .join(".config")
            .join("broterm")
    }

    pub fn config_path() -> PathBuf {
        broterm_home().join("config.toml")
    }

    pub fn logs_dir() -> PathBuf {
        broterm_home().join("logs")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when BROTERM_LOG is unset.
    pub level: String,
    /// Directory for rolling log files.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            dir: None,
        }
    }
}

impl LogConfig {
    pub fn dir_or_default(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(paths::logs_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub feed_interval_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            feed_interval_secs: 5,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub feed_capacity: usize,
    pub session_minutes: i64,
    pub tick_ms: u64,
    pub log: LogConfig,
    pub demo: DemoConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "default".into(),
            feed_capacity: crate::feed::DEFAULT_CAPACITY,
            session_minutes: 60,
            tick_ms: 100,
            log: LogConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Commented template with every default spelled out.
    pub fn default_toml() -> &'static str {
        include_str!("../default_config.toml")
    }

    /// Writes the default template to `path`, creating parent directories.
    ///
    /// Fails if a file is already there.
    pub fn init(path: &Path) -> Result<()> {
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        if path.exists() {
            return Err(io_err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "config file already exists",
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, Self::default_toml()).map_err(io_err)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_minutes.max(1))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(10, 1_000))
    }

    pub fn feed_interval(&self) -> Duration {
        Duration::from_secs(self.demo.feed_interval_secs.max(1))
    }
}
