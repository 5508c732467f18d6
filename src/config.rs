//! Settings for the command-line tool and embedders.
//!
//! Read from `<config_dir>/pgplan/config.toml`; a missing file means
//! defaults. `PGPLAN_DATABASE_URL` overrides the file's database URL.

use crate::error::{PlanError, PlanResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`Settings::database_url`].
pub const DATABASE_URL_ENV: &str = "PGPLAN_DATABASE_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// PostgreSQL connection URL
    pub database_url: Option<String>,

    /// `tracing` filter directive, e.g. `pgplan=debug`
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Default location of the settings file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pgplan").join("config.toml"))
    }

    /// Load from the default location, then apply the environment.
    pub fn load() -> PlanResult<Self> {
        let settings = match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path)?,
            _ => Self::default(),
        };
        Ok(settings.with_database_url(std::env::var(DATABASE_URL_ENV).ok()))
    }

    /// Load an explicit settings file.
    pub fn from_path(path: &Path) -> PlanResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| PlanError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Override the database URL when `url` is set.
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.database_url = Some(url);
        }
        self
    }
}
