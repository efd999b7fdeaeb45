//! Optional RON settings file overriding the built-in defaults.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bookgrab_engine::AcquireSettings;
use grab_logging::{grab_debug, grab_info};
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "bookgrab";
const CONFIG_FILENAME: &str = "config.ron";

/// Every field is optional; missing fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub poll_interval_ms: Option<u64>,
    pub ready_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub redirect_limit: Option<usize>,
    pub max_bytes: Option<u64>,
    pub user_agent: Option<String>,
    /// Directory suggested for new PDFs.
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        ron::from_str(content).context("invalid settings file")
    }

    /// Loads `explicit`, or the per-user settings file when it exists.
    /// An explicit path that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = fs::read_to_string(path)
                .with_context(|| format!("cannot read settings file {}", path.display()))?;
            grab_info!("settings loaded from {}", path.display());
            return Self::parse(&content);
        }

        let Some(path) = default_config_path().filter(|path| path.is_file()) else {
            grab_debug!("no settings file, using defaults");
            return Ok(Self::default());
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        grab_info!("settings loaded from {}", path.display());
        Self::parse(&content)
    }

    pub fn apply(&self, mut settings: AcquireSettings) -> AcquireSettings {
        if let Some(ms) = self.poll_interval_ms {
            settings.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.ready_timeout_ms {
            settings.ready_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            settings.fetch.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms {
            settings.fetch.request_timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = self.redirect_limit {
            settings.fetch.redirect_limit = limit;
        }
        if let Some(max) = self.max_bytes {
            settings.fetch.max_bytes = max;
        }
        if let Some(agent) = &self.user_agent {
            settings.fetch.user_agent = Some(agent.clone());
        }
        settings
    }

    /// Configured output directory, else the user's documents folder.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::document_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}
