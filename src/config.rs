//! TOML configuration for incident-intel.
//!
//! Layered: the file named by `INCIDENT_INTEL_CONFIG`, then
//! `./incident-intel.toml`, then compiled-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{insights, report, similarity};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "INCIDENT_INTEL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "incident-intel.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default)]
    pub related: RelatedConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A config file that was found but skipped.
#[derive(Debug, Clone)]
pub struct Fallback {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of layered lookup: the config plus what was tried on the way.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub config: Config,
    /// File the config came from; `None` means compiled-in defaults.
    pub source: Option<PathBuf>,
    pub fallbacks: Vec<Fallback>,
}

impl Resolved {
    /// Report the lookup through `tracing`. Call once a subscriber is installed.
    pub fn log(&self) {
        for fallback in &self.fallbacks {
            warn!(
                path = %fallback.path.display(),
                error = %fallback.error,
                "config file could not be loaded, trying fallback"
            );
        }
        match &self.source {
            Some(path) => info!(path = %path.display(), "loaded configuration"),
            None => debug!("no config file found, using compiled-in defaults"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Try the env override, then the working directory, then defaults.
    ///
    /// Runs before logging is configured, so nothing is logged here; see
    /// [`Resolved::log`].
    pub fn resolve() -> Resolved {
        let mut candidates = Vec::new();
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            candidates.push(PathBuf::from(env_path));
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            candidates.push(local);
        }

        let mut fallbacks = Vec::new();
        for path in candidates {
            match Self::load(&path) {
                Ok(config) => {
                    return Resolved {
                        config,
                        source: Some(path),
                        fallbacks,
                    }
                }
                Err(e) => fallbacks.push(Fallback {
                    path,
                    error: format!("{e:#}"),
                }),
            }
        }

        Resolved {
            config: Self::default(),
            source: None,
            fallbacks,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding the incident list.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/incidents.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Maximum insights in a feed.
    pub max_items: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            max_items: insights::MAX_INSIGHTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedConfig {
    pub limit: usize,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            limit: similarity::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Half-width of the seeded perturbation added to the probability.
    /// Zero disables it.
    pub variance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub max_timeline_events: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_timeline_events: report::MAX_TIMELINE_EVENTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
