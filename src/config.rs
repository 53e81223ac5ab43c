//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! crossing-config.toml file. It provides a centralized way to configure the
//! crossing location, the solar data service, output locations and the
//! walking-plan offsets.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "crossing-config.toml";

/// Application configuration loaded from crossing-config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the crossing is, for solar lookups
    pub location: LocationConfig,
    /// Solar data service settings
    pub solar: SolarConfig,
    /// Input defaults and output locations
    pub output: OutputConfig,
    /// Walking plan offsets
    pub planner: PlannerConfig,
}

/// Fixed geographic location of the crossing
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Human-readable name for log output
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Solar data service configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SolarConfig {
    /// sunrisesunset.io JSON endpoint
    pub base_url: String,
    /// Per-request timeout; a timeout counts as a failed lookup
    pub timeout_secs: u64,
    /// Pause after each real lookup to go easy on the service
    pub courtesy_delay_ms: u64,
}

/// Input and output locations
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the JSON datasets are written to (created if absent)
    pub dir: PathBuf,
    /// Source label stored in the dataset metadata
    pub source_label: String,
    /// Input used when no path is given on the command line
    pub default_input: PathBuf,
}

/// Walking plan offsets for the crossing planner
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Minutes before the window midpoint to be at the causeway
    pub causeway_lead_minutes: i64,
    /// Walking time from the start point to the causeway (Naismith's Rule)
    pub walk_minutes: i64,
    /// Windows shorter than this are flagged as unusual
    pub typical_min_hours: i64,
    /// Windows longer than this are flagged as unusual
    pub typical_max_hours: i64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            name: "Holy Island".to_string(),
            latitude: 55.6694,
            longitude: -1.7975,
        }
    }
}

impl Default for SolarConfig {
    fn default() -> Self {
        SolarConfig {
            base_url: "https://api.sunrisesunset.io/json".to_string(),
            timeout_secs: 10,
            courtesy_delay_ms: 100,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("./data"),
            source_label: "Northumberland Council Holy Island Crossing Times".to_string(),
            default_input: PathBuf::from("./sourcedata/08-25.html"),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            causeway_lead_minutes: 90,
            walk_minutes: 300,
            typical_min_hours: 6,
            typical_max_hours: 10,
        }
    }
}

impl SolarConfig {
    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.courtesy_delay_ms)
    }
}

impl Config {
    /// Load configuration from crossing-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), location = %config.location.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file format, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
