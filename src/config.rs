// config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::selection::DEFAULT_FOLLOW_ZOOM;

/// Config file read when `PARCEL_MAPPER_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "parcel-mapper.json";
pub const CONFIG_PATH_ENV: &str = "PARCEL_MAPPER_CONFIG";

/// Application settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding the saved plots
    pub store_path: PathBuf,
    /// Directory for PNG exports
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// `[longitude, latitude]` shown at startup
    pub map_center: [f64; 2],
    pub map_zoom: f64,
    /// Zoom used when flying to a selected plot
    pub follow_zoom: f64,
    pub tick_rate_ms: u64,
    /// Fixed seed for plot colors; random when absent
    pub color_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store_path: PathBuf::from("data/plots.json"),
            output_dir: PathBuf::from("output/"),
            log_file: PathBuf::from("parcel-mapper.log"),
            log_level: "info".to_string(),
            map_center: [-7.6, 33.5],
            map_zoom: 11.0,
            follow_zoom: DEFAULT_FOLLOW_ZOOM,
            tick_rate_ms: 250,
            color_seed: None,
        }
    }
}

impl AppConfig {
    /// Path given by `PARCEL_MAPPER_CONFIG`, or the default file name.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config: AppConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let [lon, lat] = self.map_center;
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(ConfigError::Invalid(format!(
                "map_center [{}, {}] is outside the world",
                lon, lat
            )));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("tick_rate_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// I/O error when reading the config file
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
