use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{LayoutEngine, LayoutOptions};
use crate::measure::TableMetrics;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the engine can be tuned with. Missing keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutOptions,
    pub metrics: TableMetrics,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.layout.clone(), self.metrics.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        let columns = [
            ("smallGridColumns", layout.small_grid_columns),
            ("largeGridColumns", layout.large_grid_columns),
            ("isolatedGridColumns", layout.isolated_grid_columns),
        ];
        for (name, value) in columns {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("layout.{name} must be at least 1")));
            }
        }

        let lengths = [
            ("layout.startX", layout.start_x),
            ("layout.startY", layout.start_y),
            ("layout.gapX", layout.gap_x),
            ("layout.gapY", layout.gap_y),
            ("metrics.headerHeight", self.metrics.header_height),
            ("metrics.fieldHeight", self.metrics.field_height),
            ("metrics.footerHeight", self.metrics.footer_height),
            ("metrics.minWidth", self.metrics.min_width),
            ("metrics.fallbackWidth", self.metrics.fallback_width),
            ("metrics.fallbackHeight", self.metrics.fallback_height),
        ];
        for (name, value) in lengths {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be a finite number")));
            }
        }
        Ok(())
    }
}

/// Defaults when `path` is `None`, otherwise the JSON file merged over the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = Config::from_json(&contents)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
