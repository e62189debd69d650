use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::filter::MAX_SELECTED_CITIES;
use crate::error::{DashboardError, Result};
use crate::present::{ChartOptions, HISTOGRAM_BINS, HISTOGRAM_OPACITY};

/// Optional settings file, looked up in the working directory.
pub const CONFIG_FILE: &str = "dashboard.json";

/// Dataset shipped next to the binary.
pub const DEFAULT_DATA_PATH: &str = "data/cities_temperatures.csv";

fn literal_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("literal calendar date")
}

/// Start-up settings.  Every field is optional in `dashboard.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    /// Pre-selected cities; names missing from the dataset are skipped.
    pub default_cities: Vec<String>,
    pub default_start: NaiveDate,
    pub default_end: NaiveDate,
    pub max_selected_cities: usize,
    pub histogram_bins: usize,
    pub histogram_opacity: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            default_cities: vec!["Buenos Aires".to_string(), "Dakar".to_string()],
            default_start: literal_date(2000, 1, 1),
            default_end: literal_date(2010, 12, 31),
            max_selected_cities: MAX_SELECTED_CITIES,
            histogram_bins: HISTOGRAM_BINS,
            histogram_opacity: HISTOGRAM_OPACITY,
        }
    }
}

impl DashboardConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let config_err = |reason: String| DashboardError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let config: DashboardConfig =
            serde_json::from_str(&text).map_err(|e| config_err(e.to_string()))?;
        config.validate().map_err(config_err)?;
        Ok(config)
    }

    /// Use `path` when it exists, otherwise the defaults.  An invalid file is
    /// logged and replaced by the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No {} found, using default settings", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("{e}; falling back to default settings");
                Self::default()
            }
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_selected_cities == 0 {
            return Err("max_selected_cities must be at least 1".to_string());
        }
        if self.max_selected_cities > MAX_SELECTED_CITIES {
            return Err(format!("max_selected_cities must be at most {MAX_SELECTED_CITIES}"));
        }
        if self.histogram_bins == 0 {
            return Err("histogram_bins must be at least 1".to_string());
        }
        if !(self.histogram_opacity > 0.0 && self.histogram_opacity <= 1.0) {
            return Err("histogram_opacity must be in (0, 1]".to_string());
        }
        Ok(())
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            histogram_bins: self.histogram_bins,
            histogram_opacity: self.histogram_opacity,
        }
    }
}
