use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::time::TimeBase;

pub const DEFAULT_SEGMENTATION_THRESHOLD_S: f64 = 3600.0;
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.02;
pub const DEFAULT_TRIM_FRACTION: f64 = 0.10;
pub const DEFAULT_DECIMATION_INTERVAL_S: f64 = 60.0;
pub const DEFAULT_VALUE_FLOOR: f64 = 0.001;
pub const DEFAULT_MAX_CANDIDATE_FILES: usize = 250;

/// Tunable parameters of the correction engine.
///
/// The trim fraction and decimation interval are empirical; they are exposed so
/// deployments can adjust them, not because other values are known to be better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Gap in seconds above which consecutive records belong to different profiles.
    pub segmentation_threshold_s: f64,
    /// Maximum absolute difference for two values to count as the same moment.
    pub match_tolerance: f64,
    /// Fraction of a reference profile dropped from each end before use.
    pub trim_fraction: f64,
    /// Minimum spacing in seconds between retained interpolation model nodes.
    pub decimation_interval_s: f64,
    /// Reference values at or below this are treated as pre-deployment noise.
    pub value_floor: f64,
    /// Upper bound on neighbouring reference files searched per target file.
    pub max_candidate_files: usize,
    pub time_base: TimeBase,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            segmentation_threshold_s: DEFAULT_SEGMENTATION_THRESHOLD_S,
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
            trim_fraction: DEFAULT_TRIM_FRACTION,
            decimation_interval_s: DEFAULT_DECIMATION_INTERVAL_S,
            value_floor: DEFAULT_VALUE_FLOOR,
            max_candidate_files: DEFAULT_MAX_CANDIDATE_FILES,
            time_base: TimeBase::default(),
        }
    }
}

impl CorrectionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CorrectionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("segmentation_threshold_s", self.segmentation_threshold_s)?;
        non_negative("match_tolerance", self.match_tolerance)?;
        non_negative("decimation_interval_s", self.decimation_interval_s)?;
        non_negative("value_floor", self.value_floor)?;

        if !(0.0..0.5).contains(&self.trim_fraction) {
            return Err(ConfigError::Invalid {
                field: "trim_fraction",
                message: format!("{} is outside [0, 0.5)", self.trim_fraction),
            });
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            message: format!("{value} must be a finite, non-negative number"),
        })
    }
}
