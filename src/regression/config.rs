// Configuration for noise-aware regression classification
//
// One configuration is fixed for the duration of a comparison run. Values
// come from built-in defaults, an optional TOML file, and the CI
// environment, in that order of increasing precedence.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable for `default_threshold_pct`
pub const ENV_THRESHOLD_PERCENT: &str = "THRESHOLD_PERCENT";
/// Environment variable for `noise_multiplier`
pub const ENV_NOISE_MULTIPLIER: &str = "NOISE_MULTIPLIER";
/// Environment variable for `error_multiplier`
pub const ENV_ERROR_MULTIPLIER: &str = "ERROR_MULTIPLIER";
/// Environment variable for `abs_delta_floor_ns`
pub const ENV_ABS_DELTA_NS_FLOOR: &str = "ABS_DELTA_NS_FLOOR";
/// Environment variable for `delta_margin_pct`
pub const ENV_DELTA_MARGIN_PERCENT: &str = "DELTA_MARGIN_PERCENT";

/// Errors raised while building a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Environment variable {name}={value:?} is not a number")]
    Env { name: &'static str, value: String },
}

/// Named starting points for the classification settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Preset {
    /// 5% threshold, 2% margin, 2ns floor
    #[default]
    Default,
    /// Flags smaller changes (3% threshold, 1% margin, 1ns floor)
    Strict,
    /// Only large changes (10% threshold, 5% margin, 5ns floor)
    Permissive,
}

impl Preset {
    pub fn config(self) -> ComparisonConfig {
        match self {
            Preset::Default => ComparisonConfig::default(),
            Preset::Strict => ComparisonConfig::strict(),
            Preset::Permissive => ComparisonConfig::permissive(),
        }
    }
}

/// Which way a metric moves when performance gets worse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Timings: a positive delta is a regression
    #[default]
    LowerIsBetter,
    /// Throughput: a negative delta is a regression
    HigherIsBetter,
}

/// Configuration for regression classification
///
/// # Example
/// ```
/// use benchdiff::regression::ComparisonConfig;
///
/// let config = ComparisonConfig::default();
/// assert_eq!(config.default_threshold_pct, 5.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Significance threshold (percent) used when a report declares none
    pub default_threshold_pct: f64,

    /// Scale applied to the larger coefficient of variation to get the
    /// noise floor
    pub noise_multiplier: f64,

    /// Scale applied to the combined reported error to get the uncertainty
    /// floor
    pub error_multiplier: f64,

    /// Minimum absolute change (ns) for a change to be flagged
    pub abs_delta_floor_ns: f64,

    /// Extra percentage points a change must clear above the effective
    /// threshold
    pub delta_margin_pct: f64,

    /// Sign convention used when grouping flagged changes
    pub direction: Direction,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            default_threshold_pct: 5.0,
            noise_multiplier: 2.0,
            error_multiplier: 1.0,
            abs_delta_floor_ns: 2.0,
            delta_margin_pct: 2.0,
            direction: Direction::LowerIsBetter,
        }
    }
}

fn env_f64(name: &'static str) -> Result<Option<f64>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::Env { name, value }),
        Err(_) => Ok(None),
    }
}

impl ComparisonConfig {
    /// Create a strict configuration (flags smaller changes)
    pub fn strict() -> Self {
        Self {
            default_threshold_pct: 3.0,
            delta_margin_pct: 1.0,
            abs_delta_floor_ns: 1.0,
            ..Self::default()
        }
    }

    /// Create a permissive configuration (only large changes are flagged)
    pub fn permissive() -> Self {
        Self {
            default_threshold_pct: 10.0,
            noise_multiplier: 3.0,
            delta_margin_pct: 5.0,
            abs_delta_floor_ns: 5.0,
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file; missing keys keep defaults
    ///
    /// ```toml
    /// default_threshold_pct = 7.5
    /// noise_multiplier = 2.5
    /// direction = "higher-is-better"
    /// ```
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::default().with_toml_file(path)
    }

    /// Overlay the keys present in a TOML file onto this configuration
    pub fn with_toml_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let parse_err = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: toml::Table = toml::from_str(&content).map_err(parse_err)?;

        let mut merged: toml::Table = toml::to_string(&self)
            .map_err(|e| ConfigError::Invalid(format!("cannot layer configuration: {}", e)))
            .and_then(|current| toml::from_str(&current).map_err(parse_err))?;
        merged.extend(overrides);
        toml::Value::Table(merged).try_into().map_err(parse_err)
    }

    /// Defaults overridden by the CI environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `THRESHOLD_PERCENT`, `NOISE_MULTIPLIER`, `ERROR_MULTIPLIER`,
    /// `ABS_DELTA_NS_FLOOR` and `DELTA_MARGIN_PERCENT` when set
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_f64(ENV_THRESHOLD_PERCENT)? {
            self.default_threshold_pct = v;
        }
        if let Some(v) = env_f64(ENV_NOISE_MULTIPLIER)? {
            self.noise_multiplier = v;
        }
        if let Some(v) = env_f64(ENV_ERROR_MULTIPLIER)? {
            self.error_multiplier = v;
        }
        if let Some(v) = env_f64(ENV_ABS_DELTA_NS_FLOOR)? {
            self.abs_delta_floor_ns = v;
        }
        if let Some(v) = env_f64(ENV_DELTA_MARGIN_PERCENT)? {
            self.delta_margin_pct = v;
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("default_threshold_pct", self.default_threshold_pct),
            ("noise_multiplier", self.noise_multiplier),
            ("error_multiplier", self.error_multiplier),
            ("abs_delta_floor_ns", self.abs_delta_floor_ns),
            ("delta_margin_pct", self.delta_margin_pct),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
