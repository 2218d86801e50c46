//! Engine Configuration
//!
//! Read-only input to an assessment pass: the mechanical age thresholds,
//! the spare-threshold fallback and the prediction mode. Loaded from YAML
//! (or JSON) and overridable from the command line.

use crate::error::{Error, Result};
use crate::health::mode::PredictionMode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error};

/// Spare threshold assumed when a device does not report its own
pub const DEFAULT_SPARE_THRESHOLD: u8 = 10;

// =============================================================================
// Hour Thresholds
// =============================================================================

/// Four strictly ascending power-on-hour boundaries for mechanical tiering.
///
/// The array is private so every instance has passed validation. A set that
/// is not strictly ascending deserializes to the defaults and logs a
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u64; 4]", into = "[u64; 4]")]
pub struct HourThresholds([u64; 4]);

impl HourThresholds {
    /// 2, 3, 4 and 5 years of continuous operation
    pub const DEFAULT_HOURS: [u64; 4] = [17_520, 26_280, 35_040, 43_800];

    /// Validate a threshold set, rejecting anything not strictly ascending
    pub fn new(hours: [u64; 4]) -> Result<Self> {
        if hours.windows(2).all(|w| w[0] < w[1]) {
            Ok(Self(hours))
        } else {
            Err(Error::InvalidThresholds {
                thresholds: hours,
                reason: "thresholds must be strictly ascending".into(),
            })
        }
    }

    /// Validate a threshold set, substituting the defaults on failure
    pub fn validated(hours: [u64; 4]) -> Self {
        match Self::new(hours) {
            Ok(thresholds) => thresholds,
            Err(e) => {
                error!("{}; reverting to default thresholds {:?}", e, Self::DEFAULT_HOURS);
                Self::default()
            }
        }
    }

    pub fn hours(&self) -> [u64; 4] {
        self.0
    }
}

impl Default for HourThresholds {
    fn default() -> Self {
        Self(Self::DEFAULT_HOURS)
    }
}

impl From<[u64; 4]> for HourThresholds {
    fn from(hours: [u64; 4]) -> Self {
        Self::validated(hours)
    }
}

impl From<HourThresholds> for [u64; 4] {
    fn from(thresholds: HourThresholds) -> Self {
        thresholds.0
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for one assessment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mechanical age thresholds in power-on hours
    #[serde(deserialize_with = "lenient_thresholds")]
    pub thresholds: HourThresholds,
    /// Spare threshold used when the device reports none
    #[serde(deserialize_with = "lenient_spare_fallback")]
    pub spare_threshold_fallback: u8,
    /// Conservative or aggressive estimates
    pub mode: PredictionMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: HourThresholds::default(),
            spare_threshold_fallback: DEFAULT_SPARE_THRESHOLD,
            mode: PredictionMode::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&contents)?;
        debug!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from YAML (a superset of JSON)
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Same configuration in a different mode
    pub fn with_mode(mut self, mode: PredictionMode) -> Self {
        self.mode = mode;
        self
    }
}

// =============================================================================
// Lenient Fields
// =============================================================================

/// Malformed threshold lists (wrong length, negative or non-numeric entries)
/// fall back to the defaults instead of failing the load
fn lenient_thresholds<'de, D>(deserializer: D) -> std::result::Result<HourThresholds, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let hours = value.as_array().and_then(|items| {
        let hours: Option<Vec<u64>> = items.iter().map(Value::as_u64).collect();
        <[u64; 4]>::try_from(hours?).ok()
    });

    Ok(match hours {
        Some(hours) => HourThresholds::validated(hours),
        None => {
            error!(
                "Invalid thresholds {}; reverting to default thresholds {:?}",
                value,
                HourThresholds::DEFAULT_HOURS
            );
            HourThresholds::default()
        }
    })
}

/// Fallbacks outside 0..=100 revert to the default
fn lenient_spare_fallback<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value.as_u64().filter(|&v| v <= 100) {
        Some(fallback) => Ok(fallback as u8),
        None => {
            error!(
                "Invalid spare threshold fallback {}; using {}",
                value, DEFAULT_SPARE_THRESHOLD
            );
            Ok(DEFAULT_SPARE_THRESHOLD)
        }
    }
}
