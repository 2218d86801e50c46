//! Prediction Modes
//!
//! Conservative and aggressive modes differ only in the numbers fed to the
//! predictor. Every time-based assumption lives in [`ModeParameters`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Global conservatism setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionMode {
    /// Bias toward shorter remaining life
    #[default]
    Conservative,
    /// Bias toward longer remaining life
    Aggressive,
}

impl PredictionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMode::Conservative => "conservative",
            PredictionMode::Aggressive => "aggressive",
        }
    }

    pub fn parameters(&self) -> ModeParameters {
        ModeParameters::for_mode(*self)
    }
}

impl std::fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(PredictionMode::Conservative),
            "aggressive" => Ok(PredictionMode::Aggressive),
            other => Err(Error::Configuration(format!(
                "Invalid prediction mode: {}. Use 'conservative' or 'aggressive'",
                other
            ))),
        }
    }
}

/// Named rates and multipliers for one mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeParameters {
    /// Age at which a healthy mechanical drive should be replaced
    pub target_age_years: f64,
    /// Months granted to a mechanical drive with only caution warnings
    pub caution_months: u32,
    /// Assumed host writes per year, in TB
    pub tb_written_per_year: f64,
    /// Divisor applied to wear extrapolations
    pub wear_multiplier: f64,
}

impl ModeParameters {
    pub const CONSERVATIVE: ModeParameters = ModeParameters {
        target_age_years: 6.0,
        caution_months: 3,
        tb_written_per_year: 30.0,
        wear_multiplier: 1.5,
    };

    pub const AGGRESSIVE: ModeParameters = ModeParameters {
        target_age_years: 8.0,
        caution_months: 6,
        tb_written_per_year: 15.0,
        wear_multiplier: 1.0,
    };

    pub fn for_mode(mode: PredictionMode) -> Self {
        match mode {
            PredictionMode::Conservative => Self::CONSERVATIVE,
            PredictionMode::Aggressive => Self::AGGRESSIVE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(
            "Conservative".parse::<PredictionMode>().unwrap(),
            PredictionMode::Conservative
        );
        assert_eq!(
            " aggressive ".parse::<PredictionMode>().unwrap(),
            PredictionMode::Aggressive
        );
        assert!("reckless".parse::<PredictionMode>().is_err());
    }

    #[test]
    fn test_conservative_is_shorter() {
        let c = PredictionMode::Conservative.parameters();
        let a = PredictionMode::Aggressive.parameters();
        assert!(c.target_age_years < a.target_age_years);
        assert!(c.caution_months < a.caution_months);
        assert!(c.tb_written_per_year > a.tb_written_per_year);
        assert!(c.wear_multiplier > a.wear_multiplier);
    }
}
