//! Risk Classifier
//!
//! Maps a normalized record to one of five ordered risk tiers. Mechanical
//! drives are bucketed by powered-on age; flash devices by a reconciliation
//! of wear and spare capacity.

use crate::config::{EngineConfig, HourThresholds, DEFAULT_SPARE_THRESHOLD};
use crate::domain::ports::NormalizedDeviceRecord;
use crate::health::tier::RiskTier;
use tracing::debug;

/// Spare points above the vendor threshold that still count as elevated risk
const SPARE_MARGIN: u16 = 10;

// =============================================================================
// Risk Classifier
// =============================================================================

/// Classifies devices into risk tiers
#[derive(Debug, Clone, Copy)]
pub struct RiskClassifier {
    thresholds: HourThresholds,
    spare_threshold_fallback: u8,
}

impl RiskClassifier {
    /// Create a classifier with default thresholds
    pub fn new() -> Self {
        Self {
            thresholds: HourThresholds::default(),
            spare_threshold_fallback: DEFAULT_SPARE_THRESHOLD,
        }
    }

    /// Create a classifier from engine configuration
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            spare_threshold_fallback: config.spare_threshold_fallback,
        }
    }

    /// Classify a record.
    ///
    /// Returns `None` when power-on hours are missing. Callers report that
    /// as insufficient data; an age is never assumed. Flash media errors and
    /// critical warnings are the exception and still classify as high.
    pub fn classify(&self, record: &NormalizedDeviceRecord) -> Option<RiskTier> {
        let wear_model = record.uses_wear_model();
        let tier = match record.power_on_hours {
            _ if wear_model && record.has_flash_error() => Some(RiskTier::High),
            None => None,
            Some(_) if wear_model => Some(self.classify_wear(record)),
            Some(hours) => Some(self.tier_for_hours(hours)),
        };

        debug!(
            device = %record.device_path,
            family = %record.device_family,
            tier = ?tier,
            "Classified risk tier"
        );
        tier
    }

    /// Age bucket for a power-on-hour count
    pub fn tier_for_hours(&self, hours: u64) -> RiskTier {
        let [t1, t2, t3, t4] = self.thresholds.hours();

        if hours < t1 {
            RiskTier::Minimal
        } else if hours < t2 {
            RiskTier::Low
        } else if hours < t3 {
            RiskTier::Moderate
        } else if hours < t4 {
            RiskTier::Elevated
        } else {
            RiskTier::High
        }
    }

    /// Wear-based tier for flash devices
    fn classify_wear(&self, record: &NormalizedDeviceRecord) -> RiskTier {
        if record.has_flash_error() {
            return RiskTier::High;
        }

        let threshold = record.spare_threshold(self.spare_threshold_fallback) as u16;
        let spare = record.available_spare.map(u16::from);

        if spare.is_some_and(|s| s < threshold) {
            return RiskTier::High;
        }

        if spare.is_some_and(|s| s < threshold + SPARE_MARGIN)
            || record.percentage_used.is_some_and(|p| p > 100)
        {
            return RiskTier::Elevated;
        }

        // Two independent provisional tiers; the more severe one wins
        let by_wear = record.percentage_used.map(Self::tier_from_percentage_used);
        let by_spare = record.available_spare.map(Self::tier_from_available_spare);

        by_wear.max(by_spare).unwrap_or(RiskTier::Minimal)
    }

    fn tier_from_percentage_used(used: u8) -> RiskTier {
        if used >= 80 {
            RiskTier::Moderate
        } else if used >= 50 {
            RiskTier::Low
        } else {
            RiskTier::Minimal
        }
    }

    fn tier_from_available_spare(spare: u8) -> RiskTier {
        if spare <= 50 {
            RiskTier::Moderate
        } else if spare <= 80 {
            RiskTier::Low
        } else {
            RiskTier::Minimal
        }
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}
