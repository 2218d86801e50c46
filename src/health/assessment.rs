//! Device Assessment Pipeline
//!
//! Runs the classifier, warning detector and predictor for one device and
//! reconciles their outputs into the record handed to presentation.

use crate::config::EngineConfig;
use crate::domain::ports::{DeviceFamily, NormalizedDeviceRecord};
use crate::health::classifier::RiskClassifier;
use crate::health::predictor::{ReplacementEstimate, ReplacementPredictor};
use crate::health::tier::RiskTier;
use crate::health::warnings::{has_critical, HealthWarning, HealthWarningDetector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Estimates shorter than this force the tier to high
pub const IMMINENT_REPLACEMENT_MONTHS: u32 = 6;

// =============================================================================
// Assessment Result
// =============================================================================

/// Why the final tier differs from the classifier's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOverride {
    /// At least one critical health warning
    CriticalWarning,
    /// Replacement estimate under six months
    ImminentReplacement,
}

/// Combined per-device output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAssessment {
    pub device_path: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub device_family: DeviceFamily,
    pub power_on_hours: Option<u64>,
    pub age_years: Option<f64>,
    pub temperature_celsius: Option<i32>,
    /// Final tier; `None` means insufficient data
    pub tier: Option<RiskTier>,
    /// Tier from thresholds alone, before warnings and estimate
    pub classified_tier: Option<RiskTier>,
    pub tier_override: Option<TierOverride>,
    pub warnings: Vec<HealthWarning>,
    pub estimate: ReplacementEstimate,
}

impl DeviceAssessment {
    pub fn has_critical_warning(&self) -> bool {
        has_critical(&self.warnings)
    }

    pub fn is_insufficient_data(&self) -> bool {
        self.tier.is_none()
    }
}

/// Per-tier counts over a set of assessments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub total: usize,
    pub minimal: usize,
    pub low: usize,
    pub moderate: usize,
    pub elevated: usize,
    pub high: usize,
    pub insufficient_data: usize,
    pub with_critical_warnings: usize,
    pub replace_now: usize,
}

impl AssessmentSummary {
    pub fn from_assessments(assessments: &[DeviceAssessment]) -> Self {
        let mut summary = Self {
            total: assessments.len(),
            ..Default::default()
        };

        for assessment in assessments {
            match assessment.tier {
                Some(RiskTier::Minimal) => summary.minimal += 1,
                Some(RiskTier::Low) => summary.low += 1,
                Some(RiskTier::Moderate) => summary.moderate += 1,
                Some(RiskTier::Elevated) => summary.elevated += 1,
                Some(RiskTier::High) => summary.high += 1,
                None => summary.insufficient_data += 1,
            }
            if assessment.has_critical_warning() {
                summary.with_critical_warnings += 1;
            }
            if assessment.estimate.months_remaining == Some(0) {
                summary.replace_now += 1;
            }
        }
        summary
    }
}

// =============================================================================
// Assessment Engine
// =============================================================================

/// Stateless assessment engine; safe to share across threads
#[derive(Debug, Clone, Copy)]
pub struct AssessmentEngine {
    config: EngineConfig,
    classifier: RiskClassifier,
    detector: HealthWarningDetector,
    predictor: ReplacementPredictor,
}

impl AssessmentEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            classifier: RiskClassifier::with_config(&config),
            detector: HealthWarningDetector::new(),
            predictor: ReplacementPredictor::with_spare_threshold_fallback(
                config.spare_threshold_fallback,
            ),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assess a single device
    pub fn assess(&self, record: &NormalizedDeviceRecord) -> DeviceAssessment {
        let classified_tier = self.classifier.classify(record);
        let warnings = self.detector.detect(record);
        let estimate = self.predictor.predict(record, &warnings, self.config.mode);
        let (tier, tier_override) = reconcile_tier(classified_tier, &warnings, &estimate);

        if let Some(reason) = tier_override {
            debug!(
                device = %record.device_path,
                classified = ?classified_tier,
                reason = ?reason,
                "Raised risk tier to high"
            );
        }

        DeviceAssessment {
            device_path: record.device_path.clone(),
            model: record.model.clone(),
            serial: record.serial.clone(),
            device_family: record.device_family,
            power_on_hours: record.power_on_hours,
            age_years: record.age_years().map(|a| (a * 100.0).round() / 100.0),
            temperature_celsius: record.temperature_celsius,
            tier,
            classified_tier,
            tier_override,
            warnings,
            estimate,
        }
    }

    /// Assess every device of a host, preserving input order
    pub fn assess_all(&self, records: &[NormalizedDeviceRecord]) -> Vec<DeviceAssessment> {
        let assessments: Vec<DeviceAssessment> = records.iter().map(|r| self.assess(r)).collect();
        info!(
            devices = assessments.len(),
            mode = %self.config.mode,
            "Assessed devices"
        );
        assessments
    }
}

impl Default for AssessmentEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Apply warning and estimate overrides to the classifier's tier.
///
/// Overrides only ever raise the tier. A device without a classified tier
/// still becomes `high` when an override fires.
pub fn reconcile_tier(
    classified: Option<RiskTier>,
    warnings: &[HealthWarning],
    estimate: &ReplacementEstimate,
) -> (Option<RiskTier>, Option<TierOverride>) {
    let reason = if has_critical(warnings) {
        Some(TierOverride::CriticalWarning)
    } else if estimate
        .months_remaining
        .is_some_and(|m| m < IMMINENT_REPLACEMENT_MONTHS)
    {
        Some(TierOverride::ImminentReplacement)
    } else {
        None
    };

    match reason {
        Some(reason) => {
            let reported = (classified != Some(RiskTier::High)).then_some(reason);
            (Some(RiskTier::at_least(classified, RiskTier::High)), reported)
        }
        None => (classified, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HourThresholds;
    use crate::domain::ports::HealthFlag;
    use crate::health::mode::PredictionMode;
    use crate::health::predictor::{Confidence, PredictionMethod};
    use crate::health::warnings::WarningSeverity;

    fn make_hdd(hours: Option<u64>) -> NormalizedDeviceRecord {
        let mut record = NormalizedDeviceRecord::new("/dev/sda", DeviceFamily::Mechanical);
        record.power_on_hours = hours;
        record.overall_health_flag = HealthFlag::Passed;
        record
    }

    fn make_nvme(used: Option<u8>, spare: Option<u8>) -> NormalizedDeviceRecord {
        let mut record = NormalizedDeviceRecord::new("/dev/nvme0n1", DeviceFamily::Flash);
        record.power_on_hours = Some(2_000);
        record.overall_health_flag = HealthFlag::Passed;
        record.percentage_used = used;
        record.available_spare = spare;
        record.available_spare_threshold = Some(10);
        record.media_error_count = Some(0);
        record.critical_warning_bitmap = Some(0);
        record
    }

    #[test]
    fn test_healthy_new_hdd() {
        let engine = AssessmentEngine::default();
        let result = engine.assess(&make_hdd(Some(10_000)));

        assert_eq!(result.tier, Some(RiskTier::Minimal));
        assert_eq!(result.tier_override, None);
        assert!(result.warnings.is_empty());
        assert_eq!(result.estimate.method, PredictionMethod::AgeBased);
        assert!((55..=60).contains(&result.estimate.months_remaining.unwrap()));
        assert_eq!(result.estimate.confidence, Confidence::Medium);
        assert_eq!(result.age_years, Some(1.14));
    }

    #[test]
    fn test_pending_sectors_force_high() {
        let engine = AssessmentEngine::default();
        let mut drive = make_hdd(Some(1_000));
        drive.pending_sector_count = Some(3);

        let result = engine.assess(&drive);
        assert_eq!(result.classified_tier, Some(RiskTier::Minimal));
        assert_eq!(result.tier, Some(RiskTier::High));
        assert_eq!(result.tier_override, Some(TierOverride::CriticalWarning));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].attribute, "pending_sectors");
        assert_eq!(result.warnings[0].severity, WarningSeverity::Critical);
        assert_eq!(result.estimate.months_remaining, Some(0));
        assert_eq!(result.estimate.confidence, Confidence::High);
    }

    #[test]
    fn test_critical_warning_without_hours() {
        let engine = AssessmentEngine::default();
        let mut drive = make_hdd(None);
        drive.uncorrectable_sector_count = Some(1);

        let result = engine.assess(&drive);
        assert_eq!(result.classified_tier, None);
        assert_eq!(result.tier, Some(RiskTier::High));
        assert_eq!(result.estimate.months_remaining, Some(0));
    }

    #[test]
    fn test_insufficient_data_stays_unclassified() {
        let engine = AssessmentEngine::default();
        let result = engine.assess(&make_hdd(None));

        assert!(result.is_insufficient_data());
        assert_eq!(result.estimate.months_remaining, None);
        assert_eq!(result.estimate.confidence, Confidence::None);
    }

    #[test]
    fn test_imminent_estimate_forces_high() {
        // 5.75 years old is only low under these thresholds, but the
        // 3-month estimate lifts it to high
        let lenient = EngineConfig {
            thresholds: HourThresholds::new([50_000, 60_000, 70_000, 80_000]).unwrap(),
            ..Default::default()
        };
        let result = AssessmentEngine::new(lenient).assess(&make_hdd(Some(50_370)));
        assert_eq!(result.classified_tier, Some(RiskTier::Low));
        assert_eq!(result.estimate.months_remaining, Some(3));
        assert_eq!(result.tier, Some(RiskTier::High));
        assert_eq!(result.tier_override, Some(TierOverride::ImminentReplacement));

        // Caution-only drive in conservative mode gets 3 months -> high
        let engine = AssessmentEngine::default();
        let mut drive = make_hdd(Some(1_000));
        drive.reallocated_sector_count = Some(1);
        let result = engine.assess(&drive);
        assert_eq!(result.classified_tier, Some(RiskTier::Minimal));
        assert_eq!(result.tier, Some(RiskTier::High));
        assert_eq!(result.tier_override, Some(TierOverride::ImminentReplacement));

        // Aggressive mode grants 6 months, which is not imminent
        let aggressive =
            AssessmentEngine::new(EngineConfig::default().with_mode(PredictionMode::Aggressive));
        let result = aggressive.assess(&drive);
        assert_eq!(result.estimate.months_remaining, Some(6));
        assert_eq!(result.tier, Some(RiskTier::Minimal));
    }

    #[test]
    fn test_flash_scenarios() {
        let engine = AssessmentEngine::default();

        let result = engine.assess(&make_nvme(None, Some(95)));
        assert_eq!(result.tier, Some(RiskTier::Minimal));

        let result = engine.assess(&make_nvme(Some(105), Some(25)));
        assert_eq!(result.classified_tier, Some(RiskTier::Elevated));

        let mut drive = make_nvme(Some(1), Some(100));
        drive.media_error_count = Some(4);
        let result = engine.assess(&drive);
        assert_eq!(result.tier, Some(RiskTier::High));
        assert_eq!(result.estimate.method, PredictionMethod::CriticalError);
    }

    #[test]
    fn test_reconcile_never_lowers() {
        let estimate = AssessmentEngine::default().assess(&make_hdd(Some(1_000))).estimate;
        for tier in RiskTier::ALL {
            let (reconciled, _) = reconcile_tier(Some(tier), &[], &estimate);
            assert_eq!(reconciled, Some(tier));
        }
    }

    #[test]
    fn test_summary() {
        let engine = AssessmentEngine::default();
        let mut failing = make_hdd(Some(1_000));
        failing.pending_sector_count = Some(1);

        let assessments = engine.assess_all(&[
            make_hdd(Some(1_000)),
            make_hdd(None),
            failing,
            make_nvme(Some(60), Some(100)),
        ]);
        let summary = AssessmentSummary::from_assessments(&assessments);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.minimal, 1);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.insufficient_data, 1);
        assert_eq!(summary.with_critical_warnings, 1);
        assert_eq!(summary.replace_now, 1);
    }
}
