//! Property tests across the whole assessment pipeline

use crate::config::{EngineConfig, HourThresholds};
use crate::domain::ports::{DeviceFamily, HealthFlag, NormalizedDeviceRecord};
use crate::health::assessment::AssessmentEngine;
use crate::health::classifier::RiskClassifier;
use crate::health::mode::PredictionMode;
use crate::health::predictor::{Confidence, ReplacementPredictor};
use crate::health::tier::RiskTier;
use crate::health::warnings::{HealthWarningDetector, WarningSeverity};
use proptest::prelude::*;

fn thresholds() -> impl Strategy<Value = HourThresholds> {
    (1u64..20_000, 1u64..20_000, 1u64..20_000, 1u64..20_000).prop_map(|(a, b, c, d)| {
        HourThresholds::new([a, a + b, a + b + c, a + b + c + d]).unwrap()
    })
}

fn mode() -> impl Strategy<Value = PredictionMode> {
    prop_oneof![
        Just(PredictionMode::Conservative),
        Just(PredictionMode::Aggressive)
    ]
}

fn family() -> impl Strategy<Value = DeviceFamily> {
    prop_oneof![
        Just(DeviceFamily::Mechanical),
        Just(DeviceFamily::Flash),
        Just(DeviceFamily::Removable)
    ]
}

fn health_flag() -> impl Strategy<Value = HealthFlag> {
    prop_oneof![
        Just(HealthFlag::Passed),
        Just(HealthFlag::Failed),
        Just(HealthFlag::Unknown)
    ]
}

prop_compose! {
    fn record()(
        family in family(),
        flag in health_flag(),
        hours in proptest::option::of(0u64..150_000),
        reallocated in proptest::option::of(0u64..50),
        pending in proptest::option::of(0u64..5),
        uncorrectable in proptest::option::of(0u64..3),
        used in proptest::option::of(0u8..=255),
        spare in proptest::option::of(0u8..=100),
        spare_threshold in proptest::option::of(0u8..=50),
        media_errors in proptest::option::of(0u64..3),
        bitmap in proptest::option::of(prop_oneof![Just(0u64), 1u64..32]),
        written in proptest::option::of(0u64..2_000_000_000_000_000),
        capacity in proptest::option::of(0u64..8_000_000_000_000),
    ) -> NormalizedDeviceRecord {
        let mut record = NormalizedDeviceRecord::new("/dev/prop", family);
        record.overall_health_flag = flag;
        record.power_on_hours = hours;
        record.reallocated_sector_count = reallocated;
        record.pending_sector_count = pending;
        record.uncorrectable_sector_count = uncorrectable;
        record.percentage_used = used;
        record.available_spare = spare;
        record.available_spare_threshold = spare_threshold;
        record.media_error_count = media_errors;
        record.critical_warning_bitmap = bitmap;
        record.bytes_written_total = written;
        record.capacity_bytes = capacity;
        record
    }
}

proptest! {
    #[test]
    fn age_tiers_are_monotonic(thresholds in thresholds(), a in 0u64..200_000, b in 0u64..200_000) {
        let config = EngineConfig { thresholds, ..Default::default() };
        let classifier = RiskClassifier::with_config(&config);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let mut drive = NormalizedDeviceRecord::new("/dev/sda", DeviceFamily::Mechanical);
        drive.power_on_hours = Some(lo);
        let lo_tier = classifier.classify(&drive);
        drive.power_on_hours = Some(hi);
        let hi_tier = classifier.classify(&drive);

        prop_assert!(lo_tier.is_some() && hi_tier.is_some());
        prop_assert!(lo_tier <= hi_tier);
    }

    #[test]
    fn pending_sectors_mean_replace_now(mut record in record(), pending in 1u64..1_000, mode in mode()) {
        record.device_family = DeviceFamily::Mechanical;
        record.pending_sector_count = Some(pending);

        let warnings = HealthWarningDetector::new().detect(&record);
        prop_assert!(warnings
            .iter()
            .any(|w| w.attribute == "pending_sectors" && w.severity == WarningSeverity::Critical));

        let estimate = ReplacementPredictor::new().predict(&record, &warnings, mode);
        prop_assert_eq!(estimate.months_remaining, Some(0));
        prop_assert_eq!(estimate.confidence, Confidence::High);
    }

    #[test]
    fn flash_media_errors_are_high(mut record in record(), errors in 1u64..1_000) {
        record.device_family = DeviceFamily::Flash;
        record.media_error_count = Some(errors);
        prop_assert_eq!(RiskClassifier::new().classify(&record), Some(RiskTier::High));
    }

    #[test]
    fn assessment_is_idempotent(record in record(), mode in mode()) {
        let engine = AssessmentEngine::new(EngineConfig::default().with_mode(mode));
        prop_assert_eq!(engine.assess(&record), engine.assess(&record));
    }

    #[test]
    fn imminent_estimates_are_high(record in record(), mode in mode()) {
        let engine = AssessmentEngine::new(EngineConfig::default().with_mode(mode));
        let result = engine.assess(&record);

        if let Some(months) = result.estimate.months_remaining {
            if months < 6 {
                prop_assert_eq!(result.tier, Some(RiskTier::High));
            }
        }
        if result.has_critical_warning() {
            prop_assert_eq!(result.tier, Some(RiskTier::High));
        }
        if result.estimate.months_remaining.is_none() {
            prop_assert_eq!(result.estimate.confidence, Confidence::None);
        }
    }
}
