//! Assessment Metrics
//!
//! Prometheus exposition of assessment pass results. Each advisor owns its
//! own registry so tests and embedded engines do not collide on the global
//! default registry.

use crate::error::Result;
use crate::health::assessment::DeviceAssessment;
use crate::health::tier::RiskTier;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

const INSUFFICIENT_LABEL: &str = "insufficient_data";

/// Metrics recorded for every assessment pass
pub struct AssessmentMetrics {
    registry: Registry,
    assessments: IntCounterVec,
    warnings: IntCounterVec,
    insufficient_data: IntCounter,
    devices_by_tier: IntGaugeVec,
    pass_duration: Histogram,
}

impl AssessmentMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let assessments = IntCounterVec::new(
            Opts::new("drive_health_assessments_total", "Device assessments by final tier"),
            &["tier"],
        )?;
        let warnings = IntCounterVec::new(
            Opts::new("drive_health_warnings_total", "Health warnings by severity"),
            &["severity"],
        )?;
        let insufficient_data = IntCounter::new(
            "drive_health_insufficient_data_total",
            "Assessments without enough telemetry for a tier",
        )?;
        let devices_by_tier = IntGaugeVec::new(
            Opts::new("drive_health_devices", "Devices per tier in the latest pass"),
            &["tier"],
        )?;
        let pass_duration = Histogram::with_opts(HistogramOpts::new(
            "drive_health_pass_duration_seconds",
            "Duration of a full host assessment pass",
        ))?;

        registry.register(Box::new(assessments.clone()))?;
        registry.register(Box::new(warnings.clone()))?;
        registry.register(Box::new(insufficient_data.clone()))?;
        registry.register(Box::new(devices_by_tier.clone()))?;
        registry.register(Box::new(pass_duration.clone()))?;

        Ok(Self {
            registry,
            assessments,
            warnings,
            insufficient_data,
            devices_by_tier,
            pass_duration,
        })
    }

    /// Record individual assessments (ad-hoc requests and passes alike)
    pub fn record_assessments(&self, assessments: &[DeviceAssessment]) {
        for assessment in assessments {
            let tier = assessment.tier.map_or(INSUFFICIENT_LABEL, |t| t.as_str());
            self.assessments.with_label_values(&[tier]).inc();
            if assessment.tier.is_none() {
                self.insufficient_data.inc();
            }
            for warning in &assessment.warnings {
                self.warnings
                    .with_label_values(&[&warning.severity.to_string()])
                    .inc();
            }
        }
    }

    /// Record a completed host pass
    pub fn record_pass(&self, assessments: &[DeviceAssessment], duration: Duration) {
        self.record_assessments(assessments);
        self.pass_duration.observe(duration.as_secs_f64());

        for tier in RiskTier::ALL {
            let count = assessments.iter().filter(|a| a.tier == Some(tier)).count();
            self.devices_by_tier
                .with_label_values(&[tier.as_str()])
                .set(count as i64);
        }
        let unknown = assessments.iter().filter(|a| a.tier.is_none()).count();
        self.devices_by_tier
            .with_label_values(&[INSUFFICIENT_LABEL])
            .set(unknown as i64);
    }

    /// Render in the Prometheus text format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
