//! Replacement Predictor
//!
//! Produces a months-remaining forecast with a confidence rating and the
//! method that produced it. Each device family has an ordered rule table;
//! the first rule whose guard matches decides the estimate.

use crate::config::DEFAULT_SPARE_THRESHOLD;
use crate::domain::ports::{DeviceFamily, HealthFlag, NormalizedDeviceRecord};
use crate::health::mode::{ModeParameters, PredictionMode};
use crate::health::timeline::{self, TimelineClass};
use crate::health::warnings::{has_critical, HealthWarning};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mechanical age-based estimates never exceed five years
pub const AGE_MODEL_CAP_MONTHS: f64 = 60.0;

/// Remaining life, in months, below which confidence in the age model drops
const LOW_CONFIDENCE_MONTHS: f64 = 12.0;

/// Rated endurance assumed per unit of capacity (TBW = 500 x capacity)
const ENDURANCE_CAPACITY_MULTIPLE: f64 = 500.0;

const BYTES_PER_TB: f64 = 1e12;

// =============================================================================
// Estimate Types
// =============================================================================

/// How much trust to place in an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::None => write!(f, "none"),
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Rule that produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    CriticalError,
    InsufficientData,
    CautionWarning,
    AgeBased,
    SpareBelowThreshold,
    TbwEstimate,
    PercentageUsedLinear,
    SpareDepletion,
}

impl PredictionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMethod::CriticalError => "critical_error",
            PredictionMethod::InsufficientData => "insufficient_data",
            PredictionMethod::CautionWarning => "caution_warning",
            PredictionMethod::AgeBased => "age_based",
            PredictionMethod::SpareBelowThreshold => "spare_below_threshold",
            PredictionMethod::TbwEstimate => "tbw_estimate",
            PredictionMethod::PercentageUsedLinear => "percentage_used_linear",
            PredictionMethod::SpareDepletion => "spare_depletion",
        }
    }
}

impl std::fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replacement forecast for one device.
///
/// `months_remaining = None` means there is no basis for a number; it is
/// serialized as `null` and must never be read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementEstimate {
    pub months_remaining: Option<u32>,
    pub confidence: Confidence,
    pub method: PredictionMethod,
    pub explanation: String,
    pub timeline_label: String,
    pub timeline_severity_class: TimelineClass,
}

impl ReplacementEstimate {
    fn from_forecast(method: PredictionMethod, forecast: Forecast) -> Self {
        let (timeline_label, timeline_severity_class) = timeline::label(forecast.months);
        Self {
            months_remaining: forecast.months,
            confidence: forecast.confidence,
            method,
            explanation: forecast.explanation,
            timeline_label,
            timeline_severity_class,
        }
    }

    fn insufficient_data(explanation: &str) -> Self {
        Self::from_forecast(
            PredictionMethod::InsufficientData,
            Forecast::unknown(explanation.to_string()),
        )
    }

    /// Whether the estimate carries a number at all
    pub fn is_known(&self) -> bool {
        self.months_remaining.is_some()
    }
}

// =============================================================================
// Rule Table
// =============================================================================

/// Inputs shared by every rule
struct PredictionContext<'a> {
    record: &'a NormalizedDeviceRecord,
    warnings: &'a [HealthWarning],
    params: ModeParameters,
    spare_threshold: u8,
}

/// Outcome of a matching rule
struct Forecast {
    months: Option<u32>,
    confidence: Confidence,
    explanation: String,
}

impl Forecast {
    fn months(months: f64, confidence: Confidence, explanation: String) -> Self {
        Self {
            // `as` saturates, so NaN and negatives become 0
            months: Some(months.round().max(0.0) as u32),
            confidence,
            explanation,
        }
    }

    fn unknown(explanation: String) -> Self {
        Self {
            months: None,
            confidence: Confidence::None,
            explanation,
        }
    }
}

/// A guard/compute pair; `None` means the rule does not apply
struct PredictionRule {
    method: PredictionMethod,
    evaluate: fn(&PredictionContext<'_>) -> Option<Forecast>,
}

const MECHANICAL_RULES: [PredictionRule; 4] = [
    PredictionRule {
        method: PredictionMethod::CriticalError,
        evaluate: critical_error,
    },
    PredictionRule {
        method: PredictionMethod::InsufficientData,
        evaluate: missing_age,
    },
    PredictionRule {
        method: PredictionMethod::CautionWarning,
        evaluate: caution_warning,
    },
    PredictionRule {
        method: PredictionMethod::AgeBased,
        evaluate: age_based,
    },
];

const FLASH_RULES: [PredictionRule; 7] = [
    PredictionRule {
        method: PredictionMethod::CriticalError,
        evaluate: flash_critical_error,
    },
    PredictionRule {
        method: PredictionMethod::InsufficientData,
        evaluate: missing_hours,
    },
    PredictionRule {
        method: PredictionMethod::SpareBelowThreshold,
        evaluate: spare_below_threshold,
    },
    PredictionRule {
        method: PredictionMethod::TbwEstimate,
        evaluate: tbw_estimate,
    },
    PredictionRule {
        method: PredictionMethod::PercentageUsedLinear,
        evaluate: percentage_used_linear,
    },
    PredictionRule {
        method: PredictionMethod::SpareDepletion,
        evaluate: spare_depletion,
    },
    PredictionRule {
        method: PredictionMethod::InsufficientData,
        evaluate: no_wear_basis,
    },
];

// -----------------------------------------------------------------------------
// Mechanical rules
// -----------------------------------------------------------------------------

fn critical_error(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    if !has_critical(ctx.warnings) {
        return None;
    }
    let attributes: Vec<&str> = ctx
        .warnings
        .iter()
        .filter(|w| w.is_critical())
        .map(|w| w.attribute.as_str())
        .collect();

    Some(Forecast::months(
        0.0,
        Confidence::High,
        format!("Critical health warning ({}); replace now", attributes.join(", ")),
    ))
}

fn missing_age(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    match ctx.record.power_on_hours {
        None => Some(Forecast::unknown(
            "No power-on hours reported; no basis for a replacement estimate".into(),
        )),
        Some(0) if ctx.record.overall_health_flag == HealthFlag::Unknown => {
            Some(Forecast::unknown(
                "Zero power-on hours and unknown health status; telemetry is not reliable".into(),
            ))
        }
        Some(_) => None,
    }
}

fn caution_warning(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    if ctx.warnings.is_empty() {
        return None;
    }
    let attributes: Vec<&str> = ctx.warnings.iter().map(|w| w.attribute.as_str()).collect();

    Some(Forecast::months(
        ctx.params.caution_months as f64,
        Confidence::Medium,
        format!(
            "Caution warning ({}); plan replacement within {} months",
            attributes.join(", "),
            ctx.params.caution_months
        ),
    ))
}

fn age_based(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    let age = ctx.record.age_years()?;
    let target = ctx.params.target_age_years;
    let remaining_months = (target - age) * 12.0;

    let months = if remaining_months.round() < 0.0 {
        // Past target: report a small buffer that shrinks to zero rather than
        // a large negative number
        (6.0 + remaining_months).round().max(0.0)
    } else {
        remaining_months.round().min(AGE_MODEL_CAP_MONTHS)
    };

    let confidence = if remaining_months <= LOW_CONFIDENCE_MONTHS {
        Confidence::Low
    } else {
        Confidence::Medium
    };

    let explanation = if remaining_months < 0.0 {
        format!(
            "Drive is {:.1} years old, past the {:.0}-year replacement target",
            age, target
        )
    } else {
        format!(
            "Drive is {:.1} years old against a {:.0}-year replacement target",
            age, target
        )
    };

    Some(Forecast::months(months, confidence, explanation))
}

// -----------------------------------------------------------------------------
// Flash rules
// -----------------------------------------------------------------------------

fn flash_critical_error(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    critical_error(ctx).or_else(|| {
        ctx.record.has_flash_error().then(|| {
            Forecast::months(
                0.0,
                Confidence::High,
                "Media errors or critical warning reported; replace now".into(),
            )
        })
    })
}

fn missing_hours(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    ctx.record.power_on_hours.is_none().then(|| {
        Forecast::unknown(
            "No power-on hours reported; wear telemetry is not trusted without them".into(),
        )
    })
}

fn spare_below_threshold(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    let spare = ctx.record.available_spare?;
    (spare < ctx.spare_threshold).then(|| {
        Forecast::months(
            1.0,
            Confidence::High,
            format!(
                "Available spare {}% is below the {}% threshold",
                spare, ctx.spare_threshold
            ),
        )
    })
}

fn tbw_estimate(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    let written = ctx.record.bytes_written_total? as f64 / BYTES_PER_TB;
    let capacity = ctx.record.capacity_bytes.filter(|&c| c > 0)? as f64 / BYTES_PER_TB;

    let budget = capacity * ENDURANCE_CAPACITY_MULTIPLE;
    let remaining = (budget - written).max(0.0);
    let years = remaining / ctx.params.tb_written_per_year;

    Some(Forecast::months(
        years * 12.0,
        Confidence::Medium,
        format!(
            "{:.1} TB written of an estimated {:.0} TB endurance at {:.0} TB/year",
            written, budget, ctx.params.tb_written_per_year
        ),
    ))
}

fn percentage_used_linear(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    let used = ctx.record.percentage_used.filter(|p| (1..100).contains(p))?;
    let remaining = (100 - used) as f64;
    let months = remaining / 20.0 * 12.0 / ctx.params.wear_multiplier;

    Some(Forecast::months(
        months,
        Confidence::Low,
        format!("{}% of rated life used; linear extrapolation", used),
    ))
}

fn spare_depletion(ctx: &PredictionContext<'_>) -> Option<Forecast> {
    let spare = ctx.record.available_spare.filter(|&s| s < 90)?;
    let consumed = (100 - spare) as f64;
    let headroom = spare.saturating_sub(ctx.spare_threshold) as f64;
    let months = headroom / consumed * 24.0 / ctx.params.wear_multiplier;

    Some(Forecast::months(
        months,
        Confidence::Low,
        format!(
            "{}% spare consumed, {:.0} points left above the {}% threshold",
            consumed, headroom, ctx.spare_threshold
        ),
    ))
}

fn no_wear_basis(_ctx: &PredictionContext<'_>) -> Option<Forecast> {
    Some(Forecast::unknown(
        "No write volume, wear or spare telemetry to extrapolate from".into(),
    ))
}

// =============================================================================
// Replacement Predictor
// =============================================================================

/// Forecasts time to recommended replacement
#[derive(Debug, Clone, Copy)]
pub struct ReplacementPredictor {
    spare_threshold_fallback: u8,
}

impl ReplacementPredictor {
    pub fn new() -> Self {
        Self {
            spare_threshold_fallback: DEFAULT_SPARE_THRESHOLD,
        }
    }

    pub fn with_spare_threshold_fallback(spare_threshold_fallback: u8) -> Self {
        Self {
            spare_threshold_fallback,
        }
    }

    /// Predict months until replacement. Never fails: every path ends in an
    /// estimate, possibly "insufficient data".
    pub fn predict(
        &self,
        record: &NormalizedDeviceRecord,
        warnings: &[HealthWarning],
        mode: PredictionMode,
    ) -> ReplacementEstimate {
        let ctx = PredictionContext {
            record,
            warnings,
            params: mode.parameters(),
            spare_threshold: record.spare_threshold(self.spare_threshold_fallback),
        };

        let rules: &[PredictionRule] = if Self::uses_flash_rules(record) {
            &FLASH_RULES
        } else {
            &MECHANICAL_RULES
        };

        let estimate = rules
            .iter()
            .find_map(|rule| {
                (rule.evaluate)(&ctx).map(|f| ReplacementEstimate::from_forecast(rule.method, f))
            })
            .unwrap_or_else(|| {
                ReplacementEstimate::insufficient_data("No rule could produce an estimate")
            });

        debug!(
            device = %record.device_path,
            mode = %mode,
            method = %estimate.method,
            months = ?estimate.months_remaining,
            confidence = %estimate.confidence,
            "Predicted replacement timeline"
        );
        estimate
    }

    fn uses_flash_rules(record: &NormalizedDeviceRecord) -> bool {
        let has_write_volume = record.bytes_written_total.is_some()
            && record.capacity_bytes.is_some_and(|c| c > 0);

        record.uses_wear_model()
            || (record.device_family != DeviceFamily::Mechanical && has_write_volume)
    }
}

impl Default for ReplacementPredictor {
    fn default() -> Self {
        Self::new()
    }
}
