//! Health Warning Detector
//!
//! Inspects family-specific error counters and emits discrete warnings.
//! Rules are evaluated independently, so a device can carry several.

use crate::domain::ports::{DeviceFamily, HealthFlag, NormalizedDeviceRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reallocated sectors above this count are critical rather than caution
pub const REALLOCATED_CRITICAL_COUNT: u64 = 10;

// =============================================================================
// Warning Types
// =============================================================================

/// Warning severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Caution,
    Critical,
}

impl std::fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningSeverity::Caution => write!(f, "caution"),
            WarningSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// A single attribute-specific health warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthWarning {
    pub severity: WarningSeverity,
    /// Attribute key (e.g., `pending_sectors`)
    pub attribute: String,
    pub observed_value: u64,
    pub message: String,
    pub recommended_action: String,
    /// Longer explanation for hover text
    pub tooltip: String,
}

impl HealthWarning {
    fn new(
        severity: WarningSeverity,
        attribute: &str,
        observed_value: u64,
        message: String,
        recommended_action: &str,
        tooltip: &str,
    ) -> Self {
        Self {
            severity,
            attribute: attribute.to_string(),
            observed_value,
            message,
            recommended_action: recommended_action.to_string(),
            tooltip: tooltip.to_string(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == WarningSeverity::Critical
    }
}

/// Whether any warning in the list is critical
pub fn has_critical(warnings: &[HealthWarning]) -> bool {
    warnings.iter().any(HealthWarning::is_critical)
}

// =============================================================================
// NVMe Critical Warning Bits
// =============================================================================

const CRITICAL_WARNING_BITS: [(u64, &str); 5] = [
    (0x01, "available spare below threshold"),
    (0x02, "temperature outside safe range"),
    (0x04, "NVM subsystem reliability degraded"),
    (0x08, "media placed in read-only mode"),
    (0x10, "volatile memory backup failed"),
];

/// Human-readable names of the set bits in an NVMe critical warning bitmap
pub fn decode_critical_warning(bitmap: u64) -> Vec<&'static str> {
    let mut reasons: Vec<&'static str> = CRITICAL_WARNING_BITS
        .iter()
        .filter(|(bit, _)| bitmap & bit != 0)
        .map(|(_, name)| *name)
        .collect();

    if bitmap & !0x1F != 0 {
        reasons.push("vendor-specific warning");
    }
    reasons
}

// =============================================================================
// Health Warning Detector
// =============================================================================

/// Detects health warnings from a normalized record
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthWarningDetector;

impl HealthWarningDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect all warnings for a record
    pub fn detect(&self, record: &NormalizedDeviceRecord) -> Vec<HealthWarning> {
        let mut warnings = Vec::new();

        if record.overall_health_flag == HealthFlag::Failed {
            warnings.push(HealthWarning::new(
                WarningSeverity::Critical,
                "overall_health",
                1,
                "Drive failed its SMART overall-health self-assessment".into(),
                "Replace immediately",
                "The drive's own firmware predicts imminent failure.",
            ));
        }

        match record.device_family {
            DeviceFamily::Mechanical => self.detect_mechanical(record, &mut warnings),
            DeviceFamily::Flash => self.detect_flash(record, &mut warnings),
            DeviceFamily::Removable => {
                self.detect_mechanical(record, &mut warnings);
                self.detect_flash(record, &mut warnings);
            }
        }

        if !warnings.is_empty() {
            debug!(
                device = %record.device_path,
                count = warnings.len(),
                critical = has_critical(&warnings),
                "Detected health warnings"
            );
        }
        warnings
    }

    fn detect_mechanical(&self, record: &NormalizedDeviceRecord, warnings: &mut Vec<HealthWarning>) {
        if let Some(pending) = record.pending_sector_count.filter(|&c| c > 0) {
            warnings.push(HealthWarning::new(
                WarningSeverity::Critical,
                "pending_sectors",
                pending,
                format!("{} sector(s) pending reallocation", pending),
                "Replace ASAP",
                "Pending sectors could not be read reliably. Data on them is at active risk of loss.",
            ));
        }

        if let Some(uncorrectable) = record.uncorrectable_sector_count.filter(|&c| c > 0) {
            warnings.push(HealthWarning::new(
                WarningSeverity::Critical,
                "uncorrectable_sectors",
                uncorrectable,
                format!("{} uncorrectable sector(s)", uncorrectable),
                "Replace immediately",
                "Uncorrectable sectors have already lost data that error correction could not recover.",
            ));
        }

        if let Some(reallocated) = record.reallocated_sector_count.filter(|&c| c > 0) {
            let (severity, action) = if reallocated > REALLOCATED_CRITICAL_COUNT {
                (WarningSeverity::Critical, "Replace immediately")
            } else {
                (WarningSeverity::Caution, "Back up data and monitor")
            };
            warnings.push(HealthWarning::new(
                severity,
                "reallocated_sectors",
                reallocated,
                format!("{} sector(s) reallocated", reallocated),
                action,
                "Reallocated sectors were remapped to spare area after failing. A growing count indicates surface degradation.",
            ));
        }
    }

    fn detect_flash(&self, record: &NormalizedDeviceRecord, warnings: &mut Vec<HealthWarning>) {
        if let Some(errors) = record.media_error_count.filter(|&c| c > 0) {
            warnings.push(HealthWarning::new(
                WarningSeverity::Critical,
                "media_errors",
                errors,
                format!("{} media and data integrity error(s)", errors),
                "Replace ASAP",
                "The controller detected unrecovered data integrity errors on the flash media.",
            ));
        }

        if let Some(bitmap) = record.critical_warning_bitmap.filter(|&b| b != 0) {
            warnings.push(HealthWarning::new(
                WarningSeverity::Critical,
                "critical_warning",
                bitmap,
                format!(
                    "Critical warning 0x{:02x}: {}",
                    bitmap,
                    decode_critical_warning(bitmap).join(", ")
                ),
                "Check immediately",
                "The device raised its critical warning flag. Each set bit reports a condition the controller considers urgent.",
            ));
        }
    }
}
