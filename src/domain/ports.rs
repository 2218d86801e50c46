//! Domain Ports - Core types and trait definitions for the advisor
//!
//! The normalized record is the only thing the assessment engine knows about
//! a device. Adapters implementing [`DiagnosticSource`] are responsible for
//! producing it; how they obtain the telemetry is not the engine's concern.

use super::lenient;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Hours in a (non-leap) year, used to convert power-on time to age
pub const HOURS_PER_YEAR: f64 = 8760.0;

// =============================================================================
// Device Family
// =============================================================================

/// Structural family of a storage device, selecting how wear is modeled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// Spinning media, assessed by powered-on age
    #[serde(alias = "hdd", alias = "sas", alias = "sata")]
    Mechanical,
    /// SSD/NVMe, assessed by wear and spare capacity
    #[serde(alias = "ssd", alias = "nvme")]
    Flash,
    /// USB sticks, SD cards and flash boot media
    #[serde(alias = "usb", alias = "sd")]
    Removable,
}

impl std::fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceFamily::Mechanical => write!(f, "mechanical"),
            DeviceFamily::Flash => write!(f, "flash"),
            DeviceFamily::Removable => write!(f, "removable"),
        }
    }
}

/// Overall SMART self-assessment result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthFlag {
    Passed,
    Failed,
    #[default]
    Unknown,
}

impl std::fmt::Display for HealthFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthFlag::Passed => write!(f, "passed"),
            HealthFlag::Failed => write!(f, "failed"),
            HealthFlag::Unknown => write!(f, "unknown"),
        }
    }
}

// =============================================================================
// Normalized Device Record
// =============================================================================

/// Normalized diagnostic snapshot of one device.
///
/// Every counter is optional: `None` means "not measured", which is not the
/// same as a verified zero. Malformed upstream values (negative, non-numeric)
/// deserialize as `None` and percentages are clamped to their valid range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDeviceRecord {
    /// Device path (e.g., /dev/sda); the only identity a record has
    pub device_path: String,
    /// Model name, passed through to presentation
    #[serde(default)]
    pub model: Option<String>,
    /// Serial number, passed through to presentation
    #[serde(default)]
    pub serial: Option<String>,
    /// Device family
    pub device_family: DeviceFamily,

    /// Accumulated powered-on time
    #[serde(default, deserialize_with = "lenient::count")]
    pub power_on_hours: Option<u64>,
    /// Current temperature in Celsius
    #[serde(default, deserialize_with = "lenient::temperature")]
    pub temperature_celsius: Option<i32>,
    /// SMART overall-health self-assessment
    #[serde(default, deserialize_with = "lenient::health_flag")]
    pub overall_health_flag: HealthFlag,

    // Mechanical counters
    #[serde(default, deserialize_with = "lenient::count")]
    pub reallocated_sector_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub pending_sector_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub uncorrectable_sector_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub reported_uncorrectable_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub command_timeout_count: Option<u64>,

    // Flash counters
    /// Vendor estimate of life used; values above 100 are meaningful
    #[serde(default, deserialize_with = "lenient::wear_percent")]
    pub percentage_used: Option<u8>,
    /// Remaining spare capacity (0-100)
    #[serde(default, deserialize_with = "lenient::percent")]
    pub available_spare: Option<u8>,
    /// Vendor-defined spare threshold (0-100)
    #[serde(default, deserialize_with = "lenient::percent")]
    pub available_spare_threshold: Option<u8>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub media_error_count: Option<u64>,
    /// NVMe critical warning bitmap; any set bit is an immediate concern
    #[serde(default, deserialize_with = "lenient::count")]
    pub critical_warning_bitmap: Option<u64>,
    /// Total host bytes written over the device lifetime
    #[serde(default, deserialize_with = "lenient::count")]
    pub bytes_written_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub capacity_bytes: Option<u64>,
}

impl NormalizedDeviceRecord {
    /// Create an empty record (nothing measured) for a device
    pub fn new(device_path: impl Into<String>, device_family: DeviceFamily) -> Self {
        Self {
            device_path: device_path.into(),
            model: None,
            serial: None,
            device_family,
            power_on_hours: None,
            temperature_celsius: None,
            overall_health_flag: HealthFlag::Unknown,
            reallocated_sector_count: None,
            pending_sector_count: None,
            uncorrectable_sector_count: None,
            reported_uncorrectable_count: None,
            command_timeout_count: None,
            percentage_used: None,
            available_spare: None,
            available_spare_threshold: None,
            media_error_count: None,
            critical_warning_bitmap: None,
            bytes_written_total: None,
            capacity_bytes: None,
        }
    }

    /// Powered-on age in years, if known
    pub fn age_years(&self) -> Option<f64> {
        self.power_on_hours.map(|h| h as f64 / HOURS_PER_YEAR)
    }

    /// Spare threshold reported by the device, or the configured fallback
    pub fn spare_threshold(&self, fallback: u8) -> u8 {
        self.available_spare_threshold.unwrap_or(fallback)
    }

    /// Whether the device reports media errors or a critical warning bit
    pub fn has_flash_error(&self) -> bool {
        self.media_error_count.unwrap_or(0) > 0 || self.critical_warning_bitmap.unwrap_or(0) != 0
    }

    /// Whether wear-based assessment can run for this record
    pub fn has_wear_telemetry(&self) -> bool {
        self.percentage_used.is_some() || self.available_spare.is_some() || self.has_flash_error()
    }

    /// Whether this record should be assessed by the wear model
    pub fn uses_wear_model(&self) -> bool {
        match self.device_family {
            DeviceFamily::Mechanical => false,
            DeviceFamily::Flash | DeviceFamily::Removable => self.has_wear_telemetry(),
        }
    }
}

// =============================================================================
// Diagnostic Source Port
// =============================================================================

/// Port for obtaining normalized records for the devices of a host
#[async_trait]
pub trait DiagnosticSource: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Collect one normalized record per device
    async fn collect(&self) -> Result<Vec<NormalizedDeviceRecord>>;
}

pub type DiagnosticSourceRef = Arc<dyn DiagnosticSource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_family_display() {
        assert_eq!(format!("{}", DeviceFamily::Mechanical), "mechanical");
        assert_eq!(format!("{}", DeviceFamily::Flash), "flash");
        assert_eq!(format!("{}", DeviceFamily::Removable), "removable");
    }

    #[test]
    fn test_family_aliases() {
        let family: DeviceFamily = serde_json::from_str("\"nvme\"").unwrap();
        assert_eq!(family, DeviceFamily::Flash);
        let family: DeviceFamily = serde_json::from_str("\"hdd\"").unwrap();
        assert_eq!(family, DeviceFamily::Mechanical);
    }

    #[test]
    fn test_lenient_record_parsing() {
        let record: NormalizedDeviceRecord = serde_json::from_str(
            r#"{
                "device_path": "/dev/nvme0n1",
                "device_family": "flash",
                "power_on_hours": -5,
                "overall_health_flag": "PASSED",
                "percentage_used": 300,
                "available_spare": 140,
                "media_error_count": "0",
                "temperature_celsius": 4000
            }"#,
        )
        .unwrap();

        assert_eq!(record.power_on_hours, None);
        assert_eq!(record.overall_health_flag, HealthFlag::Passed);
        assert_eq!(record.percentage_used, Some(255));
        assert_eq!(record.available_spare, Some(100));
        assert_eq!(record.media_error_count, Some(0));
        assert_eq!(record.temperature_celsius, None);
        assert_eq!(record.critical_warning_bitmap, None);
    }

    #[test]
    fn test_wear_model_selection() {
        let mut record = NormalizedDeviceRecord::new("/dev/sdb", DeviceFamily::Removable);
        assert!(!record.uses_wear_model());

        record.available_spare = Some(100);
        assert!(record.uses_wear_model());

        let mut hdd = NormalizedDeviceRecord::new("/dev/sda", DeviceFamily::Mechanical);
        hdd.percentage_used = Some(10);
        assert!(!hdd.uses_wear_model());
    }

    #[test]
    fn test_spare_threshold_fallback() {
        let mut record = NormalizedDeviceRecord::new("/dev/nvme0n1", DeviceFamily::Flash);
        assert_eq!(record.spare_threshold(10), 10);
        record.available_spare_threshold = Some(5);
        assert_eq!(record.spare_threshold(10), 5);
    }
}
