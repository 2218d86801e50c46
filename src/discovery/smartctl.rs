//! smartctl Normalizer
//!
//! Maps `smartctl -a -j` JSON output (ATA attribute table or NVMe health
//! log) onto a [`NormalizedDeviceRecord`], and provides a diagnostic source
//! that shells out to smartmontools.

use crate::domain::lenient::{value_as_count, value_as_health_flag};
use crate::domain::ports::{DeviceFamily, DiagnosticSource, HealthFlag, NormalizedDeviceRecord};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

// =============================================================================
// ATA Attribute IDs
// =============================================================================

const ATTR_REALLOCATED: &[u32] = &[5];
const ATTR_POWER_ON_HOURS: &[u32] = &[9];
const ATTR_REPORTED_UNCORRECTABLE: &[u32] = &[187];
const ATTR_COMMAND_TIMEOUT: &[u32] = &[188];
const ATTR_TEMPERATURE: &[u32] = &[194, 190];
const ATTR_PENDING: &[u32] = &[197];
const ATTR_UNCORRECTABLE: &[u32] = &[198];
/// Wear-leveling / media wearout indicators (normalized value = life left)
const ATTR_LIFE_LEFT: &[u32] = &[177, 231, 233];
const ATTR_LBAS_WRITTEN: &[u32] = &[241];

/// NVMe data units are thousands of 512-byte blocks
const NVME_DATA_UNIT_BYTES: u64 = 512_000;

// =============================================================================
// Normalizer
// =============================================================================

/// Converts smartctl JSON into normalized records
pub struct SmartctlNormalizer;

impl SmartctlNormalizer {
    /// Normalize one device's `smartctl -a -j` output
    pub fn normalize(json: &Value) -> Result<NormalizedDeviceRecord> {
        let device_path = json["device"]["name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Normalization {
                device: "<unknown>".into(),
                reason: "missing device.name".into(),
            })?;

        let family = Self::detect_family(json);
        let mut record = NormalizedDeviceRecord::new(device_path, family);

        record.model = json["model_name"]
            .as_str()
            .or_else(|| json["model_family"].as_str())
            .map(|s| s.trim().to_string());
        record.serial = json["serial_number"].as_str().map(|s| s.trim().to_string());
        record.overall_health_flag = match json.get("smart_status") {
            Some(status) => value_as_health_flag(&status["passed"]),
            None => HealthFlag::Unknown,
        };
        record.power_on_hours = value_as_count(&json["power_on_time"]["hours"]);
        record.temperature_celsius = json["temperature"]["current"]
            .as_i64()
            .filter(|t| (-40..=150).contains(t))
            .map(|t| t as i32);
        record.capacity_bytes = value_as_count(&json["user_capacity"]["bytes"])
            .or_else(|| value_as_count(&json["nvme_total_capacity"]))
            .filter(|&c| c > 0);

        let nvme_log = &json["nvme_smart_health_information_log"];
        if nvme_log.is_object() {
            Self::apply_nvme_log(nvme_log, &mut record);
        } else {
            Self::apply_ata_attributes(json, &mut record);
        }

        debug!(
            device = %record.device_path,
            family = %record.device_family,
            hours = ?record.power_on_hours,
            "Normalized smartctl output"
        );
        Ok(record)
    }

    /// Decide the device family from transport and rotation rate
    pub fn detect_family(json: &Value) -> DeviceFamily {
        let device_type = json["device"]["type"].as_str().unwrap_or_default();
        let name = json["device"]["name"].as_str().unwrap_or_default();

        if device_type.starts_with("usb") || name.contains("mmcblk") {
            return DeviceFamily::Removable;
        }
        if device_type == "nvme" || json["nvme_smart_health_information_log"].is_object() {
            return DeviceFamily::Flash;
        }
        match json["rotation_rate"].as_u64() {
            Some(0) => DeviceFamily::Flash,
            Some(_) => DeviceFamily::Mechanical,
            None if json["model_name"]
                .as_str()
                .is_some_and(|m| m.to_lowercase().contains("ssd")) =>
            {
                DeviceFamily::Flash
            }
            None => DeviceFamily::Mechanical,
        }
    }

    fn apply_nvme_log(log: &Value, record: &mut NormalizedDeviceRecord) {
        record.critical_warning_bitmap = value_as_count(&log["critical_warning"]);
        record.available_spare = value_as_count(&log["available_spare"]).map(|v| v.min(100) as u8);
        record.available_spare_threshold =
            value_as_count(&log["available_spare_threshold"]).map(|v| v.min(100) as u8);
        record.percentage_used =
            value_as_count(&log["percentage_used"]).map(|v| v.min(u8::MAX as u64) as u8);
        record.media_error_count = value_as_count(&log["media_errors"]);
        record.bytes_written_total = value_as_count(&log["data_units_written"])
            .map(|units| units.saturating_mul(NVME_DATA_UNIT_BYTES));
        record.power_on_hours = record
            .power_on_hours
            .or_else(|| value_as_count(&log["power_on_hours"]));
    }

    fn apply_ata_attributes(json: &Value, record: &mut NormalizedDeviceRecord) {
        let attrs = &json["ata_smart_attributes"]["table"];
        if !attrs.is_array() {
            warn!(device = %record.device_path, "No ATA SMART attribute table");
            return;
        }

        record.reallocated_sector_count = Self::find_smart_attr(attrs, ATTR_REALLOCATED);
        record.pending_sector_count = Self::find_smart_attr(attrs, ATTR_PENDING);
        record.uncorrectable_sector_count = Self::find_smart_attr(attrs, ATTR_UNCORRECTABLE);
        record.reported_uncorrectable_count =
            Self::find_smart_attr(attrs, ATTR_REPORTED_UNCORRECTABLE);
        record.command_timeout_count = Self::find_smart_attr(attrs, ATTR_COMMAND_TIMEOUT);
        record.power_on_hours = record
            .power_on_hours
            .or_else(|| Self::find_smart_attr(attrs, ATTR_POWER_ON_HOURS));
        record.temperature_celsius = record.temperature_celsius.or_else(|| {
            Self::find_smart_attr(attrs, ATTR_TEMPERATURE)
                .map(|raw| (raw & 0xFF) as i32)
                .filter(|t| *t > 0)
        });

        if record.device_family != DeviceFamily::Mechanical {
            record.percentage_used = Self::find_normalized_attr(attrs, ATTR_LIFE_LEFT)
                .map(|left| 100u64.saturating_sub(left) as u8);

            let block_size = json["logical_block_size"].as_u64().unwrap_or(512);
            record.bytes_written_total = Self::find_smart_attr(attrs, ATTR_LBAS_WRITTEN)
                .map(|lbas| lbas.saturating_mul(block_size));
        }
    }

    /// Raw value of the first attribute matching any of `ids`
    fn find_smart_attr(attrs: &Value, ids: &[u32]) -> Option<u64> {
        Self::find_attr(attrs, ids).and_then(|attr| value_as_count(&attr["raw"]["value"]))
    }

    /// Normalized (vendor-scaled) value of the first matching attribute
    fn find_normalized_attr(attrs: &Value, ids: &[u32]) -> Option<u64> {
        Self::find_attr(attrs, ids).and_then(|attr| value_as_count(&attr["value"]))
    }

    fn find_attr<'a>(attrs: &'a Value, ids: &[u32]) -> Option<&'a Value> {
        let table = attrs.as_array()?;
        ids.iter().find_map(|wanted| {
            table
                .iter()
                .find(|attr| attr["id"].as_u64() == Some(*wanted as u64))
        })
    }
}

// =============================================================================
// smartctl Diagnostic Source
// =============================================================================

/// Collects records by running smartctl against every scanned device
pub struct SmartctlSource {
    binary: String,
}

impl SmartctlSource {
    pub fn new() -> Self {
        Self {
            binary: "smartctl".to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run_json(&self, args: &[&str]) -> Result<Value> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                warn!("Failed to run {}: {}", self.binary, e);
                Error::SourceUnavailable {
                    source_name: self.binary.clone(),
                }
            })?;

        // smartctl exit status is a bitmask of drive conditions; the JSON on
        // stdout is authoritative
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn scan(&self) -> Result<Vec<String>> {
        let json = self.run_json(&["--scan", "-j"]).await?;
        Ok(json["devices"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|d| d["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl Default for SmartctlSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiagnosticSource for SmartctlSource {
    fn name(&self) -> &str {
        "smartctl"
    }

    async fn collect(&self) -> Result<Vec<NormalizedDeviceRecord>> {
        let devices = self.scan().await?;
        let mut records = Vec::with_capacity(devices.len());

        for device in devices {
            let json = match self.run_json(&["-a", "-j", &device]).await {
                Ok(json) => json,
                Err(e) => {
                    warn!("Skipping {}: {}", device, e);
                    continue;
                }
            };
            match SmartctlNormalizer::normalize(&json) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping {}: {}", device, e),
            }
        }

        Ok(records)
    }
}
