//! Lenient counter deserialization
//!
//! Upstream diagnostics are noisy. A negative, non-numeric or non-finite
//! counter is treated as "not measured" instead of failing the whole record,
//! and percentages are clamped into the range the device can report.

use super::ports::HealthFlag;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a non-negative counter
pub fn value_as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        }),
        Value::String(s) => {
            let s = s.trim().replace(',', "");
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            })
        }
        _ => None,
    }
}

/// Interpret a JSON value as a health flag
pub fn value_as_health_flag(value: &Value) -> HealthFlag {
    match value {
        Value::Bool(true) => HealthFlag::Passed,
        Value::Bool(false) => HealthFlag::Failed,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" | "ok" | "good" => HealthFlag::Passed,
            "failed" | "fail" | "failing" | "bad" => HealthFlag::Failed,
            _ => HealthFlag::Unknown,
        },
        _ => HealthFlag::Unknown,
    }
}

/// Optional non-negative counter
pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_count))
}

/// Optional percentage that may legitimately exceed 100 (NVMe percentage used)
pub fn wear_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_count)
        .map(|v| v.min(u8::MAX as u64) as u8))
}

/// Optional percentage bounded to 0-100
pub fn percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_count)
        .map(|v| v.min(100) as u8))
}

/// Optional temperature, rejecting physically impossible readings
pub fn temperature<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|t| t.is_finite() && (-40.0..=150.0).contains(t))
    .map(|t| t.round() as i32))
}

/// Tri-state health flag; anything unrecognized is `Unknown`
pub fn health_flag<'de, D>(deserializer: D) -> Result<HealthFlag, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .map(value_as_health_flag)
        .unwrap_or(HealthFlag::Unknown))
}
