//! Timeline Labels
//!
//! Turns a months-remaining figure into the label and styling class the
//! dashboard keys off. Shared by every device family.

use serde::{Deserialize, Serialize};

/// Months at or beyond which the label is capped at "5+ years"
pub const CEILING_MONTHS: u32 = 60;

/// Styling class for a replacement timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineClass {
    Critical,
    Warning,
    Caution,
    Normal,
    Healthy,
    Unknown,
}

impl TimelineClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineClass::Critical => "critical",
            TimelineClass::Warning => "warning",
            TimelineClass::Caution => "caution",
            TimelineClass::Normal => "normal",
            TimelineClass::Healthy => "healthy",
            TimelineClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TimelineClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label and class for a months-remaining value
pub fn label(months: Option<u32>) -> (String, TimelineClass) {
    match months {
        None => ("Unknown".to_string(), TimelineClass::Unknown),
        Some(0) => ("Replace Now".to_string(), TimelineClass::Critical),
        Some(1) => ("1 month".to_string(), TimelineClass::Warning),
        Some(m @ 2..=6) => (format!("{} months", m), TimelineClass::Warning),
        Some(7..=12) => ("Within 1 year".to_string(), TimelineClass::Caution),
        Some(m @ 13..=36) => (years(m), TimelineClass::Normal),
        Some(m) if m >= CEILING_MONTHS => ("5+ years".to_string(), TimelineClass::Healthy),
        Some(m) => (years(m), TimelineClass::Healthy),
    }
}

fn years(months: u32) -> String {
    format!("{:.1} years", months as f64 / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_boundaries() {
        assert_eq!(label(Some(0)), ("Replace Now".into(), TimelineClass::Critical));
        assert_eq!(label(Some(1)), ("1 month".into(), TimelineClass::Warning));
        assert_eq!(label(Some(6)), ("6 months".into(), TimelineClass::Warning));
        assert_eq!(label(Some(7)), ("Within 1 year".into(), TimelineClass::Caution));
        assert_eq!(label(Some(12)), ("Within 1 year".into(), TimelineClass::Caution));
        assert_eq!(label(Some(13)), ("1.1 years".into(), TimelineClass::Normal));
        assert_eq!(label(Some(36)), ("3.0 years".into(), TimelineClass::Normal));
        assert_eq!(label(Some(37)), ("3.1 years".into(), TimelineClass::Healthy));
        assert_eq!(label(Some(59)), ("4.9 years".into(), TimelineClass::Healthy));
        assert_eq!(label(Some(60)), ("5+ years".into(), TimelineClass::Healthy));
        assert_eq!(label(Some(400)), ("5+ years".into(), TimelineClass::Healthy));
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(label(None), ("Unknown".into(), TimelineClass::Unknown));
    }
}
