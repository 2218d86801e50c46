//! Risk Tiers
//!
//! Five ordered severity buckets. Declaration order is the severity order,
//! so combining two signals is `max`, never a blend.

use serde::{Deserialize, Serialize};

/// Ordered risk tier, least severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Minimal,
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskTier {
    /// All tiers in ascending severity
    pub const ALL: [RiskTier; 5] = [
        RiskTier::Minimal,
        RiskTier::Low,
        RiskTier::Moderate,
        RiskTier::Elevated,
        RiskTier::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Minimal => "minimal",
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::Elevated => "elevated",
            RiskTier::High => "high",
        }
    }

    /// Raise an optional tier to at least `floor`
    pub fn at_least(tier: Option<RiskTier>, floor: RiskTier) -> RiskTier {
        tier.map_or(floor, |t| t.max(floor))
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(RiskTier::Minimal < RiskTier::Low);
        assert!(RiskTier::Low < RiskTier::Moderate);
        assert!(RiskTier::Moderate < RiskTier::Elevated);
        assert!(RiskTier::Elevated < RiskTier::High);
        assert_eq!(RiskTier::Low.max(RiskTier::Moderate), RiskTier::Moderate);

        let mut sorted = RiskTier::ALL;
        sorted.sort();
        assert_eq!(sorted, RiskTier::ALL);
    }

    #[test]
    fn test_at_least() {
        assert_eq!(RiskTier::at_least(None, RiskTier::High), RiskTier::High);
        assert_eq!(
            RiskTier::at_least(Some(RiskTier::Low), RiskTier::High),
            RiskTier::High
        );
        assert_eq!(
            RiskTier::at_least(Some(RiskTier::Elevated), RiskTier::Low),
            RiskTier::Elevated
        );
    }

    #[test]
    fn test_tier_labels() {
        let json = serde_json::to_string(&RiskTier::Elevated).unwrap();
        assert_eq!(json, "\"elevated\"");
        assert_eq!(format!("{}", RiskTier::Minimal), "minimal");
    }
}
