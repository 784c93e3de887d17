//! Admin dashboard entities.

use serde::{Deserialize, Serialize};

use super::Money;
use crate::domain::serde_utils::decimal_cents;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub active_listings: u64,
    #[serde(default)]
    pub pending_listings: u64,
    #[serde(default)]
    pub reports_open: u64,
    #[serde(default, rename = "revenue", with = "decimal_cents")]
    pub revenue_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl DashboardStats {
    #[must_use]
    pub fn revenue(&self) -> Money {
        Money::new(
            self.revenue_cents,
            self.currency.clone().unwrap_or_default(),
        )
    }
}

/// Moderator verdict for a pending listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum ModerationDecision {
    Approve,
    Reject { reason: String },
}

impl ModerationDecision {
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject { .. } => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_wire_format() {
        let json = serde_json::to_value(ModerationDecision::reject("spam")).unwrap();
        assert_eq!(json["decision"], "reject");
        assert_eq!(json["reason"], "spam");

        let json = serde_json::to_value(ModerationDecision::Approve).unwrap();
        assert_eq!(json["decision"], "approve");
    }

    #[test]
    fn test_stats_defaults() {
        let stats: DashboardStats = serde_json::from_str(r#"{"total_users": 3}"#).unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.revenue().to_string(), "0.00 EUR");
    }
}
