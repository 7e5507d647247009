//! Straight-through-processing rule payloads
//!
//! STP rules govern automatic transaction handling per provider/authority;
//! each rule toggles one known condition, optionally with a threshold value.

use serde::{Deserialize, Serialize};

/// Rule keys the decisioning side understands
pub const ALLOWED_STP_RULE_KEYS: &[&str] = &[
    "deposits_amount",
    "deposits_count",
    "withdrawals_amount",
    "kyc_status",
    "low_risk_profile",
];

/// One STP rule entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StpRule {
    pub key: String,
    #[serde(default)]
    pub is_enabled: bool,
    /// Threshold or comparison value; absent for boolean rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl StpRule {
    /// Whether the decisioning side knows this rule key
    pub fn is_known_key(&self) -> bool {
        ALLOWED_STP_RULE_KEYS.contains(&self.key.as_str())
    }
}
