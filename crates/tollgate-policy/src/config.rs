//! Approval policy configuration schema.
//!
//! An `ApprovalPolicyConfig` is deserialized from TOML. Every list is
//! optional and defaults to empty; an empty config gates every tool.
//!
//! ```toml
//! include_patterns = []                 # empty: every registered tool is eligible
//! exclude_patterns = ["admin_*"]
//! auto_approve_patterns = ["*_list*", "*_get*"]
//! high_risk_names = ["orders_refund"]
//! ```

use serde::{Deserialize, Serialize};

/// The top-level structure deserialized from a TOML policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalPolicyConfig {
    /// When non-empty, a tool must match one of these to be offered at all.
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// A matching tool is never offered. Checked before anything else.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// A matching, non-excluded, non-flagged tool runs without a human.
    #[serde(default)]
    pub auto_approve_patterns: Vec<String>,

    /// Exact names that always need a human, whatever the patterns say.
    #[serde(default)]
    pub high_risk_names: Vec<String>,
}
