//! # tollgate-policy
//!
//! A TOML-driven, default-safe approval policy for Tollgate.
//!
//! ## Overview
//!
//! This crate provides [`ApprovalPolicy`], which implements the
//! [`ApprovalClassifier`](tollgate_core::traits::ApprovalClassifier) trait.
//! Tool names are matched against glob pattern lists declared in TOML. A tool
//! nobody mentioned still needs a human.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tollgate_policy::ApprovalPolicy;
//!
//! let policy = ApprovalPolicy::from_file(Path::new("policies/ops.toml"))?;
//! // Pass `policy` to `tollgate_core::ToolGate::new(...)`.
//! ```

pub mod config;
pub mod engine;
pub mod pattern;

pub use config::ApprovalPolicyConfig;
pub use engine::ApprovalPolicy;
pub use pattern::{matches, PatternSet};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tollgate_contracts::{error::GateError, tool::{Classification, ToolSpec}};
    use tollgate_core::traits::ApprovalClassifier;

    use crate::ApprovalPolicy;

    fn policy(toml: &str) -> ApprovalPolicy {
        ApprovalPolicy::from_toml_str(toml).unwrap()
    }

    // ── 1. default-safe ───────────────────────────────────────────────────────

    /// A tool matched by nothing requires approval.
    #[test]
    fn test_default_safe() {
        let p = policy(r#"auto_approve_patterns = ["*_list*"]"#);
        assert_eq!(p.classify("data_export", false), Classification::GATED);

        let empty = policy("");
        assert_eq!(empty.classify("items_list", false), Classification::GATED);
    }

    // ── 2. auto-approve ───────────────────────────────────────────────────────

    #[test]
    fn test_auto_approve_pattern() {
        let p = policy(r#"auto_approve_patterns = ["*_list*"]"#);
        assert_eq!(p.classify("items_list", false), Classification::AUTO_APPROVED);
    }

    // ── 3. exclusion ──────────────────────────────────────────────────────────

    #[test]
    fn test_exclusion() {
        let p = policy(r#"exclude_patterns = ["admin_*"]"#);
        assert!(p.classify("admin_reset", false).excluded);
        assert!(p.classify("admin_reset", true).excluded);
        assert!(!p.classify("user_reset", false).excluded);
    }

    /// Exclusion has priority over auto-approve when both match. This is a
    /// deliberate rule: a tool someone chose to hide stays hidden.
    #[test]
    fn test_exclusion_beats_auto_approve() {
        let p = policy(
            r#"
            exclude_patterns = ["admin_*"]
            auto_approve_patterns = ["admin_*", "*_list"]
            "#,
        );
        assert_eq!(p.classify("admin_list", false), Classification::EXCLUDED);
    }

    // ── 4. overrides that force a human ───────────────────────────────────────

    #[test]
    fn test_tool_flag_beats_auto_approve() {
        let p = policy(r#"auto_approve_patterns = ["*"]"#);
        assert_eq!(p.classify("orders_cancel", true), Classification::GATED);
        assert_eq!(p.classify("orders_view", false), Classification::AUTO_APPROVED);
    }

    #[test]
    fn test_high_risk_beats_auto_approve() {
        let p = policy(
            r#"
            auto_approve_patterns = ["orders_*"]
            high_risk_names = ["orders_refund"]
            "#,
        );
        assert_eq!(p.classify("orders_refund", false), Classification::GATED);
        assert_eq!(p.classify("orders_view", false), Classification::AUTO_APPROVED);
    }

    /// High-risk names are exact; they are not patterns.
    #[test]
    fn test_high_risk_is_exact_name() {
        let p = policy(
            r#"
            auto_approve_patterns = ["*"]
            high_risk_names = ["orders_*"]
            "#,
        );
        assert_eq!(p.classify("orders_refund", false), Classification::AUTO_APPROVED);
    }

    // ── 5. include list ───────────────────────────────────────────────────────

    #[test]
    fn test_include_patterns_restrict_catalog() {
        let p = policy(
            r#"
            include_patterns = ["server_*", "db_*"]
            auto_approve_patterns = ["*_status"]
            "#,
        );
        assert_eq!(p.classify("server_status", false), Classification::AUTO_APPROVED);
        assert_eq!(p.classify("mail_send", false), Classification::EXCLUDED);
    }

    // ── 6. visible tools ──────────────────────────────────────────────────────

    #[test]
    fn test_visible_tools_preserve_order() {
        let p = policy(r#"exclude_patterns = ["admin_*"]"#);
        let tools = vec![
            ToolSpec::new("user_get", false),
            ToolSpec::new("admin_reset", false),
            ToolSpec::new("user_delete", true),
        ];
        let names: Vec<String> = p.visible_tools(&tools).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["user_get", "user_delete"]);
    }

    // ── 7. literal metacharacters ─────────────────────────────────────────────

    #[test]
    fn test_brackets_in_patterns_are_literal() {
        let p = policy(r#"auto_approve_patterns = ["report[v2]"]"#);
        assert_eq!(p.classify("report[v2]", false), Classification::AUTO_APPROVED);
        assert_eq!(p.classify("reportv", false), Classification::GATED);
    }

    // ── 8. config errors ──────────────────────────────────────────────────────

    #[test]
    fn test_toml_parse_error() {
        match ApprovalPolicy::from_toml_str("this is not valid toml ][[[") {
            Err(GateError::ConfigError { reason }) => {
                assert!(
                    reason.contains("failed to parse approval policy TOML"),
                    "expected parse error message, got: {reason}"
                );
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            ApprovalPolicy::from_toml_str(r#"auto_aprove_patterns = ["*"]"#),
            Err(GateError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ApprovalPolicy::from_file(std::path::Path::new("/nonexistent/policy.toml"));
        assert!(matches!(result, Err(GateError::ConfigError { .. })));
    }
}
