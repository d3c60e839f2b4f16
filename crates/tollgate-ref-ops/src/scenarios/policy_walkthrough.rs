//! Scenario 1: Policy Walkthrough
//!
//! Shows how the desk policy sorts the catalog before any human is involved:
//!
//!   admin_*             → excluded (never offered, refused if proposed)
//!   *_status / *_list   → auto-approved
//!   config_get_secrets  → gated even though it matches "*_get*"
//!   db_migrate          → gated by its own flag
//!
//! A single read-only turn then completes without a decision, and three bad
//! proposals are refused with distinct reasons.

use serde_json::json;

use tollgate_contracts::{error::GateResult, proposal::RefusalReason, tool::ProposedInvocation};

use super::{close_audit, print_response};
use crate::{desk::OpsDesk, mock_data::ops_catalog};

pub fn run_scenario() -> GateResult<()> {
    println!("=== Scenario 1: Policy Walkthrough ===");
    println!();

    let desk = OpsDesk::new("ops-policy-walkthrough")?;

    println!("  Catalog classification:");
    for spec in ops_catalog() {
        let class = desk.gate().classify(&spec);
        let label = if class.excluded {
            "EXCLUDED"
        } else if class.requires_approval {
            "needs approval"
        } else {
            "auto-approved"
        };
        println!("    {:<20} {}", spec.name, label);
    }
    let visible: Vec<&str> = desk.visible_tools().iter().map(|t| t.name.as_str()).collect();
    println!("  Offered to model:       {}", visible.join(", "));
    println!();

    let mut conv = desk.conversation();
    let report = desk.start_turn(
        &mut conv,
        "ops-session-1",
        "Give me the fleet and the state of web-02. Also drop bob's account.",
        vec![vec![
            ProposedInvocation::new("server_list", json!({})),
            ProposedInvocation::new("server_status", json!({ "host": "web-02" })),
            ProposedInvocation::new("admin_user_delete", json!({ "user": "bob" })),
            ProposedInvocation::new("server_status", json!({ "hostname": "web-02" })),
            ProposedInvocation::new("shell_exec", json!({ "cmd": "uptime" })),
        ]],
    )?;

    println!("  Refused proposals:");
    for refused in &report.refused {
        let why = match &refused.reason {
            RefusalReason::UnknownTool => "unknown tool".to_string(),
            RefusalReason::Excluded => "excluded by policy".to_string(),
            RefusalReason::InvalidInput { report } => format!("invalid input ({})", report.summary()),
        };
        println!("    {:<20} {}", refused.tool_name, why);
    }
    print_response(&report.response);
    println!("  Conversation blocked:   {}", conv.is_blocked());
    println!("  Calls archived:         {}", conv.archived_tool_calls().len());

    close_audit(&desk)?;
    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tollgate_contracts::tool::Classification;

    use super::run_scenario;
    use crate::{desk::OpsDesk, mock_data::ops_catalog};

    #[test]
    fn scenario_runs_clean() {
        run_scenario().unwrap();
    }

    #[test]
    fn desk_policy_classifies_the_catalog() {
        let desk = OpsDesk::new("walkthrough-classes").unwrap();
        let class_of = |name: &str| {
            let spec = ops_catalog().into_iter().find(|t| t.name == name).unwrap();
            desk.gate().classify(&spec)
        };

        assert_eq!(class_of("server_list"), Classification::AUTO_APPROVED);
        assert_eq!(class_of("logs_get"), Classification::AUTO_APPROVED);
        assert_eq!(class_of("config_get_secrets"), Classification::GATED);
        assert_eq!(class_of("server_restart"), Classification::GATED);
        assert_eq!(class_of("db_migrate"), Classification::GATED);
        assert_eq!(class_of("admin_user_delete"), Classification::EXCLUDED);
    }
}
