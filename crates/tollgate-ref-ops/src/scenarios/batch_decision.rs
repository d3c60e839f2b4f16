//! Scenario 2: Batch Decision
//!
//! One turn proposes a health check plus three gated changes in a single
//! batch. The health check runs at once; the run suspends on the other three
//! and its snapshot is parked in the session store.
//!
//! The operator then answers all three in one request: approve both web
//! restarts, reject the migration with a note. A single resume applies every
//! decision, the runtime narrates the refusal, and the turn is retired.

use serde_json::json;

use tollgate_contracts::{
    error::GateResult,
    run::Decision,
    tool::ProposedInvocation,
    turn::{ToolDecision, TurnRequest},
};

use super::{close_audit, print_response};
use crate::desk::OpsDesk;

const SESSION: &str = "ops-session-2";

fn plan() -> Vec<Vec<ProposedInvocation>> {
    vec![vec![
        ProposedInvocation::new("server_status", json!({ "host": "db-01" })).with_id("s0"),
        ProposedInvocation::new("server_restart", json!({ "host": "web-01" })).with_id("r1"),
        ProposedInvocation::new("server_restart", json!({ "host": "web-02" })).with_id("r2"),
        ProposedInvocation::new("db_migrate", json!({ "target_version": 42 })).with_id("r3"),
    ]]
}

fn decisions() -> TurnRequest {
    TurnRequest {
        messages: Vec::new(),
        decisions: vec![
            ToolDecision::approve("r1"),
            ToolDecision::approve("r2"),
            ToolDecision::reject("r3", Some("migration window is Saturday".to_string())),
        ],
    }
}

pub fn run_scenario() -> GateResult<()> {
    println!("=== Scenario 2: Batch Decision ===");
    println!();

    let desk = OpsDesk::new("ops-batch-decision")?;
    let mut conv = desk.conversation();

    println!("  User: roll the web tier and bring the schema to v42");
    let report = desk.start_turn(
        &mut conv,
        SESSION,
        "Roll the web tier and bring the schema to v42.",
        plan(),
    )?;
    print_response(&report.response);
    if let Some(len) = desk.suspended_len(SESSION)? {
        println!("  Snapshot parked:        {} byte(s)", len);
    }
    println!("  Conversation blocked:   {}", conv.is_blocked());
    println!();

    println!("  Operator: approve r1, r2; reject r3 (migration window is Saturday)");
    let report = desk.continue_turn(&mut conv, SESSION, &decisions())?;
    if let Some(resume) = &report.resume {
        for applied in &resume.applied {
            let label = match &applied.decision {
                Decision::Confirmed => "confirmed".to_string(),
                Decision::Rejected { reason: Some(r) } => format!("rejected ({})", r),
                Decision::Rejected { reason: None } => "rejected".to_string(),
            };
            println!("    {:<22} {}", applied.requirement_id, label);
        }
    }
    print_response(&report.response);
    println!("  Snapshot parked:        {}", desk.has_suspended_run(SESSION)?);
    println!("  Calls archived:         {}", conv.archived_tool_calls().len());

    close_audit(&desk)?;
    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tollgate_contracts::{
        event::event_types,
        run::Decision,
        tool::{ToolCallId, ToolCallStatus},
    };

    use super::{decisions, plan, run_scenario, SESSION};
    use crate::desk::OpsDesk;

    #[test]
    fn scenario_runs_clean() {
        run_scenario().unwrap();
    }

    #[test]
    fn first_turn_suspends_on_all_three_gated_calls() {
        let desk = OpsDesk::new("batch-first").unwrap();
        let mut conv = desk.conversation();
        let report = desk.start_turn(&mut conv, SESSION, "go", plan()).unwrap();

        let ids: Vec<&str> = report.response.pending.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
        assert_eq!(
            conv.tool_call(&ToolCallId::from("s0")).unwrap().status(),
            ToolCallStatus::Completed
        );
        assert!(desk.has_suspended_run(SESSION).unwrap());
    }

    #[test]
    fn one_resume_settles_the_whole_batch() {
        let desk = OpsDesk::new("batch-resume").unwrap();
        let mut conv = desk.conversation();
        desk.start_turn(&mut conv, SESSION, "go", plan()).unwrap();

        let report = desk.continue_turn(&mut conv, SESSION, &decisions()).unwrap();
        let resume = report.resume.unwrap();

        assert_eq!(resume.applied.len(), 3);
        assert_eq!(resume.applied[0].decision, Decision::Confirmed);
        assert_eq!(resume.applied[1].decision, Decision::Confirmed);
        assert_eq!(
            resume.applied[2].decision,
            Decision::Rejected { reason: Some("migration window is Saturday".to_string()) }
        );
        assert!(resume.unresolved.is_empty());

        let text = report.response.result.unwrap();
        assert!(text.contains("web-01 restarted cleanly"));
        assert!(text.contains("web-02 restarted cleanly"));
        assert!(text.contains(
            "operation db_migrate was not performed because it was declined: migration window is Saturday"
        ));

        let statuses: Vec<ToolCallStatus> =
            conv.archived_tool_calls().iter().map(|c| c.status()).collect();
        assert_eq!(
            statuses,
            vec![
                ToolCallStatus::Completed,
                ToolCallStatus::Completed,
                ToolCallStatus::Completed,
                ToolCallStatus::Rejected,
            ]
        );
        assert!(!conv.is_blocked());
        assert!(!desk.has_suspended_run(SESSION).unwrap());
    }

    #[test]
    fn audit_trail_records_the_lifecycle() {
        let desk = OpsDesk::new("batch-audit").unwrap();
        let mut conv = desk.conversation();
        desk.start_turn(&mut conv, SESSION, "go", plan()).unwrap();
        desk.continue_turn(&mut conv, SESSION, &decisions()).unwrap();

        let log = desk.audit().export_log();
        let types = log.event_types();
        for expected in [
            event_types::TOOL_CALL_CREATED,
            event_types::TOOL_CALL_APPROVED,
            event_types::TOOL_CALL_REJECTED,
            event_types::TOOL_CALL_COMPLETED,
            event_types::RUN_SUSPENDED,
            event_types::RUN_RESUMED,
            event_types::RUN_COMPLETED,
            event_types::TURN_RETIRED,
        ] {
            assert!(types.contains(&expected), "missing {}", expected);
        }
        assert!(desk.audit().verify_integrity());
    }
}
