//! Simulated operations tooling for the Tollgate reference runtime.
//!
//! All hosts, services and outputs here are hardcoded and fictional. Nothing
//! is contacted. The catalog stands in for the tool registry an operations
//! assistant would expose to its model.

use serde_json::{json, Value};

use tollgate_contracts::tool::ToolSpec;

// ── Fleet (mock) ──────────────────────────────────────────────────────────────

/// Known hosts and their role.
pub const FLEET: &[(&str, &str)] = &[
    ("web-01", "frontend"),
    ("web-02", "frontend"),
    ("db-01", "postgres primary"),
    ("db-02", "postgres replica"),
];

/// Schema version currently applied to the mock database.
pub const CURRENT_SCHEMA_VERSION: u64 = 41;

fn known_host(host: &str) -> bool {
    FLEET.iter().any(|(h, _)| *h == host)
}

fn host_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "host": { "type": "string", "minLength": 1 } },
        "required": ["host"],
        "additionalProperties": false
    })
}

// ── Tool catalog ──────────────────────────────────────────────────────────────

/// Every tool the ops assistant knows about, in display order.
pub fn ops_catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new("server_list", false)
            .with_description("List hosts in the fleet")
            .with_input_schema(json!({ "type": "object", "additionalProperties": false })),
        ToolSpec::new("server_status", false)
            .with_description("Health of one host")
            .with_input_schema(host_schema()),
        ToolSpec::new("logs_get", false)
            .with_description("Tail recent logs for a host")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "lines": { "type": "integer", "minimum": 1, "maximum": 500 }
                },
                "required": ["host"]
            })),
        ToolSpec::new("config_get_secrets", false)
            .with_description("Read service credentials")
            .with_input_schema(json!({
                "type": "object",
                "properties": { "service": { "type": "string" } },
                "required": ["service"]
            })),
        ToolSpec::new("server_restart", false)
            .with_description("Restart a host")
            .with_input_schema(host_schema()),
        ToolSpec::new("db_migrate", true)
            .with_description("Apply a schema migration to the primary database")
            .with_input_schema(json!({
                "type": "object",
                "properties": { "target_version": { "type": "integer", "minimum": 1 } },
                "required": ["target_version"]
            })),
        ToolSpec::new("admin_user_delete", true)
            .with_description("Delete an operator account")
            .with_input_schema(json!({
                "type": "object",
                "properties": { "user": { "type": "string" } },
                "required": ["user"]
            })),
    ]
}

// ── Tool execution (mock) ─────────────────────────────────────────────────────

/// Run one tool against the mock fleet.
///
/// `Err` is a tool-level failure the runtime reports as `Failed`; it never
/// aborts the run.
pub fn execute_tool(tool_name: &str, input: &Value) -> Result<String, String> {
    let host = input["host"].as_str().unwrap_or_default();

    match tool_name {
        "server_list" => Ok(FLEET
            .iter()
            .map(|(h, role)| format!("{h} ({role})"))
            .collect::<Vec<_>>()
            .join(", ")),

        "server_status" if known_host(host) => Ok(format!("{host}: healthy, load 0.42, uptime 17d")),

        "logs_get" if known_host(host) => {
            let lines = input["lines"].as_u64().unwrap_or(3);
            Ok(format!("{host}: last {lines} log line(s), no errors"))
        }

        "config_get_secrets" => {
            let service = input["service"].as_str().unwrap_or("unknown");
            Ok(format!("{service}: credentials issued (redacted)"))
        }

        "server_restart" if known_host(host) => Ok(format!("{host} restarted cleanly in 38s")),

        "db_migrate" => {
            let target = input["target_version"].as_u64().unwrap_or(0);
            if target <= CURRENT_SCHEMA_VERSION {
                Err(format!(
                    "target version {target} is not newer than current version {CURRENT_SCHEMA_VERSION}"
                ))
            } else {
                Ok(format!("schema migrated {CURRENT_SCHEMA_VERSION} -> {target}"))
            }
        }

        "server_status" | "logs_get" | "server_restart" => Err(format!("unknown host '{host}'")),

        other => Err(format!("tool '{other}' is not available on this desk")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{execute_tool, ops_catalog};

    #[test]
    fn catalog_names_are_unique() {
        let catalog = ops_catalog();
        let mut names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn restart_known_and_unknown_host() {
        assert!(execute_tool("server_restart", &json!({ "host": "db-01" })).is_ok());
        assert_eq!(
            execute_tool("server_restart", &json!({ "host": "db-99" })),
            Err("unknown host 'db-99'".to_string())
        );
    }

    #[test]
    fn migration_must_move_forward() {
        assert!(execute_tool("db_migrate", &json!({ "target_version": 42 })).is_ok());
        assert!(execute_tool("db_migrate", &json!({ "target_version": 40 })).is_err());
    }
}
