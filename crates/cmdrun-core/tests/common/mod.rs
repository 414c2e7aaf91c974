use chrono::{DateTime, TimeZone, Utc};
use cmdrun_core::lifecycle::encode_timestamp;
use cmdrun_core::ops::command_ops;
use cmdrun_core::{CommandPayload, CommandRecord, MemoryStore};
use serde_json::json;

/// Fixed "now" shared by tests
#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Store with workspaces `acme` and `globex` and user `alice`
#[allow(dead_code)]
pub fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_workspace("acme").unwrap();
    store.add_workspace("globex").unwrap();
    store.add_user("alice").unwrap();
    store
}

/// Create a command in `workspace` starting at `start`
#[allow(dead_code)]
pub fn create_at(
    store: &mut MemoryStore,
    workspace: &str,
    command: &str,
    start: DateTime<Utc>,
) -> CommandRecord {
    let payload: CommandPayload = serde_json::from_value(json!({
        "command": command,
        "itime": encode_timestamp(start),
        "tool": "nmap",
    }))
    .unwrap();
    command_ops::create_command(store, workspace, None, payload, fixed_now()).unwrap()
}
