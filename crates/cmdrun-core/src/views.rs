//! Flat dashboard projections of command runs
//!
//! These bypass [`crate::wire::CommandView`]: no name resolution and no
//! duration classification, only the record plus its aggregate counters.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::lifecycle::encode_timestamp;
use crate::model::{CommandId, CommandRecord};
use crate::ops::store::{most_recent_first, CommandStore, ListOptions, StoreResult};

/// One row of the activity feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSummary {
    #[serde(rename = "_id")]
    pub id: CommandId,
    pub user: Option<String>,
    pub import_source: Option<String>,
    pub command: String,
    pub tool: Option<String>,
    pub params: Option<String>,
    pub vulnerabilities_count: i64,
    pub hosts_count: i64,
    pub services_count: i64,
    #[serde(rename = "criticalIssue")]
    pub critical_issue: i64,
    /// `start_date` as UTC epoch milliseconds
    pub date: i64,
}

impl From<&CommandRecord> for CommandSummary {
    fn from(record: &CommandRecord) -> Self {
        let counters = record.counters;
        Self {
            id: record.id,
            user: record.user.clone(),
            import_source: record.import_source.clone(),
            command: record.command.clone(),
            tool: record.tool.clone(),
            params: record.params.clone(),
            vulnerabilities_count: counters.vulnerabilities.unwrap_or(0),
            hosts_count: counters.hosts.unwrap_or(0),
            services_count: counters.services.unwrap_or(0),
            critical_issue: counters.vulnerability_critical.unwrap_or(0),
            date: encode_timestamp(record.start_date),
        }
    }
}

/// Most recent command of a workspace, serialized as `{}` when there is none
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastCommand(pub Option<CommandSummary>);

impl LastCommand {
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl Serialize for LastCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(summary) => summary.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Summaries in most-recent-first order, whatever order `records` came in
pub fn summarize(records: &[CommandRecord]) -> Vec<CommandSummary> {
    let mut sorted: Vec<&CommandRecord> = records.iter().collect();
    sorted.sort_by(|a, b| most_recent_first(a, b));
    sorted.into_iter().map(CommandSummary::from).collect()
}

/// Activity feed of a workspace
///
/// An unknown workspace has no activity and yields an empty feed.
///
/// # Errors
///
/// Propagates store failures only.
pub fn build_activity_feed<S: CommandStore + ?Sized>(
    store: &S,
    workspace_name: &str,
) -> StoreResult<Vec<CommandSummary>> {
    let Some(workspace) = store.find_workspace(workspace_name)? else {
        return Ok(Vec::new());
    };
    let records = store.list_commands(workspace.id, ListOptions::default())?;
    Ok(summarize(&records))
}

/// Most recently started command of a workspace
///
/// # Errors
///
/// Propagates store failures only; an empty or unknown workspace is not an error.
pub fn get_last_command<S: CommandStore + ?Sized>(
    store: &S,
    workspace_name: &str,
) -> StoreResult<LastCommand> {
    let Some(workspace) = store.find_workspace(workspace_name)? else {
        return Ok(LastCommand::default());
    };
    let last = store.last_command(workspace.id)?;
    Ok(LastCommand(last.as_ref().map(CommandSummary::from)))
}
