use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::directory::{UserId, WorkspaceId};
use super::metadata::AuditMetadata;

pub type CommandId = i64;

/// Aggregate counters maintained by the findings collaborator
///
/// `None` means the collaborator never recorded a value; projections
/// treat it as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunCounters {
    pub vulnerabilities: Option<i64>,
    pub hosts: Option<i64>,
    pub services: Option<i64>,
    pub vulnerability_critical: Option<i64>,
}

/// One invocation of an external tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Assigned by the store on creation
    pub id: CommandId,

    /// Owning workspace; never changes after creation
    pub workspace_id: WorkspaceId,

    pub creator_id: Option<UserId>,

    pub command: String,
    pub user: Option<String>,
    pub import_source: Option<String>,
    pub tool: Option<String>,
    pub params: Option<String>,
    pub ip: Option<String>,
    pub hostname: Option<String>,

    /// Anchor for all duration and timeout logic
    pub start_date: DateTime<Utc>,

    /// Absent while the run is in progress
    pub end_date: Option<DateTime<Utc>>,

    pub counters: RunCounters,

    pub metadata: AuditMetadata,
}

impl CommandRecord {
    /// Whether the run has recorded an end
    pub fn is_finished(&self) -> bool {
        self.end_date.is_some()
    }
}

/// A validated command run awaiting an id from the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommand {
    pub workspace_id: WorkspaceId,
    pub creator_id: Option<UserId>,
    pub command: String,
    pub user: Option<String>,
    pub import_source: Option<String>,
    pub tool: Option<String>,
    pub params: Option<String>,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub metadata: AuditMetadata,
}

impl NewCommand {
    /// Attach the store-assigned id; counters start empty
    pub fn into_record(self, id: CommandId) -> CommandRecord {
        CommandRecord {
            id,
            workspace_id: self.workspace_id,
            creator_id: self.creator_id,
            command: self.command,
            user: self.user,
            import_source: self.import_source,
            tool: self.tool,
            params: self.params,
            ip: self.ip,
            hostname: self.hostname,
            start_date: self.start_date,
            end_date: self.end_date,
            counters: RunCounters::default(),
            metadata: self.metadata,
        }
    }
}
