pub mod command;
pub mod directory;
pub mod metadata;

pub use command::{CommandId, CommandRecord, NewCommand, RunCounters};
pub use directory::{User, UserId, Workspace, WorkspaceId};
pub use metadata::{AuditMetadata, UpdateAction};
