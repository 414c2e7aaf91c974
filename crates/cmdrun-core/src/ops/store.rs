use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::errors::{CmdRunError, ExError, ExErrorKind};
use crate::model::{
    CommandId, CommandRecord, NewCommand, RunCounters, User, UserId, Workspace, WorkspaceId,
};

/// Result type for persistence operations
pub type StoreResult<T> = std::result::Result<T, ExError>;

/// Window over a most-recent-first listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// `None` returns every remaining record
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ListOptions {
    pub fn page(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }
}

/// Canonical "most recent first" order
///
/// Later `start_date` first; equal start dates fall back to ascending id,
/// i.e. insertion order.
pub fn most_recent_first(a: &CommandRecord, b: &CommandRecord) -> Ordering {
    b.start_date
        .cmp(&a.start_date)
        .then_with(|| a.id.cmp(&b.id))
}

/// Persistence collaborator for command records
///
/// Implementations run inside whatever transaction scope the caller holds;
/// nothing here commits.
pub trait CommandStore {
    fn find_workspace(&self, name: &str) -> StoreResult<Option<Workspace>>;

    fn get_workspace(&self, id: WorkspaceId) -> StoreResult<Option<Workspace>>;

    fn find_user(&self, username: &str) -> StoreResult<Option<User>>;

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Persist a new record and return it with its assigned id
    fn insert_command(&mut self, new: NewCommand) -> StoreResult<CommandRecord>;

    fn get_command(&self, id: CommandId) -> StoreResult<Option<CommandRecord>>;

    /// Overwrite the writable columns of an existing record
    ///
    /// Workspace and creator are not written.
    fn update_command(&mut self, record: &CommandRecord) -> StoreResult<()>;

    /// Returns false when no record had that id
    fn delete_command(&mut self, id: CommandId) -> StoreResult<bool>;

    /// Records of a workspace in [`most_recent_first`] order
    fn list_commands(
        &self,
        workspace_id: WorkspaceId,
        options: ListOptions,
    ) -> StoreResult<Vec<CommandRecord>>;

    fn last_command(&self, workspace_id: WorkspaceId) -> StoreResult<Option<CommandRecord>> {
        Ok(self
            .list_commands(workspace_id, ListOptions::page(1, 0))?
            .into_iter()
            .next())
    }

    /// Hook for the findings collaborator
    fn set_counters(&mut self, id: CommandId, counters: RunCounters) -> StoreResult<()>;
}

/// In-memory store for tests and embedding; not thread-safe
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    workspaces: Vec<Workspace>,
    users: Vec<User>,
    commands: BTreeMap<CommandId, CommandRecord>,
    next_command_id: CommandId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// `AlreadyExists` if the name is taken.
    pub fn add_workspace(&mut self, name: &str) -> StoreResult<Workspace> {
        if self.workspaces.iter().any(|w| w.name == name) {
            return Err(CmdRunError::WorkspaceExists {
                name: name.to_string(),
            }
            .into());
        }
        let workspace = Workspace {
            id: self.workspaces.len() as WorkspaceId + 1,
            name: name.to_string(),
        };
        self.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    /// # Errors
    ///
    /// `AlreadyExists` if the username is taken.
    pub fn add_user(&mut self, username: &str) -> StoreResult<User> {
        if self.users.iter().any(|u| u.username == username) {
            return Err(CmdRunError::UsernameTaken {
                username: username.to_string(),
            }
            .into());
        }
        let user = User {
            id: self.users.len() as UserId + 1,
            username: username.to_string(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn missing_command(id: CommandId) -> ExError {
    ExError::from(CmdRunError::CommandNotFound { command_id: id })
}

impl CommandStore for MemoryStore {
    fn find_workspace(&self, name: &str) -> StoreResult<Option<Workspace>> {
        Ok(self.workspaces.iter().find(|w| w.name == name).cloned())
    }

    fn get_workspace(&self, id: WorkspaceId) -> StoreResult<Option<Workspace>> {
        Ok(self.workspaces.iter().find(|w| w.id == id).cloned())
    }

    fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn insert_command(&mut self, new: NewCommand) -> StoreResult<CommandRecord> {
        if self.get_workspace(new.workspace_id)?.is_none() {
            return Err(ExError::new(ExErrorKind::ConstraintViolation)
                .with_op("insert_command")
                .with_entity_id(new.workspace_id.to_string())
                .with_message("workspace does not exist"));
        }
        self.next_command_id += 1;
        let record = new.into_record(self.next_command_id);
        self.commands.insert(record.id, record.clone());
        Ok(record)
    }

    fn get_command(&self, id: CommandId) -> StoreResult<Option<CommandRecord>> {
        Ok(self.commands.get(&id).cloned())
    }

    fn update_command(&mut self, record: &CommandRecord) -> StoreResult<()> {
        let stored = self
            .commands
            .get_mut(&record.id)
            .ok_or_else(|| missing_command(record.id))?;
        let workspace_id = stored.workspace_id;
        let creator_id = stored.creator_id;
        let counters = stored.counters;
        *stored = record.clone();
        stored.workspace_id = workspace_id;
        stored.creator_id = creator_id;
        stored.counters = counters;
        Ok(())
    }

    fn delete_command(&mut self, id: CommandId) -> StoreResult<bool> {
        Ok(self.commands.remove(&id).is_some())
    }

    fn list_commands(
        &self,
        workspace_id: WorkspaceId,
        options: ListOptions,
    ) -> StoreResult<Vec<CommandRecord>> {
        let mut records: Vec<CommandRecord> = self
            .commands
            .values()
            .filter(|r| r.workspace_id == workspace_id)
            .cloned()
            .collect();
        records.sort_by(most_recent_first);

        Ok(records
            .into_iter()
            .skip(options.offset)
            .take(options.limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn set_counters(&mut self, id: CommandId, counters: RunCounters) -> StoreResult<()> {
        let stored = self.commands.get_mut(&id).ok_or_else(|| missing_command(id))?;
        stored.counters = counters;
        Ok(())
    }
}
