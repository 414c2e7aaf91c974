//! Command-run operations over any [`CommandStore`]
//!
//! Each operation validates its input completely before the first write.

use chrono::{DateTime, Utc};

use super::store::{CommandStore, ListOptions, StoreResult};
use crate::config::LifecycleConfig;
use crate::errors::{CmdRunError, ExError, ExErrorKind};
use crate::model::{CommandId, CommandRecord, RunCounters, User, Workspace};
use crate::wire::{CommandPayload, CommandView};

/// Look up a workspace by name
///
/// # Errors
///
/// `NotFound` if no workspace has that name.
pub fn resolve_workspace<S: CommandStore + ?Sized>(store: &S, name: &str) -> StoreResult<Workspace> {
    store.find_workspace(name)?.ok_or_else(|| {
        CmdRunError::WorkspaceNotFound {
            name: name.to_string(),
        }
        .into()
    })
}

fn resolve_user<S: CommandStore + ?Sized>(store: &S, username: &str) -> StoreResult<User> {
    store.find_user(username)?.ok_or_else(|| {
        CmdRunError::UserNotFound {
            username: username.to_string(),
        }
        .into()
    })
}

/// Create a command run in `workspace` from a wire payload
///
/// `creator` is the authenticated username, if any; it becomes both the
/// record's creator and the audit actor.
///
/// # Errors
///
/// - `InvalidTimestamp` / `InvalidInput` when the payload is rejected
/// - `NotFound` for an unknown workspace or creator
pub fn create_command<S: CommandStore + ?Sized>(
    store: &mut S,
    workspace: &str,
    creator: Option<&str>,
    payload: CommandPayload,
    now: DateTime<Utc>,
) -> StoreResult<CommandRecord> {
    let patch = payload.validate()?;
    let workspace = resolve_workspace(&*store, workspace)?;
    let creator_id = creator
        .map(|username| resolve_user(&*store, username))
        .transpose()?
        .map(|user| user.id);

    let new = patch.into_new_command(workspace.id, creator_id, creator, now)?;
    let record = store.insert_command(new)?;
    tracing::debug!(command_id = record.id, workspace = %workspace.name, "command inserted");
    Ok(record)
}

/// Fetch a command that must belong to `workspace`
///
/// # Errors
///
/// `NotFound` if the workspace is unknown, or the command does not exist in it.
pub fn get_command<S: CommandStore + ?Sized>(
    store: &S,
    workspace: &str,
    id: CommandId,
) -> StoreResult<CommandRecord> {
    let workspace = resolve_workspace(store, workspace)?;
    match store.get_command(id)? {
        Some(record) if record.workspace_id == workspace.id => Ok(record),
        _ => Err(CmdRunError::CommandNotFound { command_id: id }.into()),
    }
}

/// Apply a wire payload to an existing command
///
/// Concurrent updates of the same record are last-write-wins.
///
/// # Errors
///
/// As [`get_command`], plus payload validation failures.
pub fn update_command<S: CommandStore + ?Sized>(
    store: &mut S,
    workspace: &str,
    id: CommandId,
    payload: CommandPayload,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> StoreResult<CommandRecord> {
    let patch = payload.validate()?;
    let mut record = get_command(&*store, workspace, id)?;
    patch.apply_to(&mut record, actor, now)?;
    store.update_command(&record)?;
    tracing::debug!(command_id = id, closed = record.is_finished(), "command updated");
    Ok(record)
}

/// Remove a command and everything recorded on it
///
/// # Errors
///
/// As [`get_command`].
pub fn delete_command<S: CommandStore + ?Sized>(
    store: &mut S,
    workspace: &str,
    id: CommandId,
) -> StoreResult<()> {
    let record = get_command(&*store, workspace, id)?;
    if !store.delete_command(record.id)? {
        return Err(CmdRunError::CommandNotFound { command_id: id }.into());
    }
    Ok(())
}

/// Most-recent-first page of a workspace's commands
///
/// # Errors
///
/// `NotFound` for an unknown workspace.
pub fn list_commands<S: CommandStore + ?Sized>(
    store: &S,
    workspace: &str,
    options: ListOptions,
) -> StoreResult<Vec<CommandRecord>> {
    let workspace = resolve_workspace(store, workspace)?;
    store.list_commands(workspace.id, options)
}

/// Store the findings collaborator's counters for a command
///
/// # Errors
///
/// `NotFound` if the command does not exist.
pub fn record_counters<S: CommandStore + ?Sized>(
    store: &mut S,
    id: CommandId,
    counters: RunCounters,
) -> StoreResult<()> {
    store.set_counters(id, counters)
}

/// Render a record, resolving its workspace name and creator username
///
/// # Errors
///
/// `Internal` if the record points at a workspace that no longer exists.
pub fn render_command<S: CommandStore + ?Sized>(
    store: &S,
    record: &CommandRecord,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> StoreResult<CommandView> {
    let workspace = store.get_workspace(record.workspace_id)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op("render_command")
            .with_entity_id(record.id.to_string())
            .with_message("command references a missing workspace")
    })?;
    let creator = match record.creator_id {
        Some(id) => store.get_user(id)?.map(|u| u.username),
        None => None,
    };

    Ok(CommandView::new(
        record,
        &workspace.name,
        creator.as_deref(),
        now,
        config,
    ))
}
