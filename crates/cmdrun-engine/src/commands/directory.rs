//! Workspace and user directory handlers

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use cmdrun_core::model::{User, Workspace};
use cmdrun_core::{log_op_end, log_op_error, log_op_start};
use cmdrun_core_types::{RequestContext, TraceId};
use cmdrun_store::errors::Result;
use cmdrun_store::repo::directory;
use rusqlite::Connection;

use super::{correlate, in_transaction, in_write_transaction};

/// Create a workspace
///
/// ## Errors
///
/// - `AlreadyExists`: Name taken
/// - `InvalidInput`: Blank name
pub fn workspace_create(
    conn: &mut Connection,
    ctx: &RequestContext,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Workspace> {
    log_op_start!(
        "workspace_create",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = name
    );
    let start = std::time::Instant::now();

    let workspace = in_write_transaction(conn, |store| {
        directory::create_workspace(store.connection(), name, now)
    })
    .map_err(|e| {
        log_op_error!(
            "workspace_create",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "workspace_create",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(workspace)
}

/// All workspaces, by name
///
/// ## Errors
///
/// - `Persistence`: Database error
pub fn workspace_list(conn: &mut Connection, ctx: &RequestContext) -> Result<Vec<Workspace>> {
    log_op_start!(
        "workspace_list",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str)
    );
    let start = std::time::Instant::now();

    let workspaces = in_transaction(conn, |store| {
        directory::list_workspaces(store.connection())
    })
    .map_err(|e| {
        log_op_error!(
            "workspace_list",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "workspace_list",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        record_count = workspaces.len()
    );

    Ok(workspaces)
}

/// Create a user
///
/// ## Errors
///
/// - `AlreadyExists`: Username taken
/// - `InvalidInput`: Blank username
pub fn user_create(
    conn: &mut Connection,
    ctx: &RequestContext,
    username: &str,
    now: DateTime<Utc>,
) -> Result<User> {
    log_op_start!(
        "user_create",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        username = username
    );
    let start = std::time::Instant::now();

    let user = in_write_transaction(conn, |store| {
        directory::create_user(store.connection(), username, now)
    })
    .map_err(|e| {
        log_op_error!(
            "user_create",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "user_create",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(user)
}

/// Check a rename without applying it
///
/// Returns the user that would be renamed.
///
/// ## Errors
///
/// - `NotFound`: `current` does not exist
/// - `AlreadyExists`: `new_name` belongs to another user
pub fn user_rename_check(
    conn: &mut Connection,
    ctx: &RequestContext,
    current: &str,
    new_name: &str,
) -> Result<User> {
    log_op_start!(
        "user_rename_check",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        username = current
    );
    let start = std::time::Instant::now();

    let user = in_transaction(conn, |store| {
        directory::check_rename(store.connection(), current, new_name)
    })
    .map_err(|e| {
        log_op_error!(
            "user_rename_check",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "user_rename_check",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(user)
}

/// Rename a user
///
/// The user keeps its id, so commands it created stay attributed to it.
///
/// ## Errors
///
/// - `NotFound`: `current` does not exist
/// - `AlreadyExists`: `new_name` belongs to another user
pub fn user_rename(
    conn: &mut Connection,
    ctx: &RequestContext,
    current: &str,
    new_name: &str,
) -> Result<User> {
    log_op_start!(
        "user_rename",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        username = current
    );
    let start = std::time::Instant::now();

    let user = in_write_transaction(conn, |store| {
        directory::rename_user(store.connection(), current, new_name)
    })
    .map_err(|e| {
        log_op_error!(
            "user_rename",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "user_rename",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(user)
}
