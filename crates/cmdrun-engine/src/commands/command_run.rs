//! Command-run handlers with boundary logging.
//!
//! - Create, update, get, delete a command run
//! - Paginated most-recent-first listing
//! - Counter hook for the findings collaborator
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for these operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()`.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use cmdrun_core::config::LifecycleConfig;
use cmdrun_core::model::{CommandId, RunCounters};
use cmdrun_core::ops::{command_ops, ListOptions};
use cmdrun_core::wire::{CommandListEnvelope, CommandPayload, CommandView};
use cmdrun_core::{log_op_end, log_op_error, log_op_start};
use cmdrun_core_types::{RequestContext, TraceId};
use cmdrun_store::errors::Result;
use rusqlite::Connection;

use super::{correlate, in_transaction, in_write_transaction};

/// Create a command run
///
/// ## Arguments
///
/// - `workspace`: Name of the owning workspace
/// - `creator`: Authenticated username, if any
/// - `payload`: Wire payload; `itime` and `command` are required
/// - `now`: Clock reading used for the audit block and the rendered duration
///
/// ## Returns
///
/// The stored record in wire form
///
/// ## Errors
///
/// - `InvalidTimestamp`: `itime` missing a usable numeric value
/// - `InvalidInput`: Payload validation failed
/// - `NotFound`: Unknown workspace or creator
/// - `Persistence`: Database error
pub fn command_create(
    conn: &mut Connection,
    ctx: &RequestContext,
    config: &LifecycleConfig,
    workspace: &str,
    creator: Option<&str>,
    payload: CommandPayload,
    now: DateTime<Utc>,
) -> Result<CommandView> {
    log_op_start!(
        "command_create",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace
    );
    let start = std::time::Instant::now();

    let view = in_write_transaction(conn, |store| {
        let record = command_ops::create_command(store, workspace, creator, payload, now)?;
        command_ops::render_command(&*store, &record, now, config)
    })
    .map_err(|e| {
        log_op_error!(
            "command_create",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "command_create",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        command_id = view.id
    );

    Ok(view)
}

/// Apply a partial update to a command run
///
/// Fields absent from the payload keep their stored values. Concurrent
/// updates of the same run are last-write-wins.
///
/// ## Errors
///
/// - `InvalidTimestamp` / `InvalidInput`: Payload validation failed
/// - `NotFound`: Unknown workspace, or no such command in it
/// - `Persistence`: Database error
#[allow(clippy::too_many_arguments)]
pub fn command_update(
    conn: &mut Connection,
    ctx: &RequestContext,
    config: &LifecycleConfig,
    workspace: &str,
    command_id: CommandId,
    payload: CommandPayload,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CommandView> {
    log_op_start!(
        "command_update",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace,
        command_id = command_id
    );
    let start = std::time::Instant::now();

    let view = in_write_transaction(conn, |store| {
        let record =
            command_ops::update_command(store, workspace, command_id, payload, actor, now)?;
        command_ops::render_command(&*store, &record, now, config)
    })
    .map_err(|e| {
        log_op_error!(
            "command_update",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "command_update",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        command_id = command_id
    );

    Ok(view)
}

/// Fetch one command run of a workspace in wire form
///
/// ## Errors
///
/// - `NotFound`: Unknown workspace, or no such command in it
/// - `Persistence`: Database error
pub fn command_get(
    conn: &mut Connection,
    ctx: &RequestContext,
    config: &LifecycleConfig,
    workspace: &str,
    command_id: CommandId,
    now: DateTime<Utc>,
) -> Result<CommandView> {
    log_op_start!(
        "command_get",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace,
        command_id = command_id
    );
    let start = std::time::Instant::now();

    let view = in_transaction(conn, |store| {
        let record = command_ops::get_command(&*store, workspace, command_id)?;
        command_ops::render_command(&*store, &record, now, config)
    })
    .map_err(|e| {
        log_op_error!(
            "command_get",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "command_get",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(view)
}

/// Delete a command run
///
/// ## Errors
///
/// - `NotFound`: Unknown workspace, or no such command in it
/// - `Persistence`: Database error
pub fn command_delete(
    conn: &mut Connection,
    ctx: &RequestContext,
    workspace: &str,
    command_id: CommandId,
) -> Result<()> {
    log_op_start!(
        "command_delete",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace,
        command_id = command_id
    );
    let start = std::time::Instant::now();

    in_write_transaction(conn, |store| {
        command_ops::delete_command(store, workspace, command_id)
    })
    .map_err(|e| {
        log_op_error!(
            "command_delete",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "command_delete",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(())
}

/// List a workspace's command runs, most recent first
///
/// ## Returns
///
/// The `{"commands": [{"id", "key", "value"}]}` envelope
///
/// ## Errors
///
/// - `NotFound`: Unknown workspace
/// - `Persistence`: Database error
pub fn command_list(
    conn: &mut Connection,
    ctx: &RequestContext,
    config: &LifecycleConfig,
    workspace: &str,
    options: ListOptions,
    now: DateTime<Utc>,
) -> Result<CommandListEnvelope> {
    log_op_start!(
        "command_list",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace
    );
    let start = std::time::Instant::now();

    let envelope = in_transaction(conn, |store| {
        let records = command_ops::list_commands(&*store, workspace, options)?;
        records
            .iter()
            .map(|record| command_ops::render_command(&*store, record, now, config))
            .collect::<Result<CommandListEnvelope>>()
    })
    .map_err(|e| {
        log_op_error!(
            "command_list",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "command_list",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        record_count = envelope.commands.len()
    );

    Ok(envelope)
}

/// Record the findings collaborator's counters on a command run
///
/// ## Errors
///
/// - `NotFound`: No such command
/// - `Persistence`: Database error
pub fn command_record_counters(
    conn: &mut Connection,
    ctx: &RequestContext,
    command_id: CommandId,
    counters: RunCounters,
) -> Result<()> {
    log_op_start!(
        "command_record_counters",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        command_id = command_id
    );
    let start = std::time::Instant::now();

    in_write_transaction(conn, |store| {
        command_ops::record_counters(store, command_id, counters)
    })
    .map_err(|e| {
        log_op_error!(
            "command_record_counters",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        correlate(e, ctx)
    })?;

    log_op_end!(
        "command_record_counters",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str()
    );

    Ok(())
}
