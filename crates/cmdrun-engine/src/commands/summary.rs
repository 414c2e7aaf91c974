//! Dashboard summary reads
//!
//! Both reads treat an unknown workspace like an empty one.

#![allow(clippy::result_large_err)]

use cmdrun_core::views::{self, CommandSummary, LastCommand};
use cmdrun_core::{log_op_end, log_op_error, log_op_start};
use cmdrun_core_types::{RequestContext, TraceId};
use cmdrun_store::errors::Result;
use rusqlite::Connection;

use super::{correlate, in_transaction};

/// Every command run of a workspace as flat summaries, most recent first
///
/// ## Errors
///
/// - `Persistence`: Database error
pub fn activity_feed(
    conn: &mut Connection,
    ctx: &RequestContext,
    workspace: &str,
) -> Result<Vec<CommandSummary>> {
    log_op_start!(
        "activity_feed",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace
    );
    let start = std::time::Instant::now();

    let feed = in_transaction(conn, |store| views::build_activity_feed(&*store, workspace))
        .map_err(|e| {
            log_op_error!(
                "activity_feed",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = ctx.request_id.as_str()
            );
            correlate(e, ctx)
        })?;

    log_op_end!(
        "activity_feed",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        record_count = feed.len()
    );

    Ok(feed)
}

/// The most recently started command run of a workspace
///
/// An empty workspace yields an empty `LastCommand`, serialized as `{}`.
///
/// ## Errors
///
/// - `Persistence`: Database error
pub fn last_command(
    conn: &mut Connection,
    ctx: &RequestContext,
    workspace: &str,
) -> Result<LastCommand> {
    log_op_start!(
        "last_command",
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(TraceId::as_str),
        workspace = workspace
    );
    let start = std::time::Instant::now();

    let last = in_transaction(conn, |store| views::get_last_command(&*store, workspace))
        .map_err(|e| {
            log_op_error!(
                "last_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = ctx.request_id.as_str()
            );
            correlate(e, ctx)
        })?;

    log_op_end!(
        "last_command",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        found = !last.is_empty()
    );

    Ok(last)
}
