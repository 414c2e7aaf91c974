//! Command handlers
//!
//! Every handler opens one transaction, commits it on success, and lets
//! it roll back on drop for every other exit path. Writers begin IMMEDIATE
//! so the row they read is the row they overwrite; a second writer queues
//! on the busy timeout and its write lands last.

#![allow(clippy::result_large_err)]

pub mod command_run;
pub mod directory;
pub mod summary;

use cmdrun_core::errors::ExError;
use cmdrun_core_types::RequestContext;
use cmdrun_store::errors::{from_rusqlite, Result};
use cmdrun_store::SqliteStore;
use rusqlite::{Connection, TransactionBehavior};

/// Run a read against a store bound to a fresh deferred transaction
pub(crate) fn in_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&mut SqliteStore<'_>) -> Result<T>,
{
    run_in(conn, TransactionBehavior::Deferred, f)
}

/// Run a write holding the database write lock from the start
pub(crate) fn in_write_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&mut SqliteStore<'_>) -> Result<T>,
{
    run_in(conn, TransactionBehavior::Immediate, f)
}

fn run_in<T, F>(conn: &mut Connection, behavior: TransactionBehavior, f: F) -> Result<T>
where
    F: FnOnce(&mut SqliteStore<'_>) -> Result<T>,
{
    let tx = conn
        .transaction_with_behavior(behavior)
        .map_err(from_rusqlite)?;
    let value = {
        let mut store = SqliteStore::new(&tx);
        f(&mut store)?
    };
    tx.commit().map_err(from_rusqlite)?;
    Ok(value)
}

/// Attach the request's correlation ids to an error leaving the engine
pub(crate) fn correlate(err: ExError, ctx: &RequestContext) -> ExError {
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
