//! `CommandStore` over a borrowed SQLite connection or transaction
//!
//! Timestamps are stored as epoch microseconds; the audit block as JSON text.

#![allow(clippy::result_large_err)]

use crate::errors::from_rusqlite;
use chrono::{DateTime, Utc};
use cmdrun_core::errors::{CmdRunError, ExError, ExErrorKind};
use cmdrun_core::model::{
    AuditMetadata, CommandId, CommandRecord, NewCommand, RunCounters, User, UserId, Workspace,
    WorkspaceId,
};
use cmdrun_core::ops::{CommandStore, ListOptions, StoreResult};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

const COMMAND_COLUMNS: &str = "id, workspace_id, creator_id, command, user, import_source, tool, \
     params, ip, hostname, start_date, end_date, sum_created_vulnerabilities, sum_created_hosts, \
     sum_created_services, sum_created_vulnerability_critical, metadata";

/// SQLite-backed command store
///
/// Borrow a `Transaction` (it derefs to `Connection`) so every write made
/// through the store commits or rolls back with the caller's unit of work.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }
}

pub(crate) fn to_micros(t: DateTime<Utc>) -> i64 {
    t.timestamp_micros()
}

pub(crate) fn from_micros(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

fn metadata_json(metadata: &AuditMetadata) -> StoreResult<String> {
    serde_json::to_string(metadata).map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op("encode_metadata")
            .with_message(e.to_string())
    })
}

fn command_from_row(row: &Row<'_>) -> rusqlite::Result<CommandRecord> {
    let end_date: Option<i64> = row.get(11)?;
    let metadata: String = row.get(16)?;
    let metadata: AuditMetadata = serde_json::from_str(&metadata)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(16, Type::Text, Box::new(e)))?;

    Ok(CommandRecord {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        creator_id: row.get(2)?,
        command: row.get(3)?,
        user: row.get(4)?,
        import_source: row.get(5)?,
        tool: row.get(6)?,
        params: row.get(7)?,
        ip: row.get(8)?,
        hostname: row.get(9)?,
        start_date: from_micros(10, row.get(10)?)?,
        end_date: end_date.map(|v| from_micros(11, v)).transpose()?,
        counters: RunCounters {
            vulnerabilities: row.get(12)?,
            hosts: row.get(13)?,
            services: row.get(14)?,
            vulnerability_critical: row.get(15)?,
        },
        metadata,
    })
}

fn missing_command(id: CommandId) -> ExError {
    ExError::from(CmdRunError::CommandNotFound { command_id: id })
}

/// SQLite counts rows and offsets as i64
fn sql_bound(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl CommandStore for SqliteStore<'_> {
    fn find_workspace(&self, name: &str) -> StoreResult<Option<Workspace>> {
        self.conn
            .query_row(
                "SELECT id, name FROM workspaces WHERE name = ?1",
                [name],
                |row| {
                    Ok(Workspace {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(from_rusqlite)
    }

    fn get_workspace(&self, id: WorkspaceId) -> StoreResult<Option<Workspace>> {
        self.conn
            .query_row("SELECT id, name FROM workspaces WHERE id = ?1", [id], |row| {
                Ok(Workspace {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()
            .map_err(from_rusqlite)
    }

    fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(from_rusqlite)
    }

    fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.conn
            .query_row("SELECT id, username FROM users WHERE id = ?1", [id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            })
            .optional()
            .map_err(from_rusqlite)
    }

    fn insert_command(&mut self, new: NewCommand) -> StoreResult<CommandRecord> {
        let metadata = metadata_json(&new.metadata)?;

        self.conn
            .execute(
                "INSERT INTO commands (workspace_id, creator_id, command, user, import_source,
                    tool, params, ip, hostname, start_date, end_date, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    new.workspace_id,
                    new.creator_id,
                    new.command,
                    new.user,
                    new.import_source,
                    new.tool,
                    new.params,
                    new.ip,
                    new.hostname,
                    to_micros(new.start_date),
                    new.end_date.map(to_micros),
                    metadata,
                ],
            )
            .map_err(|e| from_rusqlite(e).with_op("insert_command"))?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(command_id = id, workspace_id = new.workspace_id, "command inserted");

        Ok(new.into_record(id))
    }

    fn get_command(&self, id: CommandId) -> StoreResult<Option<CommandRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM commands WHERE id = ?1", COMMAND_COLUMNS),
                [id],
                command_from_row,
            )
            .optional()
            .map_err(from_rusqlite)
    }

    fn update_command(&mut self, record: &CommandRecord) -> StoreResult<()> {
        let metadata = metadata_json(&record.metadata)?;

        // Last write wins; workspace, creator and counters are never written here
        let changed = self
            .conn
            .execute(
                "UPDATE commands SET command = ?2, user = ?3, import_source = ?4, tool = ?5,
                    params = ?6, ip = ?7, hostname = ?8, start_date = ?9, end_date = ?10,
                    metadata = ?11
                 WHERE id = ?1",
                rusqlite::params![
                    record.id,
                    record.command,
                    record.user,
                    record.import_source,
                    record.tool,
                    record.params,
                    record.ip,
                    record.hostname,
                    to_micros(record.start_date),
                    record.end_date.map(to_micros),
                    metadata,
                ],
            )
            .map_err(|e| from_rusqlite(e).with_op("update_command"))?;

        if changed == 0 {
            return Err(missing_command(record.id));
        }
        Ok(())
    }

    fn delete_command(&mut self, id: CommandId) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM commands WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    fn list_commands(
        &self,
        workspace_id: WorkspaceId,
        options: ListOptions,
    ) -> StoreResult<Vec<CommandRecord>> {
        // LIMIT -1 is SQLite for "no limit"
        let limit = options.limit.map(sql_bound).unwrap_or(-1);

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM commands WHERE workspace_id = ?1
                 ORDER BY start_date DESC, id ASC
                 LIMIT ?2 OFFSET ?3",
                COMMAND_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let records = stmt
            .query_map(
                rusqlite::params![workspace_id, limit, sql_bound(options.offset)],
                command_from_row,
            )
            .map_err(from_rusqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(from_rusqlite)?;

        Ok(records)
    }

    fn set_counters(&mut self, id: CommandId, counters: RunCounters) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE commands SET sum_created_vulnerabilities = ?2, sum_created_hosts = ?3,
                    sum_created_services = ?4, sum_created_vulnerability_critical = ?5
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    counters.vulnerabilities,
                    counters.hosts,
                    counters.services,
                    counters.vulnerability_critical,
                ],
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Err(missing_command(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micros_round_trip() {
        let t = DateTime::from_timestamp_micros(1_717_243_200_123_456).unwrap();
        assert_eq!(from_micros(0, to_micros(t)).unwrap(), t);
    }

    #[test]
    fn test_out_of_range_micros_rejected() {
        assert!(from_micros(3, i64::MAX).is_err());
    }

    #[test]
    fn test_sql_bound_saturates() {
        assert_eq!(sql_bound(10), 10);
        assert_eq!(sql_bound(usize::MAX), i64::MAX);
    }
}
