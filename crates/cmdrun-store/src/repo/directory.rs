//! Workspace and user directory
//!
//! Names are unique; lookups go through `SqliteStore`.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::sqlite_store::{to_micros, SqliteStore};
use chrono::{DateTime, Utc};
use cmdrun_core::errors::{CmdRunError, ExError};
use cmdrun_core::model::{User, Workspace};
use cmdrun_core::ops::CommandStore;
use rusqlite::Connection;

/// Create a workspace
///
/// # Errors
///
/// `AlreadyExists` if the name is taken, `InvalidInput` if it is blank.
pub fn create_workspace(conn: &Connection, name: &str, now: DateTime<Utc>) -> Result<Workspace> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CmdRunError::validation("name", "must not be blank").into());
    }
    if SqliteStore::new(conn).find_workspace(name)?.is_some() {
        return Err(CmdRunError::WorkspaceExists {
            name: name.to_string(),
        }
        .into());
    }

    conn.execute(
        "INSERT INTO workspaces (name, created_at) VALUES (?1, ?2)",
        rusqlite::params![name, to_micros(now)],
    )
    .map_err(from_rusqlite)?;

    Ok(Workspace {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Create a user
///
/// # Errors
///
/// `AlreadyExists` if the username is taken, `InvalidInput` if it is blank.
pub fn create_user(conn: &Connection, username: &str, now: DateTime<Utc>) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CmdRunError::validation("username", "must not be blank").into());
    }
    if SqliteStore::new(conn).find_user(username)?.is_some() {
        return Err(CmdRunError::UsernameTaken {
            username: username.to_string(),
        }
        .into());
    }

    conn.execute(
        "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
        rusqlite::params![username, to_micros(now)],
    )
    .map_err(from_rusqlite)?;

    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
    })
}

/// Verify that `current` can be renamed to `new_name`, without writing
///
/// Returns the user as it is now.
///
/// # Errors
///
/// - `NotFound` if `current` does not exist
/// - `AlreadyExists` if `new_name` belongs to another user
/// - `InvalidInput` if `new_name` is blank
pub fn check_rename(conn: &Connection, current: &str, new_name: &str) -> Result<User> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(CmdRunError::validation("username", "must not be blank").into());
    }

    let store = SqliteStore::new(conn);
    let user = store.find_user(current)?.ok_or_else(|| {
        ExError::from(CmdRunError::UserNotFound {
            username: current.to_string(),
        })
    })?;

    if user.username != new_name && store.find_user(new_name)?.is_some() {
        return Err(CmdRunError::UsernameTaken {
            username: new_name.to_string(),
        }
        .into());
    }
    Ok(user)
}

/// Rename a user, keeping its id (and so every command it created)
///
/// # Errors
///
/// As [`check_rename`].
pub fn rename_user(conn: &Connection, current: &str, new_name: &str) -> Result<User> {
    let user = check_rename(conn, current, new_name)?;
    let new_name = new_name.trim();
    if user.username == new_name {
        return Ok(user);
    }

    conn.execute(
        "UPDATE users SET username = ?2 WHERE id = ?1",
        rusqlite::params![user.id, new_name],
    )
    .map_err(from_rusqlite)?;
    tracing::debug!(user_id = user.id, "user renamed");

    Ok(User {
        id: user.id,
        username: new_name.to_string(),
    })
}

/// All workspaces, by name
///
/// # Errors
///
/// `Persistence` on database failure.
pub fn list_workspaces(conn: &Connection) -> Result<Vec<Workspace>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM workspaces ORDER BY name")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Workspace {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}
