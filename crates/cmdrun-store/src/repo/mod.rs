//! Repository layer for command runs, workspaces and users

pub mod directory;
pub mod sqlite_store;

pub use sqlite_store::SqliteStore;
