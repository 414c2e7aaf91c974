//! cmdrun store - SQLite persistence for command runs
//!
//! Provides:
//! - Connection helpers
//! - Embedded, checksummed migrations
//! - `SqliteStore`, the `CommandStore` implementation over a transaction
//! - Workspace and user directory operations

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use errors::Result;
pub use repo::SqliteStore;
