//! Migration framework
//!
//! - Migration runner with checksums
//! - Idempotent application, one transaction per migration
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use runner::apply_migrations;
