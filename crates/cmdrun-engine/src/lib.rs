//! cmdrun Engine - Orchestration layer
//!
//! Runs each request against the SQLite store inside one transaction and
//! owns operation boundary logging.

pub mod commands;
