//! cmdrun core - command execution record model
//!
//! This crate provides the domain logic for tracking tool invocations:
//! - The command record model with its audit block and aggregate counters
//! - Lifecycle computations (timestamp encoding, duration and timeout classification)
//! - Wire mapping between records and their JSON create/update/read forms
//! - Flat summary projections for dashboards (activity feed, last command)
//! - The `CommandStore` persistence seam and an in-memory implementation
//!
//! Persistence lives in `cmdrun-store`; request orchestration and boundary
//! logging live in `cmdrun-engine`.

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod views;
pub mod wire;

#[doc(hidden)]
pub use cmdrun_core_types as core_types;

// Re-export commonly used types
pub use config::{Config, LifecycleConfig};
pub use errors::{CmdRunError, ExError, ExErrorKind, Result};
pub use lifecycle::DisplayDuration;
pub use model::{CommandRecord, NewCommand, RunCounters};
pub use ops::{CommandStore, ListOptions, MemoryStore, StoreResult};
pub use views::{CommandSummary, LastCommand};
pub use wire::{CommandListEnvelope, CommandPayload, CommandView};
