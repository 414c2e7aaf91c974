//! Subcommand implementations and the session they share

pub mod command;
pub mod user;
pub mod workspace;

use clap::Args;
use cmdrun_core::logging_facility;
use cmdrun_core::Config;
use cmdrun_core_types::{RequestContext, TraceId};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file
    #[arg(long, global = true, default_value = "cmdrun.toml")]
    pub config: PathBuf,

    /// Database path; overrides `[storage] database`
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Trace id to attach to this invocation's logs and errors
    #[arg(long, global = true)]
    pub trace_id: Option<String>,
}

/// Loaded configuration plus a migrated connection for one invocation
pub struct Session {
    pub config: Config,
    pub conn: Connection,
    pub ctx: RequestContext,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Config::load(&global.config)?;
        if let Some(db) = &global.db {
            config.storage.database = db.clone();
        }
        logging_facility::init(config.logging.profile);

        let conn = cmdrun_store::db::open_and_migrate(&config.storage.database)?;
        let ctx = match &global.trace_id {
            Some(id) => RequestContext::new().with_trace_id(TraceId::from_string(id.clone())),
            None => RequestContext::new(),
        };
        Ok(Self { config, conn, ctx })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
