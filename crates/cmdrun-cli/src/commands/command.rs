//! Command-run commands
//!
//! Payloads are JSON in the wire format, taken from `--payload` or stdin.
//! Results are printed as pretty JSON.

use std::io::Read;

use clap::{Args, Subcommand};
use cmdrun_core::model::RunCounters;
use cmdrun_core::ops::ListOptions;
use cmdrun_core::wire::CommandPayload;
use cmdrun_engine::commands::command_run::{
    command_create, command_delete, command_get, command_list, command_record_counters,
    command_update,
};
use cmdrun_engine::commands::summary::{activity_feed, last_command};

use super::{print_json, CliResult, GlobalArgs, Session};

#[derive(Debug, Args)]
pub struct CommandArgs {
    #[command(subcommand)]
    pub command: CommandCommand,
}

#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// Wire payload as JSON; read from stdin when omitted
    #[arg(long)]
    pub payload: Option<String>,
}

impl PayloadArgs {
    fn read(self) -> Result<CommandPayload, Box<dyn std::error::Error>> {
        let json = match self.payload {
            Some(json) => json,
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };
        Ok(CommandPayload::from_json(&json)?)
    }
}

#[derive(Debug, Subcommand)]
pub enum CommandCommand {
    /// Record a new command run
    Create {
        #[arg(long)]
        workspace: String,
        /// Username that ran the command
        #[arg(long)]
        creator: Option<String>,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Update a command run; absent fields are kept
    Update {
        id: i64,
        #[arg(long)]
        workspace: String,
        /// Username recorded as the last updater
        #[arg(long)]
        actor: Option<String>,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Show one command run
    Get {
        id: i64,
        #[arg(long)]
        workspace: String,
    },
    /// Delete a command run
    Delete {
        id: i64,
        #[arg(long)]
        workspace: String,
    },
    /// List command runs, most recent first
    List {
        #[arg(long)]
        workspace: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Activity feed of a workspace
    Feed {
        #[arg(long)]
        workspace: String,
    },
    /// Most recent command run of a workspace, or {}
    Last {
        #[arg(long)]
        workspace: String,
    },
    /// Record aggregate finding counters on a command run
    Counters {
        id: i64,
        #[arg(long)]
        vulnerabilities: Option<i64>,
        #[arg(long)]
        hosts: Option<i64>,
        #[arg(long)]
        services: Option<i64>,
        #[arg(long)]
        critical: Option<i64>,
    },
}

pub fn execute(args: CommandArgs, global: &GlobalArgs) -> CliResult {
    let mut session = Session::open(global)?;
    let lifecycle = session.config.lifecycle;
    let now = chrono::Utc::now();
    let conn = &mut session.conn;
    let ctx = &session.ctx;

    match args.command {
        CommandCommand::Create {
            workspace,
            creator,
            payload,
        } => {
            let view = command_create(
                conn,
                ctx,
                &lifecycle,
                &workspace,
                creator.as_deref(),
                payload.read()?,
                now,
            )?;
            print_json(&view)
        }
        CommandCommand::Update {
            id,
            workspace,
            actor,
            payload,
        } => {
            let view = command_update(
                conn,
                ctx,
                &lifecycle,
                &workspace,
                id,
                payload.read()?,
                actor.as_deref(),
                now,
            )?;
            print_json(&view)
        }
        CommandCommand::Get { id, workspace } => {
            print_json(&command_get(conn, ctx, &lifecycle, &workspace, id, now)?)
        }
        CommandCommand::Delete { id, workspace } => {
            command_delete(conn, ctx, &workspace, id)?;
            println!("Deleted command {}", id);
            Ok(())
        }
        CommandCommand::List {
            workspace,
            limit,
            offset,
        } => {
            let options = ListOptions { limit, offset };
            print_json(&command_list(conn, ctx, &lifecycle, &workspace, options, now)?)
        }
        CommandCommand::Feed { workspace } => print_json(&activity_feed(conn, ctx, &workspace)?),
        CommandCommand::Last { workspace } => print_json(&last_command(conn, ctx, &workspace)?),
        CommandCommand::Counters {
            id,
            vulnerabilities,
            hosts,
            services,
            critical,
        } => {
            let counters = RunCounters {
                vulnerabilities,
                hosts,
                services,
                vulnerability_critical: critical,
            };
            command_record_counters(conn, ctx, id, counters)?;
            println!("Recorded counters on command {}", id);
            Ok(())
        }
    }
}
