//! Workspace commands

use clap::{Args, Subcommand};
use cmdrun_engine::commands::directory::{workspace_create, workspace_list};

use super::{print_json, CliResult, GlobalArgs, Session};

#[derive(Debug, Args)]
pub struct WorkspaceArgs {
    #[command(subcommand)]
    pub command: WorkspaceCommand,
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    /// Create a workspace
    Create { name: String },
    /// List workspaces
    List,
}

pub fn execute(args: WorkspaceArgs, global: &GlobalArgs) -> CliResult {
    let mut session = Session::open(global)?;

    match args.command {
        WorkspaceCommand::Create { name } => {
            let workspace =
                workspace_create(&mut session.conn, &session.ctx, &name, chrono::Utc::now())?;
            println!("Created workspace {} (id {})", workspace.name, workspace.id);
            Ok(())
        }
        WorkspaceCommand::List => {
            let workspaces = workspace_list(&mut session.conn, &session.ctx)?;
            let names: Vec<&str> = workspaces.iter().map(|w| w.name.as_str()).collect();
            print_json(&names)
        }
    }
}
