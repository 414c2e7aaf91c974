//! User commands

use clap::{Args, Subcommand};
use cmdrun_engine::commands::directory::{user_create, user_rename, user_rename_check};

use super::{CliResult, GlobalArgs, Session};

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Create { username: String },
    /// Rename a user; prints the planned change unless --yes is given
    Rename(RenameArgs),
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub current: String,
    pub new: String,

    /// Apply the rename
    #[arg(long)]
    pub yes: bool,
}

pub fn execute(args: UserArgs, global: &GlobalArgs) -> CliResult {
    match args.command {
        UserCommand::Create { username } => {
            let mut session = Session::open(global)?;
            let user = user_create(&mut session.conn, &session.ctx, &username, chrono::Utc::now())?;
            println!("Created user {} (id {})", user.username, user.id);
            Ok(())
        }
        UserCommand::Rename(rename) => execute_rename(rename, global),
    }
}

fn execute_rename(args: RenameArgs, global: &GlobalArgs) -> CliResult {
    let mut session = Session::open(global)?;

    if !args.yes {
        let user = user_rename_check(&mut session.conn, &session.ctx, &args.current, &args.new)?;
        println!(
            "Would rename user {} to {}. Re-run with --yes to apply.",
            user.username, args.new
        );
        return Ok(());
    }

    let user = user_rename(&mut session.conn, &session.ctx, &args.current, &args.new)?;
    println!("Renamed user {} to {}", args.current, user.username);
    Ok(())
}
