//! cmdrun CLI
//!
//! Command-line interface for command-run records

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cmdrun")]
#[command(about = "cmdrun - Command execution records", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Workspace operations
    Workspace(commands::workspace::WorkspaceArgs),
    /// User operations (create, rename)
    User(commands::user::UserArgs),
    /// Command-run operations and dashboard summaries
    Command(commands::command::CommandArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Workspace(args) => commands::workspace::execute(args, &cli.global),
        Commands::User(args) => commands::user::execute(args, &cli.global),
        Commands::Command(args) => commands::command::execute(args, &cli.global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
