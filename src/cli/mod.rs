pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "plantops-cli")]
#[command(about = "PlantOps CLI - Offline tooling for sessions, passwords and page access")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Hash a password for seeding a user record")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },

    #[command(about = "Issue or inspect session tokens")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Print the page access table")]
    Routes,

    #[command(about = "Show what the edge middleware does with a path")]
    Check {
        #[arg(help = "Request path, optionally with a query string")]
        path: String,
        #[arg(long, help = "Role of the signed-in user (omit for an anonymous request)")]
        role: Option<crate::auth::Role>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::HashPassword { password } => {
            commands::password::handle(&password, output_format).await
        }
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Routes => commands::routes::list(output_format),
        Commands::Check { path, role } => commands::routes::check(&path, role, output_format),
    }
}
