//! CLI entry point for baton.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Baton multi-agent CLI
#[derive(Parser, Debug)]
#[command(name = "baton", version, about = "Baton: multi-agent orchestration CLI")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a conversation starting at one agent
    Run(RunArgs),
    /// List agents and their effective tools
    Agents(AgentsArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Agent directory file (TOML)
    #[arg(short, long)]
    pub agents: PathBuf,

    /// Starting agent (defaults to the first agent in the file)
    #[arg(long)]
    pub agent: Option<String>,

    /// Model for every agent in this run
    #[arg(short, long)]
    pub model: Option<String>,

    /// Completion rounds allowed
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Stop after the first completion instead of executing tool calls
    #[arg(long)]
    pub no_tools: bool,

    /// User prompt (positional)
    pub prompt: String,
}

/// Arguments for the `agents` subcommand.
#[derive(Parser, Debug)]
pub struct AgentsArgs {
    /// Agent directory file (TOML)
    #[arg(short, long)]
    pub agents: PathBuf,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
