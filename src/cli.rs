//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use zero_scaffold::defaults::DEFAULT_LOG_LEVEL;
use zero_scaffold::output::OutputConfig;

use crate::commands;

/// Zero - Generate front-end projects from feature presets
#[derive(Parser, Debug)]
#[command(name = "zero")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new project from a preset
    Create(commands::create::CreateArgs),

    /// Show the composed build configuration of a generated project
    Inspect(commands::inspect::InspectArgs),

    /// List the registered plugins
    Plugins(commands::plugins::PluginsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG, when set, takes precedence over --log-level
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .ok();

        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Create(args) => commands::create::execute(args, &output),
            Commands::Inspect(args) => commands::inspect::execute(args, &output),
            Commands::Plugins(args) => commands::plugins::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
