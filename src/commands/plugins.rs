//! # Plugins Command Implementation
//!
//! Lists the registered plugins with their descriptions. `--verbose` also
//! shows each plugin's default options and the plugins it implies.

use anyhow::Result;
use clap::Args;

use zero_scaffold::output::{status, OutputConfig, Status};
use zero_scaffold::registry::{PluginRegistry, Registration};

/// List the registered plugins
#[derive(Args, Debug)]
pub struct PluginsArgs {
    /// Show default options and implied plugins
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the `plugins` command.
pub fn execute(args: PluginsArgs, output: &OutputConfig) -> Result<()> {
    let registry = PluginRegistry::builtin()?;
    for registration in registry.iter() {
        for line in describe(registration, args.verbose) {
            println!("{}", line);
        }
    }
    println!();
    println!(
        "{}",
        status(
            output,
            Status::Hint,
            "Enable plugins under `plugins:` in a preset file, or pick them with `zero create --manual`"
        )
    );
    Ok(())
}

fn describe(registration: &Registration, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!("{:<10} {}", registration.id, registration.description)];
    if verbose {
        if !registration.defaults.is_empty() {
            lines.push(format!(
                "{:<10} defaults: {}",
                "",
                serde_json::Value::Object(registration.defaults.clone())
            ));
        }
        if !registration.implies.is_empty() {
            lines.push(format!(
                "{:<10} implies: {}",
                "",
                registration.implies.join(", ")
            ));
        }
    }
    lines
}
