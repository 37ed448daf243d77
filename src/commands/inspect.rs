//! # Inspect Command Implementation
//!
//! This module implements the `inspect` subcommand, which rebuilds the build
//! configuration of a generated project and prints it, or a part of it.
//!
//! ## Functionality
//!
//! - **Side Selection**: `--name` picks the side (`client` by default).
//! - **Node Selection**: `--rule`, `--plugin`, `--rules` and `--plugins`
//!   narrow the output to one named node or to the list of names.
//! - **Paths**: Positional paths such as `module.rules[0]` select values
//!   from the full configuration.
//!
//! The plugin list is read from the preset recorded in the project's
//! `package.json`. This command is read-only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use zero_scaffold::compose::graph::{ConfigGraph, NAMELESS_RULE};
use zero_scaffold::compose::inspect::{inspect, InspectQuery, Inspection, Target};
use zero_scaffold::compose::{ComposeContext, Composer};
use zero_scaffold::config::{self, PRESET_MANIFEST_KEY};
use zero_scaffold::defaults::DEFAULT_SIDE;
use zero_scaffold::generator::MANIFEST_PATH;
use zero_scaffold::manifest::Manifest;
use zero_scaffold::output::{status, OutputConfig, Status};
use zero_scaffold::registry::PluginRegistry;
use zero_scaffold::suggestions;

/// Show the composed build configuration of a generated project
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Side to inspect
    #[arg(long, value_name = "SIDE", default_value = DEFAULT_SIDE)]
    pub name: String,

    /// Show one module rule by name
    #[arg(long, value_name = "NAME", group = "select")]
    pub rule: Option<String>,

    /// Show one build plugin by name
    #[arg(long, value_name = "NAME", group = "select")]
    pub plugin: Option<String>,

    /// List the names of all module rules
    #[arg(long, group = "select")]
    pub rules: bool,

    /// List the names of all build plugins
    #[arg(long, group = "select")]
    pub plugins: bool,

    /// Print the native configuration as JSON instead of the annotated form
    #[arg(long)]
    pub json: bool,

    /// Project directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Paths into the configuration, e.g. `module.rules[0]`
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

impl InspectArgs {
    fn query(&self) -> InspectQuery {
        let target = if let Some(name) = &self.rule {
            Target::Rule(name.clone())
        } else if let Some(name) = &self.plugin {
            Target::Plugin(name.clone())
        } else if self.rules {
            Target::Rules
        } else if self.plugins {
            Target::Plugins
        } else {
            Target::Full
        };
        InspectQuery::new(target).with_paths(self.paths.iter().cloned())
    }
}

/// Execute the `inspect` command.
pub fn execute(args: InspectArgs, output: &OutputConfig) -> Result<()> {
    let graph = compose_side(&args.dir, &args.name)?;
    let query = args.query();

    if query.target == Target::Full && query.paths.is_empty() && !args.json {
        print!("{}", graph.explain());
        return Ok(());
    }

    let inspection = inspect(&graph, &query);
    println!("{}", render(&inspection)?);
    if inspection.nameless_rules {
        println!();
        println!(
            "{}",
            status(
                output,
                Status::Hint,
                &format!(
                    "'{}' entries are rules added without a name; they cannot be shown with --rule",
                    NAMELESS_RULE
                )
            )
        );
    }
    Ok(())
}

fn render(inspection: &Inspection) -> Result<String> {
    serde_json::to_string_pretty(&inspection.value).context("Failed to serialize configuration")
}

/// Rebuild the graph of one side from the project's recorded preset
fn compose_side(dir: &Path, side: &str) -> Result<ConfigGraph> {
    let manifest_path = dir.join(MANIFEST_PATH);
    if !manifest_path.exists() {
        return Err(suggestions::manifest_not_found(dir));
    }
    let content = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest = Manifest::parse(&content)?;

    let preset_file = config::from_manifest(&manifest)?
        .ok_or_else(|| suggestions::preset_record_missing(PRESET_MANIFEST_KEY))?;
    let project_type = preset_file.preset.project_type()?;
    if !project_type.sides().contains(&side) {
        return Err(suggestions::unknown_side(side, project_type.sides()));
    }

    let project_dir = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;
    let name = manifest
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let plugins = PluginRegistry::builtin()?.resolve(&preset_file.preset)?;
    let composer = Composer::new(ComposeContext::new(project_dir, name, project_type));
    Ok(composer.compose(side, &plugins)?)
}
