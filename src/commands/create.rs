//! # Create Command Implementation
//!
//! This module implements the `create` subcommand, which generates a new
//! project directory from a preset.
//!
//! ## Functionality
//!
//! - **Preset Sources**: A preset file (`--preset` or `ZERO_PRESET`), an
//!   interactive feature selection (`--manual`), or the built-in default for
//!   `--type`.
//! - **Existing Targets**: `--force` replaces an existing directory. Without
//!   it an interactive terminal is asked whether to overwrite, merge into, or
//!   leave the directory; a non-interactive run fails. An empty directory is
//!   written into without asking.
//! - **Current Directory**: `zero create .` names the project after the
//!   current directory. The current directory (or one of its ancestors) is
//!   only ever merged into, never removed.
//! - **Dry Run**: `--dry-run` runs every plugin and prints the planned file
//!   tree without touching the disk.
//! - **Strict Merge**: `--strict-merge` turns manifest shape mismatches into
//!   errors instead of warnings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use ptree::TreeItem;
use serde_json::{json, Value};

use zero_scaffold::config::{self, GeneratorSettings, PresetFile, PRESET_MANIFEST_KEY};
use zero_scaffold::defaults::{DEFAULT_PROJECT_TYPE, PRESET_ENV};
use zero_scaffold::filesystem::FileSet;
use zero_scaffold::generator::{initial_manifest, write, GenerationReport, Generator};
use zero_scaffold::manifest::MismatchPolicy;
use zero_scaffold::output::{status, OutputConfig, Status};
use zero_scaffold::plugins::{eslint, project};
use zero_scaffold::preset::{Preset, ProjectType, PROJECT_PLUGIN};
use zero_scaffold::registry::PluginRegistry;
use zero_scaffold::suggestions;

/// Create a new project from a preset
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project name; also the directory the project is created in
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Preset file (YAML or JSON) listing the plugins to enable
    #[arg(short, long, value_name = "FILE", env = PRESET_ENV)]
    pub preset: Option<PathBuf>,

    /// Project type, overriding the preset's
    #[arg(short = 't', long = "type", value_name = "TYPE", value_parser = ["web", "lib"])]
    pub project_type: Option<String>,

    /// Pick the features interactively
    #[arg(short, long, conflicts_with = "preset")]
    pub manual: bool,

    /// Replace the target directory if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be generated without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Fail when plugins disagree about the shape of a manifest key
    #[arg(long)]
    pub strict_merge: bool,
}

/// What to do with a target directory that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExistingTarget {
    Overwrite,
    Merge,
    Cancel,
}

/// Execute the `create` command.
pub fn execute(args: CreateArgs, output: &OutputConfig) -> Result<()> {
    let target = PathBuf::from(&args.name);
    let name = project_name(&target)?;

    let registry = PluginRegistry::builtin()?;
    let mut preset_file = load_preset(&args, &registry)?;
    if args.strict_merge {
        preset_file.settings.on_type_mismatch = MismatchPolicy::Error;
    }
    preset_file.preset = preset_file.preset.with_project_name(&name);

    let existing = if target.exists() && !args.dry_run {
        resolve_existing(&target, args.force, contains_current_dir(&target))?
    } else {
        None
    };
    if existing == Some(ExistingTarget::Cancel) {
        println!("{}", status(output, Status::Info, "Cancelled, nothing was written"));
        return Ok(());
    }

    let plugins = registry.resolve(&preset_file.preset)?;
    debug!(
        "Resolved plugins: {}",
        plugins.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(", ")
    );

    let mut manifest = initial_manifest(&name);
    manifest.insert(PRESET_MANIFEST_KEY, preset_file.to_value());
    let generator = Generator::new(&target, plugins, manifest)
        .with_policy(preset_file.settings.on_type_mismatch);

    let spinner = spinner(&format!("Creating {}", name));
    let planned = generator.plan();
    spinner.finish_and_clear();
    let report = planned?;

    if args.dry_run {
        println!(
            "{}",
            status(output, Status::Info, "Dry run, nothing was written")
        );
        ptree::print_tree(&file_tree(&name, &report.files)).context("Failed to print file tree")?;
        print_report(&report, output);
        return Ok(());
    }

    if existing == Some(ExistingTarget::Overwrite) {
        fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
    }
    write::execute(&report.files, &target)?;

    println!(
        "{}",
        status(
            output,
            Status::Done,
            &format!("Created {} ({} files) in {}", name, report.files.len(), target.display())
        )
    );
    print_report(&report, output);
    Ok(())
}

/// The package name: the last component of the target path
fn project_name(target: &Path) -> Result<String> {
    let name = match target.file_name() {
        Some(name) => name.to_str().unwrap_or_default().to_string(),
        // `.` and `..` name the directory they resolve to
        None => fs::canonicalize(target)
            .with_context(|| format!("Failed to resolve {}", target.display()))?
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string(),
    };
    project::validate_name(&name)
        .map_err(|reason| suggestions::invalid_project_name(&name, &reason))?;
    Ok(name)
}

fn load_preset(args: &CreateArgs, registry: &PluginRegistry) -> Result<PresetFile> {
    let project_type = args
        .project_type
        .as_deref()
        .map(str::parse::<ProjectType>)
        .transpose()?;

    let mut preset_file = match &args.preset {
        Some(path) => {
            if !path.exists() {
                return Err(suggestions::preset_not_found(path));
            }
            config::from_file(path)?
        }
        None if args.manual => PresetFile::new(
            select_features(registry, project_type.unwrap_or(DEFAULT_PROJECT_TYPE))?,
            GeneratorSettings::default(),
        ),
        None => PresetFile::new(
            Preset::default_for(project_type.unwrap_or(DEFAULT_PROJECT_TYPE)),
            GeneratorSettings::default(),
        ),
    };

    if let Some(project_type) = project_type {
        preset_file.preset = with_project_type(&preset_file.preset, project_type);
    }
    Ok(preset_file)
}

fn with_project_type(preset: &Preset, project_type: ProjectType) -> Preset {
    let mut preset = preset.clone();
    let mut project = preset.get(PROJECT_PLUGIN).cloned().unwrap_or_default();
    project.insert("type".to_string(), json!(project_type.as_str()));
    preset.insert(PROJECT_PLUGIN, project);
    preset
}

/// Ask which features to enable, starting from the default preset
fn select_features(registry: &PluginRegistry, project_type: ProjectType) -> Result<Preset> {
    if !Term::stderr().is_term() {
        anyhow::bail!("--manual needs an interactive terminal");
    }

    let defaults = Preset::default_for(project_type);
    let choices: Vec<_> = registry.iter().filter(|r| r.id != PROJECT_PLUGIN).collect();
    let labels: Vec<String> = choices
        .iter()
        .map(|r| format!("{:<10} {}", r.id, r.description))
        .collect();
    let checked: Vec<bool> = choices.iter().map(|r| defaults.contains(r.id)).collect();

    let theme = ColorfulTheme::default();
    let picked = MultiSelect::with_theme(&theme)
        .with_prompt("Check the features needed for your project")
        .items(&labels)
        .defaults(&checked)
        .interact()?;

    let mut preset = Preset::new().with_plugin(
        PROJECT_PLUGIN,
        defaults.get(PROJECT_PLUGIN).cloned().unwrap_or_default(),
    );
    for index in picked {
        let id = choices[index].id;
        let mut options = defaults.get(id).cloned().unwrap_or_default();
        if id == eslint::ID {
            let flavors = ["leap", "airbnb", "standard"];
            let flavor = Select::with_theme(&theme)
                .with_prompt("Pick a linter / formatter config")
                .items(&flavors)
                .default(0)
                .interact()?;
            options.insert("config".to_string(), Value::from(flavors[flavor]));
        }
        preset.insert(id, options);
    }
    Ok(preset)
}

/// True when `target` is the working directory or one of its ancestors
fn contains_current_dir(target: &Path) -> bool {
    match (
        fs::canonicalize(target),
        std::env::current_dir().and_then(fs::canonicalize),
    ) {
        (Ok(target), Ok(cwd)) => cwd.starts_with(target),
        _ => false,
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn resolve_existing(
    target: &Path,
    force: bool,
    in_place: bool,
) -> Result<Option<ExistingTarget>> {
    if is_empty_dir(target) {
        return Ok(Some(ExistingTarget::Merge));
    }
    if in_place {
        if force {
            return Ok(Some(ExistingTarget::Merge));
        }
        if !Term::stderr().is_term() {
            return Err(suggestions::current_dir_not_empty(target));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Generate the project in the current directory?")
            .default(true)
            .interact()?;
        let action = if confirmed {
            ExistingTarget::Merge
        } else {
            ExistingTarget::Cancel
        };
        return Ok(Some(action));
    }
    if force {
        return Ok(Some(ExistingTarget::Overwrite));
    }
    if !Term::stderr().is_term() {
        return Err(suggestions::target_exists(target));
    }

    let actions = [
        ExistingTarget::Overwrite,
        ExistingTarget::Merge,
        ExistingTarget::Cancel,
    ];
    let labels = ["Overwrite", "Merge", "Cancel"];
    let picked = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Target directory {} already exists. Pick an action",
            target.display()
        ))
        .items(&labels)
        .default(2)
        .interact()?;
    Ok(Some(actions[picked]))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_report(report: &GenerationReport, output: &OutputConfig) {
    for warning in &report.warnings {
        eprintln!("{}", status(output, Status::Warn, &warning.to_string()));
    }
    for replaced in &report.overrides {
        debug!(
            "{} rendered by {} replaced the copy from {}",
            replaced.path.display(),
            replaced.current.as_deref().unwrap_or("?"),
            replaced.previous.as_deref().unwrap_or("?")
        );
    }
    for log in &report.exit_logs {
        println!(
            "{}",
            status(output, Status::Hint, &format!("[{}] {}", log.plugin, log.message))
        );
    }
}

/// Directory tree of the planned files, for `--dry-run`
#[derive(Clone, Debug, PartialEq)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            children: Vec::new(),
        }
    }

    fn insert(&mut self, components: &[&str]) {
        let Some((first, rest)) = components.split_first() else {
            return;
        };
        let position = match self.children.iter().position(|c| c.label == *first) {
            Some(position) => position,
            None => {
                self.children.push(TreeNode::new(first));
                self.children.len() - 1
            }
        };
        self.children[position].insert(rest);
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}

fn file_tree(root: &str, files: &FileSet) -> TreeNode {
    let mut tree = TreeNode::new(root);
    for path in files.list_files() {
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        tree.insert(&components);
    }
    tree
}
