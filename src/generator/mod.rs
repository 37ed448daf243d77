//! Generation pass
//!
//! The [`Generator`] runs every resolved plugin, in order, against one
//! running manifest and one running [`FileSet`], then writes the result.
//!
//! ## Process
//!
//! 1.  **Apply plugins**: Each plugin receives a [`GeneratorApi`] tagged with
//!     its identifier. Manifest fragments are merged into the running
//!     manifest immediately; rendered files are merged into the running file
//!     set, the later plugin winning a shared path. Plugins run one at a
//!     time; the first error aborts the pass and names the plugin.
//!
//! 2.  **Serialize manifest**: The final manifest is written in canonical
//!     form to `package.json` inside the file set.
//!
//! 3.  **Write**: The file set is written to the target directory in one
//!     staged step (see [`write`]). [`Generator::plan`] stops before this
//!     step.
//!
//! Nothing touches the target directory before step 3, so a failed pass
//! leaves no partial project behind.

pub mod write;

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::filesystem::{FileSet, Override};
use crate::manifest::{Manifest, ManifestMerger, MergeWarning, MismatchPolicy};
use crate::preset::{Options, ProjectType, PROJECT_PLUGIN};
use crate::registry::ResolvedPlugin;
use crate::template::{self, TemplateContext, TemplateSource};

/// Path of the serialized manifest inside the project
pub const MANIFEST_PATH: &str = "package.json";

/// Contributor recorded for files the generator itself produces
const GENERATOR_ORIGIN: &str = "generator";

/// Base manifest every project starts from
pub fn initial_manifest(name: &str) -> Manifest {
    let mut manifest = Manifest::new();
    manifest.insert("name", Value::String(name.to_string()));
    manifest.insert("version", json!("0.1.0"));
    manifest.insert("private", json!(true));
    manifest.insert("devDependencies", json!({}));
    manifest
}

/// Read-only facts about where the project is generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub target_dir: PathBuf,
    pub is_git_repository: bool,
}

impl Environment {
    pub fn new(target_dir: impl Into<PathBuf>, is_git_repository: bool) -> Self {
        Self {
            target_dir: target_dir.into(),
            is_git_repository,
        }
    }

    /// Check the target directory and its ancestors for a `.git` entry
    pub fn detect(target_dir: impl Into<PathBuf>) -> Self {
        let target_dir = target_dir.into();
        // `.` has no ancestors of its own
        let is_git_repository = std::path::absolute(&target_dir)
            .unwrap_or_else(|_| target_dir.clone())
            .ancestors()
            .any(|dir| dir.join(".git").exists());
        Self {
            target_dir,
            is_git_repository,
        }
    }
}

/// A message a plugin wants shown once generation has finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitLog {
    pub plugin: String,
    pub message: String,
}

/// Everything a generation pass produced
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Every file to be written, `package.json` included
    pub files: FileSet,
    pub manifest: Manifest,
    /// Paths rendered by more than one plugin
    pub overrides: Vec<Override>,
    /// Manifest shape mismatches resolved in favour of the fragment
    pub warnings: Vec<MergeWarning>,
    pub exit_logs: Vec<ExitLog>,
}

/// Mutable state of one pass, owned by the generator
struct PassState {
    merger: ManifestMerger,
    manifest: Manifest,
    files: FileSet,
    overrides: Vec<Override>,
    warnings: Vec<MergeWarning>,
    exit_logs: Vec<ExitLog>,
}

/// Capabilities handed to a plugin during [`Plugin::generate`](crate::plugins::Plugin::generate)
pub struct GeneratorApi<'a> {
    plugin_id: &'a str,
    enabled: &'a [String],
    project: &'a Options,
    environment: &'a Environment,
    state: &'a mut PassState,
}

impl GeneratorApi<'_> {
    /// Identifier of the plugin holding this handle
    pub fn plugin_id(&self) -> &str {
        self.plugin_id
    }

    /// Whether the plugin `id` takes part in this pass
    pub fn has_plugin(&self, id: &str) -> bool {
        self.enabled.iter().any(|enabled| enabled == id)
    }

    /// Merge a manifest fragment into the running manifest
    pub fn extend_manifest(&mut self, fragment: Value) -> Result<()> {
        let fragment = Manifest::from_value(fragment)?;
        let merged = self.state.merger.merge(&self.state.manifest, &fragment)?;
        self.state.manifest = merged.manifest;
        self.state.warnings.extend(merged.warnings);
        Ok(())
    }

    /// Render a template source into the running file set
    pub fn render(&mut self, source: &TemplateSource, context: &TemplateContext) -> Result<()> {
        debug!("{} renders {}", self.plugin_id, source.describe());
        let rendered = template::render(source, context)?.with_origin(self.plugin_id);
        self.merge_files(rendered);
        Ok(())
    }

    /// Render one template text to `path`
    pub fn render_file(
        &mut self,
        path: impl AsRef<Path>,
        template: &str,
        context: &TemplateContext,
    ) -> Result<()> {
        let content = template::render_str(template, context)?;
        let mut rendered = FileSet::new();
        rendered.add_file_string(path, &content)?;
        self.merge_files(rendered.with_origin(self.plugin_id));
        Ok(())
    }

    fn merge_files(&mut self, rendered: FileSet) {
        for replaced in self.state.files.merge(rendered) {
            debug!(
                "{} overrides {} (previously from {})",
                replaced.current.as_deref().unwrap_or("?"),
                replaced.path.display(),
                replaced.previous.as_deref().unwrap_or("?")
            );
            self.state.overrides.push(replaced);
        }
    }

    /// Whether the target directory is inside a git work tree
    pub fn is_git_repository(&self) -> bool {
        self.environment.is_git_repository
    }

    pub fn target_dir(&self) -> &Path {
        &self.environment.target_dir
    }

    /// Options of the `project` plugin
    pub fn project(&self) -> &Options {
        self.project
    }

    /// The `name` project option, or the target directory name when unset
    pub fn project_name(&self) -> &str {
        match self.project.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name,
            _ => self
                .environment
                .target_dir
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default(),
        }
    }

    pub fn project_type(&self) -> Result<ProjectType> {
        match self.project.get("type") {
            None | Some(Value::Null) => Ok(ProjectType::Web),
            Some(Value::String(s)) => s.parse(),
            Some(other) => Err(Error::InvalidOption {
                plugin: PROJECT_PLUGIN.to_string(),
                message: format!("'type' must be a string, got {}", other),
            }),
        }
    }

    /// Queue a message to show after generation succeeds
    pub fn exit_log(&mut self, message: impl Into<String>) {
        self.state.exit_logs.push(ExitLog {
            plugin: self.plugin_id.to_string(),
            message: message.into(),
        });
    }
}

/// Drives one generation pass
#[derive(Debug)]
pub struct Generator {
    plugins: Vec<ResolvedPlugin>,
    initial_manifest: Manifest,
    policy: MismatchPolicy,
    environment: Environment,
}

impl Generator {
    pub fn new(
        target_dir: impl Into<PathBuf>,
        plugins: Vec<ResolvedPlugin>,
        initial_manifest: Manifest,
    ) -> Self {
        Self {
            plugins,
            initial_manifest,
            policy: MismatchPolicy::default(),
            environment: Environment::detect(target_dir),
        }
    }

    pub fn with_policy(mut self, policy: MismatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the detected environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.environment.target_dir
    }

    pub fn plugins(&self) -> &[ResolvedPlugin] {
        &self.plugins
    }

    /// Run every plugin and serialize the manifest without writing anything
    pub fn plan(&self) -> Result<GenerationReport> {
        let project = self
            .plugins
            .iter()
            .find(|p| p.id == PROJECT_PLUGIN)
            .map(|p| p.options.clone())
            .unwrap_or_default();
        let enabled: Vec<String> = self.plugins.iter().map(|p| p.id.clone()).collect();

        let mut state = PassState {
            merger: ManifestMerger::new(self.policy),
            manifest: self.initial_manifest.clone(),
            files: FileSet::new(),
            overrides: Vec::new(),
            warnings: Vec::new(),
            exit_logs: Vec::new(),
        };

        for resolved in &self.plugins {
            info!("Applying plugin {}", resolved.id);
            let mut api = GeneratorApi {
                plugin_id: &resolved.id,
                enabled: &enabled,
                project: &project,
                environment: &self.environment,
                state: &mut state,
            };
            resolved
                .plugin
                .generate(&mut api, &resolved.options)
                .map_err(|e| e.in_plugin(&resolved.id))?;
        }

        let mut manifest_file = FileSet::new();
        manifest_file.add_file_string(MANIFEST_PATH, &state.manifest.to_canonical_string()?)?;
        state
            .overrides
            .extend(state.files.merge(manifest_file.with_origin(GENERATOR_ORIGIN)));

        Ok(GenerationReport {
            files: state.files,
            manifest: state.manifest,
            overrides: state.overrides,
            warnings: state.warnings,
            exit_logs: state.exit_logs,
        })
    }

    /// Plan, then write the project to the target directory
    pub fn generate(&self) -> Result<GenerationReport> {
        let report = self.plan()?;
        info!(
            "Writing {} files to {}",
            report.files.len(),
            self.environment.target_dir.display()
        );
        write::execute(&report.files, &self.environment.target_dir)?;
        Ok(report)
    }
}

/// Run a full generation pass and return the final manifest
pub fn generate(
    target_dir: impl Into<PathBuf>,
    plugins: Vec<ResolvedPlugin>,
    initial_manifest: Manifest,
) -> Result<Manifest> {
    Generator::new(target_dir, plugins, initial_manifest)
        .generate()
        .map(|report| report.manifest)
}
