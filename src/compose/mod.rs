//! Build configuration composition
//!
//! Plugins that contribute to the bundler configuration implement
//! [`Plugin::configure`](crate::plugins::Plugin::configure). For each side of
//! the project, a [`Composer`] creates one [`ConfigGraph`] and drives every
//! resolved plugin against it in resolved order, handing each a
//! [`SideConfig`] mutation handle tagged with the plugin's identifier.
//! Later plugins see (and may replace or remove) the named nodes earlier
//! ones added.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use zero_scaffold::compose::{graph::ConfigGraph, SideConfig, ComposeContext};
//! use zero_scaffold::preset::ProjectType;
//!
//! let context = ComposeContext::new("/tmp/demo", "demo", ProjectType::Web);
//! let mut graph = ConfigGraph::new("client");
//! SideConfig::new(&mut graph, "project", &context)
//!     .add_entry("main", &["./src/index.tsx"])
//!     .add_rule(Some("ts"), json!({ "test": "\\.tsx?$" }));
//!
//! assert_eq!(graph.list_rule_names(), vec!["ts"]);
//! ```

pub mod graph;
pub mod inspect;

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::Value;

use crate::error::Result;
use crate::preset::ProjectType;
use crate::registry::ResolvedPlugin;

use graph::{BuildPlugin, ConfigGraph, Mutation, Rule};

/// Read-only facts about the project being configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeContext {
    pub project_dir: PathBuf,
    pub project_name: String,
    pub project_type: ProjectType,
}

impl ComposeContext {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        project_name: impl Into<String>,
        project_type: ProjectType,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            project_name: project_name.into(),
            project_type,
        }
    }

    /// Resolve a path relative to the project directory
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.project_dir.join(relative)
    }
}

/// Mutation handle one contributor holds on one side's graph
pub struct SideConfig<'a> {
    graph: &'a mut ConfigGraph,
    contributor: &'a str,
    context: &'a ComposeContext,
}

impl<'a> SideConfig<'a> {
    pub fn new(
        graph: &'a mut ConfigGraph,
        contributor: &'a str,
        context: &'a ComposeContext,
    ) -> Self {
        Self {
            graph,
            contributor,
            context,
        }
    }

    pub fn side(&self) -> &str {
        self.graph.side()
    }

    pub fn context(&self) -> &ComposeContext {
        self.context
    }

    /// Set (or replace) the paths of a named entry point
    pub fn add_entry(&mut self, name: &str, paths: &[&str]) -> &mut Self {
        self.record(Mutation::AddEntry {
            name: name.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        })
    }

    /// Add a module rule; a rule with the same name is replaced in place
    pub fn add_rule(&mut self, name: Option<&str>, spec: Value) -> &mut Self {
        self.record(Mutation::AddRule {
            name: name.map(String::from),
            spec,
        })
    }

    /// Add a build-tool plugin; a plugin with the same name is replaced in place
    pub fn add_build_plugin(
        &mut self,
        name: Option<&str>,
        constructor: &str,
        args: Vec<Value>,
    ) -> &mut Self {
        self.record(Mutation::AddBuildPlugin {
            name: name.map(String::from),
            constructor: constructor.to_string(),
            args,
        })
    }

    pub fn remove_rule(&mut self, name: &str) -> &mut Self {
        self.record(Mutation::RemoveRule {
            name: name.to_string(),
        })
    }

    pub fn remove_build_plugin(&mut self, name: &str) -> &mut Self {
        self.record(Mutation::RemoveBuildPlugin {
            name: name.to_string(),
        })
    }

    pub fn set_option(&mut self, key: &str, value: Value) -> &mut Self {
        self.record(Mutation::SetOption {
            key: key.to_string(),
            value,
        })
    }

    /// A rule added by this or an earlier contributor
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.graph.find_rule_by_name(name)
    }

    pub fn build_plugin(&self, name: &str) -> Option<&BuildPlugin> {
        self.graph.find_plugin_by_name(name)
    }

    fn record(&mut self, mutation: Mutation) -> &mut Self {
        self.graph.apply(self.contributor, mutation);
        self
    }
}

/// Drives configuration contributors for each side of a project
#[derive(Debug, Clone)]
pub struct Composer {
    context: ComposeContext,
}

impl Composer {
    pub fn new(context: ComposeContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ComposeContext {
        &self.context
    }

    /// Build the graph of one side by applying every plugin in order.
    ///
    /// A failing plugin aborts composition and its error names the plugin.
    pub fn compose(&self, side: &str, plugins: &[ResolvedPlugin]) -> Result<ConfigGraph> {
        let mut graph = ConfigGraph::new(side);
        for resolved in plugins {
            let mut handle = SideConfig::new(&mut graph, &resolved.id, &self.context);
            resolved
                .plugin
                .configure(&mut handle, &resolved.options)
                .map_err(|e| e.in_plugin(&resolved.id))?;
        }

        for conflict in graph.conflicts() {
            debug!("[{}] {}", side, conflict);
        }
        info!(
            "Composed {} side: {} rules, {} plugins",
            side,
            graph.rules().len(),
            graph.plugins().len()
        );
        Ok(graph)
    }

    /// Build one graph per side of the project type, in side order
    pub fn compose_all(&self, plugins: &[ResolvedPlugin]) -> Result<Vec<ConfigGraph>> {
        self.context
            .project_type
            .sides()
            .iter()
            .map(|side| self.compose(side, plugins))
            .collect()
    }
}
