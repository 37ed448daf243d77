//! # Zero Scaffold Library
//!
//! This library provides the core of the `zero` project generator: turning a
//! preset (a declarative selection of feature plugins) into a working project
//! tree, and composing the per-side build configuration those plugins
//! contribute to. It is designed to be used by the `zero` command-line tool
//! but can also drive generation from other applications.
//!
//! ## Quick Example
//!
//! ```
//! use zero_scaffold::generator::{initial_manifest, Environment, Generator};
//! use zero_scaffold::preset::Preset;
//! use zero_scaffold::registry::PluginRegistry;
//!
//! let preset = Preset::web_default().with_project_name("shop");
//! let plugins = PluginRegistry::builtin().unwrap().resolve(&preset).unwrap();
//!
//! let report = Generator::new("shop", plugins, initial_manifest("shop"))
//!     .with_environment(Environment::new("/tmp/shop", false))
//!     .plan()
//!     .unwrap();
//!
//! assert!(report.files.exists("package.json"));
//! assert!(report.files.exists(".eslintrc"));
//! assert_eq!(report.manifest.get("name").unwrap(), "shop");
//! ```
//!
//! ## Core Concepts
//!
//! - **Presets (`preset`, `config`)**: The ordered set of enabled plugins and
//!   their options, built in or read from a YAML/JSON preset file.
//! - **Registry (`registry`)**: The explicit table mapping plugin identifiers
//!   to implementations, and the resolution of a preset into an ordered
//!   plugin list.
//! - **Plugins (`plugins`)**: Units of generation and configuration logic.
//! - **Manifest (`manifest`)**: The `package.json` record and the
//!   type-directed merge that combines plugin fragments into it.
//! - **Templates (`template`)**: The small template language plugins render
//!   their files with.
//! - **In-Memory Filesystem (`filesystem`)**: Rendered files are staged in a
//!   [`filesystem::FileSet`] and only written once the whole pass succeeds.
//! - **Composition (`compose`)**: The per-side configuration graph plugins
//!   mutate, and the read-only queries `inspect` runs over it.
//!
//! ## Execution Flow
//!
//! 1.  **Resolve**: [`registry::PluginRegistry::resolve`] checks every
//!     identifier and orders the plugins, `project` first.
//! 2.  **Generate**: [`generator::Generator`] drives each plugin against the
//!     running manifest and file set.
//! 3.  **Write**: The file set, `package.json` included, is written to the
//!     target directory in one staged step.
//! 4.  **Compose** (later, on demand): [`compose::Composer`] replays the same
//!     plugins against one configuration graph per side.

pub mod compose;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod generator;
pub mod manifest;
pub mod output;
pub mod plugins;
pub mod preset;
pub mod registry;
pub mod suggestions;
pub mod template;

#[cfg(test)]
mod manifest_proptest;
