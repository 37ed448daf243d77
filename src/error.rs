//! # Error Handling
//!
//! This module defines the centralized error type for the `zero-scaffold`
//! library. It uses the `thiserror` library to build a single `Error` enum
//! covering every failure a generation pass or a configuration composition can
//! raise, each with enough context to tell the user what went wrong.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failures. Variants carry the plugin id,
//!   variable name or key path involved so messages stay actionable.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library.
//!
//! The taxonomy mirrors the generation pipeline:
//!
//! - Preset resolution failures (`UnknownPlugin`, `Registry`, `PresetParse`).
//! - Template rendering failures (`Template`).
//! - Manifest merge failures under the strict mismatch policy (`ManifestMerge`).
//! - Plugin failures during a generation pass (`PluginApply`), which wrap the
//!   underlying cause together with the plugin that raised it.
//! - Filesystem failures while staging or writing the generated tree.
//!
//! Lookups in the configuration graph never produce errors: a miss is an
//! explicit `None`, since inspection is a read-only diagnostic path.

use thiserror::Error;

/// Main error type for zero-scaffold operations
#[derive(Error, Debug)]
pub enum Error {
    /// A preset referenced a plugin identifier with no registered implementation.
    ///
    /// Raised during resolution, before any file is touched.
    #[error("Unknown plugin: '{id}'{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    UnknownPlugin {
        id: String,
        /// Optional "did you mean" hint
        hint: Option<String>,
    },

    /// The plugin registration table is inconsistent (duplicate ids or an
    /// implication pointing at an unregistered plugin).
    #[error("Plugin registry error: {message}")]
    Registry { message: String },

    /// A preset file could not be parsed.
    #[error("Preset parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    PresetParse {
        message: String,
        /// Optional hint for how to fix the preset
        hint: Option<String>,
    },

    /// A plugin received options it cannot use.
    #[error("Invalid options for plugin '{plugin}': {message}")]
    InvalidOption { plugin: String, message: String },

    /// An error occurred during template processing.
    ///
    /// May include the name of the problematic variable when applicable.
    #[error("Template processing error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// A manifest fragment disagreed with the running manifest about the
    /// shape of a key while the strict mismatch policy was active.
    #[error("Manifest merge error at '{path}': base holds a {base}, fragment supplies a {fragment}")]
    ManifestMerge {
        path: String,
        base: String,
        fragment: String,
    },

    /// A plugin failed while being applied. Nothing is written when this occurs.
    #[error("Plugin '{plugin}' failed: {source}")]
    PluginApply {
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    /// An error occurred while staging or writing generated files.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Wrap an error raised inside a plugin with the plugin's identity.
    ///
    /// Errors that already name a plugin are returned unchanged.
    pub fn in_plugin(self, plugin: &str) -> Self {
        match self {
            Error::PluginApply { .. } => self,
            other => Error::PluginApply {
                plugin: plugin.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost cause, looking through `PluginApply` wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::PluginApply { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_plugin() {
        let error = Error::UnknownPlugin {
            id: "eslnt".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Unknown plugin"));
        assert!(display.contains("eslnt"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_unknown_plugin_with_hint() {
        let error = Error::UnknownPlugin {
            id: "eslnt".to_string(),
            hint: Some("did you mean 'eslint'?".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("did you mean 'eslint'?"));
    }

    #[test]
    fn test_error_display_preset_parse_with_hint() {
        let error = Error::PresetParse {
            message: "plugins must be a mapping".to_string(),
            hint: Some("Use `plugins: { eslint: {} }`".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Preset parsing error"));
        assert!(display.contains("plugins must be a mapping"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_error_template() {
        let error = Error::Template {
            message: "Template processing failed".to_string(),
            variable: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Template processing error"));
        assert!(display.contains("Template processing failed"));
    }

    #[test]
    fn test_error_template_with_variable() {
        let error = Error::Template {
            message: "Undefined variable".to_string(),
            variable: Some("projectName".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Undefined variable"));
        assert!(display.contains("(variable: projectName)"));
    }

    #[test]
    fn test_error_manifest_merge() {
        let error = Error::ManifestMerge {
            path: "husky.hooks".to_string(),
            base: "mapping".to_string(),
            fragment: "scalar".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("husky.hooks"));
        assert!(display.contains("base holds a mapping"));
        assert!(display.contains("fragment supplies a scalar"));
    }

    #[test]
    fn test_in_plugin_wraps_once() {
        let error = Error::Template {
            message: "Undefined variable".to_string(),
            variable: Some("x".to_string()),
        }
        .in_plugin("eslint")
        .in_plugin("outer");

        match &error {
            Error::PluginApply { plugin, .. } => assert_eq!(plugin, "eslint"),
            other => panic!("expected PluginApply, got {:?}", other),
        }
        assert!(matches!(error.root_cause(), Error::Template { .. }));
        assert!(format!("{}", error).contains("Plugin 'eslint' failed"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_str = "invalid: [unclosed";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }

    #[test]
    fn test_error_from_semver_error() {
        let semver_error = semver::Version::parse("not-a-version").unwrap_err();
        let error: Error = semver_error.into();
        assert!(format!("{}", error).contains("Semver parsing error"));
    }
}
