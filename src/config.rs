//! # Preset Files
//!
//! This module defines the on-disk form of a preset and the logic for parsing
//! it. A preset file is YAML (JSON is accepted too, being a subset):
//!
//! ```yaml
//! settings:
//!   on_type_mismatch: warn   # or: error
//! plugins:
//!   project:
//!     type: web
//!   eslint:
//!     config: standard
//!   stylelint: {}
//!   fetch: true              # enabled with default options
//!   commit: false            # listed but disabled
//! ```
//!
//! ## Key Components
//!
//! - **`PresetFile`**: The parsed file, a [`Preset`] plus the
//!   [`GeneratorSettings`] that tune the generation pass.
//!
//! - **`GeneratorSettings`**: Knobs that are not plugin options, currently
//!   the manifest shape-mismatch policy.
//!
//! ## Manifest Record
//!
//! A generated project records the preset it was created from under
//! [`PRESET_MANIFEST_KEY`] in its `package.json`, in the same shape as a
//! preset file. [`from_manifest`] reads it back so later commands can rebuild
//! the plugin list without the original preset file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::manifest::{Manifest, MismatchPolicy};
use crate::preset::Preset;

/// Manifest key holding the preset a project was generated from
pub const PRESET_MANIFEST_KEY: &str = "__zero_config__";

/// Settings that apply to a whole generation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// How the manifest merger treats shape mismatches
    #[serde(default)]
    pub on_type_mismatch: MismatchPolicy,
}

/// A parsed preset file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetFile {
    pub settings: GeneratorSettings,
    pub preset: Preset,
}

impl PresetFile {
    pub fn new(preset: Preset, settings: GeneratorSettings) -> Self {
        Self { settings, preset }
    }

    /// Read a preset file from a JSON value of the file's shape
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| Error::PresetParse {
            message: format!("a preset must be a mapping, got {}", value),
            hint: Some("Start the file with `plugins:`".to_string()),
        })?;

        for key in map.keys() {
            if key != "settings" && key != "plugins" {
                return Err(Error::PresetParse {
                    message: format!("unknown top-level key '{}'", key),
                    hint: Some("Only `settings` and `plugins` are allowed".to_string()),
                });
            }
        }

        let settings = match map.get("settings") {
            None | Some(Value::Null) => GeneratorSettings::default(),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| Error::PresetParse {
                message: format!("invalid settings: {}", e),
                hint: Some("`on_type_mismatch` accepts `warn` or `error`".to_string()),
            })?,
        };

        let plugins = map.get("plugins").ok_or_else(|| Error::PresetParse {
            message: "missing `plugins` mapping".to_string(),
            hint: Some("List the enabled plugins under `plugins:`".to_string()),
        })?;

        Ok(Self {
            settings,
            preset: Preset::from_value(plugins)?,
        })
    }

    /// Serialize in the file's shape
    pub fn to_value(&self) -> Value {
        json!({
            "settings": self.settings,
            "plugins": self.preset.to_value(),
        })
    }
}

/// Parse a YAML or JSON preset file
pub fn parse(content: &str) -> Result<PresetFile> {
    let value: Value = serde_yaml::from_str(content).map_err(|e| Error::PresetParse {
        message: e.to_string(),
        hint: Some("Check the file is valid YAML or JSON".to_string()),
    })?;
    PresetFile::from_value(&value)
}

/// Read and parse a preset file from disk
pub fn from_file(path: &Path) -> Result<PresetFile> {
    let content = std::fs::read_to_string(path)?;
    parse(&content).map_err(|e| match e {
        Error::PresetParse { message, hint } => Error::PresetParse {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        other => other,
    })
}

/// Read the recorded preset back from a generated project's manifest.
///
/// Returns `None` when the manifest carries no record.
pub fn from_manifest(manifest: &Manifest) -> Result<Option<PresetFile>> {
    manifest
        .get(PRESET_MANIFEST_KEY)
        .map(PresetFile::from_value)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::ProjectType;
    use std::io::Write;

    #[test]
    fn test_parse_yaml_preset() {
        let file = parse(
            r#"
settings:
  on_type_mismatch: error
plugins:
  project:
    type: lib
  eslint:
    config: standard
  stylelint: {}
  fetch: true
  commit: false
"#,
        )
        .unwrap();

        assert_eq!(file.settings.on_type_mismatch, MismatchPolicy::Error);
        assert_eq!(
            file.preset.ids().collect::<Vec<_>>(),
            vec!["project", "eslint", "stylelint", "fetch"]
        );
        assert_eq!(file.preset.project_type().unwrap(), ProjectType::Lib);
        assert_eq!(
            file.preset.get("eslint").unwrap().get("config"),
            Some(&json!("standard"))
        );
    }

    #[test]
    fn test_parse_json_preset_without_settings() {
        let file = parse(r#"{"plugins": {"eslint": null}}"#).unwrap();
        assert_eq!(file.settings, GeneratorSettings::default());
        assert!(file.preset.contains("eslint"));
    }

    #[test]
    fn test_parse_errors_have_hints() {
        let err = parse("settings: {}").unwrap_err();
        assert!(err.to_string().contains("missing `plugins`"));

        let err = parse("plugins: {}\nextras: 1").unwrap_err();
        assert!(err.to_string().contains("unknown top-level key 'extras'"));

        let err = parse("plugins: {}\nsettings:\n  on_type_mismatch: panic").unwrap_err();
        assert!(err.to_string().contains("invalid settings"));

        let err = parse("plugins: [eslint]").unwrap_err();
        assert!(matches!(err, Error::PresetParse { .. }));

        let err = parse("plugins: {eslint: 3}").unwrap_err();
        assert!(err.to_string().contains("hint"));
    }

    #[test]
    fn test_from_file_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "plugins: nope").unwrap();
        let err = from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_manifest_record_reads_back() {
        let original = PresetFile::new(Preset::lib_default(), GeneratorSettings::default());
        let mut manifest = Manifest::new();
        manifest.insert(PRESET_MANIFEST_KEY, original.to_value());

        let recorded = from_manifest(&manifest).unwrap().unwrap();
        assert_eq!(recorded, original);
        assert!(from_manifest(&Manifest::new()).unwrap().is_none());
    }
}
