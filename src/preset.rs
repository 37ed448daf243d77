//! Presets: the ordered selection of enabled plugins and their options
//!
//! A preset keeps plugins in declaration order. Identifiers are unique:
//! inserting an identifier that is already present replaces its options in
//! place. The `project` entry carries the project name and type that every
//! other plugin reads through [`crate::generator::GeneratorApi::project`].

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Identifier of the root plugin that is always resolved first
pub const PROJECT_PLUGIN: &str = "project";

/// Options record for one plugin
pub type Options = Map<String, Value>;

/// Kind of project a preset generates
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Web application with a client and a server side
    Web,
    /// Component library with a client side only
    Lib,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "web",
            ProjectType::Lib => "lib",
        }
    }

    /// Build-configuration sides this project type composes
    pub fn sides(&self) -> &'static [&'static str] {
        match self {
            ProjectType::Web => &["client", "server"],
            ProjectType::Lib => &["client"],
        }
    }

    /// Directory holding the project's sources
    pub fn source_dir(&self) -> &'static str {
        match self {
            ProjectType::Web => "src",
            ProjectType::Lib => "components",
        }
    }
}

impl std::str::FromStr for ProjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "web" => Ok(ProjectType::Web),
            "lib" => Ok(ProjectType::Lib),
            other => Err(Error::InvalidOption {
                plugin: PROJECT_PLUGIN.to_string(),
                message: format!("unknown project type '{}', expected 'web' or 'lib'", other),
            }),
        }
    }
}

/// Ordered mapping of plugin identifier to options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preset {
    plugins: Vec<(String, Options)>,
}

impl Preset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default preset for a web application
    pub fn web_default() -> Self {
        Self::new()
            .with_plugin(
                PROJECT_PLUGIN,
                options(json!({ "name": "", "type": "web" })),
            )
            .with_plugin("eslint", options(json!({ "config": "leap" })))
            .with_plugin("stylelint", Options::new())
            .with_plugin("unit-test", Options::new())
            .with_plugin("fetch", Options::new())
            .with_plugin("commit", Options::new())
    }

    /// Default preset for a component library
    pub fn lib_default() -> Self {
        Self::new()
            .with_plugin(
                PROJECT_PLUGIN,
                options(json!({ "name": "", "type": "lib" })),
            )
            .with_plugin("eslint", options(json!({ "config": "leap" })))
            .with_plugin("stylelint", Options::new())
            .with_plugin("unit-test", Options::new())
            .with_plugin("commit", Options::new())
    }

    /// Default preset for a project type
    pub fn default_for(project_type: ProjectType) -> Self {
        match project_type {
            ProjectType::Web => Self::web_default(),
            ProjectType::Lib => Self::lib_default(),
        }
    }

    /// Add a plugin, builder style
    pub fn with_plugin(mut self, id: impl Into<String>, options: Options) -> Self {
        self.insert(id, options);
        self
    }

    /// Add a plugin or replace the options of an existing one in place.
    /// Returns the previous options when replacing.
    pub fn insert(&mut self, id: impl Into<String>, options: Options) -> Option<Options> {
        let id = id.into();
        match self.plugins.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => Some(std::mem::replace(slot, options)),
            None => {
                self.plugins.push((id, options));
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Options> {
        let index = self.plugins.iter().position(|(existing, _)| existing == id)?;
        Some(self.plugins.remove(index).1)
    }

    pub fn get(&self, id: &str) -> Option<&Options> {
        self.plugins
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, options)| options)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Plugin identifiers in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Options)> {
        self.plugins.iter().map(|(id, options)| (id.as_str(), options))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Project type declared by the `project` entry, `web` when absent
    pub fn project_type(&self) -> Result<ProjectType> {
        match self
            .get(PROJECT_PLUGIN)
            .and_then(|options| options.get("type"))
        {
            None | Some(Value::Null) => Ok(ProjectType::Web),
            Some(Value::String(s)) => s.parse(),
            Some(other) => Err(Error::InvalidOption {
                plugin: PROJECT_PLUGIN.to_string(),
                message: format!("'type' must be a string, got {}", other),
            }),
        }
    }

    /// Deep copy with the concrete project name injected into the `project`
    /// entry. The entry is created when missing.
    pub fn with_project_name(&self, name: &str) -> Self {
        let mut preset = self.clone();
        let mut project = preset.get(PROJECT_PLUGIN).cloned().unwrap_or_default();
        project.insert("name".to_string(), Value::String(name.to_string()));
        preset.insert(PROJECT_PLUGIN, project);
        preset
    }

    /// Serialize as a JSON object in declaration order
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.plugins
                .iter()
                .map(|(id, options)| (id.clone(), Value::Object(options.clone())))
                .collect(),
        )
    }

    /// Read a preset from a JSON object of `id -> options`. A `null` or
    /// `true` options value means "enabled with no options".
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| Error::PresetParse {
            message: format!("plugins must be a mapping, got {}", value),
            hint: Some("Use `plugins: { eslint: {} }`".to_string()),
        })?;

        let mut preset = Self::new();
        for (id, raw) in map {
            let options = match raw {
                Value::Null | Value::Bool(true) => Options::new(),
                Value::Object(options) => options.clone(),
                Value::Bool(false) => continue,
                other => {
                    return Err(Error::PresetParse {
                        message: format!(
                            "options for plugin '{}' must be a mapping, got {}",
                            id, other
                        ),
                        hint: Some(format!("Write `{}: {{}}` to enable it with defaults", id)),
                    })
                }
            };
            preset.insert(id.clone(), options);
        }
        Ok(preset)
    }
}

fn options(value: Value) -> Options {
    match value {
        Value::Object(map) => map,
        _ => Options::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_declaration_order() {
        let preset = Preset::new()
            .with_plugin("a", Options::new())
            .with_plugin(PROJECT_PLUGIN, Options::new())
            .with_plugin("b", Options::new());
        assert_eq!(preset.ids().collect::<Vec<_>>(), vec!["a", "project", "b"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut preset = Preset::new()
            .with_plugin("a", Options::new())
            .with_plugin("b", Options::new());
        let previous = preset.insert("a", options(json!({"x": 1})));

        assert_eq!(previous, Some(Options::new()));
        assert_eq!(preset.len(), 2);
        assert_eq!(preset.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(preset.get("a").unwrap().get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_with_project_name_is_a_deep_clone() {
        let original = Preset::web_default();
        let named = original.with_project_name("demo");

        assert_eq!(
            named.get(PROJECT_PLUGIN).unwrap().get("name"),
            Some(&json!("demo"))
        );
        assert_eq!(
            original.get(PROJECT_PLUGIN).unwrap().get("name"),
            Some(&json!(""))
        );
    }

    #[test]
    fn test_with_project_name_adds_missing_project() {
        let preset = Preset::new()
            .with_plugin("eslint", Options::new())
            .with_project_name("demo");
        assert!(preset.contains(PROJECT_PLUGIN));
        assert_eq!(preset.len(), 2);
    }

    #[test]
    fn test_defaults() {
        let web = Preset::web_default();
        assert_eq!(web.project_type().unwrap(), ProjectType::Web);
        assert!(web.contains("fetch"));

        let lib = Preset::lib_default();
        assert_eq!(lib.project_type().unwrap(), ProjectType::Lib);
        assert!(!lib.contains("fetch"));
        assert_eq!(ProjectType::Lib.sides(), &["client"]);
    }

    #[test]
    fn test_project_type_rejects_unknown() {
        let preset = Preset::new().with_plugin(PROJECT_PLUGIN, options(json!({"type": "cli"})));
        assert!(matches!(
            preset.project_type(),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_value_round_trip_keeps_order() {
        let preset = Preset::new()
            .with_plugin("z", Options::new())
            .with_plugin("a", options(json!({"k": "v"})));
        let restored = Preset::from_value(&preset.to_value()).unwrap();
        assert_eq!(restored, preset);
    }

    #[test]
    fn test_from_value_shorthands() {
        let preset = Preset::from_value(&json!({
            "eslint": null,
            "fetch": true,
            "commit": false,
        }))
        .unwrap();
        assert_eq!(preset.ids().collect::<Vec<_>>(), vec!["eslint", "fetch"]);
    }

    #[test]
    fn test_from_value_rejects_scalar_options() {
        let err = Preset::from_value(&json!({ "eslint": "airbnb" })).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("eslint"));
        assert!(message.contains("hint:"));
    }
}
