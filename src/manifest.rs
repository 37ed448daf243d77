//! Manifest (package.json) model and the type-directed fragment merge
//!
//! Each plugin extends the running manifest with a partial fragment. The merge
//! walks the fragment key by key and decides what to do from the *shape* of
//! the two values meeting at that key:
//!
//! | base       | fragment   | result                                  |
//! |------------|------------|-----------------------------------------|
//! | sequence   | sequence   | base items followed by fragment items   |
//! | mapping    | mapping    | recursive merge                         |
//! | scalar     | scalar     | fragment value                          |
//! | any other combination   | fragment value, plus a [`MergeWarning`] |
//!
//! Keys present only in the base are kept in place; keys present only in the
//! fragment are appended in fragment order. Because the policy depends only on
//! shapes and the order of application, folding the same fragments in the same
//! order always produces the same manifest.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Top-level keys in the order they appear in a written manifest. Remaining
/// keys follow in insertion order.
const KEY_ORDER: &[&str] = &[
    "name",
    "version",
    "private",
    "description",
    "keywords",
    "homepage",
    "bugs",
    "repository",
    "license",
    "author",
    "files",
    "sideEffects",
    "main",
    "module",
    "unpkg",
    "typings",
    "types",
    "bin",
    "scripts",
    "husky",
    "lint-staged",
    "config",
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
    "publishConfig",
    "engines",
    "browserslist",
];

/// Keys whose mapping values are written with sorted keys
const SORTED_KEYS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// The closed set of value shapes the merge policy distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Strings, numbers, booleans and null
    Scalar,
    /// Arrays
    Sequence,
    /// Objects
    Mapping,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Shape::Sequence,
            Value::Object(_) => Shape::Mapping,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Scalar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when base and fragment disagree about the shape of a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// The fragment wins and a warning is logged
    #[default]
    Warn,
    /// The merge fails with [`Error::ManifestMerge`]
    Error,
}

/// A shape mismatch resolved in favour of the fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    /// Dotted key path, e.g. `husky.hooks`
    pub path: String,
    pub base: Shape,
    pub fragment: Shape,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': {} replaced by {} from fragment",
            self.path, self.base, self.fragment
        )
    }
}

impl From<MergeWarning> for Error {
    fn from(warning: MergeWarning) -> Self {
        Error::ManifestMerge {
            path: warning.path,
            base: warning.base.to_string(),
            fragment: warning.fragment.to_string(),
        }
    }
}

/// A project manifest or a partial fragment of one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::ManifestMerge {
                path: "<root>".to_string(),
                base: Shape::Mapping.to_string(),
                fragment: Shape::of(&other).to_string(),
            }),
        }
    }

    /// Parse manifest text (e.g. an existing package.json)
    pub fn parse(content: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(content)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Follow a dotted key path, e.g. `husky.hooks.pre-commit`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Serialize in canonical form: conventional key order, sorted dependency
    /// maps, two-space indentation and a trailing newline.
    pub fn to_canonical_string(&self) -> Result<String> {
        let mut ordered = Map::new();
        for key in KEY_ORDER {
            if let Some(value) = self.0.get(*key) {
                ordered.insert((*key).to_string(), canonical_value(key, value));
            }
        }
        for (key, value) in &self.0 {
            if !ordered.contains_key(key) {
                ordered.insert(key.clone(), canonical_value(key, value));
            }
        }

        let mut text = serde_json::to_string_pretty(&Value::Object(ordered))?;
        text.push('\n');
        Ok(text)
    }
}

impl From<Map<String, Value>> for Manifest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Manifest {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn canonical_value(key: &str, value: &Value) -> Value {
    match value {
        Value::Object(map) if SORTED_KEYS.contains(&key) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

/// Result of merging one fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub manifest: Manifest,
    pub warnings: Vec<MergeWarning>,
}

/// Applies fragments under a configured mismatch policy
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestMerger {
    policy: MismatchPolicy,
}

impl ManifestMerger {
    pub fn new(policy: MismatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Merge `fragment` over `base` without touching either input.
    ///
    /// Under [`MismatchPolicy::Warn`] each shape mismatch is logged and
    /// returned in [`Merged::warnings`]; under [`MismatchPolicy::Error`] the
    /// first mismatch is returned as an error.
    pub fn merge(&self, base: &Manifest, fragment: &Manifest) -> Result<Merged> {
        let mut warnings = Vec::new();
        let merged = merge_maps(&base.0, &fragment.0, "", &mut warnings);

        if self.policy == MismatchPolicy::Error {
            if let Some(first) = warnings.into_iter().next() {
                return Err(first.into());
            }
            return Ok(Merged {
                manifest: Manifest(merged),
                warnings: Vec::new(),
            });
        }

        for warning in &warnings {
            warn!("Manifest merge type mismatch at {}", warning);
        }
        Ok(Merged {
            manifest: Manifest(merged),
            warnings,
        })
    }
}

/// Merge `fragment` over `base` with the default policy, discarding warnings.
pub fn merge(base: &Manifest, fragment: &Manifest) -> Manifest {
    let mut warnings = Vec::new();
    Manifest(merge_maps(&base.0, &fragment.0, "", &mut warnings))
}

fn merge_maps(
    base: &Map<String, Value>,
    fragment: &Map<String, Value>,
    prefix: &str,
    warnings: &mut Vec<MergeWarning>,
) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, incoming) in fragment {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let value = match out.get(key) {
            Some(existing) => merge_values(existing, incoming, &path, warnings),
            None => incoming.clone(),
        };
        out.insert(key.clone(), value);
    }
    out
}

fn merge_values(
    base: &Value,
    fragment: &Value,
    path: &str,
    warnings: &mut Vec<MergeWarning>,
) -> Value {
    match (base, fragment) {
        (Value::Array(base_items), Value::Array(fragment_items)) => {
            let mut items = base_items.clone();
            items.extend(fragment_items.iter().cloned());
            Value::Array(items)
        }
        (Value::Object(base_map), Value::Object(fragment_map)) => {
            Value::Object(merge_maps(base_map, fragment_map, path, warnings))
        }
        _ => {
            let (base_shape, fragment_shape) = (Shape::of(base), Shape::of(fragment));
            if base_shape != fragment_shape {
                warnings.push(MergeWarning {
                    path: path.to_string(),
                    base: base_shape,
                    fragment: fragment_shape,
                });
            }
            fragment.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: Value) -> Manifest {
        Manifest::from_value(value).unwrap()
    }

    #[test]
    fn test_sequences_concatenate_in_plugin_order() {
        let base = manifest(json!({}));
        let after_x = merge(&base, &manifest(json!({"deps": ["x"]})));
        let after_y = merge(&after_x, &manifest(json!({"deps": ["y"]})));

        assert_eq!(after_y.get("deps"), Some(&json!(["x", "y"])));
    }

    #[test]
    fn test_sequences_are_not_deduplicated() {
        let base = manifest(json!({"files": ["dist"]}));
        let merged = merge(&base, &manifest(json!({"files": ["dist", "lib"]})));
        assert_eq!(merged.get("files"), Some(&json!(["dist", "dist", "lib"])));
    }

    #[test]
    fn test_scalar_overwrite() {
        let merged = merge(
            &manifest(json!({"type": "web"})),
            &manifest(json!({"type": "lib"})),
        );
        assert_eq!(merged.get("type"), Some(&json!("lib")));
    }

    #[test]
    fn test_mappings_merge_recursively() {
        let base = manifest(json!({
            "devDependencies": {"eslint": "^7.24.0", "husky": "^3.0.9"},
            "husky": {"hooks": {"pre-commit": "lint-staged"}}
        }));
        let fragment = manifest(json!({
            "devDependencies": {"eslint": "^8.0.0", "commitizen": "^4.1.2"},
            "husky": {"hooks": {"commit-msg": "commitlint -E HUSKY_GIT_PARAMS"}}
        }));

        let merged = merge(&base, &fragment);

        assert_eq!(
            merged.get("devDependencies"),
            Some(&json!({"eslint": "^8.0.0", "husky": "^3.0.9", "commitizen": "^4.1.2"}))
        );
        assert_eq!(
            merged.get_path("husky.hooks"),
            Some(&json!({
                "pre-commit": "lint-staged",
                "commit-msg": "commitlint -E HUSKY_GIT_PARAMS"
            }))
        );
    }

    #[test]
    fn test_merge_with_empty_fragment_is_identity() {
        let base = manifest(json!({"name": "demo", "scripts": {"build": "tsc"}, "files": ["dist"]}));
        assert_eq!(merge(&base, &Manifest::new()), base);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let base = manifest(json!({"files": ["dist"]}));
        let fragment = manifest(json!({"files": ["lib"]}));
        let base_before = base.clone();
        let fragment_before = fragment.clone();

        let _ = merge(&base, &fragment);

        assert_eq!(base, base_before);
        assert_eq!(fragment, fragment_before);
    }

    #[test]
    fn test_conflicting_scalars_are_order_dependent() {
        let a = manifest(json!({"type": "web"}));
        let b = manifest(json!({"type": "lib"}));

        assert_ne!(merge(&a, &b), merge(&b, &a));
        assert_eq!(merge(&a, &b).get("type"), Some(&json!("lib")));
    }

    #[test]
    fn test_shape_mismatch_warns_and_fragment_wins() {
        let merger = ManifestMerger::new(MismatchPolicy::Warn);
        let base = manifest(json!({"husky": {"hooks": {}}}));
        let fragment = manifest(json!({"husky": {"hooks": "pre-commit"}}));

        let merged = merger.merge(&base, &fragment).unwrap();

        assert_eq!(merged.manifest.get_path("husky.hooks"), Some(&json!("pre-commit")));
        assert_eq!(
            merged.warnings,
            vec![MergeWarning {
                path: "husky.hooks".to_string(),
                base: Shape::Mapping,
                fragment: Shape::Scalar,
            }]
        );
    }

    #[test]
    fn test_shape_mismatch_is_logged_as_warning() {
        testing_logger::setup();
        let merger = ManifestMerger::new(MismatchPolicy::Warn);

        merger
            .merge(
                &manifest(json!({"lint-staged": {"src/**": ["eslint"]}})),
                &manifest(json!({"lint-staged": "eslint"})),
            )
            .unwrap();

        testing_logger::validate(|captured_logs| {
            let warnings: Vec<_> = captured_logs
                .iter()
                .filter(|log| log.level == log::Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].body.contains("'lint-staged'"));
        });
    }

    #[test]
    fn test_shape_mismatch_errors_under_strict_policy() {
        let merger = ManifestMerger::new(MismatchPolicy::Error);
        let base = manifest(json!({"files": ["dist"]}));
        let fragment = manifest(json!({"files": "dist"}));

        let err = merger.merge(&base, &fragment).unwrap_err();
        match err {
            Error::ManifestMerge {
                path,
                base,
                fragment,
            } => {
                assert_eq!(path, "files");
                assert_eq!(base, "sequence");
                assert_eq!(fragment, "scalar");
            }
            other => panic!("expected ManifestMerge, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_policy_passes_clean_merges() {
        let merger = ManifestMerger::new(MismatchPolicy::Error);
        let merged = merger
            .merge(
                &manifest(json!({"scripts": {"build": "tsc"}})),
                &manifest(json!({"scripts": {"lint": "eslint"}})),
            )
            .unwrap();
        assert!(merged.warnings.is_empty());
        assert_eq!(merged.manifest.get_path("scripts.lint"), Some(&json!("eslint")));
    }

    #[test]
    fn test_null_counts_as_scalar() {
        let merger = ManifestMerger::default();
        let merged = merger
            .merge(&manifest(json!({"a": null})), &manifest(json!({"a": 1})))
            .unwrap();
        assert!(merged.warnings.is_empty());
        assert_eq!(merged.manifest.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_new_keys_append_in_fragment_order() {
        let merged = merge(
            &manifest(json!({"name": "demo"})),
            &manifest(json!({"zeta": 1, "alpha": 2})),
        );
        let keys: Vec<&String> = merged.keys().collect();
        assert_eq!(keys, vec!["name", "zeta", "alpha"]);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Manifest::from_value(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_canonical_string_orders_keys_and_sorts_dependencies() {
        let m = manifest(json!({
            "devDependencies": {"b": "1", "a": "2"},
            "custom": true,
            "version": "0.1.0",
            "name": "demo"
        }));

        let text = m.to_canonical_string().unwrap();

        assert_eq!(
            text,
            "{\n  \"name\": \"demo\",\n  \"version\": \"0.1.0\",\n  \"devDependencies\": {\n    \"a\": \"2\",\n    \"b\": \"1\"\n  },\n  \"custom\": true\n}\n"
        );
    }

    #[test]
    fn test_parse_round_trips_through_canonical_form() {
        let text = "{\n  \"name\": \"demo\"\n}\n";
        let parsed = Manifest::parse(text).unwrap();
        assert_eq!(parsed.to_canonical_string().unwrap(), text);
    }
}
