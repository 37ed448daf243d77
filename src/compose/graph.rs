//! Per-side build configuration graph
//!
//! A [`ConfigGraph`] holds the entry points, module rules, build-tool plugins
//! and top-level options for one side. Every change goes through
//! [`ConfigGraph::apply`], which records the mutation together with the
//! contributor that made it before applying it. The log makes it possible to
//! tell, after the fact, which contributors touched the same named node.
//!
//! Rules and plugins may be added without a name. Such nodes take part in
//! the output but cannot be looked up, replaced or removed, and listings show
//! them as [`NAMELESS_RULE`] / [`NAMELESS_PLUGIN`].

use std::collections::BTreeMap;

use log::debug;
use serde_json::{Map, Value};

/// Listing entry for a rule added without a name
pub const NAMELESS_RULE: &str = "Nameless Rule (*)";

/// Listing entry for a build plugin added without a name
pub const NAMELESS_PLUGIN: &str = "Nameless Plugin (*)";

/// A module rule
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: Option<String>,
    pub spec: Value,
}

/// A build-tool plugin: constructor name plus constructor arguments
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlugin {
    pub name: Option<String>,
    pub constructor: String,
    pub args: Vec<Value>,
}

impl BuildPlugin {
    fn to_native(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("__pluginName".to_string(), Value::String(name.clone()));
        }
        map.insert(
            "__pluginConstructorName".to_string(),
            Value::String(self.constructor.clone()),
        );
        map.insert("__pluginArgs".to_string(), Value::Array(self.args.clone()));
        Value::Object(map)
    }
}

/// One recorded change to a graph
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddEntry {
        name: String,
        paths: Vec<String>,
    },
    AddRule {
        name: Option<String>,
        spec: Value,
    },
    AddBuildPlugin {
        name: Option<String>,
        constructor: String,
        args: Vec<Value>,
    },
    RemoveRule {
        name: String,
    },
    RemoveBuildPlugin {
        name: String,
    },
    SetOption {
        key: String,
        value: Value,
    },
}

impl Mutation {
    /// The named node this mutation touches, if any
    pub fn target(&self) -> Option<(NodeKind, &str)> {
        match self {
            Mutation::AddEntry { name, .. } => Some((NodeKind::Entry, name.as_str())),
            Mutation::AddRule { name, .. } => name.as_deref().map(|n| (NodeKind::Rule, n)),
            Mutation::AddBuildPlugin { name, .. } => {
                name.as_deref().map(|n| (NodeKind::Plugin, n))
            }
            Mutation::RemoveRule { name } => Some((NodeKind::Rule, name.as_str())),
            Mutation::RemoveBuildPlugin { name } => Some((NodeKind::Plugin, name.as_str())),
            Mutation::SetOption { key, .. } => Some((NodeKind::Option, key.as_str())),
        }
    }
}

/// Kind of addressable node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    Entry,
    Rule,
    Plugin,
    Option,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Entry => "entry",
            NodeKind::Rule => "rule",
            NodeKind::Plugin => "plugin",
            NodeKind::Option => "option",
        }
    }
}

/// A mutation and the contributor that made it
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub contributor: String,
    pub mutation: Mutation,
}

/// A named node touched by more than one contributor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: NodeKind,
    pub name: String,
    /// Distinct contributors in the order they first touched the node
    pub contributors: Vec<String>,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' touched by {}",
            self.kind.as_str(),
            self.name,
            self.contributors.join(", ")
        )
    }
}

/// The configuration graph of one side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigGraph {
    side: String,
    entries: Vec<(String, Vec<String>)>,
    rules: Vec<Rule>,
    plugins: Vec<BuildPlugin>,
    options: Map<String, Value>,
    log: Vec<MutationRecord>,
}

impl ConfigGraph {
    pub fn new(side: impl Into<String>) -> Self {
        Self {
            side: side.into(),
            ..Self::default()
        }
    }

    pub fn side(&self) -> &str {
        &self.side
    }

    /// Record `mutation` under `contributor` and apply it.
    ///
    /// Adding a rule or plugin under a name that already exists replaces the
    /// node in place. Removing a name that does not exist is a no-op.
    pub fn apply(&mut self, contributor: &str, mutation: Mutation) {
        debug!("[{}] {} -> {:?}", self.side, contributor, mutation);
        self.log.push(MutationRecord {
            contributor: contributor.to_string(),
            mutation: mutation.clone(),
        });

        match mutation {
            Mutation::AddEntry { name, paths } => {
                match self.entries.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, existing)) => *existing = paths,
                    None => self.entries.push((name, paths)),
                }
            }
            Mutation::AddRule { name, spec } => {
                let rule = Rule { name, spec };
                match rule.name.as_deref().and_then(|n| self.rule_index(n)) {
                    Some(index) => self.rules[index] = rule,
                    None => self.rules.push(rule),
                }
            }
            Mutation::AddBuildPlugin {
                name,
                constructor,
                args,
            } => {
                let plugin = BuildPlugin {
                    name,
                    constructor,
                    args,
                };
                match plugin.name.as_deref().and_then(|n| self.plugin_index(n)) {
                    Some(index) => self.plugins[index] = plugin,
                    None => self.plugins.push(plugin),
                }
            }
            Mutation::RemoveRule { name } => {
                if let Some(index) = self.rule_index(&name) {
                    self.rules.remove(index);
                }
            }
            Mutation::RemoveBuildPlugin { name } => {
                if let Some(index) = self.plugin_index(&name) {
                    self.plugins.remove(index);
                }
            }
            Mutation::SetOption { key, value } => {
                self.options.insert(key, value);
            }
        }
    }

    fn rule_index(&self, name: &str) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| rule.name.as_deref() == Some(name))
    }

    fn plugin_index(&self, name: &str) -> Option<usize> {
        self.plugins
            .iter()
            .position(|plugin| plugin.name.as_deref() == Some(name))
    }

    pub fn find_rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rule_index(name).map(|index| &self.rules[index])
    }

    pub fn find_plugin_by_name(&self, name: &str) -> Option<&BuildPlugin> {
        self.plugin_index(name).map(|index| &self.plugins[index])
    }

    /// Rule names in graph order; nameless rules appear as [`NAMELESS_RULE`]
    pub fn list_rule_names(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|rule| rule.name.clone().unwrap_or_else(|| NAMELESS_RULE.to_string()))
            .collect()
    }

    /// Plugin names in graph order; nameless plugins appear as [`NAMELESS_PLUGIN`]
    pub fn list_plugin_names(&self) -> Vec<String> {
        self.plugins
            .iter()
            .map(|plugin| {
                plugin
                    .name
                    .clone()
                    .unwrap_or_else(|| NAMELESS_PLUGIN.to_string())
            })
            .collect()
    }

    pub fn entry(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, paths)| paths.as_slice())
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn plugins(&self) -> &[BuildPlugin] {
        &self.plugins
    }

    pub fn has_nameless_rules(&self) -> bool {
        self.rules.iter().any(|rule| rule.name.is_none())
    }

    /// Every mutation in application order
    pub fn log(&self) -> &[MutationRecord] {
        &self.log
    }

    /// Named nodes touched by more than one distinct contributor, sorted by
    /// kind and name
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut touched: BTreeMap<(NodeKind, &str), Vec<&str>> = BTreeMap::new();
        for record in &self.log {
            if let Some(target) = record.mutation.target() {
                let contributors = touched.entry(target).or_default();
                if !contributors.contains(&record.contributor.as_str()) {
                    contributors.push(&record.contributor);
                }
            }
        }

        touched
            .into_iter()
            .filter(|(_, contributors)| contributors.len() > 1)
            .map(|((kind, name), contributors)| Conflict {
                kind,
                name: name.to_string(),
                contributors: contributors.into_iter().map(String::from).collect(),
            })
            .collect()
    }

    /// The bundler's native configuration shape.
    ///
    /// Top-level options come first in the order they were set, followed by
    /// `entry`, `module.rules` and `plugins` when non-empty. Those three keys
    /// take precedence over options of the same name.
    pub fn to_native(&self) -> Value {
        let mut config = self.options.clone();

        if !self.entries.is_empty() {
            let entry: Map<String, Value> = self
                .entries
                .iter()
                .map(|(name, paths)| {
                    (
                        name.clone(),
                        Value::Array(paths.iter().cloned().map(Value::String).collect()),
                    )
                })
                .collect();
            config.insert("entry".to_string(), Value::Object(entry));
        }

        if !self.rules.is_empty() {
            let rules = self.rules.iter().map(|rule| rule.spec.clone()).collect();
            let mut module = Map::new();
            module.insert("rules".to_string(), Value::Array(rules));
            config.insert("module".to_string(), Value::Object(module));
        }

        if !self.plugins.is_empty() {
            let plugins = self.plugins.iter().map(BuildPlugin::to_native).collect();
            config.insert("plugins".to_string(), Value::Array(plugins));
        }

        Value::Object(config)
    }

    /// Human-readable dump of the graph.
    ///
    /// Every rule and plugin is preceded by a comment naming how to address
    /// it, and plugins are shown as constructor calls.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("// side: {}\n", self.side));
        out.push_str("{\n");

        let mut sections: Vec<String> = Vec::new();
        for (key, value) in &self.options {
            if matches!(key.as_str(), "entry" | "module" | "plugins") {
                continue;
            }
            sections.push(format!("  {}: {}", key, indent_json(value, 1)));
        }

        if !self.entries.is_empty() {
            let mut section = String::from("  entry: {\n");
            let lines: Vec<String> = self
                .entries
                .iter()
                .map(|(name, paths)| {
                    let paths = Value::Array(paths.iter().cloned().map(Value::String).collect());
                    format!("    {}: {}", quote(name), indent_json(&paths, 2))
                })
                .collect();
            section.push_str(&lines.join(",\n"));
            section.push_str("\n  }");
            sections.push(section);
        }

        if !self.rules.is_empty() {
            let mut section = String::from("  module: {\n    rules: [\n");
            let items: Vec<String> = self
                .rules
                .iter()
                .map(|rule| {
                    let label = match &rule.name {
                        Some(name) => format!("config.module.rule('{}')", name),
                        None => NAMELESS_RULE.to_string(),
                    };
                    format!("      /* {} */\n      {}", label, indent_json(&rule.spec, 3))
                })
                .collect();
            section.push_str(&items.join(",\n"));
            section.push_str("\n    ]\n  }");
            sections.push(section);
        }

        if !self.plugins.is_empty() {
            let mut section = String::from("  plugins: [\n");
            let items: Vec<String> = self
                .plugins
                .iter()
                .map(|plugin| {
                    let label = match &plugin.name {
                        Some(name) => format!("config.plugin('{}')", name),
                        None => NAMELESS_PLUGIN.to_string(),
                    };
                    let args: Vec<String> =
                        plugin.args.iter().map(|arg| indent_json(arg, 2)).collect();
                    format!(
                        "    /* {} */\n    new {}({})",
                        label,
                        plugin.constructor,
                        args.join(", ")
                    )
                })
                .collect();
            section.push_str(&items.join(",\n"));
            section.push_str("\n  ]");
            sections.push(section);
        }

        out.push_str(&sections.join(",\n"));
        if !sections.is_empty() {
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn quote(key: &str) -> String {
    Value::String(key.to_string()).to_string()
}

/// Pretty JSON with continuation lines indented by `level` steps
fn indent_json(value: &Value, level: usize) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let pad = "  ".repeat(level);
    pretty.replace('\n', &format!("\n{}", pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_rule(graph: &mut ConfigGraph, who: &str, name: Option<&str>, spec: Value) {
        graph.apply(
            who,
            Mutation::AddRule {
                name: name.map(String::from),
                spec,
            },
        );
    }

    #[test]
    fn test_named_rule_is_replaced_not_duplicated() {
        let mut graph = ConfigGraph::new("client");
        add_rule(&mut graph, "a", Some("ts"), json!({"test": "\\.ts$"}));
        add_rule(&mut graph, "a", Some("ts"), json!({"test": "\\.tsx?$"}));

        assert_eq!(graph.list_rule_names(), vec!["ts"]);
        assert_eq!(
            graph.find_rule_by_name("ts").unwrap().spec,
            json!({"test": "\\.tsx?$"})
        );
    }

    #[test]
    fn test_nameless_rules_listed_with_sentinel_and_unaddressable() {
        let mut graph = ConfigGraph::new("client");
        add_rule(&mut graph, "a", None, json!({"test": "\\.css$"}));
        add_rule(&mut graph, "b", None, json!({"test": "\\.less$"}));

        assert_eq!(graph.list_rule_names(), vec![NAMELESS_RULE, NAMELESS_RULE]);
        assert_eq!(graph.rules().len(), 2);
        assert!(graph.find_rule_by_name(NAMELESS_RULE).is_none());
        assert!(graph.has_nameless_rules());
    }

    #[test]
    fn test_replacement_keeps_position() {
        let mut graph = ConfigGraph::new("client");
        add_rule(&mut graph, "a", Some("ts"), json!(1));
        add_rule(&mut graph, "a", Some("css"), json!(2));
        add_rule(&mut graph, "b", Some("ts"), json!(3));

        assert_eq!(graph.list_rule_names(), vec!["ts", "css"]);
        assert_eq!(graph.to_native()["module"]["rules"], json!([3, 2]));
    }

    #[test]
    fn test_remove_rule_and_plugin() {
        let mut graph = ConfigGraph::new("client");
        add_rule(&mut graph, "a", Some("ts"), json!({}));
        graph.apply(
            "a",
            Mutation::AddBuildPlugin {
                name: Some("eslint".into()),
                constructor: "EslintWebpackPlugin".into(),
                args: vec![],
            },
        );
        graph.apply("b", Mutation::RemoveRule { name: "ts".into() });
        graph.apply(
            "b",
            Mutation::RemoveBuildPlugin {
                name: "eslint".into(),
            },
        );
        graph.apply(
            "b",
            Mutation::RemoveRule {
                name: "missing".into(),
            },
        );

        assert!(graph.list_rule_names().is_empty());
        assert!(graph.find_plugin_by_name("eslint").is_none());
        assert_eq!(graph.to_native(), json!({}));
    }

    #[test]
    fn test_conflicts_report_distinct_contributors() {
        let mut graph = ConfigGraph::new("client");
        add_rule(&mut graph, "eslint", Some("ts"), json!(1));
        add_rule(&mut graph, "eslint", Some("ts"), json!(2));
        add_rule(&mut graph, "eslint", Some("css"), json!(3));
        add_rule(&mut graph, "custom", Some("ts"), json!(4));
        add_rule(&mut graph, "custom", None, json!(5));
        add_rule(&mut graph, "other", None, json!(6));

        assert_eq!(
            graph.conflicts(),
            vec![Conflict {
                kind: NodeKind::Rule,
                name: "ts".to_string(),
                contributors: vec!["eslint".to_string(), "custom".to_string()],
            }]
        );
        assert_eq!(graph.log().len(), 6);
        assert_eq!(graph.log()[3].contributor, "custom");
    }

    #[test]
    fn test_to_native_shape() {
        let mut graph = ConfigGraph::new("client");
        graph.apply(
            "project",
            Mutation::SetOption {
                key: "mode".into(),
                value: json!("production"),
            },
        );
        graph.apply(
            "project",
            Mutation::AddEntry {
                name: "main".into(),
                paths: vec!["./src/index.tsx".into()],
            },
        );
        add_rule(&mut graph, "project", Some("ts"), json!({"test": "\\.tsx?$"}));
        graph.apply(
            "eslint",
            Mutation::AddBuildPlugin {
                name: Some("eslint".into()),
                constructor: "EslintWebpackPlugin".into(),
                args: vec![json!({"extensions": ["ts", "tsx"]})],
            },
        );

        let native = graph.to_native();
        assert_eq!(native["mode"], json!("production"));
        assert_eq!(native["entry"]["main"], json!(["./src/index.tsx"]));
        assert_eq!(native["module"]["rules"][0]["test"], json!("\\.tsx?$"));
        assert_eq!(native["plugins"][0]["__pluginName"], json!("eslint"));
        assert_eq!(
            native["plugins"][0]["__pluginArgs"],
            json!([{"extensions": ["ts", "tsx"]}])
        );

        let keys: Vec<&String> = native.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["mode", "entry", "module", "plugins"]);
    }

    #[test]
    fn test_explain_annotates_named_nodes() {
        let mut graph = ConfigGraph::new("client");
        add_rule(&mut graph, "project", Some("ts"), json!({"test": "\\.tsx?$"}));
        add_rule(&mut graph, "project", None, json!({"test": "\\.css$"}));
        graph.apply(
            "stylelint",
            Mutation::AddBuildPlugin {
                name: Some("style-lint-plugin".into()),
                constructor: "StylelintPlugin".into(),
                args: vec![json!({"emitErrors": true})],
            },
        );

        let before = graph.clone();
        let text = graph.explain();
        assert!(text.starts_with("// side: client\n{\n"));
        assert!(text.contains("/* config.module.rule('ts') */"));
        assert!(text.contains(&format!("/* {} */", NAMELESS_RULE)));
        assert!(text.contains("/* config.plugin('style-lint-plugin') */"));
        assert!(text.contains("new StylelintPlugin({"));
        assert!(text.ends_with("}\n"));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_explain_empty_graph() {
        insta::assert_snapshot!(ConfigGraph::new("server").explain().trim_end(), @r"
        // side: server
        {
        }
        ");
    }
}
