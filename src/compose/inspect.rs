//! Read-only queries over a finished configuration graph
//!
//! ## Process
//!
//! 1.  **Select**: Start from the side's full native configuration, or narrow
//!     it to one rule (`--rule`), one plugin (`--plugin`), or the list of
//!     rule or plugin names (`--rules` / `--plugins`). A rule or plugin that
//!     does not exist selects an empty object.
//!
//! 2.  **Paths**: When paths are given they address the full native
//!     configuration and replace the selection. One path yields the value at
//!     that path; several yield an object keyed by path. A path that does not
//!     resolve yields `null`.

use serde_json::{Map, Value};

use super::graph::ConfigGraph;

/// What part of the graph to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    Full,
    Rule(String),
    Plugin(String),
    Rules,
    Plugins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectQuery {
    pub target: Target,
    pub paths: Vec<String>,
}

impl InspectQuery {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            paths: Vec::new(),
        }
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of an inspection
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub value: Value,
    /// True when a rule listing contained nameless rules
    pub nameless_rules: bool,
}

/// Run `query` against `graph`. Never mutates the graph.
pub fn inspect(graph: &ConfigGraph, query: &InspectQuery) -> Inspection {
    let native = graph.to_native();
    let mut nameless_rules = false;

    let mut value = match &query.target {
        Target::Full => native.clone(),
        Target::Rule(name) => graph
            .find_rule_by_name(name)
            .map(|rule| rule.spec.clone())
            .unwrap_or_else(empty_object),
        Target::Plugin(name) => {
            let index = graph
                .plugins()
                .iter()
                .position(|p| p.name.as_deref() == Some(name.as_str()))
                .or_else(|| {
                    graph
                        .plugins()
                        .iter()
                        .position(|p| p.name.is_none() && p.constructor == *name)
                });
            index
                .and_then(|i| native.get("plugins").and_then(|plugins| plugins.get(i)))
                .cloned()
                .unwrap_or_else(empty_object)
        }
        Target::Rules => {
            nameless_rules = graph.has_nameless_rules();
            Value::Array(
                graph
                    .list_rule_names()
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            )
        }
        Target::Plugins => Value::Array(
            graph
                .list_plugin_names()
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
    };

    match query.paths.as_slice() {
        [] => {}
        [path] => value = select(&native, path).cloned().unwrap_or(Value::Null),
        paths => {
            value = Value::Object(
                paths
                    .iter()
                    .map(|path| {
                        (
                            path.clone(),
                            select(&native, path).cloned().unwrap_or(Value::Null),
                        )
                    })
                    .collect(),
            )
        }
    }

    Inspection {
        value,
        nameless_rules,
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Follow a dotted/bracket path into `value`
pub fn select<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in parse_path(path) {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(&key)?,
            (PathSegment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
            (PathSegment::Index(index), Value::Array(items)) => items.get(index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Represents a segment in a path expression for navigating nested structures
///
/// Path expressions like "module.rules[0].test" or `entry["main"]` are parsed
/// into a sequence of segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key for accessing object members
    Key(String),
    /// A numeric index for accessing array elements
    Index(usize),
}

/// Parse a path string into segments
///
/// Supports:
/// - Dot notation: `module.rules`
/// - Bracket notation: `entry["main"]` or `entry['main']`
/// - Array indices: `plugins[0]` or `module.rules[1].test`
/// - Escaped characters: `foo\.bar` (literal dot)
///
/// # Examples
///
/// ```
/// use zero_scaffold::compose::inspect::parse_path;
///
/// let segments = parse_path("module.rules[0]");
/// assert_eq!(segments.len(), 3);
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    if path.trim().is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }

                match chars.peek().copied() {
                    Some(quote @ ('"' | '\'')) => {
                        chars.next();
                        let mut key = String::new();
                        let mut bracket_escaped = false;
                        while let Some(ch) = chars.next() {
                            if bracket_escaped {
                                key.push(ch);
                                bracket_escaped = false;
                            } else if ch == '\\' {
                                bracket_escaped = true;
                            } else if ch == quote && chars.peek() == Some(&']') {
                                chars.next();
                                break;
                            } else {
                                key.push(ch);
                            }
                        }
                        segments.push(PathSegment::Key(key));
                    }
                    _ => {
                        let mut content = String::new();
                        for next in chars.by_ref() {
                            if next == ']' {
                                break;
                            }
                            content.push(next);
                        }
                        let content = content.trim();
                        if let Ok(index) = content.parse::<usize>() {
                            segments.push(PathSegment::Index(index));
                        } else if !content.is_empty() {
                            segments.push(PathSegment::Key(content.to_string()));
                        }
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}
