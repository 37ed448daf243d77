//! Template rendering
//!
//! Templates are plain text files with a small set of markers:
//!
//! - `{{ name }}` / `{{ a.b }}` interpolates a context value. Strings are
//!   written verbatim, every other value as compact JSON.
//! - `{{#if name}} .. {{else}} .. {{/if}}` renders a block when the value is
//!   truthy; `{{#unless name}} .. {{/unless}}` when it is not. Missing keys,
//!   `null`, `false`, `0`, `""` and empty arrays/objects are falsy.
//! - `{{! comment }}` is dropped.
//! - `\{{` writes a literal `{{`, for output such as JSX `style={{ .. }}`.
//!   A `}}` with no open tag is plain text.
//!
//! A block or comment tag standing alone on its line removes that whole line,
//! so gates leave no blank lines behind.
//!
//! Referencing an undefined variable is an error only when the reference is
//! actually rendered: a variable inside a block whose gate is off is never
//! looked up.
//!
//! Files that are not UTF-8, or that contain a NUL byte, are treated as
//! assets and copied byte-for-byte. File names starting with a single `_`
//! are written with a leading `.` instead (`_eslintrc` -> `.eslintrc`), and a
//! leading `__` becomes `_`.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::filesystem::{File, FileSet};

/// Variables visible to one render call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext(Map<String, Value>);

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::Template {
                message: format!("Template context must be an object, got {}", other),
                variable: None,
            }),
        }
    }

    /// Add a variable, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Resolve a dotted name; numeric segments index into arrays
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut segments = name.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Where a plugin's templates come from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// A directory on disk, walked recursively
    Dir(PathBuf),
    /// Files compiled into the binary as (relative path, contents)
    Embedded(&'static [(&'static str, &'static [u8])]),
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::Dir(path)
    }
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        TemplateSource::Dir(path.to_path_buf())
    }
}

impl TemplateSource {
    /// Human-readable name used in log and error messages
    pub fn describe(&self) -> String {
        match self {
            TemplateSource::Dir(path) => path.display().to_string(),
            TemplateSource::Embedded(files) => format!("<embedded: {} files>", files.len()),
        }
    }

    fn read_all(&self) -> Result<Vec<SourceFile>> {
        match self {
            TemplateSource::Embedded(files) => {
                let mut out: Vec<SourceFile> = files
                    .iter()
                    .map(|(path, contents)| SourceFile {
                        path: PathBuf::from(path),
                        content: contents.to_vec(),
                        executable: false,
                    })
                    .collect();
                out.sort_by(|a, b| a.path.cmp(&b.path));
                Ok(out)
            }
            TemplateSource::Dir(dir) => read_dir_sorted(dir),
        }
    }
}

struct SourceFile {
    path: PathBuf,
    content: Vec<u8>,
    executable: bool,
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(Error::Filesystem {
            message: format!("Template directory not found: {}", dir.display()),
        });
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("Failed to walk template directory '{}': {}", dir.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| Error::Filesystem {
                message: format!("Template path outside source: {}", e),
            })?
            .to_path_buf();
        let content = fs::read(entry.path())?;
        out.push(SourceFile {
            path: relative,
            content,
            executable: is_executable(entry.path()),
        });
    }
    Ok(out)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}

/// Render every file of `source` into a new file set.
pub fn render(source: &TemplateSource, context: &TemplateContext) -> Result<FileSet> {
    let mut rendered = FileSet::new();
    for file in source.read_all()? {
        let output_path = output_path(&file.path);
        let mut staged = if is_binary(&file.content) {
            debug!("Copying asset {} verbatim", file.path.display());
            File::raw(file.content)
        } else {
            let text = String::from_utf8_lossy(&file.content);
            let body = render_str(&text, context).map_err(|e| at_path(e, &file.path))?;
            File::from_string(&body)
        };
        if file.executable {
            staged = staged.with_permissions(0o755);
        }
        rendered.add_file(output_path, staged)?;
    }
    Ok(rendered)
}

/// Render a single template file from disk
pub fn render_file(path: &Path, context: &TemplateContext) -> Result<String> {
    let text = fs::read_to_string(path)?;
    render_str(&text, context).map_err(|e| at_path(e, path))
}

/// Render template text
pub fn render_str(template: &str, context: &TemplateContext) -> Result<String> {
    Template::parse(template)?.render(context)
}

fn at_path(error: Error, path: &Path) -> Error {
    match error {
        Error::Template { message, variable } => Error::Template {
            message: format!("{}: {}", path.display(), message),
            variable,
        },
        other => other,
    }
}

fn is_binary(content: &[u8]) -> bool {
    content.contains(&0) || std::str::from_utf8(content).is_err()
}

/// Apply the dotfile naming convention to the final path component
pub fn output_path(path: &Path) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    let renamed = if let Some(rest) = name.strip_prefix("__") {
        format!("_{}", rest)
    } else if let Some(rest) = name.strip_prefix('_') {
        format!(".{}", rest)
    } else {
        return path.to_path_buf();
    };
    path.with_file_name(renamed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Unless,
}

impl BlockKind {
    fn keyword(&self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Unless => "unless",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    Block {
        kind: BlockKind,
        name: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug)]
enum Tag {
    Var(String),
    Open(BlockKind, String),
    Else,
    Close(BlockKind),
    Comment,
}

impl Tag {
    fn is_standalone_candidate(&self) -> bool {
        !matches!(self, Tag::Var(_))
    }
}

enum Token {
    Text(String),
    Tag(Tag),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let nodes = build_tree(tokens)?;
        Ok(Self { nodes })
    }

    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::new();
        render_nodes(&self.nodes, context, &mut out)?;
        Ok(out)
    }
}

fn template_error(message: impl Into<String>) -> Error {
    Error::Template {
        message: message.into(),
        variable: None,
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = source[cursor..].find("{{") {
        let start = cursor + offset;
        let inner_start = start + 2;
        if start > cursor && source[..start].ends_with('\\') {
            tokens.push(Token::Text(format!("{}{{{{", &source[cursor..start - 1])));
            cursor = inner_start;
            continue;
        }
        let close = source[inner_start..].find("}}").ok_or_else(|| {
            let line = source[..start].matches('\n').count() + 1;
            template_error(format!("Unclosed tag on line {}", line))
        })?;
        let end = inner_start + close + 2;
        let tag = parse_tag(source[inner_start..inner_start + close].trim())?;

        let (text_end, next_cursor) = if tag.is_standalone_candidate() {
            standalone_span(source, start, end).unwrap_or((start, end))
        } else {
            (start, end)
        };

        let text_end = text_end.max(cursor);
        if text_end > cursor {
            tokens.push(Token::Text(source[cursor..text_end].to_string()));
        }
        tokens.push(Token::Tag(tag));
        cursor = next_cursor;
    }

    if cursor < source.len() {
        tokens.push(Token::Text(source[cursor..].to_string()));
    }
    Ok(tokens)
}

/// If the tag at `start..end` is alone on its line, return the span of the
/// whole line (leading indentation through the newline).
fn standalone_span(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = source[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(source.len());

    let before = &source[line_start..start];
    let after = &source[end..line_end];
    if before.trim().is_empty() && after.trim().is_empty() {
        Some((line_start, line_end))
    } else {
        None
    }
}

fn parse_tag(inner: &str) -> Result<Tag> {
    if inner.starts_with('!') {
        return Ok(Tag::Comment);
    }
    if let Some(rest) = inner.strip_prefix('#') {
        let mut parts = rest.split_whitespace();
        let kind = match parts.next() {
            Some("if") => BlockKind::If,
            Some("unless") => BlockKind::Unless,
            Some(other) => return Err(template_error(format!("Unknown block '#{}'", other))),
            None => return Err(template_error("Empty block tag")),
        };
        let name = parts
            .next()
            .ok_or_else(|| template_error(format!("'#{}' needs a variable", kind.keyword())))?;
        if parts.next().is_some() {
            return Err(template_error(format!(
                "'#{}' takes a single variable",
                kind.keyword()
            )));
        }
        validate_name(name)?;
        return Ok(Tag::Open(kind, name.to_string()));
    }
    if let Some(rest) = inner.strip_prefix('/') {
        return match rest.trim() {
            "if" => Ok(Tag::Close(BlockKind::If)),
            "unless" => Ok(Tag::Close(BlockKind::Unless)),
            other => Err(template_error(format!("Unknown closing tag '/{}'", other))),
        };
    }
    if inner == "else" {
        return Ok(Tag::Else);
    }
    validate_name(inner)?;
    Ok(Tag::Var(inner.to_string()))
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$')
        });
    if valid {
        Ok(())
    } else {
        Err(Error::Template {
            message: "Invalid variable name".to_string(),
            variable: Some(name.to_string()),
        })
    }
}

struct OpenBlock {
    kind: BlockKind,
    name: String,
    then: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

fn build_tree(tokens: Vec<Token>) -> Result<Vec<Node>> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();

    fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenBlock]) -> &'a mut Vec<Node> {
        match stack.last_mut() {
            Some(block) => match block.otherwise.as_mut() {
                Some(otherwise) => otherwise,
                None => &mut block.then,
            },
            None => root,
        }
    }

    for token in tokens {
        match token {
            Token::Text(text) => current(&mut root, &mut stack).push(Node::Text(text)),
            Token::Tag(Tag::Comment) => {}
            Token::Tag(Tag::Var(name)) => current(&mut root, &mut stack).push(Node::Var(name)),
            Token::Tag(Tag::Open(kind, name)) => stack.push(OpenBlock {
                kind,
                name,
                then: Vec::new(),
                otherwise: None,
            }),
            Token::Tag(Tag::Else) => match stack.last_mut() {
                Some(block) if block.otherwise.is_none() => block.otherwise = Some(Vec::new()),
                Some(block) => {
                    return Err(template_error(format!(
                        "Duplicate 'else' in '#{} {}'",
                        block.kind.keyword(),
                        block.name
                    )))
                }
                None => return Err(template_error("'else' outside of a block")),
            },
            Token::Tag(Tag::Close(kind)) => {
                let block = stack.pop().ok_or_else(|| {
                    template_error(format!("'/{}' without matching open tag", kind.keyword()))
                })?;
                if block.kind != kind {
                    return Err(template_error(format!(
                        "'#{} {}' closed by '/{}'",
                        block.kind.keyword(),
                        block.name,
                        kind.keyword()
                    )));
                }
                let node = Node::Block {
                    kind: block.kind,
                    name: block.name,
                    then: block.then,
                    otherwise: block.otherwise.unwrap_or_default(),
                };
                current(&mut root, &mut stack).push(node);
            }
        }
    }

    if let Some(block) = stack.pop() {
        return Err(Error::Template {
            message: format!("Unclosed '#{}' block", block.kind.keyword()),
            variable: Some(block.name),
        });
    }
    Ok(root)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn render_nodes(nodes: &[Node], context: &TemplateContext, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => {
                let value = context.lookup(name).ok_or_else(|| Error::Template {
                    message: "Undefined variable".to_string(),
                    variable: Some(name.clone()),
                })?;
                match value {
                    Value::String(s) => out.push_str(s),
                    other => out.push_str(&serde_json::to_string(other)?),
                }
            }
            Node::Block {
                kind,
                name,
                then,
                otherwise,
            } => {
                let gate = truthy(context.lookup(name));
                let take_then = match kind {
                    BlockKind::If => gate,
                    BlockKind::Unless => !gate,
                };
                let branch = if take_then { then } else { otherwise };
                render_nodes(branch, context, out)?;
            }
        }
    }
    Ok(())
}
