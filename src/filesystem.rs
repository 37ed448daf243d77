//! In-memory file set used to stage a generated project before it is written
//!
//! Every render call produces a [`FileSet`]; the generator merges them in
//! plugin order into one running set and flushes it to disk exactly once.
//! Paths are kept in a `BTreeMap` so iteration order, and therefore the write
//! order and any listing, is deterministic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default permissions for generated files
pub const DEFAULT_PERMISSIONS: u32 = 0o644;

/// A staged file: content plus the metadata needed to write it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// True when the content was copied byte-for-byte instead of rendered
    pub raw: bool,
    /// Unix permission bits applied on write
    pub permissions: u32,
}

impl File {
    /// Create a rendered (text) file
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            raw: false,
            permissions: DEFAULT_PERMISSIONS,
        }
    }

    /// Create a file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Create a raw file whose bytes bypassed interpolation
    pub fn raw(content: Vec<u8>) -> Self {
        Self {
            raw: true,
            ..Self::new(content)
        }
    }

    /// Set the permission bits
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Content as UTF-8 text, if it is text
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// A path that was written by more than one contributor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub path: PathBuf,
    /// Contributor whose content was replaced
    pub previous: Option<String>,
    /// Contributor whose content now wins
    pub current: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    file: File,
    origin: Option<String>,
}

/// Output-relative path -> staged file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<PathBuf, Entry>,
}

impl FileSet {
    /// Create a new empty file set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file. Paths must be relative and must not escape the
    /// output root.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) -> Result<()> {
        self.insert(path.as_ref(), file, None).map(|_| ())
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get a file by path
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&File> {
        self.files.get(path.as_ref()).map(|entry| &entry.file)
    }

    /// Text content of a file, if present and UTF-8
    pub fn read_string<P: AsRef<Path>>(&self, path: P) -> Option<&str> {
        self.get_file(path).and_then(File::as_str)
    }

    /// Which contributor last wrote a path
    pub fn origin<P: AsRef<Path>>(&self, path: P) -> Option<&str> {
        self.files
            .get(path.as_ref())
            .and_then(|entry| entry.origin.as_deref())
    }

    /// Check if a file exists
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// All paths, sorted
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Tag every file in the set with the contributor that produced it
    pub fn with_origin(mut self, origin: &str) -> Self {
        for entry in self.files.values_mut() {
            entry.origin = Some(origin.to_string());
        }
        self
    }

    /// Merge another set into this one. The incoming file wins for a shared
    /// path; content is never concatenated. Returns the paths that were
    /// replaced.
    pub fn merge(&mut self, other: FileSet) -> Vec<Override> {
        let mut overrides = Vec::new();
        for (path, entry) in other.files {
            if let Some(previous) = self.files.get(&path) {
                overrides.push(Override {
                    path: path.clone(),
                    previous: previous.origin.clone(),
                    current: entry.origin.clone(),
                });
            }
            self.files.insert(path, entry);
        }
        overrides
    }

    /// Iterate over all files as (path, file) pairs in path order
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &File)> {
        self.files.iter().map(|(path, entry)| (path, &entry.file))
    }

    fn insert(&mut self, path: &Path, file: File, origin: Option<String>) -> Result<Option<File>> {
        validate_relative(path)?;
        Ok(self
            .files
            .insert(path.to_path_buf(), Entry { file, origin })
            .map(|entry| entry.file))
    }
}

fn validate_relative(path: &Path) -> Result<()> {
    use std::path::Component;

    if path.as_os_str().is_empty() {
        return Err(Error::Filesystem {
            message: "Empty output path".to_string(),
        });
    }
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(Error::Filesystem {
            message: format!(
                "Output path must stay inside the project: {}",
                path.display()
            ),
        });
    }
    Ok(())
}
