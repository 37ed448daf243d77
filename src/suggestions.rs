//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zero_scaffold::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Preset file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::preset_not_found(path));
//! ```

use std::path::Path;

/// Generate an error for when the preset file is not found.
pub fn preset_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Preset file not found: {path}\n\n\
         hint: Use --preset to point at a YAML or JSON preset file\n\
         hint: Set the ZERO_PRESET environment variable\n\
         hint: Omit --preset to use the built-in default for --type",
        path = path.display()
    )
}

/// Generate an error for when the target directory already exists.
pub fn target_exists(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Target directory already exists: {path}\n\n\
         hint: Use --force to replace it\n\
         hint: Choose a different project name",
        path = path.display()
    )
}

/// Generate an error for a non-empty current directory used as the target.
pub fn current_dir_not_empty(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Current directory is not empty: {path}

         hint: Use --force to generate into it, keeping files the project does not replace
         hint: Pass a project name to create a new directory instead",
        path = path.display()
    )
}

/// Generate an error for a project name that cannot be used as a package name.
pub fn invalid_project_name(name: &str, reason: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid project name: \"{name}\"\n\
         error: {reason}\n\n\
         hint: Use lowercase letters, digits, '-', '.' and '_'\n\
         hint: Names must not start with '.' or '_'"
    )
}

/// Generate an error for when no manifest exists where `inspect` looks.
pub fn manifest_not_found(dir: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No package.json found in {dir}\n\n\
         hint: Run inspect from the root of a generated project\n\
         hint: Use --dir to point at the project directory",
        dir = dir.display()
    )
}

/// Generate an error for a manifest that does not record its preset.
pub fn preset_record_missing(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "package.json has no '{key}' field\n\n\
         hint: inspect only works on projects created by `zero create`\n\
         hint: Add the preset used to create the project under '{key}'"
    )
}

/// Generate an error for a side the project does not build.
pub fn unknown_side(side: &str, sides: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(side, sides)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown side: {side}{did_you_mean}\n\n\
         Sides built by this project: {sides}",
        sides = sides.join(", ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub(crate) fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, a_char) in a_chars.iter().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b_chars.len()]
}
