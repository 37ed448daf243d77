//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and preset
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_preset(presets::LIB_MINIMAL);
//!     fixture.command().arg("create").arg("demo").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::presets;
    pub use super::TestFixture;
}

/// Preset file snippets for testing.
#[allow(dead_code)]
pub mod presets {
    /// A library with nothing but the project skeleton.
    pub const LIB_MINIMAL: &str = r#"
plugins:
  project:
    type: lib
"#;

    /// A web application with linting on both sides.
    pub const WEB_ESLINT: &str = r#"
plugins:
  project:
    type: web
  eslint:
    config: airbnb
  stylelint: {}
"#;

    /// Every built-in plugin enabled for a web application.
    pub const WEB_FULL: &str = r#"
plugins:
  project:
    type: web
  eslint: {}
  stylelint: {}
  unit-test: {}
  fetch:
    baseURL: /v2
  commit: {}
"#;

    /// Names a plugin that is not registered.
    pub const UNKNOWN_PLUGIN: &str = r#"
plugins:
  project: {}
  eslnt: {}
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "plugins: [unclosed";

    /// Strict merge requested through the settings block.
    pub const STRICT: &str = r#"
settings:
  on_type_mismatch: error
plugins:
  project:
    type: lib
  commit: {}
"#;
}

/// A test fixture that provides a temporary directory with an optional
/// preset file.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().with_preset(presets::WEB_ESLINT);
///
/// fixture
///     .command()
///     .args(["create", "shop", "--preset"])
///     .arg(fixture.preset_path())
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `preset.yaml` file with the given content.
    pub fn with_preset(self, content: &str) -> Self {
        self.with_file("preset.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the preset file.
    pub fn preset_path(&self) -> PathBuf {
        self.temp_dir.path().join("preset.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    ///
    /// `ZERO_PRESET` is cleared so a value in the caller's environment does
    /// not leak into the test.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("zero");
        cmd.current_dir(self.path()).env_remove("ZERO_PRESET");
        cmd
    }

    /// Create a project named `name` from the fixture's preset file.
    #[allow(dead_code)]
    pub fn create(&self, name: &str) -> assert_cmd::assert::Assert {
        self.command()
            .arg("create")
            .arg(name)
            .arg("--preset")
            .arg(self.preset_path())
            .assert()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_preset() {
        let fixture = TestFixture::new().with_preset(presets::LIB_MINIMAL);
        assert!(fixture.preset_path().exists());
    }

    #[test]
    fn test_presets_are_valid_yaml() {
        let presets = [
            presets::LIB_MINIMAL,
            presets::WEB_ESLINT,
            presets::WEB_FULL,
            presets::UNKNOWN_PLUGIN,
            presets::STRICT,
        ];

        for preset in presets {
            serde_yaml::from_str::<serde_yaml::Value>(preset).expect("Preset should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(presets::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
