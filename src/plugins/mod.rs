//! Feature plugins
//!
//! A plugin contributes to a generated project in two independent phases:
//!
//! - [`Plugin::generate`] runs once while the project is created. It extends
//!   the manifest and renders templates through the [`GeneratorApi`].
//! - [`Plugin::configure`] runs once per side whenever the build
//!   configuration is composed. It mutates that side's graph through a
//!   [`SideConfig`] handle. Plugins with nothing to configure keep the
//!   default no-op.
//!
//! The built-in plugins are registered in [`builtin_registrations`].

pub mod commit;
pub mod eslint;
pub mod fetch;
pub mod project;
pub mod stylelint;

use serde_json::{json, Value};

use crate::compose::SideConfig;
use crate::error::{Error, Result};
use crate::generator::GeneratorApi;
use crate::preset::Options;
use crate::registry::Registration;

/// A unit of generation and configuration logic
pub trait Plugin: std::fmt::Debug {
    /// Identifier the plugin is registered under
    fn id(&self) -> &'static str;

    /// Contribute manifest fragments and rendered files
    fn generate(&self, api: &mut GeneratorApi<'_>, options: &Options) -> Result<()>;

    /// Contribute to one side's build configuration
    fn configure(&self, _config: &mut SideConfig<'_>, _options: &Options) -> Result<()> {
        Ok(())
    }
}

/// Registration table of every built-in plugin
pub fn builtin_registrations() -> Vec<Registration> {
    vec![
        Registration::new(
            project::ID,
            "Project skeleton, base manifest and bundler entry points",
            || Box::new(project::ProjectPlugin),
        )
        .with_defaults(json!({ "type": "web", "version": "0.1.0" })),
        Registration::new(
            eslint::ID,
            "ESLint + Prettier for TypeScript sources",
            || Box::new(eslint::EslintPlugin),
        )
        .with_defaults(json!({ "config": "leap" })),
        Registration::new(
            stylelint::ID,
            "Stylelint for CSS and Less sources",
            || Box::new(stylelint::StylelintPlugin),
        ),
        Registration::new(
            unit_test::ID,
            "Unit testing based on Jest + Enzyme",
            || Box::new(unit_test::UnitTestPlugin),
        ),
        Registration::new(
            fetch::ID,
            "Async data fetching based on Axios + useRequest",
            || Box::new(fetch::FetchPlugin),
        ),
        Registration::new(
            commit::ID,
            "Commitizen prompts and commitlint hooks",
            || Box::new(commit::CommitPlugin),
        )
        .implies(&[eslint::ID]),
    ]
}

/// Read an optional string option
pub(crate) fn string_option<'a>(
    plugin: &str,
    options: &'a Options,
    key: &str,
) -> Result<Option<&'a str>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::InvalidOption {
            plugin: plugin.to_string(),
            message: format!("'{}' must be a string, got {}", key, other),
        }),
    }
}
