//! Plugin registration and preset resolution
//!
//! The registry is an explicit table built at startup. Each
//! [`Registration`] maps an identifier to a constructor, optional default
//! options and a list of plugins it implies. Resolving a preset is a pure
//! lookup: nothing is read from disk and no plugin code runs.
//!
//! ## Process
//!
//! 1.  **Lookup**: Every identifier in the preset must be registered,
//!     otherwise resolution fails with [`Error::UnknownPlugin`] before any
//!     plugin is constructed.
//!
//! 2.  **Order**: Plugins keep preset declaration order, except `project`,
//!     which always comes first (and is added with its defaults when the
//!     preset omits it).
//!
//! 3.  **Implications**: A plugin that implies another plugin the preset
//!     does not enable gets that plugin inserted, with default options,
//!     immediately before itself.
//!
//! 4.  **Options**: Registered defaults fill in keys the preset leaves out.

use std::collections::HashSet;

use log::debug;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::plugins::{builtin_registrations, Plugin};
use crate::preset::{Options, Preset, PROJECT_PLUGIN};
use crate::suggestions;

/// Constructor stored in the registration table
pub type PluginConstructor = fn() -> Box<dyn Plugin>;

/// One entry of the registration table
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: &'static str,
    pub description: &'static str,
    pub constructor: PluginConstructor,
    pub defaults: Options,
    pub implies: &'static [&'static str],
}

impl Registration {
    pub fn new(
        id: &'static str,
        description: &'static str,
        constructor: PluginConstructor,
    ) -> Self {
        Self {
            id,
            description,
            constructor,
            defaults: Options::new(),
            implies: &[],
        }
    }

    /// Default options; non-object values are ignored
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.defaults = map;
        }
        self
    }

    pub fn implies(mut self, ids: &'static [&'static str]) -> Self {
        self.implies = ids;
        self
    }
}

/// A plugin paired with the options it runs with
#[derive(Debug)]
pub struct ResolvedPlugin {
    pub id: String,
    pub plugin: Box<dyn Plugin>,
    pub options: Options,
}

/// Identifier -> registration table
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    registrations: Vec<Registration>,
}

impl PluginRegistry {
    /// Build a registry, rejecting duplicate identifiers and implications
    /// that point at unregistered plugins.
    pub fn new(registrations: Vec<Registration>) -> Result<Self> {
        let mut registry = Self::default();
        for registration in registrations {
            registry.register(registration)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// The registry of built-in plugins
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_registrations())
    }

    fn register(&mut self, registration: Registration) -> Result<()> {
        if self.get(registration.id).is_some() {
            return Err(Error::Registry {
                message: format!("plugin '{}' is registered twice", registration.id),
            });
        }
        self.registrations.push(registration);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for registration in &self.registrations {
            for implied in registration.implies {
                if self.get(implied).is_none() {
                    return Err(Error::Registry {
                        message: format!(
                            "plugin '{}' implies unregistered plugin '{}'",
                            registration.id, implied
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Registrations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|r| r.id).collect()
    }

    /// Turn a preset into the ordered list of plugins to run
    pub fn resolve(&self, preset: &Preset) -> Result<Vec<ResolvedPlugin>> {
        for id in preset.ids() {
            if !self.contains(id) {
                return Err(self.unknown(id));
            }
        }

        let project_options = preset.get(PROJECT_PLUGIN).cloned().unwrap_or_default();
        let declared = std::iter::once((PROJECT_PLUGIN, &project_options)).chain(
            preset
                .iter()
                .filter(|(id, _)| *id != PROJECT_PLUGIN),
        );

        let mut ordered: Vec<(&Registration, Options)> = Vec::new();
        let mut visiting = HashSet::new();
        for (id, options) in declared {
            self.push_with_implied(id, options.clone(), preset, &mut ordered, &mut visiting)?;
        }

        Ok(ordered
            .into_iter()
            .map(|(registration, options)| ResolvedPlugin {
                id: registration.id.to_string(),
                plugin: (registration.constructor)(),
                options,
            })
            .collect())
    }

    fn push_with_implied<'a>(
        &'a self,
        id: &str,
        options: Options,
        preset: &Preset,
        ordered: &mut Vec<(&'a Registration, Options)>,
        visiting: &mut HashSet<&'static str>,
    ) -> Result<()> {
        let registration = self.get(id).ok_or_else(|| self.unknown(id))?;
        if ordered.iter().any(|(existing, _)| existing.id == registration.id) {
            return Ok(());
        }
        visiting.insert(registration.id);

        for implied in registration.implies {
            let enabled = preset.contains(implied)
                || ordered.iter().any(|(existing, _)| existing.id == *implied);
            if !enabled && !visiting.contains(implied) {
                debug!("Plugin '{}' implies '{}', enabling it", id, implied);
                self.push_with_implied(implied, Options::new(), preset, ordered, visiting)?;
            }
        }

        let mut options = options;
        for (key, value) in &registration.defaults {
            options.entry(key.clone()).or_insert_with(|| value.clone());
        }
        ordered.push((registration, options));
        Ok(())
    }

    fn unknown(&self, id: &str) -> Error {
        let ids = self.ids();
        Error::UnknownPlugin {
            id: id.to_string(),
            hint: suggestions::find_similar(id, &ids).map(|s| format!("did you mean '{}'?", s)),
        }
    }
}
