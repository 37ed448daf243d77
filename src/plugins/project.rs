//! Project skeleton
//!
//! The root plugin. It contributes the base manifest fields and source
//! skeleton for the project type, and the entry points, module rules and
//! HTML page of the bundler configuration.
//!
//! Options:
//!
//! - `name`: package name; defaults to the target directory name.
//! - `type`: `web` (default) or `lib`.
//! - `version`: initial semver version, `0.1.0` by default.
//! - `description`: optional one-line description for the README and
//!   manifest.

use regex::Regex;
use serde_json::{json, Value};

use crate::compose::SideConfig;
use crate::error::{Error, Result};
use crate::generator::GeneratorApi;
use crate::preset::{Options, ProjectType};
use crate::template::{TemplateContext, TemplateSource};

use super::{string_option, Plugin};

pub const ID: &str = crate::preset::PROJECT_PLUGIN;

/// Longest package name the registry accepts
const MAX_NAME_LENGTH: usize = 214;

const NAME_PATTERN: &str = r"^(?:@[a-z0-9-*~][a-z0-9-*._~]*/)?[a-z0-9-~][a-z0-9-._~]*$";

static WEB_TEMPLATES: TemplateSource = TemplateSource::Embedded(&[
    ("README.md", include_bytes!("../../templates/project/web/README.md")),
    ("_gitignore", include_bytes!("../../templates/project/web/_gitignore")),
    ("tsconfig.json", include_bytes!("../../templates/project/web/tsconfig.json")),
    ("public/index.html", include_bytes!("../../templates/project/web/public/index.html")),
    ("src/index.tsx", include_bytes!("../../templates/project/web/src/index.tsx")),
    ("src/layout.tsx", include_bytes!("../../templates/project/web/src/layout.tsx")),
    ("src/route.ts", include_bytes!("../../templates/project/web/src/route.ts")),
    ("src/server.tsx", include_bytes!("../../templates/project/web/src/server.tsx")),
    ("src/pages/home.tsx", include_bytes!("../../templates/project/web/src/pages/home.tsx")),
]);

static LIB_TEMPLATES: TemplateSource = TemplateSource::Embedded(&[
    ("README.md", include_bytes!("../../templates/project/lib/README.md")),
    ("_gitignore", include_bytes!("../../templates/project/lib/_gitignore")),
    ("tsconfig.json", include_bytes!("../../templates/project/lib/tsconfig.json")),
    ("components/index.ts", include_bytes!("../../templates/project/lib/components/index.ts")),
    (
        "components/button/index.tsx",
        include_bytes!("../../templates/project/lib/components/button/index.tsx"),
    ),
]);

/// Check that `name` can be used as a package name.
///
/// Returns the reason when it cannot.
pub fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(format!(
            "name must be at most {} characters long",
            MAX_NAME_LENGTH
        ));
    }
    if name.trim() != name {
        return Err("name must not have leading or trailing whitespace".to_string());
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err("name must not start with '.' or '_'".to_string());
    }
    if name.to_lowercase() != name {
        return Err("name must not contain capital letters".to_string());
    }
    let pattern = Regex::new(NAME_PATTERN).map_err(|e| e.to_string())?;
    if !pattern.is_match(name) {
        return Err("name can only contain URL-friendly characters".to_string());
    }
    Ok(())
}

#[derive(Debug)]
pub struct ProjectPlugin;

impl ProjectPlugin {
    fn web_fragment() -> Value {
        json!({
            "scripts": {
                "serve": "zero-service serve",
                "build": "zero-service build",
                "inspect": "zero-service inspect",
            },
            "dependencies": {
                "react": "^16.14.0",
                "react-dom": "^16.14.0",
                "react-router-dom": "^5.2.0",
            },
            "devDependencies": {
                "@zero-cli/cli-service": "^1.0.0",
                "@types/react": "^16.9.56",
                "@types/react-dom": "^16.9.9",
                "typescript": "^4.2.4",
            },
        })
    }

    fn lib_fragment(name: &str) -> Value {
        json!({
            "files": ["dist", "lib", "es"],
            "sideEffects": ["dist/*", "es/**/style/*", "lib/**/style/*", "*.less"],
            "main": "lib/index.js",
            "module": "es/index.js",
            "unpkg": format!("dist/{}.min.js", name),
            "typings": "es/index.d.ts",
            "scripts": {
                "serve": "docz dev",
                "doc:build": "docz build",
                "compile": "tsc --noEmit",
                "build": "zero-lib-service build",
                "release:next": "zero-lib-service publish prerelease --tag next --run-scripts 'test eslint build' --allow-any-branch",
                "release": "zero-lib-service publish --tag latest --run-scripts 'test eslint build' --branch main",
            },
            "dependencies": {
                "classnames": "^2.2.6",
            },
            "devDependencies": {
                "@types/classnames": "^2.2.11",
                "@zero-cli/cli-lib-service": "^1.0.0",
                "docz": "^2.3.1",
                "react": "^16.14.0",
                "react-dom": "^16.14.0",
                "typescript": "^4.2.4",
            },
            "peerDependencies": {
                "react": ">=16.0.0",
                "react-dom": ">=16.0.0",
            },
            "publishConfig": {
                "access": "public",
                "registry": "https://registry.npmjs.org/",
            },
        })
    }

    fn configure_web(config: &mut SideConfig<'_>) {
        let ts_rule = json!({
            "test": "\\.tsx?$",
            "exclude": "node_modules",
            "use": [{ "loader": "babel-loader" }],
        });

        if config.side() == "server" {
            config
                .set_option("target", json!("node"))
                .add_entry("server", &["./src/server.tsx"])
                .add_rule(Some("ts"), ts_rule)
                .add_rule(
                    Some("style"),
                    json!({ "test": "\\.(css|less)$", "use": [{ "loader": "null-loader" }] }),
                );
            return;
        }

        let template = config.context().resolve("public/index.html");
        let title = config.context().project_name.clone();
        config
            .set_option("target", json!("web"))
            .add_entry("main", &["./src/index.tsx"])
            .add_rule(Some("ts"), ts_rule)
            .add_rule(Some("style"), style_rule())
            .add_rule(Some("images"), images_rule())
            .add_build_plugin(
                Some("html"),
                "HtmlWebpackPlugin",
                vec![json!({
                    "template": template.display().to_string(),
                    "title": title,
                })],
            );
    }

    fn configure_lib(config: &mut SideConfig<'_>) {
        let name = config.context().project_name.clone();
        config
            .set_option(
                "output",
                json!({
                    "library": name,
                    "libraryTarget": "umd",
                    "filename": format!("{}.min.js", name),
                }),
            )
            .set_option(
                "externals",
                json!({ "react": "React", "react-dom": "ReactDOM" }),
            )
            .add_entry("index", &["./components/index.ts"])
            .add_rule(
                Some("ts"),
                json!({
                    "test": "\\.tsx?$",
                    "exclude": "node_modules",
                    "use": [{ "loader": "ts-loader" }],
                }),
            )
            .add_rule(Some("style"), style_rule())
            .add_rule(Some("images"), images_rule());
    }
}

fn style_rule() -> Value {
    json!({
        "test": "\\.(css|less)$",
        "use": [
            { "loader": "style-loader" },
            { "loader": "css-loader" },
            { "loader": "less-loader", "options": { "lessOptions": { "javascriptEnabled": true } } },
        ],
    })
}

fn images_rule() -> Value {
    json!({
        "test": "\\.(png|jpe?g|gif|svg|webp)$",
        "use": [{ "loader": "url-loader", "options": { "limit": 8192 } }],
    })
}

impl Plugin for ProjectPlugin {
    fn id(&self) -> &'static str {
        ID
    }

    fn generate(&self, api: &mut GeneratorApi<'_>, options: &Options) -> Result<()> {
        let name = api.project_name().to_string();
        validate_name(&name).map_err(|reason| Error::InvalidOption {
            plugin: ID.to_string(),
            message: format!("invalid project name '{}': {}", name, reason),
        })?;

        let version = string_option(ID, options, "version")?.unwrap_or("0.1.0");
        semver::Version::parse(version).map_err(|e| Error::InvalidOption {
            plugin: ID.to_string(),
            message: format!("invalid version '{}': {}", version, e),
        })?;
        let description = string_option(ID, options, "description")?;

        let project_type = api.project_type()?;
        let mut base = json!({ "name": name, "version": version });
        if let (Value::Object(map), Some(description)) = (&mut base, description) {
            map.insert("description".into(), json!(description));
        }
        api.extend_manifest(base)?;

        let (fragment, templates) = match project_type {
            ProjectType::Web => (Self::web_fragment(), &WEB_TEMPLATES),
            ProjectType::Lib => (Self::lib_fragment(&name), &LIB_TEMPLATES),
        };
        api.extend_manifest(fragment)?;

        let context = TemplateContext::new()
            .with("projectName", name.as_str())
            .with("description", description.unwrap_or_default())
            .with("isLib", project_type == ProjectType::Lib);
        api.render(templates, &context)
    }

    fn configure(&self, config: &mut SideConfig<'_>, _options: &Options) -> Result<()> {
        match config.context().project_type {
            ProjectType::Web => Self::configure_web(config),
            ProjectType::Lib => Self::configure_lib(config),
        }
        Ok(())
    }
}
