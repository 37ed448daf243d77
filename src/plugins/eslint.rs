//! ESLint + Prettier for TypeScript sources
//!
//! Options:
//!
//! - `config`: rule-set flavor, one of `leap` (default), `airbnb` or
//!   `standard`.
//!
//! Inside a git work tree the plugin also wires husky and lint-staged so
//! staged sources are linted before each commit.

use serde_json::{json, Map, Value};

use crate::compose::SideConfig;
use crate::error::{Error, Result};
use crate::generator::GeneratorApi;
use crate::preset::{Options, ProjectType};
use crate::template::{TemplateContext, TemplateSource};

use super::{string_option, unit_test, Plugin};

pub const ID: &str = "eslint";

const LINT_FILE_SUFFIX: &str = "{ts,tsx}";
const PARSER: &str = "@typescript-eslint/parser";

static TEMPLATES: TemplateSource = TemplateSource::Embedded(&[
    ("_eslintrc", include_bytes!("../../templates/eslint/_eslintrc")),
    ("_eslintignore", include_bytes!("../../templates/eslint/_eslintignore")),
    ("_prettierrc", include_bytes!("../../templates/eslint/_prettierrc")),
]);

/// Rule-set flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Leap,
    Airbnb,
    Standard,
}

impl Flavor {
    pub fn from_options(options: &Options) -> Result<Self> {
        match string_option(ID, options, "config")? {
            None | Some("leap") => Ok(Flavor::Leap),
            Some("airbnb") => Ok(Flavor::Airbnb),
            Some("standard") => Ok(Flavor::Standard),
            Some(other) => Err(Error::InvalidOption {
                plugin: ID.to_string(),
                message: format!(
                    "unknown config '{}', expected 'leap', 'airbnb' or 'standard'",
                    other
                ),
            }),
        }
    }

    fn dev_dependencies(&self) -> Value {
        let mut deps = json!({
            "eslint": "^7.24.0",
            "eslint-webpack-plugin": "^2.5.4",
            "eslint-config-prettier": "^8.2.0",
            "eslint-plugin-react": "^7.23.2",
            "eslint-plugin-react-hooks": "^4.2.0",
            "@typescript-eslint/parser": "^4.22.0",
            "@typescript-eslint/eslint-plugin": "^4.22.0",
            "prettier": "^2.2.1",
        });
        let extra = match self {
            Flavor::Leap => json!({ "eslint-plugin-import": "^2.22.1" }),
            Flavor::Airbnb => json!({
                "eslint-plugin-import": "^2.22.1",
                "eslint-config-airbnb": "^18.2.1",
                "eslint-plugin-jsx-a11y": "^6.4.1",
            }),
            Flavor::Standard => json!({
                "eslint-config-standard": "^14.1.0",
                "eslint-plugin-import": "^2.22.1",
                "eslint-plugin-node": "^11.1.0",
                "eslint-plugin-promise": "^5.1.0",
            }),
        };
        if let (Value::Object(deps), Value::Object(extra)) = (&mut deps, extra) {
            deps.extend(extra);
        }
        deps
    }

    fn extends(&self) -> Vec<&'static str> {
        let mut extends = match self {
            Flavor::Leap => vec!["plugin:react/recommended", "plugin:react-hooks/recommended"],
            Flavor::Airbnb => vec!["airbnb", "airbnb/hooks"],
            Flavor::Standard => vec![
                "standard",
                "plugin:react/recommended",
                "plugin:react-hooks/recommended",
            ],
        };
        extends.extend([
            "plugin:@typescript-eslint/recommended-requiring-type-checking",
            "plugin:@typescript-eslint/recommended",
            "plugin:@typescript-eslint/eslint-recommended",
            "plugin:import/typescript",
            "prettier",
        ]);
        extends
    }

    fn rules(&self) -> Map<String, Value> {
        let mut rules = json_object(json!({
            "quotes": ["error", "double"],
            "semi": ["error", "always"],
            "space-before-function-paren": ["error", "never"],
            "comma-dangle": ["error", "always-multiline"],
            "max-len": ["error", { "code": 100, "ignoreUrls": true, "ignoreComments": true }],
            "arrow-body-style": "off",
            "object-curly-newline": "off",
            "indent": "off",
            "camelcase": "off",
            "operator-linebreak": "off",
            "react/prop-types": "off",
        }));
        if *self == Flavor::Airbnb {
            rules.extend(json_object(json!({
                "react/display-name": ["warn"],
                "import/prefer-default-export": "off",
                "import/no-unresolved": "off",
                "import/no-cycle": "off",
                "import/extensions": "off",
                "jsx-a11y/no-noninteractive-element-interactions": "off",
                "jsx-a11y/click-events-have-key-events": "off",
                "@typescript-eslint/explicit-function-return-type": "off",
                "@typescript-eslint/camelcase": "off",
                "react/state-in-constructor": "warn",
                "react/jsx-filename-extension": ["error", { "extensions": [".ts", ".tsx"] }],
            })));
        }
        rules
    }
}

fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug)]
pub struct EslintPlugin;

impl Plugin for EslintPlugin {
    fn id(&self) -> &'static str {
        ID
    }

    fn generate(&self, api: &mut GeneratorApi<'_>, options: &Options) -> Result<()> {
        let flavor = Flavor::from_options(options)?;
        let project_type = api.project_type()?;
        let source_dir = project_type.source_dir();

        if api.is_git_repository() {
            let staged = format!("{}/**/*.{}", source_dir, LINT_FILE_SUFFIX);
            api.extend_manifest(json!({
                "devDependencies": {
                    "husky": "^3.0.9",
                    "lint-staged": "^9.4.3",
                },
                "husky": {
                    "hooks": { "pre-commit": "lint-staged" },
                },
                "lint-staged": {
                    staged: ["npm run eslint", "npm run format:check:ts"],
                },
            }))?;
        }

        api.extend_manifest(json!({ "devDependencies": flavor.dev_dependencies() }))?;
        api.extend_manifest(json!({
            "scripts": {
                "eslint": format!("eslint --config .eslintrc --ext .tsx,.ts {}/", source_dir),
                "eslint:fix": format!("eslint --fix --config .eslintrc --ext .tsx,.ts {}/", source_dir),
                "format:ts": format!("prettier --write '{}/**/*.{}'", source_dir, LINT_FILE_SUFFIX),
                "format:check:ts": format!("prettier --check '{}/**/*.{}'", source_dir, LINT_FILE_SUFFIX),
            },
        }))?;

        let mut env = json_object(json!({ "browser": true, "es2017": true }));
        let mut rules = flavor.rules();
        if api.has_plugin(unit_test::ID) {
            env.insert("jest".into(), Value::Bool(true));
            rules.insert(
                "import/no-extraneous-dependencies".into(),
                json!(["error", {
                    "devDependencies": [
                        format!("**/*.test.{}", LINT_FILE_SUFFIX),
                        format!("**/*.spec.{}", LINT_FILE_SUFFIX),
                    ],
                }]),
            );
        }

        let context = TemplateContext::new()
            .with("parser", PARSER)
            .with(
                "parserOptions",
                json!({
                    "ecmaVersion": 2018,
                    "sourceType": "module",
                    "ecmaFeatures": { "jsx": true },
                    "project": ["./tsconfig.json"],
                }),
            )
            .with("extends", json!(flavor.extends()))
            .with("env", Value::Object(env))
            .with(
                "settings",
                json!({
                    "react": { "version": "detect" },
                    "import/extensions": [".ts", ".tsx"],
                }),
            )
            .with("rules", Value::Object(rules))
            .with("isLib", project_type == ProjectType::Lib);
        api.render(&TEMPLATES, &context)
    }

    fn configure(&self, config: &mut SideConfig<'_>, _options: &Options) -> Result<()> {
        let context = config.context().project_dir.display().to_string();
        config.add_build_plugin(
            Some("eslint"),
            "EslintWebpackPlugin",
            vec![json!({
                "context": context,
                "extensions": ["ts", "tsx"],
                "exclude": "node_modules",
            })],
        );
        Ok(())
    }
}
