//! Stylelint for CSS and Less sources

use serde_json::json;

use crate::compose::SideConfig;
use crate::error::Result;
use crate::generator::GeneratorApi;
use crate::preset::Options;
use crate::template::{TemplateContext, TemplateSource};

use super::Plugin;

pub const ID: &str = "stylelint";

static TEMPLATES: TemplateSource = TemplateSource::Embedded(&[(
    "_stylelintrc",
    include_bytes!("../../templates/stylelint/_stylelintrc"),
)]);

#[derive(Debug)]
pub struct StylelintPlugin;

impl Plugin for StylelintPlugin {
    fn id(&self) -> &'static str {
        ID
    }

    fn generate(&self, api: &mut GeneratorApi<'_>, _options: &Options) -> Result<()> {
        let source_dir = api.project_type()?.source_dir();
        let styles = format!("{}/**/*.{{css,less}}", source_dir);

        api.extend_manifest(json!({
            "scripts": {
                "format:style": format!("prettier --write '{}'", styles),
                "format:check:style": format!("prettier --check '{}'", styles),
            },
        }))?;
        api.extend_manifest(json!({
            "devDependencies": {
                "stylelint": "^13.5.0",
                "stylelint-config-standard": "^20.0.0",
                "stylelint-config-prettier": "^8.0.1",
                "stylelint-webpack-plugin": "^2.1.1",
            },
            "scripts": {
                "stylelint": format!("stylelint {}", styles),
            },
        }))?;

        if api.is_git_repository() {
            api.extend_manifest(json!({
                "lint-staged": {
                    styles: ["npm run stylelint", "npm run format:check:style"],
                },
            }))?;
        }

        let context = TemplateContext::new()
            .with("processors", json!([]))
            .with(
                "extendsConfig",
                json!(["stylelint-config-standard", "stylelint-config-prettier"]),
            )
            .with(
                "rules",
                json!({
                    "comment-empty-line-before": ["always"],
                    "rule-empty-line-before": ["always", { "ignore": ["after-comment", "first-nested"] }],
                    "font-family-no-missing-generic-family-keyword": [null],
                    "no-descending-specificity": [null],
                    "selector-pseudo-class-no-unknown": [true, {
                        "ignorePseudoClasses": ["export", "import", "global", "local", "external"],
                    }],
                }),
            );
        api.render(&TEMPLATES, &context)
    }

    fn configure(&self, config: &mut SideConfig<'_>, _options: &Options) -> Result<()> {
        if config.side() != "client" {
            return Ok(());
        }
        let context = config.context();
        let source = context.resolve(context.project_type.source_dir());
        let config_file = context.resolve(".stylelintrc");
        config.add_build_plugin(
            Some("style-lint-plugin"),
            "StylelintPlugin",
            vec![json!({
                "files": ["**/*.css", "**/*.less"],
                "emitErrors": true,
                "context": source.display().to_string(),
                "configFile": config_file.display().to_string(),
            })],
        );
        Ok(())
    }
}
