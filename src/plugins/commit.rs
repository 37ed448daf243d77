//! Commitizen prompts and commitlint hooks
//!
//! Library projects get a `commit` script that lints staged files before
//! opening the commitizen prompt. Web projects run the prompt from the
//! `prepare-commit-msg` hook instead.

use serde_json::json;

use crate::error::Result;
use crate::generator::GeneratorApi;
use crate::preset::{Options, ProjectType};
use crate::template::{TemplateContext, TemplateSource};

use super::Plugin;

pub const ID: &str = "commit";

const COMMIT_MSG_HOOK: &str = "commitlint -E HUSKY_GIT_PARAMS";

static TEMPLATES: TemplateSource = TemplateSource::Embedded(&[(
    "commitlint.config.js",
    include_bytes!("../../templates/commit/commitlint.config.js"),
)]);

#[derive(Debug)]
pub struct CommitPlugin;

impl Plugin for CommitPlugin {
    fn id(&self) -> &'static str {
        ID
    }

    fn generate(&self, api: &mut GeneratorApi<'_>, _options: &Options) -> Result<()> {
        api.extend_manifest(json!({
            "devDependencies": {
                "@commitlint/cli": "^8.3.5",
                "@commitlint/config-conventional": "^8.3.4",
                "commitizen": "^4.1.2",
                "cz-conventional-changelog": "^3.2.0",
            },
            "config": {
                "commitizen": { "path": "cz-conventional-changelog" },
            },
        }))?;

        match api.project_type()? {
            ProjectType::Lib => {
                api.extend_manifest(json!({
                    "scripts": { "commit": "lint-staged && git-cz" },
                    "husky": {
                        "hooks": {
                            "pre-commit": "lint-staged",
                            "commit-msg": COMMIT_MSG_HOOK,
                        },
                    },
                }))?;
                api.exit_log("Run `npm run commit` to lint staged files and write a conventional commit");
            }
            ProjectType::Web => {
                api.extend_manifest(json!({
                    "husky": {
                        "hooks": {
                            "pre-commit": "lint-staged",
                            "commit-msg": COMMIT_MSG_HOOK,
                            "prepare-commit-msg": "exec < /dev/tty && git cz --hook || true",
                        },
                    },
                }))?;
                api.exit_log("`git commit` now opens the commitizen prompt");
            }
        }

        if !api.is_git_repository() {
            api.exit_log("Run `git init` before the first commit so the husky hooks are installed");
        }

        api.render(&TEMPLATES, &TemplateContext::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{initial_manifest, Environment, Generator, GenerationReport};
    use crate::preset::Preset;
    use crate::registry::PluginRegistry;

    fn plan(project_type: &str, git: bool) -> GenerationReport {
        let mut project = Options::new();
        project.insert("type".into(), json!(project_type));
        let preset = Preset::new()
            .with_plugin("project", project)
            .with_plugin(ID, Options::new());
        let plugins = PluginRegistry::builtin().unwrap().resolve(&preset).unwrap();
        Generator::new("unused", plugins, initial_manifest("demo"))
            .with_environment(Environment::new("/tmp/demo", git))
            .plan()
            .unwrap()
    }

    #[test]
    fn test_commit_implies_eslint() {
        let preset = Preset::new().with_plugin(ID, Options::new());
        let plugins = PluginRegistry::builtin().unwrap().resolve(&preset).unwrap();
        let ids: Vec<&str> = plugins.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["project", "eslint", "commit"]);
    }

    #[test]
    fn test_web_hooks() {
        let report = plan("web", true);
        assert_eq!(
            report.manifest.get_path("husky.hooks.prepare-commit-msg"),
            Some(&json!("exec < /dev/tty && git cz --hook || true"))
        );
        assert!(report.manifest.get_path("scripts.commit").is_none());
        assert_eq!(
            report.manifest.get_path("config.commitizen.path"),
            Some(&json!("cz-conventional-changelog"))
        );
        assert_eq!(report.exit_logs.len(), 1);
        assert!(report.files.exists("commitlint.config.js"));
    }

    #[test]
    fn test_lib_script_and_git_hint() {
        let report = plan("lib", false);
        assert_eq!(
            report.manifest.get_path("scripts.commit"),
            Some(&json!("lint-staged && git-cz"))
        );
        assert!(report.manifest.get_path("husky.hooks.prepare-commit-msg").is_none());

        let messages: Vec<&str> = report.exit_logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("git init"));
        assert!(report.exit_logs.iter().all(|l| l.plugin == ID));
    }
}
