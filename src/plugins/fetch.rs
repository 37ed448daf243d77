//! Async data fetching based on Axios + useRequest
//!
//! Options:
//!
//! - `baseURL`: base URL of the shared client, `/api` by default.
//! - `timeout`: request timeout in milliseconds, `10000` by default.

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::generator::GeneratorApi;
use crate::preset::Options;
use crate::template::TemplateContext;

use super::{string_option, Plugin};

pub const ID: &str = "fetch";

const DEFAULT_BASE_URL: &str = "/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const REQUEST_TEMPLATE: &str = include_str!("../../templates/fetch/src/utils/request.ts");

#[derive(Debug)]
pub struct FetchPlugin;

fn timeout(options: &Options) -> Result<u64> {
    match options.get("timeout") {
        None | Some(Value::Null) => Ok(DEFAULT_TIMEOUT_MS),
        Some(value) => value.as_u64().ok_or_else(|| Error::InvalidOption {
            plugin: ID.to_string(),
            message: format!("'timeout' must be a non-negative integer, got {}", value),
        }),
    }
}

impl Plugin for FetchPlugin {
    fn id(&self) -> &'static str {
        ID
    }

    fn generate(&self, api: &mut GeneratorApi<'_>, options: &Options) -> Result<()> {
        let base_url = string_option(ID, options, "baseURL")?.unwrap_or(DEFAULT_BASE_URL);
        let timeout = timeout(options)?;
        let source_dir = api.project_type()?.source_dir();

        api.extend_manifest(json!({
            "dependencies": {
                "axios": "^0.19.2",
                "@luban-hooks/use-request": "^1.3.0",
            },
        }))?;

        let context = TemplateContext::new()
            .with("baseURL", base_url)
            .with("timeout", timeout);
        api.render_file(
            format!("{}/utils/request.ts", source_dir),
            REQUEST_TEMPLATE,
            &context,
        )
    }
}
