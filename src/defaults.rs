//! Default values shared by the commands.

use crate::preset::ProjectType;

/// Project type used when neither `--type` nor a preset file says otherwise
pub const DEFAULT_PROJECT_TYPE: ProjectType = ProjectType::Web;

/// Side shown by `inspect` without `--name`
pub const DEFAULT_SIDE: &str = "client";

/// Log level used when neither `--log-level` nor `RUST_LOG` is given
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Environment variable naming a preset file for `create`
pub const PRESET_ENV: &str = "ZERO_PRESET";
