//! Fixed names for apkolock's own files
//!
//! Only the directory roots come from the platform; these names are not
//! configurable.

/// Directory under the platform config/state roots
pub const APP_DIR: &str = "apkolock";

pub const CONFIG_FILE: &str = "config.toml";

/// Subdirectory of the state root receiving JSON debug logs
pub const LOGS_DIR: &str = "logs";

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "APKOLOCK_";
