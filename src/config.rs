//! Crate-wide constants.

/// Settings categories a network supplies defaults for unless the caller overrides them.
pub const DEFAULT_PROPERTIES: [&str; 2] = ["dns", "gateway"];

/// Log target used by [`crate::logging::Logger::default`].
pub const DEFAULT_LOG_TARGET: &str = "director::network";

/// Network type assumed when a manifest fragment has no `type` key.
pub const DEFAULT_NETWORK_TYPE: &str = "manual";

/// Env var pointing at an alternative log4rs config file.
pub const LOG_CONFIG_ENV: &str = "DIRECTOR_NETWORK_LOG_CONFIG";

/// log4rs config used when [`LOG_CONFIG_ENV`] is unset.
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";
