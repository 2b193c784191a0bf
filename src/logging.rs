//! Explicit logging capability.
//!
//! Network operations take a [`Logger`] instead of reaching for a global one,
//! so callers decide which target the messages land under. Messages still go
//! through the `log` facade.

use crate::config;
use log::Level;
use std::fmt;

/// Log handle passed into parse/reserve/release.
#[derive(Debug, Clone)]
pub struct Logger {
    target: String,
}

impl Logger {
    /// Create a logger writing under `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Logger {
            target: target.into(),
        }
    }

    /// The log target messages are emitted under.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: self.target.as_str(), level, "{}", args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(config::DEFAULT_LOG_TARGET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        assert_eq!(Logger::default().target(), "director::network");
    }

    #[test]
    fn test_custom_target() {
        let logger = Logger::new("TestLogger");
        assert_eq!(logger.target(), "TestLogger");
        // no logger installed, must not panic
        logger.info(format_args!("hello {}", 1));
    }
}
