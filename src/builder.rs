//! Builder pattern for configuring and initializing the logger.
//!
//! This module provides a convenient builder API for configuring the global
//! logger in a single chain of method calls, or for building a standalone
//! [`Logger`].
//!
//! # Example
//!
//! ```rust,no_run
//! use oncelog::Level;
//!
//! // Global logger that also receives `tracing` events
//! oncelog::builder()
//!     .with_level(Level::Debug)
//!     .with_file("/var/log/app.log")
//!     .init()
//!     .expect("Failed to initialize logging");
//!
//! tracing::info!("goes through the same sinks");
//! oncelog::info("and so does this", &[]);
//! ```

use std::path::PathBuf;

use serde_json::Value;

use crate::config::{Encoding, FileLogConfig, LogConfig, SinkConfig};
use crate::sink::SharedWriter;
use crate::{Level, Logger, Result, RotationPolicy};

/// A builder for configuring and initializing logging.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    config: LogConfig,
}

impl LogBuilder {
    /// Create a new LogBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LogConfig::new(),
        }
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self { config }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.config = self.config.with_development(development);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.config = self.config.with_encoding(encoding);
        self
    }

    /// Drop the default stdout sink, leaving only sinks added afterwards.
    pub fn without_stdout(mut self) -> Self {
        self.config.sinks.retain(|sink| *sink != SinkConfig::Stdout);
        self
    }

    pub fn with_stderr(mut self) -> Self {
        self.config = self.config.with_sink(SinkConfig::Stderr);
        self
    }

    /// Add a rotating file sink with the default rotation policy.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_file(FileLogConfig::new(path));
        self
    }

    /// Add a rotating file sink with a custom FileLogConfig.
    pub fn with_file_config(mut self, file_config: FileLogConfig) -> Self {
        self.config = self.config.with_file(file_config);
        self
    }

    /// Set the rotation policy of the most recently added file sink.
    ///
    /// If no file is configured, this adds one at "app.log".
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        let last_file = self.config.sinks.iter_mut().rev().find_map(|sink| match sink {
            SinkConfig::File(file) => Some(file),
            _ => None,
        });
        match last_file {
            Some(file) => file.rotation = rotation,
            None => {
                self.config = self
                    .config
                    .with_file(FileLogConfig::new("app.log").with_rotation(rotation))
            }
        }
        self
    }

    pub fn with_writer(mut self, writer: SharedWriter) -> Self {
        self.config = self.config.with_writer(writer);
        self
    }

    pub fn with_preset_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config = self.config.with_preset_field(key, value);
        self
    }

    pub fn with_caller_skip(mut self, skip: usize) -> Self {
        self.config = self.config.with_caller_skip(skip);
        self
    }

    pub fn with_non_blocking(mut self, non_blocking: bool) -> Self {
        self.config = self.config.with_non_blocking(non_blocking);
        self
    }

    /// Get the current configuration without initializing.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Build a standalone logger, independent of the global one.
    pub fn build_logger(self) -> Result<Logger> {
        Logger::from_config(&self.config)
    }

    /// Configure the global logger and install it as the `tracing` default.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The global logger was already built
    /// - Invalid configuration is provided
    /// - A `tracing` global subscriber is already set
    pub fn init(self) -> Result<()> {
        crate::configure([crate::options::config(self.config)])?;
        crate::bridge::install_global()
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
