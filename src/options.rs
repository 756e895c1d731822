//! Functional options for the global logger.
//!
//! Each option is a named mutation of the pending [`LogConfig`], applied by
//! [`configure`](crate::configure) before the logger is first used.
//!
//! ```rust,no_run
//! use oncelog::options::{self, max_age, max_size};
//!
//! oncelog::configure([
//!     options::level("debug"),
//!     options::out_file("./log/test.log", [max_size(128), max_age(7)]),
//! ])?;
//! # Ok::<(), oncelog::Error>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::{Encoding, FileLogConfig, LogConfig, SinkConfig};
use crate::sink::SharedWriter;
use crate::{Level, RotationPolicy};

/// A named change to the logger configuration.
pub struct LogOption {
    name: &'static str,
    apply: Box<dyn FnOnce(&mut LogConfig) + Send>,
}

impl LogOption {
    pub fn new(name: &'static str, apply: impl FnOnce(&mut LogConfig) + Send + 'static) -> Self {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    /// Short name used when reporting a late option.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(self, config: &mut LogConfig) {
        (self.apply)(config)
    }
}

impl fmt::Debug for LogOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogOption").field("name", &self.name).finish()
    }
}

/// A change to the rotation policy of one file sink.
pub struct FileOption(Box<dyn FnOnce(&mut RotationPolicy) + Send>);

impl FileOption {
    pub fn new(apply: impl FnOnce(&mut RotationPolicy) + Send + 'static) -> Self {
        Self(Box::new(apply))
    }
}

impl fmt::Debug for FileOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FileOption")
    }
}

/// Set the level by name. Unknown names leave the level unchanged.
pub fn level(name: &str) -> LogOption {
    let parsed = name.parse::<Level>().ok();
    LogOption::new("level", move |config| {
        if let Some(level) = parsed {
            config.level = level;
        }
    })
}

pub fn with_level(level: Level) -> LogOption {
    LogOption::new("level", move |config| config.level = level)
}

/// Add a rotating file sink next to the existing sinks.
pub fn out_file(
    path: impl Into<PathBuf>,
    options: impl IntoIterator<Item = FileOption>,
) -> LogOption {
    let mut file = FileLogConfig::new(path);
    for FileOption(apply) in options {
        apply(&mut file.rotation);
    }
    LogOption::new("out_file", move |config| {
        config.sinks.push(SinkConfig::File(file))
    })
}

pub fn out_stderr() -> LogOption {
    LogOption::new("out_stderr", |config| config.sinks.push(SinkConfig::Stderr))
}

/// Add a caller-supplied writer as a sink.
pub fn out_writer(writer: SharedWriter) -> LogOption {
    LogOption::new("out_writer", move |config| config.writers.push(writer))
}

pub fn development(development: bool) -> LogOption {
    LogOption::new("development", move |config| config.development = development)
}

/// `"console"` selects the console encoding; any other name selects JSON.
pub fn encoding(name: &str) -> LogOption {
    let encoding = Encoding::from_name(name);
    LogOption::new("encoding", move |config| config.encoding = encoding)
}

pub fn caller_skip(skip: usize) -> LogOption {
    LogOption::new("caller_skip", move |config| config.caller_skip = skip)
}

/// Replace the preset fields.
pub fn preset_fields<K, I>(fields: I) -> LogOption
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    let fields: BTreeMap<String, Value> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
    LogOption::new("preset_fields", move |config| config.preset_fields = fields)
}

pub fn non_blocking(non_blocking: bool) -> LogOption {
    LogOption::new("non_blocking", move |config| {
        config.non_blocking = non_blocking
    })
}

/// Replace the whole configuration.
pub fn config(replacement: LogConfig) -> LogOption {
    LogOption::new("config", move |config| *config = replacement)
}

/// Rotate once the file would exceed `megabytes`.
pub fn max_size(megabytes: u64) -> FileOption {
    FileOption::new(move |policy| *policy = policy.clone().with_max_size_mb(megabytes))
}

/// Remove backups older than `days`. 0 keeps them regardless of age.
pub fn max_age(days: u32) -> FileOption {
    FileOption::new(move |policy| policy.max_age_days = days)
}

/// Keep at most `count` backups. 0 keeps all of them.
pub fn max_backups(count: usize) -> FileOption {
    FileOption::new(move |policy| policy.max_backups = count)
}

pub fn local_time(local_time: bool) -> FileOption {
    FileOption::new(move |policy| policy.local_time = local_time)
}
