//! The logger behind the facade.
//!
//! A [`Logger`] is a cheap handle over a shared core (level, encoder, sinks).
//! [`Logger::with`] and [`Logger::named`] derive child loggers that share
//! the core and carry extra context. [`Sugar`] wraps a logger with
//! printf-style and loose key/value methods.

use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;

use crate::caller::{self, Caller};
use crate::config::{LogConfig, SinkConfig};
use crate::encoder::{Encoder, Entry};
use crate::sink::{Output, Sink, Sinks};
use crate::{Error, Field, Level, Result, RotatingWriter};

#[derive(Debug)]
struct Core {
    level: Level,
    development: bool,
    caller_skip: usize,
    encoder: Encoder,
    output: Output,
}

/// A structured logger.
#[derive(Debug, Clone)]
pub struct Logger {
    core: Arc<Core>,
    fields: Vec<Field>,
    name: Option<String>,
}

impl Logger {
    /// Build a standalone logger from a configuration.
    ///
    /// File sinks are opened on their first write, so this only fails on an
    /// invalid configuration.
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        config.validate()?;
        let encoder = Encoder::new(config.encoding, config.encoder.clone())?;

        let mut sinks: Vec<Sink> = config
            .sinks
            .iter()
            .map(|sink| match sink {
                SinkConfig::Stdout => Sink::Stdout,
                SinkConfig::Stderr => Sink::Stderr,
                SinkConfig::File(file) => Sink::File(Arc::new(RotatingWriter::new(
                    &file.path,
                    file.rotation.clone(),
                ))),
            })
            .collect();
        sinks.extend(config.writers.iter().cloned().map(Sink::Writer));

        let fields = config
            .preset_fields
            .iter()
            .map(|(key, value)| Field::from_pair(key, value))
            .collect();

        Ok(Self {
            core: Arc::new(Core {
                level: config.level,
                development: config.development,
                caller_skip: config.caller_skip,
                encoder,
                output: Output::new(Sinks::new(sinks), config.non_blocking),
            }),
            fields,
            name: None,
        })
    }

    /// A JSON logger writing to stdout at info level, used when a
    /// configuration cannot be built.
    pub(crate) fn fallback() -> Self {
        Self {
            core: Arc::new(Core {
                level: Level::Info,
                development: true,
                caller_skip: 1,
                encoder: Encoder::fallback(),
                output: Output::new(Sinks::new(vec![Sink::Stdout]), false),
            }),
            fields: Vec::new(),
            name: None,
        }
    }

    /// Minimum level this logger writes.
    pub fn level(&self) -> Level {
        self.core.level
    }

    pub fn is_development(&self) -> bool {
        self.core.development
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.core.level
    }

    /// A child logger that adds `fields` to every record.
    pub fn with(&self, fields: &[Field]) -> Logger {
        let mut child = self.clone();
        child.fields.extend_from_slice(fields);
        child
    }

    /// A child logger with `name` appended to this logger's name, dot-separated.
    pub fn named(&self, name: &str) -> Logger {
        let mut child = self.clone();
        child.name = match (&self.name, name.is_empty()) {
            (_, true) => self.name.clone(),
            (Some(parent), false) => Some(format!("{}.{}", parent, name)),
            (None, false) => Some(name.to_string()),
        };
        child
    }

    /// Wrap this logger with the printf and key/value API.
    pub fn sugar(&self) -> Sugar {
        Sugar {
            logger: self.clone(),
        }
    }

    /// Flush every sink.
    pub fn sync(&self) -> Result<()> {
        self.core.output.sync().map_err(Error::Io)
    }

    /// Flush every sink and stop the background worker, if any.
    pub fn shutdown(&self) -> Result<()> {
        self.core.output.shutdown().map_err(Error::Io)
    }

    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, fields: &[Field]) {
        self.check_and_write(level, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, fields: &[Field]) {
        self.check_and_write(Level::Debug, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, msg: &str, fields: &[Field]) {
        self.check_and_write(Level::Info, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, fields: &[Field]) {
        self.check_and_write(Level::Warn, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, msg: &str, fields: &[Field]) {
        self.check_and_write(Level::Error, msg, fields, Location::caller());
    }

    /// Logs at `DPanic`; panics afterwards in development mode.
    #[track_caller]
    pub fn dpanic(&self, msg: &str, fields: &[Field]) {
        self.check_and_write(Level::DPanic, msg, fields, Location::caller());
    }

    /// Logs at `Panic`, then panics with `msg`.
    #[track_caller]
    pub fn panic(&self, msg: &str, fields: &[Field]) -> ! {
        self.check_and_write(Level::Panic, msg, fields, Location::caller());
        panic!("{}", msg)
    }

    /// Logs at `Fatal`, flushes, then exits the process with status 1.
    #[track_caller]
    pub fn fatal(&self, msg: &str, fields: &[Field]) -> ! {
        self.check_and_write(Level::Fatal, msg, fields, Location::caller());
        std::process::exit(1)
    }

    #[track_caller]
    pub(crate) fn log_args(
        &self,
        level: Level,
        args: fmt::Arguments<'_>,
        location: &'static Location<'static>,
    ) {
        // The message is still needed for the panic payload of filtered records.
        let msg = if self.enabled(level) || level >= Level::DPanic {
            fmt::format(args)
        } else {
            String::new()
        };
        self.check_and_write(level, &msg, &[], location);
    }

    #[track_caller]
    pub(crate) fn log_pairs(
        &self,
        level: Level,
        msg: &str,
        keys_and_values: &[(&str, Value)],
        location: &'static Location<'static>,
    ) {
        let fields = if self.enabled(level) {
            pairs_to_fields(keys_and_values)
        } else {
            Vec::new()
        };
        self.check_and_write(level, msg, &fields, location);
    }

    /// Write the record if enabled, then apply the level's terminal behavior.
    #[track_caller]
    pub(crate) fn check_and_write(
        &self,
        level: Level,
        msg: &str,
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        if self.enabled(level) {
            let caller = caller::resolve(self.core.caller_skip, location);
            self.write_entry(level, msg, fields, Some(&caller), None);
        }

        match level {
            Level::DPanic if self.core.development => panic!("{}", msg),
            Level::Panic => panic!("{}", msg),
            Level::Fatal => {
                let _ = self.shutdown();
                std::process::exit(1)
            }
            _ => {}
        }
    }

    /// Encode and write one record. `fallback_name` names the record when the
    /// logger itself is unnamed.
    pub(crate) fn write_entry(
        &self,
        level: Level,
        msg: &str,
        fields: &[Field],
        caller: Option<&Caller>,
        fallback_name: Option<&str>,
    ) {
        let stacktrace = self
            .wants_stacktrace(level)
            .then(|| Backtrace::force_capture().to_string());

        let entry = Entry {
            level,
            time: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
            name: self.name.as_deref().or(fallback_name),
            caller,
            message: msg,
            stacktrace: stacktrace.as_deref(),
        };

        let line = self.core.encoder.encode(&entry, &[&self.fields, fields]);
        if let Err(e) = self.core.output.write_record(line.as_bytes()) {
            eprintln!("oncelog: failed to write record: {}", e);
        }
    }

    fn wants_stacktrace(&self, level: Level) -> bool {
        if self.core.development {
            level >= Level::Warn
        } else {
            level >= Level::Error
        }
    }
}

/// A logger with printf-style and loose key/value methods.
#[derive(Debug, Clone)]
pub struct Sugar {
    logger: Logger,
}

fn pairs_to_fields(keys_and_values: &[(&str, Value)]) -> Vec<Field> {
    keys_and_values
        .iter()
        .map(|(key, value)| Field::from_pair(key, value))
        .collect()
}

impl Sugar {
    /// The underlying structured logger.
    pub fn desugar(&self) -> &Logger {
        &self.logger
    }

    /// A child that adds the pairs to every record.
    pub fn with(&self, keys_and_values: &[(&str, Value)]) -> Sugar {
        Sugar {
            logger: self.logger.with(&pairs_to_fields(keys_and_values)),
        }
    }

    pub fn named(&self, name: &str) -> Sugar {
        Sugar {
            logger: self.logger.named(name),
        }
    }

    pub fn sync(&self) -> Result<()> {
        self.logger.sync()
    }

    /// Log a formatted message. Formatting is skipped when the level is disabled.
    #[track_caller]
    pub fn logf(&self, level: Level, args: fmt::Arguments<'_>) {
        self.logger.log_args(level, args, Location::caller());
    }

    /// Log a message with loose key/value context.
    #[track_caller]
    pub fn logw(&self, level: Level, msg: &str, keys_and_values: &[(&str, Value)]) {
        self.logger
            .log_pairs(level, msg, keys_and_values, Location::caller());
    }

    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Debug, args);
    }

    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Info, args);
    }

    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Warn, args);
    }

    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Error, args);
    }

    #[track_caller]
    pub fn dpanicf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::DPanic, args);
    }

    #[track_caller]
    pub fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.logf(Level::Panic, args);
        unreachable!("panic level always panics")
    }

    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.logf(Level::Fatal, args);
        unreachable!("fatal level always exits")
    }

    #[track_caller]
    pub fn debugw(&self, msg: &str, keys_and_values: &[(&str, Value)]) {
        self.logw(Level::Debug, msg, keys_and_values);
    }

    #[track_caller]
    pub fn infow(&self, msg: &str, keys_and_values: &[(&str, Value)]) {
        self.logw(Level::Info, msg, keys_and_values);
    }

    #[track_caller]
    pub fn warnw(&self, msg: &str, keys_and_values: &[(&str, Value)]) {
        self.logw(Level::Warn, msg, keys_and_values);
    }

    #[track_caller]
    pub fn errorw(&self, msg: &str, keys_and_values: &[(&str, Value)]) {
        self.logw(Level::Error, msg, keys_and_values);
    }

    #[track_caller]
    pub fn dpanicw(&self, msg: &str, keys_and_values: &[(&str, Value)]) {
        self.logw(Level::DPanic, msg, keys_and_values);
    }

    #[track_caller]
    pub fn panicw(&self, msg: &str, keys_and_values: &[(&str, Value)]) -> ! {
        self.logw(Level::Panic, msg, keys_and_values);
        unreachable!("panic level always panics")
    }

    #[track_caller]
    pub fn fatalw(&self, msg: &str, keys_and_values: &[(&str, Value)]) -> ! {
        self.logw(Level::Fatal, msg, keys_and_values);
        unreachable!("fatal level always exits")
    }
}
