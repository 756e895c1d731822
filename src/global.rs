//! The process-wide logger and the facade functions that forward to it.
//!
//! The pending configuration is mutated by [`configure`] until the first
//! logging call (or [`logger`]/[`sugar`]) builds the logger. From then on
//! the same logger serves the whole process.

use std::fmt;
use std::panic::Location;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::{Lazy, OnceCell};
use serde_json::Value;

use crate::options::LogOption;
use crate::{Error, Field, Level, LogConfig, Logger, Result, Sugar};

struct Pending {
    config: LogConfig,
    /// Set under the lock by the builder, so no option can slip in between
    /// reading the configuration and publishing the logger.
    built: bool,
}

static PENDING: Lazy<Mutex<Pending>> = Lazy::new(|| {
    Mutex::new(Pending {
        config: LogConfig::default(),
        built: false,
    })
});

static LOGGER: OnceCell<Logger> = OnceCell::new();
static SUGAR: OnceCell<Sugar> = OnceCell::new();

fn pending() -> MutexGuard<'static, Pending> {
    PENDING.lock().unwrap_or_else(|e| e.into_inner())
}

/// Apply options to the global configuration.
///
/// Options must be applied before the first logging call. Late options are
/// reported through the live logger at error level and rejected with
/// [`Error::AlreadyInitialized`]. If the resulting configuration is invalid,
/// nothing is applied.
#[track_caller]
pub fn configure(options: impl IntoIterator<Item = LogOption>) -> Result<()> {
    let options: Vec<LogOption> = options.into_iter().collect();
    let mut state = pending();

    if state.built {
        drop(state);
        let live = logger();
        for option in &options {
            let msg = Error::AlreadyInitialized(option.name()).to_string();
            live.error(&msg, &[]);
        }
        let name = options.first().map_or("configure", |o| o.name());
        return Err(Error::AlreadyInitialized(name));
    }

    let mut config = state.config.clone();
    for option in options {
        option.apply(&mut config);
    }
    config.validate()?;
    state.config = config;
    Ok(())
}

/// A copy of the configuration the global logger is, or will be, built from.
pub fn current_config() -> LogConfig {
    pending().config.clone()
}

/// Whether the global logger has been built.
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

/// The global logger, built on first access.
///
/// If the configuration cannot be built, the reason goes to stderr and a
/// default JSON logger on stdout is used instead.
pub fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| {
        let config = {
            let mut state = pending();
            state.built = true;
            state.config.clone()
        };
        Logger::from_config(&config).unwrap_or_else(|e| {
            eprintln!("oncelog: {}; using the default stdout logger", e);
            Logger::fallback()
        })
    })
}

/// The global logger with the printf and key/value API.
pub fn sugar() -> &'static Sugar {
    SUGAR.get_or_init(|| logger().sugar())
}

/// Flush every sink of the global logger.
pub fn sync() -> Result<()> {
    match LOGGER.get() {
        Some(logger) => logger.sync(),
        None => Ok(()),
    }
}

/// Flush every sink and stop the background worker. Records logged
/// afterwards in non-blocking mode are dropped.
pub fn shutdown() -> Result<()> {
    match LOGGER.get() {
        Some(logger) => logger.shutdown(),
        None => Ok(()),
    }
}

#[track_caller]
pub fn log(level: Level, msg: &str, fields: &[Field]) {
    logger().check_and_write(level, msg, fields, Location::caller());
}

#[track_caller]
pub fn debug(msg: &str, fields: &[Field]) {
    log(Level::Debug, msg, fields);
}

#[track_caller]
pub fn info(msg: &str, fields: &[Field]) {
    log(Level::Info, msg, fields);
}

#[track_caller]
pub fn warn(msg: &str, fields: &[Field]) {
    log(Level::Warn, msg, fields);
}

#[track_caller]
pub fn error(msg: &str, fields: &[Field]) {
    log(Level::Error, msg, fields);
}

#[track_caller]
pub fn dpanic(msg: &str, fields: &[Field]) {
    log(Level::DPanic, msg, fields);
}

#[track_caller]
pub fn panic(msg: &str, fields: &[Field]) -> ! {
    logger().panic(msg, fields)
}

#[track_caller]
pub fn fatal(msg: &str, fields: &[Field]) -> ! {
    logger().fatal(msg, fields)
}

#[track_caller]
pub fn logf(level: Level, args: fmt::Arguments<'_>) {
    logger().log_args(level, args, Location::caller());
}

#[track_caller]
pub fn debugf(args: fmt::Arguments<'_>) {
    logf(Level::Debug, args);
}

#[track_caller]
pub fn infof(args: fmt::Arguments<'_>) {
    logf(Level::Info, args);
}

#[track_caller]
pub fn warnf(args: fmt::Arguments<'_>) {
    logf(Level::Warn, args);
}

#[track_caller]
pub fn errorf(args: fmt::Arguments<'_>) {
    logf(Level::Error, args);
}

#[track_caller]
pub fn dpanicf(args: fmt::Arguments<'_>) {
    logf(Level::DPanic, args);
}

#[track_caller]
pub fn panicf(args: fmt::Arguments<'_>) -> ! {
    sugar().panicf(args)
}

#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) -> ! {
    sugar().fatalf(args)
}

#[track_caller]
pub fn logw(level: Level, msg: &str, keys_and_values: &[(&str, Value)]) {
    logger().log_pairs(level, msg, keys_and_values, Location::caller());
}

#[track_caller]
pub fn debugw(msg: &str, keys_and_values: &[(&str, Value)]) {
    logw(Level::Debug, msg, keys_and_values);
}

#[track_caller]
pub fn infow(msg: &str, keys_and_values: &[(&str, Value)]) {
    logw(Level::Info, msg, keys_and_values);
}

#[track_caller]
pub fn warnw(msg: &str, keys_and_values: &[(&str, Value)]) {
    logw(Level::Warn, msg, keys_and_values);
}

#[track_caller]
pub fn errorw(msg: &str, keys_and_values: &[(&str, Value)]) {
    logw(Level::Error, msg, keys_and_values);
}

#[track_caller]
pub fn dpanicw(msg: &str, keys_and_values: &[(&str, Value)]) {
    logw(Level::DPanic, msg, keys_and_values);
}

#[track_caller]
pub fn panicw(msg: &str, keys_and_values: &[(&str, Value)]) -> ! {
    sugar().panicw(msg, keys_and_values)
}

#[track_caller]
pub fn fatalw(msg: &str, keys_and_values: &[(&str, Value)]) -> ! {
    sugar().fatalw(msg, keys_and_values)
}
