//! Route `tracing` events through a [`Logger`].
//!
//! [`LoggerLayer`] encodes every event with the logger's encoder and sinks,
//! so `tracing::info!` from any crate ends up next to the facade's records.
//! [`install_global`] makes the global logger the `tracing` global default.

use std::borrow::Cow;
use std::fmt;

use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::caller::Caller;
use crate::{Error, Field, Level, Logger, Result};

/// A `tracing_subscriber` layer that writes events through a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Level::from_tracing(meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let caller = meta.file().zip(meta.line()).map(|(file, line)| Caller {
            file: Cow::Borrowed(file),
            line,
            function: None,
        });

        self.logger.write_entry(
            level,
            &visitor.message,
            &visitor.fields,
            caller.as_ref(),
            Some(meta.target()),
        );
    }
}

/// Collects the `message` field and turns the rest into context fields.
#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<Field>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(Field::string(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.fields.push(Field::int(field.name(), value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.fields.push(Field::uint(field.name(), value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.fields.push(Field::float(field.name(), value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.fields.push(Field::bool(field.name(), value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(Field::display(field.name(), value));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push(Field::string(field.name(), format!("{:?}", value)));
        }
    }
}

/// Filter directives for the bridge: `RUST_LOG` when set and non-empty,
/// otherwise the logger's own level.
fn effective_log_spec(level: Level) -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    level.to_tracing().as_str().to_ascii_lowercase()
}

/// Install `logger` as the `tracing` global default subscriber.
///
/// # Errors
///
/// Returns an error if the filter directives are invalid or a global
/// subscriber is already set.
pub fn install(logger: Logger) -> Result<()> {
    let filter = EnvFilter::try_new(effective_log_spec(logger.level()))
        .map_err(|e| Error::Init(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(LoggerLayer::new(logger))
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

/// Install the global facade logger as the `tracing` global default.
pub fn install_global() -> Result<()> {
    install(crate::logger().clone())
}
