//! # Oncelog
//!
//! A process-wide logging facade with structured output and rotating files.
//!
//! ## Features
//!
//! - A global logger built lazily on first use, configured with options
//! - Leveled, printf-style and key/value logging APIs
//! - JSON and console encodings with configurable keys
//! - Size-based file rotation with age and count retention
//! - Integration with the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust,no_run
//! use oncelog::options::{self, max_age, max_size};
//! use oncelog::Field;
//!
//! oncelog::configure([
//!     options::level("debug"),
//!     options::out_file("./log/test.log", [max_size(128), max_age(7)]),
//! ])?;
//!
//! oncelog::info("hello world", &[Field::string("name", "zhangsan"), Field::int("age", 18)]);
//! oncelog::infof!("hello world; name:{}; age:{}", "zhangsan", 18);
//! oncelog::infow!("hello world", "name" => "zhangsan", "age" => 18);
//! oncelog::sync()?;
//! # Ok::<(), oncelog::Error>(())
//! ```

pub mod bridge;
pub mod builder;
pub mod caller;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
mod global;
pub mod level;
pub mod logger;
pub mod macros;
pub mod options;
pub mod rotation;
pub mod sink;
pub mod writer;

pub use bridge::{LoggerLayer, install, install_global};
pub use builder::LogBuilder;
pub use config::{EncoderConfig, Encoding, FileLogConfig, LogConfig, SinkConfig};
pub use error::{Error, Result};
pub use field::{Field, FieldValue};
pub use global::*;
pub use level::Level;
pub use logger::{Logger, Sugar};
pub use options::LogOption;
pub use rotation::RotationPolicy;
pub use sink::{SharedWriter, Sink, Sinks};
pub use writer::RotatingWriter;

/// Start a [`LogBuilder`] with the default configuration.
pub fn builder() -> LogBuilder {
    LogBuilder::new()
}
