use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sink::SharedWriter;
use crate::{Error, Level, Result, RotationPolicy};

/// Default layout for the time element of a record.
pub const DEFAULT_TIME_FORMAT: &str =
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]";

/// Configuration for the logger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level that is written
    pub level: Level,
    /// Development mode: dpanic panics and stacktraces start at warn
    pub development: bool,
    /// Record encoding
    pub encoding: Encoding,
    /// Names and formats of the entry elements
    pub encoder: EncoderConfig,
    /// Output destinations
    pub sinks: Vec<SinkConfig>,
    /// Fields attached to every record
    pub preset_fields: BTreeMap<String, Value>,
    /// Frames between the user call site and the logging call
    pub caller_skip: usize,
    /// Hand writes to a background worker
    pub non_blocking: bool,
    /// Caller-supplied writers, used alongside `sinks`
    #[serde(skip)]
    pub writers: Vec<SharedWriter>,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            development: true,
            encoding: Encoding::Json,
            encoder: EncoderConfig::default(),
            sinks: vec![SinkConfig::Stdout],
            preset_fields: BTreeMap::new(),
            caller_skip: 1,
            non_blocking: false,
            writers: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Replace all sinks.
    pub fn with_sinks(mut self, sinks: Vec<SinkConfig>) -> Self {
        self.sinks = sinks;
        self
    }

    /// Add a sink next to the existing ones.
    pub fn with_sink(mut self, sink: SinkConfig) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_file(self, file: FileLogConfig) -> Self {
        self.with_sink(SinkConfig::File(file))
    }

    pub fn with_writer(mut self, writer: SharedWriter) -> Self {
        self.writers.push(writer);
        self
    }

    pub fn with_preset_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.preset_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_caller_skip(mut self, skip: usize) -> Self {
        self.caller_skip = skip;
        self
    }

    pub fn with_non_blocking(mut self, non_blocking: bool) -> Self {
        self.non_blocking = non_blocking;
        self
    }

    /// Check the parts of the configuration that can only fail at build time.
    pub fn validate(&self) -> Result<()> {
        time::format_description::parse_owned::<1>(&self.encoder.time_format).map_err(|e| {
            Error::Config(format!(
                "invalid time format {:?}: {}",
                self.encoder.time_format, e
            ))
        })?;

        for sink in &self.sinks {
            if let SinkConfig::File(file) = sink
                && file.path.as_os_str().is_empty()
            {
                return Err(Error::Config("file sink path is empty".to_string()));
            }
        }

        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How records are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One JSON object per line
    #[default]
    Json,
    /// Tab-separated, human-oriented
    Console,
}

impl Encoding {
    /// `"console"` (any case) selects the console encoding; anything else is JSON.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("console") {
            Encoding::Console
        } else {
            Encoding::Json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LevelEncoding {
    #[default]
    Lowercase,
    Capital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DurationEncoding {
    /// Floating-point seconds
    #[default]
    Seconds,
    /// Integer milliseconds
    Millis,
    /// Integer nanoseconds
    Nanos,
    /// Human-readable, e.g. `1.5s`
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallerEncoding {
    /// The path as the compiler recorded it
    #[default]
    Full,
    /// Only the last directory and the file name
    Short,
}

/// Names of the entry elements and how their values are rendered.
///
/// An empty key leaves that element out of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub message_key: String,
    pub function_key: String,
    pub stacktrace_key: String,
    pub line_ending: String,
    pub level_encoding: LevelEncoding,
    /// `time` crate format description
    pub time_format: String,
    pub duration_encoding: DurationEncoding,
    pub caller_encoding: CallerEncoding,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "time".to_string(),
            level_key: "level".to_string(),
            name_key: "name".to_string(),
            caller_key: "line".to_string(),
            message_key: "msg".to_string(),
            function_key: "func".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            line_ending: "\n".to_string(),
            level_encoding: LevelEncoding::Lowercase,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            duration_encoding: DurationEncoding::Seconds,
            caller_encoding: CallerEncoding::Full,
        }
    }
}

/// An output destination as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Stdout,
    Stderr,
    File(FileLogConfig),
}

/// Configuration for a rotating file sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// Path to the active log file
    pub path: PathBuf,
    /// Rotation and retention policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

impl FileLogConfig {
    /// Create a new FileLogConfig with the default rotation policy
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            rotation: RotationPolicy::default(),
        }
    }

    /// Set rotation policy
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }
}
