//! Record encoders.
//!
//! Both encoders share one element order: level, time, name, caller,
//! function, message, stacktrace, then context fields. The JSON encoder writes
//! one object per line. The console encoder writes the elements
//! tab-separated, with the context fields as a trailing JSON object.

use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::{FormatItem, OwnedFormatItem};
use time::macros::format_description;

use crate::caller::Caller;
use crate::config::{DurationEncoding, EncoderConfig, Encoding, LevelEncoding};
use crate::field::{Field, FieldValue};
use crate::{Error, Level, Result};

/// Parsed form of [`DEFAULT_TIME_FORMAT`](crate::config::DEFAULT_TIME_FORMAT).
const DEFAULT_TIME_ITEMS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Everything about a record except its context fields.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub level: Level,
    pub time: OffsetDateTime,
    pub name: Option<&'a str>,
    pub caller: Option<&'a Caller>,
    pub message: &'a str,
    pub stacktrace: Option<&'a str>,
}

/// Turns entries and fields into bytes ready for the sinks.
#[derive(Debug, Clone)]
pub struct Encoder {
    encoding: Encoding,
    config: EncoderConfig,
    time_format: OwnedFormatItem,
}

impl Encoder {
    pub fn new(encoding: Encoding, config: EncoderConfig) -> Result<Self> {
        let time_format = time::format_description::parse_owned::<1>(&config.time_format)
            .map_err(|e| Error::Time(e.into()))?;
        Ok(Self {
            encoding,
            config,
            time_format,
        })
    }

    /// JSON with the default element names; cannot fail.
    pub fn fallback() -> Self {
        Self {
            encoding: Encoding::Json,
            config: EncoderConfig::default(),
            time_format: OwnedFormatItem::from(DEFAULT_TIME_ITEMS),
        }
    }

    /// Encode one record. `fields` are applied in order, so a namespace in an
    /// earlier group also wraps the later groups.
    pub fn encode(&self, entry: &Entry<'_>, fields: &[&[Field]]) -> String {
        let mut buf = String::with_capacity(256);
        match self.encoding {
            Encoding::Json => self.encode_json(&mut buf, entry, fields),
            Encoding::Console => self.encode_console(&mut buf, entry, fields),
        }
        buf
    }

    fn level_str(&self, level: Level) -> &'static str {
        match self.config.level_encoding {
            LevelEncoding::Lowercase => level.as_str(),
            LevelEncoding::Capital => level.capital_str(),
        }
    }

    fn time_str(&self, time: OffsetDateTime) -> String {
        time.format(&self.time_format)
            .unwrap_or_else(|_| time.unix_timestamp().to_string())
    }

    fn duration_value(&self, duration: &Duration) -> Value {
        match self.config.duration_encoding {
            DurationEncoding::Seconds => serde_json::Number::from_f64(duration.as_secs_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DurationEncoding::Millis => {
                Value::from(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
            }
            DurationEncoding::Nanos => {
                Value::from(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
            }
            DurationEncoding::String => Value::String(format!("{:?}", duration)),
        }
    }

    fn encode_json(&self, buf: &mut String, entry: &Entry<'_>, fields: &[&[Field]]) {
        let cfg = &self.config;
        let mut obj = JsonObject::open(buf);

        if !cfg.level_key.is_empty() {
            obj.string(&cfg.level_key, self.level_str(entry.level));
        }
        if !cfg.time_key.is_empty() {
            obj.string(&cfg.time_key, &self.time_str(entry.time));
        }
        if let Some(name) = entry.name
            && !cfg.name_key.is_empty()
        {
            obj.string(&cfg.name_key, name);
        }
        if let Some(caller) = entry.caller {
            if !cfg.caller_key.is_empty() {
                obj.string(&cfg.caller_key, &caller.encode(cfg.caller_encoding));
            }
            if let Some(function) = &caller.function
                && !cfg.function_key.is_empty()
            {
                obj.string(&cfg.function_key, function);
            }
        }
        if !cfg.message_key.is_empty() {
            obj.string(&cfg.message_key, entry.message);
        }
        if let Some(stack) = entry.stacktrace
            && !cfg.stacktrace_key.is_empty()
        {
            obj.string(&cfg.stacktrace_key, stack);
        }

        self.write_fields(&mut obj, fields);
        obj.close();
        buf.push_str(&cfg.line_ending);
    }

    fn encode_console(&self, buf: &mut String, entry: &Entry<'_>, fields: &[&[Field]]) {
        let cfg = &self.config;
        let mut elements: Vec<String> = Vec::with_capacity(6);

        if !cfg.time_key.is_empty() {
            elements.push(self.time_str(entry.time));
        }
        if !cfg.level_key.is_empty() {
            elements.push(self.level_str(entry.level).to_string());
        }
        if let Some(name) = entry.name
            && !cfg.name_key.is_empty()
        {
            elements.push(name.to_string());
        }
        if let Some(caller) = entry.caller {
            if !cfg.caller_key.is_empty() {
                elements.push(caller.encode(cfg.caller_encoding));
            }
            if let Some(function) = &caller.function
                && !cfg.function_key.is_empty()
            {
                elements.push(function.clone());
            }
        }
        if !cfg.message_key.is_empty() {
            elements.push(entry.message.to_string());
        }

        buf.push_str(&elements.join("\t"));

        if fields.iter().any(|group| !group.is_empty()) {
            buf.push('\t');
            let mut obj = JsonObject::open(buf);
            self.write_fields(&mut obj, fields);
            obj.close();
        }

        if let Some(stack) = entry.stacktrace
            && !cfg.stacktrace_key.is_empty()
        {
            buf.push('\n');
            buf.push_str(stack.trim_end());
        }
        buf.push_str(&cfg.line_ending);
    }

    fn write_fields(&self, obj: &mut JsonObject<'_>, fields: &[&[Field]]) {
        for field in fields.iter().flat_map(|group| group.iter()) {
            match &field.value {
                FieldValue::Json(value) => obj.value(&field.key, value),
                FieldValue::Duration(d) => obj.value(&field.key, &self.duration_value(d)),
                FieldValue::Namespace => obj.nest(&field.key),
            }
        }
    }
}

/// Minimal streaming writer for a JSON object with nested namespaces.
struct JsonObject<'a> {
    buf: &'a mut String,
    /// Whether the innermost open object has no members yet.
    empty: bool,
    depth: usize,
}

impl<'a> JsonObject<'a> {
    fn open(buf: &'a mut String) -> Self {
        buf.push('{');
        Self {
            buf,
            empty: true,
            depth: 1,
        }
    }

    fn key(&mut self, key: &str) {
        if !self.empty {
            self.buf.push(',');
        }
        self.empty = false;
        push_json_string(self.buf, key);
        self.buf.push(':');
    }

    fn string(&mut self, key: &str, value: &str) {
        self.key(key);
        push_json_string(self.buf, value);
    }

    fn value(&mut self, key: &str, value: &Value) {
        self.key(key);
        self.buf.push_str(&value.to_string());
    }

    fn nest(&mut self, key: &str) {
        self.key(key);
        self.buf.push('{');
        self.empty = true;
        self.depth += 1;
    }

    fn close(self) {
        for _ in 0..self.depth {
            self.buf.push('}');
        }
    }
}

fn push_json_string(buf: &mut String, s: &str) {
    // Serializing a str into JSON cannot fail.
    buf.push_str(&Value::from(s).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use time::macros::datetime;

    fn entry<'a>(caller: Option<&'a Caller>) -> Entry<'a> {
        Entry {
            level: Level::Info,
            time: datetime!(2026-01-09 10:20:30.123 UTC),
            name: None,
            caller,
            message: "hello world",
            stacktrace: None,
        }
    }

    fn json(encoder: &Encoder, entry: &Entry<'_>, fields: &[&[Field]]) -> Value {
        let line = encoder.encode(entry, fields);
        assert!(line.ends_with('\n'));
        serde_json::from_str(line.trim_end()).unwrap()
    }

    #[test]
    fn test_json_entry_keys() {
        let encoder = Encoder::new(Encoding::Json, EncoderConfig::default()).unwrap();
        let caller = Caller {
            file: Cow::Borrowed("src/main.rs"),
            line: 7,
            function: None,
        };
        let value = json(&encoder, &entry(Some(&caller)), &[]);
        assert_eq!(
            value,
            serde_json::json!({
                "level": "info",
                "time": "2026-01-09 10:20:30.123",
                "line": "src/main.rs:7",
                "msg": "hello world",
            })
        );
    }

    #[test]
    fn test_json_key_order() {
        let encoder = Encoder::new(Encoding::Json, EncoderConfig::default()).unwrap();
        let line = encoder.encode(&entry(None), &[&[Field::int("age", 18)]]);
        let level = line.find("\"level\"").unwrap();
        let time = line.find("\"time\"").unwrap();
        let msg = line.find("\"msg\"").unwrap();
        let age = line.find("\"age\"").unwrap();
        assert!(level < time && time < msg && msg < age);
    }

    #[test]
    fn test_json_fields_and_namespace() {
        let encoder = Encoder::new(Encoding::Json, EncoderConfig::default()).unwrap();
        let preset = [Field::string("service", "billing")];
        let call = [
            Field::namespace("user1"),
            Field::string("name", "zhangsan"),
            Field::int("age", 18),
        ];
        let value = json(&encoder, &entry(None), &[&preset, &call]);
        assert_eq!(value["service"], "billing");
        assert_eq!(value["user1"], serde_json::json!({"name": "zhangsan", "age": 18}));
    }

    #[test]
    fn test_json_nested_namespaces() {
        let encoder = Encoder::new(Encoding::Json, EncoderConfig::default()).unwrap();
        let call = [
            Field::namespace("a"),
            Field::namespace("b"),
            Field::bool("deep", true),
        ];
        let value = json(&encoder, &entry(None), &[&call]);
        assert_eq!(value["a"]["b"]["deep"], true);
    }

    #[test]
    fn test_json_empty_keys_are_omitted() {
        let config = EncoderConfig {
            time_key: String::new(),
            caller_key: String::new(),
            ..EncoderConfig::default()
        };
        let encoder = Encoder::new(Encoding::Json, config).unwrap();
        let caller = Caller {
            file: Cow::Borrowed("src/main.rs"),
            line: 7,
            function: None,
        };
        let value = json(&encoder, &entry(Some(&caller)), &[]);
        assert_eq!(value, serde_json::json!({"level": "info", "msg": "hello world"}));
    }

    #[test]
    fn test_json_escapes_strings() {
        let encoder = Encoder::new(Encoding::Json, EncoderConfig::default()).unwrap();
        let mut e = entry(None);
        e.message = "quote \" and\nnewline";
        let value = json(&encoder, &e, &[]);
        assert_eq!(value["msg"], "quote \" and\nnewline");
    }

    #[test]
    fn test_duration_encodings() {
        let field = [Field::duration("backoff", Duration::from_millis(1500))];
        let cases = [
            (DurationEncoding::Seconds, serde_json::json!(1.5)),
            (DurationEncoding::Millis, serde_json::json!(1500)),
            (DurationEncoding::Nanos, serde_json::json!(1_500_000_000u64)),
            (DurationEncoding::String, serde_json::json!("1.5s")),
        ];
        for (encoding, expected) in cases {
            let config = EncoderConfig {
                duration_encoding: encoding,
                ..EncoderConfig::default()
            };
            let encoder = Encoder::new(Encoding::Json, config).unwrap();
            let value = json(&encoder, &entry(None), &[&field]);
            assert_eq!(value["backoff"], expected, "{:?}", encoding);
        }
    }

    #[test]
    fn test_capital_levels_and_name() {
        let config = EncoderConfig {
            level_encoding: LevelEncoding::Capital,
            ..EncoderConfig::default()
        };
        let encoder = Encoder::new(Encoding::Json, config).unwrap();
        let mut e = entry(None);
        e.level = Level::DPanic;
        e.name = Some("db");
        let value = json(&encoder, &e, &[]);
        assert_eq!(value["level"], "DPANIC");
        assert_eq!(value["name"], "db");
    }

    #[test]
    fn test_console_layout() {
        let encoder = Encoder::new(Encoding::Console, EncoderConfig::default()).unwrap();
        let caller = Caller {
            file: Cow::Borrowed("src/main.rs"),
            line: 7,
            function: None,
        };
        let line = encoder.encode(
            &entry(Some(&caller)),
            &[&[Field::string("name", "zhangsan"), Field::int("age", 18)]],
        );
        assert_eq!(
            line,
            concat!(
                "2026-01-09 10:20:30.123\tinfo\tsrc/main.rs:7\thello world\t",
                "{\"name\":\"zhangsan\",\"age\":18}\n"
            )
        );
    }

    #[test]
    fn test_console_without_fields_has_no_trailing_object() {
        let encoder = Encoder::new(Encoding::Console, EncoderConfig::default()).unwrap();
        let line = encoder.encode(&entry(None), &[&[]]);
        assert_eq!(line, "2026-01-09 10:20:30.123\tinfo\thello world\n");
    }

    #[test]
    fn test_console_stacktrace_on_next_line() {
        let encoder = Encoder::new(Encoding::Console, EncoderConfig::default()).unwrap();
        let mut e = entry(None);
        e.stacktrace = Some("   0: app::main\n");
        let line = encoder.encode(&e, &[]);
        assert_eq!(line, "2026-01-09 10:20:30.123\tinfo\thello world\n   0: app::main\n");
    }

    #[test]
    fn test_fallback_matches_default_format() {
        let fallback = Encoder::fallback();
        let configured = Encoder::new(Encoding::Json, EncoderConfig::default()).unwrap();
        let e = entry(None);
        assert_eq!(fallback.encode(&e, &[]), configured.encode(&e, &[]));
    }

    #[test]
    fn test_invalid_time_format() {
        let config = EncoderConfig {
            time_format: "[nonsense]".to_string(),
            ..EncoderConfig::default()
        };
        assert!(matches!(
            Encoder::new(Encoding::Json, config),
            Err(Error::Time(_))
        ));
    }
}
