use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE: u64 = 128 * MEGABYTE;

/// Timestamp layout embedded in backup file names.
const BACKUP_TIME_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second].[subsecond digits:3]");

/// Parse a size string with optional units (B/K/M/G, case-insensitive),
/// defaulting to MB if no unit.
fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, unit) = if last.is_alphabetic() {
        (&s[..s.len() - last.len_utf8()], last.to_ascii_uppercase())
    } else {
        (s, 'M')
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let multiplier = match unit {
        'B' => 1,
        'K' => 1024,
        'M' => MEGABYTE,
        'G' => 1024 * MEGABYTE,
        _ => return Err(format!("invalid unit: {}, supported: B/K/M/G", unit)),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Render a byte count with the largest unit that divides it evenly.
fn format_size(bytes: u64) -> String {
    if bytes != 0 && bytes % (1024 * MEGABYTE) == 0 {
        format!("{}G", bytes / (1024 * MEGABYTE))
    } else if bytes != 0 && bytes % MEGABYTE == 0 {
        format!("{}M", bytes / MEGABYTE)
    } else if bytes != 0 && bytes % 1024 == 0 {
        format!("{}K", bytes / 1024)
    } else {
        format!("{}B", bytes)
    }
}

/// Size value that can be a number (megabytes) or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

impl SizeValue {
    fn to_bytes(&self) -> Result<u64, String> {
        match self {
            SizeValue::Number(n) => n
                .checked_mul(MEGABYTE)
                .ok_or_else(|| "size too large".to_string()),
            SizeValue::String(s) => parse_size(s),
        }
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    SizeValue::deserialize(deserializer)?
        .to_bytes()
        .map_err(serde::de::Error::custom)
}

fn serialize_size<S>(bytes: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_size(*bytes))
}

/// Rotation and retention policy for a file sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Maximum size of the active file in bytes before it is rotated.
    /// 0 means the default of 128 MiB. Can be specified as a number (megabytes)
    /// or a string with units (B/K/M/G, case-insensitive). Examples: 128
    /// (128MB), "512K", "1G".
    #[serde(deserialize_with = "deserialize_size", serialize_with = "serialize_size")]
    pub max_size: u64,
    /// Days to keep backups, judged by the timestamp in their name. 0 keeps them forever.
    pub max_age_days: u32,
    /// Number of backups to keep. 0 keeps all of them.
    pub max_backups: usize,
    /// Use local time rather than UTC for backup timestamps.
    pub local_time: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_age_days: 30,
            max_backups: 30,
            local_time: true,
        }
    }
}

impl RotationPolicy {
    /// Set the maximum size in megabytes.
    pub fn with_max_size_mb(mut self, megabytes: u64) -> Self {
        self.max_size = megabytes.saturating_mul(MEGABYTE);
        self
    }

    /// Set the maximum size in bytes.
    pub fn with_max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    pub fn with_max_age_days(mut self, days: u32) -> Self {
        self.max_age_days = days;
        self
    }

    pub fn with_max_backups(mut self, backups: usize) -> Self {
        self.max_backups = backups;
        self
    }

    pub fn with_local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    /// The size limit the writer enforces; an unset (zero) `max_size` falls
    /// back to the default.
    pub fn max_bytes(&self) -> u64 {
        if self.max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            self.max_size
        }
    }

    /// Current time in the zone this policy names backups in.
    pub fn now(&self) -> OffsetDateTime {
        if self.local_time {
            OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
        } else {
            OffsetDateTime::now_utc()
        }
    }
}

/// Split a log path into the backup name prefix (`<stem>-`) and extension (`.log`).
pub fn backup_parts(path: &Path) -> (String, String) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stem = &file_name[..file_name.len() - ext.len()];
    (format!("{}-", stem), ext)
}

/// Path of the backup for `path` taken at `at`: `app.log` -> `app-2026-01-09T10-00-00.000.log`.
pub fn backup_name(path: &Path, at: OffsetDateTime) -> PathBuf {
    let (prefix, ext) = backup_parts(path);
    let stamp = at
        .format(BACKUP_TIME_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    let name = format!("{}{}{}", prefix, stamp, ext);
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Recover the timestamp from a backup file name, if it is one of ours.
pub fn parse_backup_time(file_name: &str, prefix: &str, ext: &str) -> Option<PrimitiveDateTime> {
    let stamp = file_name.strip_prefix(prefix)?.strip_suffix(ext)?;
    PrimitiveDateTime::parse(stamp, BACKUP_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("10").unwrap(), 10 * MEGABYTE);
        assert_eq!(parse_size("5K").unwrap(), 5 * 1024);
        assert_eq!(parse_size("2m").unwrap(), 2 * MEGABYTE);
        assert_eq!(parse_size("1G").unwrap(), 1024 * MEGABYTE);
        assert_eq!(parse_size("300b").unwrap(), 300);
        assert!(parse_size("").is_err());
        assert!(parse_size("12X").is_err());
        assert!(parse_size("abcK").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(128 * MEGABYTE), "128M");
        assert_eq!(format_size(512 * 1024), "512K");
        assert_eq!(format_size(2 * 1024 * MEGABYTE), "2G");
        assert_eq!(format_size(100), "100B");
        assert_eq!(format_size(0), "0B");
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_size, 128 * MEGABYTE);
        assert_eq!(policy.max_age_days, 30);
        assert_eq!(policy.max_backups, 30);
        assert!(policy.local_time);
    }

    #[test]
    fn test_zero_max_size_uses_default() {
        let policy = RotationPolicy::default().with_max_size_mb(0);
        assert_eq!(policy.max_size, 0);
        assert_eq!(policy.max_bytes(), 128 * MEGABYTE);
        assert_eq!(
            RotationPolicy::default().with_max_size_bytes(300).max_bytes(),
            300
        );
    }

    #[test]
    fn test_policy_deserialize() {
        let yaml = r#"
max_size: 10
max_backups: 5
"#;
        let policy: RotationPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.max_size, 10 * MEGABYTE);
        assert_eq!(policy.max_backups, 5);
        assert_eq!(policy.max_age_days, 30);

        let yaml = r#"
max_size: "512k"
max_age_days: 7
local_time: false
"#;
        let policy: RotationPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.max_size, 512 * 1024);
        assert_eq!(policy.max_age_days, 7);
        assert!(!policy.local_time);
    }

    #[test]
    fn test_policy_serialize_roundtrips_size() {
        let policy = RotationPolicy::default().with_max_size_bytes(300);
        let yaml = serde_yaml::to_string(&policy).unwrap();
        assert!(yaml.contains("300B"));
        let back: RotationPolicy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn test_backup_name_and_parse() {
        let at = datetime!(2026-01-09 10:20:30.123 UTC);
        let path = Path::new("/var/log/app.log");
        let backup = backup_name(path, at);
        assert_eq!(
            backup,
            PathBuf::from("/var/log/app-2026-01-09T10-20-30.123.log")
        );

        let (prefix, ext) = backup_parts(path);
        assert_eq!(prefix, "app-");
        assert_eq!(ext, ".log");
        let parsed = parse_backup_time("app-2026-01-09T10-20-30.123.log", &prefix, &ext).unwrap();
        assert_eq!(parsed, datetime!(2026-01-09 10:20:30.123));

        assert!(parse_backup_time("app.log", &prefix, &ext).is_none());
        assert!(parse_backup_time("other-2026-01-09T10-20-30.123.log", &prefix, &ext).is_none());
    }

    #[test]
    fn test_backup_name_without_extension() {
        let at = datetime!(2026-03-01 00:00:00 UTC);
        let backup = backup_name(Path::new("server"), at);
        assert_eq!(backup, PathBuf::from("server-2026-03-01T00-00-00.000"));
    }
}
