//! Call-site resolution for the caller element of a record.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

use crate::config::CallerEncoding;

/// Symbol prefixes that never count as the user's frame.
const INTERNAL_PREFIXES: &[&str] = &[
    "oncelog::",
    "std::",
    "core::",
    "alloc::",
    "__rust",
    "rust_begin_unwind",
];

/// Where a record was logged from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: Cow<'static, str>,
    pub line: u32,
    /// Only known when the caller was resolved from a backtrace.
    pub function: Option<String>,
}

impl Caller {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: Cow::Borrowed(location.file()),
            line: location.line(),
            function: None,
        }
    }

    /// Render as `file:line` in the requested form.
    pub fn encode(&self, encoding: CallerEncoding) -> String {
        match encoding {
            CallerEncoding::Full => format!("{}:{}", self.file, self.line),
            CallerEncoding::Short => format!("{}:{}", short_path(&self.file), self.line),
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Keep the last directory and the file name.
fn short_path(path: &str) -> &str {
    let mut seps = path.rmatch_indices(['/', '\\']);
    match (seps.next(), seps.next()) {
        (Some(_), Some((idx, _))) => &path[idx + 1..],
        _ => path,
    }
}

/// Resolve the caller `skip` frames above the logging call.
///
/// `skip <= 1` means the code that called into this crate, which
/// `#[track_caller]` already delivers as `location`. Deeper skips walk a
/// captured backtrace and fall back to `location` when symbols are missing.
pub fn resolve(skip: usize, location: &'static Location<'static>) -> Caller {
    if skip <= 1 {
        return Caller::from_location(location);
    }

    let trace = Backtrace::force_capture().to_string();
    frames(&trace)
        .into_iter()
        .skip_while(|frame| is_internal(&frame.symbol))
        .nth(skip - 1)
        .and_then(|frame| {
            let (file, line) = frame.location?;
            Some(Caller {
                file: Cow::Owned(file),
                line,
                function: Some(frame.symbol),
            })
        })
        .unwrap_or_else(|| Caller::from_location(location))
}

#[derive(Debug, PartialEq)]
struct Frame {
    symbol: String,
    location: Option<(String, u32)>,
}

fn is_internal(symbol: &str) -> bool {
    let symbol = symbol.trim_start_matches('<');
    INTERNAL_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

/// Parse the textual form of a `std` backtrace:
///
/// ```text
///    3: app::handler
///              at ./src/main.rs:12:5
/// ```
fn frames(trace: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in trace.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut()
                && frame.location.is_none()
            {
                frame.location = parse_location(rest);
            }
            continue;
        }

        if let Some((index, symbol)) = line.split_once(": ")
            && !index.is_empty()
            && index.chars().all(|c| c.is_ascii_digit())
        {
            frames.push(Frame {
                symbol: strip_hash(symbol.trim()).to_string(),
                location: None,
            });
        }
    }

    frames
}

/// `./src/main.rs:12:5` -> (`./src/main.rs`, 12)
fn parse_location(s: &str) -> Option<(String, u32)> {
    let mut parts = s.rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some((file.to_string(), line))
}

/// Drop the `::h0123456789abcdef` disambiguator some toolchains print.
fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:13
   1: oncelog::caller::resolve
             at ./src/caller.rs:70:17
   2: <oncelog::logger::Logger>::log
             at ./src/logger.rs:120:9
   3: app::handler::h0123456789abcdef
             at ./src/handler.rs:12:5
   4: app::main
             at ./src/main.rs:4:5
   5: core::ops::function::FnOnce::call_once
";

    #[test]
    fn test_frames_parse() {
        let frames = frames(TRACE);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[3].symbol, "app::handler");
        assert_eq!(
            frames[3].location,
            Some(("./src/handler.rs".to_string(), 12))
        );
        assert_eq!(frames[5].location, None);
    }

    #[test]
    fn test_internal_frames_are_skipped() {
        let user: Vec<_> = frames(TRACE)
            .into_iter()
            .skip_while(|f| is_internal(&f.symbol))
            .map(|f| f.symbol)
            .collect();
        assert_eq!(user[0], "app::handler");
        assert_eq!(user[1], "app::main");
    }

    #[test]
    fn test_short_path() {
        assert_eq!(short_path("/home/me/app/src/main.rs"), "src/main.rs");
        assert_eq!(short_path("src/main.rs"), "src/main.rs");
        assert_eq!(short_path("main.rs"), "main.rs");
        assert_eq!(short_path(r"C:\app\src\main.rs"), r"src\main.rs");
    }

    #[test]
    fn test_caller_encode() {
        let caller = Caller {
            file: Cow::Borrowed("/work/app/src/lib.rs"),
            line: 42,
            function: None,
        };
        assert_eq!(caller.encode(CallerEncoding::Full), "/work/app/src/lib.rs:42");
        assert_eq!(caller.encode(CallerEncoding::Short), "src/lib.rs:42");
    }

    #[test]
    fn test_resolve_with_default_skip_uses_location() {
        let caller = resolve(1, Location::caller());
        assert!(caller.file.ends_with("caller.rs"));
        assert!(caller.function.is_none());
    }

    #[test]
    fn test_strip_hash_keeps_plain_symbols() {
        assert_eq!(strip_hash("app::handler"), "app::handler");
        assert_eq!(strip_hash("app::handler::hzz"), "app::handler::hzz");
    }
}
