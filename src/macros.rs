//! Formatting and key/value macros over the global facade.
//!
//! ```rust,no_run
//! oncelog::infof!("hello world; name:{}; age:{}", "zhangsan", 18);
//! oncelog::infow!("failed to fetch URL", "url" => "http://example.com", "attempt" => 3);
//! ```

/// Convert a value for the key/value API. Serialization failures are
/// recorded as the error text.
#[doc(hidden)]
pub fn __to_value<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| serde_json::Value::String(e.to_string()))
}

/// Log a formatted message at `debug` through the global logger.
#[macro_export]
macro_rules! debugf {
    ($($arg:tt)+) => {
        $crate::debugf(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `debug` through the global logger.
#[macro_export]
macro_rules! debugw {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::debugw($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}

/// Log a formatted message at `info` through the global logger.
#[macro_export]
macro_rules! infof {
    ($($arg:tt)+) => {
        $crate::infof(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `info` through the global logger.
#[macro_export]
macro_rules! infow {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::infow($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}

/// Log a formatted message at `warn` through the global logger.
#[macro_export]
macro_rules! warnf {
    ($($arg:tt)+) => {
        $crate::warnf(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `warn` through the global logger.
#[macro_export]
macro_rules! warnw {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::warnw($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}

/// Log a formatted message at `error` through the global logger.
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::errorf(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `error` through the global logger.
#[macro_export]
macro_rules! errorw {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::errorw($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}

/// Log a formatted message at `dpanic` through the global logger.
#[macro_export]
macro_rules! dpanicf {
    ($($arg:tt)+) => {
        $crate::dpanicf(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `dpanic` through the global logger.
#[macro_export]
macro_rules! dpanicw {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::dpanicw($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}

/// Log a formatted message at `panic` through the global logger.
#[macro_export]
macro_rules! panicf {
    ($($arg:tt)+) => {
        $crate::panicf(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `panic` through the global logger.
#[macro_export]
macro_rules! panicw {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::panicw($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}

/// Log a formatted message at `fatal` through the global logger.
#[macro_export]
macro_rules! fatalf {
    ($($arg:tt)+) => {
        $crate::fatalf(::std::format_args!($($arg)+))
    };
}

/// Log a message with `key => value` pairs at `fatal` through the global logger.
#[macro_export]
macro_rules! fatalw {
    ($msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::fatalw($msg, &[$(($key, $crate::macros::__to_value(&$value))),*])
    };
}
