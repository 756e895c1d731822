//! Basic global logging example.
//!
//! The global logger is built on the first logging call from the options
//! applied before it.

use oncelog::options::{self, max_age, max_size};
use oncelog::Field;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    oncelog::configure([
        options::level("debug"),
        options::out_file("./log/test.log", [max_size(128), max_age(7)]),
    ])?;

    oncelog::debug("This is a debug message", &[]);
    oncelog::info(
        "hello world",
        &[Field::string("name", "zhangsan"), Field::int("age", 18)],
    );
    oncelog::warn("This is a warning message", &[Field::bool("retry", true)]);
    oncelog::error("This is an error message", &[]);

    // Child loggers share the sinks and carry extra context.
    let db = oncelog::logger().named("db").with(&[Field::string("table", "users")]);
    db.info("query finished", &[Field::duration("elapsed", std::time::Duration::from_millis(42))]);

    oncelog::sync()?;
    Ok(())
}
