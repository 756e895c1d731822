use oncelog::{Level, SharedWriter};
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_builder_init_routes_tracing_events() {
    // SAFETY: no other thread in this binary reads the environment.
    unsafe {
        std::env::remove_var("RUST_LOG");
    }

    let buf = Buffer::default();
    oncelog::builder()
        .without_stdout()
        .with_writer(SharedWriter::new(buf.clone()))
        .with_level(Level::Info)
        .with_preset_field("app", "bridge-test")
        .init()
        .expect("Failed to initialize logging");

    tracing::debug!("filtered");
    tracing::info!(request_id = "abc", status = 200, "handled");
    oncelog::warn("direct", &[]);

    // A second tracing subscriber cannot be installed.
    assert!(oncelog::install_global().is_err());
    oncelog::sync().unwrap();

    let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    let lines: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["msg"], "handled");
    assert_eq!(lines[0]["request_id"], "abc");
    assert_eq!(lines[0]["status"], 200);
    assert_eq!(lines[0]["name"], "tracing_bridge");
    assert_eq!(lines[0]["app"], "bridge-test");
    assert_eq!(lines[1]["msg"], "direct");
    assert_eq!(lines[1]["level"], "warn");
}
