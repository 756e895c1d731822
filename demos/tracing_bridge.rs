//! Sending `tracing` events through the global logger.
//!
//! `RUST_LOG` overrides the level for `tracing` events when set.

use oncelog::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    oncelog::builder()
        .with_level(Level::Debug)
        .with_preset_field("app", "bridge-demo")
        .init()?;

    tracing::trace!("This is a trace message (usually not visible)");
    tracing::debug!("This is a debug message");
    tracing::info!(user_id = 12345, username = "admin", "User authenticated");
    tracing::warn!(retry_count = 3, "Connection unstable, retrying");

    oncelog::info("written by the facade, next to the tracing events", &[]);

    oncelog::shutdown()?;
    Ok(())
}
