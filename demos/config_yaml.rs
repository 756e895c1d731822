//! Loading the logger configuration from YAML.
//!
//! Run with:
//! ```bash
//! cargo run --example config_yaml
//! ```

use std::collections::HashMap;

use oncelog::options;

const CONFIG: &str = r#"
log:
  level: debug
  encoding: console
  encoder:
    caller_encoding: short
  sinks:
    - type: stdout
    - type: file
      path: log/yaml.log
      rotation:
        max_size: "10M"
        max_backups: 3
        max_age_days: 7
  preset_fields:
    service: billing
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(CONFIG)?;
    let config: oncelog::LogConfig = serde_yaml::from_value(root["log"].clone())?;

    oncelog::configure([options::config(config)])?;

    oncelog::debug("This is a debug message", &[]);
    oncelog::infow!("User performed an action", "user" => "alice", "action" => "login");
    oncelog::warnw!("Resource not found", "error_code" => 404, "path" => "/api/users");

    oncelog::sync()?;
    Ok(())
}
