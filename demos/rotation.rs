//! Size-based rotation with retention by count.

use oncelog::{FileLogConfig, RotationPolicy};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let log_path = temp_dir.path().join("test.log");

    let file_config = FileLogConfig::new(&log_path).with_rotation(
        RotationPolicy::default()
            .with_max_size_bytes(4 * 1024)
            .with_max_backups(3),
    );
    let logger = oncelog::builder()
        .without_stdout()
        .with_file_config(file_config)
        .build_logger()?;

    let sugar = logger.sugar();
    for i in 0..200 {
        sugar.infof(format_args!("Log message number {}", i));
    }
    logger.sync()?;

    let mut files: Vec<_> = std::fs::read_dir(temp_dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    for name in files {
        println!("{}", name);
    }

    Ok(())
}
