use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use time::Duration;

use crate::RotationPolicy;
use crate::rotation::{backup_name, backup_parts, parse_backup_time};

/// State of the active log file.
#[derive(Debug)]
struct FileState {
    file: File,
    size: u64,
}

/// A writer that rotates its file once it would grow past the size limit,
/// then prunes old backups by count and age.
///
/// The file is opened on the first write, so building a writer never touches
/// the filesystem.
#[derive(Debug)]
pub struct RotatingWriter {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<Option<FileState>>,
}

impl RotatingWriter {
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Option<FileState>> {
        // A panic mid-write leaves the state usable; the file handle is still valid.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Close the active file, move it aside as a timestamped backup and start a new one.
    pub fn rotate(&self) -> io::Result<()> {
        let mut guard = self.lock();
        self.rotate_locked(&mut guard)
    }

    fn rotate_locked(&self, guard: &mut Option<FileState>) -> io::Result<()> {
        *guard = None;
        self.open_new(guard)?;
        self.prune();
        Ok(())
    }

    /// Open the existing file if the next write fits, otherwise rotate first.
    fn open_existing_or_new(
        &self,
        guard: &mut Option<FileState>,
        write_len: u64,
    ) -> io::Result<()> {
        let Ok(metadata) = std::fs::metadata(&self.path) else {
            return self.open_new(guard);
        };

        if metadata.len() + write_len >= self.policy.max_bytes() {
            return self.rotate_locked(guard);
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        *guard = Some(FileState {
            file,
            size: metadata.len(),
        });
        Ok(())
    }

    /// Move any current file aside and create a fresh one.
    fn open_new(&self, guard: &mut Option<FileState>) -> io::Result<()> {
        // Ensure the parent directory exists so paths like `logs/app.log` work
        // without the caller creating `logs/` first.
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        if self.path.exists() {
            let backup = backup_name(&self.path, self.policy.now());
            std::fs::rename(&self.path, backup)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        *guard = Some(FileState { file, size: 0 });
        Ok(())
    }

    /// Backups of this file, newest first.
    fn backups(&self) -> io::Result<Vec<(PathBuf, time::PrimitiveDateTime)>> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (prefix, ext) = backup_parts(&self.path);

        let mut backups: Vec<_> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                parse_backup_time(&name, &prefix, &ext).map(|at| (entry.path(), at))
            })
            .collect();

        backups.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(backups)
    }

    /// Remove backups beyond `max_backups` and older than `max_age_days`.
    ///
    /// Failures are reported on stderr; a failed cleanup must not fail the write.
    fn prune(&self) {
        if self.policy.max_backups == 0 && self.policy.max_age_days == 0 {
            return;
        }

        let backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                eprintln!("oncelog: failed to list backups of {}: {}", self.path.display(), e);
                return;
            }
        };

        let now = self.policy.now();
        let cutoff = now - Duration::days(i64::from(self.policy.max_age_days));
        let cutoff = time::PrimitiveDateTime::new(cutoff.date(), cutoff.time());

        for (index, (path, at)) in backups.iter().enumerate() {
            let too_many = self.policy.max_backups > 0 && index >= self.policy.max_backups;
            let too_old = self.policy.max_age_days > 0 && *at < cutoff;
            if (too_many || too_old)
                && let Err(e) = std::fs::remove_file(path)
            {
                eprintln!("oncelog: failed to remove backup {}: {}", path.display(), e);
            }
        }
    }

    fn write_locked(&self, buf: &[u8]) -> io::Result<usize> {
        let write_len = buf.len() as u64;
        let max_size = self.policy.max_bytes();
        if write_len > max_size {
            return Err(io::Error::other(format!(
                "write length {} exceeds maximum file size {}",
                write_len, max_size
            )));
        }

        let mut guard = self.lock();
        match guard.as_ref() {
            None => self.open_existing_or_new(&mut guard, write_len)?,
            Some(state) if state.size + write_len > max_size => {
                self.rotate_locked(&mut guard)?
            }
            Some(_) => {}
        }

        let state = guard
            .as_mut()
            .ok_or_else(|| io::Error::other("failed to open log file"))?;
        let written = state.file.write(buf)?;
        state.size += written as u64;
        Ok(written)
    }

    fn flush_locked(&self) -> io::Result<()> {
        let guard = self.lock();
        match guard.as_ref() {
            Some(state) => state.file.sync_all(),
            None => Ok(()),
        }
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_locked(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_locked()
    }
}

impl Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_locked(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.starts_with("test-") && name.ends_with(".log")
            })
            .count()
    }

    #[test]
    fn test_rotating_writer_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let _writer = RotatingWriter::new(&log_path, RotationPolicy::default());
        assert!(!log_path.exists());
    }

    #[test]
    fn test_rotating_writer_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let mut writer = RotatingWriter::new(&log_path, RotationPolicy::default());

        writer.write_all(b"hello world\n").unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("hello world"));
    }

    #[test]
    fn test_rotating_writer_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/inner");
        let log_path = nested.join("test.log");
        assert!(!nested.exists());

        let mut writer = RotatingWriter::new(&log_path, RotationPolicy::default());
        writer.write_all(b"hello parent\n").unwrap();
        writer.flush().unwrap();

        assert!(nested.exists(), "parent directories should have been created");
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("hello parent"));
    }

    #[test]
    fn test_rotating_writer_reuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        std::fs::write(&log_path, b"existing content\n").unwrap();

        let mut writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default().with_max_size_bytes(100),
        );
        writer.write_all(b"new content\n").unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("existing content"));
        assert!(content.contains("new content"));
        assert_eq!(backup_count(dir.path()), 0);
    }

    #[test]
    fn test_rotating_writer_rotates_full_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        std::fs::write(&log_path, vec![b'x'; 90]).unwrap();

        let mut writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default().with_max_size_bytes(100),
        );
        writer.write_all(b"0123456789abcdef\n").unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content, "0123456789abcdef\n");
        assert_eq!(backup_count(dir.path()), 1);
    }

    #[test]
    fn test_rotating_writer_size_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let mut writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default().with_max_size_bytes(50),
        );

        for i in 0..3 {
            writer
                .write_all(format!("line {} - some padding text here\n", i).as_bytes())
                .unwrap();
            // Backup names carry millisecond timestamps.
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("line 2"));
        assert!(!content.contains("line 1"));
        assert_eq!(backup_count(dir.path()), 2);
    }

    #[test]
    fn test_rotating_writer_zero_max_size_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let writer = RotatingWriter::new(&log_path, RotationPolicy::default().with_max_size_mb(0));
        assert_eq!(writer.path(), log_path.as_path());
        assert_eq!(writer.policy().max_bytes(), 128 * 1024 * 1024);

        for i in 0..3 {
            (&writer).write_all(format!("line {}\n", i).as_bytes()).unwrap();
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content, "line 0\nline 1\nline 2\n");
        assert_eq!(backup_count(dir.path()), 0);
    }

    #[test]
    fn test_rotating_writer_rejects_oversized_write() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let mut writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default().with_max_size_bytes(8),
        );

        let err = writer.write(b"far more than eight bytes").unwrap_err();
        assert!(err.to_string().contains("exceeds maximum file size"));
    }

    #[test]
    fn test_rotating_writer_prunes_by_count() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default()
                .with_max_size_bytes(1024)
                .with_max_backups(2),
        );

        for i in 0..5 {
            (&writer)
                .write_all(format!("generation {}\n", i).as_bytes())
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
            writer.rotate().unwrap();
        }

        assert_eq!(backup_count(dir.path()), 2);
        let newest = writer.backups().unwrap();
        let content = std::fs::read_to_string(&newest[0].0).unwrap();
        assert_eq!(content, "generation 4\n");
    }

    #[test]
    fn test_rotating_writer_prunes_by_age() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let stale = dir.path().join("test-2000-01-01T00-00-00.000.log");
        std::fs::write(&stale, b"old\n").unwrap();

        let writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default()
                .with_max_age_days(1)
                .with_max_backups(0),
        );
        (&writer).write_all(b"current\n").unwrap();
        writer.rotate().unwrap();

        assert!(!stale.exists(), "stale backup should have been removed");
        assert_eq!(backup_count(dir.path()), 1);
    }

    #[test]
    fn test_rotating_writer_keeps_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        let unrelated = dir.path().join("other-2000-01-01T00-00-00.000.log");
        std::fs::write(&unrelated, b"keep me\n").unwrap();

        let writer = RotatingWriter::new(
            &log_path,
            RotationPolicy::default().with_max_age_days(1),
        );
        (&writer).write_all(b"current\n").unwrap();
        writer.rotate().unwrap();

        assert!(unrelated.exists());
    }
}
