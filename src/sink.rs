//! Output destinations for encoded records.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

use crate::RotatingWriter;

/// A cloneable handle to a caller-supplied writer.
#[derive(Clone)]
pub struct SharedWriter(Arc<Mutex<dyn Write + Send>>);

impl SharedWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    fn with<T>(&self, f: impl FnOnce(&mut (dyn Write + Send)) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self.0.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *guard)
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedWriter")
    }
}

impl PartialEq for SharedWriter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A single output destination.
#[derive(Debug, Clone)]
pub enum Sink {
    Stdout,
    Stderr,
    File(Arc<RotatingWriter>),
    Writer(SharedWriter),
}

impl Sink {
    fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().lock().write_all(buf),
            Sink::Stderr => io::stderr().lock().write_all(buf),
            Sink::File(file) => (&**file).write_all(buf),
            Sink::Writer(writer) => writer.with(|w| w.write_all(buf)),
        }
    }

    fn sync(&self) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().flush(),
            Sink::Stderr => io::stderr().flush(),
            Sink::File(file) => (&**file).flush(),
            Sink::Writer(writer) => writer.with(|w| w.flush()),
        }
    }
}

/// Fans every record out to each sink.
#[derive(Debug, Clone, Default)]
pub struct Sinks(Vec<Sink>);

impl Sinks {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self(sinks)
    }

    /// Write one record to every sink. A failing sink does not stop the
    /// others; the first error is returned.
    pub fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        let mut first_err = None;
        for sink in &self.0 {
            if let Err(e) = sink.write_record(buf) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Flush every sink, returning the first error.
    pub fn sync(&self) -> io::Result<()> {
        let mut first_err = None;
        for sink in &self.0 {
            if let Err(e) = sink.sync() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Write for Sinks {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sync()
    }
}

/// Where the logger core sends encoded bytes.
#[derive(Debug)]
pub(crate) enum Output {
    Direct(Sinks),
    /// Records are handed to a background worker.
    Buffered {
        writer: NonBlocking,
        sinks: Sinks,
        guard: Mutex<Option<WorkerGuard>>,
    },
}

impl Output {
    pub(crate) fn new(sinks: Sinks, non_blocking: bool) -> Self {
        if non_blocking {
            let (writer, guard) = tracing_appender::non_blocking(sinks.clone());
            Output::Buffered {
                writer,
                sinks,
                guard: Mutex::new(Some(guard)),
            }
        } else {
            Output::Direct(sinks)
        }
    }

    pub(crate) fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Output::Direct(sinks) => sinks.write_record(buf),
            Output::Buffered { writer, .. } => writer.clone().write_all(buf),
        }
    }

    pub(crate) fn sinks(&self) -> &Sinks {
        match self {
            Output::Direct(sinks) => sinks,
            Output::Buffered { sinks, .. } => sinks,
        }
    }

    /// Flush the sinks. Records still queued on the worker are not waited for.
    pub(crate) fn sync(&self) -> io::Result<()> {
        self.sinks().sync()
    }

    /// Drain the background worker, if any, then flush the sinks.
    pub(crate) fn shutdown(&self) -> io::Result<()> {
        if let Output::Buffered { guard, .. } = self {
            let guard = guard.lock().unwrap_or_else(|e| e.into_inner()).take();
            drop(guard);
        }
        self.sync()
    }
}
