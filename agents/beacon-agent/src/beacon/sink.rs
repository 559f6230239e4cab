//! Log Sink
//!
//! The scheduler reports each cycle as plain lines through an injected
//! sink rather than a process-wide logger.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Destination for the scheduler's outcome lines
pub trait LogSink: Send + Sync {
    /// Append one line
    fn append(&self, line: &str);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn append(&self, line: &str) {
        (**self).append(line)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn append(&self, line: &str) {
        (**self).append(line)
    }
}

/// Writes bare lines to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn append(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not take the loop down
        let _ = writeln!(out, "{}", line);
    }
}

/// Forwards lines to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append(&self, line: &str) {
        tracing::info!(target: "beacon", "{}", line);
    }
}

/// Keeps every line in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for MemorySink {
    fn append(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
