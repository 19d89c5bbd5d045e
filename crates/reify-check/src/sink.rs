use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;

use crate::CheckLocationKind;

/// One detected cast mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastDiagnostic {
    /// Human-meaningful part of the site id (everything after the first `!`).
    pub site: String,
    pub kind: CheckLocationKind,
    pub actual: String,
    pub expected: String,
}

impl fmt::Display for CastDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} to {}",
            self.site, self.kind, self.actual, self.expected
        )
    }
}

/// Destination for cast diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &CastDiagnostic);
}

/// Prints each diagnostic as one line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn report(&self, diagnostic: &CastDiagnostic) {
        println!("{diagnostic}");
    }
}

/// Keeps the most recent diagnostic lines in memory.
#[derive(Debug)]
pub struct MemorySink {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_line(&self, line: String) {
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Up to `n` of the most recent lines, oldest first.
    pub fn last_lines(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock();
        let skip = lines.len().saturating_sub(n);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &CastDiagnostic) {
        self.push_line(diagnostic.to_string());
    }
}
