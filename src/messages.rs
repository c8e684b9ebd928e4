//! Diagnostic collection
//!
//! Every compilation strategy reports through a [`MessageCollector`] and
//! finishes by turning it into a [`CollectedOutput`]: the ordered diagnostic
//! sequence plus the derived error flag. The flag is always recomputed as a
//! fold over the records, never cached, so a collector can be cleared and
//! reused across sequential single-shot runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Diagnostic severity as reported by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
    /// Anything the compiler emits outside the known levels (logging noise,
    /// raw output lines relayed by the daemon).
    Other,
}

impl Severity {
    /// Whether a record at this severity makes the run a compilation failure.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Other => "other",
        }
    }
}

/// Position a diagnostic points at, when the compiler provided one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

/// One diagnostic as reported by a compiler run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Accumulates diagnostics for a single compilation run.
///
/// Not safe for concurrent reporting; each run owns exactly one collector.
#[derive(Debug, Default)]
pub struct MessageCollector {
    records: Vec<DiagnosticRecord>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Insertion order is the display order.
    pub fn report(&mut self, severity: Severity, message: &str, location: Option<SourceLocation>) {
        self.records.push(DiagnosticRecord {
            severity,
            message: message.to_string(),
            location,
        });
    }

    /// True iff any collected record has error severity.
    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.severity.is_error())
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// Drop all records, keeping the allocation for the next run.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Finish the run, yielding the immutable output value.
    pub fn into_output(self) -> CollectedOutput {
        CollectedOutput {
            records: self.records,
        }
    }
}

/// The diagnostic output of one finished compilation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedOutput {
    records: Vec<DiagnosticRecord>,
}

impl CollectedOutput {
    /// Output with no diagnostics at all, used when a run never reached the
    /// compiler (unreachable daemon, unresolvable output directory).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.severity.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl From<Vec<DiagnosticRecord>> for CollectedOutput {
    fn from(records: Vec<DiagnosticRecord>) -> Self {
        Self { records }
    }
}
