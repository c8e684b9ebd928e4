//! External `kotlinc` process backend
//!
//! A [`Compiler`] implementation that shells out to a kotlinc binary and
//! parses its stderr into diagnostic records. Used by the CLI; library
//! callers embedding a real in-process compiler provide their own
//! implementation instead.
//!
//! The external compiler has no incremental entry point of its own, so the
//! incremental path recompiles the full source set into the cache classes
//! directory and relies on the snapshot-diff sync to leave unchanged
//! artifacts alone.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::arguments::ArgumentBundle;
use crate::changes::ChangeSet;
use crate::compiler::{Compiler, CompilerFault, IcReporter};
use crate::messages::{DiagnosticRecord, MessageCollector, Severity, SourceLocation};

/// Shells out to a `kotlinc` binary.
#[derive(Debug, Clone)]
pub struct KotlincCompiler {
    binary: PathBuf,
}

impl KotlincCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Compiler for KotlincCompiler {
    fn compile(&self, bundle: &ArgumentBundle, collector: &mut MessageCollector) -> i32 {
        let output = match Command::new(&self.binary).args(bundle.to_argv()).output() {
            Ok(output) => output,
            Err(e) => {
                collector.report(
                    Severity::Error,
                    &format!("could not run {}: {e}", self.binary.display()),
                    None,
                );
                return 2;
            }
        };

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record = parse_diagnostic(line);
            collector.report(record.severity, &record.message, record.location);
        }

        output.status.code().unwrap_or(2)
    }

    fn compile_incrementally(
        &self,
        _cache_dir: &Path,
        source_roots: &[PathBuf],
        bundle: &ArgumentBundle,
        _changes: Option<&ChangeSet>,
        collector: &mut MessageCollector,
        reporter: &mut IcReporter<'_>,
    ) -> Result<(), CompilerFault> {
        reporter.report("external compiler rebuilds the full source set");

        let code = self.compile(bundle, collector);
        match code {
            // 0 and 1 both mean the compiler ran; the diagnostics decide.
            0 | 1 => {
                let status = crate::compiler::ExitStatus::from_code(code);
                reporter.compile_iteration(source_roots, status);
                Ok(())
            }
            other => Err(CompilerFault(format!(
                "{} exited with unexpected code {other}",
                self.binary.display()
            ))),
        }
    }
}

/// Parse one stderr line into a diagnostic record.
///
/// Recognizes `file:line:col: severity: message` and bare
/// `severity: message`; anything else becomes an `Other` record carrying
/// the raw line.
pub fn parse_diagnostic(line: &str) -> DiagnosticRecord {
    const LEVELS: [(&str, Severity); 3] = [
        ("error: ", Severity::Error),
        ("warning: ", Severity::Warning),
        ("info: ", Severity::Info),
    ];

    for (prefix, severity) in LEVELS {
        if let Some(message) = line.strip_prefix(prefix) {
            return DiagnosticRecord {
                severity,
                message: message.to_string(),
                location: None,
            };
        }
    }

    for (prefix, severity) in LEVELS {
        let needle = format!(": {prefix}");
        if let Some(idx) = line.find(&needle) {
            let message = line[idx + needle.len()..].to_string();
            return DiagnosticRecord {
                severity,
                message,
                location: parse_location(&line[..idx]),
            };
        }
    }

    DiagnosticRecord {
        severity: Severity::Other,
        message: line.to_string(),
        location: None,
    }
}

fn parse_location(text: &str) -> Option<SourceLocation> {
    let (rest, column) = text.rsplit_once(':')?;
    let (file, line) = rest.rsplit_once(':')?;
    Some(SourceLocation {
        file: PathBuf::from(file),
        line: line.trim().parse().ok()?,
        column: column.trim().parse().ok()?,
    })
}
