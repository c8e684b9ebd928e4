//! Underlying compiler collaborator
//!
//! The core never parses or type-checks source itself; it drives an external
//! compiler through this interface. Two entry points exist: a single-shot
//! invocation returning a process exit code, and an in-process incremental
//! entry point reporting progress through an [`IcReporter`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arguments::ArgumentBundle;
use crate::changes::ChangeSet;
use crate::logger::Logger;
use crate::messages::MessageCollector;

/// Final status of one compilation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// The compiler ran and reported no error-severity diagnostics.
    Ok,
    /// The compiler ran to completion and reported at least one error.
    CompilationError,
    /// The orchestration itself failed: unreachable daemon, uncaught fault,
    /// missing output directory.
    InternalError,
}

impl ExitStatus {
    /// Integer result code carried on the daemon wire.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Ok => 0,
            ExitStatus::CompilationError => 1,
            ExitStatus::InternalError => 2,
        }
    }

    /// Map a remote or process result code back. Codes outside the contract
    /// are treated as internal failures.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ExitStatus::Ok,
            1 => ExitStatus::CompilationError,
            _ => ExitStatus::InternalError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExitStatus::Ok => "ok",
            ExitStatus::CompilationError => "compilation_error",
            ExitStatus::InternalError => "internal_error",
        }
    }
}

/// A fault raised by the incremental compiler entry point.
///
/// Faults are never propagated past the runner; they are logged and folded
/// into `ExitStatus::InternalError`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CompilerFault(pub String);

/// How much incremental-compilation progress gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcLogLevel {
    Info,
    #[default]
    Warning,
    Silent,
}

/// Progress reporter for incremental runs.
///
/// A severity threshold plus a log sink, and the set of files the compiler
/// recompiled across iterations. One reporter lives for exactly one run, so
/// the compiled-file set never aliases across builds.
pub struct IcReporter<'a> {
    level: IcLogLevel,
    logger: &'a dyn Logger,
    compiled: BTreeSet<PathBuf>,
}

impl<'a> IcReporter<'a> {
    pub fn new(level: IcLogLevel, logger: &'a dyn Logger) -> Self {
        Self {
            level,
            logger,
            compiled: BTreeSet::new(),
        }
    }

    /// Relay a progress message at the configured threshold.
    pub fn report(&mut self, message: &str) {
        match self.level {
            IcLogLevel::Info => self.logger.info(message),
            IcLogLevel::Warning => self.logger.warning(message),
            IcLogLevel::Silent => {}
        }
    }

    /// Record one compile iteration.
    pub fn compile_iteration(&mut self, sources: &[PathBuf], status: ExitStatus) {
        self.compiled.extend(sources.iter().cloned());
        if self.level != IcLogLevel::Silent {
            self.report(&format!(
                "compile iteration: {} file(s), status {}",
                sources.len(),
                status.as_str()
            ));
        }
    }

    /// All files recompiled during this run.
    pub fn compiled_files(&self) -> &BTreeSet<PathBuf> {
        &self.compiled
    }
}

/// The external compiler the orchestrator delegates to.
pub trait Compiler {
    /// Single-shot compile. Returns the process exit code; diagnostics go
    /// through the collector.
    fn compile(&self, bundle: &ArgumentBundle, collector: &mut MessageCollector) -> i32;

    /// In-process incremental compile against a cache directory.
    ///
    /// `changes` of `None` means the change set is unknown and the compiler
    /// must fall back to its own snapshot-based change detection.
    fn compile_incrementally(
        &self,
        cache_dir: &Path,
        source_roots: &[PathBuf],
        bundle: &ArgumentBundle,
        changes: Option<&ChangeSet>,
        collector: &mut MessageCollector,
        reporter: &mut IcReporter<'_>,
    ) -> Result<(), CompilerFault>;
}
