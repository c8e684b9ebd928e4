//! Incremental runner
//!
//! Drives an in-process incremental compile against a private cache
//! directory, then synchronizes the results into the real output directory.
//! The configured destination is redirected to `<cache>/classes` for the
//! compile step; the caller's original destination is only touched by the
//! snapshot-diff sync, and only when the compile produced no errors. A
//! failed incremental build therefore never leaves the output directory
//! partially updated.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::arguments::ArgumentBundle;
use crate::changes::ChangeSet;
use crate::compiler::{Compiler, ExitStatus, IcLogLevel, IcReporter};
use crate::logger::Logger;
use crate::messages::MessageCollector;
use crate::sync::{sync_dirs, CACHE_CLASSES_DIR, SNAPSHOT_FILE};

/// Runs incremental compilations for one cache directory.
///
/// The cache directory and its snapshot file are not safe for concurrent
/// writers; the caller runs at most one incremental build per cache at a
/// time.
pub struct IncrementalRunner<'a> {
    logger: &'a dyn Logger,
    ic_log_level: IcLogLevel,
}

impl<'a> IncrementalRunner<'a> {
    pub fn new(logger: &'a dyn Logger, ic_log_level: IcLogLevel) -> Self {
        Self {
            logger,
            ic_log_level,
        }
    }

    /// Compile into the cache and, on success, sync into the destination.
    ///
    /// Faults and panics from the compile step never propagate; they are
    /// logged and folded into `ExitStatus::InternalError`.
    pub fn run(
        &self,
        compiler: &dyn Compiler,
        cache_dir: &Path,
        source_roots: &[PathBuf],
        bundle: &ArgumentBundle,
        changes: Option<&ChangeSet>,
        collector: &mut MessageCollector,
    ) -> ExitStatus {
        self.logger
            .warning("using experimental incremental compilation");

        let cache_classes = cache_dir.join(CACHE_CLASSES_DIR);
        if let Err(e) = fs::create_dir_all(&cache_classes) {
            self.logger
                .error("could not create cache classes directory", Some(&e));
            return ExitStatus::InternalError;
        }

        let destination = bundle.destination().to_path_buf();
        let redirected = bundle.with_destination(&cache_classes);
        let snapshot_path = cache_dir.join(SNAPSHOT_FILE);

        let mut reporter = IcReporter::new(self.ic_log_level, self.logger);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            compiler.compile_incrementally(
                cache_dir,
                source_roots,
                &redirected,
                changes,
                collector,
                &mut reporter,
            )
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(fault)) => {
                self.logger
                    .error("incremental compilation failed", Some(&fault));
                return ExitStatus::InternalError;
            }
            Err(_) => {
                self.logger.error("incremental compiler panicked", None);
                return ExitStatus::InternalError;
            }
        }

        self.logger.info(&format!(
            "compiled {} file(s) with the incremental compiler",
            reporter.compiled_files().len()
        ));

        if collector.has_errors() {
            // Skip sync entirely; the previous valid output stays intact.
            return ExitStatus::CompilationError;
        }

        match sync_dirs(&cache_classes, &destination, &snapshot_path) {
            Ok(report) => {
                self.logger.info(&format!(
                    "synchronized output: {} copied, {} deleted, {} unchanged",
                    report.copied, report.deleted, report.unchanged
                ));
                ExitStatus::Ok
            }
            Err(e) => {
                self.logger
                    .error("failed to synchronize compiled classes", Some(&e));
                ExitStatus::InternalError
            }
        }
    }
}
