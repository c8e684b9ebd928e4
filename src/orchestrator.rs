//! Compilation orchestration
//!
//! The only component exposed to callers. A request flows
//! `Start -> ArgumentsBuilt -> Dispatched -> Completed`: the orchestrator
//! resolves arguments from project metadata, picks the execution strategy
//! from the request's flags, dispatches to the daemon client, the
//! incremental runner or a direct single-shot call, and returns the
//! `(ExitStatus, CollectedOutput)` pair unchanged.
//!
//! Every internal fault is caught here, logged, and reported as
//! `InternalError`; nothing is re-thrown across this boundary, so callers
//! see one uniform result shape regardless of cause. The orchestrator never
//! retries; a caller wanting a retry submits a new request.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::arguments::{ArgumentBuilder, ArgumentBundle};
use crate::changes::ChangeSet;
use crate::compiler::{Compiler, ExitStatus};
use crate::config::OrchestratorConfig;
use crate::daemon::{CompilationMode, DaemonClient, DaemonTransport, ReportFilter};
use crate::incremental::IncrementalRunner;
use crate::logger::Logger;
use crate::messages::{CollectedOutput, DiagnosticRecord, MessageCollector, Severity};
use crate::project::{ClasspathPurpose, ProjectProvider};
use crate::sync::CACHE_CLASSES_DIR;

/// How a request is executed, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationStrategy {
    /// Single-shot in-process invocation.
    Direct,
    /// Remote call to the persistent compiler daemon.
    Daemon,
    /// In-process incremental compile against a cache directory.
    Incremental,
}

/// One compilation request.
///
/// Built through the constructors mirroring the caller's intent: a launch
/// build, a full build, or an incremental build against a cache directory.
/// The incremental constructor takes the cache directory, so a request can
/// never be incremental without one.
#[derive(Debug, Clone)]
pub struct CompilationRequest {
    purpose: ClasspathPurpose,
    use_daemon: bool,
    incremental: bool,
    cache_dir: Option<PathBuf>,
    change_set: Option<ChangeSet>,
}

impl CompilationRequest {
    /// Build with runtime and test dependencies, for launching the result.
    pub fn launch() -> Self {
        Self {
            purpose: ClasspathPurpose::Launch,
            use_daemon: false,
            incremental: false,
            cache_dir: None,
            change_set: None,
        }
    }

    /// Full build with build-time dependencies only.
    pub fn full_build() -> Self {
        Self {
            purpose: ClasspathPurpose::FullBuild,
            ..Self::launch()
        }
    }

    /// Incremental build against the given cache directory.
    pub fn incremental_build(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            purpose: ClasspathPurpose::IncrementalBuild,
            incremental: true,
            cache_dir: Some(cache_dir.into()),
            ..Self::launch()
        }
    }

    /// Route this request through the compiler daemon.
    pub fn with_daemon(mut self) -> Self {
        self.use_daemon = true;
        self
    }

    /// Attach the known changed/deleted file sets. Without this the
    /// incremental compiler falls back to its own change detection.
    pub fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.change_set = Some(changes);
        self
    }

    pub fn purpose(&self) -> ClasspathPurpose {
        self.purpose
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    pub fn change_set(&self) -> Option<&ChangeSet> {
        self.change_set.as_ref()
    }

    /// Strategy selection is a pure function of the flags. Daemon takes
    /// precedence over incremental: daemon mode re-expresses incremental
    /// semantics as a remote call.
    pub fn strategy(&self) -> CompilationStrategy {
        if self.use_daemon {
            CompilationStrategy::Daemon
        } else if self.incremental {
            CompilationStrategy::Incremental
        } else {
            CompilationStrategy::Direct
        }
    }
}

/// The uniform result of one compilation request.
#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub status: ExitStatus,
    pub output: CollectedOutput,
}

impl CompilationResult {
    /// Orchestration failure with no diagnostics.
    pub fn internal_error() -> Self {
        Self {
            status: ExitStatus::InternalError,
            output: CollectedOutput::empty(),
        }
    }

    pub fn compiled_correctly(&self) -> bool {
        self.status == ExitStatus::Ok
    }

    /// Reconcile a status with the diagnostics backing it.
    ///
    /// Ok with an error-severity record becomes a compilation error: the
    /// diagnostics win over a clean result code. A compilation error with no
    /// error-severity record gets one synthesized from the result code, so
    /// `Ok` always implies no errors and `CompilationError` always implies
    /// at least one.
    fn reconciled(status: ExitStatus, output: CollectedOutput) -> Self {
        match status {
            ExitStatus::Ok if output.has_errors() => Self {
                status: ExitStatus::CompilationError,
                output,
            },
            ExitStatus::CompilationError if !output.has_errors() => {
                let mut records = output.records().to_vec();
                records.push(DiagnosticRecord {
                    severity: Severity::Error,
                    message: "compiler reported failure without an error diagnostic".to_string(),
                    location: None,
                });
                Self {
                    status,
                    output: records.into(),
                }
            }
            _ => Self { status, output },
        }
    }
}

/// Top-level strategy selector.
///
/// Owns the daemon session across requests; each request otherwise gets a
/// fresh message collector. All collaborators are injected, so multiple
/// isolated instances can coexist in one process.
pub struct CompilationOrchestrator {
    compiler: Box<dyn Compiler>,
    daemon: DaemonClient,
    logger: Arc<dyn Logger>,
    config: OrchestratorConfig,
}

impl CompilationOrchestrator {
    pub fn new(
        compiler: Box<dyn Compiler>,
        transport: Arc<dyn DaemonTransport>,
        logger: Arc<dyn Logger>,
        config: OrchestratorConfig,
    ) -> Self {
        let daemon = DaemonClient::new(transport, config.daemon_client_config());
        Self {
            compiler,
            daemon,
            logger,
            config,
        }
    }

    /// Execute one request end to end. Never panics and never returns an
    /// error; every fault folds into `ExitStatus::InternalError`.
    pub fn compile(
        &mut self,
        project: &dyn ProjectProvider,
        request: &CompilationRequest,
    ) -> CompilationResult {
        let bundle = match ArgumentBuilder::build(project, request.purpose()) {
            Ok(bundle) => bundle,
            Err(e) => {
                self.logger
                    .error("could not assemble compiler arguments", Some(&e));
                return CompilationResult::internal_error();
            }
        };

        match request.strategy() {
            CompilationStrategy::Daemon => self.compile_with_daemon(request, &bundle),
            CompilationStrategy::Incremental => {
                self.compile_incrementally(project, request, &bundle)
            }
            CompilationStrategy::Direct => self.compile_direct(&bundle),
        }
    }

    /// Tear down the daemon session, if one is live.
    pub fn shutdown(&mut self) {
        self.daemon.disconnect();
    }

    fn compile_with_daemon(
        &mut self,
        request: &CompilationRequest,
        bundle: &ArgumentBundle,
    ) -> CompilationResult {
        let filter = if self.config.verbose {
            ReportFilter::verbose()
        } else {
            ReportFilter::compiler_only()
        };

        let (mode, changes, cache_classes) = if request.is_incremental() {
            (
                CompilationMode::Incremental,
                request.change_set(),
                request.cache_dir().map(|d| d.join(CACHE_CLASSES_DIR)),
            )
        } else {
            (CompilationMode::NonIncremental, None, None)
        };

        match self
            .daemon
            .compile(bundle, mode, changes, cache_classes.as_deref(), filter)
        {
            Ok((status, output)) => CompilationResult::reconciled(status, output),
            Err(e) => {
                self.logger
                    .error("could not compile using the daemon", Some(&e));
                CompilationResult::internal_error()
            }
        }
    }

    fn compile_incrementally(
        &self,
        project: &dyn ProjectProvider,
        request: &CompilationRequest,
        bundle: &ArgumentBundle,
    ) -> CompilationResult {
        let Some(cache_dir) = request.cache_dir() else {
            // Unreachable through the constructors; kept for the invariant.
            self.logger
                .error("incremental build requested without a cache directory", None);
            return CompilationResult::internal_error();
        };

        let mut collector = MessageCollector::new();
        let runner = IncrementalRunner::new(&*self.logger, self.config.ic_log_level);
        let status = runner.run(
            &*self.compiler,
            cache_dir,
            &project.source_roots(),
            bundle,
            request.change_set(),
            &mut collector,
        );

        CompilationResult {
            status,
            output: collector.into_output(),
        }
    }

    fn compile_direct(&self, bundle: &ArgumentBundle) -> CompilationResult {
        let mut collector = MessageCollector::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.compiler.compile(bundle, &mut collector)
        }));

        let code = match outcome {
            Ok(code) => code,
            Err(_) => {
                self.logger.error("compiler invocation panicked", None);
                return CompilationResult {
                    status: ExitStatus::InternalError,
                    output: collector.into_output(),
                };
            }
        };

        CompilationResult::reconciled(ExitStatus::from_code(code), collector.into_output())
    }
}

impl Drop for CompilationOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
