//! Shared test doubles: a scripted compiler backend and small project
//! fixtures.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::TempDir;

use kompile::arguments::ArgumentBundle;
use kompile::changes::ChangeSet;
use kompile::compiler::{Compiler, CompilerFault, ExitStatus, IcReporter};
use kompile::messages::{MessageCollector, Severity};
use kompile::project::StaticProject;

#[derive(Default)]
pub struct ScriptState {
    pub exit_code: i32,
    pub diagnostics: Vec<(Severity, String)>,
    /// Files written into the bundle destination on each compile call,
    /// as (relative path, content).
    pub emit: Vec<(String, Vec<u8>)>,
    pub fault: Option<String>,
    pub panic_on_compile: bool,
    pub calls: usize,
    /// Change sets seen by the incremental entry point, in call order.
    pub seen_changes: Vec<Option<ChangeSet>>,
}

/// Compiler double driven entirely by test script state.
///
/// Cloning shares the state, so tests keep a handle for assertions after
/// moving a clone into the orchestrator.
#[derive(Clone, Default)]
pub struct ScriptedCompiler {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_exit_code(&self, code: i32) {
        self.state().exit_code = code;
    }

    pub fn add_diagnostic(&self, severity: Severity, message: &str) {
        self.state().diagnostics.push((severity, message.to_string()));
    }

    pub fn clear_diagnostics(&self) {
        self.state().diagnostics.clear();
    }

    pub fn emit_file(&self, rel_path: &str, content: &[u8]) {
        self.state()
            .emit
            .push((rel_path.to_string(), content.to_vec()));
    }

    pub fn clear_emitted(&self) {
        self.state().emit.clear();
    }

    pub fn set_fault(&self, message: &str) {
        self.state().fault = Some(message.to_string());
    }

    pub fn panic_on_compile(&self) {
        self.state().panic_on_compile = true;
    }

    pub fn calls(&self) -> usize {
        self.state().calls
    }

    pub fn seen_changes(&self) -> Vec<Option<ChangeSet>> {
        self.state().seen_changes.clone()
    }

    fn write_emitted(state: &ScriptState, bundle: &ArgumentBundle) {
        for (rel, content) in &state.emit {
            let target = bundle.destination().join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(target, content).unwrap();
        }
    }

    fn report_all(state: &ScriptState, collector: &mut MessageCollector) {
        for (severity, message) in &state.diagnostics {
            collector.report(*severity, message, None);
        }
    }
}

impl Compiler for ScriptedCompiler {
    fn compile(&self, bundle: &ArgumentBundle, collector: &mut MessageCollector) -> i32 {
        let should_panic;
        {
            let mut state = self.state();
            state.calls += 1;
            should_panic = state.panic_on_compile;
            if !should_panic {
                Self::write_emitted(&state, bundle);
                Self::report_all(&state, collector);
            }
        }
        if should_panic {
            panic!("scripted compiler panic");
        }
        self.state().exit_code
    }

    fn compile_incrementally(
        &self,
        _cache_dir: &std::path::Path,
        source_roots: &[PathBuf],
        bundle: &ArgumentBundle,
        changes: Option<&ChangeSet>,
        collector: &mut MessageCollector,
        reporter: &mut IcReporter<'_>,
    ) -> Result<(), CompilerFault> {
        let mut state = self.state();
        state.calls += 1;
        state.seen_changes.push(changes.cloned());

        if let Some(message) = state.fault.clone() {
            return Err(CompilerFault(message));
        }

        Self::write_emitted(&state, bundle);
        Self::report_all(&state, collector);

        let status = if state.diagnostics.iter().any(|(s, _)| s.is_error()) {
            ExitStatus::CompilationError
        } else {
            ExitStatus::Ok
        };
        drop(state);
        reporter.compile_iteration(source_roots, status);
        Ok(())
    }
}

/// A project rooted in a temp directory, with `out/` as output directory.
pub fn temp_project(temp: &TempDir) -> StaticProject {
    StaticProject {
        output_dir: Some(temp.path().join("out")),
        source_roots: vec![temp.path().join("src")],
        launch_classpath: vec![PathBuf::from("/deps/runtime.jar")],
        full_build_classpath: vec![PathBuf::from("/deps/build.jar")],
        incremental_classpath: vec![PathBuf::from("/deps/ic.jar")],
        home_dir: PathBuf::from("/opt/kotlin"),
    }
}

/// A project with no resolvable output directory.
pub fn project_without_output_dir() -> StaticProject {
    StaticProject {
        source_roots: vec![PathBuf::from("/proj/src")],
        ..StaticProject::default()
    }
}
