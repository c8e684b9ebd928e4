//! Orchestrator dispatch and result-shape tests
//!
//! Covers strategy selection, the uniform result invariants and fault
//! isolation at the public boundary.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::{project_without_output_dir, temp_project, ScriptedCompiler};
use kompile::daemon::protocol::{CompileReply, ReportSeverity};
use kompile::messages::Severity;
use kompile::{
    CompilationOrchestrator, CompilationRequest, DiagnosticRecord, ExitStatus, MockDaemon,
    NullLogger, OrchestratorConfig,
};

fn orchestrator(
    compiler: &ScriptedCompiler,
    daemon: &MockDaemon,
    config: OrchestratorConfig,
) -> CompilationOrchestrator {
    CompilationOrchestrator::new(
        Box::new(compiler.clone()),
        Arc::new(daemon.clone()),
        Arc::new(NullLogger),
        config,
    )
}

fn record(severity: Severity, message: &str) -> DiagnosticRecord {
    DiagnosticRecord {
        severity,
        message: message.to_string(),
        location: None,
    }
}

#[test]
fn test_missing_output_dir_completes_without_invoking_compiler() {
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(&project_without_output_dir(), &CompilationRequest::full_build());

    assert_eq!(result.status, ExitStatus::InternalError);
    assert!(result.output.is_empty());
    assert_eq!(compiler.calls(), 0);
}

#[test]
fn test_direct_success() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    compiler.add_diagnostic(Severity::Warning, "unused variable");
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(&temp_project(&temp), &CompilationRequest::full_build());

    assert_eq!(result.status, ExitStatus::Ok);
    assert!(!result.output.has_errors());
    assert_eq!(result.output.len(), 1);
    // Ok implies no error-severity diagnostics.
    assert!(result.compiled_correctly());
}

#[test]
fn test_direct_compilation_error() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    compiler.set_exit_code(1);
    compiler.add_diagnostic(Severity::Error, "unresolved reference");
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(&temp_project(&temp), &CompilationRequest::full_build());

    assert_eq!(result.status, ExitStatus::CompilationError);
    assert!(result.output.has_errors());
}

#[test]
fn test_error_diagnostics_override_clean_exit_code() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    compiler.set_exit_code(0);
    compiler.add_diagnostic(Severity::Error, "bad code, happy exit");
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(&temp_project(&temp), &CompilationRequest::full_build());

    assert_eq!(result.status, ExitStatus::CompilationError);
}

#[test]
fn test_direct_request_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    compiler.add_diagnostic(Severity::Warning, "w1");
    compiler.add_diagnostic(Severity::Info, "i1");
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let project = temp_project(&temp);
    let request = CompilationRequest::full_build();
    let first = orchestrator.compile(&project, &request);
    let second = orchestrator.compile(&project, &request);

    assert_eq!(first.status, second.status);
    let severities = |result: &kompile::CompilationResult| {
        let mut v: Vec<_> = result.output.records().iter().map(|r| r.severity).collect();
        v.sort_by_key(|s| s.as_str());
        v
    };
    assert_eq!(severities(&first), severities(&second));
}

#[test]
fn test_compiler_panic_becomes_internal_error() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    compiler.panic_on_compile();
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(&temp_project(&temp), &CompilationRequest::launch());

    assert_eq!(result.status, ExitStatus::InternalError);
}

#[test]
fn test_daemon_unreachable_is_internal_error_with_empty_output() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    daemon.fail_handshake("connection refused");
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(
        &temp_project(&temp),
        &CompilationRequest::full_build().with_daemon(),
    );

    assert_eq!(result.status, ExitStatus::InternalError);
    assert!(result.output.is_empty());
    // The in-process compiler was never consulted.
    assert_eq!(compiler.calls(), 0);
}

#[test]
fn test_daemon_success_relays_reports_and_status() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    daemon.push_reply(CompileReply {
        code: 1,
        reports: vec![
            record(Severity::Info, "daemon started"),
            record(Severity::Error, "type mismatch"),
        ],
    });
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(
        &temp_project(&temp),
        &CompilationRequest::full_build().with_daemon(),
    );

    assert_eq!(result.status, ExitStatus::CompilationError);
    assert!(result.output.has_errors());
    assert_eq!(result.output.len(), 2);
}

#[test]
fn test_daemon_error_reports_override_clean_result_code() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    // The remote side claims success but relays an error-severity report.
    daemon.push_reply(CompileReply {
        code: 0,
        reports: vec![record(Severity::Error, "type mismatch")],
    });
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(
        &temp_project(&temp),
        &CompilationRequest::full_build().with_daemon(),
    );

    assert_eq!(result.status, ExitStatus::CompilationError);
    assert!(result.output.has_errors());
}

#[test]
fn test_error_exit_code_without_error_diagnostics_synthesizes_one() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    // Failure exit code, but nothing parseable reached the collector.
    compiler.set_exit_code(1);
    compiler.add_diagnostic(Severity::Other, "unreadable compiler output");
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let result = orchestrator.compile(&temp_project(&temp), &CompilationRequest::full_build());

    assert_eq!(result.status, ExitStatus::CompilationError);
    assert!(result.output.has_errors());
    // The original record is kept ahead of the synthesized one.
    assert_eq!(result.output.records()[0].severity, Severity::Other);
    assert_eq!(result.output.records().last().unwrap().severity, Severity::Error);
}

#[test]
fn test_daemon_session_reused_across_requests() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    daemon.push_reply(CompileReply { code: 0, reports: vec![] });
    daemon.push_reply(CompileReply { code: 0, reports: vec![] });
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let project = temp_project(&temp);
    let request = CompilationRequest::full_build().with_daemon();
    orchestrator.compile(&project, &request);
    orchestrator.compile(&project, &request);

    assert_eq!(daemon.handshake_count(), 1);
}

#[test]
fn test_daemon_session_reestablished_after_failure() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    let project = temp_project(&temp);
    let request = CompilationRequest::full_build().with_daemon();

    // First call: no reply queued, the channel times out.
    let failed = orchestrator.compile(&project, &request);
    assert_eq!(failed.status, ExitStatus::InternalError);

    // Next call must handshake again and succeed.
    daemon.push_reply(CompileReply { code: 0, reports: vec![] });
    let ok = orchestrator.compile(&project, &request);
    assert_eq!(ok.status, ExitStatus::Ok);
    assert_eq!(daemon.handshake_count(), 2);
}

#[test]
fn test_non_verbose_daemon_filter_is_compiler_messages_at_info() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    daemon.push_reply(CompileReply { code: 0, reports: vec![] });
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    orchestrator.compile(
        &temp_project(&temp),
        &CompilationRequest::full_build().with_daemon(),
    );

    let request = daemon.last_request().unwrap();
    assert_eq!(request.filter.min_severity, ReportSeverity::Info);
}

#[test]
fn test_verbose_daemon_filter_requests_debug() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    daemon.push_reply(CompileReply { code: 0, reports: vec![] });
    let config = OrchestratorConfig {
        verbose: true,
        ..OrchestratorConfig::default()
    };
    let mut orchestrator = orchestrator(&compiler, &daemon, config);

    orchestrator.compile(
        &temp_project(&temp),
        &CompilationRequest::full_build().with_daemon(),
    );

    let request = daemon.last_request().unwrap();
    assert_eq!(request.filter.min_severity, ReportSeverity::Debug);
}

#[test]
fn test_shutdown_closes_the_session() {
    let temp = TempDir::new().unwrap();
    let compiler = ScriptedCompiler::new();
    let daemon = MockDaemon::new();
    daemon.push_reply(CompileReply { code: 0, reports: vec![] });
    let mut orchestrator = orchestrator(&compiler, &daemon, OrchestratorConfig::default());

    orchestrator.compile(
        &temp_project(&temp),
        &CompilationRequest::full_build().with_daemon(),
    );
    orchestrator.shutdown();

    assert_eq!(daemon.closed_sessions().len(), 1);
}
