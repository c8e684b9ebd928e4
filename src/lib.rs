//! kompile - Kotlin/JVM compilation orchestration core
//!
//! Orchestrates compilation of a source project by selecting among three
//! execution strategies - a direct in-process invocation, a persistent
//! background compiler daemon, and an incremental compiler reusing cached
//! build state - and normalizes their outputs into one uniform
//! `(ExitStatus, CollectedOutput)` result.

pub mod arguments;
pub mod changes;
pub mod compiler;
pub mod config;
pub mod daemon;
pub mod incremental;
pub mod kotlinc;
pub mod logger;
pub mod messages;
pub mod orchestrator;
pub mod project;
pub mod sync;

pub use arguments::{ArgumentBuilder, ArgumentBundle, ArgumentError};
pub use changes::ChangeSet;
pub use compiler::{Compiler, CompilerFault, ExitStatus, IcLogLevel, IcReporter};
pub use config::{ConfigError, OrchestratorConfig};
pub use daemon::{
    CompilationMode, CompilerIdentity, ConnectionError, DaemonClient, DaemonClientConfig,
    DaemonSession, DaemonTransport, MockDaemon, ReportFilter,
};
pub use incremental::IncrementalRunner;
pub use kotlinc::KotlincCompiler;
pub use logger::{Logger, NullLogger, StderrLogger};
pub use messages::{CollectedOutput, DiagnosticRecord, MessageCollector, Severity, SourceLocation};
pub use orchestrator::{
    CompilationOrchestrator, CompilationRequest, CompilationResult, CompilationStrategy,
};
pub use project::{ClasspathPurpose, ProjectProvider, StaticProject};
