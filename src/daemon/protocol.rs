//! Daemon wire contract
//!
//! Typed request/reply shapes for the session-scoped remote compile call.
//! Transport details (sockets, framing) live behind the
//! [`DaemonTransport`](super::DaemonTransport) trait; these types are what
//! any transport carries.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::messages::DiagnosticRecord;

/// Wire protocol version spoken by this client.
pub const PROTOCOL_VERSION: u32 = 1;

/// Whether the remote compiler runs a full or an incremental compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationMode {
    NonIncremental,
    Incremental,
}

/// Report categories the remote side can relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    CompilerMessage,
    Daemon,
    IncrementalStep,
    Output,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 4] = [
        ReportCategory::CompilerMessage,
        ReportCategory::Daemon,
        ReportCategory::IncrementalStep,
        ReportCategory::Output,
    ];

    fn bit(self) -> u32 {
        match self {
            ReportCategory::CompilerMessage => 1 << 0,
            ReportCategory::Daemon => 1 << 1,
            ReportCategory::IncrementalStep => 1 << 2,
            ReportCategory::Output => 1 << 3,
        }
    }

    /// Bitmask covering the given categories.
    pub fn mask(categories: &[ReportCategory]) -> u32 {
        categories.iter().fold(0, |mask, c| mask | c.bit())
    }
}

/// Minimum severity the remote side relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSeverity {
    Error,
    Warning,
    Info,
    Debug,
}

/// Result categories delivered on the side channel in addition to reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCategory {
    IcCompileIteration,
}

/// Selects which report categories and severities the remote side relays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Bitmask over [`ReportCategory`].
    pub category_mask: u32,
    pub min_severity: ReportSeverity,
    pub result_categories: Vec<ResultCategory>,
}

impl ReportFilter {
    /// Non-verbose sessions: compiler messages only, severity >= Info.
    pub fn compiler_only() -> Self {
        Self {
            category_mask: ReportCategory::mask(&[ReportCategory::CompilerMessage]),
            min_severity: ReportSeverity::Info,
            result_categories: Vec::new(),
        }
    }

    /// Verbose sessions: every category at Debug.
    pub fn verbose() -> Self {
        Self {
            category_mask: ReportCategory::mask(&ReportCategory::ALL),
            min_severity: ReportSeverity::Debug,
            result_categories: Vec::new(),
        }
    }

    pub fn with_result_category(mut self, category: ResultCategory) -> Self {
        self.result_categories.push(category);
        self
    }
}

/// Identity of the compiler the daemon must be running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerIdentity {
    pub compiler_id: String,
    pub version: String,
}

/// Session handshake request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub protocol_version: u32,
    pub identity: CompilerIdentity,
    pub jvm_options: Vec<String>,
}

/// Session handshake reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeReply {
    pub protocol_version: u32,
    pub session_id: i32,
}

/// One remote compile call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    pub session_id: i32,
    /// Flat argv, the wire form of an argument bundle.
    pub argv: Vec<String>,
    pub mode: CompilationMode,
    /// Known modified files; `None` when changes are unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_files: Option<Vec<PathBuf>>,
    /// Known deleted files; `None` when changes are unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_files: Option<Vec<PathBuf>>,
    /// Private classes directory beneath the cache, for incremental mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_classes_dir: Option<PathBuf>,
    pub filter: ReportFilter,
}

/// The remote result: diagnostics relayed before completion, then the final
/// integer code mapped onto an exit status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileReply {
    pub code: i32,
    pub reports: Vec<DiagnosticRecord>,
}
