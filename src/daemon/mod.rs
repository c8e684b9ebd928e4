//! Daemon client
//!
//! Talks to a long-lived external compiler process through a
//! [`DaemonTransport`]. The transport is abstracted for testability; the
//! client owns session lifecycle: a session is established lazily on the
//! first call, reused across requests, and torn down on shutdown or on any
//! transport failure so the next request re-establishes it.
//!
//! Every compile call blocks until the remote result arrives, the channel
//! errors, or the configured timeout expires. The original interface this
//! reimplements blocked unboundedly on a hung daemon; the timeout is an
//! explicit addition.

pub mod protocol;

mod mock;

pub use mock::MockDaemon;
pub use protocol::{
    CompilationMode, CompileReply, CompileRequest, CompilerIdentity, HandshakeReply,
    HandshakeRequest, ReportCategory, ReportFilter, ReportSeverity, ResultCategory,
    PROTOCOL_VERSION,
};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::arguments::ArgumentBundle;
use crate::changes::ChangeSet;
use crate::compiler::ExitStatus;
use crate::messages::CollectedOutput;

/// Errors establishing or using a daemon session.
///
/// All of these surface to the caller as `ExitStatus::InternalError`; they
/// are never conflated with a compilation failure.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("could not connect to compile daemon: {0}")]
    ConnectionFailed(String),

    #[error("daemon call timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol mismatch: client speaks v{client}, daemon speaks v{daemon}")]
    ProtocolMismatch { client: u32, daemon: u32 },
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, ConnectionError>;

/// Transport carrying the wire contract to the daemon process.
///
/// Implementations handle sockets, framing and handshake delivery; the
/// client never sees below this interface.
pub trait DaemonTransport: Send + Sync {
    /// Open a session. Blocks up to `timeout`.
    fn handshake(
        &self,
        request: &HandshakeRequest,
        timeout: Duration,
    ) -> DaemonResult<HandshakeReply>;

    /// Submit a compile call and block until the remote result arrives.
    fn compile(&self, request: &CompileRequest, timeout: Duration) -> DaemonResult<CompileReply>;

    /// Tear down a session. Best effort; errors are ignored.
    fn close_session(&self, session_id: i32);
}

/// An established daemon session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonSession {
    pub session_id: i32,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct DaemonClientConfig {
    /// Compiler the daemon must be running.
    pub identity: CompilerIdentity,
    /// JVM options forwarded when the daemon is started for this session.
    pub jvm_options: Vec<String>,
    /// Upper bound for a single blocking call.
    pub call_timeout: Duration,
}

impl Default for DaemonClientConfig {
    fn default() -> Self {
        Self {
            identity: CompilerIdentity {
                compiler_id: "kotlin-compiler-embeddable".to_string(),
                version: "unknown".to_string(),
            },
            jvm_options: Vec::new(),
            call_timeout: Duration::from_secs(600),
        }
    }
}

/// Client side of the persistent compiler daemon.
///
/// A session is not safe for concurrent compile calls; callers serialize
/// calls per client or use distinct clients.
pub struct DaemonClient {
    transport: Arc<dyn DaemonTransport>,
    config: DaemonClientConfig,
    session: Option<DaemonSession>,
}

impl DaemonClient {
    pub fn new(transport: Arc<dyn DaemonTransport>, config: DaemonClientConfig) -> Self {
        Self {
            transport,
            config,
            session: None,
        }
    }

    /// The current session, if one is established.
    pub fn session(&self) -> Option<DaemonSession> {
        self.session
    }

    /// Establish a session, reusing the existing one when present.
    pub fn connect(&mut self) -> DaemonResult<DaemonSession> {
        if let Some(session) = self.session {
            return Ok(session);
        }

        let request = HandshakeRequest {
            protocol_version: PROTOCOL_VERSION,
            identity: self.config.identity.clone(),
            jvm_options: self.config.jvm_options.clone(),
        };
        let reply = self
            .transport
            .handshake(&request, self.config.call_timeout)?;

        if reply.protocol_version != PROTOCOL_VERSION {
            return Err(ConnectionError::ProtocolMismatch {
                client: PROTOCOL_VERSION,
                daemon: reply.protocol_version,
            });
        }

        let session = DaemonSession {
            session_id: reply.session_id,
        };
        self.session = Some(session);
        Ok(session)
    }

    /// Submit one compile call and block until the remote result arrives.
    ///
    /// In incremental mode the request additionally carries the change set
    /// (when known) and the cache classes directory, and asks the remote
    /// side to deliver compile-iteration results. Any transport failure
    /// tears the session down so the next request reconnects.
    pub fn compile(
        &mut self,
        bundle: &ArgumentBundle,
        mode: CompilationMode,
        changes: Option<&ChangeSet>,
        cache_classes_dir: Option<&Path>,
        filter: ReportFilter,
    ) -> DaemonResult<(ExitStatus, CollectedOutput)> {
        let session = self.connect()?;

        let filter = match mode {
            CompilationMode::Incremental => {
                filter.with_result_category(ResultCategory::IcCompileIteration)
            }
            CompilationMode::NonIncremental => filter,
        };

        let request = CompileRequest {
            session_id: session.session_id,
            argv: bundle.to_argv(),
            mode,
            modified_files: changes.map(|c| c.modified().map(Path::to_path_buf).collect()),
            deleted_files: changes.map(|c| c.deleted().map(Path::to_path_buf).collect()),
            cache_classes_dir: cache_classes_dir.map(Path::to_path_buf),
            filter,
        };

        match self.transport.compile(&request, self.config.call_timeout) {
            Ok(reply) => Ok((
                ExitStatus::from_code(reply.code),
                CollectedOutput::from(reply.reports),
            )),
            Err(e) => {
                // Session is suspect after any channel error.
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Tear down the session, if any.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            self.transport.close_session(session.session_id);
        }
    }
}

impl Drop for DaemonClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
