//! In-process mock daemon for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::protocol::{CompileReply, CompileRequest, HandshakeReply, HandshakeRequest};
use super::{ConnectionError, DaemonResult, DaemonTransport, PROTOCOL_VERSION};

#[derive(Default)]
struct MockState {
    fail_handshake: Option<String>,
    fail_compile: Option<String>,
    handshake_version: Option<u32>,
    replies: VecDeque<CompileReply>,
    requests: Vec<CompileRequest>,
    handshakes: Vec<HandshakeRequest>,
    closed_sessions: Vec<i32>,
    next_session: i32,
}

/// Scripted daemon transport.
///
/// Cloning shares the underlying state, so a test can keep a handle for
/// assertions after moving a clone into the client.
#[derive(Clone, Default)]
pub struct MockDaemon {
    state: Arc<Mutex<MockState>>,
}

impl MockDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every handshake fail with the given message.
    pub fn fail_handshake(&self, message: &str) {
        self.state.lock().unwrap().fail_handshake = Some(message.to_string());
    }

    /// Make every compile call fail with the given message.
    pub fn fail_compile(&self, message: &str) {
        self.state.lock().unwrap().fail_compile = Some(message.to_string());
    }

    /// Answer handshakes with a different protocol version.
    pub fn answer_with_protocol_version(&self, version: u32) {
        self.state.lock().unwrap().handshake_version = Some(version);
    }

    /// Queue the reply for the next compile call.
    pub fn push_reply(&self, reply: CompileReply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    /// The last compile request the client submitted.
    pub fn last_request(&self) -> Option<CompileRequest> {
        self.state.lock().unwrap().requests.last().cloned()
    }

    pub fn handshake_count(&self) -> usize {
        self.state.lock().unwrap().handshakes.len()
    }

    pub fn closed_sessions(&self) -> Vec<i32> {
        self.state.lock().unwrap().closed_sessions.clone()
    }
}

impl DaemonTransport for MockDaemon {
    fn handshake(
        &self,
        request: &HandshakeRequest,
        _timeout: Duration,
    ) -> DaemonResult<HandshakeReply> {
        let mut state = self.state.lock().unwrap();
        state.handshakes.push(request.clone());

        if let Some(ref message) = state.fail_handshake {
            return Err(ConnectionError::ConnectionFailed(message.clone()));
        }

        state.next_session += 1;
        Ok(HandshakeReply {
            protocol_version: state.handshake_version.unwrap_or(PROTOCOL_VERSION),
            session_id: state.next_session,
        })
    }

    fn compile(&self, request: &CompileRequest, timeout: Duration) -> DaemonResult<CompileReply> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        if let Some(ref message) = state.fail_compile {
            return Err(ConnectionError::ConnectionFailed(message.clone()));
        }

        state
            .replies
            .pop_front()
            .ok_or(ConnectionError::Timeout(timeout))
    }

    fn close_session(&self, session_id: i32) {
        self.state.lock().unwrap().closed_sessions.push(session_id);
    }
}
