//! Logging collaborator
//!
//! Fire-and-forget: nothing logged here ever affects control flow. The
//! orchestrator logs internal faults through this interface before folding
//! them into an `InternalError` result.

use std::error::Error;

/// Log sink injected into the orchestrator and runners.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str, cause: Option<&dyn Error>);
}

/// Logs to stderr. Info lines are only emitted when verbose.
#[derive(Debug, Default)]
pub struct StderrLogger {
    pub verbose: bool,
}

impl Logger for StderrLogger {
    fn info(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }

    fn warning(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn error(&self, message: &str, cause: Option<&dyn Error>) {
        match cause {
            Some(cause) => eprintln!("error: {message}: {cause}"),
            None => eprintln!("error: {message}"),
        }
    }
}

/// Discards everything. For tests that do not assert on logging.
#[derive(Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _message: &str) {}

    fn warning(&self, _message: &str) {}

    fn error(&self, _message: &str, _cause: Option<&dyn Error>) {}
}
