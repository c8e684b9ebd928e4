//! Orchestrator settings
//!
//! Optional TOML settings file for the pieces that are policy rather than
//! request data: which compiler identity the daemon must run, its JVM
//! options, call timeout and verbosity. Everything else arrives per
//! request.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::compiler::IcLogLevel;
use crate::daemon::{CompilerIdentity, DaemonClientConfig};

/// Errors loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for one orchestrator instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Relay all report categories at Debug instead of compiler messages
    /// at Info, and emit info-level log lines.
    pub verbose: bool,

    /// Compiler the daemon must be running.
    pub compiler_id: String,
    pub compiler_version: String,

    /// JVM options forwarded to a freshly started daemon.
    pub daemon_jvm_options: Vec<String>,

    /// Upper bound for one blocking daemon call, in seconds.
    pub daemon_timeout_seconds: u64,

    /// Severity threshold for incremental progress logging.
    pub ic_log_level: IcLogLevel,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            compiler_id: "kotlin-compiler-embeddable".to_string(),
            compiler_version: "unknown".to_string(),
            daemon_jvm_options: Vec::new(),
            daemon_timeout_seconds: 600,
            ic_log_level: IcLogLevel::Warning,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// The daemon client settings this config implies.
    pub fn daemon_client_config(&self) -> DaemonClientConfig {
        DaemonClientConfig {
            identity: CompilerIdentity {
                compiler_id: self.compiler_id.clone(),
                version: self.compiler_version.clone(),
            },
            jvm_options: self.daemon_jvm_options.clone(),
            call_timeout: Duration::from_secs(self.daemon_timeout_seconds),
        }
    }
}
