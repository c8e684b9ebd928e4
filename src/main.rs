//! kompile CLI
//!
//! Thin front end over the orchestrator: collects project paths from flags,
//! builds a compilation request and runs it against an external `kotlinc`
//! binary. The daemon strategy needs an embedding that supplies a real
//! transport; this binary ships without one, so `--daemon` requests complete
//! as internal errors.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use kompile::daemon::{
    CompileReply, CompileRequest, DaemonResult, DaemonTransport, HandshakeReply, HandshakeRequest,
};
use kompile::{
    ChangeSet, CompilationOrchestrator, CompilationRequest, ConnectionError, KotlincCompiler,
    OrchestratorConfig, StaticProject, StderrLogger,
};

#[derive(Parser)]
#[command(name = "kompile")]
#[command(about = "Kotlin/JVM compilation orchestrator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a project
    Compile {
        /// Source root directories (repeatable, ordered)
        #[arg(long = "source-root", required = true)]
        source_roots: Vec<PathBuf>,

        /// Classpath entries (repeatable, ordered; first entry wins)
        #[arg(long = "classpath")]
        classpath: Vec<PathBuf>,

        /// Output directory for compiled classes
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Compiler distribution home
        #[arg(long, default_value = "/usr/share/kotlin")]
        kotlin_home: PathBuf,

        /// Path to the kotlinc binary
        #[arg(long, default_value = "kotlinc")]
        kotlinc: PathBuf,

        /// Run the incremental compiler against the cache directory
        #[arg(long, requires = "cache_dir")]
        incremental: bool,

        /// Route the request through the compiler daemon
        #[arg(long)]
        daemon: bool,

        /// Build cache directory for incremental runs
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Known modified files for the incremental run (repeatable)
        #[arg(long = "changed")]
        changed: Vec<PathBuf>,

        /// Known deleted files for the incremental run (repeatable)
        #[arg(long = "deleted")]
        deleted: Vec<PathBuf>,

        /// Path to a settings file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

/// The CLI carries no daemon transport; daemon requests fail cleanly.
struct NoDaemon;

impl DaemonTransport for NoDaemon {
    fn handshake(
        &self,
        _request: &HandshakeRequest,
        _timeout: Duration,
    ) -> DaemonResult<HandshakeReply> {
        Err(ConnectionError::ConnectionFailed(
            "no daemon transport configured".to_string(),
        ))
    }

    fn compile(&self, _request: &CompileRequest, _timeout: Duration) -> DaemonResult<CompileReply> {
        Err(ConnectionError::ConnectionFailed(
            "no daemon transport configured".to_string(),
        ))
    }

    fn close_session(&self, _session_id: i32) {}
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            source_roots,
            classpath,
            output,
            kotlin_home,
            kotlinc,
            incremental,
            daemon,
            cache_dir,
            changed,
            deleted,
            config,
            json,
            verbose,
        } => {
            let mut settings = match config {
                Some(path) => match OrchestratorConfig::from_file(&path) {
                    Ok(settings) => settings,
                    Err(e) => {
                        eprintln!("error: {e}");
                        process::exit(2);
                    }
                },
                None => OrchestratorConfig::default(),
            };
            settings.verbose = settings.verbose || verbose;

            let project = StaticProject {
                output_dir: Some(output),
                source_roots,
                launch_classpath: classpath.clone(),
                full_build_classpath: classpath.clone(),
                incremental_classpath: classpath,
                home_dir: kotlin_home,
            };

            let mut request = if incremental {
                // clap enforces that --incremental comes with --cache-dir.
                let mut request = CompilationRequest::incremental_build(cache_dir.unwrap());
                if !changed.is_empty() || !deleted.is_empty() {
                    request = request.with_changes(ChangeSet::new(changed, deleted));
                }
                request
            } else {
                CompilationRequest::full_build()
            };
            if daemon {
                request = request.with_daemon();
            }

            let logger = Arc::new(StderrLogger {
                verbose: settings.verbose,
            });
            let mut orchestrator = CompilationOrchestrator::new(
                Box::new(KotlincCompiler::new(kotlinc)),
                Arc::new(NoDaemon),
                logger,
                settings,
            );

            let result = orchestrator.compile(&project, &request);

            if json {
                let payload = json!({
                    "status": result.status,
                    "diagnostics": result.output.records(),
                });
                println!("{}", serde_json::to_string_pretty(&payload).unwrap());
            } else {
                for record in result.output.records() {
                    match &record.location {
                        Some(loc) => println!(
                            "{}:{}:{}: {}: {}",
                            loc.file.display(),
                            loc.line,
                            loc.column,
                            record.severity.as_str(),
                            record.message
                        ),
                        None => println!("{}: {}", record.severity.as_str(), record.message),
                    }
                }
            }

            process::exit(result.status.code());
        }
    }
}
