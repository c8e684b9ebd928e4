//! Compiler argument assembly
//!
//! Builds the immutable command description one compilation run executes
//! with: classpath, destination, source roots, compiler home and the fixed
//! flag set the surrounding tooling always passes. The builder composes an
//! [`ArgumentBundle`] from project metadata; it never checks that the paths
//! exist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::project::{ClasspathPurpose, ProjectProvider};

/// Classpath entry separator on the target platform.
#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// Errors from argument assembly
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("project has no resolvable output directory")]
    MissingOutputDir,
}

/// Immutable description of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentBundle {
    classpath: Vec<PathBuf>,
    destination: PathBuf,
    source_roots: Vec<PathBuf>,
    home_dir: PathBuf,
    /// Flag name to value; `None` marks a bare switch with no value.
    extra_flags: BTreeMap<String, Option<String>>,
}

impl ArgumentBundle {
    /// Classpath entries in declaration order; first entry wins downstream.
    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn extra_flags(&self) -> &BTreeMap<String, Option<String>> {
        &self.extra_flags
    }

    /// Copy of this bundle with the destination swapped.
    ///
    /// The incremental runner uses this to redirect output into the private
    /// cache classes directory while keeping the original bundle intact for
    /// the final synchronization step.
    pub fn with_destination(&self, destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..self.clone()
        }
    }

    /// Flatten to the argv the daemon wire contract carries.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::new();

        argv.push("-kotlin-home".to_string());
        argv.push(self.home_dir.display().to_string());

        if !self.classpath.is_empty() {
            let joined = self
                .classpath
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(PATH_SEPARATOR);
            argv.push("-classpath".to_string());
            argv.push(joined);
        }

        argv.push("-d".to_string());
        argv.push(self.destination.display().to_string());

        for (flag, value) in &self.extra_flags {
            argv.push(format!("-{flag}"));
            // Valued flags always carry their value, even an empty one, so
            // the compiler never consumes the next token as the value.
            if let Some(value) = value {
                argv.push(value.clone());
            }
        }

        for root in &self.source_roots {
            argv.push(root.display().to_string());
        }

        argv
    }
}

/// Assembles an [`ArgumentBundle`] from project metadata.
pub struct ArgumentBuilder;

impl ArgumentBuilder {
    /// Build the bundle for one request.
    ///
    /// The classpath subset depends on the purpose: launch requests include
    /// runtime and test dependencies, full builds only build-time ones, and
    /// incremental builds the subset optimized for rebuild speed.
    pub fn build(
        project: &dyn ProjectProvider,
        purpose: ClasspathPurpose,
    ) -> Result<ArgumentBundle, ArgumentError> {
        let destination = project.output_dir().ok_or(ArgumentError::MissingOutputDir)?;

        // We put the runtime on the classpath ourselves, so the compiler
        // must not add its own JDK or stdlib.
        let mut extra_flags = BTreeMap::new();
        extra_flags.insert("no-jdk".to_string(), None);
        extra_flags.insert("no-stdlib".to_string(), None);
        extra_flags.insert("module-name".to_string(), Some(String::new()));

        Ok(ArgumentBundle {
            classpath: project.classpath(purpose),
            destination,
            source_roots: project.source_roots(),
            home_dir: project.home_dir(),
            extra_flags,
        })
    }
}
