//! Project metadata collaborator
//!
//! The core never resolves classpaths or source sets itself; it consumes a
//! narrow [`ProjectProvider`] interface and passes whatever it returns
//! through to the compiler. Nonexistent paths are not validated here - they
//! surface later as compiler diagnostics, not as configuration errors.

use std::path::PathBuf;

/// Which dependency subset a classpath is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClasspathPurpose {
    /// Runtime plus test dependencies, for launching compiled code.
    Launch,
    /// Build-time dependencies only, for a full build.
    FullBuild,
    /// The subset optimized for rebuild speed.
    IncrementalBuild,
}

/// Resolved project metadata, provided by the surrounding tooling.
pub trait ProjectProvider {
    /// The project's real output directory, if one is configured.
    fn output_dir(&self) -> Option<PathBuf>;

    /// Source roots in declaration order.
    fn source_roots(&self) -> Vec<PathBuf>;

    /// Classpath entries in declaration order. Order is significant: the
    /// first entry shadows later ones with the same symbol.
    fn classpath(&self, purpose: ClasspathPurpose) -> Vec<PathBuf>;

    /// The compiler distribution home.
    fn home_dir(&self) -> PathBuf;
}

/// A fixed, in-memory project description.
///
/// Used by the CLI (which collects paths from flags) and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProject {
    pub output_dir: Option<PathBuf>,
    pub source_roots: Vec<PathBuf>,
    pub launch_classpath: Vec<PathBuf>,
    pub full_build_classpath: Vec<PathBuf>,
    pub incremental_classpath: Vec<PathBuf>,
    pub home_dir: PathBuf,
}

impl ProjectProvider for StaticProject {
    fn output_dir(&self) -> Option<PathBuf> {
        self.output_dir.clone()
    }

    fn source_roots(&self) -> Vec<PathBuf> {
        self.source_roots.clone()
    }

    fn classpath(&self, purpose: ClasspathPurpose) -> Vec<PathBuf> {
        match purpose {
            ClasspathPurpose::Launch => self.launch_classpath.clone(),
            ClasspathPurpose::FullBuild => self.full_build_classpath.clone(),
            ClasspathPurpose::IncrementalBuild => self.incremental_classpath.clone(),
        }
    }

    fn home_dir(&self) -> PathBuf {
        self.home_dir.clone()
    }
}
