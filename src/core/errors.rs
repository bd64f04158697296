/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout the generator
pub type GenResult<T> = std::result::Result<T, GenError>;

/// Generation errors
///
/// Per-lock failures (`MissingAcquireSignature`, `MissingHeaderFile`, render
/// and I/O failures) are caught at the orchestrator boundary and recorded in
/// the batch report; they never abort sibling locks. `BuildFailed` is the one
/// unrecoverable kind and propagates out of the batch call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum GenError {
    #[error("no acquire declaration found for lock '{0}'")]
    #[diagnostic(
        code(lockgen::extract::missing_acquire),
        help("Every lock header must declare a 'static ... <name>_acquire(...)' function.")
    )]
    MissingAcquireSignature(String),

    #[error("unsupported architecture '{0}' for hierarchy generation")]
    #[diagnostic(
        code(lockgen::hierarchy::unsupported_architecture),
        help("Hierarchy parameters are tabulated per architecture; add an entry for this one.")
    )]
    UnsupportedArchitecture(String),

    #[error("lock header not found for '{lock}': {path:?}")]
    #[diagnostic(
        code(lockgen::catalog::missing_header),
        help("The registry maps each lock name to '<header_dir>/<name>.h'. Check the directory.")
    )]
    MissingHeaderFile { lock: String, path: PathBuf },

    #[error("{total_cpus} CPUs cannot be split evenly across {fan_out} {leaf_level} nodes")]
    #[diagnostic(
        code(lockgen::hierarchy::non_integral_division),
        help("The CPU count must be a multiple of the leaf fan-out; a remainder indicates a topology/CPU-count mismatch.")
    )]
    NonIntegralTopologyDivision {
        total_cpus: u32,
        leaf_level: String,
        fan_out: u32,
    },

    #[error("invalid topology: {0}")]
    #[diagnostic(code(lockgen::hierarchy::invalid_topology))]
    InvalidTopology(String),

    #[error("template '{template}' references '${{{placeholder}}}' which has no value")]
    #[diagnostic(
        code(lockgen::synth::unresolved_placeholder),
        help("Every placeholder a template names must be set by its wrapper builder.")
    )]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("i/o failure on {path:?}: {message}")]
    #[diagnostic(code(lockgen::io))]
    Io { path: PathBuf, message: String },

    #[error("external build step failed: {0}")]
    #[diagnostic(
        code(lockgen::build::failed),
        help("The generated sources are left in place; rerun the build step directly to debug.")
    )]
    BuildFailed(String),
}

impl GenError {
    /// Wrap a std::io::Error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
