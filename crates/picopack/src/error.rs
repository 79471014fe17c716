//! Error taxonomy for the bundling pipeline
//!
//! Every failure is fatal: the first error at any stage aborts the run and no
//! partial artifact is written. There is no retry logic since all work is
//! local and deterministic. The runtime-side `ModuleNotFoundError` is thrown
//! by the emitted loader itself and has no Rust counterpart here.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for bundling operations
pub type Result<T> = std::result::Result<T, BundleError>;

/// Main error type for the bundling pipeline
#[derive(Error, Debug)]
pub enum BundleError {
    /// Source file could not be read. Unresolved specifiers also surface
    /// here: resolution is a pure path join, so a bad specifier is only
    /// noticed when the joined path fails to read.
    #[error("failed to read module '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parser rejected the source text
    #[error("syntax error in '{path}': {message}")]
    Syntax { path: PathBuf, message: String },

    /// The module cannot be lowered to the handler dialect
    #[error("cannot lower '{path}' to the handler dialect: {message}")]
    Transform { path: PathBuf, message: String },

    /// Import cycle found while building in compatibility (no-dedupe) mode,
    /// where a cycle would otherwise grow the work list without bound
    #[error("import cycle detected through '{path}'")]
    CycleDetected { path: PathBuf },
}

impl BundleError {
    /// The source file the error originated from
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. }
            | Self::Syntax { path, .. }
            | Self::Transform { path, .. }
            | Self::CycleDetected { path } => path,
        }
    }
}
