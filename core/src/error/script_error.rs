use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification surfaced in logs. The HTTP layer does not
/// differentiate between kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptErrorKind {
    ExecutionFailed,
    IoFailure,
    Interrupted,
}

impl ScriptErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptErrorKind::ExecutionFailed => "execution_failed",
            ScriptErrorKind::IoFailure => "io_failure",
            ScriptErrorKind::Interrupted => "interrupted",
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script failed with exit code: {code}")]
    ExecutionFailed { code: i32 },

    #[error("script not found: {}: {source}", .path.display())]
    ScriptNotFound { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to spawn process {program}: {source}")]
    Spawn { program: String, #[source] source: std::io::Error },

    #[error("io error while reading {stream}: {source}")]
    StreamIo { stream: &'static str, #[source] source: std::io::Error },

    #[error("failed to wait for process: {source}")]
    Wait { #[source] source: std::io::Error },

    #[error("script interrupted: {reason}")]
    Interrupted { reason: String },
}

impl ScriptError {
    pub fn kind(&self) -> ScriptErrorKind {
        match self {
            ScriptError::ExecutionFailed { .. } => ScriptErrorKind::ExecutionFailed,
            ScriptError::ScriptNotFound { .. }
            | ScriptError::Spawn { .. }
            | ScriptError::StreamIo { .. }
            | ScriptError::Wait { .. } => ScriptErrorKind::IoFailure,
            ScriptError::Interrupted { .. } => ScriptErrorKind::Interrupted,
        }
    }
}
