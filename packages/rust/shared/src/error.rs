//! Error types for quickdoc.
//!
//! Library crates use [`QuickdocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for all quickdoc operations.
#[derive(Debug, thiserror::Error)]
pub enum QuickdocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The package index could not be built.
    #[error("index error at {path:?}: {message}")]
    Index { path: PathBuf, message: String },

    /// The Go toolchain could not be queried for its stdlib location.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Serve(std::io::Error),

    /// An external documentation renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failure of a single external renderer invocation.
///
/// Output produced before the failure has already reached the sink; these
/// variants only describe why the run is not considered a success.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The process could not be started (missing binary, permissions, ...).
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Reading the child's output or writing to the sink failed.
    #[error("stream error while rendering with `{program}`: {source}")]
    Stream {
        program: String,
        source: std::io::Error,
    },

    /// The process exited with a non-success status.
    #[error("`{program}` exited with status {}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    ExitStatus { program: String, code: Option<i32> },

    /// The process exited cleanly but wrote only to stderr.
    #[error("`{program}` produced output only on stderr")]
    StderrOnly { program: String },

    /// The process did not finish in time and was killed.
    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuickdocError>;

impl QuickdocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an index error for `path`.
    pub fn index(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Index {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl RenderError {
    /// Name of the program whose run failed.
    pub fn program(&self) -> &str {
        match self {
            Self::Spawn { program, .. }
            | Self::Stream { program, .. }
            | Self::ExitStatus { program, .. }
            | Self::StderrOnly { program }
            | Self::Timeout { program, .. } => program,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = QuickdocError::config("bad addr");
        assert_eq!(err.to_string(), "config error: bad addr");

        let err = QuickdocError::index("/nope", "root does not exist");
        assert!(err.to_string().contains("root does not exist"));
    }

    #[test]
    fn render_error_display() {
        let err = RenderError::ExitStatus {
            program: "man".into(),
            code: Some(16),
        };
        assert_eq!(err.to_string(), "`man` exited with status 16");
        assert_eq!(err.program(), "man");

        let err = RenderError::ExitStatus {
            program: "ag".into(),
            code: None,
        };
        assert!(err.to_string().ends_with("status signal"));

        let err = RenderError::Timeout {
            program: "go".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "`go` timed out after 5s");
    }

    #[test]
    fn render_error_converts_transparently() {
        let err: QuickdocError = RenderError::StderrOnly {
            program: "go".into(),
        }
        .into();
        assert_eq!(err.to_string(), "`go` produced output only on stderr");
    }
}
