//! Error types for the versioning core.
//!
//! One unified enumeration covers repository lifecycle, staging, committing,
//! history traversal, and diffing. Every variant names the failing operation
//! and the path or object it concerns; I/O causes are chained via `source`
//! so callers can inspect the underlying failure.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the versioning core.
pub enum VersioningError {
    /// Missing or malformed configuration: blank paths, incomplete author
    /// identity, unreadable store format.
    #[error("versioning {op}: {reason} (path `{path}`)")]
    Config {
        op: &'static str,
        path: String,
        reason: String,
    },

    /// I/O failure from the working tree or the object store.
    #[error("versioning {op}: I/O failure at `{path}`")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The working tree has unresolved merge conflicts; staging is refused.
    #[error("versioning {op}: working tree at `{path}` has unresolved conflicts")]
    Conflict { op: &'static str, path: String },

    /// A commit, object, or path was not found in the store.
    #[error("versioning {op}: `{what}` not found")]
    NotFound { op: &'static str, what: String },

    /// The repository handle was closed; no further operations are accepted.
    #[error("versioning {op}: repository at `{path}` is closed")]
    Closed { op: &'static str, path: String },

    /// A stored object failed to decode.
    #[error("versioning {op}: corrupt object `{what}`: {reason}")]
    Corrupt {
        op: &'static str,
        what: String,
        reason: String,
    },
}

impl VersioningError {
    /// Wrap an I/O error with operation and path context.
    pub fn io(op: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        VersioningError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Configuration failure with operation and path context.
    pub fn config(op: &'static str, path: impl Into<String>, reason: impl Into<String>) -> Self {
        VersioningError::Config {
            op,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Decode failure for a stored object.
    pub fn corrupt(op: &'static str, what: impl Into<String>, reason: impl Into<String>) -> Self {
        VersioningError::Corrupt {
            op,
            what: what.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VersioningError;

    /// Display output carries the operation and path context.
    #[test]
    fn test_display_includes_context() {
        let err = VersioningError::Conflict {
            op: "stage",
            path: "/tmp/board".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("stage"));
        assert!(text.contains("/tmp/board"));
    }

    /// I/O causes are reachable through the error chain.
    #[test]
    fn test_io_source_chain() {
        use std::error::Error;

        let inner = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = VersioningError::io("open", "/tmp/board", inner);
        assert!(err.source().is_some());
    }
}
