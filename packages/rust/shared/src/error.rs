//! Error types for autopress.
//!
//! Library crates use [`AutopressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all autopress operations.
#[derive(Debug, thiserror::Error)]
pub enum AutopressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed topic spreadsheet.
    #[error("input error: {message}")]
    Input { message: String },

    /// Transport-level failure talking to a remote API.
    #[error("network error: {0}")]
    Network(String),

    /// Remote API answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The CMS rejected the configured credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A row reached author resolution without an author name.
    #[error("author is blank; every row needs an AUTHOR value")]
    BlankAuthor,

    /// No CMS user matches the author name. Users are never auto-created.
    #[error("user '{name}' does not exist; create this user in the WordPress admin console first")]
    AuthorNotFound { name: String },

    /// The text-generation service failed or returned nothing usable.
    #[error("generation error: {0}")]
    Generation(String),

    /// A remote response could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AutopressError>;

/// Where an error came from, for operator-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Bad input data or missing prerequisites the operator must fix.
    Input,
    /// Remote system unreachable or misbehaving.
    Remote,
    /// Startup configuration problem.
    Configuration,
}

impl std::fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "bad input"),
            Self::Remote => write!(f, "remote system problem"),
            Self::Configuration => write!(f, "configuration problem"),
        }
    }
}

impl AutopressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// Errors that must stop the whole run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::BlankAuthor | Self::AuthorNotFound { .. } | Self::Config { .. }
        )
    }

    /// Classify the error for the operator.
    pub fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Config { .. } => ErrorOrigin::Configuration,
            Self::Io { .. } | Self::Input { .. } | Self::BlankAuthor | Self::AuthorNotFound { .. } => {
                ErrorOrigin::Input
            }
            Self::Network(_)
            | Self::Http { .. }
            | Self::Auth(_)
            | Self::Generation(_)
            | Self::Parse { .. } => ErrorOrigin::Remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AutopressError::config("missing key `site`");
        assert_eq!(err.to_string(), "config error: missing key `site`");

        let err = AutopressError::AuthorNotFound {
            name: "Jane Doe".into(),
        };
        assert!(err.to_string().contains("Jane Doe"));
        assert!(err.to_string().contains("WordPress admin console"));
    }

    #[test]
    fn fatal_classification() {
        assert!(AutopressError::BlankAuthor.is_fatal());
        assert!(AutopressError::Auth("401".into()).is_fatal());
        assert!(
            AutopressError::AuthorNotFound {
                name: "x".into()
            }
            .is_fatal()
        );
        assert!(!AutopressError::Generation("boom".into()).is_fatal());
        assert!(!AutopressError::Network("reset".into()).is_fatal());
    }

    #[test]
    fn origin_distinguishes_input_from_remote() {
        assert_eq!(AutopressError::BlankAuthor.origin(), ErrorOrigin::Input);
        assert_eq!(
            AutopressError::Auth("denied".into()).origin(),
            ErrorOrigin::Remote
        );
        assert_eq!(
            AutopressError::config("bad").origin().to_string(),
            "configuration problem"
        );
    }
}
