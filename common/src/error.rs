//! Error types for copy operations
//!
//! Each variant names the offending path and the condition so that it can be reported to the
//! user as-is. Only [`Error::InvalidTarget`] is fatal to a run: it is detected while resolving the
//! destination, before any traversal starts. Every other variant describes a single entry and is
//! reported without stopping the remaining work.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid combination of sources and target
    #[error("target '{}' is not a directory", .target.display())]
    InvalidTarget { target: PathBuf },

    /// Source vanished (or never existed) before it could be examined
    #[error("cannot stat '{}': No such file or directory", .path.display())]
    NotFound { path: PathBuf },

    /// Directory found but recursion is disabled
    #[error("omitting directory '{}'", .path.display())]
    IgnoredDirectory { path: PathBuf },

    /// Directory found but its entries cannot be listed
    #[error("cannot open directory '{}' for reading", .path.display())]
    UnreadableDirectory { path: PathBuf },

    /// Named pipe used as a copy endpoint
    #[error("'{}' is a named pipe", .path.display())]
    SpecialFile { path: PathBuf },

    #[error("'{}' and '{}' are the same file", .src.display(), .dst.display())]
    SameFile { src: PathBuf, dst: PathBuf },

    /// Open, write or unlink was denied
    #[error("cannot {action} '{}': Permission denied", .path.display())]
    Permission {
        action: &'static str,
        path: PathBuf,
    },

    #[error("cannot overwrite directory '{}' with non-directory", .path.display())]
    CannotOverwriteDirectory { path: PathBuf },

    #[error("cannot overwrite non-directory '{}' with directory '{}'", .dst.display(), .src.display())]
    NotADirectory { src: PathBuf, dst: PathBuf },

    #[error("{context} '{}': {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn permission(action: &'static str, path: &std::path::Path) -> Self {
        Error::Permission {
            action,
            path: path.to_owned(),
        }
    }

    pub fn io(context: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Error::Io {
            context,
            path: path.to_owned(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
