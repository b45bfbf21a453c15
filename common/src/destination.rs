//! Destination path resolution
//!
//! The copy mode is decided once per invocation from the shape of the sources and the target:
//!
//! - more than one source: the target must be an existing directory, each source is copied
//!   INTO it (`a/x -> target/a/x`)
//! - a single directory source: the target becomes the new root of the copied tree
//!   (`a/x -> target/x`), whether or not it exists yet
//! - a single non-directory source: copied into the target if it is an existing directory,
//!   otherwise the target is the destination file itself
//!
//! # Examples
//!
//! ```
//! use common::destination::{CopyMode, Destination};
//! use std::path::Path;
//!
//! let dst = Destination::new(Path::new("backup"), CopyMode::IntoExistingDir);
//! assert_eq!(
//!     dst.resolve(Path::new("data"), Path::new("data/logs/a.log")),
//!     Path::new("backup/data/logs/a.log")
//! );
//! ```

use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CopyMode {
    /// Single file copied to an explicit destination name
    FileToFile,
    /// Sources are copied under the target, keeping their own names
    IntoExistingDir,
    /// The single source directory is recreated with the target as its root
    IntoNewDir,
}

#[derive(Clone, Debug)]
pub struct Destination {
    target: PathBuf,
    mode: CopyMode,
}

fn is_dir(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|md| md.is_dir())
}

/// Determines the copy mode for the given sources and target.
///
/// The only I/O performed are the stat calls needed to test directory-ness.
#[instrument]
pub fn copy_mode(sources: &[PathBuf], target: &Path) -> Result<CopyMode> {
    let target_is_dir = is_dir(target);
    let mode = match sources {
        [] | [_, _, ..] => {
            if !target_is_dir {
                return Err(Error::InvalidTarget {
                    target: target.to_owned(),
                });
            }
            CopyMode::IntoExistingDir
        }
        [src] if is_dir(src) => CopyMode::IntoNewDir,
        [_] if target_is_dir => CopyMode::IntoExistingDir,
        [_] => CopyMode::FileToFile,
    };
    tracing::debug!("copy mode: {:?}", mode);
    Ok(mode)
}

/// Name under which `top` appears inside the target directory.
///
/// Paths like `.` or `..` have no file name of their own, we use the name of the directory they
/// refer to instead.
fn top_name(top: &Path) -> Option<std::ffi::OsString> {
    if let Some(name) = top.file_name() {
        return Some(name.to_owned());
    }
    std::fs::canonicalize(top)
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_owned()))
}

impl Destination {
    #[must_use]
    pub fn new(target: &Path, mode: CopyMode) -> Self {
        Self {
            target: target.to_owned(),
            mode,
        }
    }

    /// Resolves the copy mode (see [`copy_mode`]) and binds it to the target.
    pub fn for_sources(sources: &[PathBuf], target: &Path) -> Result<Self> {
        Ok(Self::new(target, copy_mode(sources, target)?))
    }

    /// Computes the destination of `src`, reached while walking the command-line path `top`.
    #[must_use]
    pub fn resolve(&self, top: &Path, src: &Path) -> PathBuf {
        let rel = src.strip_prefix(top).unwrap_or_else(|_| {
            tracing::warn!("{:?} is not under {:?}, using its file name", src, top);
            src.file_name().map(Path::new).unwrap_or(Path::new(""))
        });
        match self.mode {
            CopyMode::FileToFile => self.target.clone(),
            CopyMode::IntoNewDir => join_relative(&self.target, rel),
            CopyMode::IntoExistingDir => match top_name(top) {
                Some(name) => join_relative(&self.target.join(name), rel),
                None => join_relative(&self.target, rel),
            },
        }
    }
}

fn join_relative(base: &Path, rel: &Path) -> PathBuf {
    // joining an empty path would leave a trailing separator behind
    if rel.as_os_str().is_empty() {
        base.to_owned()
    } else {
        base.join(rel)
    }
}
