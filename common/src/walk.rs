//! Classifying tree walk over the command-line sources
//!
//! [`Walk`] is a lazy, single-pass iterator producing one [`WalkEntry`] per visited path, in
//! pre-order and in the host filesystem's listing order. Every entry already carries its computed
//! destination, so consumers never need to look at the copy mode again.
//!
//! Per visited path:
//!
//! 1. excluded paths are reported as [`EntryKind::Excluded`] without being stat-ed
//! 2. paths that cannot be stat-ed become [`EntryKind::NoStat`], dangling symlinks included
//! 3. symlinks that the [`LinkPolicy`] does not follow become [`EntryKind::Symlink`]
//! 4. directories are descended into (or [`EntryKind::Ignore`]-d when not recursing)
//! 5. regular files are checked against the [`InodeTable`] when hard links are preserved

use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use crate::destination::Destination;
use crate::filter::FilterSettings;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Follow symlinks given on the command line, preserve the ones found while walking
    #[default]
    FollowTop,
    /// Always follow symlinks
    FollowAll,
    /// Never follow symlinks, recreate hard links between copied files
    Preserve,
}

impl LinkPolicy {
    fn follows(self, path: &Path, top: &Path) -> bool {
        match self {
            LinkPolicy::FollowAll => true,
            LinkPolicy::FollowTop => path == top,
            LinkPolicy::Preserve => false,
        }
    }

    #[must_use]
    pub fn preserves_hard_links(self) -> bool {
        self == LinkPolicy::Preserve
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Path does not exist (or its symlink target does not)
    NoStat,
    /// Directory found while recursion is disabled
    Ignore,
    /// Path matched an exclude pattern
    Excluded,
    /// Directory that stat-ed fine but could not be listed; follows its `Directory` entry
    Unreadable,
    Regular,
    Directory,
    Symlink,
    /// Regular file sharing its inode with an earlier `Regular` entry
    Hardlink,
    Block,
    Char,
    Pipe,
    Socket,
}

impl EntryKind {
    /// Entries whose content is streamed by the copy workers.
    #[must_use]
    pub fn is_data_bearing(self) -> bool {
        matches!(
            self,
            EntryKind::Regular
                | EntryKind::Block
                | EntryKind::Char
                | EntryKind::Pipe
                | EntryKind::Socket
        )
    }
}

/// A classified filesystem entry.
///
/// For [`EntryKind::Hardlink`] entries `src` is NOT the visited path: it's the destination
/// recorded for the first regular file seen with the same inode, possibly under a different `top`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkEntry {
    pub kind: EntryKind,
    /// Command-line path this entry was reached from
    pub top: PathBuf,
    pub src: PathBuf,
    pub dst: PathBuf,
}

/// Maps a (device, inode) pair to the destination first assigned to it.
///
/// Lives for a single walk and is only touched by the walking thread.
#[derive(Debug, Default)]
pub struct InodeTable {
    inodes: std::collections::HashMap<(u64, u64), PathBuf>,
}

impl InodeTable {
    /// Returns the recorded destination if the inode was seen before, otherwise records `dst`.
    pub fn check_and_record(&mut self, metadata: &std::fs::Metadata, dst: &Path) -> Option<PathBuf> {
        match self.inodes.entry((metadata.dev(), metadata.ino())) {
            std::collections::hash_map::Entry::Occupied(entry) => Some(entry.get().clone()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(dst.to_owned());
                None
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub links: LinkPolicy,
    pub recurse: bool,
    pub excludes: FilterSettings,
}

struct Frame {
    top: PathBuf,
    entries: std::fs::ReadDir,
}

pub struct Walk {
    settings: Settings,
    destination: Destination,
    sources: std::vec::IntoIter<PathBuf>,
    stack: Vec<Frame>,
    inodes: InodeTable,
    pending: Option<WalkEntry>,
}

impl Walk {
    #[must_use]
    pub fn new(sources: Vec<PathBuf>, destination: Destination, settings: Settings) -> Self {
        Self {
            settings,
            destination,
            sources: sources.into_iter(),
            stack: Vec::new(),
            inodes: InodeTable::default(),
            pending: None,
        }
    }

    fn entry(&self, kind: EntryKind, top: &Path, src: &Path) -> WalkEntry {
        WalkEntry {
            kind,
            top: top.to_owned(),
            src: src.to_owned(),
            dst: self.destination.resolve(top, src),
        }
    }

    fn visit(&mut self, path: PathBuf, top: &Path) -> WalkEntry {
        if let Some(pattern) = self.settings.excludes.excluded_by(&path) {
            tracing::debug!("{:?} excluded by '{}'", &path, &pattern.original);
            return self.entry(EntryKind::Excluded, top, &path);
        }
        // a link is only ever classified once its target stats fine
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) => {
                tracing::debug!("cannot stat {:?}: {}", &path, &error);
                return self.entry(EntryKind::NoStat, top, &path);
            }
        };
        let is_symlink = std::fs::symlink_metadata(&path)
            .map(|metadata| metadata.file_type().is_symlink())
            .unwrap_or(false);
        if is_symlink && !self.settings.links.follows(&path, top) {
            return self.entry(EntryKind::Symlink, top, &path);
        }
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            if !self.settings.recurse {
                return self.entry(EntryKind::Ignore, top, &path);
            }
            let entry = self.entry(EntryKind::Directory, top, &path);
            match std::fs::read_dir(&path) {
                Ok(entries) => self.stack.push(Frame {
                    top: top.to_owned(),
                    entries,
                }),
                Err(error) => {
                    tracing::debug!("cannot list {:?}: {}", &path, &error);
                    self.pending = Some(self.entry(EntryKind::Unreadable, top, &path));
                }
            }
            return entry;
        }
        if file_type.is_file() {
            let dst = self.destination.resolve(top, &path);
            if self.settings.links.preserves_hard_links() {
                if let Some(first_dst) = self.inodes.check_and_record(&metadata, &dst) {
                    tracing::debug!("{:?} is a hard link to {:?}", &path, &first_dst);
                    return WalkEntry {
                        kind: EntryKind::Hardlink,
                        top: top.to_owned(),
                        src: first_dst,
                        dst,
                    };
                }
            }
            return WalkEntry {
                kind: EntryKind::Regular,
                top: top.to_owned(),
                src: path,
                dst,
            };
        }
        let kind = if file_type.is_block_device() {
            EntryKind::Block
        } else if file_type.is_char_device() {
            EntryKind::Char
        } else if file_type.is_fifo() {
            EntryKind::Pipe
        } else {
            EntryKind::Socket
        };
        self.entry(kind, top, &path)
    }
}

impl Iterator for Walk {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        if let Some(entry) = self.pending.take() {
            return Some(entry);
        }
        loop {
            if let Some(frame) = self.stack.last_mut() {
                match frame.entries.next() {
                    Some(Ok(dir_entry)) => {
                        let top = frame.top.clone();
                        return Some(self.visit(dir_entry.path(), &top));
                    }
                    Some(Err(error)) => {
                        tracing::warn!("failed reading directory entry: {}", &error);
                        continue;
                    }
                    None => {
                        self.stack.pop();
                        continue;
                    }
                }
            }
            let src = self.sources.next()?;
            return Some(self.visit(src.clone(), &src));
        }
    }
}
