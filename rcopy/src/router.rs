//! Dispatch of walk entries
//!
//! Directories and links are handled right here, in walk order, so a directory always exists
//! before any job for its children is handed to a copy worker. File content goes to the copy
//! workers, or through the confirmation gate first when it would overwrite something in
//! interactive mode.

use std::path::PathBuf;
use std::sync::Arc;

use common::error::Error;
use common::walk::{EntryKind, WalkEntry};
use tracing::instrument;

use crate::Context;

/// A directory created by this run whose attributes are applied once all content is in place
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedDirectory {
    pub src: PathBuf,
    pub dst: PathBuf,
}

/// Work the router could not finish while the copy workers were still running
#[derive(Debug, Default)]
pub struct Deferred {
    /// Hard links whose target was not copied yet
    pub hard_links: Vec<WalkEntry>,
    pub directories: Vec<CreatedDirectory>,
}

pub struct Router {
    ctx: Arc<Context>,
    copies: async_channel::Sender<WalkEntry>,
    confirmations: async_channel::Sender<WalkEntry>,
    deferred: Deferred,
}

async fn exists(path: &std::path::Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Creates a hard link for a [`EntryKind::Hardlink`] entry, reporting any failure.
#[instrument(skip(ctx))]
pub async fn make_hard_link(ctx: &Context, entry: &WalkEntry) {
    ctx.reporter().on_start(&entry.src, &entry.dst);
    if let Err(error) =
        common::copy::copy_link(&entry.src, &entry.dst, ctx.settings.force, true).await
    {
        ctx.report(&error);
        return;
    }
    ctx.progress.hard_links_created.inc();
    if ctx.settings.preserve.any() {
        let metadata = match tokio::fs::metadata(&entry.src).await {
            Ok(metadata) => metadata,
            Err(error) => {
                ctx.report(Error::io("failed reading metadata of", &entry.src, error));
                return;
            }
        };
        if let Err(error) =
            common::preserve::set_file_metadata(&ctx.settings.preserve, &metadata, &entry.dst)
                .await
        {
            ctx.report(format!("{:#}", error));
            return;
        }
    }
    ctx.reporter().on_finish(&entry.src, &entry.dst);
}

impl Router {
    #[must_use]
    pub fn new(
        ctx: Arc<Context>,
        copies: async_channel::Sender<WalkEntry>,
        confirmations: async_channel::Sender<WalkEntry>,
    ) -> Self {
        Self {
            ctx,
            copies,
            confirmations,
            deferred: Deferred::default(),
        }
    }

    /// Routes entries until `jobs` is closed and drained or the run is cancelled.
    ///
    /// Both outgoing channels are released on return.
    pub async fn run(mut self, jobs: async_channel::Receiver<WalkEntry>) -> Deferred {
        tracing::info!("router started");
        while let Some(entry) = tokio::select! {
            biased;
            _ = self.ctx.cancel.cancelled() => {
                tracing::info!("router cancelled");
                None
            }
            entry = jobs.recv() => entry.ok(),
        } {
            self.route(entry).await;
        }
        tracing::info!(
            "router done, {} hard links and {} directories deferred",
            self.deferred.hard_links.len(),
            self.deferred.directories.len()
        );
        self.deferred
    }

    #[instrument(skip(self))]
    async fn route(&mut self, entry: WalkEntry) {
        match entry.kind {
            EntryKind::NoStat => self.ctx.report(Error::NotFound { path: entry.src }),
            EntryKind::Ignore => self.ctx.report(Error::IgnoredDirectory { path: entry.src }),
            EntryKind::Unreadable => {
                self.ctx
                    .report(Error::UnreadableDirectory { path: entry.src })
            }
            EntryKind::Excluded => tracing::debug!("skipping excluded {:?}", &entry.src),
            EntryKind::Directory => self.make_directory(entry).await,
            EntryKind::Symlink => self.make_symlink(&entry).await,
            EntryKind::Hardlink => {
                if exists(&entry.src).await {
                    make_hard_link(&self.ctx, &entry).await;
                } else {
                    tracing::debug!("{:?} not copied yet, deferring link", &entry.src);
                    self.deferred.hard_links.push(entry);
                }
            }
            kind if kind.is_data_bearing() => {
                let queue = if self.ctx.settings.interactive && exists(&entry.dst).await {
                    &self.confirmations
                } else {
                    &self.copies
                };
                if queue.send(entry).await.is_err() {
                    tracing::debug!("no consumers left, dropping entry");
                }
            }
            kind => tracing::warn!("unexpected {:?} entry for {:?}", kind, &entry.src),
        }
    }

    async fn make_directory(&mut self, entry: WalkEntry) {
        match tokio::fs::metadata(&entry.dst).await {
            Ok(metadata) if metadata.is_dir() => {
                tracing::debug!("{:?} already exists", &entry.dst);
                self.ctx.progress.directories_unchanged.inc();
            }
            Ok(_) => self.ctx.report(Error::NotADirectory {
                src: entry.src,
                dst: entry.dst,
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                if let Err(error) = tokio::fs::create_dir(&entry.dst).await {
                    self.ctx
                        .report(Error::io("cannot create directory", &entry.dst, error));
                    return;
                }
                self.ctx.progress.directories_created.inc();
                if self.ctx.settings.preserve.any() {
                    self.deferred.directories.push(CreatedDirectory {
                        src: entry.src,
                        dst: entry.dst,
                    });
                }
            }
            Err(error) => self
                .ctx
                .report(Error::io("cannot stat", &entry.dst, error)),
        }
    }

    async fn make_symlink(&self, entry: &WalkEntry) {
        self.ctx.reporter().on_start(&entry.src, &entry.dst);
        match common::copy::copy_link(&entry.src, &entry.dst, self.ctx.settings.force, false).await
        {
            Ok(()) => {
                self.ctx.progress.symlinks_created.inc();
                self.ctx.reporter().on_finish(&entry.src, &entry.dst);
            }
            Err(error) => self.ctx.report(&error),
        }
    }
}
