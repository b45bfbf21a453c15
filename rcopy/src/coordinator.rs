//! Wiring and lifecycle of a copy run

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use common::destination::Destination;
use common::progress::Summary;
use common::report::Prompt;
use common::walk::{EntryKind, Walk, WalkEntry};
use tracing::instrument;

use crate::router::{self, CreatedDirectory, Router};
use crate::{Context, interact, worker};

/// Error type for copy runs that preserves the run summary even on failure.
///
/// # Logging Convention
/// The Display implementation shows the full error chain, so it can be logged with any format
/// specifier.
#[derive(Debug, thiserror::Error)]
#[error("{source:#}")]
pub struct Error {
    #[source]
    pub source: anyhow::Error,
    pub summary: Summary,
}

impl Error {
    #[must_use]
    pub fn new(source: anyhow::Error, summary: Summary) -> Self {
        Error { source, summary }
    }
}

/// Walks the sources and feeds the job channel; runs on a blocking thread.
///
/// Returns the total size of all regular files, which is also passed to the reporter once the
/// walk is exhausted.
fn produce(ctx: &Context, walk: Walk, jobs: async_channel::Sender<WalkEntry>) -> u64 {
    let mut total = 0;
    for entry in walk {
        if ctx.cancel.is_cancelled() {
            tracing::info!("walk cancelled");
            return total;
        }
        if entry.kind == EntryKind::Regular {
            match std::fs::metadata(&entry.src) {
                Ok(metadata) => total += metadata.len(),
                Err(error) => tracing::debug!("cannot stat {:?}: {}", &entry.src, &error),
            }
        }
        if jobs.send_blocking(entry).is_err() {
            tracing::info!("router is gone, stopping the walk");
            return total;
        }
    }
    ctx.reporter().on_total_bytes_known(total);
    total
}

/// Applies preserved attributes to directories created by this run, deepest first.
///
/// Done last so that adding children does not clobber timestamps and read-only modes do not
/// block the children from being written.
async fn finish_directories(ctx: &Context, mut directories: Vec<CreatedDirectory>) {
    directories.sort_by_key(|dir| std::cmp::Reverse(dir.dst.components().count()));
    for dir in directories {
        let metadata = match tokio::fs::metadata(&dir.src).await {
            Ok(metadata) => metadata,
            Err(error) => {
                ctx.report(common::Error::io("failed reading metadata of", &dir.src, error));
                continue;
            }
        };
        if let Err(error) =
            common::preserve::set_dir_metadata(&ctx.settings.preserve, &metadata, &dir.dst).await
        {
            ctx.report(format!("{:#}", error));
        }
    }
}

/// Copies `sources` to `target`.
///
/// Per-entry failures are reported through the context's diagnostics and do not stop the run;
/// they turn the final result into an error. Only an invalid combination of sources and target
/// fails before anything is touched.
#[instrument(skip(ctx, prompt))]
pub async fn copy(
    ctx: &Arc<Context>,
    prompt: Arc<dyn Prompt>,
    sources: &[PathBuf],
    target: &Path,
) -> Result<Summary, Error> {
    let fail = |source: anyhow::Error| Error::new(source, ctx.progress.summary());
    ctx.settings.validate().map_err(|error| fail(anyhow!(error)))?;
    let destination = Destination::for_sources(sources, target).map_err(|error| fail(error.into()))?;
    let walk = Walk::new(sources.to_vec(), destination, ctx.settings.walk());
    let (jobs_tx, jobs_rx) = async_channel::unbounded();
    let (copies_tx, copies_rx) = async_channel::unbounded();
    let (confirmations_tx, confirmations_rx) = async_channel::unbounded();
    let producer = tokio::task::spawn_blocking({
        let ctx = ctx.clone();
        move || produce(&ctx, walk, jobs_tx)
    });
    let router = tokio::spawn(
        Router::new(ctx.clone(), copies_tx.clone(), confirmations_tx).run(jobs_rx),
    );
    let gate = tokio::spawn(interact::run(
        ctx.clone(),
        prompt,
        confirmations_rx,
        copies_tx,
    ));
    let mut workers = tokio::task::JoinSet::new();
    for id in 0..ctx.settings.concurrency {
        workers.spawn(worker::run(id, ctx.clone(), copies_rx.clone()));
    }
    drop(copies_rx);
    let total = producer.await.map_err(|error| fail(error.into()))?;
    tracing::info!("walk done, {} to copy", bytesize::ByteSize(total));
    let deferred = router.await.map_err(|error| fail(error.into()))?;
    gate.await.map_err(|error| fail(error.into()))?;
    while let Some(res) = workers.join_next().await {
        res.map_err(|error| fail(error.into()))?;
    }
    if ctx.cancel.is_cancelled() {
        return Err(fail(anyhow!("copy interrupted")));
    }
    for entry in &deferred.hard_links {
        router::make_hard_link(ctx, entry).await;
    }
    finish_directories(ctx, deferred.directories).await;
    ctx.reporter().on_done();
    let summary = ctx.progress.summary();
    if ctx.diagnostics.has_failed() {
        return Err(Error::new(anyhow!("rcopy encountered errors"), summary));
    }
    Ok(summary)
}
