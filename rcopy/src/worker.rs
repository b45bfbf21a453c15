//! Copy workers
//!
//! Any number of workers share the copy channel. Each one copies a single file at a time and
//! finishes it before looking at the channel (or the cancellation token) again.

use std::sync::Arc;

use common::walk::WalkEntry;
use tracing::instrument;

use crate::Context;

/// Copies entries from `jobs` until it is closed and drained or the run is cancelled.
pub async fn run(id: usize, ctx: Arc<Context>, jobs: async_channel::Receiver<WalkEntry>) {
    tracing::info!("copy worker {} started", id);
    while let Some(entry) = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        entry = jobs.recv() => entry.ok(),
    } {
        copy_entry(&ctx, &entry).await;
    }
    tracing::info!("copy worker {} done", id);
}

#[instrument(skip(ctx))]
async fn copy_entry(ctx: &Context, entry: &WalkEntry) {
    let reporter = ctx.reporter();
    reporter.on_start(&entry.src, &entry.dst);
    let settings = ctx.settings.copy();
    let progress = |bytes: u64| reporter.on_progress(bytes);
    let summary = match common::copy::copy_file(&entry.src, &entry.dst, &settings, &progress).await
    {
        Ok(summary) => summary,
        Err(error) => {
            ctx.report(&error);
            return;
        }
    };
    ctx.progress.bytes_copied.add(summary.bytes_written);
    ctx.progress.bytes_resumed.add(summary.bytes_resumed);
    ctx.progress.files_copied.inc();
    if ctx.settings.preserve.any() {
        let metadata = match tokio::fs::metadata(&entry.src).await {
            Ok(metadata) => metadata,
            Err(error) => {
                ctx.report(common::Error::io("failed reading metadata of", &entry.src, error));
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
    reporter.on_finish(&entry.src, &entry.dst);
}
