//! Concurrent copy pipeline behind the `rcopy` tool
//!
//! A copy run is a set of cooperating tasks connected by unbounded FIFO channels:
//!
//! ```text
//!  walk producer ──jobs──▶ router ──copies──────────────▶ copy workers (N)
//!                            │                    ▲
//!                            └──confirmations──▶ gate
//! ```
//!
//! - the producer walks the sources (see [`common::walk`]) on a blocking thread
//! - the [`router`] creates directories and links itself and hands file content off
//! - the [`interact`] gate asks before overwriting existing files in interactive mode
//! - [`worker`]s stream file content, several of them in parallel
//!
//! Shutdown follows the data: each role stops once its input channel is closed and drained, which
//! closes the channels it feeds. The [`coordinator`] then runs the work that must wait for all
//! file content (deferred hard links and directory attributes).
//!
//! Copy completion order is not the walk order when more than one worker is used.
//!
//! # Cancellation
//!
//! Cancelling [`Context::cancel`] makes every role stop at its next channel receive. Copies that
//! are already running finish first.

use std::sync::Arc;

pub mod coordinator;
pub mod interact;
pub mod router;
pub mod worker;

pub use coordinator::{Error, copy};

/// State shared by all roles of one copy run
#[derive(Debug)]
pub struct Context {
    pub settings: common::config::Settings,
    pub diagnostics: common::report::Diagnostics,
    pub progress: common::progress::Progress,
    pub cancel: tokio_util::sync::CancellationToken,
}

impl Context {
    #[must_use]
    pub fn new(
        settings: common::config::Settings,
        diagnostics: common::report::Diagnostics,
        cancel: tokio_util::sync::CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            diagnostics,
            progress: common::progress::Progress::new(),
            cancel,
        })
    }

    /// Reports a per-entry failure, processing continues.
    pub fn report(&self, error: impl std::fmt::Display) {
        self.progress.errors.inc();
        self.diagnostics.report(&error);
    }

    pub fn reporter(&self) -> &dyn common::report::Reporter {
        self.diagnostics.reporter()
    }
}

#[cfg(test)]
pub(crate) mod testutils {
    use super::*;
    use common::report::{Diagnostics, RecordingReporter};

    pub fn context(settings: common::config::Settings) -> (Arc<Context>, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::new());
        let ctx = Context::new(
            settings,
            Diagnostics::new("rcopy", reporter.clone()),
            tokio_util::sync::CancellationToken::new(),
        );
        (ctx, reporter)
    }

    pub fn recursive() -> common::config::Settings {
        common::config::Settings {
            recurse: true,
            ..Default::default()
        }
    }
}
