//! Sinks connecting the copy pipeline to whatever presents it
//!
//! The pipeline never prints anything itself. Progress and diagnostics go to a [`Reporter`],
//! overwrite confirmations are requested from a [`Prompt`]. Both are shared between concurrently
//! running roles, so implementations must be `Send + Sync`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives progress events and diagnostics. Every method except [`Reporter::on_error`] is
/// optional.
pub trait Reporter: Send + Sync {
    /// A file copy (or link creation) is about to start
    fn on_start(&self, _src: &Path, _dst: &Path) {}
    /// Bytes copied, or skipped because they were already in place
    fn on_progress(&self, _bytes: u64) {}
    fn on_finish(&self, _src: &Path, _dst: &Path) {}
    /// Fully formatted diagnostic, including the program name
    fn on_error(&self, message: &str);
    /// Sum of the sizes of all regular files, sent once the walk is done
    fn on_total_bytes_known(&self, _total: u64) {}
    /// Sent once after all work has finished
    fn on_done(&self) {}
}

/// Asks the user a yes/no question and returns the raw answer.
pub trait Prompt: Send + Sync {
    fn prompt_yes_no(&self, message: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(PathBuf, PathBuf),
    Progress(u64),
    Finish(PathBuf, PathBuf),
    Error(String),
    TotalBytesKnown(u64),
    Done,
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: std::sync::Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Total of all progress notifications
    pub fn progress_bytes(&self) -> u64 {
        self.events()
            .iter()
            .map(|event| match event {
                Event::Progress(bytes) => *bytes,
                _ => 0,
            })
            .sum()
    }
}

impl Reporter for RecordingReporter {
    fn on_start(&self, src: &Path, dst: &Path) {
        self.push(Event::Start(src.to_owned(), dst.to_owned()));
    }

    fn on_progress(&self, bytes: u64) {
        self.push(Event::Progress(bytes));
    }

    fn on_finish(&self, src: &Path, dst: &Path) {
        self.push(Event::Finish(src.to_owned(), dst.to_owned()));
    }

    fn on_error(&self, message: &str) {
        self.push(Event::Error(message.to_owned()));
    }

    fn on_total_bytes_known(&self, total: u64) {
        self.push(Event::TotalBytesKnown(total));
    }

    fn on_done(&self) {
        self.push(Event::Done);
    }
}

/// Gives the same answer to every question and remembers what was asked.
#[derive(Debug, Default)]
pub struct FixedPrompt {
    answer: String,
    asked: std::sync::Mutex<Vec<String>>,
}

impl FixedPrompt {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_owned(),
            asked: Default::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for FixedPrompt {
    fn prompt_yes_no(&self, message: &str) -> String {
        self.asked.lock().unwrap().push(message.to_owned());
        self.answer.clone()
    }
}

/// Formats diagnostics for the reporter and remembers whether any were issued.
pub struct Diagnostics {
    prog_name: String,
    reporter: Arc<dyn Reporter>,
    failed: AtomicBool,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("prog_name", &self.prog_name)
            .field("failed", &self.failed)
            .finish()
    }
}

impl Diagnostics {
    pub fn new(prog_name: &str, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            prog_name: prog_name.to_owned(),
            reporter,
            failed: AtomicBool::new(false),
        }
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn prog_name(&self) -> &str {
        &self.prog_name
    }

    /// Reports a per-entry failure, the run continues.
    pub fn report(&self, error: &dyn std::fmt::Display) {
        tracing::debug!("reporting: {}", error);
        self.failed.store(true, Ordering::Relaxed);
        self.reporter
            .on_error(&format!("{}: {}", &self.prog_name, error));
    }

    /// True if at least one diagnostic was reported
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}
