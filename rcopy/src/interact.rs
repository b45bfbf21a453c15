//! Overwrite confirmation gate
//!
//! The only place where the pipeline waits for a human. The prompt runs on a blocking thread, so
//! the router and the copy workers keep going while a question is pending.

use std::sync::Arc;

use common::report::Prompt;
use common::walk::WalkEntry;

use crate::Context;

/// Accepts "y", "ye" and "yes" in any case
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "ye" | "yes")
}

/// Asks about every entry from `requests` and forwards the approved ones to `copies`.
///
/// Declined entries are dropped without a diagnostic.
pub async fn run(
    ctx: Arc<Context>,
    prompt: Arc<dyn Prompt>,
    requests: async_channel::Receiver<WalkEntry>,
    copies: async_channel::Sender<WalkEntry>,
) {
    tracing::info!("interaction gate started");
    while let Some(entry) = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        entry = requests.recv() => entry.ok(),
    } {
        let message = format!(
            "{}: overwrite '{}'?",
            ctx.diagnostics.prog_name(),
            entry.dst.display()
        );
        let answer = {
            let prompt = prompt.clone();
            tokio::task::spawn_blocking(move || prompt.prompt_yes_no(&message)).await
        };
        match answer {
            Ok(answer) if is_affirmative(&answer) => {
                if copies.send(entry).await.is_err() {
                    tracing::debug!("no copy workers left, dropping entry");
                }
            }
            Ok(answer) => {
                tracing::debug!("not overwriting {:?} (answer: {:?})", &entry.dst, &answer);
                ctx.progress.overwrites_declined.inc();
            }
            Err(error) => ctx.report(format!("confirmation prompt failed: {}", error)),
        }
    }
    tracing::info!("interaction gate done");
}
