//! Common building blocks of the `rcopy` tool
//!
//! - [`destination`] decides where every source entry ends up
//! - [`walk`] classifies the source trees into a stream of [`walk::WalkEntry`] values
//! - [`copy`] streams file content (optionally resuming) and recreates links
//! - [`preserve`] copies mode bits, timestamps and ownership
//! - [`report`] is the boundary to whatever presents progress and asks questions
//!
//! The pipeline wiring these together lives in the `rcopy` crate. [`run`] sets up logging and the
//! tokio runtime for it.

pub mod config;
pub mod copy;
pub mod destination;
pub mod error;
pub mod filter;
pub mod preserve;
pub mod progress;
pub mod report;
pub mod walk;

#[cfg(test)]
pub mod testutils;

pub use config::{OutputConfig, RuntimeConfig};
pub use error::Error;
pub use progress::Summary;

fn log_filter(verbose: u8) -> tracing_subscriber::EnvFilter {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

/// Runs `func` on a freshly built tokio runtime.
///
/// Returns `None` if the runtime could not be built or `func` failed; the error chain is printed
/// to stderr unless `output.quiet` is set.
pub fn run<Fut>(
    output: OutputConfig,
    runtime: RuntimeConfig,
    func: impl FnOnce() -> Fut,
) -> Option<Summary>
where
    Fut: std::future::Future<Output = anyhow::Result<Summary>>,
{
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(log_filter(output.verbose))
        .with_target(false)
        .try_init()
    {
        eprintln!("failed to initialize logging: {}", error);
    }
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    if runtime.max_blocking_threads > 0 {
        builder.max_blocking_threads(runtime.max_blocking_threads);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(error) => {
            if !output.quiet {
                eprintln!("failed to start the tokio runtime: {}", error);
            }
            return None;
        }
    };
    let res = rt.block_on(func());
    match res {
        Ok(summary) => {
            if output.print_summary || output.verbose > 0 {
                println!("{}", &summary);
            }
            Some(summary)
        }
        Err(error) => {
            tracing::debug!("run failed: {:#}", &error);
            if !output.quiet {
                eprintln!("{:#}", error);
            }
            None
        }
    }
}
