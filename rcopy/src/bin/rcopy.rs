use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use common::filter::FilterSettings;
use common::report::{Diagnostics, Prompt, Reporter};
use common::walk::LinkPolicy;
use tracing::instrument;

use rcopy_pipeline::Context;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rcopy",
    version,
    about = "Copy files and directory trees with parallel workers, resumable transfers and link preservation",
    long_about = "`rcopy` copies SOURCE to TARGET, or multiple SOURCEs into the existing directory TARGET.

A single directory SOURCE becomes TARGET itself (its content ends up directly under TARGET), whether or not TARGET exists yet. A single file is copied into TARGET if TARGET is a directory, otherwise it is copied to TARGET.

EXAMPLES:
    # Copy a tree with 4 parallel copy workers
    rcopy -r -j 4 /source /dest --progress

    # Archive a tree: keep symlinks, hard links, modes and timestamps
    rcopy -a /source /dest

    # Finish an interrupted copy of a large file
    rcopy --resume big.iso /mnt/backup/

    # Ask before overwriting anything
    rcopy -i -r photos /mnt/backup/photos"
)]
struct Args {
    // Copy options
    /// Copy directories recursively
    #[arg(short, long, help_heading = "Copy options")]
    recursive: bool,

    /// Same as -r -P -p
    #[arg(short, long, help_heading = "Copy options")]
    archive: bool,

    /// Always follow symbolic links in source
    #[arg(
        short = 'L',
        long,
        conflicts_with = "no_dereference",
        help_heading = "Copy options"
    )]
    dereference: bool,

    /// Never follow symbolic links in source and recreate hard links between copied files
    #[arg(short = 'P', long, help_heading = "Copy options")]
    no_dereference: bool,

    /// Skip paths matching a glob pattern; `*` also matches `/` (can be given multiple times)
    #[arg(long, value_name = "PATTERN", help_heading = "Copy options")]
    exclude: Vec<String>,

    /// Read exclude patterns from a file, one per line
    #[arg(long, value_name = "FILE", help_heading = "Copy options")]
    exclude_from: Option<PathBuf>,

    /// Resume partially copied files instead of rewriting them
    ///
    /// An existing destination is appended to if sampled blocks of it match the source. Bytes
    /// between the sampled blocks are not compared.
    #[arg(short = 'c', long, help_heading = "Copy options")]
    resume: bool,

    /// Remove destinations that cannot be opened for writing and try again
    #[arg(short, long, help_heading = "Copy options")]
    force: bool,

    /// Prompt before overwriting existing files
    #[arg(short, long, help_heading = "Copy options")]
    interactive: bool,

    /// Preserve mode bits and timestamps
    #[arg(short, long, help_heading = "Copy options")]
    preserve: bool,

    /// Preserve owner and group too (implies --preserve)
    #[arg(long, help_heading = "Copy options")]
    preserve_ownership: bool,

    // Performance
    /// Number of files copied in parallel
    #[arg(
        short,
        long,
        default_value = "1",
        value_name = "N",
        help_heading = "Performance"
    )]
    jobs: usize,

    /// Size of the blocks files are copied in
    #[arg(
        long,
        default_value = "16KiB",
        value_name = "SIZE",
        help_heading = "Performance"
    )]
    block_size: bytesize::ByteSize,

    // Progress & output
    /// Show a byte progress bar
    #[arg(long, help_heading = "Progress & output")]
    progress: bool,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Advanced settings
    /// Number of worker threads (0 = number of CPU cores)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,

    /// Number of blocking worker threads (0 = Tokio default of 512)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_blocking_threads: usize,

    /// Source path(s) and target path
    #[arg(required = true, num_args = 2.., value_name = "PATH")]
    paths: Vec<PathBuf>,
}

impl Args {
    fn link_policy(&self) -> LinkPolicy {
        if self.dereference {
            LinkPolicy::FollowAll
        } else if self.no_dereference || self.archive {
            LinkPolicy::Preserve
        } else {
            LinkPolicy::FollowTop
        }
    }

    fn preserve(&self) -> common::preserve::Settings {
        if self.preserve_ownership {
            common::preserve::preserve_all()
        } else if self.preserve || self.archive {
            common::preserve::preserve_attributes()
        } else {
            common::preserve::preserve_none()
        }
    }

    fn excludes(&self) -> anyhow::Result<FilterSettings> {
        let mut excludes = FilterSettings::new();
        for pattern in &self.exclude {
            excludes.add_exclude(pattern)?;
        }
        if let Some(path) = &self.exclude_from {
            excludes.extend(FilterSettings::from_file(path)?);
        }
        Ok(excludes)
    }
}

/// Prints diagnostics to stderr and drives the optional progress bar
struct ConsoleReporter {
    quiet: bool,
    verbose: bool,
    bar: Option<indicatif::ProgressBar>,
}

impl ConsoleReporter {
    fn new(args: &Args) -> Self {
        let bar = args.progress.then(|| {
            let bar = indicatif::ProgressBar::no_length();
            let style = indicatif::ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar
        });
        Self {
            quiet: args.quiet,
            verbose: args.verbose > 0,
            bar,
        }
    }

    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_start(&self, src: &Path, dst: &Path) {
        if self.verbose {
            self.print(&format!("'{}' -> '{}'", src.display(), dst.display()));
        }
    }

    fn on_progress(&self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn on_error(&self, message: &str) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(bar) => bar.suspend(|| eprintln!("{}", message)),
            None => eprintln!("{}", message),
        }
    }

    fn on_total_bytes_known(&self, total: u64) {
        if let Some(bar) = &self.bar {
            bar.set_length(total);
        }
    }

    fn on_done(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Reads the answer to an overwrite question from stdin
///
/// The progress bar, if any, is hidden while the question is pending.
struct StdinPrompt {
    bar: Option<indicatif::ProgressBar>,
}

impl StdinPrompt {
    fn ask(message: &str) -> String {
        eprint!("{} ", message);
        if let Err(error) = std::io::stderr().flush() {
            tracing::debug!("cannot flush stderr: {}", error);
        }
        let mut answer = String::new();
        match std::io::stdin().read_line(&mut answer) {
            Ok(_) => answer.trim_end().to_owned(),
            Err(error) => {
                tracing::warn!("cannot read answer: {}", error);
                String::new()
            }
        }
    }
}

impl Prompt for StdinPrompt {
    fn prompt_yes_no(&self, message: &str) -> String {
        match &self.bar {
            Some(bar) => bar.suspend(|| Self::ask(message)),
            None => Self::ask(message),
        }
    }
}

#[instrument]
async fn async_main(args: Args) -> anyhow::Result<common::Summary> {
    let (target, sources) = args
        .paths
        .split_last()
        .ok_or_else(|| anyhow!("You must specify at least one source path and a target path!"))?;
    if sources.is_empty() {
        return Err(anyhow!(
            "You must specify at least one source path and a target path!"
        ));
    }
    let settings = common::config::Settings {
        recurse: args.recursive || args.archive,
        link_policy: args.link_policy(),
        excludes: args.excludes()?,
        resume: args.resume,
        force: args.force,
        interactive: args.interactive,
        preserve: args.preserve(),
        concurrency: args.jobs,
        block_size: usize::try_from(args.block_size.as_u64())
            .map_err(|_| anyhow!("block size {} is too large", args.block_size))?,
    };
    settings.validate().map_err(|error| anyhow!(error))?;
    tracing::debug!("copy settings: {:?}", &settings);
    let reporter = Arc::new(ConsoleReporter::new(&args));
    let prompt = Arc::new(StdinPrompt {
        bar: reporter.bar.clone(),
    });
    let ctx = Context::new(
        settings,
        Diagnostics::new("rcopy", reporter),
        tokio_util::sync::CancellationToken::new(),
    );
    tokio::spawn({
        let cancel = ctx.cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, waiting for running copies to finish");
                cancel.cancel();
                // a second interrupt does not wait
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            }
        }
    });
    match rcopy_pipeline::copy(&ctx, prompt, sources, target).await {
        Ok(summary) => Ok(summary),
        Err(error) => {
            if args.summary {
                return Err(anyhow!("{}\n\n{}", error, &error.summary));
            }
            Err(error.source)
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
        max_blocking_threads: args.max_blocking_threads,
    };
    let res = common::run(output, runtime, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
