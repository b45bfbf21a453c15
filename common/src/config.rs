//! Configuration types for runtime and execution settings

use crate::copy;
use crate::filter::FilterSettings;
use crate::preserve;
use crate::walk::{self, LinkPolicy};

/// Runtime configuration for tokio and thread pools
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads (0 = number of CPU cores)
    pub max_workers: usize,
    /// Number of blocking threads (0 = tokio default of 512)
    pub max_blocking_threads: usize,
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

/// Everything that decides what a copy run does
#[derive(Debug, Clone)]
pub struct Settings {
    pub recurse: bool,
    pub link_policy: LinkPolicy,
    pub excludes: FilterSettings,
    /// Append to destinations that look like a prefix of their source
    pub resume: bool,
    /// Remove destinations that cannot be written and try again
    pub force: bool,
    /// Ask before overwriting existing destinations
    pub interactive: bool,
    pub preserve: preserve::Settings,
    /// Number of copy workers
    pub concurrency: usize,
    pub block_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recurse: false,
            link_policy: LinkPolicy::default(),
            excludes: FilterSettings::default(),
            resume: false,
            force: false,
            interactive: false,
            preserve: preserve::preserve_none(),
            concurrency: 1,
            block_size: copy::DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Settings {
    /// Validate configuration and return errors if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("at least one copy worker is required".to_string());
        }
        if self.block_size == 0 {
            return Err("block size must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn walk(&self) -> walk::Settings {
        walk::Settings {
            links: self.link_policy,
            recurse: self.recurse,
            excludes: self.excludes.clone(),
        }
    }

    pub fn copy(&self) -> copy::Settings {
        copy::Settings {
            resume: self.resume,
            force: self.force,
            block_size: self.block_size,
        }
    }
}
