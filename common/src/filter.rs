//! Pattern-based exclusion of paths during the tree walk
//!
//! Patterns are tested against the full path of each visited entry, the same string the walker
//! would otherwise stat. Matching follows shell `fnmatch` rules:
//!
//! - `*` matches anything, including `/`
//! - `?` matches a single character
//! - `[...]` character classes
//!
//! # Examples
//!
//! ```
//! use common::filter::FilterSettings;
//! use std::path::Path;
//!
//! let mut settings = FilterSettings::default();
//! settings.add_exclude("*.log").unwrap();
//! settings.add_exclude("*/target").unwrap();
//!
//! assert!(settings.is_excluded(Path::new("src/debug.log")));
//! assert!(settings.is_excluded(Path::new("project/target")));
//! assert!(!settings.is_excluded(Path::new("src/main.rs")));
//! ```

use anyhow::{Context, anyhow};
use std::path::Path;

/// A compiled exclude pattern together with its original form
#[derive(Debug, Clone)]
pub struct FilterPattern {
    /// original pattern string, used when logging why a path was skipped
    pub original: String,
    matcher: globset::GlobMatcher,
}

impl FilterPattern {
    pub fn parse(pattern: &str) -> Result<Self, anyhow::Error> {
        if pattern.is_empty() {
            return Err(anyhow!("empty pattern is not allowed"));
        }
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(false) // * crosses directories, like fnmatch
            .backslash_escape(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {}", pattern))?;
        Ok(Self {
            original: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterSettings {
    pub excludes: Vec<FilterPattern>,
}

impl FilterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_exclude(&mut self, pattern: &str) -> Result<(), anyhow::Error> {
        self.excludes.push(FilterPattern::parse(pattern)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.excludes.is_empty()
    }

    /// Returns the first pattern matching `path`, if any.
    pub fn excluded_by(&self, path: &Path) -> Option<&FilterPattern> {
        self.excludes.iter().find(|pattern| pattern.matches(path))
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded_by(path).is_some()
    }

    /// Reads exclude patterns from a file
    ///
    /// # File Format
    /// ```text
    /// # comments supported
    /// *.log
    /// */target
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read exclude file: {:?}", path))?;
        Self::parse_content(&content)
    }

    pub fn parse_content(content: &str) -> Result<Self, anyhow::Error> {
        let mut settings = Self::new();
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            settings
                .add_exclude(line)
                .with_context(|| format!("line {}: invalid exclude pattern", line_num + 1))?;
        }
        Ok(settings)
    }

    /// Merges patterns from `other` after the ones already present.
    pub fn extend(&mut self, other: FilterSettings) {
        self.excludes.extend(other.excludes);
    }
}
