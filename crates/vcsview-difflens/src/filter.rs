//! Path selection over parsed file diffs.
//!
//! Narrows a multi-file diff to the files a consumer asked for, either by
//! glob pattern or by exact path.

use vcsview_core::{DiffConfig, VcsError};

use crate::parser::ParsedFileDiff;

/// A set of glob patterns matched against diff paths.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::filter::PathFilter;
///
/// let filter = PathFilter::new(&["src/**/*.rs".to_string()]).unwrap();
/// assert!(filter.matches("src/parser/mod.rs"));
/// assert!(!filter.matches("README.md"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<glob::Pattern>,
}

/// Outcome of applying a [`PathFilter`].
#[derive(Debug, Default)]
pub struct FilterResult {
    /// Files that passed the filter.
    pub kept: Vec<ParsedFileDiff>,
    /// Paths that were filtered out.
    pub skipped: Vec<String>,
}

impl PathFilter {
    /// Compile glob patterns.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Config`] naming the first invalid pattern.
    pub fn new(patterns: &[String]) -> Result<Self, VcsError> {
        let patterns = patterns
            .iter()
            .map(|pat| {
                glob::Pattern::new(pat)
                    .map_err(|e| VcsError::Config(format!("invalid path pattern '{pat}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Build the skip filter from diff configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Config`] if a configured pattern is invalid.
    pub fn from_config(config: &DiffConfig) -> Result<Self, VcsError> {
        Self::new(&config.skip_patterns)
    }

    /// `true` when no patterns were given.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check a path against every pattern. A pattern without a `/` also
    /// matches the file name alone.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.patterns.iter().any(|pat| {
            pat.matches(path) || (!pat.as_str().contains('/') && pat.matches(file_name))
        })
    }

    fn matches_diff(&self, parsed: &ParsedFileDiff) -> bool {
        self.matches(parsed.diff.display_path())
    }

    /// Keep only the files matching a pattern. An empty filter keeps everything.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcsview_difflens::filter::PathFilter;
    /// use vcsview_difflens::parser::parse_unified_diff;
    ///
    /// let diffs = parse_unified_diff(
    ///     "--- a/a.rs\n+++ b/a.rs\n@@ -1 +1 @@\n-x\n+y\n--- a/b.md\n+++ b/b.md\n@@ -1 +1 @@\n-x\n+y\n",
    /// );
    /// let filter = PathFilter::new(&["*.rs".to_string()]).unwrap();
    /// let result = filter.select(diffs);
    /// assert_eq!(result.kept.len(), 1);
    /// assert_eq!(result.skipped, vec!["b.md".to_string()]);
    /// ```
    pub fn select(&self, diffs: Vec<ParsedFileDiff>) -> FilterResult {
        if self.is_empty() {
            return FilterResult {
                kept: diffs,
                skipped: Vec::new(),
            };
        }
        self.partition(diffs, true)
    }

    /// Drop the files matching a pattern.
    pub fn skip(&self, diffs: Vec<ParsedFileDiff>) -> FilterResult {
        self.partition(diffs, false)
    }

    fn partition(&self, diffs: Vec<ParsedFileDiff>, keep_matches: bool) -> FilterResult {
        let mut result = FilterResult::default();
        for parsed in diffs {
            if self.matches_diff(&parsed) == keep_matches {
                result.kept.push(parsed);
            } else {
                result.skipped.push(parsed.diff.display_path().to_string());
            }
        }
        result
    }
}

/// Keep the file diffs whose path matches any of `patterns`.
///
/// # Errors
///
/// Returns [`VcsError::Config`] if a pattern is invalid.
pub fn select_paths(
    diffs: Vec<ParsedFileDiff>,
    patterns: &[String],
) -> Result<FilterResult, VcsError> {
    Ok(PathFilter::new(patterns)?.select(diffs))
}

/// Find the diff of one file by its new or previous path.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::filter::find_file;
/// use vcsview_difflens::parser::parse_unified_diff;
///
/// let diffs = parse_unified_diff("--- a/src/a.rs\n+++ b/src/a.rs\n@@ -1 +1 @@\n-x\n+y\n");
/// assert!(find_file(&diffs, "/src/a.rs").is_some());
/// assert!(find_file(&diffs, "src/b.rs").is_none());
/// ```
pub fn find_file<'a>(diffs: &'a [ParsedFileDiff], path: &str) -> Option<&'a ParsedFileDiff> {
    let path = path.trim_start_matches('/');
    diffs
        .iter()
        .find(|p| p.diff.new_path == path || p.diff.previous_path == path)
}
