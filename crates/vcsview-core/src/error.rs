use std::path::PathBuf;

use serde::Serialize;

/// Errors that can occur across vcsview.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary reports it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use vcsview_core::VcsError;
///
/// let err = VcsError::Config("unknown command".into());
/// assert!(err.to_string().contains("unknown command"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum VcsError {
    /// Filesystem or process I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository access failure.
    #[error("git error: {0}")]
    Git(String),

    /// A VCS command exited with a non-zero status.
    #[error("command `{command}` ended with status {status}")]
    #[diagnostic(help("run with --verbose to see the command output"))]
    Command {
        /// The full command line that was run.
        command: String,
        /// Exit status code (`-1` when killed by a signal).
        status: i32,
    },

    /// Tool output could not be understood.
    #[error("parse error: {0}")]
    Parse(String),

    /// A commit record failed validation.
    #[error("invalid commit: {0}")]
    Construction(#[from] ConstructionError),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// No repository directory was found where one was expected.
    #[error("repository not found at {}", .0.display())]
    #[diagnostic(help("run vcsview from inside a repository, or pass --repo"))]
    RepositoryNotFound(PathBuf),

    /// A path resolved to a location outside the project directory.
    #[error("path {} is outside of the repository", .0.display())]
    PathOutsideRepository(PathBuf),
}

/// Reasons a raw commit record is rejected.
///
/// Scoped to a single commit: the commit is skipped and history
/// construction continues with the next record.
///
/// # Examples
///
/// ```
/// use vcsview_core::ConstructionError;
///
/// let err = ConstructionError::DuplicateId("abc123".into());
/// assert_eq!(err.to_string(), "duplicate commit id abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ConstructionError {
    /// The id was empty or whitespace.
    #[error("id property required")]
    MissingId,

    /// No contributor name was supplied.
    #[error("contributor name required")]
    MissingAuthor,

    /// No date was supplied.
    #[error("date is required")]
    MissingDate,

    /// The date could not be parsed in any supported format.
    #[error("unrecognized date: {0}")]
    InvalidDate(String),

    /// The id was already used by an earlier record in the same window.
    #[error("duplicate commit id {0}")]
    DuplicateId(String),
}

/// Problems found while parsing one file's diff section.
///
/// Hunk-scoped variants drop only the offending hunk; [`DiffError::UnsupportedInput`]
/// degrades the whole file to a binary diff with no hunks.
///
/// # Examples
///
/// ```
/// use vcsview_core::DiffError;
///
/// let err = DiffError::MalformedHunk {
///     header: "@@ -x +1 @@".into(),
///     reason: "invalid range number".into(),
/// };
/// assert!(err.to_string().contains("@@ -x +1 @@"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiffError {
    /// The `@@` header could not be parsed.
    #[error("malformed hunk header `{header}`: {reason}")]
    MalformedHunk {
        /// The raw header line.
        header: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The hunk body did not contain the number of lines its header declared.
    #[error(
        "line count mismatch in `{header}`: old side {actual_a}/{expected_a}, new side {actual_b}/{expected_b}"
    )]
    #[serde(rename_all = "camelCase")]
    CountMismatch {
        /// The raw header line.
        header: String,
        /// Declared old-side line count.
        expected_a: u32,
        /// Old-side lines actually found.
        actual_a: u32,
        /// Declared new-side line count.
        expected_b: u32,
        /// New-side lines actually found.
        actual_b: u32,
    },

    /// The section had no recognizable file header, or binary content where
    /// hunk lines were expected.
    #[error("unsupported diff input: {reason}")]
    UnsupportedInput {
        /// Why the section could not be parsed as text.
        reason: String,
    },
}
