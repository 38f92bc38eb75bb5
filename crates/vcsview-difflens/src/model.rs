//! Value types for a parsed file diff.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Path diff tools print for the missing side of an added or removed file.
pub const NULL_PATH: &str = "/dev/null";

/// What a diff line does to the file.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::model::LineKind;
///
/// assert_eq!(LineKind::from_marker('+'), Some(LineKind::Added));
/// assert_eq!(LineKind::from_marker('\\'), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Unchanged line present on both sides.
    Context,
    /// Line only present in the new version.
    Added,
    /// Line only present in the old version.
    Removed,
}

impl LineKind {
    /// Classify a body line by its leading character.
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            ' ' => Some(LineKind::Context),
            '+' => Some(LineKind::Added),
            '-' => Some(LineKind::Removed),
            _ => None,
        }
    }

    /// The leading character used for this kind in unified diff text.
    pub fn marker(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Added => '+',
            LineKind::Removed => '-',
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::Context => write!(f, "context"),
            LineKind::Added => write!(f, "added"),
            LineKind::Removed => write!(f, "removed"),
        }
    }
}

/// One line of a hunk body.
///
/// Context lines carry both numbers, added lines only `new_line_no`,
/// removed lines only `old_line_no`.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::model::{LineKind, LineRecord};
///
/// let line = LineRecord::new(LineKind::Added, None, Some(21), "let x = 1;");
/// assert!(line.old_line_no.is_none());
/// assert!(line.markers.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    /// Line classification.
    pub kind: LineKind,
    /// Line number in the old version.
    pub old_line_no: Option<u32>,
    /// Line number in the new version.
    pub new_line_no: Option<u32>,
    /// Line content without the leading marker.
    pub text: String,
    /// Metadata lines that followed this line, such as
    /// `\ No newline at end of file`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
}

impl LineRecord {
    /// Create a record with no markers.
    pub fn new(
        kind: LineKind,
        old_line_no: Option<u32>,
        new_line_no: Option<u32>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            old_line_no,
            new_line_no,
            text: text.into(),
            markers: Vec::new(),
        }
    }
}

/// A contiguous changed region of a file.
///
/// Removed plus context lines always total `count_a`; added plus context
/// lines always total `count_b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// First old-side line.
    pub begin_a: u32,
    /// Old-side line count.
    pub count_a: u32,
    /// First new-side line.
    pub begin_b: u32,
    /// New-side line count.
    pub count_b: u32,
    /// Heading text after the closing `@@`, usually the enclosing function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Body lines in diff order.
    pub lines: Vec<LineRecord>,
}

impl DiffHunk {
    /// Render the `@@ -a,b +c,d @@` header for this hunk.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcsview_difflens::model::DiffHunk;
    ///
    /// let hunk = DiffHunk {
    ///     begin_a: 18,
    ///     count_a: 3,
    ///     begin_b: 18,
    ///     count_b: 4,
    ///     section: None,
    ///     lines: Vec::new(),
    /// };
    /// assert_eq!(hunk.header(), "@@ -18,3 +18,4 @@");
    /// ```
    pub fn header(&self) -> String {
        let header = format!(
            "@@ -{},{} +{},{} @@",
            self.begin_a, self.count_a, self.begin_b, self.count_b
        );
        match &self.section {
            Some(section) => format!("{header} {section}"),
            None => header,
        }
    }

    /// Number of lines of the given kind.
    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// Added/removed totals for a file diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    /// Lines only in the new version.
    pub added: usize,
    /// Lines only in the old version.
    pub removed: usize,
}

/// The diff of a single file.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::parser::parse_file_diff;
///
/// let parsed = parse_file_diff(&[
///     "--- /dev/null",
///     "+++ b/hello.rs",
///     "@@ -0,0 +1 @@",
///     "+fn main() {}",
/// ]);
/// assert!(parsed.diff.file_is_new());
/// assert!(!parsed.diff.file_removed());
/// assert_eq!(parsed.diff.new_path, "hello.rs");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    /// Path of the old version, or [`NULL_PATH`] for a new file.
    pub previous_path: String,
    /// Path of the new version, or [`NULL_PATH`] for a removed file.
    pub new_path: String,
    /// Raw header lines without the `---`/`+++` path lines.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether the tool reported binary content.
    pub is_binary: bool,
    /// Hunks in file order.
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    /// `true` if the file did not exist before this change.
    pub fn file_is_new(&self) -> bool {
        self.previous_path == NULL_PATH
    }

    /// `true` if the file no longer exists after this change.
    pub fn file_removed(&self) -> bool {
        self.new_path == NULL_PATH
    }

    /// The path to show for this file: the new path unless the file was removed.
    pub fn display_path(&self) -> &str {
        if self.file_removed() {
            &self.previous_path
        } else {
            &self.new_path
        }
    }

    /// Look up the record for line `line_no` of the new version, if it is
    /// part of any hunk.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcsview_difflens::model::LineKind;
    /// use vcsview_difflens::parser::parse_file_diff;
    ///
    /// let parsed = parse_file_diff(&[
    ///     "--- a/f.txt",
    ///     "+++ b/f.txt",
    ///     "@@ -1,2 +1,2 @@",
    ///     " keep",
    ///     "-old",
    ///     "+new",
    /// ]);
    /// assert_eq!(parsed.diff.new_line(2).unwrap().kind, LineKind::Added);
    /// assert_eq!(parsed.diff.old_line(2).unwrap().text, "old");
    /// assert!(parsed.diff.new_line(3).is_none());
    /// ```
    pub fn new_line(&self, line_no: u32) -> Option<&LineRecord> {
        self.lines().find(|l| l.new_line_no == Some(line_no))
    }

    /// Look up the record for line `line_no` of the old version.
    pub fn old_line(&self, line_no: u32) -> Option<&LineRecord> {
        self.lines().find(|l| l.old_line_no == Some(line_no))
    }

    /// All line records across hunks, in order.
    pub fn lines(&self) -> impl Iterator<Item = &LineRecord> {
        self.hunks.iter().flat_map(|h| h.lines.iter())
    }

    /// Count added and removed lines.
    pub fn stats(&self) -> DiffStats {
        self.lines().fold(DiffStats::default(), |mut stats, line| {
            match line.kind {
                LineKind::Added => stats.added += 1,
                LineKind::Removed => stats.removed += 1,
                LineKind::Context => {}
            }
            stats
        })
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_binary {
            return write!(f, "{} (binary)", self.display_path());
        }
        write!(f, "{} ({} hunks)", self.display_path(), self.hunks.len())
    }
}
