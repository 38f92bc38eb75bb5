use serde::Serialize;
use vcsview_core::DiffError;

use crate::model::{DiffHunk, FileDiff, LineKind, LineRecord, NULL_PATH};

/// A parsed file diff together with the problems found while parsing it.
///
/// Issues never abort the file: malformed hunks are dropped, and a section
/// with no usable header degrades to a binary diff with no hunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFileDiff {
    /// The file model.
    pub diff: FileDiff,
    /// Hunk- or file-scoped problems, in input order.
    pub issues: Vec<DiffError>,
}

impl ParsedFileDiff {
    /// `true` when the section parsed without any issue.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parsed `@@ -a,b +c,d @@ section` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HunkHeader {
    begin_a: u32,
    count_a: u32,
    begin_b: u32,
    count_b: u32,
    section: Option<String>,
}

/// Parse the lines of exactly one file's diff section.
///
/// Header lines provide the paths (`a/`/`b/` prefixes stripped, `/dev/null`
/// kept verbatim). Each `@@` header opens a hunk whose body lines are
/// numbered from the header's start lines. Lines starting with anything
/// other than a space, `+` or `-` are attached to the preceding record as
/// markers.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::parser::parse_file_diff;
///
/// let parsed = parse_file_diff(&[
///     "diff --git a/hello.rs b/hello.rs",
///     "--- a/hello.rs",
///     "+++ b/hello.rs",
///     "@@ -1,2 +1,3 @@",
///     " fn main() {",
///     "+    println!(\"hello\");",
///     " }",
/// ]);
/// assert!(parsed.is_clean());
/// let hunk = &parsed.diff.hunks[0];
/// assert_eq!(hunk.lines[1].new_line_no, Some(2));
/// assert_eq!(hunk.lines[1].old_line_no, None);
/// ```
pub fn parse_file_diff<S: AsRef<str>>(lines: &[S]) -> ParsedFileDiff {
    let mut header = SectionHeader::default();
    let mut hunks = Vec::new();
    let mut issues = Vec::new();
    let mut open: Option<OpenHunk> = None;
    let mut in_body = false;

    for line in lines {
        let line: &str = line.as_ref();
        if line.starts_with("@@") {
            close_hunk(open.take(), &mut hunks, &mut issues);
            in_body = true;
            match parse_hunk_header(line) {
                Ok(parsed) => open = Some(OpenHunk::new(line, parsed)),
                Err(reason) => issues.push(DiffError::MalformedHunk {
                    header: line.to_string(),
                    reason,
                }),
            }
            continue;
        }

        if in_body {
            if is_binary_marker(line) {
                issues.push(DiffError::UnsupportedInput {
                    reason: format!("binary marker where a hunk line was expected: {line}"),
                });
                return ParsedFileDiff {
                    diff: header.into_binary(),
                    issues,
                };
            }
            // Lines after a malformed header belong to the dropped hunk.
            if let Some(hunk) = open.as_mut() {
                if !hunk.is_full() || line.starts_with('\\') {
                    hunk.push(line);
                }
            }
            continue;
        }

        header.read(line);
    }
    close_hunk(open.take(), &mut hunks, &mut issues);

    if !header.recognized {
        issues.push(DiffError::UnsupportedInput {
            reason: "no file header found".into(),
        });
        return ParsedFileDiff {
            diff: header.into_binary(),
            issues,
        };
    }

    if header.is_binary {
        return ParsedFileDiff {
            diff: header.into_binary(),
            issues,
        };
    }

    let mut diff = header.into_diff();
    diff.hunks = hunks;
    ParsedFileDiff { diff, issues }
}

/// Parse a multi-file unified diff, one [`ParsedFileDiff`] per file section.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::parser::parse_unified_diff;
///
/// let files = parse_unified_diff("");
/// assert!(files.is_empty());
/// ```
pub fn parse_unified_diff(input: &str) -> Vec<ParsedFileDiff> {
    split_file_sections(input)
        .iter()
        .map(|section| parse_file_diff(section.as_slice()))
        .collect()
}

/// Split diff text into per-file line sections.
///
/// A section starts at each `diff ` command line. Patches without command
/// lines are split at a `---`/`+++` pair that appears outside a hunk body.
/// A section ends at the first line after a complete hunk that is neither a
/// hunk header nor a `\` marker. Text outside sections (commit headers, mail
/// preamble, patch signature) is skipped.
///
/// # Examples
///
/// ```
/// use vcsview_difflens::parser::split_file_sections;
///
/// let text = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n--- a/y\n+++ b/y\n@@ -1 +1 @@\n-c\n+d\n";
/// let sections = split_file_sections(text);
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[1][0], "--- a/y");
/// ```
pub fn split_file_sections(input: &str) -> Vec<Vec<&str>> {
    let lines: Vec<&str> = input.lines().collect();
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut started = false;
    let mut has_paths = false;
    let mut remaining = (0u32, 0u32);
    // After a hunk header; `loose` when its counts could not be read.
    let mut in_hunks = false;
    let mut loose = false;

    for (idx, &line) in lines.iter().enumerate() {
        let in_body = remaining != (0, 0);
        let next_is_new_path = lines
            .get(idx + 1)
            .is_some_and(|next| next.starts_with("+++ "));

        let boundary = line.starts_with("diff ")
            || (!in_body && line.starts_with("--- ") && next_is_new_path && (has_paths || !started))
            || (!started && is_binary_marker(line));

        if boundary {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            started = true;
            has_paths = false;
            remaining = (0, 0);
            in_hunks = false;
            loose = false;
        }

        if !started {
            continue;
        }

        if in_hunks && !in_body && !line.starts_with("@@") && !line.starts_with('\\') {
            let body_like = matches!(line.chars().next(), None | Some(' ' | '+' | '-'));
            if !(loose && body_like) {
                sections.push(std::mem::take(&mut current));
                started = false;
                in_hunks = false;
                loose = false;
                continue;
            }
        }

        current.push(line);

        if line.starts_with("@@") {
            let counts = parse_hunk_header(line).map(|h| (h.count_a, h.count_b));
            loose = counts.is_err();
            remaining = counts.unwrap_or((0, 0));
            in_hunks = true;
            has_paths = true;
        } else if in_body {
            remaining = consume_body_line(remaining, line);
        } else if line.starts_with("--- ") {
            has_paths = true;
        }
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

fn consume_body_line((a, b): (u32, u32), line: &str) -> (u32, u32) {
    match line.chars().next() {
        Some('+') => (a, b.saturating_sub(1)),
        Some('-') => (a.saturating_sub(1), b),
        Some(' ') | None => (a.saturating_sub(1), b.saturating_sub(1)),
        Some(_) => (a, b),
    }
}

/// A hunk whose body is still being read.
struct OpenHunk {
    header: String,
    hunk: DiffHunk,
    next_a: u32,
    next_b: u32,
    seen_a: u32,
    seen_b: u32,
}

impl OpenHunk {
    fn new(raw: &str, parsed: HunkHeader) -> Self {
        Self {
            header: raw.to_string(),
            next_a: parsed.begin_a,
            next_b: parsed.begin_b,
            seen_a: 0,
            seen_b: 0,
            hunk: DiffHunk {
                begin_a: parsed.begin_a,
                count_a: parsed.count_a,
                begin_b: parsed.begin_b,
                count_b: parsed.count_b,
                section: parsed.section,
                lines: Vec::new(),
            },
        }
    }

    /// Both sides have as many lines as the header declares.
    fn is_full(&self) -> bool {
        self.seen_a >= self.hunk.count_a && self.seen_b >= self.hunk.count_b
    }

    fn push(&mut self, line: &str) {
        let Some(marker) = line.chars().next() else {
            // Blank context lines lose their leading space in some tools.
            if self.seen_a < self.hunk.count_a && self.seen_b < self.hunk.count_b {
                self.push_record(LineKind::Context, "");
            }
            return;
        };

        match LineKind::from_marker(marker) {
            Some(kind) => self.push_record(kind, &line[marker.len_utf8()..]),
            None => {
                if let Some(last) = self.hunk.lines.last_mut() {
                    last.markers.push(line.to_string());
                }
            }
        }
    }

    fn push_record(&mut self, kind: LineKind, text: &str) {
        let old_line_no = match kind {
            LineKind::Context | LineKind::Removed => {
                let no = self.next_a;
                self.next_a = self.next_a.saturating_add(1);
                self.seen_a += 1;
                Some(no)
            }
            LineKind::Added => None,
        };
        let new_line_no = match kind {
            LineKind::Context | LineKind::Added => {
                let no = self.next_b;
                self.next_b = self.next_b.saturating_add(1);
                self.seen_b += 1;
                Some(no)
            }
            LineKind::Removed => None,
        };
        self.hunk
            .lines
            .push(LineRecord::new(kind, old_line_no, new_line_no, text));
    }

    fn finish(self) -> Result<DiffHunk, DiffError> {
        if self.seen_a != self.hunk.count_a || self.seen_b != self.hunk.count_b {
            return Err(DiffError::CountMismatch {
                header: self.header,
                expected_a: self.hunk.count_a,
                actual_a: self.seen_a,
                expected_b: self.hunk.count_b,
                actual_b: self.seen_b,
            });
        }
        Ok(self.hunk)
    }
}

fn close_hunk(open: Option<OpenHunk>, hunks: &mut Vec<DiffHunk>, issues: &mut Vec<DiffError>) {
    if let Some(open) = open {
        match open.finish() {
            Ok(hunk) => hunks.push(hunk),
            Err(issue) => issues.push(issue),
        }
    }
}

/// Header lines read before the first hunk.
#[derive(Default)]
struct SectionHeader {
    recognized: bool,
    is_binary: bool,
    old_path: Option<String>,
    new_path: Option<String>,
    fallback_paths: Option<(String, String)>,
    new_file: bool,
    deleted_file: bool,
    description: Vec<String>,
}

impl SectionHeader {
    fn read(&mut self, line: &str) {
        if let Some(raw) = line.strip_prefix("--- ") {
            self.recognized = true;
            self.old_path = Some(parse_path(raw));
            return;
        }
        if let Some(raw) = line.strip_prefix("+++ ") {
            self.recognized = true;
            self.new_path = Some(parse_path(raw));
            return;
        }

        if let Some(rest) = line.strip_prefix("diff ") {
            self.recognized = true;
            if let Some(paths) = parse_diff_command(rest) {
                self.fallback_paths = Some(paths);
            }
        } else if is_binary_marker(line) {
            self.recognized = true;
            self.is_binary = true;
            if self.fallback_paths.is_none() {
                self.fallback_paths = parse_binary_marker(line);
            }
        } else if line.starts_with("new file mode") {
            self.new_file = true;
        } else if line.starts_with("deleted file mode") {
            self.deleted_file = true;
        }

        self.description.push(line.to_string());
    }

    fn into_diff(self) -> FileDiff {
        let (fallback_old, fallback_new) = self.fallback_paths.unwrap_or_default();
        let previous_path = match self.old_path {
            Some(path) => path,
            None if self.new_file => NULL_PATH.to_string(),
            None => fallback_old,
        };
        let new_path = match self.new_path {
            Some(path) => path,
            None if self.deleted_file => NULL_PATH.to_string(),
            None => fallback_new,
        };

        FileDiff {
            previous_path,
            new_path,
            description: self.description.join("\n"),
            is_binary: self.is_binary,
            hunks: Vec::new(),
        }
    }

    fn into_binary(self) -> FileDiff {
        FileDiff {
            is_binary: true,
            ..self.into_diff()
        }
    }
}

fn is_binary_marker(line: &str) -> bool {
    (line.starts_with("Binary files ") && line.ends_with(" differ"))
        || (line.starts_with("Binary file ") && line.ends_with(" has changed"))
        || line == "GIT binary patch"
}

fn parse_binary_marker(line: &str) -> Option<(String, String)> {
    if let Some(inner) = line
        .strip_prefix("Binary files ")
        .and_then(|s| s.strip_suffix(" differ"))
    {
        let (old, new) = inner.split_once(" and ")?;
        return Some((parse_path(old), parse_path(new)));
    }
    let path = line
        .strip_prefix("Binary file ")
        .and_then(|s| s.strip_suffix(" has changed"))?;
    let path = parse_path(path);
    Some((path.clone(), path))
}

/// Paths from `diff --git a/x b/y` or hg's `diff -r rev path`.
fn parse_diff_command(rest: &str) -> Option<(String, String)> {
    if let Some(paths) = rest.strip_prefix("--git ") {
        // Same path on both sides: halves of equal length, even if it contains ` b/`.
        let mid = paths.len() / 2;
        if paths.len() % 2 == 1 && paths.as_bytes()[mid] == b' ' {
            let (old, new) = (&paths[..mid], &paths[mid + 1..]);
            if let (Some(o), Some(n)) = (old.strip_prefix("a/"), new.strip_prefix("b/")) {
                if o == n {
                    return Some((o.to_string(), n.to_string()));
                }
            }
        }
        let split = paths.find(" b/").or_else(|| paths.find(" \"b/"))?;
        return Some((parse_path(&paths[..split]), parse_path(&paths[split + 1..])));
    }

    let path = rest.split_whitespace().last()?;
    if path.starts_with('-') {
        return None;
    }
    let path = parse_path(path);
    Some((path.clone(), path))
}

fn parse_path(raw: &str) -> String {
    // hg appends a tab-separated timestamp to path lines.
    let raw = raw.split('\t').next().unwrap_or(raw).trim_end();
    let normalized = raw.trim_matches('"');

    if normalized == NULL_PATH {
        return NULL_PATH.to_string();
    }

    normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized)
        .to_string()
}

fn parse_hunk_header(line: &str) -> Result<HunkHeader, String> {
    if line.starts_with("@@@") {
        return Err("combined diff headers are not supported".into());
    }
    let rest = line
        .strip_prefix("@@ ")
        .ok_or_else(|| "missing opening @@".to_string())?;
    let end = rest
        .find(" @@")
        .ok_or_else(|| "missing closing @@".to_string())?;
    let ranges = &rest[..end];
    let section = rest[end + 3..].trim();

    let parts: Vec<&str> = ranges.split(' ').collect();
    if parts.len() != 2 {
        return Err(format!("expected two ranges, found {}", parts.len()));
    }

    let old = parts[0]
        .strip_prefix('-')
        .ok_or_else(|| format!("invalid old range `{}`", parts[0]))?;
    let new = parts[1]
        .strip_prefix('+')
        .ok_or_else(|| format!("invalid new range `{}`", parts[1]))?;

    let (begin_a, count_a) = parse_range(old)?;
    let (begin_b, count_b) = parse_range(new)?;

    Ok(HunkHeader {
        begin_a,
        count_a,
        begin_b,
        count_b,
        section: (!section.is_empty()).then(|| section.to_string()),
    })
}

fn parse_range(range: &str) -> Result<(u32, u32), String> {
    if let Some((start, count)) = range.split_once(',') {
        let s = start
            .parse()
            .map_err(|_| format!("invalid range number `{start}`"))?;
        let c = count
            .parse()
            .map_err(|_| format!("invalid range count `{count}`"))?;
        Ok((s, c))
    } else {
        let s = range
            .parse()
            .map_err(|_| format!("invalid range number `{range}`"))?;
        Ok((s, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn empty_diff_returns_empty_vec() {
        assert!(parse_unified_diff("").is_empty());
    }

    #[test]
    fn hunk_with_one_addition_numbers_both_sides() {
        let diff = "\
--- a/src/main.rs
+++ b/src/main.rs
@@ -18,3 +18,4 @@
 first
 second
+inserted
 third
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.is_clean());
        let hunk = &parsed.diff.hunks[0];
        assert_eq!(
            (hunk.begin_a, hunk.count_a, hunk.begin_b, hunk.count_b),
            (18, 3, 18, 4)
        );
        let old_numbered = hunk.lines.iter().filter(|l| l.old_line_no.is_some()).count();
        let new_numbered = hunk.lines.iter().filter(|l| l.new_line_no.is_some()).count();
        assert_eq!(old_numbered, 3);
        assert_eq!(new_numbered, 4);

        let added = &hunk.lines[2];
        assert_eq!(added.kind, LineKind::Added);
        assert_eq!(added.old_line_no, None);
        assert_eq!(added.new_line_no, Some(20));
        assert_eq!(added.text, "inserted");
        assert_eq!(hunk.lines[3].old_line_no, Some(20));
        assert_eq!(hunk.lines[3].new_line_no, Some(21));
    }

    #[test]
    fn context_offset_tracks_preceding_changes() {
        let diff = "\
--- a/f.txt
+++ b/f.txt
@@ -10,5 +12,4 @@ impl Foo
 a
-b
-c
+C
 d
 e
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.is_clean());
        let hunk = &parsed.diff.hunks[0];
        assert_eq!(hunk.section.as_deref(), Some("impl Foo"));

        let offsets: Vec<(Option<u32>, Option<u32>)> = hunk
            .lines
            .iter()
            .map(|l| (l.old_line_no, l.new_line_no))
            .collect();
        assert_eq!(
            offsets,
            vec![
                (Some(10), Some(12)),
                (Some(11), None),
                (Some(12), None),
                (None, Some(13)),
                (Some(13), Some(14)),
                (Some(14), Some(15)),
            ]
        );
        // Context runs after the change block share one offset.
        assert_eq!(hunk.lines[4].new_line_no.unwrap() - hunk.lines[4].old_line_no.unwrap(), 1);
        assert_eq!(hunk.lines[5].new_line_no.unwrap() - hunk.lines[5].old_line_no.unwrap(), 1);
    }

    #[test]
    fn count_defaults_to_one() {
        let parsed = parse_file_diff(&lines("--- a/f\n+++ b/f\n@@ -3 +3 @@\n-x\n+y\n"));
        let hunk = &parsed.diff.hunks[0];
        assert_eq!((hunk.count_a, hunk.count_b), (1, 1));
        assert_eq!(hunk.lines[0].old_line_no, Some(3));
        assert_eq!(hunk.lines[1].new_line_no, Some(3));
    }

    #[test]
    fn multiple_hunks_keep_order() {
        let diff = "\
diff --git a/lib.rs b/lib.rs
--- a/lib.rs
+++ b/lib.rs
@@ -1,2 +1,3 @@
 fn foo() {
+    bar();
 }
@@ -10,2 +11,3 @@
 fn baz() {
+    qux();
 }
";
        let parsed = parse_file_diff(&lines(diff));
        assert_eq!(parsed.diff.hunks.len(), 2);
        assert_eq!(parsed.diff.hunks[0].begin_a, 1);
        assert_eq!(parsed.diff.hunks[1].begin_a, 10);
        assert_eq!(parsed.diff.hunks[1].lines[1].new_line_no, Some(12));
    }

    #[test]
    fn new_file_keeps_sentinel_path() {
        let diff = "\
diff --git a/new.rs b/new.rs
new file mode 100644
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,2 @@
+fn hello() {
+}
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.is_clean());
        assert_eq!(parsed.diff.previous_path, "/dev/null");
        assert_eq!(parsed.diff.new_path, "new.rs");
        assert!(parsed.diff.file_is_new());
        assert!(!parsed.diff.file_removed());
        assert_eq!(parsed.diff.hunks[0].lines[1].new_line_no, Some(2));
    }

    #[test]
    fn deleted_file_keeps_sentinel_path() {
        let diff = "\
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1,2 +0,0 @@
-fn goodbye() {
-}
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.diff.file_removed());
        assert!(!parsed.diff.file_is_new());
        assert_eq!(parsed.diff.previous_path, "old.rs");
        assert_eq!(parsed.diff.hunks[0].lines[1].old_line_no, Some(2));
    }

    #[test]
    fn empty_new_file_without_path_lines() {
        let diff = "\
diff --git a/empty.txt b/empty.txt
new file mode 100644
index 0000000..e69de29
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.is_clean());
        assert!(parsed.diff.file_is_new());
        assert_eq!(parsed.diff.new_path, "empty.txt");
        assert!(parsed.diff.hunks.is_empty());
        assert!(parsed.diff.description.contains("new file mode"));
    }

    #[test]
    fn binary_marker_skips_hunks() {
        let diff = "\
diff --git a/image.png b/image.png
index 1111111..2222222 100644
Binary files a/image.png and b/image.png differ
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.is_clean());
        assert!(parsed.diff.is_binary);
        assert!(parsed.diff.hunks.is_empty());
        assert_eq!(parsed.diff.new_path, "image.png");
    }

    #[test]
    fn binary_marker_alone_provides_paths() {
        let parsed = parse_file_diff(&["Binary files /dev/null and b/logo.png differ"]);
        assert!(parsed.diff.is_binary);
        assert!(parsed.diff.file_is_new());
        assert_eq!(parsed.diff.new_path, "logo.png");
    }

    #[test]
    fn binary_marker_inside_hunk_degrades_file() {
        let diff = "\
--- a/f
+++ b/f
@@ -1 +1 @@
-a
Binary files a/f and b/f differ
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.diff.is_binary);
        assert!(parsed.diff.hunks.is_empty());
        assert!(matches!(
            parsed.issues.as_slice(),
            [DiffError::UnsupportedInput { .. }]
        ));
    }

    #[test]
    fn missing_header_degrades_to_binary() {
        let parsed = parse_file_diff(&["@@ -1 +1 @@", "-a", "+b"]);
        assert!(parsed.diff.is_binary);
        assert!(parsed.diff.hunks.is_empty());
        assert!(matches!(
            parsed.issues.last(),
            Some(DiffError::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn malformed_header_drops_only_that_hunk() {
        let diff = "\
--- a/f
+++ b/f
@@ -x,2 +1,2 @@
-dropped
+dropped
@@ -5 +5 @@
-old
+new
";
        let parsed = parse_file_diff(&lines(diff));
        assert_eq!(parsed.diff.hunks.len(), 1);
        assert_eq!(parsed.diff.hunks[0].begin_a, 5);
        assert_eq!(parsed.issues.len(), 1);
        match &parsed.issues[0] {
            DiffError::MalformedHunk { header, reason } => {
                assert_eq!(header, "@@ -x,2 +1,2 @@");
                assert!(reason.contains("`x`"));
            }
            other => panic!("unexpected issue: {other:?}"),
        }
    }

    #[test]
    fn count_mismatch_drops_hunk_and_continues() {
        let diff = "\
--- a/f
+++ b/f
@@ -1,3 +1,3 @@
 only one line
@@ -9 +9 @@
-x
+y
";
        let parsed = parse_file_diff(&lines(diff));
        assert_eq!(parsed.diff.hunks.len(), 1);
        assert_eq!(parsed.diff.hunks[0].begin_a, 9);
        assert_eq!(
            parsed.issues,
            vec![DiffError::CountMismatch {
                header: "@@ -1,3 +1,3 @@".into(),
                expected_a: 3,
                actual_a: 1,
                expected_b: 3,
                actual_b: 1,
            }]
        );
    }

    #[test]
    fn no_newline_marker_attaches_to_previous_line() {
        let diff = "\
--- a/f.rs
+++ b/f.rs
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let parsed = parse_file_diff(&lines(diff));
        assert!(parsed.is_clean());
        let hunk = &parsed.diff.hunks[0];
        assert_eq!(hunk.lines.len(), 2);
        assert_eq!(hunk.lines[0].markers, vec!["\\ No newline at end of file"]);
        assert_eq!(hunk.lines[1].markers, vec!["\\ No newline at end of file"]);
        assert_eq!(hunk.lines[1].text, "new");
    }

    #[test]
    fn blank_context_line_counts_when_room_remains() {
        let parsed =
            parse_file_diff(&["--- a/f", "+++ b/f", "@@ -1,3 +1,3 @@", " a", "", " c", ""]);
        assert!(parsed.is_clean());
        let hunk = &parsed.diff.hunks[0];
        assert_eq!(hunk.lines.len(), 3);
        assert_eq!(hunk.lines[1].kind, LineKind::Context);
        assert_eq!(hunk.lines[1].text, "");
    }

    #[test]
    fn reparsing_is_idempotent() {
        let diff = include_str!("../tests/fixtures/simple.diff");
        assert_eq!(parse_unified_diff(diff), parse_unified_diff(diff));
    }

    #[test]
    fn hg_paths_drop_timestamps() {
        let diff = "\
diff -r 9117c6561b0b -r 273ce12ad8f1 src/app.py
--- a/src/app.py\tThu Jan 01 00:00:00 1970 +0000
+++ b/src/app.py\tFri Mar 01 12:00:00 2024 +0000
@@ -1 +1 @@
-a
+b
";
        let parsed = parse_file_diff(&lines(diff));
        assert_eq!(parsed.diff.previous_path, "src/app.py");
        assert_eq!(parsed.diff.new_path, "src/app.py");
    }

    #[test]
    fn rename_without_hunks_takes_paths_from_command_line() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 100%
rename from old_name.rs
rename to new_name.rs
";
        let parsed = parse_file_diff(&lines(diff));
        assert_eq!(parsed.diff.previous_path, "old_name.rs");
        assert_eq!(parsed.diff.new_path, "new_name.rs");
        assert!(parsed.diff.description.contains("rename to new_name.rs"));
    }

    #[test]
    fn removed_line_that_looks_like_header_stays_in_hunk() {
        let diff = "\
--- a/notes.md
+++ b/notes.md
@@ -1,2 +1,1 @@
--- a/separator
 kept
";
        let sections = split_file_sections(diff);
        assert_eq!(sections.len(), 1);
        let parsed = parse_file_diff(&sections[0]);
        assert!(parsed.is_clean());
        assert_eq!(parsed.diff.hunks[0].lines[0].text, "-- a/separator");
    }

    #[test]
    fn split_on_diff_command_lines() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1 +1,2 @@
 line1
+line2
diff --git a/b.rs b/b.rs
--- a/b.rs
+++ b/b.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let files = parse_unified_diff(diff);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].diff.new_path, "a.rs");
        assert_eq!(files[1].diff.new_path, "b.rs");
    }

    #[test]
    fn preamble_before_first_file_is_skipped() {
        let diff = "\
commit 9fceb02d0ae598e95dc970b74767f19372d61af8
Author: alice <alice@example.com>

    fix typo

diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-teh
+the
";
        let files = parse_unified_diff(diff);
        assert_eq!(files.len(), 1);
        assert!(files[0].is_clean());
        assert!(!files[0].diff.description.contains("Author"));
    }

    #[test]
    fn format_patch_signature_is_not_hunk_body() {
        let mail = "\
From 9fceb02d0ae598e95dc970b74767f19372d61af8 Mon Sep 17 00:00:00 2001
From: alice <alice@example.com>
Subject: [PATCH] fix typo

---
 a.txt | 2 +-
 1 file changed, 1 insertion(+), 1 deletion(-)

diff --git a/a.txt b/a.txt
index 1111111..2222222 100644
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-teh
+the
-- 
2.43.0

";
        let files = parse_unified_diff(mail);
        assert_eq!(files.len(), 1);
        assert!(files[0].is_clean(), "{:?}", files[0].issues);
        let hunk = &files[0].diff.hunks[0];
        assert_eq!(hunk.lines.len(), 2);
        assert_eq!(hunk.lines[1].text, "the");
    }

    #[test]
    fn log_patch_stream_splits_between_commits() {
        let log = "\
commit 2222222222222222222222222222222222222222
Author: bob <bob@example.com>
Date:   Tue Mar 5 10:00:00 2024 +0000

    second change

diff --git a/b.txt b/b.txt
--- a/b.txt
+++ b/b.txt
@@ -1 +1 @@
-old
+new

commit 1111111111111111111111111111111111111111
Author: alice <alice@example.com>
Date:   Mon Mar 4 09:00:00 2024 +0000

    first change
    - with a bullet

diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
 keep
-teh
+the
";
        let files = parse_unified_diff(log);
        assert_eq!(files.len(), 2);
        for file in &files {
            assert!(file.is_clean(), "{}: {:?}", file.diff, file.issues);
        }
        assert_eq!(files[0].diff.new_path, "b.txt");
        assert_eq!(files[0].diff.hunks[0].lines.len(), 2);
        assert!(!files[0].diff.description.contains("commit"));
        assert_eq!(files[1].diff.new_path, "a.txt");
        assert_eq!(files[1].diff.hunks[0].lines.len(), 3);
    }

    #[test]
    fn lines_past_a_complete_hunk_are_ignored() {
        let parsed = parse_file_diff(&[
            "--- a/f",
            "+++ b/f",
            "@@ -1 +1 @@",
            "-a",
            "+b",
            "\\ No newline at end of file",
            "-- ",
            "2.43.0",
        ]);
        assert!(parsed.is_clean(), "{:?}", parsed.issues);
        let hunk = &parsed.diff.hunks[0];
        assert_eq!(hunk.lines.len(), 2);
        assert_eq!(hunk.lines[1].markers, vec!["\\ No newline at end of file"]);
    }

    #[test]
    fn body_after_malformed_header_stays_in_section() {
        let diff = "\
diff --git a/f b/f
--- a/f
+++ b/f
@@ -x +1 @@
-dropped
+dropped
@@ -5 +5 @@
-old
+new
";
        let files = parse_unified_diff(diff);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].diff.hunks.len(), 1);
        assert_eq!(files[0].diff.hunks[0].begin_a, 5);
        assert!(matches!(
            files[0].issues.as_slice(),
            [DiffError::MalformedHunk { .. }]
        ));
    }

    #[test]
    fn command_line_paths_may_contain_b_slash() {
        let parsed = parse_file_diff(&[
            "diff --git a/x b/y.txt b/x b/y.txt",
            "new file mode 100644",
            "index 0000000..e69de29",
        ]);
        assert_eq!(parsed.diff.new_path, "x b/y.txt");
        assert_eq!(
            parse_diff_command("--git a/old.rs b/new.rs"),
            Some(("old.rs".to_string(), "new.rs".to_string()))
        );
    }

    #[test]
    fn parse_path_handles_quoted_paths() {
        assert_eq!(parse_path("\"a/src/my file.rs\""), "src/my file.rs");
        assert_eq!(parse_path("\"b/src/my file.rs\""), "src/my file.rs");
        assert_eq!(parse_path("/dev/null"), "/dev/null");
    }

    #[test]
    fn combined_headers_are_rejected() {
        let err = parse_hunk_header("@@@ -1,2 -1,2 +1,3 @@@").unwrap_err();
        assert!(err.contains("combined"));
    }

    #[test]
    fn hunk_header_requires_closing_marker() {
        assert!(parse_hunk_header("@@ -1,2 +1,2").is_err());
        assert!(parse_hunk_header("@@ -1,2 @@").is_err());
    }
}
