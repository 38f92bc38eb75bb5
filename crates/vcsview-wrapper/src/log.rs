//! Log output parsing.
//!
//! History is requested with a template that separates fields with ASCII
//! unit separators (`0x1f`) and records with record separators (`0x1e`),
//! so multi-line messages survive line-based reading.

use vcsview_core::{CommitRecord, ParentIds};

use crate::command::VcsKind;

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// `git log --pretty=format:` template: id, parents, author, email, date, body.
pub const GIT_LOG_FORMAT: &str = "%H%x1f%P%x1f%an%x1f%ae%x1f%aI%x1f%B%x1e";

/// `hg log --template` equivalent of [`GIT_LOG_FORMAT`].
pub const HG_LOG_TEMPLATE: &str =
    "{node}\\x1f{p1node} {p2node}\\x1f{author|person}\\x1f{author|email}\\x1f{date|isodatesec}\\x1f{desc}\\x1e";

/// Log template for a tool.
pub fn log_format(kind: VcsKind) -> &'static str {
    match kind {
        VcsKind::Git => GIT_LOG_FORMAT,
        VcsKind::Mercurial => HG_LOG_TEMPLATE,
    }
}

/// Turn templated log output into raw commit records.
///
/// Fields that are missing come back empty; validation happens when the
/// records are turned into commits. All-zero parent ids (hg's null
/// revision) are dropped.
///
/// # Examples
///
/// ```
/// use vcsview_wrapper::log::parse_log_records;
///
/// let lines = vec![
///     "b2\u{1f}a1\u{1f}alice\u{1f}alice@example.com\u{1f}2024-03-01T12:00:00+01:00\u{1f}Fix parser".to_string(),
///     "".to_string(),
///     "Details\u{1e}".to_string(),
/// ];
/// let records = parse_log_records(&lines);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].message, "Fix parser\n\nDetails");
/// ```
pub fn parse_log_records<S: AsRef<str>>(lines: &[S]) -> Vec<CommitRecord> {
    let text = lines
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<&str>>()
        .join("\n");

    text.split(RECORD_SEP)
        .map(|chunk| chunk.trim_start_matches(['\n', '\r']))
        .filter(|chunk| !chunk.trim().is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(chunk: &str) -> CommitRecord {
    let mut fields = chunk.splitn(6, FIELD_SEP);
    let mut next = || fields.next().unwrap_or_default();

    let id = next().trim().to_string();
    let parents: Vec<String> = next()
        .split_whitespace()
        .filter(|p| !p.chars().all(|c| c == '0'))
        .map(str::to_string)
        .collect();
    let author = next().trim().to_string();
    let email = Some(next().trim().to_string()).filter(|e| !e.is_empty());
    let date = next().trim().to_string();
    let message = next().trim_end().to_string();

    CommitRecord {
        id,
        parent_ids: ParentIds::List(parents),
        author,
        email,
        date,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcsview_core::Commit;

    fn line(fields: &[&str]) -> String {
        fields.join("\u{1f}")
    }

    #[test]
    fn parses_multiple_records_with_multiline_messages() {
        let lines = vec![
            line(&["c3", "b2 x9", "alice", "a@example.com", "2024-03-02T10:00:00Z", "Merge x"]),
            "".into(),
            "Long body\u{1e}".into(),
            line(&["b2", "a1", "bob", "", "2024-03-01T10:00:00Z", "Second\u{1e}"]),
            line(&["a1", "", "carol", "c@example.com", "2024-02-28T10:00:00Z", "Root\u{1e}"]),
        ];
        let records = parse_log_records(&lines);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, "c3");
        assert_eq!(
            records[0].parent_ids,
            ParentIds::List(vec!["b2".into(), "x9".into()])
        );
        assert_eq!(records[0].message, "Merge x\n\nLong body");
        assert_eq!(records[1].email, None);
        assert_eq!(records[2].parent_ids, ParentIds::List(Vec::new()));
    }

    #[test]
    fn hg_null_parents_are_dropped() {
        let null = "0".repeat(40);
        let lines = vec![format!(
            "{}\u{1f}{} {}\u{1f}dana\u{1f}d@example.com\u{1f}2024-03-01 12:00:00 +0100\u{1f}Init\u{1e}",
            "f".repeat(40),
            null,
            null
        )];
        let records = parse_log_records(&lines);
        assert_eq!(records[0].parent_ids, ParentIds::List(Vec::new()));

        let commit = Commit::from_record(records[0].clone()).unwrap();
        assert_eq!(commit.subject(), "Init");
    }

    #[test]
    fn truncated_record_fails_validation_later() {
        let records = parse_log_records(&["deadbeef\u{1f}\u{1e}"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "deadbeef");
        assert!(Commit::from_record(records[0].clone()).is_err());
    }

    #[test]
    fn empty_output_has_no_records() {
        assert!(parse_log_records::<&str>(&[]).is_empty());
        assert!(parse_log_records(&["", "\u{1e}"]).is_empty());
    }

    #[test]
    fn format_per_kind() {
        assert!(log_format(VcsKind::Git).starts_with("%H"));
        assert!(log_format(VcsKind::Mercurial).starts_with("{node}"));
    }
}
