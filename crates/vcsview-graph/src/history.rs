//! Validated commit windows built from raw collaborator records.

use std::collections::HashSet;

use serde::Serialize;
use vcsview_core::{Commit, CommitRecord, ConstructionError};

/// A record that could not become a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecord {
    /// Position of the record in the input.
    pub index: usize,
    /// The raw id, possibly empty.
    pub id: String,
    /// Why it was rejected.
    pub error: ConstructionError,
}

/// Commits in input order plus the records that were skipped.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    /// Valid commits, newest first.
    pub commits: Vec<Commit>,
    /// Skipped records.
    pub rejected: Vec<RejectedRecord>,
}

/// Validate each record, skipping invalid ones and repeated ids.
///
/// A rejected record never stops construction of the remaining window.
///
/// # Examples
///
/// ```
/// use vcsview_core::{CommitRecord, ParentIds};
/// use vcsview_graph::history::build_history;
///
/// let record = |id: &str, author: &str| CommitRecord {
///     id: id.into(),
///     parent_ids: ParentIds::default(),
///     author: author.into(),
///     email: None,
///     date: "1700000000".into(),
///     message: String::new(),
/// };
/// let history = build_history(vec![record("b", "bob"), record("a", "")]);
/// assert_eq!(history.commits.len(), 1);
/// assert_eq!(history.rejected[0].index, 1);
/// ```
pub fn build_history(records: Vec<CommitRecord>) -> History {
    let mut history = History::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let raw_id = record.id.clone();
        let result = Commit::from_record(record).and_then(|commit| {
            if seen.insert(commit.id().to_string()) {
                Ok(commit)
            } else {
                Err(ConstructionError::DuplicateId(commit.id().to_string()))
            }
        });

        match result {
            Ok(commit) => history.commits.push(commit),
            Err(error) => history.rejected.push(RejectedRecord {
                index,
                id: raw_id,
                error,
            }),
        }
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcsview_core::ParentIds;

    fn record(id: &str, parents: &str) -> CommitRecord {
        CommitRecord {
            id: id.into(),
            parent_ids: ParentIds::Joined(parents.into()),
            author: "alice".into(),
            email: None,
            date: "2024-03-01T12:00:00Z".into(),
            message: format!("commit {id}"),
        }
    }

    #[test]
    fn valid_records_keep_order() {
        let history = build_history(vec![record("c", "b"), record("b", "a"), record("a", "")]);
        let ids: Vec<&str> = history.commits.iter().map(Commit::id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert!(history.rejected.is_empty());
    }

    #[test]
    fn invalid_record_is_skipped_and_reported() {
        let mut bad = record("b", "a");
        bad.date = "not a date".into();
        let history = build_history(vec![record("c", "b"), bad, record("a", "")]);

        assert_eq!(history.commits.len(), 2);
        assert_eq!(
            history.rejected,
            vec![RejectedRecord {
                index: 1,
                id: "b".into(),
                error: ConstructionError::InvalidDate("not a date".into()),
            }]
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let history = build_history(vec![record("a", ""), record("a", "")]);
        assert_eq!(history.commits.len(), 1);
        assert_eq!(
            history.rejected[0].error,
            ConstructionError::DuplicateId("a".into())
        );
    }

    #[test]
    fn rejected_record_serializes_error_kind() {
        let history = build_history(vec![record("", "")]);
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["rejected"][0]["error"]["kind"], "missingId");
    }
}
