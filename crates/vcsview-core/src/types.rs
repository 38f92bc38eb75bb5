use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConstructionError;

/// Parent ids as supplied by a collaborator: either one space-separated
/// string (the raw `%P` log field) or an already-split list.
///
/// # Examples
///
/// ```
/// use vcsview_core::ParentIds;
///
/// let joined: ParentIds = serde_json::from_str("\"a1 b2\"").unwrap();
/// assert_eq!(joined.into_vec(), vec!["a1".to_string(), "b2".to_string()]);
///
/// let list: ParentIds = serde_json::from_str("[\"a1\"]").unwrap();
/// assert_eq!(list.into_vec(), vec!["a1".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentIds {
    /// Space-separated ids.
    Joined(String),
    /// Ordered list of ids.
    List(Vec<String>),
}

impl Default for ParentIds {
    fn default() -> Self {
        ParentIds::List(Vec::new())
    }
}

impl ParentIds {
    /// Normalize into an ordered list, dropping empty entries.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ParentIds::Joined(raw) => raw.split_whitespace().map(str::to_string).collect(),
            ParentIds::List(ids) => ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }
}

/// A raw commit record as produced by the VCS wrapper, before validation.
///
/// # Examples
///
/// ```
/// use vcsview_core::{CommitRecord, ParentIds};
///
/// let record = CommitRecord {
///     id: "c3".into(),
///     parent_ids: ParentIds::Joined("b2".into()),
///     author: "alice".into(),
///     email: None,
///     date: "2024-03-01T12:00:00+00:00".into(),
///     message: "fix: parser".into(),
/// };
/// assert_eq!(record.id, "c3");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Commit identifier (hash or revision).
    #[serde(default)]
    pub id: String,
    /// Parent identifiers, primary parent first.
    #[serde(default)]
    pub parent_ids: ParentIds,
    /// Contributor name.
    #[serde(default)]
    pub author: String,
    /// Contributor e-mail.
    #[serde(default)]
    pub email: Option<String>,
    /// Commit date in an ISO-like format or unix seconds.
    #[serde(default)]
    pub date: String,
    /// Full commit message.
    #[serde(default)]
    pub message: String,
}

/// A validated commit.
///
/// Fields are fixed at construction; [`Commit::with_graph_level`] returns a
/// new value rather than mutating in place.
///
/// # Examples
///
/// ```
/// use vcsview_core::{Commit, CommitRecord, ParentIds};
///
/// let commit = Commit::from_record(CommitRecord {
///     id: "9fceb02d0ae598e95dc970b74767f19372d61af8".into(),
///     parent_ids: ParentIds::Joined("a1 b2".into()),
///     author: "alice".into(),
///     date: "2024-03-01 12:00:00 +0100".into(),
///     message: "Merge branch 'feature'\n\nDetails".into(),
///     ..CommitRecord::default()
/// })
/// .unwrap();
/// assert!(commit.is_merge());
/// assert_eq!(commit.short_id(), "9fceb02");
/// assert_eq!(commit.subject(), "Merge branch 'feature'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    id: String,
    parent_ids: Vec<String>,
    author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    date: DateTime<FixedOffset>,
    message: String,
    graph_level: Option<usize>,
}

impl Commit {
    /// Validate a raw record and build a commit.
    ///
    /// Validation is atomic: either every required field is valid and a
    /// commit is returned, or nothing is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] when the id or author is blank, or the
    /// date is missing or unparsable.
    pub fn from_record(record: CommitRecord) -> Result<Self, ConstructionError> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(ConstructionError::MissingId);
        }
        let author = record.author.trim().to_string();
        if author.is_empty() {
            return Err(ConstructionError::MissingAuthor);
        }
        let date = parse_date(&record.date)?;

        Ok(Self {
            id,
            parent_ids: record.parent_ids.into_vec(),
            author,
            email: record.email.filter(|e| !e.trim().is_empty()),
            date,
            message: record.message,
            graph_level: None,
        })
    }

    /// Commit identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// First seven characters of the id.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(7) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }

    /// Parent ids in order; index 0 is the primary parent.
    pub fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }

    /// Primary parent id, if any.
    pub fn primary_parent(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }

    /// `true` when the commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }

    /// Contributor name.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Contributor e-mail, when known.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Commit date with its original offset.
    pub fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    /// Full commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Lane assigned by the graph builder, `None` until the commit has been laid out.
    pub fn graph_level(&self) -> Option<usize> {
        self.graph_level
    }

    /// Return a copy of this commit placed on lane `level`.
    pub fn with_graph_level(mut self, level: usize) -> Self {
        self.graph_level = Some(level);
        self
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.short_id(), self.subject())
    }
}

/// Parse a commit date.
///
/// Accepts RFC 3339, git's ISO format (`2024-03-01 12:00:00 +0100`),
/// hg's `isodate` format (`2024-03-01 12:00 +0100`), RFC 2822, and unix seconds.
///
/// # Errors
///
/// Returns [`ConstructionError::MissingDate`] for blank input and
/// [`ConstructionError::InvalidDate`] when no format matches.
///
/// # Examples
///
/// ```
/// use vcsview_core::parse_date;
///
/// let d = parse_date("1700000000").unwrap();
/// assert_eq!(d.timestamp(), 1_700_000_000);
/// assert!(parse_date("yesterday").is_err());
/// ```
pub fn parse_date(raw: &str) -> Result<DateTime<FixedOffset>, ConstructionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConstructionError::MissingDate);
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"] {
        if let Ok(date) = DateTime::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Ok(date);
    }
    if let Ok(seconds) = raw.parse::<i64>() {
        if let Some(date) = DateTime::<Utc>::from_timestamp(seconds, 0) {
            return Ok(date.fixed_offset());
        }
    }

    Err(ConstructionError::InvalidDate(raw.to_string()))
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use vcsview_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, parents: &str) -> CommitRecord {
        CommitRecord {
            id: id.into(),
            parent_ids: ParentIds::Joined(parents.into()),
            author: "alice".into(),
            email: Some("alice@example.com".into()),
            date: "2024-03-01T12:00:00+02:00".into(),
            message: "subject line\n\nbody".into(),
        }
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn parent_ids_split_on_whitespace() {
        assert_eq!(
            ParentIds::Joined("a  b\tc".into()).into_vec(),
            vec!["a", "b", "c"]
        );
        assert!(ParentIds::Joined(String::new()).into_vec().is_empty());
        assert_eq!(
            ParentIds::List(vec!["a".into(), " ".into(), "b".into()]).into_vec(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn valid_record_builds_commit() {
        let commit = Commit::from_record(record("c3", "b2")).unwrap();
        assert_eq!(commit.id(), "c3");
        assert_eq!(commit.parent_ids(), ["b2".to_string()]);
        assert_eq!(commit.primary_parent(), Some("b2"));
        assert_eq!(commit.subject(), "subject line");
        assert_eq!(commit.email(), Some("alice@example.com"));
        assert_eq!(commit.graph_level(), None);
        assert!(!commit.is_merge());
    }

    #[test]
    fn blank_id_is_rejected() {
        let err = Commit::from_record(record("  ", "")).unwrap_err();
        assert_eq!(err, ConstructionError::MissingId);
    }

    #[test]
    fn missing_author_is_rejected() {
        let mut r = record("c3", "");
        r.author = String::new();
        assert_eq!(
            Commit::from_record(r).unwrap_err(),
            ConstructionError::MissingAuthor
        );
    }

    #[test]
    fn bad_date_is_rejected() {
        let mut r = record("c3", "");
        r.date = "last tuesday".into();
        assert_eq!(
            Commit::from_record(r).unwrap_err(),
            ConstructionError::InvalidDate("last tuesday".into())
        );

        let mut r = record("c3", "");
        r.date = " ".into();
        assert_eq!(
            Commit::from_record(r).unwrap_err(),
            ConstructionError::MissingDate
        );
    }

    #[test]
    fn parse_date_accepts_git_and_hg_iso() {
        let git = parse_date("2024-03-01 12:00:00 +0100").unwrap();
        let hg = parse_date("2024-03-01 12:00 +0100").unwrap();
        assert_eq!(git, hg);
        assert_eq!(git.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn parse_date_accepts_rfc2822() {
        let d = parse_date("Fri, 01 Mar 2024 12:00:00 +0000").unwrap();
        assert_eq!(d, parse_date("2024-03-01T12:00:00Z").unwrap());
    }

    #[test]
    fn with_graph_level_sets_lane() {
        let commit = Commit::from_record(record("c3", "")).unwrap().with_graph_level(2);
        assert_eq!(commit.graph_level(), Some(2));
    }

    #[test]
    fn short_id_handles_short_ids() {
        let commit = Commit::from_record(record("42", "")).unwrap();
        assert_eq!(commit.short_id(), "42");
    }

    #[test]
    fn commit_serializes_camel_case() {
        let commit = Commit::from_record(record("c3", "b2 b3")).unwrap();
        let json = serde_json::to_value(&commit).unwrap();
        assert!(json.get("parentIds").is_some());
        assert!(json.get("graphLevel").is_some());
        assert!(json.get("parent_ids").is_none());
    }

    #[test]
    fn commit_record_deserializes_list_parents() {
        let json = r#"{"id":"c","parentIds":["a","b"],"author":"bob","date":"1700000000"}"#;
        let record: CommitRecord = serde_json::from_str(json).unwrap();
        let commit = Commit::from_record(record).unwrap();
        assert!(commit.is_merge());
        assert_eq!(commit.message(), "");
    }
}
