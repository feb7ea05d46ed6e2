use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository tracked by the HubNote backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub added_at: Option<DateTime<Utc>>,
    pub added_by: Option<String>,
}

/// Mirrored GitHub issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    pub author: String,
    pub labels: Vec<String>,
    pub comments: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn from_api_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => f.pad("Open"),
            IssueState::Closed => f.pad("Closed"),
        }
    }
}

/// Comment on an issue thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub role: CommentRole,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Fenced blocks or inline code spans both count.
    pub fn has_code(&self) -> bool {
        self.body.contains('`')
    }

    pub fn code_blocks(&self) -> u64 {
        (self.body.matches("```").count() / 2) as u64
    }

    pub fn images(&self) -> u64 {
        self.body.matches("![").count() as u64
    }

    pub fn words(&self) -> u64 {
        self.body.split_whitespace().count() as u64
    }
}

/// Relationship of a comment's author to the issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentRole {
    Author,
    Collaborator,
    Other,
}

impl CommentRole {
    /// `issue_author` wins over the association GitHub reports.
    pub fn classify(login: &str, issue_author: &str, association: Option<&str>) -> Self {
        if !issue_author.is_empty() && login.eq_ignore_ascii_case(issue_author) {
            return CommentRole::Author;
        }
        match association {
            Some("OWNER") | Some("MEMBER") | Some("COLLABORATOR") => CommentRole::Collaborator,
            _ => CommentRole::Other,
        }
    }
}

impl fmt::Display for CommentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentRole::Author => write!(f, "author"),
            CommentRole::Collaborator => write!(f, "collab"),
            CommentRole::Other => write!(f, ""),
        }
    }
}

/// Entry of the export modal's repository picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRepo {
    pub full_name: String,
    #[serde(default)]
    pub open_issues: u64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ExportFormat::Json => ExportFormat::Csv,
            ExportFormat::Csv => ExportFormat::Json,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: Option<u64>,
}

/// Split `owner/repo` into its two segments.
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

/// Parse the timestamps the backend emits: RFC 3339 from GitHub, and naive
/// ISO 8601 (treated as UTC) for locally recorded fields like `added_at`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_timestamp_rfc3339() {
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00+00:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-03-01T10:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_timestamp_naive_is_utc() {
        let parsed = parse_timestamp("2024-03-01T10:00:00.123456").unwrap();
        assert_eq!(parsed.timestamp(), 1_709_287_200);
    }

    #[test]
    fn parse_timestamp_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn split_full_name_variants() {
        assert_eq!(split_full_name("rust-lang/rust"), Some(("rust-lang", "rust")));
        assert_eq!(split_full_name("rust"), None);
        assert_eq!(split_full_name("a/b/c"), None);
        assert_eq!(split_full_name("/b"), None);
    }

    #[test]
    fn comment_role_prefers_issue_author() {
        assert_eq!(
            CommentRole::classify("Alice", "alice", Some("MEMBER")),
            CommentRole::Author
        );
        assert_eq!(
            CommentRole::classify("bob", "alice", Some("COLLABORATOR")),
            CommentRole::Collaborator
        );
        assert_eq!(
            CommentRole::classify("bob", "alice", Some("NONE")),
            CommentRole::Other
        );
        assert_eq!(CommentRole::classify("bob", "alice", None), CommentRole::Other);
    }

    #[test]
    fn comment_body_metrics() {
        let comment = Comment {
            id: 1,
            author: "a".into(),
            body: "see ```rust\nfn x() {}\n``` and ![img](u.png)".into(),
            role: CommentRole::Other,
            created_at: None,
            updated_at: None,
        };
        assert!(comment.has_code());
        assert_eq!(comment.code_blocks(), 1);
        assert_eq!(comment.images(), 1);
        assert_eq!(comment.words(), 8);
    }
}
