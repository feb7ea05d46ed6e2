//! Per-entity field accessors for the list controller.

use std::borrow::Cow;

use super::record::{Choice, Direction, Record, SortChoice, SortValue};
use super::stats::StatsBuilder;
use crate::types::{Comment, CommentRole, Issue, IssueState, Repository};

// Repositories

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoFilter {
    #[default]
    All,
}

impl Choice for RepoFilter {
    const ALL: &'static [Self] = &[RepoFilter::All];

    fn label(&self) -> &'static str {
        "All"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoSort {
    #[default]
    Added,
    Name,
    Stars,
    Issues,
    Updated,
}

impl Choice for RepoSort {
    const ALL: &'static [Self] = &[
        RepoSort::Added,
        RepoSort::Name,
        RepoSort::Stars,
        RepoSort::Issues,
        RepoSort::Updated,
    ];

    fn label(&self) -> &'static str {
        match self {
            RepoSort::Added => "Added",
            RepoSort::Name => "Name",
            RepoSort::Stars => "Stars",
            RepoSort::Issues => "Issues",
            RepoSort::Updated => "Updated",
        }
    }
}

impl SortChoice for RepoSort {
    fn direction(&self) -> Direction {
        match self {
            RepoSort::Name => Direction::Ascending,
            _ => Direction::Descending,
        }
    }
}

impl Record for Repository {
    type Filter = RepoFilter;
    type Sort = RepoSort;

    const NOUN: &'static str = "repositories";
    const GROUPS: &'static [(&'static str, usize)] = &[("language", 3)];

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.full_name.as_str()),
            Cow::Borrowed(self.description.as_deref().unwrap_or("")),
            Cow::Borrowed(self.language.as_deref().unwrap_or("")),
        ]
    }

    fn matches_filter(&self, filter: RepoFilter) -> bool {
        match filter {
            RepoFilter::All => true,
        }
    }

    fn sort_value(&self, key: RepoSort) -> SortValue {
        match key {
            RepoSort::Added => SortValue::date(self.added_at),
            RepoSort::Name => SortValue::text(&self.full_name),
            RepoSort::Stars => SortValue::Number(self.stars),
            RepoSort::Issues => SortValue::Number(self.open_issues),
            RepoSort::Updated => SortValue::date(self.updated_at),
        }
    }

    fn tally(&self, stats: &mut StatsBuilder) {
        stats.add("stars", self.stars);
        stats.add("issues", self.open_issues);
        stats.add("forks", self.forks);
        if let Some(language) = &self.language {
            stats.count("language", language);
        }
    }
}

// Issues

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl Choice for IssueFilter {
    const ALL: &'static [Self] = &[IssueFilter::All, IssueFilter::Open, IssueFilter::Closed];

    fn label(&self) -> &'static str {
        match self {
            IssueFilter::All => "All",
            IssueFilter::Open => "Open",
            IssueFilter::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueSort {
    #[default]
    Updated,
    Created,
    Comments,
    Title,
}

impl Choice for IssueSort {
    const ALL: &'static [Self] = &[
        IssueSort::Updated,
        IssueSort::Created,
        IssueSort::Comments,
        IssueSort::Title,
    ];

    fn label(&self) -> &'static str {
        match self {
            IssueSort::Updated => "Updated",
            IssueSort::Created => "Created",
            IssueSort::Comments => "Comments",
            IssueSort::Title => "Title",
        }
    }
}

impl SortChoice for IssueSort {
    fn direction(&self) -> Direction {
        match self {
            IssueSort::Title => Direction::Ascending,
            _ => Direction::Descending,
        }
    }
}

/// `label:"needs triage"` or `label:bug`
fn label_query(needle: &str) -> Option<&str> {
    let rest = needle.strip_prefix("label:")?;
    let rest = rest.trim();
    Some(
        rest.strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest),
    )
}

impl Record for Issue {
    type Filter = IssueFilter;
    type Sort = IssueSort;

    const NOUN: &'static str = "issues";
    const GROUPS: &'static [(&'static str, usize)] = &[("label", 5), ("author", 3)];

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.body.as_deref().unwrap_or("")),
            Cow::Borrowed(self.author.as_str()),
            Cow::Owned(self.labels.join(" ")),
        ]
    }

    fn matches_search(&self, needle: &str) -> bool {
        if let Some(label) = label_query(needle) {
            return self.labels.iter().any(|l| l.to_lowercase() == label);
        }
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    fn matches_filter(&self, filter: IssueFilter) -> bool {
        match filter {
            IssueFilter::All => true,
            IssueFilter::Open => self.state == IssueState::Open,
            IssueFilter::Closed => self.state == IssueState::Closed,
        }
    }

    fn sort_value(&self, key: IssueSort) -> SortValue {
        match key {
            IssueSort::Updated => SortValue::date(self.updated_at),
            IssueSort::Created => SortValue::date(self.created_at),
            IssueSort::Comments => SortValue::Number(self.comments),
            IssueSort::Title => SortValue::text(&self.title),
        }
    }

    fn tally(&self, stats: &mut StatsBuilder) {
        stats.add("comments", self.comments);
        for label in &self.labels {
            stats.count("label", label);
        }
        stats.count("author", &self.author);
    }
}

// Comments

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFilter {
    #[default]
    All,
    Author,
    Collaborators,
    WithCode,
}

impl Choice for CommentFilter {
    const ALL: &'static [Self] = &[
        CommentFilter::All,
        CommentFilter::Author,
        CommentFilter::Collaborators,
        CommentFilter::WithCode,
    ];

    fn label(&self) -> &'static str {
        match self {
            CommentFilter::All => "All",
            CommentFilter::Author => "Author",
            CommentFilter::Collaborators => "Collaborators",
            CommentFilter::WithCode => "With code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    Created,
    Author,
}

impl Choice for CommentSort {
    const ALL: &'static [Self] = &[CommentSort::Created, CommentSort::Author];

    fn label(&self) -> &'static str {
        match self {
            CommentSort::Created => "Created",
            CommentSort::Author => "Author",
        }
    }
}

impl SortChoice for CommentSort {
    /// Threads read oldest first.
    fn direction(&self) -> Direction {
        Direction::Ascending
    }
}

impl Record for Comment {
    type Filter = CommentFilter;
    type Sort = CommentSort;

    const NOUN: &'static str = "comments";
    const GROUPS: &'static [(&'static str, usize)] = &[("author", 3)];

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.author.as_str()),
            Cow::Borrowed(self.body.as_str()),
        ]
    }

    fn matches_filter(&self, filter: CommentFilter) -> bool {
        match filter {
            CommentFilter::All => true,
            CommentFilter::Author => self.role == CommentRole::Author,
            CommentFilter::Collaborators => self.role == CommentRole::Collaborator,
            CommentFilter::WithCode => self.has_code(),
        }
    }

    fn sort_value(&self, key: CommentSort) -> SortValue {
        match key {
            CommentSort::Created => SortValue::date(self.created_at),
            CommentSort::Author => SortValue::text(&self.author),
        }
    }

    fn tally(&self, stats: &mut StatsBuilder) {
        stats.add("words", self.words());
        stats.add("code blocks", self.code_blocks());
        stats.add("images", self.images());
        stats.count("author", &self.author);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_query_forms() {
        assert_eq!(label_query("label:\"needs triage\""), Some("needs triage"));
        assert_eq!(label_query("label:bug"), Some("bug"));
        assert_eq!(label_query("bug"), None);
    }

    #[test]
    fn choice_next_wraps() {
        assert_eq!(IssueFilter::Closed.next(), IssueFilter::All);
        assert_eq!(RepoSort::Added.next(), RepoSort::Name);
        assert_eq!(RepoFilter::All.next(), RepoFilter::All);
    }

    #[test]
    fn sort_directions() {
        assert_eq!(RepoSort::Name.direction(), Direction::Ascending);
        assert_eq!(RepoSort::Stars.direction(), Direction::Descending);
        assert_eq!(IssueSort::Title.direction(), Direction::Ascending);
        assert_eq!(IssueSort::Comments.direction(), Direction::Descending);
    }
}
