use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, Utc};

use super::stats::StatsBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Ascending => "↑",
            Direction::Descending => "↓",
        }
    }
}

/// A comparable key extracted from one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(u64),
    Date(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    /// Missing dates sort as the Unix epoch.
    pub fn date(value: Option<DateTime<Utc>>) -> Self {
        SortValue::Date(value.unwrap_or_default())
    }

    /// Case-folded so `alpha` and `Beta` interleave the way a reader expects.
    pub fn text(value: &str) -> Self {
        SortValue::Text(value.to_lowercase())
    }

    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A closed set of options the user cycles through (filters, sort keys).
pub trait Choice: Copy + Eq + Default + Debug + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

pub trait SortChoice: Choice {
    fn direction(&self) -> Direction;
}

/// Field-accessor configuration for one entity type.
///
/// The list controller only ever talks to records through this trait, so
/// repositories, issues, and comments share one implementation of search,
/// filter, sort, and stats.
pub trait Record {
    type Filter: Choice;
    type Sort: SortChoice;

    /// Plural noun used in result banners ("issues").
    const NOUN: &'static str;

    /// Group-by attributes reported in stats, with their top-K limit.
    const GROUPS: &'static [(&'static str, usize)];

    /// Fields searched, in order.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// `needle` is already trimmed, lowercased, and non-empty.
    fn matches_search(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    fn matches_filter(&self, filter: Self::Filter) -> bool;

    fn sort_value(&self, key: Self::Sort) -> SortValue;

    /// Contribute this record's numeric totals and group memberships.
    fn tally(&self, stats: &mut StatsBuilder);
}
