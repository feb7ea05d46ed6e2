use std::collections::HashMap;

use super::record::{Choice, Record};

/// Aggregates over a full record set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
    pub total: usize,
    /// Record count per filter category, in declaration order.
    pub categories: Vec<(&'static str, usize)>,
    /// Summed numeric fields, in first-reported order.
    pub totals: Vec<(&'static str, u64)>,
    pub groups: Vec<GroupSummary>,
}

#[cfg(test)]
impl Stats {
    pub fn category(&self, label: &str) -> Option<usize> {
        self.categories
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, n)| *n)
    }

    pub fn sum(&self, name: &str) -> Option<u64> {
        self.totals.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn group(&self, attribute: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.attribute == attribute)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub attribute: &'static str,
    pub distinct: usize,
    pub top: Vec<(String, usize)>,
}

impl GroupSummary {
    /// `rust (3), go (1)`
    pub fn describe(&self) -> String {
        self.top
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Occurrence counts that remember first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl GroupCounts {
    pub fn add(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match self.index.get(value) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(value.to_string(), self.entries.len());
                self.entries.push((value.to_string(), 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Highest counts first; the stable sort keeps first-seen order on ties.
    pub fn top(&self, k: usize) -> Vec<(String, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

/// Sink passed to [`Record::tally`].
#[derive(Debug, Default)]
pub struct StatsBuilder {
    totals: Vec<(&'static str, u64)>,
    groups: Vec<(&'static str, GroupCounts)>,
}

impl StatsBuilder {
    pub fn add(&mut self, name: &'static str, amount: u64) {
        match self.totals.iter_mut().find(|(n, _)| *n == name) {
            Some((_, sum)) => *sum += amount,
            None => self.totals.push((name, amount)),
        }
    }

    pub fn count(&mut self, attribute: &'static str, value: &str) {
        if let Some((_, counts)) = self.groups.iter_mut().find(|(a, _)| *a == attribute) {
            counts.add(value);
        }
    }
}

/// Pure function of the full record set; filters and searches are ignored.
pub fn compute_stats<R: Record>(records: &[R]) -> Stats {
    let mut builder = StatsBuilder {
        totals: Vec::new(),
        groups: R::GROUPS
            .iter()
            .map(|(attribute, _)| (*attribute, GroupCounts::default()))
            .collect(),
    };

    for record in records {
        record.tally(&mut builder);
    }

    let categories = R::Filter::ALL
        .iter()
        .map(|f| {
            let count = records.iter().filter(|r| r.matches_filter(*f)).count();
            (f.label(), count)
        })
        .collect();

    let groups = R::GROUPS
        .iter()
        .zip(builder.groups.iter())
        .map(|(&(attribute, k), (_, counts))| GroupSummary {
            attribute,
            distinct: counts.len(),
            top: counts.top(k),
        })
        .collect();

    Stats {
        total: records.len(),
        categories,
        totals: builder.totals,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_breaks_ties_by_first_seen() {
        let mut counts = GroupCounts::default();
        for v in ["go", "rust", "c", "rust", "go", "zig"] {
            counts.add(v);
        }
        assert_eq!(
            counts.top(3),
            vec![
                ("go".to_string(), 2),
                ("rust".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn blank_values_are_not_counted() {
        let mut counts = GroupCounts::default();
        counts.add("  ");
        counts.add("");
        assert_eq!(counts.len(), 0);
    }

    #[test]
    fn describe_formats_top_groups() {
        let group = GroupSummary {
            attribute: "language",
            distinct: 2,
            top: vec![("Rust".into(), 3), ("Go".into(), 1)],
        };
        assert_eq!(group.describe(), "Rust (3), Go (1)");
    }
}
