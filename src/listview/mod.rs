//! Generic list view controller: search, filter, sort, stats, and a
//! result-count banner over an in-memory record set.

pub mod debounce;
mod record;
mod records;
mod stats;

pub use record::{Choice, Direction, Record, SortChoice, SortValue};
pub use records::{CommentFilter, CommentSort, IssueFilter, IssueSort, RepoFilter, RepoSort};
pub use stats::{compute_stats, Stats};

/// Where the view's records come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

/// Result-count line shown above the list. Owned by the view and reused
/// across recomputes; hidden when neither a search nor a filter is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Banner {
    text: String,
    shown: bool,
}

impl Banner {
    pub fn text(&self) -> Option<&str> {
        self.shown.then_some(self.text.as_str())
    }
}

pub struct ListView<R: Record> {
    records: Vec<R>,
    /// Indices into `records` that pass search and filter, in display order.
    visible: Vec<usize>,
    search_term: String,
    filter: R::Filter,
    sort: R::Sort,
    direction: Direction,
    banner: Banner,
    /// Position within `visible`.
    cursor: usize,
    pub state: LoadState,
}

impl<R: Record> Default for ListView<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> ListView<R> {
    pub fn new() -> Self {
        let sort = R::Sort::default();
        Self {
            records: Vec::new(),
            visible: Vec::new(),
            search_term: String::new(),
            filter: R::Filter::default(),
            sort,
            direction: sort.direction(),
            banner: Banner::default(),
            cursor: 0,
            state: LoadState::Idle,
        }
    }

    /// Swap in a freshly fetched record set, keeping search, filter, and sort.
    pub fn replace(&mut self, records: Vec<R>) {
        self.records = records;
        self.cursor = 0;
        self.state = LoadState::Loaded;
        self.apply_sort();
        self.recompute();
    }

    /// Add the next page of results.
    pub fn append(&mut self, records: Vec<R>) {
        let selected = self.selected_index();
        self.records.extend(records);
        self.apply_sort();
        self.recompute();
        self.restore_cursor(selected);
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.visible.clear();
        self.cursor = 0;
        self.state = LoadState::Idle;
        self.recompute();
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn visible(&self) -> impl Iterator<Item = &R> + '_ {
        self.visible.iter().map(move |&i| &self.records[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn search(&mut self, term: &str) {
        let selected = self.selected_index();
        self.search_term = term.trim().to_string();
        self.recompute();
        self.restore_cursor(selected);
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter(&mut self, filter: R::Filter) {
        let selected = self.selected_index();
        self.filter = filter;
        self.recompute();
        self.restore_cursor(selected);
    }

    pub fn active_filter(&self) -> R::Filter {
        self.filter
    }

    /// Sort every record, hidden ones included, in the key's natural direction.
    pub fn sort(&mut self, key: R::Sort) {
        self.sort = key;
        self.direction = key.direction();
        self.resort();
    }

    /// Flip the direction of the active sort key.
    pub fn reverse(&mut self) {
        self.direction = self.direction.flip();
        self.resort();
    }

    pub fn active_sort(&self) -> (R::Sort, Direction) {
        (self.sort, self.direction)
    }

    pub fn stats(&self) -> Stats {
        compute_stats(&self.records)
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.text()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&R> {
        self.visible.get(self.cursor).map(|&i| &self.records[i])
    }

    pub fn select_next(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.cursor = self.visible.len().saturating_sub(1);
    }

    pub fn page_down(&mut self, rows: usize) {
        self.cursor = (self.cursor + rows).min(self.visible.len().saturating_sub(1));
    }

    pub fn page_up(&mut self, rows: usize) {
        self.cursor = self.cursor.saturating_sub(rows);
    }

    /// Drop every record matching `pred`. Returns how many were removed.
    pub fn remove_where(&mut self, pred: impl Fn(&R) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !pred(r));
        let removed = before - self.records.len();
        if removed > 0 {
            self.recompute();
            self.clamp_cursor();
        }
        removed
    }

    /// Apply `f` to the first record matching `pred`.
    pub fn update_where(&mut self, pred: impl Fn(&R) -> bool, f: impl FnOnce(&mut R)) -> bool {
        match self.records.iter_mut().find(|r| pred(r)) {
            Some(record) => {
                f(record);
                self.recompute();
                self.clamp_cursor();
                true
            }
            None => false,
        }
    }

    fn resort(&mut self) {
        let selected = self.selected_index();
        let order = self.apply_sort();
        self.recompute();
        let moved = selected.and_then(|old| order.iter().position(|&o| o == old));
        self.restore_cursor(moved);
    }

    /// Stable sort of `records`; returns the permutation (new position ->
    /// old index) so callers can follow the selected record.
    fn apply_sort(&mut self) -> Vec<usize> {
        let key = self.sort;
        let direction = self.direction;
        let keys: Vec<SortValue> = self.records.iter().map(|r| r.sort_value(key)).collect();

        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by(|&a, &b| match direction {
            Direction::Ascending => keys[a].compare(&keys[b]),
            Direction::Descending => keys[b].compare(&keys[a]),
        });

        let mut slots: Vec<Option<R>> = std::mem::take(&mut self.records)
            .into_iter()
            .map(Some)
            .collect();
        self.records = order.iter().filter_map(|&i| slots[i].take()).collect();
        order
    }

    fn recompute(&mut self) {
        let needle = self.search_term.to_lowercase();
        let filter = self.filter;
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| needle.is_empty() || r.matches_search(&needle))
            .filter(|(_, r)| r.matches_filter(filter))
            .map(|(i, _)| i)
            .collect();
        self.update_banner();
        tracing::debug!(
            noun = R::NOUN,
            visible = self.visible.len(),
            total = self.records.len(),
            "list view recomputed"
        );
    }

    fn update_banner(&mut self) {
        self.banner.text.clear();
        if !self.search_term.is_empty() {
            self.banner.text = format!(
                "Found {} matching {} (of {})",
                self.visible.len(),
                R::NOUN,
                self.records.len()
            );
            self.banner.shown = true;
        } else if self.filter != R::Filter::default() {
            self.banner.text = format!(
                "Showing {} {} ({})",
                self.visible.len(),
                R::NOUN,
                self.filter.label()
            );
            self.banner.shown = true;
        } else {
            self.banner.shown = false;
        }
    }

    fn selected_index(&self) -> Option<usize> {
        self.visible.get(self.cursor).copied()
    }

    /// Keep the cursor on the same record if it is still visible.
    fn restore_cursor(&mut self, record_index: Option<usize>) {
        match record_index.and_then(|ri| self.visible.iter().position(|&v| v == ri)) {
            Some(pos) => self.cursor = pos,
            None => self.clamp_cursor(),
        }
    }

    fn clamp_cursor(&mut self) {
        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }
}
