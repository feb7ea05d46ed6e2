use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::{Action, ConfirmAction, EditorContext, Screen};
use crate::backend::{github_url, Backend, Link};
use crate::config::Config;
use crate::editor;
use crate::error::Result;
use crate::export;
use crate::listview::debounce::Debouncer;
use crate::listview::{Choice, ListView, LoadState, Record};
use crate::toast::Toasts;
use crate::tui::Event;
use crate::types::{split_full_name, Comment, ExportFormat, ExportRepo, Issue, Repository};
use crate::validate;

const PAGE_ROWS: usize = 10;

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    AddRepo,
}

/// State of the export dialog
#[derive(Debug, Clone, Default)]
pub struct ExportModal {
    pub repos: Vec<ExportRepo>,
    pub selected: usize,
    pub format: ExportFormat,
    pub loading: bool,
}

impl ExportModal {
    pub fn selected_repo(&self) -> Option<&ExportRepo> {
        self.repos.get(self.selected)
    }
}

#[derive(Debug, Clone)]
pub enum Popup {
    Confirm(ConfirmAction),
    Export(ExportModal),
}

/// Latest request id per list; older results are dropped on arrival.
#[derive(Debug, Default)]
struct LoadIds {
    repos: u64,
    issues: u64,
    comments: u64,
}

pub struct App {
    pub screen: Screen,
    pub repos: ListView<Repository>,
    pub issues: ListView<Issue>,
    pub comments: ListView<Comment>,

    /// `owner/name` of the repository whose issues are shown
    pub current_repo: Option<String>,
    /// Issue whose comments are shown
    pub current_issue: Option<Issue>,
    pub issue_page: u32,
    /// Open issues on the server; the list itself also holds closed ones
    pub open_issue_count: Option<u64>,
    /// Set once a page comes back empty
    pub issues_exhausted: bool,

    pub input_mode: InputMode,
    pub search_input: String,
    pub add_repo_input: String,
    pub popup: Option<Popup>,
    pub show_stats: bool,
    pub toasts: Toasts,
    pub should_quit: bool,

    export_dir: PathBuf,
    load_ids: LoadIds,
    search_debounce: Debouncer<Action>,
    backend: Arc<dyn Backend>,
    action_tx: mpsc::UnboundedSender<Action>,
}

fn cycle_filter<R: Record>(list: &mut ListView<R>) {
    list.filter(list.active_filter().next());
}

fn cycle_sort<R: Record>(list: &mut ListView<R>) {
    list.sort(list.active_sort().0.next());
}

fn scroll<R: Record>(list: &mut ListView<R>, action: &Action) {
    match action {
        Action::ScrollUp => list.select_prev(),
        Action::ScrollDown => list.select_next(),
        Action::PageUp => list.page_up(PAGE_ROWS),
        Action::PageDown => list.page_down(PAGE_ROWS),
        Action::GoToTop => list.select_first(),
        Action::GoToBottom => list.select_last(),
        _ => {}
    }
}

impl App {
    pub fn new(
        backend: Arc<dyn Backend>,
        action_tx: mpsc::UnboundedSender<Action>,
        config: &Config,
    ) -> Self {
        Self {
            screen: Screen::Repos,
            repos: ListView::new(),
            issues: ListView::new(),
            comments: ListView::new(),
            current_repo: None,
            current_issue: None,
            issue_page: 1,
            open_issue_count: None,
            issues_exhausted: false,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            add_repo_input: String::new(),
            popup: None,
            show_stats: false,
            toasts: Toasts::new(config.ui.toast_lifetime()),
            should_quit: false,
            export_dir: config
                .ui
                .export_dir
                .clone()
                .unwrap_or_else(export::default_dir),
            load_ids: LoadIds::default(),
            search_debounce: Debouncer::new(config.ui.search_debounce(), action_tx.clone()),
            backend,
            action_tx,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Start on a repository's issues instead of the repository list.
    pub fn open_repo(&mut self, full_name: String) {
        self.current_repo = Some(full_name);
        self.current_issue = None;
        self.screen = Screen::Issues;
        self.issues.clear();
        self.spawn_load_issues(1);
    }

    pub fn is_loading(&self) -> bool {
        let state = match self.screen {
            Screen::Repos => &self.repos.state,
            Screen::Issues => &self.issues.state,
            Screen::Comments => &self.comments.state,
        };
        *state == LoadState::Loading
    }

    /// Banner of the list on screen
    pub fn banner(&self) -> Option<&str> {
        match self.screen {
            Screen::Repos => self.repos.banner(),
            Screen::Issues => self.issues.banner(),
            Screen::Comments => self.comments.banner(),
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Refresh,
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match self.popup {
            Some(Popup::Confirm(_)) => return Self::handle_confirm_key(key),
            Some(Popup::Export(_)) => return Self::handle_export_key(key),
            None => {}
        }

        match self.input_mode {
            InputMode::Search => match key.code {
                KeyCode::Esc => Action::ExitSearchMode,
                KeyCode::Enter => Action::SearchConfirm,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            },
            InputMode::AddRepo => match key.code {
                KeyCode::Esc => Action::CancelAddRepo,
                KeyCode::Enter => Action::SubmitAddRepo,
                KeyCode::Backspace => Action::AddRepoBackspace,
                KeyCode::Char(c) => Action::AddRepoInput(c),
                _ => Action::None,
            },
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_confirm_key(key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Action::ConfirmYes,
            KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => Action::ConfirmNo,
            _ => Action::None,
        }
    }

    fn handle_export_key(key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Action::PopupDown,
            KeyCode::Char('k') | KeyCode::Up => Action::PopupUp,
            KeyCode::Tab | KeyCode::Char('f') => Action::ToggleExportFormat,
            KeyCode::Enter => Action::PopupSelect,
            KeyCode::Esc | KeyCode::Char('q') => Action::CloseExport,
            _ => Action::None,
        }
    }

    fn handle_normal_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('d') => Action::PageDown,
                KeyCode::Char('u') => Action::PageUp,
                _ => Action::None,
            };
        }

        let common = match key.code {
            KeyCode::Char('q') => Some(Action::Back),
            KeyCode::Esc => Some(if self.banner().is_some() {
                Action::ClearSearch
            } else {
                Action::Back
            }),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Action::GoToBottom),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Char('/') => Some(Action::EnterSearchMode),
            KeyCode::Char('f') => Some(Action::CycleFilter),
            KeyCode::Char('s') => Some(Action::CycleSort),
            KeyCode::Char('S') => Some(Action::ReverseSort),
            KeyCode::Char('t') => Some(Action::ToggleStats),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('o') => Some(Action::OpenInBrowser),
            KeyCode::Char('y') => Some(Action::YankUrl),
            KeyCode::Char('x') => Some(Action::ShowExport),
            _ => None,
        };
        if let Some(action) = common {
            return action;
        }

        match (self.screen, key.code) {
            (Screen::Repos, KeyCode::Char('a')) => Action::ShowAddRepo,
            (Screen::Repos, KeyCode::Char('d')) => match self.repos.selected() {
                Some(repo) => Action::ShowConfirm(ConfirmAction::RemoveRepo(repo.full_name.clone())),
                None => Action::None,
            },
            (Screen::Issues, KeyCode::Char('e')) => Action::EditIssue,
            (Screen::Issues, KeyCode::Char('n')) => Action::LoadNextPage,
            (Screen::Issues | Screen::Comments, KeyCode::Char('c')) => Action::NewComment,
            (Screen::Comments, KeyCode::Char('e')) => Action::EditComment,
            (Screen::Comments, KeyCode::Char('>')) => Action::QuoteComment,
            (Screen::Comments, KeyCode::Char('d')) => Action::DeleteComment,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::Back => self.back(),
            Action::Tick => {
                self.toasts.prune(Instant::now());
            }
            Action::ScrollUp
            | Action::ScrollDown
            | Action::PageUp
            | Action::PageDown
            | Action::GoToTop
            | Action::GoToBottom => match self.screen {
                Screen::Repos => scroll(&mut self.repos, &action),
                Screen::Issues => scroll(&mut self.issues, &action),
                Screen::Comments => scroll(&mut self.comments, &action),
            },
            Action::Select => self.select(),

            // Loading
            Action::Refresh => match self.screen {
                Screen::Repos => self.spawn_load_repos(),
                Screen::Issues => self.spawn_load_issues(1),
                Screen::Comments => self.spawn_load_comments(),
            },
            Action::LoadNextPage => {
                if self.screen == Screen::Issues && self.issues.state == LoadState::Loaded {
                    if self.issues_exhausted {
                        self.toasts.info("No more issues");
                    } else {
                        self.spawn_load_issues(self.issue_page + 1);
                    }
                }
            }
            Action::ReposLoaded(repos, load_id) => {
                if load_id == self.load_ids.repos {
                    self.repos.replace(repos);
                } else {
                    tracing::debug!(load_id, "dropping stale repository load");
                }
            }
            Action::IssuesLoaded(page, load_id) => {
                if load_id == self.load_ids.issues {
                    self.issue_page = 1;
                    self.open_issue_count = page.total_count;
                    self.issues_exhausted = page.items.is_empty();
                    self.issues.replace(page.items);
                } else {
                    tracing::debug!(load_id, "dropping stale issue load");
                }
            }
            Action::IssuesAppended(page, load_id) => {
                if load_id == self.load_ids.issues {
                    if page.items.is_empty() {
                        self.issues_exhausted = true;
                        self.issues.state = LoadState::Loaded;
                        self.toasts.info("No more issues");
                    } else {
                        self.issue_page += 1;
                        self.open_issue_count = page.total_count.or(self.open_issue_count);
                        self.issues.append(page.items);
                        self.issues.state = LoadState::Loaded;
                    }
                }
            }
            Action::CommentsLoaded(comments, load_id) => {
                if load_id == self.load_ids.comments {
                    self.comments.replace(comments);
                } else {
                    tracing::debug!(load_id, "dropping stale comment load");
                }
            }
            Action::LoadFailed {
                screen,
                load_id,
                message,
            } => {
                let (current, list_state) = match screen {
                    Screen::Repos => (self.load_ids.repos, &mut self.repos.state),
                    Screen::Issues => (self.load_ids.issues, &mut self.issues.state),
                    Screen::Comments => (self.load_ids.comments, &mut self.comments.state),
                };
                if load_id == current {
                    *list_state = LoadState::Error(message.clone());
                    self.toasts.error(message);
                }
            }
            Action::AppendFailed { load_id, message } => {
                if load_id == self.load_ids.issues {
                    self.issues.state = LoadState::Loaded;
                    self.toasts.error(message);
                }
            }

            // List controls
            Action::CycleFilter => match self.screen {
                Screen::Repos => cycle_filter(&mut self.repos),
                Screen::Issues => cycle_filter(&mut self.issues),
                Screen::Comments => cycle_filter(&mut self.comments),
            },
            Action::CycleSort => match self.screen {
                Screen::Repos => cycle_sort(&mut self.repos),
                Screen::Issues => cycle_sort(&mut self.issues),
                Screen::Comments => cycle_sort(&mut self.comments),
            },
            Action::ReverseSort => match self.screen {
                Screen::Repos => self.repos.reverse(),
                Screen::Issues => self.issues.reverse(),
                Screen::Comments => self.comments.reverse(),
            },
            Action::ToggleStats => {
                self.show_stats = !self.show_stats;
            }

            // Search
            Action::EnterSearchMode => {
                self.input_mode = InputMode::Search;
                self.search_input = self.search_term(self.screen).to_string();
            }
            Action::ExitSearchMode => {
                self.search_debounce.cancel();
                self.input_mode = InputMode::Normal;
                self.search_input.clear();
                self.apply_search(self.screen, "");
            }
            Action::SearchInput(c) => {
                self.search_input.push(c);
                self.schedule_search();
            }
            Action::SearchBackspace => {
                self.search_input.pop();
                self.schedule_search();
            }
            Action::SearchConfirm => {
                self.search_debounce.cancel();
                self.input_mode = InputMode::Normal;
                let term = std::mem::take(&mut self.search_input);
                self.apply_search(self.screen, &term);
            }
            Action::ClearSearch => {
                self.search_debounce.cancel();
                self.search_input.clear();
                self.apply_search(self.screen, "");
            }
            Action::ApplySearch { screen, term } => {
                self.apply_search(screen, &term);
            }

            // Repositories
            Action::ShowAddRepo => {
                self.input_mode = InputMode::AddRepo;
                self.add_repo_input.clear();
            }
            Action::AddRepoInput(c) => {
                self.add_repo_input.push(c);
            }
            Action::AddRepoBackspace => {
                self.add_repo_input.pop();
            }
            Action::CancelAddRepo => {
                self.input_mode = InputMode::Normal;
                self.add_repo_input.clear();
            }
            Action::SubmitAddRepo => match validate::repo_url(&self.add_repo_input) {
                Ok(url) => {
                    let url = url.to_string();
                    self.input_mode = InputMode::Normal;
                    self.add_repo_input.clear();
                    self.toasts.info(format!("Adding {}...", url));
                    self.spawn_add_repo(url);
                }
                Err(e) => self.toasts.error(e.to_string()),
            },
            Action::RepoAdded(message) => {
                self.toasts.success(message);
                self.spawn_load_repos();
            }
            Action::RepoRemoved(full_name) => {
                self.repos.remove_where(|r| r.full_name == full_name);
                self.toasts.success(format!("Removed {}", full_name));
                self.spawn_load_repos();
            }

            // Confirmation popup
            Action::ShowConfirm(confirm) => {
                self.popup = Some(Popup::Confirm(confirm));
            }
            Action::ConfirmYes => {
                if let Some(Popup::Confirm(confirm)) = self.popup.take() {
                    match confirm {
                        ConfirmAction::RemoveRepo(full_name) => self.spawn_remove_repo(full_name),
                        ConfirmAction::DeleteComment(id) => self.spawn_delete_comment(id),
                    }
                }
            }
            Action::ConfirmNo => {
                self.popup = None;
            }

            // Issues and comments
            Action::EditIssue => {
                if let (Some((owner, repo)), Some(issue)) = (self.repo_parts(), self.issues.selected()) {
                    let ctx = EditorContext::EditIssue {
                        owner,
                        repo,
                        number: issue.number,
                        body: issue.body.clone().unwrap_or_default(),
                    };
                    self.action_tx.send(Action::SuspendForEditor(ctx)).ok();
                }
            }
            Action::NewComment => {
                let number = match self.screen {
                    Screen::Issues => self.issues.selected().map(|i| i.number),
                    _ => self.current_issue.as_ref().map(|i| i.number),
                };
                if let (Some((owner, repo)), Some(number)) = (self.repo_parts(), number) {
                    let ctx = EditorContext::NewComment {
                        owner,
                        repo,
                        number,
                        prefill: String::new(),
                    };
                    self.action_tx.send(Action::SuspendForEditor(ctx)).ok();
                }
            }
            Action::QuoteComment => {
                let target = self.current_issue.as_ref().map(|i| i.number);
                if let (Some((owner, repo)), Some(number), Some(comment)) =
                    (self.repo_parts(), target, self.comments.selected())
                {
                    let ctx = EditorContext::NewComment {
                        owner,
                        repo,
                        number,
                        prefill: editor::quote(&comment.author, &comment.body),
                    };
                    self.action_tx.send(Action::SuspendForEditor(ctx)).ok();
                }
            }
            Action::EditComment => {
                if let (Some((owner, repo)), Some(comment)) = (self.repo_parts(), self.comments.selected()) {
                    let ctx = EditorContext::EditComment {
                        owner,
                        repo,
                        id: comment.id,
                        body: comment.body.clone(),
                    };
                    self.action_tx.send(Action::SuspendForEditor(ctx)).ok();
                }
            }
            Action::DeleteComment => {
                if let Some(comment) = self.comments.selected() {
                    self.popup = Some(Popup::Confirm(ConfirmAction::DeleteComment(comment.id)));
                }
            }
            Action::SuspendForEditor(ctx) => {
                // Needs the terminal; the main loop owns that
                tracing::warn!(?ctx, "editor request reached the app");
            }
            Action::IssueUpdated { number, body } => {
                self.issues
                    .update_where(|i| i.number == number, |i| i.body = Some(body.clone()));
                if let Some(issue) = self.current_issue.as_mut().filter(|i| i.number == number) {
                    issue.body = Some(body);
                }
                self.toasts.success(format!("Issue #{} updated", number));
            }
            Action::CommentPosted { number } => {
                self.toasts.success("Comment posted");
                self.issues
                    .update_where(|i| i.number == number, |i| i.comments += 1);
                let viewing = self.current_issue.as_ref().map(|i| i.number) == Some(number);
                if self.screen == Screen::Comments && viewing {
                    self.spawn_load_comments();
                }
            }
            Action::CommentUpdated { id, body } => {
                self.comments.update_where(|c| c.id == id, |c| c.body = body);
                self.toasts.success("Comment updated");
            }
            Action::CommentDeleted { id, message } => {
                if self.comments.remove_where(|c| c.id == id) > 0 {
                    if let Some(number) = self.current_issue.as_ref().map(|i| i.number) {
                        self.issues.update_where(
                            |i| i.number == number,
                            |i| i.comments = i.comments.saturating_sub(1),
                        );
                    }
                }
                self.toasts.success(message);
            }

            // Export
            Action::ShowExport => {
                self.popup = Some(Popup::Export(ExportModal {
                    loading: true,
                    ..ExportModal::default()
                }));
                self.spawn_load_export_repos();
            }
            Action::ExportReposLoaded(repos) => {
                let current = self.current_repo.clone();
                if let Some(Popup::Export(modal)) = &mut self.popup {
                    modal.selected = current
                        .and_then(|name| repos.iter().position(|r| r.full_name == name))
                        .unwrap_or(0);
                    modal.repos = repos;
                    modal.loading = false;
                }
            }
            Action::ExportReposFailed(message) => {
                if matches!(self.popup, Some(Popup::Export(_))) {
                    self.popup = None;
                }
                self.toasts.error(message);
            }
            Action::ToggleExportFormat => {
                if let Some(Popup::Export(modal)) = &mut self.popup {
                    modal.format = modal.format.toggle();
                }
            }
            Action::PopupUp => {
                if let Some(Popup::Export(modal)) = &mut self.popup {
                    modal.selected = modal.selected.saturating_sub(1);
                }
            }
            Action::PopupDown => {
                if let Some(Popup::Export(modal)) = &mut self.popup {
                    if modal.selected + 1 < modal.repos.len() {
                        modal.selected += 1;
                    }
                }
            }
            Action::PopupSelect => {
                let choice = match &self.popup {
                    Some(Popup::Export(modal)) => modal
                        .selected_repo()
                        .map(|r| (r.full_name.clone(), modal.format)),
                    _ => None,
                };
                if let Some((full_name, format)) = choice {
                    self.popup = None;
                    self.toasts
                        .info(format!("Exporting {} as {}...", full_name, format));
                    self.spawn_export(full_name, format);
                }
            }
            Action::ExportSaved(path) => {
                self.toasts
                    .success(format!("Exported to {}", path.display()));
            }
            Action::CloseExport => {
                self.popup = None;
            }

            // Desktop
            Action::OpenInBrowser => {
                if let Some(url) = self.selected_url() {
                    if let Err(e) = open::that(&url) {
                        self.toasts.error(format!("Could not open browser: {}", e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_url() {
                    match arboard::Clipboard::new().and_then(|mut c| c.set_text(url.clone())) {
                        Ok(()) => self.toasts.info(format!("Copied {}", url)),
                        Err(e) => self.toasts.error(format!("Clipboard unavailable: {}", e)),
                    }
                }
            }

            Action::Info(message) => self.toasts.info(message),
            Action::Error(message) => self.toasts.error(message),
            Action::None => {}
        }
    }

    /// Finish an editor round trip started by `Action::SuspendForEditor`.
    pub fn editor_finished(&mut self, ctx: EditorContext, result: Result<Option<String>>) {
        let text = match result {
            Ok(Some(text)) => text,
            Ok(None) => {
                self.toasts.info("Nothing changed");
                return;
            }
            Err(e) => {
                self.toasts.error(e.to_string());
                return;
            }
        };

        match ctx {
            EditorContext::EditIssue {
                owner,
                repo,
                number,
                ..
            } => self.spawn(move |backend| async move {
                match backend.update_issue(&owner, &repo, number, &text).await {
                    Ok(()) => Action::IssueUpdated { number, body: text },
                    Err(e) => e.into(),
                }
            }),
            EditorContext::NewComment {
                owner,
                repo,
                number,
                ..
            } => self.spawn(move |backend| async move {
                match backend.create_comment(&owner, &repo, number, &text).await {
                    Ok(()) => Action::CommentPosted { number },
                    Err(e) => e.into(),
                }
            }),
            EditorContext::EditComment {
                owner, repo, id, ..
            } => self.spawn(move |backend| async move {
                match backend.update_comment(&owner, &repo, id, &text).await {
                    Ok(()) => Action::CommentUpdated { id, body: text },
                    Err(e) => e.into(),
                }
            }),
        }
    }

    fn back(&mut self) {
        self.search_debounce.cancel();
        match self.screen {
            Screen::Repos => {
                self.should_quit = true;
            }
            Screen::Issues => {
                self.screen = Screen::Repos;
                self.current_repo = None;
                self.load_ids.issues += 1;
                self.issues.clear();
                if self.repos.state == LoadState::Idle {
                    self.spawn_load_repos();
                }
            }
            Screen::Comments => {
                self.screen = Screen::Issues;
                self.current_issue = None;
                self.load_ids.comments += 1;
                self.comments.clear();
            }
        }
    }

    fn select(&mut self) {
        match self.screen {
            Screen::Repos => {
                if let Some(repo) = self.repos.selected() {
                    let full_name = repo.full_name.clone();
                    self.open_repo(full_name);
                }
            }
            Screen::Issues => {
                if let Some(issue) = self.issues.selected() {
                    self.current_issue = Some(issue.clone());
                    self.screen = Screen::Comments;
                    self.comments.clear();
                    self.spawn_load_comments();
                }
            }
            Screen::Comments => {}
        }
    }

    fn search_term(&self, screen: Screen) -> &str {
        match screen {
            Screen::Repos => self.repos.search_term(),
            Screen::Issues => self.issues.search_term(),
            Screen::Comments => self.comments.search_term(),
        }
    }

    fn apply_search(&mut self, screen: Screen, term: &str) {
        match screen {
            Screen::Repos => self.repos.search(term),
            Screen::Issues => self.issues.search(term),
            Screen::Comments => self.comments.search(term),
        }
    }

    fn schedule_search(&mut self) {
        self.search_debounce.schedule(Action::ApplySearch {
            screen: self.screen,
            term: self.search_input.clone(),
        });
    }

    fn repo_parts(&self) -> Option<(String, String)> {
        let (owner, repo) = split_full_name(self.current_repo.as_deref()?)?;
        Some((owner.to_string(), repo.to_string()))
    }

    /// GitHub URL of the selected row
    pub fn selected_url(&self) -> Option<String> {
        match self.screen {
            Screen::Repos => self.repos.selected().map(|r| {
                if r.url.is_empty() {
                    github_url(&r.full_name, Link::Repo)
                } else {
                    r.url.clone()
                }
            }),
            Screen::Issues => {
                let repo = self.current_repo.as_deref()?;
                let issue = self.issues.selected()?;
                Some(github_url(repo, Link::Issue(issue.number)))
            }
            Screen::Comments => {
                let repo = self.current_repo.as_deref()?;
                let issue = self.current_issue.as_ref()?;
                let comment = self.comments.selected()?;
                Some(github_url(
                    repo,
                    Link::Comment {
                        issue: issue.number,
                        id: comment.id,
                    },
                ))
            }
        }
    }

    /// Run a backend call in the background and feed its result back as an action.
    fn spawn<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = Action> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        let task = f(Arc::clone(&self.backend));
        tokio::spawn(async move {
            tx.send(task.await).ok();
        });
    }

    fn spawn_load_repos(&mut self) {
        self.load_ids.repos += 1;
        let load_id = self.load_ids.repos;
        self.repos.state = LoadState::Loading;
        self.spawn(move |backend| async move {
            match backend.list_repos().await {
                Ok(repos) => Action::ReposLoaded(repos, load_id),
                Err(e) => Action::LoadFailed {
                    screen: Screen::Repos,
                    load_id,
                    message: e.to_string(),
                },
            }
        });
    }

    fn spawn_load_issues(&mut self, page: u32) {
        let Some((owner, repo)) = self.repo_parts() else {
            return;
        };
        self.load_ids.issues += 1;
        let load_id = self.load_ids.issues;
        self.issues.state = LoadState::Loading;
        self.spawn(move |backend| async move {
            match backend.list_issues(&owner, &repo, page).await {
                Ok(result) if page > 1 => Action::IssuesAppended(result, load_id),
                Ok(result) => Action::IssuesLoaded(result, load_id),
                Err(e) if page > 1 => Action::AppendFailed {
                    load_id,
                    message: e.to_string(),
                },
                Err(e) => Action::LoadFailed {
                    screen: Screen::Issues,
                    load_id,
                    message: e.to_string(),
                },
            }
        });
    }

    fn spawn_load_comments(&mut self) {
        let (Some((owner, repo)), Some(issue)) = (self.repo_parts(), self.current_issue.as_ref())
        else {
            return;
        };
        let number = issue.number;
        let issue_author = issue.author.clone();
        self.load_ids.comments += 1;
        let load_id = self.load_ids.comments;
        self.comments.state = LoadState::Loading;
        self.spawn(move |backend| async move {
            match backend
                .list_comments(&owner, &repo, number, &issue_author)
                .await
            {
                Ok(comments) => Action::CommentsLoaded(comments, load_id),
                Err(e) => Action::LoadFailed {
                    screen: Screen::Comments,
                    load_id,
                    message: e.to_string(),
                },
            }
        });
    }

    fn spawn_add_repo(&self, url: String) {
        self.spawn(move |backend| async move {
            match backend.add_repo(&url).await {
                Ok(message) => Action::RepoAdded(message),
                Err(e) => e.into(),
            }
        });
    }

    fn spawn_remove_repo(&self, full_name: String) {
        self.spawn(move |backend| async move {
            match backend.remove_repo(&full_name).await {
                Ok(()) => Action::RepoRemoved(full_name),
                Err(e) => e.into(),
            }
        });
    }

    fn spawn_delete_comment(&self, id: u64) {
        let Some((owner, repo)) = self.repo_parts() else {
            return;
        };
        self.spawn(move |backend| async move {
            match backend.delete_comment(&owner, &repo, id).await {
                Ok(message) => Action::CommentDeleted { id, message },
                Err(e) => e.into(),
            }
        });
    }

    fn spawn_load_export_repos(&self) {
        self.spawn(|backend| async move {
            match backend.list_export_repos().await {
                Ok(repos) => Action::ExportReposLoaded(repos),
                Err(e) => Action::ExportReposFailed(e.to_string()),
            }
        });
    }

    fn spawn_export(&self, full_name: String, format: ExportFormat) {
        let dir = self.export_dir.clone();
        self.spawn(move |backend| async move {
            match export_to(backend, &full_name, format, &dir).await {
                Ok(path) => Action::ExportSaved(path),
                Err(e) => e.into(),
            }
        });
    }
}

async fn export_to(
    backend: Arc<dyn Backend>,
    full_name: &str,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let bytes = backend.export_repo(full_name, format).await?;
    let name = export::file_name(full_name, format, Utc::now());
    export::save(dir, &name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HubNoteError;
    use crate::listview::IssueFilter;
    use crate::toast::ToastKind;
    use crate::types::{CommentRole, IssueState, PagedResult};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct StubBackend {
        repos: Vec<Repository>,
        issues: Vec<Issue>,
        /// When set, served by page number instead of `issues`
        issue_pages: Vec<Vec<Issue>>,
        open_issues: Option<u64>,
        failing_page: Option<u32>,
        export_error: Option<String>,
        delete_error: Option<String>,
        deleted: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Backend for StubBackend {
        fn base_url(&self) -> &str {
            "http://stub"
        }

        async fn list_repos(&self) -> Result<Vec<Repository>> {
            Ok(self.repos.clone())
        }

        async fn add_repo(&self, repo_url: &str) -> Result<String> {
            Ok(format!("Added {}", repo_url))
        }

        async fn remove_repo(&self, _full_name: &str) -> Result<()> {
            Ok(())
        }

        async fn list_issues(&self, _owner: &str, _repo: &str, page: u32) -> Result<PagedResult<Issue>> {
            if self.failing_page == Some(page) {
                return Err(HubNoteError::Network("HTTP 502: Bad Gateway".into()));
            }
            let items = if !self.issue_pages.is_empty() {
                self.issue_pages
                    .get(page as usize - 1)
                    .cloned()
                    .unwrap_or_default()
            } else if page == 1 {
                self.issues.clone()
            } else {
                Vec::new()
            };
            Ok(PagedResult {
                items,
                total_count: self.open_issues,
            })
        }

        async fn update_issue(&self, _: &str, _: &str, _: u64, _: &str) -> Result<()> {
            Ok(())
        }

        async fn list_comments(&self, _: &str, _: &str, _: u64, _: &str) -> Result<Vec<Comment>> {
            Ok(Vec::new())
        }

        async fn create_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<()> {
            Ok(())
        }

        async fn update_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_comment(&self, _owner: &str, _repo: &str, id: u64) -> Result<String> {
            if let Some(message) = &self.delete_error {
                return Err(HubNoteError::Application(message.clone()));
            }
            self.deleted.lock().unwrap().push(id);
            Ok("Comment deleted".to_string())
        }

        async fn list_export_repos(&self) -> Result<Vec<ExportRepo>> {
            if let Some(message) = &self.export_error {
                return Err(HubNoteError::Application(message.clone()));
            }
            Ok(vec![
                ExportRepo {
                    full_name: "octo/alpha".into(),
                    open_issues: 1,
                    description: None,
                },
                ExportRepo {
                    full_name: "octo/hello".into(),
                    open_issues: 2,
                    description: Some("greetings".into()),
                },
            ])
        }

        async fn export_repo(&self, _full_name: &str, _format: ExportFormat) -> Result<Vec<u8>> {
            Ok(b"[]".to_vec())
        }
    }

    fn repo(full_name: &str, stars: u64) -> Repository {
        Repository {
            full_name: full_name.to_string(),
            description: None,
            language: None,
            url: format!("https://github.com/{}", full_name),
            stars,
            forks: 0,
            open_issues: 0,
            updated_at: None,
            added_at: None,
            added_by: None,
        }
    }

    fn issue(number: u64, title: &str, state: IssueState) -> Issue {
        Issue {
            number,
            title: title.to_string(),
            body: None,
            state,
            author: "alice".to_string(),
            labels: Vec::new(),
            comments: 2,
            created_at: None,
            updated_at: None,
        }
    }

    fn comment(id: u64) -> Comment {
        Comment {
            id,
            author: "bob".to_string(),
            body: format!("comment {}", id),
            role: CommentRole::Other,
            created_at: None,
            updated_at: None,
        }
    }

    fn app_with(backend: StubBackend) -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(Arc::new(backend), tx, &Config::default());
        (app, rx)
    }

    fn on_comments(app: &mut App) {
        app.screen = Screen::Comments;
        app.current_repo = Some("octo/hello".into());
        app.current_issue = Some(issue(7, "Crash", IssueState::Open));
        app.comments.replace(vec![comment(41), comment(42), comment(43)]);
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn delete_comment_success_removes_record() {
        let (mut app, mut rx) = app_with(StubBackend::default());
        on_comments(&mut app);
        app.comments.select_next();

        let action = app.handle_event(key(KeyCode::Char('d')));
        app.update(action);
        assert!(matches!(
            app.popup,
            Some(Popup::Confirm(ConfirmAction::DeleteComment(42)))
        ));

        app.update(Action::ConfirmYes);
        assert!(app.popup.is_none());
        let result = rx.recv().await.unwrap();
        app.update(result);

        let ids: Vec<u64> = app.comments.records().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![41, 43]);
        let toast = app.toasts.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "Comment deleted");
    }

    #[tokio::test]
    async fn delete_comment_failure_keeps_record() {
        let (mut app, mut rx) = app_with(StubBackend {
            delete_error: Some("x".into()),
            ..StubBackend::default()
        });
        on_comments(&mut app);

        app.update(Action::ShowConfirm(ConfirmAction::DeleteComment(42)));
        app.update(Action::ConfirmYes);
        let result = rx.recv().await.unwrap();
        app.update(result);

        assert_eq!(app.comments.len(), 3);
        let toast = app.toasts.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "x");
    }

    #[tokio::test]
    async fn confirm_no_sends_nothing() {
        let (mut app, mut rx) = app_with(StubBackend::default());
        on_comments(&mut app);

        app.update(Action::ShowConfirm(ConfirmAction::DeleteComment(42)));
        app.update(Action::ConfirmNo);

        assert!(app.popup.is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(app.comments.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn search_is_debounced() {
        let (mut app, mut rx) = app_with(StubBackend::default());
        app.screen = Screen::Issues;
        app.current_repo = Some("octo/hello".into());
        app.issues.replace(vec![
            issue(1, "Bug in parser", IssueState::Open),
            issue(2, "Feature request", IssueState::Open),
        ]);

        app.update(Action::EnterSearchMode);
        for c in "bug".chars() {
            app.update(Action::SearchInput(c));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Still typing: nothing applied yet
        assert_eq!(app.issues.visible_len(), 2);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let action = rx.recv().await.unwrap();
        assert!(matches!(
            &action,
            Action::ApplySearch { screen: Screen::Issues, term } if term == "bug"
        ));
        app.update(action);

        assert_eq!(app.issues.visible_len(), 1);
        assert_eq!(app.banner(), Some("Found 1 matching issues (of 2)"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn search_confirm_applies_immediately() {
        let (mut app, _rx) = app_with(StubBackend::default());
        app.repos.replace(vec![repo("octo/alpha", 1), repo("octo/beta", 2)]);

        app.update(Action::EnterSearchMode);
        app.update(Action::SearchInput('b'));
        app.update(Action::SearchConfirm);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.repos.visible_len(), 1);

        app.update(Action::ClearSearch);
        assert_eq!(app.repos.visible_len(), 2);
        assert_eq!(app.banner(), None);
    }

    #[tokio::test]
    async fn stale_loads_are_dropped() {
        let (mut app, mut rx) = app_with(StubBackend {
            repos: vec![repo("octo/fresh", 1)],
            ..StubBackend::default()
        });

        app.update(Action::Refresh);
        let first = rx.recv().await.unwrap();
        app.update(Action::Refresh);
        let second = rx.recv().await.unwrap();

        app.update(Action::ReposLoaded(vec![repo("octo/stale", 1)], 1));
        assert_eq!(app.repos.state, LoadState::Loading);
        assert!(app.repos.is_empty());

        drop(first);
        app.update(second);
        assert_eq!(app.repos.state, LoadState::Loaded);
        assert_eq!(app.repos.records()[0].full_name, "octo/fresh");
    }

    #[tokio::test]
    async fn load_failure_marks_list() {
        let (mut app, _rx) = app_with(StubBackend::default());
        app.update(Action::Refresh);

        app.update(Action::LoadFailed {
            screen: Screen::Repos,
            load_id: 1,
            message: "Network error: HTTP 500: boom".into(),
        });

        assert_eq!(
            app.repos.state,
            LoadState::Error("Network error: HTTP 500: boom".into())
        );
        assert_eq!(app.toasts.current().unwrap().kind, ToastKind::Error);
    }

    fn closed_page(first: u64) -> Vec<Issue> {
        (first..first + 20)
            .map(|n| issue(n, "Old", IssueState::Closed))
            .collect()
    }

    #[tokio::test]
    async fn paging_continues_past_open_issue_count() {
        // The server counts open issues only, but pages through all of them
        let (mut app, mut rx) = app_with(StubBackend {
            issue_pages: vec![closed_page(1), closed_page(21), closed_page(41)],
            open_issues: Some(3),
            ..StubBackend::default()
        });

        app.open_repo("octo/hello".into());
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);
        assert_eq!(app.issues.len(), 20);
        assert_eq!(app.open_issue_count, Some(3));

        for expected in [40, 60] {
            app.update(Action::LoadNextPage);
            assert_eq!(app.issues.state, LoadState::Loading);
            let appended = rx.recv().await.unwrap();
            app.update(appended);
            assert_eq!(app.issues.len(), expected);
        }

        // Page 4 is empty
        app.update(Action::LoadNextPage);
        let appended = rx.recv().await.unwrap();
        app.update(appended);
        assert!(app.issues_exhausted);
        assert_eq!(app.issues.len(), 60);
        assert_eq!(app.toasts.current().unwrap().message, "No more issues");

        app.update(Action::LoadNextPage);
        assert!(rx.try_recv().is_err());
        assert_eq!(app.issues.state, LoadState::Loaded);
    }

    #[tokio::test]
    async fn failed_next_page_keeps_rows_loaded() {
        let (mut app, mut rx) = app_with(StubBackend {
            issue_pages: vec![closed_page(1), closed_page(21)],
            failing_page: Some(2),
            ..StubBackend::default()
        });

        app.open_repo("octo/hello".into());
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);

        app.update(Action::LoadNextPage);
        let failed = rx.recv().await.unwrap();
        assert!(matches!(failed, Action::AppendFailed { .. }));
        app.update(failed);

        assert_eq!(app.issues.state, LoadState::Loaded);
        assert_eq!(app.issues.len(), 20);
        assert_eq!(app.toasts.current().unwrap().kind, ToastKind::Error);

        // Still able to ask again
        app.update(Action::LoadNextPage);
        assert_eq!(app.issues.state, LoadState::Loading);
    }

    #[tokio::test]
    async fn select_repo_then_issue_then_back() {
        let (mut app, mut rx) = app_with(StubBackend {
            issues: vec![issue(1, "Bug", IssueState::Open), issue(2, "Old", IssueState::Closed)],
            ..StubBackend::default()
        });
        app.repos.replace(vec![repo("octo/hello", 1)]);

        app.update(Action::Select);
        assert_eq!(app.screen, Screen::Issues);
        assert_eq!(app.current_repo.as_deref(), Some("octo/hello"));
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);
        assert_eq!(app.issues.len(), 2);

        app.update(Action::CycleFilter);
        assert_eq!(app.issues.active_filter(), IssueFilter::Open);
        assert_eq!(app.banner(), Some("Showing 1 issues (Open)"));

        app.update(Action::Select);
        assert_eq!(app.screen, Screen::Comments);
        assert_eq!(app.current_issue.as_ref().map(|i| i.number), Some(1));

        app.update(Action::Back);
        assert_eq!(app.screen, Screen::Issues);
        app.update(Action::Back);
        assert_eq!(app.screen, Screen::Repos);
        app.update(Action::Back);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn add_repo_validates_before_sending() {
        let (mut app, mut rx) = app_with(StubBackend::default());

        app.update(Action::ShowAddRepo);
        for c in "not a repo".chars() {
            app.update(Action::AddRepoInput(c));
        }
        app.update(Action::SubmitAddRepo);

        assert_eq!(app.input_mode, InputMode::AddRepo);
        assert_eq!(app.toasts.current().unwrap().kind, ToastKind::Error);
        assert!(rx.try_recv().is_err());

        app.update(Action::ShowAddRepo);
        for c in "octo/hello".chars() {
            app.update(Action::AddRepoInput(c));
        }
        app.update(Action::SubmitAddRepo);
        assert_eq!(app.input_mode, InputMode::Normal);

        let added = rx.recv().await.unwrap();
        assert!(matches!(&added, Action::RepoAdded(m) if m == "Added octo/hello"));
        app.update(added);
        assert_eq!(app.repos.state, LoadState::Loading);
    }

    #[tokio::test]
    async fn export_modal_preselects_current_repo() {
        let (mut app, mut rx) = app_with(StubBackend::default());
        app.current_repo = Some("octo/hello".into());

        app.update(Action::ShowExport);
        let loaded = rx.recv().await.unwrap();
        app.update(loaded);
        app.update(Action::ToggleExportFormat);

        match &app.popup {
            Some(Popup::Export(modal)) => {
                assert!(!modal.loading);
                assert_eq!(modal.selected, 1);
                assert_eq!(modal.format, ExportFormat::Csv);
            }
            other => panic!("expected export modal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn export_modal_closes_when_repos_fail_to_load() {
        let (mut app, mut rx) = app_with(StubBackend {
            export_error: Some("Not logged in".into()),
            ..StubBackend::default()
        });

        app.update(Action::ShowExport);
        assert!(matches!(app.popup, Some(Popup::Export(_))));
        let failed = rx.recv().await.unwrap();
        app.update(failed);

        assert!(app.popup.is_none());
        let toast = app.toasts.current().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("Not logged in"));
    }

    #[tokio::test]
    async fn editor_results_become_requests() {
        let (mut app, mut rx) = app_with(StubBackend::default());
        on_comments(&mut app);
        let ctx = EditorContext::EditComment {
            owner: "octo".into(),
            repo: "hello".into(),
            id: 43,
            body: "comment 43".into(),
        };

        app.editor_finished(ctx.clone(), Ok(None));
        assert_eq!(app.toasts.current().unwrap().message, "Nothing changed");

        app.editor_finished(ctx, Ok(Some("edited".into())));
        let updated = rx.recv().await.unwrap();
        app.update(updated);

        let edited = app.comments.records().iter().find(|c| c.id == 43).unwrap();
        assert_eq!(edited.body, "edited");
    }

    #[tokio::test]
    async fn quote_prefills_editor() {
        let (mut app, mut rx) = app_with(StubBackend::default());
        on_comments(&mut app);

        app.update(Action::QuoteComment);
        match rx.recv().await.unwrap() {
            Action::SuspendForEditor(EditorContext::NewComment { number, prefill, .. }) => {
                assert_eq!(number, 7);
                assert_eq!(prefill, "> comment 41\n\n@bob ");
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn urls_follow_screen() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Arc::new(StubBackend::default()), tx, &Config::default());
        on_comments(&mut app);
        assert_eq!(
            app.selected_url().as_deref(),
            Some("https://github.com/octo/hello/issues/7#issuecomment-41")
        );
    }
}
