use std::path::PathBuf;

use crate::error::HubNoteError;
use crate::types::{Comment, ExportRepo, Issue, PagedResult, Repository};

/// Which list the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Repos,
    Issues,
    Comments,
}

/// What to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveRepo(String),
    DeleteComment(u64),
}

/// Context for editor suspend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorContext {
    EditIssue {
        owner: String,
        repo: String,
        number: u64,
        body: String,
    },
    NewComment {
        owner: String,
        repo: String,
        number: u64,
        prefill: String,
    },
    EditComment {
        owner: String,
        repo: String,
        id: u64,
        body: String,
    },
}

impl EditorContext {
    /// Text the editor opens with.
    pub fn initial_text(&self) -> &str {
        match self {
            EditorContext::EditIssue { body, .. } => body,
            EditorContext::NewComment { prefill, .. } => prefill,
            EditorContext::EditComment { body, .. } => body,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Back,
    Tick,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Select,

    // Loading
    Refresh,
    LoadNextPage,
    ReposLoaded(Vec<Repository>, u64),
    IssuesLoaded(PagedResult<Issue>, u64),
    IssuesAppended(PagedResult<Issue>, u64),
    CommentsLoaded(Vec<Comment>, u64),
    LoadFailed {
        screen: Screen,
        load_id: u64,
        message: String,
    },
    /// A next-page fetch failed; rows already shown stay loaded
    AppendFailed { load_id: u64, message: String },

    // List controls
    CycleFilter,
    CycleSort,
    ReverseSort,
    ToggleStats,

    // Search
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    SearchConfirm,
    ClearSearch,
    /// Fired by the debouncer once typing pauses
    ApplySearch { screen: Screen, term: String },

    // Repositories
    ShowAddRepo,
    AddRepoInput(char),
    AddRepoBackspace,
    SubmitAddRepo,
    CancelAddRepo,
    RepoAdded(String),
    RepoRemoved(String),

    // Confirmation popup
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // Issues and comments
    EditIssue,
    NewComment,
    QuoteComment,
    EditComment,
    DeleteComment,
    SuspendForEditor(EditorContext),
    IssueUpdated { number: u64, body: String },
    CommentPosted { number: u64 },
    CommentUpdated { id: u64, body: String },
    CommentDeleted { id: u64, message: String },

    // Export
    ShowExport,
    ExportReposLoaded(Vec<ExportRepo>),
    ExportReposFailed(String),
    ToggleExportFormat,
    ExportSaved(PathBuf),
    CloseExport,

    // Popup navigation
    PopupUp,
    PopupDown,
    PopupSelect,

    // Desktop
    OpenInBrowser,
    YankUrl,

    Info(String),
    Error(String),
    None,
}

impl From<HubNoteError> for Action {
    fn from(err: HubNoteError) -> Self {
        Action::Error(err.to_string())
    }
}
