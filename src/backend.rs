use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Comment, ExportFormat, ExportRepo, Issue, PagedResult, Repository};

/// What a link points at on GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Repo,
    Issue(u64),
    Comment { issue: u64, id: u64 },
}

/// Browser URL for a mirrored object.
pub fn github_url(full_name: &str, link: Link) -> String {
    match link {
        Link::Repo => format!("https://github.com/{}", full_name),
        Link::Issue(number) => format!("https://github.com/{}/issues/{}", full_name, number),
        Link::Comment { issue, id } => format!(
            "https://github.com/{}/issues/{}#issuecomment-{}",
            full_name, issue, id
        ),
    }
}

/// The HubNote REST API as seen by the client.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    fn base_url(&self) -> &str;

    // Repositories
    async fn list_repos(&self) -> Result<Vec<Repository>>;
    /// Returns the backend's confirmation message.
    async fn add_repo(&self, repo_url: &str) -> Result<String>;
    async fn remove_repo(&self, full_name: &str) -> Result<()>;

    // Issues
    async fn list_issues(&self, owner: &str, repo: &str, page: u32) -> Result<PagedResult<Issue>>;
    async fn update_issue(&self, owner: &str, repo: &str, number: u64, body: &str) -> Result<()>;

    // Comments
    /// `issue_author` decides which comments count as the author's.
    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        issue_author: &str,
    ) -> Result<Vec<Comment>>;
    async fn create_comment(&self, owner: &str, repo: &str, number: u64, body: &str)
        -> Result<()>;
    async fn update_comment(&self, owner: &str, repo: &str, id: u64, body: &str) -> Result<()>;
    /// Returns the backend's confirmation message.
    async fn delete_comment(&self, owner: &str, repo: &str, id: u64) -> Result<String>;

    // Export
    async fn list_export_repos(&self) -> Result<Vec<ExportRepo>>;
    async fn export_repo(&self, full_name: &str, format: ExportFormat) -> Result<Vec<u8>>;
}
