use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::Backend;
use crate::error::{HubNoteError, Result};
use crate::types::{
    parse_timestamp, Comment, CommentRole, ExportFormat, ExportRepo, Issue, IssueState,
    PagedResult, Repository,
};

/// HTTP client for a HubNote server, authenticated by its session cookie.
#[derive(Debug)]
pub struct HubNote {
    client: Client,
    base_url: String,
}

impl HubNote {
    pub fn new(base_url: &str, session: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(&format!("session={}", session))
            .map_err(|_| HubNoteError::Auth("session cookie contains invalid characters".into()))?;
        headers.insert(COOKIE, cookie);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Makes form endpoints answer with JSON instead of a redirect
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("hubnote/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn repo_path(owner: &str, repo: &str) -> String {
        format!(
            "/api/repos/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send and insist on a 2xx, surfacing the backend's error text otherwise.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| envelope_message(&v))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        tracing::debug!(%status, detail = %detail, "backend request failed");
        Err(HubNoteError::Network(format!("HTTP {}: {}", status.as_u16(), detail)))
    }

    /// Send, then decode a `{success, ...}` envelope into `T`.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let value: Value = self.send(builder).await?.json().await?;
        decode_envelope(value)
    }
}

// Wire types

#[derive(Deserialize)]
struct ReposBody {
    #[serde(default)]
    repositories: Vec<WireRepo>,
}

#[derive(Deserialize)]
struct IssuesBody {
    #[serde(default)]
    data: Vec<WireIssue>,
    total_count: Option<Value>,
}

#[derive(Deserialize)]
struct CommentsBody {
    #[serde(default)]
    data: Vec<WireComment>,
}

#[derive(Deserialize)]
struct ExportReposBody {
    #[serde(default)]
    repos: Vec<ExportRepo>,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct WireRepo {
    full_name: Option<String>,
    name: Option<String>,
    owner: Option<String>,
    description: Option<String>,
    url: Option<String>,
    html_url: Option<String>,
    language: Option<String>,
    stars: Option<Value>,
    forks: Option<Value>,
    open_issues: Option<Value>,
    updated_at: Option<String>,
    added_at: Option<String>,
    added_by: Option<String>,
}

#[derive(Deserialize)]
struct WireUser {
    login: String,
}

#[derive(Deserialize)]
struct WireLabel {
    name: String,
}

#[derive(Deserialize)]
struct WireIssue {
    number: u64,
    #[serde(default)]
    title: String,
    body: Option<String>,
    state: Option<String>,
    user: Option<WireUser>,
    #[serde(default)]
    labels: Vec<WireLabel>,
    comments_count: Option<Value>,
    comments: Option<Value>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Deserialize)]
struct WireComment {
    id: u64,
    body: Option<String>,
    user: Option<WireUser>,
    author_association: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

/// The human-readable part of an error envelope.
fn envelope_message(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key)?.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reject `{success: false}` bodies, then decode the rest as `T`.
fn decode_envelope<T: DeserializeOwned>(value: Value) -> Result<T> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = envelope_message(&value).unwrap_or_else(|| "Request failed".to_string());
        return Err(HubNoteError::Application(message));
    }
    serde_json::from_value(value)
        .map_err(|e| HubNoteError::Network(format!("unexpected response: {}", e)))
}

/// Counts arrive as numbers, numeric strings or null.
fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn login(user: Option<WireUser>) -> String {
    user.map(|u| u.login)
        .unwrap_or_else(|| "unknown".to_string())
}

fn repo_from_wire(r: WireRepo) -> Option<Repository> {
    let full_name = match (r.full_name, &r.owner, &r.name) {
        (Some(full), _, _) if !full.is_empty() => full,
        (_, Some(owner), Some(name)) => format!("{}/{}", owner, name),
        _ => return None,
    };
    Some(Repository {
        url: r
            .url
            .or(r.html_url)
            .unwrap_or_else(|| format!("https://github.com/{}", full_name)),
        full_name,
        description: r.description.filter(|d| !d.is_empty()),
        language: r.language.filter(|l| !l.is_empty()),
        stars: count(r.stars.as_ref()),
        forks: count(r.forks.as_ref()),
        open_issues: count(r.open_issues.as_ref()),
        updated_at: r.updated_at.as_deref().and_then(parse_timestamp),
        added_at: r.added_at.as_deref().and_then(parse_timestamp),
        added_by: r.added_by,
    })
}

fn issue_from_wire(i: WireIssue) -> Issue {
    Issue {
        number: i.number,
        title: i.title,
        body: i.body,
        state: IssueState::from_api_str(i.state.as_deref().unwrap_or("open")),
        author: login(i.user),
        labels: i.labels.into_iter().map(|l| l.name).collect(),
        comments: count(i.comments_count.as_ref().or(i.comments.as_ref())),
        created_at: i.created_at.as_deref().and_then(parse_timestamp),
        updated_at: i.updated_at.as_deref().and_then(parse_timestamp),
    }
}

fn comment_from_wire(c: WireComment, issue_author: &str) -> Comment {
    let author = login(c.user);
    Comment {
        id: c.id,
        role: CommentRole::classify(&author, issue_author, c.author_association.as_deref()),
        author,
        body: c.body.unwrap_or_default(),
        created_at: c.created_at.as_deref().and_then(parse_timestamp),
        updated_at: c.updated_at.as_deref().and_then(parse_timestamp),
    }
}

#[async_trait]
impl Backend for HubNote {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_repos(&self) -> Result<Vec<Repository>> {
        let body: ReposBody = self
            .send_json(self.request(Method::GET, "/api/my_repos"))
            .await?;
        Ok(body.repositories.into_iter().filter_map(repo_from_wire).collect())
    }

    async fn add_repo(&self, repo_url: &str) -> Result<String> {
        let request = self
            .request(Method::POST, "/add_repo")
            .form(&[("repo_url", repo_url)]);
        let body: MessageBody = self.send_json(request).await?;
        Ok(body
            .message
            .unwrap_or_else(|| format!("Added {}", repo_url)))
    }

    async fn remove_repo(&self, full_name: &str) -> Result<()> {
        let (owner, name) = crate::types::split_full_name(full_name).ok_or_else(|| {
            HubNoteError::Validation(format!("Not a repository name: {}", full_name))
        })?;
        let path = format!(
            "/remove_repo/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(name)
        );
        // Answers with a redirect to the index page; any 2xx after following it is success
        self.send(self.request(Method::GET, &path)).await?;
        Ok(())
    }

    async fn list_issues(&self, owner: &str, repo: &str, page: u32) -> Result<PagedResult<Issue>> {
        let path = format!("{}/issues?state=all&page={}", Self::repo_path(owner, repo), page);
        let body: IssuesBody = self.send_json(self.request(Method::GET, &path)).await?;
        Ok(PagedResult {
            items: body.data.into_iter().map(issue_from_wire).collect(),
            total_count: body.total_count.as_ref().map(|v| count(Some(v))),
        })
    }

    async fn update_issue(&self, owner: &str, repo: &str, number: u64, body: &str) -> Result<()> {
        let path = format!("{}/issues/{}", Self::repo_path(owner, repo), number);
        let request = self
            .request(Method::PATCH, &path)
            .json(&json!({ "body": body }));
        let _: Value = self.send_json(request).await?;
        Ok(())
    }

    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        issue_author: &str,
    ) -> Result<Vec<Comment>> {
        let path = format!("{}/issues/{}/comments", Self::repo_path(owner, repo), number);
        let body: CommentsBody = self.send_json(self.request(Method::GET, &path)).await?;
        Ok(body
            .data
            .into_iter()
            .map(|c| comment_from_wire(c, issue_author))
            .collect())
    }

    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<()> {
        let path = format!("{}/issues/{}/comments", Self::repo_path(owner, repo), number);
        let request = self
            .request(Method::POST, &path)
            .json(&json!({ "body": body }));
        let _: Value = self.send_json(request).await?;
        Ok(())
    }

    async fn update_comment(&self, owner: &str, repo: &str, id: u64, body: &str) -> Result<()> {
        let path = format!("{}/comments/{}", Self::repo_path(owner, repo), id);
        let request = self.request(Method::PUT, &path).json(&json!({ "body": body }));
        let _: Value = self.send_json(request).await?;
        Ok(())
    }

    async fn delete_comment(&self, owner: &str, repo: &str, id: u64) -> Result<String> {
        let path = format!("{}/issues/comments/{}", Self::repo_path(owner, repo), id);
        let body: MessageBody = self.send_json(self.request(Method::DELETE, &path)).await?;
        Ok(body.message.unwrap_or_else(|| "Comment deleted".to_string()))
    }

    async fn list_export_repos(&self) -> Result<Vec<ExportRepo>> {
        let body: ExportReposBody = self
            .send_json(self.request(Method::GET, "/api/export/repos"))
            .await?;
        Ok(body.repos)
    }

    async fn export_repo(&self, full_name: &str, format: ExportFormat) -> Result<Vec<u8>> {
        let path = format!("/api/export/{}", urlencoding::encode(full_name));
        let request = self
            .request(Method::POST, &path)
            .json(&json!({ "format": format.as_api_str() }));
        let response = self.send(request).await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        let bytes = response.bytes().await?.to_vec();

        // A JSON export is itself JSON, so only an error envelope counts as failure
        if is_json {
            if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
                if value.get("success").and_then(Value::as_bool) == Some(false) {
                    return Err(HubNoteError::Application(
                        envelope_message(&value).unwrap_or_else(|| "Export failed".to_string()),
                    ));
                }
            }
        }
        Ok(bytes)
    }
}
