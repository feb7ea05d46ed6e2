use crate::error::{HubNoteError, Result};

/// Check a user-entered repository reference: either `owner/repo` or a
/// `http(s)://github.com/owner/repo` URL with an optional trailing slash.
/// Returns the trimmed input on success.
pub fn repo_url(input: &str) -> Result<&str> {
    let input = input.trim();
    if input.is_empty() {
        return Err(HubNoteError::Validation(
            "Enter a repository URL".to_string(),
        ));
    }

    let path = input
        .strip_prefix("https://github.com/")
        .or_else(|| input.strip_prefix("http://github.com/"));

    let valid = match path {
        Some(path) => is_owner_repo(path.strip_suffix('/').unwrap_or(path)),
        None => is_owner_repo(input),
    };

    if valid {
        Ok(input)
    } else {
        Err(HubNoteError::Validation(format!(
            "Not a valid GitHub repository: {}",
            input
        )))
    }
}

/// Like [`repo_url`], reduced to `owner/repo`.
pub fn full_name(input: &str) -> Result<String> {
    let input = repo_url(input)?;
    let path = input
        .strip_prefix("https://github.com/")
        .or_else(|| input.strip_prefix("http://github.com/"))
        .unwrap_or(input);
    Ok(path.trim_end_matches('/').to_string())
}

fn is_owner_repo(s: &str) -> bool {
    match s.split_once('/') {
        Some((owner, repo)) => is_segment(owner) && is_segment(repo),
        None => false,
    }
}

/// `[A-Za-z0-9_.-]+`
fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_owner_repo() {
        assert_eq!(repo_url("rust-lang/rust").unwrap(), "rust-lang/rust");
        assert_eq!(repo_url("  a_b/c.d-e  ").unwrap(), "a_b/c.d-e");
    }

    #[test]
    fn accepts_github_urls() {
        assert!(repo_url("https://github.com/tokio-rs/tokio").is_ok());
        assert!(repo_url("http://github.com/tokio-rs/tokio/").is_ok());
    }

    #[test]
    fn full_name_strips_url() {
        assert_eq!(full_name("https://github.com/tokio-rs/tokio/").unwrap(), "tokio-rs/tokio");
        assert_eq!(full_name(" octo/hello ").unwrap(), "octo/hello");
        assert!(full_name("octo").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(repo_url("   "), Err(HubNoteError::Validation(_))));
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "rust",
            "a/b/c",
            "https://gitlab.com/a/b",
            "https://github.com/a",
            "https://github.com/a/b/issues",
            "own er/repo",
            "/repo",
        ] {
            assert!(repo_url(bad).is_err(), "{} should be rejected", bad);
        }
    }
}
