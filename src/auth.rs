use std::path::PathBuf;

use crate::config::{self, ServerConfig};
use crate::error::{HubNoteError, Result};

/// Try to run a CLI command and capture stdout as a session value
fn try_cli_session(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        non_empty(String::from_utf8_lossy(&output.stdout).as_ref())
    } else {
        None
    }
}

/// Stored session path: ~/.config/hubnote/session
fn session_path() -> Option<PathBuf> {
    Some(config::config_dir()?.join("session"))
}

fn load_stored_session() -> Option<String> {
    let content = std::fs::read_to_string(session_path()?).ok()?;
    non_empty(&content)
}

/// Save a session cookie so the next start does not need the command again
fn save_session(value: &str) -> std::io::Result<()> {
    if let Some(path) = session_path() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, value)?;
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Accept either the bare cookie value or a pasted `session=...` pair.
pub fn normalize_cookie(raw: &str) -> String {
    let raw = raw.trim();
    raw.strip_prefix("session=").unwrap_or(raw).to_string()
}

/// Find the backend session cookie, trying in order:
/// 1. Env var named in config (default `HUBNOTE_SESSION`)
/// 2. Stored value in ~/.config/hubnote/session
/// 3. `session_command` from config (result is stored for next time)
pub fn load_session(server: &ServerConfig) -> Result<String> {
    if let Some(env_var) = &server.session_env {
        if let Some(value) = std::env::var(env_var).ok().as_deref().and_then(non_empty) {
            tracing::debug!(env_var, "using session from environment");
            return Ok(normalize_cookie(&value));
        }
    }

    if let Some(value) = load_stored_session() {
        tracing::debug!("using stored session");
        return Ok(normalize_cookie(&value));
    }

    if let Some(cmd) = &server.session_command {
        if let Some(value) = try_cli_session(cmd) {
            let value = normalize_cookie(&value);
            if let Err(e) = save_session(&value) {
                tracing::warn!(error = %e, "could not store session");
            }
            return Ok(value);
        }
    }

    Err(HubNoteError::Auth(format!(
        "No session found. Log in to {} in a browser and set {} to the value of its `session` cookie.",
        server.base_url,
        server.session_env.as_deref().unwrap_or("a session env var")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_cookie_name() {
        assert_eq!(normalize_cookie("session=abc.def"), "abc.def");
        assert_eq!(normalize_cookie("  abc.def\n"), "abc.def");
    }

    #[test]
    fn cli_session_captures_stdout() {
        assert_eq!(try_cli_session("echo '  tok  '"), Some("tok".to_string()));
        assert_eq!(try_cli_session("true"), None);
        assert_eq!(try_cli_session("exit 1"), None);
    }

    #[test]
    fn env_var_wins() {
        let server = ServerConfig {
            base_url: "http://localhost:5000".into(),
            session_env: Some("HUBNOTE_TEST_SESSION_ENV_WINS".into()),
            session_command: None,
        };
        std::env::set_var("HUBNOTE_TEST_SESSION_ENV_WINS", "session=xyz");
        assert_eq!(load_session(&server).unwrap(), "xyz");
        std::env::remove_var("HUBNOTE_TEST_SESSION_ENV_WINS");
    }
}
