use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::HubNoteError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub session_env: Option<String>,
    pub session_command: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            session_env: Some("HUBNOTE_SESSION".to_string()),
            session_command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub search_debounce_ms: u64,
    pub toast_secs: u64,
    pub export_dir: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            toast_secs: 4,
            export_dir: None,
        }
    }
}

impl UiConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_secs(self.toast_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("hubnote"))
}

/// `{state_dir}/hubnote/hubnote.log`, falling back to the cache dir where
/// the platform has no state dir.
pub fn log_path() -> Option<PathBuf> {
    let base = dirs::state_dir().or_else(dirs::cache_dir)?;
    Some(base.join("hubnote").join("hubnote.log"))
}

fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

impl Config {
    /// Read `{config_dir}/hubnote/config.toml`. A missing or unreadable file
    /// yields the defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Config::default()
            }
        }
    }

    /// Reject settings the client cannot work with.
    pub fn check(&self) -> Result<(), HubNoteError> {
        let url = &self.server.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HubNoteError::Config(format!(
                "base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.ui.search_debounce_ms > 5_000 {
            return Err(HubNoteError::Config(format!(
                "search_debounce_ms of {} would make search feel broken",
                self.ui.search_debounce_ms
            )));
        }
        Ok(())
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        if config.server.base_url.trim().is_empty() {
            config.server.base_url = ServerConfig::default().base_url;
        }
        config.server.base_url = config.server.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_config() {
        let toml_str = r#"
[server]
base_url = "https://hubnote.example.com/"
session_env = "MY_SESSION"
session_command = "pass show hubnote"

[ui]
search_debounce_ms = 150
toast_secs = 5
export_dir = "/tmp/exports"
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.server.base_url, "https://hubnote.example.com");
        assert_eq!(config.server.session_env.as_deref(), Some("MY_SESSION"));
        assert_eq!(
            config.server.session_command.as_deref(),
            Some("pass show hubnote")
        );
        assert_eq!(config.ui.search_debounce(), Duration::from_millis(150));
        assert_eq!(config.ui.toast_lifetime(), Duration::from_secs(5));
        assert_eq!(config.ui.export_dir, Some(PathBuf::from("/tmp/exports")));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config = Config::parse("[ui]\ntoast_secs = 3\n").unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.ui.search_debounce_ms, 300);
        assert_eq!(config.ui.toast_secs, 3);
    }

    #[test]
    fn empty_base_url_uses_default() {
        let config = Config::parse("[server]\nbase_url = \"  \"\n").unwrap();
        assert_eq!(config.server.base_url, "http://localhost:5000");
    }

    #[test]
    fn log_file_lives_outside_the_terminal() {
        if let Some(path) = log_path() {
            assert!(path.ends_with("hubnote/hubnote.log"));
            assert!(path.is_absolute());
        }
    }

    #[test]
    fn check_rejects_bad_values() {
        assert!(Config::default().check().is_ok());

        let mut config = Config::default();
        config.server.base_url = "localhost:5000".into();
        assert!(matches!(config.check(), Err(HubNoteError::Config(_))));

        let mut config = Config::default();
        config.ui.search_debounce_ms = 60_000;
        assert!(config.check().is_err());
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(Config::parse("[ui]\ntoast_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn load_falls_back_to_default() {
        let config = Config::load(); // will use default since file likely doesn't exist in test
        assert!(!config.server.base_url.is_empty());
    }
}
