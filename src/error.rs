use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubNoteError {
    /// Request failed to complete or came back with a non-2xx status.
    #[error("Network error: {0}")]
    Network(String),

    /// User input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// Backend answered 2xx but with `success: false`.
    #[error("{0}")]
    Application(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for HubNoteError {
    fn from(err: reqwest::Error) -> Self {
        HubNoteError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HubNoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_shows_backend_message_verbatim() {
        let err = HubNoteError::Application("x".to_string());
        assert_eq!(err.to_string(), "x");
    }

    #[test]
    fn network_error_is_prefixed() {
        let err = HubNoteError::Network("HTTP 502".to_string());
        assert_eq!(err.to_string(), "Network error: HTTP 502");
    }
}
