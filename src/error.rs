// Error types shared across the integration pipeline

use thiserror::Error;

/// Notice shown when the backend gave no usable `detail`
pub const GENERIC_LOAD_FAILURE: &str = "Failed to load data";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("no provider selected")]
    NoProviderSelected,

    #[error("no credentials configured for {0}")]
    NotConfigured(String),

    #[error("{provider} credentials must be a JSON object")]
    NotAnObject { provider: String },

    #[error("{provider} credentials are missing required field `{field}`")]
    MissingField { provider: String, field: String },
}

/// LoadError - why a load round trip did not produce a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Backend answered with a non-success status
    #[error("backend returned status {status}: {}", detail.as_deref().unwrap_or("<no detail>"))]
    Backend { status: u16, detail: Option<String> },

    /// Connection, timeout or request construction failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Success status, but the body was not JSON
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl LoadError {
    /// Message for the user: the backend's `detail` verbatim, else the generic notice
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Backend {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => GENERIC_LOAD_FAILURE.to_string(),
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LoadError::Decode(e.to_string())
        } else {
            LoadError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detail_is_surfaced_verbatim() {
        let err = LoadError::Backend {
            status: 400,
            detail: Some("invalid token".to_string()),
        };
        assert_eq!(err.user_message(), "invalid token");
    }

    #[test]
    fn test_generic_message_without_detail() {
        let err = LoadError::Backend {
            status: 500,
            detail: None,
        };
        assert_eq!(err.user_message(), GENERIC_LOAD_FAILURE);

        let err = LoadError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_LOAD_FAILURE);
    }
}
