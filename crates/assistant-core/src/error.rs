use std::time::Duration;

use thiserror::Error;

/// Errors raised by the submission pipeline and inference providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Prompt was empty or whitespace only
    #[error("Please enter a message")]
    EmptyPrompt,

    /// A request is already outstanding for this pipeline
    #[error("A request is already in progress")]
    RequestInFlight,

    /// The inference server could not be reached
    #[error("Cannot connect to inference server at {0}")]
    ProviderUnreachable(String),

    /// The inference call did not finish in time
    #[error("Inference request timed out after {}s", .0.as_secs())]
    ProviderTimeout(Duration),

    /// Any other provider-side failure
    #[error("{0}")]
    ProviderError(String),
}

impl ChatError {
    /// Text shown as the assistant turn when a request fails.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::ProviderUnreachable(endpoint) => format!(
                "Connection Error: Unable to connect to Ollama server.\nPlease ensure Ollama is running on {}",
                endpoint
            ),
            ChatError::ProviderTimeout(_) => {
                "Timeout Error: The request took too long to complete.".to_string()
            }
            ChatError::ProviderError(detail) => format!("Unexpected Error: {}", detail),
            ChatError::EmptyPrompt | ChatError::RequestInFlight => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::ProviderTimeout(Duration::ZERO)
        } else if err.is_connect() {
            let endpoint = err
                .url()
                .map(endpoint_of)
                .unwrap_or_else(|| "the configured endpoint".to_string());
            ChatError::ProviderUnreachable(endpoint)
        } else {
            ChatError::ProviderError(err.to_string())
        }
    }
}

/// Errors raised by the session gate and authentication providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter email and password.")]
    MissingCredentials,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// The provider rejected the credentials or the request
    #[error("{0}")]
    AuthFailure(String),

    #[error("Cannot reach authentication service: {0}")]
    Unreachable(String),

    #[error("Authentication service timed out")]
    Timeout,
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else if err.is_connect() {
            AuthError::Unreachable(err.to_string())
        } else {
            AuthError::AuthFailure(err.to_string())
        }
    }
}

fn endpoint_of(url: &reqwest::Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_and_timeout_messages_differ() {
        let unreachable = ChatError::ProviderUnreachable("localhost:11434".into()).user_message();
        let timeout = ChatError::ProviderTimeout(Duration::from_secs(30)).user_message();
        assert!(unreachable.contains("Connection Error"));
        assert!(unreachable.contains("localhost:11434"));
        assert!(timeout.contains("Timeout Error"));
        assert_ne!(unreachable, timeout);
    }

    #[test]
    fn test_provider_error_includes_detail() {
        let msg = ChatError::ProviderError("model not found".into()).user_message();
        assert_eq!(msg, "Unexpected Error: model not found");
    }

    #[test]
    fn test_timeout_display() {
        let err = ChatError::ProviderTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Inference request timed out after 30s");
    }
}
