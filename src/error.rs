// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResearchError>;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request to {service} timed out")]
    Timeout { service: String },

    #[error("Rate limited by {service}")]
    RateLimited {
        service: String,
        retry_after: Option<u64>,
    },

    #[error("{service} returned status {status}: {message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Authentication rejected by {service}: {message}")]
    Auth { service: String, message: String },

    #[error("Request to {service} failed: {message}")]
    Request { service: String, message: String },

    #[error("Network error talking to {service}: {message}")]
    Network { service: String, message: String },

    #[error("Unsupported content type '{content_type}' at {url}")]
    UnsupportedContent { url: String, content_type: String },

    #[error("No usable content extracted from {0}")]
    EmptyContent(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error(
        "No sources found or all content fetches failed. \
         Check your internet connection or try a different question."
    )]
    NoSources,

    #[error("Language model unavailable, no report could be produced: {0}")]
    ModelUnavailable(String),

    #[error("Research run cancelled")]
    Cancelled,

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ResearchError {
    /// Transient failures are worth retrying with backoff; everything else
    /// degrades immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            ResearchError::Timeout { .. }
            | ResearchError::RateLimited { .. }
            | ResearchError::Network { .. } => true,
            ResearchError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Fatal errors abort a research run instead of being skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResearchError::NoSources | ResearchError::ModelUnavailable(_) | ResearchError::Cancelled
        )
    }

    /// Classify a transport-level reqwest failure. The request URL is
    /// stripped from the message since query strings can carry api keys.
    pub fn from_reqwest(service: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ResearchError::Timeout {
                service: service.to_string(),
            }
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ResearchError::Network {
                service: service.to_string(),
                message: describe(&err),
            }
        } else if err.is_decode() {
            ResearchError::MalformedResponse(format!("{}: {}", service, describe(&err)))
        } else {
            ResearchError::Request {
                service: service.to_string(),
                message: describe(&err),
            }
        }
    }

    /// Consume a non-success response and classify it, keeping a bounded
    /// excerpt of the body for the message.
    pub async fn from_response(service: &str, response: reqwest::Response) -> Self {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let excerpt: String = body.chars().take(300).collect();

        Self::from_status(service, status, retry_after, excerpt)
    }

    /// Classify a non-success HTTP status returned by an external service.
    pub fn from_status(
        service: &str,
        status: reqwest::StatusCode,
        retry_after: Option<u64>,
        body: String,
    ) -> Self {
        let service = service.to_string();
        match status.as_u16() {
            429 => ResearchError::RateLimited {
                service,
                retry_after,
            },
            401 | 403 => ResearchError::Auth {
                service,
                message: body,
            },
            408 => ResearchError::Timeout { service },
            code if code >= 500 => ResearchError::Upstream {
                service,
                status: code,
                message: body,
            },
            code => ResearchError::Request {
                service,
                message: format!("status {}: {}", code, body),
            },
        }
    }
}

/// Error text followed by its source chain, e.g.
/// `error sending request: client error (Connect): tcp connect error`.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<serde_json::Error> for ResearchError {
    fn from(err: serde_json::Error) -> Self {
        ResearchError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_transient_classification() {
        assert!(
            ResearchError::Timeout {
                service: "search".to_string()
            }
            .is_transient()
        );
        assert!(
            ResearchError::from_status("llm", StatusCode::TOO_MANY_REQUESTS, Some(2), String::new())
                .is_transient()
        );
        assert!(
            ResearchError::from_status("llm", StatusCode::BAD_GATEWAY, None, String::new())
                .is_transient()
        );
    }

    #[test]
    fn test_non_transient_classification() {
        let auth = ResearchError::from_status("llm", StatusCode::UNAUTHORIZED, None, "bad key".into());
        assert!(matches!(auth, ResearchError::Auth { .. }));
        assert!(!auth.is_transient());

        let bad = ResearchError::from_status("llm", StatusCode::BAD_REQUEST, None, "oops".into());
        assert!(!bad.is_transient());
        assert!(!ResearchError::NoSources.is_transient());
    }

    #[test]
    fn test_fatal_messages_are_distinct() {
        let no_sources = ResearchError::NoSources.to_string();
        let model = ResearchError::ModelUnavailable("timeout".into()).to_string();

        assert!(no_sources.contains("No sources found"));
        assert!(model.contains("model unavailable"));
        assert!(ResearchError::NoSources.is_fatal());
        assert!(!ResearchError::EmptyContent("x".into()).is_fatal());
    }
}
