//! Gateway error taxonomy.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors produced by [`ApiClient`](super::ApiClient).
///
/// `Clone` so that a single failed network call can be handed to every
/// caller that joined the same deduplicated read.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, reset, TLS, body read).
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Non-2xx response. `message` is the backend's `message` field when it
    /// sent one, otherwise `HTTP <status>`.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Human-readable message.
        message: String,
        /// Parsed (or text-wrapped) response body.
        body: Value,
    },

    /// A 2xx body could not be decoded into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(Arc<serde_json::Error>),

    /// A request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(Arc<serde_json::Error>),

    /// A header name or value was not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The task running a shared read panicked or was cancelled.
    #[error("request task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    /// Build the error for a non-success response.
    ///
    /// A JSON body (by content type) is kept as-is. Anything else, including
    /// JSON that fails to parse, is wrapped as `{"message": <text>}`; an empty
    /// body is wrapped with the status' canonical reason.
    #[must_use]
    pub fn from_response(status: StatusCode, content_type: Option<&str>, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            json!({ "message": status.canonical_reason().unwrap_or_default() })
        } else if content_type.is_some_and(is_json_content_type) {
            serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }))
        } else {
            json!({ "message": text })
        };

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string);

        Self::Http {
            status: status.as_u16(),
            message,
            body,
        }
    }

    /// HTTP status for `Http` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        Self::Decode(Arc::new(err))
    }

    pub(crate) fn encode(err: serde_json::Error) -> Self {
        Self::Encode(Arc::new(err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(Arc::new(err))
    }
}

/// `true` for `application/json` and `+json` media types.
pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media == "application/json" || media.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_message_is_surfaced() {
        let err = ApiError::from_response(
            StatusCode::NOT_FOUND,
            Some("application/json"),
            r#"{"message":"not found"}"#,
        );
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_plain_text_body_becomes_message() {
        let err = ApiError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("text/plain"),
            "database exploded",
        );
        assert_eq!(err.to_string(), "database exploded");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_empty_body_uses_status_text() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, None, "");
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn test_malformed_json_is_text_wrapped() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            Some("application/json; charset=utf-8"),
            "{oops",
        );
        assert_eq!(err.to_string(), "{oops");
        if let ApiError::Http { body, .. } = err {
            assert_eq!(body, json!({ "message": "{oops" }));
        }
    }

    #[test]
    fn test_json_without_message_falls_back_to_status() {
        let err = ApiError::from_response(
            StatusCode::UNAUTHORIZED,
            Some("application/json"),
            r#"{"error":"expired"}"#,
        );
        assert_eq!(err.to_string(), "HTTP 401");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_json_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=UTF-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html"));
    }
}
