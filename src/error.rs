use serde_json::Value;
use thiserror::Error;

use crate::sync::QueuedOperation;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<Value>,
    },

    #[error("Network error: {0}")]
    Network(TransportError),

    #[error("Operation queued for offline replay: {0}")]
    Queued(QueuedOperation),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Empty response for {method} {path}")]
    EmptyResponse { method: String, path: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operation on '{id}' failed: {source}")]
    Batch {
        id: String,
        #[source]
        source: Box<ClientError>,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Network(err)
    }
}

impl ClientError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Build a protocol error from an HTTP status and the (possibly empty) response body.
    ///
    /// The message, code and details are pulled from the usual error shapes
    /// (`{"error": "..."}`, `{"error": {"message", "code", "details"}}`,
    /// `{"message", "code", "details"}`). When nothing usable is present the
    /// status text stands in for the message.
    pub fn from_response(status: u16, status_text: Option<&str>, body: &str) -> Self {
        let fallback = || {
            status_text
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    reqwest::StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("HTTP {}", status))
        };

        let parsed = serde_json::from_str::<Value>(body)
            .ok()
            .filter(Value::is_object);

        let Some(parsed) = parsed else {
            return Self::Api {
                status,
                message: fallback(),
                code: None,
                details: None,
            };
        };

        let nested = parsed.get("error").filter(|e| e.is_object());

        let message = parsed
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| nested.and_then(|e| e.get("message")).and_then(Value::as_str))
            .or_else(|| parsed.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(fallback);

        let code = parsed
            .get("code")
            .or_else(|| nested.and_then(|e| e.get("code")))
            .and_then(|c| match c {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        let details = parsed
            .get("details")
            .or_else(|| nested.and_then(|e| e.get("details")))
            .filter(|d| !d.is_null())
            .cloned();

        Self::Api {
            status,
            message,
            code,
            details,
        }
    }

    /// Innermost error, looking through batch wrappers.
    pub fn root(&self) -> &ClientError {
        match self {
            Self::Batch { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status if this is a protocol error.
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::CollectionNotFound(_)) || self.status_code() == Some(404)
    }

    pub fn is_network(&self) -> bool {
        matches!(self.root(), Self::Network(e) if e.is_network())
    }

    /// True when the write was accepted for later replay rather than failing.
    pub fn is_queued(&self) -> bool {
        matches!(self.root(), Self::Queued(_))
    }

    pub fn queued_operation(&self) -> Option<&QueuedOperation> {
        match self.root() {
            Self::Queued(op) => Some(op),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_with_nested_error_object() {
        let body = json!({
            "error": {
                "message": "name is required",
                "code": "VALIDATION",
                "details": {"field": "name"}
            }
        })
        .to_string();
        match ClientError::from_response(422, None, &body) {
            ClientError::Api {
                status,
                message,
                code,
                details,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "name is required");
                assert_eq!(code.as_deref(), Some("VALIDATION"));
                assert_eq!(details, Some(json!({"field": "name"})));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_body_with_flat_fields() {
        let body = json!({"error": "Collection exists", "code": 409}).to_string();
        let err = ClientError::from_response(409, None, &body);
        assert!(err.is_conflict());
        match err {
            ClientError::Api { message, code, .. } => {
                assert_eq!(message, "Collection exists");
                assert_eq!(code.as_deref(), Some("409"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let body = json!({"message": "slow down"}).to_string();
        match ClientError::from_response(429, None, &body) {
            ClientError::Api { message, .. } => assert_eq!(message, "slow down"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_falls_back_to_status_text() {
        match ClientError::from_response(503, None, "<html>bad gateway</html>") {
            ClientError::Api { message, code, .. } => {
                assert_eq!(message, "Service Unavailable");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match ClientError::from_response(500, Some("Kaboom"), "") {
            ClientError::Api { message, .. } => assert_eq!(message, "Kaboom"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_batch_wrapper_is_transparent_to_helpers() {
        let err = ClientError::Batch {
            id: "doc-3".to_string(),
            source: Box::new(ClientError::from_response(404, None, "")),
        };
        assert_eq!(err.status_code(), Some(404));
        assert!(err.is_not_found());
        assert!(!err.is_queued());
        assert!(err.to_string().contains("doc-3"));
    }
}
