//! HTTP transport abstraction.
//!
//! The client never talks to the network directly: every call goes through a
//! [`Transport`], which takes a fully built request and hands back the raw
//! response. The default implementation is [`HttpTransport`] (reqwest); hosts
//! and tests can plug in their own.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Substrings that mark a transport failure as a connectivity problem.
const NETWORK_ERROR_PATTERNS: &[&str] = &[
    "network",
    "failed to fetch",
    "connection refused",
    "connection reset",
    "connection closed",
    "timed out",
    "timeout",
    "dns",
    "unreachable",
    "econnrefused",
    "econnreset",
    "enotfound",
    "offline",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Writes are the only calls eligible for offline queuing.
    pub fn is_write(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload. JSON bodies are already serialized; raw bodies are sent untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(String),
    Raw {
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl RequestBody {
    pub fn content_type(&self) -> &str {
        match self {
            RequestBody::Json(_) => "application/json",
            RequestBody::Raw { content_type, .. } => content_type,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RequestBody::Json(text) => text.as_bytes(),
            RequestBody::Raw { bytes, .. } => bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 JSON text, if it is a JSON body.
    pub fn json_body(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Json(text)) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: None,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 204/205 or a blank body.
    pub fn has_no_content(&self) -> bool {
        self.status == 204 || self.status == 205 || self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// No response was received (connectivity, DNS, timeout).
    Network,
    Other,
}

/// A failure below HTTP: no status code was ever received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Other,
            message: message.into(),
        }
    }

    /// Whether this failure qualifies for offline queuing.
    pub fn is_network(&self) -> bool {
        if self.kind == TransportErrorKind::Network {
            return true;
        }
        let message = self.message.to_lowercase();
        NETWORK_ERROR_PATTERNS.iter().any(|p| message.contains(p))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Issues a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
