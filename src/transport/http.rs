use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

use super::{Method, Transport, TransportError, TransportRequest, TransportResponse};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| TransportError::other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn map_error(err: reqwest::Error) -> TransportError {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            TransportError::network(format!("HTTP request failed: {}", err))
        } else {
            TransportError::other(format!("HTTP request failed: {}", err))
        }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::other(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::other(format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url);

        if let Some(body) = request.body {
            if !headers.contains_key(CONTENT_TYPE) {
                let content_type = HeaderValue::from_str(body.content_type())
                    .map_err(|_| TransportError::other("Invalid content type"))?;
                headers.insert(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.as_bytes().to_vec());
        }

        let response = builder
            .headers(headers)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = response.text().await.map_err(Self::map_error)?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(str::to_string),
            headers: response_headers,
            body,
        })
    }
}
