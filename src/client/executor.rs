use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::protocol::codec::Decoder;
use crate::sync::{OfflineQueue, QueuedOperation};
use crate::transport::{Method, RequestBody, Transport, TransportRequest};

/// A call described relative to the base endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, Option<String>)>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    queueable: bool,
}

impl ApiRequest {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            queueable: false,
        }
    }

    pub fn get<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Post, segments)
    }

    pub fn put<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Put, segments)
    }

    pub fn patch<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Patch, segments)
    }

    pub fn delete<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Delete, segments)
    }

    /// Undefined (`None`) parameters are left out of the URL.
    pub fn query(mut self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        self.query.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn query_pairs(mut self, pairs: Vec<(String, Option<String>)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_string(body)?));
        Ok(self)
    }

    /// Binary or form payloads, sent unmodified.
    pub fn raw(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    /// Allow this call to be captured for replay if it fails offline.
    pub fn queueable(mut self) -> Self {
        self.queueable = true;
        self
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Successful outcome of a call: a decoded body or an explicit lack of one.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Content(T),
    NoContent,
}

impl<T> Reply<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Reply::Content(value) => Some(value),
            Reply::NoContent => None,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, Reply::NoContent)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ExecutorConfig {
    pub base_url: Url,
    pub api_key: String,
    pub app_id: Option<String>,
    pub api_key_header: String,
    pub app_id_header: String,
    pub offline: bool,
}

/// Turns [`ApiRequest`]s into transport calls and is the only place that
/// feeds the offline queue.
pub(crate) struct RequestExecutor {
    transport: Arc<dyn Transport>,
    config: ExecutorConfig,
    offline: AtomicBool,
    queue: OfflineQueue,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, config: ExecutorConfig) -> Self {
        Self {
            transport,
            offline: AtomicBool::new(config.offline),
            config,
            queue: OfflineQueue::new(),
        }
    }

    pub fn app_id(&self) -> Option<&str> {
        self.config.app_id.as_deref()
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, enabled: bool) {
        self.offline.store(enabled, Ordering::SeqCst);
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    fn build_url(&self, request: &ApiRequest) -> ClientResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::invalid_request("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(request.segments.iter());

        let defined: Vec<(&str, &str)> = request
            .query
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect();
        if !defined.is_empty() {
            url.query_pairs_mut().extend_pairs(defined);
        }
        Ok(url)
    }

    fn build_headers(&self, request: &ApiRequest) -> Vec<(String, String)> {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            (
                self.config.api_key_header.clone(),
                self.config.api_key.clone(),
            ),
        ];
        if let Some(app_id) = &self.config.app_id {
            headers.push((self.config.app_id_header.clone(), app_id.clone()));
        }
        if let Some(body) = &request.body {
            headers.push(("content-type".to_string(), body.content_type().to_string()));
        }
        headers.extend(request.headers.iter().cloned());
        headers
    }

    pub fn build(&self, request: &ApiRequest) -> ClientResult<TransportRequest> {
        Ok(TransportRequest {
            method: request.method,
            url: self.build_url(request)?.to_string(),
            headers: self.build_headers(request),
            body: request.body.clone(),
        })
    }

    /// Issue a call and decode its reply.
    ///
    /// HTTP failures are returned as [`ClientError::Api`] and never queued.
    /// A network failure on a queueable write while offline mode is on is
    /// captured once into the offline queue and reported as
    /// [`ClientError::Queued`].
    pub async fn execute<T: 'static>(
        &self,
        request: ApiRequest,
        decode: Decoder<T>,
    ) -> ClientResult<Reply<T>> {
        let transport_request = self.build(&request)?;
        let method = request.method;
        let path = request.path();

        let capture = (request.queueable && method.is_write()).then(|| transport_request.clone());

        debug!(method = %method, url = %transport_request.url, "Sending request");

        let response = match self.transport.send(transport_request).await {
            Ok(response) => response,
            Err(e) => {
                return match capture {
                    Some(captured) if e.is_network() && self.is_offline() => {
                        let op = QueuedOperation::new(
                            captured,
                            Arc::new(move |body: &str| decode(body).map(drop)),
                        );
                        warn!(
                            method = %method,
                            path = %path,
                            error = %e,
                            "Network failure, operation queued"
                        );
                        self.queue.enqueue(op.clone()).await;
                        Err(ClientError::Queued(op))
                    }
                    _ => Err(ClientError::Network(e)),
                };
            }
        };

        debug!(method = %method, path = %path, status = response.status, "Response received");

        if !response.is_success() {
            return Err(ClientError::from_response(
                response.status,
                response.status_text.as_deref(),
                &response.body,
            ));
        }

        if response.has_no_content() {
            return Ok(Reply::NoContent);
        }

        decode(&response.body).map(Reply::Content)
    }

    /// Like [`execute`](Self::execute) but a body is mandatory.
    pub async fn execute_content<T: 'static>(
        &self,
        request: ApiRequest,
        decode: Decoder<T>,
    ) -> ClientResult<T> {
        let method = request.method;
        let path = request.path();
        self.execute(request, decode)
            .await?
            .into_option()
            .ok_or_else(|| ClientError::EmptyResponse {
                method: method.to_string(),
                path,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::transport::{TransportError, TransportResponse};

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            Err(TransportError::network("connection refused"))
        }
    }

    fn executor(base: &str, app_id: Option<&str>) -> RequestExecutor {
        RequestExecutor::new(
            Arc::new(Unreachable),
            ExecutorConfig {
                base_url: Url::parse(base).unwrap(),
                api_key: "key-123".to_string(),
                app_id: app_id.map(str::to_string),
                api_key_header: "x-api-key".to_string(),
                app_id_header: "x-app-id".to_string(),
                offline: false,
            },
        )
    }

    #[test]
    fn test_url_joins_segments_and_skips_undefined_query() {
        let exec = executor("https://db.example.com/", None);
        let request = ApiRequest::get(["api", "collections", "my users", "documents"])
            .query("limit", Some(10))
            .query("offset", None::<u64>)
            .query("include_deleted", Some(true));
        let built = exec.build(&request).unwrap();
        assert_eq!(
            built.url,
            "https://db.example.com/api/collections/my%20users/documents\
             ?limit=10&include_deleted=true"
        );
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let exec = executor("https://example.com/v2", None);
        let built = exec.build(&ApiRequest::get(["api", "collections"])).unwrap();
        assert_eq!(built.url, "https://example.com/v2/api/collections");
    }

    #[test]
    fn test_headers_carry_api_key_and_app_scope() {
        let exec = executor("https://db.example.com", Some("app-1"));
        let request = ApiRequest::post(["api", "collections"])
            .json(&serde_json::json!({"name": "users"}))
            .unwrap();
        let built = exec.build(&request).unwrap();
        assert_eq!(built.header("x-api-key"), Some("key-123"));
        assert_eq!(built.header("x-app-id"), Some("app-1"));
        assert_eq!(built.header("content-type"), Some("application/json"));

        let exec = executor("https://db.example.com", None);
        let built = exec.build(&ApiRequest::get(["api"])).unwrap();
        assert_eq!(built.header("x-app-id"), None);
        assert_eq!(built.header("content-type"), None);
    }

    #[test]
    fn test_raw_body_passes_through() {
        let exec = executor("https://db.example.com", None);
        let request =
            ApiRequest::post(["upload"]).raw("application/octet-stream", vec![0, 159, 146]);
        let built = exec.build(&request).unwrap();
        assert_eq!(built.header("content-type"), Some("application/octet-stream"));
        assert_eq!(built.body.unwrap().as_bytes().to_vec(), vec![0u8, 159, 146]);
    }

    #[tokio::test]
    async fn test_network_failure_not_queued_when_online() {
        let exec = executor("https://db.example.com", None);
        let request = ApiRequest::post(["api", "x"]).queueable();
        let err = exec
            .execute(request, crate::protocol::codec::decode_ack)
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert!(exec.queue().is_empty().await);
    }
}
