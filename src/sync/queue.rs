//! In-memory FIFO of writes that failed while offline.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::transport::{Method, RequestBody, Transport, TransportRequest};

/// Runs the typed decoder against a replayed response, discarding the value.
pub type ResponseCheck = Arc<dyn Fn(&str) -> ClientResult<()> + Send + Sync>;

/// A captured write, ready to be re-issued byte for byte.
#[derive(Clone)]
pub struct QueuedOperation {
    pub id: Uuid,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub queued_at: DateTime<Utc>,
    check: ResponseCheck,
}

impl QueuedOperation {
    pub(crate) fn new(request: TransportRequest, check: ResponseCheck) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
            queued_at: Utc::now(),
            check,
        }
    }

    pub fn to_request(&self) -> TransportRequest {
        TransportRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Re-issue the captured request and run its decoder on the reply.
    async fn replay(&self, transport: &dyn Transport) -> ClientResult<()> {
        let response = transport.send(self.to_request()).await?;

        if !response.is_success() {
            return Err(ClientError::from_response(
                response.status,
                response.status_text.as_deref(),
                &response.body,
            ));
        }

        if response.has_no_content() {
            return Ok(());
        }

        (self.check)(&response.body)
    }
}

impl fmt::Debug for QueuedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedOperation")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("queued_at", &self.queued_at)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for QueuedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Ordered list of pending writes, owned by one client.
///
/// Enqueue and dequeue each take the list lock for a single step; a second
/// lock keeps at most one flush running, so a replay never races another
/// replay of the same head.
#[derive(Default)]
pub struct OfflineQueue {
    operations: Mutex<VecDeque<QueuedOperation>>,
    flushing: Mutex<()>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, operation: QueuedOperation) {
        let mut ops = self.operations.lock().await;
        ops.push_back(operation);
        debug!(pending = ops.len(), "Operation queued");
    }

    pub async fn len(&self) -> usize {
        self.operations.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.operations.lock().await.is_empty()
    }

    /// Snapshot of the queue, head first.
    pub async fn snapshot(&self) -> Vec<QueuedOperation> {
        self.operations.lock().await.iter().cloned().collect()
    }

    /// Drop every pending operation, returning how many were discarded.
    pub async fn clear(&self) -> usize {
        let _flush = self.flushing.lock().await;
        let mut ops = self.operations.lock().await;
        let dropped = ops.len();
        ops.clear();
        dropped
    }

    /// Replay queued operations head first until the queue is empty.
    ///
    /// Stops at the first failure, leaving the failed operation (and
    /// everything behind it) in place. Returns the number replayed.
    pub async fn flush(&self, transport: &dyn Transport) -> ClientResult<usize> {
        let _flush = self.flushing.lock().await;
        let mut replayed = 0;

        loop {
            let head = match self.operations.lock().await.front() {
                Some(op) => op.clone(),
                None => break,
            };

            if let Err(e) = head.replay(transport).await {
                warn!(operation = %head, error = %e, "Replay failed, flush aborted");
                return Err(e);
            }

            let mut ops = self.operations.lock().await;
            if ops.front().map(|op| op.id) == Some(head.id) {
                ops.pop_front();
            }
            replayed += 1;
        }

        if replayed > 0 {
            info!(replayed, "Offline queue flushed");
        }
        Ok(replayed)
    }
}
