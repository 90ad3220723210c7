mod builder;
mod collection;
mod document;
mod executor;
mod query;
mod realtime;
mod resolver;

pub use builder::{DocbaseClientBuilder, DEFAULT_API_KEY_HEADER, DEFAULT_APP_ID_HEADER};
pub use collection::{Collection, CollectionBuilder};
pub use executor::{ApiRequest, Reply};
pub(crate) use executor::RequestExecutor;
pub use realtime::{RealtimeTransport, SubscriptionRequest};

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::error::ClientResult;
use crate::protocol::codec::decode_json;
use crate::protocol::CollectionDescriptor;
use crate::sync::QueuedOperation;
use resolver::CollectionResolver;

/// Handle to a remote document database.
///
/// Cheap to clone; clones share the same transport and offline queue.
#[derive(Clone)]
pub struct DocbaseClient {
    executor: Arc<RequestExecutor>,
}

impl DocbaseClient {
    pub fn builder(base_url: &str) -> DocbaseClientBuilder {
        DocbaseClientBuilder::new(base_url)
    }

    pub(crate) fn from_executor(executor: RequestExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    pub(crate) fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Start resolving a collection. Configure it, then `.await` it (or call
    /// [`CollectionBuilder::resolve`]) to create or adopt it on the server.
    pub fn collection(&self, name: &str) -> CollectionBuilder {
        CollectionBuilder::new(self.clone(), name)
    }

    pub async fn list_collections(&self) -> ClientResult<Vec<CollectionDescriptor>> {
        CollectionResolver::new(&self.executor).list().await
    }

    /// Send a request the typed API doesn't cover, relative to the base URL.
    ///
    /// Same header, error and offline-queue handling as every other call;
    /// a queueable write that fails offline comes back as
    /// [`ClientError::Queued`](crate::ClientError::Queued).
    pub async fn execute(&self, request: ApiRequest) -> ClientResult<Reply<Value>> {
        self.executor.execute(request, decode_json).await
    }

    pub fn is_offline(&self) -> bool {
        self.executor.is_offline()
    }

    pub fn set_offline(&self, enabled: bool) {
        self.executor.set_offline(enabled);
    }

    /// Replay queued writes in order. Stops at, and returns, the first failure.
    pub async fn flush(&self) -> ClientResult<usize> {
        self.executor
            .queue()
            .flush(self.executor.transport())
            .await
    }

    pub async fn pending_count(&self) -> usize {
        self.executor.queue().len().await
    }

    pub async fn pending_operations(&self) -> Vec<QueuedOperation> {
        self.executor.queue().snapshot().await
    }

    /// Forget every queued write without sending it.
    pub async fn discard_pending(&self) -> usize {
        let dropped = self.executor.queue().clear().await;
        if dropped > 0 {
            info!(dropped, "Discarded queued operations");
        }
        dropped
    }
}
