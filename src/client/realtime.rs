use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Collection;
use crate::error::ClientResult;
use crate::protocol::query::Filter;
use crate::protocol::SyncChange;

/// What a subscriber needs to open a change stream for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRequest {
    pub collection: String,
    pub collection_id: String,
    pub app_id: Option<String>,
    pub filter: Option<Filter>,
}

/// Push-based change delivery, supplied by the host application.
///
/// This crate ships no implementation; the pull-based
/// [`Collection::sync`] feed covers the same changes.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn subscribe(
        &self,
        request: SubscriptionRequest,
    ) -> ClientResult<mpsc::Receiver<SyncChange>>;
}

impl Collection {
    pub async fn subscribe(
        &self,
        transport: &dyn RealtimeTransport,
        filter: Option<Filter>,
    ) -> ClientResult<mpsc::Receiver<SyncChange>> {
        let descriptor = self.descriptor().await;
        transport
            .subscribe(SubscriptionRequest {
                collection: descriptor.name,
                collection_id: descriptor.id,
                app_id: self.executor.app_id().map(str::to_string),
                filter,
            })
            .await
    }
}
