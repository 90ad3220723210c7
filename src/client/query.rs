use super::executor::ApiRequest;
use super::Collection;
use crate::error::ClientResult;
use crate::protocol::codec::{decode_document_page, decode_sync_page};
use crate::protocol::query::{ListOptions, QueryRequest, SyncOptions};
use crate::protocol::{DocumentPage, SyncPage};

impl Collection {
    pub async fn list(&self, options: &ListOptions) -> ClientResult<DocumentPage> {
        let request =
            ApiRequest::get(self.path(&["documents"])).query_pairs(options.query_pairs());
        Ok(self
            .executor
            .execute(request, decode_document_page)
            .await?
            .into_option()
            .unwrap_or_default())
    }

    /// Structured filter/sort/pagination query. A read, so never queued.
    pub async fn query(&self, query: &QueryRequest) -> ClientResult<DocumentPage> {
        let request = ApiRequest::post(self.path(&["query"])).json(query)?;
        Ok(self
            .executor
            .execute(request, decode_document_page)
            .await?
            .into_option()
            .unwrap_or_default())
    }

    /// Changes since a timestamp or cursor, tagged upsert/delete.
    pub async fn sync(&self, options: &SyncOptions) -> ClientResult<SyncPage> {
        let request = ApiRequest::get(self.path(&["sync"])).query_pairs(options.query_pairs());
        Ok(self
            .executor
            .execute(request, decode_sync_page)
            .await?
            .into_option()
            .unwrap_or_default())
    }
}
