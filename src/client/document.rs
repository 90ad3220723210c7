use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::executor::ApiRequest;
use super::Collection;
use crate::error::{ClientError, ClientResult};
use crate::protocol::codec::{self, decode_ack, decode_document, decode_document_list};
use crate::protocol::DocumentRecord;

impl Collection {
    pub async fn get(&self, id: &str) -> ClientResult<DocumentRecord> {
        let request = ApiRequest::get(self.path(&["documents", id]));
        self.executor.execute_content(request, decode_document).await
    }

    /// Look a document up by its configured primary-key value.
    pub async fn get_by_key(&self, key: &str) -> ClientResult<DocumentRecord> {
        let request = ApiRequest::get(self.path(&["documents", "by-key", key]));
        self.executor.execute_content(request, decode_document).await
    }

    pub async fn create<T: Serialize + ?Sized>(
        &self,
        document: &T,
    ) -> ClientResult<DocumentRecord> {
        let body = codec::encode_document(document)?;
        let request = ApiRequest::post(self.path(&["documents"]))
            .json(&body)?
            .queueable();
        self.executor.execute_content(request, decode_document).await
    }

    /// Bulk insert through `/documents/bulk`. An empty slice makes no call.
    pub async fn create_many<T: Serialize>(
        &self,
        documents: &[T],
    ) -> ClientResult<Vec<DocumentRecord>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let body = documents
            .iter()
            .map(codec::encode_document)
            .collect::<ClientResult<Vec<Value>>>()?;
        let request = ApiRequest::post(self.path(&["documents", "bulk"]))
            .json(&body)?
            .queueable();

        debug!(collection = %self.name(), count = body.len(), "Bulk create");
        self.executor
            .execute_content(request, decode_document_list)
            .await
    }

    /// Replace the whole document.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        id: &str,
        document: &T,
    ) -> ClientResult<DocumentRecord> {
        let body = codec::encode_document(document)?;
        let request = ApiRequest::put(self.path(&["documents", id]))
            .json(&body)?
            .queueable();
        self.executor.execute_content(request, decode_document).await
    }

    /// Merge the given fields into the document.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        id: &str,
        changes: &T,
    ) -> ClientResult<DocumentRecord> {
        let body = codec::encode_document(changes)?;
        let request = ApiRequest::patch(self.path(&["documents", id]))
            .json(&body)?
            .queueable();
        self.executor.execute_content(request, decode_document).await
    }

    /// Soft delete.
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let request = ApiRequest::delete(self.path(&["documents", id])).queueable();
        self.executor.execute(request, decode_ack).await?;
        Ok(())
    }

    /// Deletes one id at a time. Earlier deletes stay applied when a later one fails.
    pub async fn delete_many(&self, ids: &[&str]) -> ClientResult<()> {
        for id in ids {
            self.delete(id).await.map_err(|e| ClientError::Batch {
                id: id.to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Permanently remove a document.
    pub async fn purge(&self, id: &str) -> ClientResult<()> {
        let request = ApiRequest::delete(self.path(&["documents", id, "purge"]))
            .query("confirm", Some(true))
            .queueable();
        self.executor.execute(request, decode_ack).await?;
        Ok(())
    }

    pub async fn purge_many(&self, ids: &[&str]) -> ClientResult<()> {
        for id in ids {
            self.purge(id).await.map_err(|e| ClientError::Batch {
                id: id.to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}
