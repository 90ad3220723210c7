use tracing::{debug, info};

use super::executor::{ApiRequest, RequestExecutor};
use crate::error::{ClientError, ClientResult};
use crate::protocol::codec::{self, decode_collection, decode_collection_list};
use crate::protocol::types::Schema;
use crate::protocol::{
    CollectionDescriptor, CreateCollectionBody, PrimaryKeyConfig, UpdateCollectionBody,
};

/// Create-or-adopt logic for collections.
pub(crate) struct CollectionResolver<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> CollectionResolver<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Make sure `name` exists and return its descriptor.
    ///
    /// A 409 means it already exists: with a schema we push the schema onto
    /// the existing collection, without one we look it up by name.
    pub async fn ensure(
        &self,
        name: &str,
        schema: Option<&Schema>,
        primary_key: Option<&PrimaryKeyConfig>,
    ) -> ClientResult<CollectionDescriptor> {
        let body = CreateCollectionBody {
            name: name.to_string(),
            schema: schema.map(codec::encode_schema).transpose()?,
            app_id: self.executor.app_id().map(str::to_string),
            primary_key: primary_key.filter(|pk| !pk.is_empty()).cloned(),
        };

        let request = ApiRequest::post(["api", "collections"]).json(&body)?;

        match self
            .executor
            .execute_content(request, decode_collection)
            .await
        {
            Ok(collection) => {
                info!(collection = %collection.name, id = %collection.id, "Collection created");
                Ok(collection)
            }
            Err(e) if e.is_conflict() => {
                debug!(collection = %name, "Collection exists, adopting");
                match schema {
                    Some(schema) => self.update_schema(name, schema).await,
                    None => self.find(name).await,
                }
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_schema(
        &self,
        name: &str,
        schema: &Schema,
    ) -> ClientResult<CollectionDescriptor> {
        let body = UpdateCollectionBody {
            schema: codec::encode_schema(schema)?,
        };
        let request = ApiRequest::put(["api", "collections", name]).json(&body)?;
        let collection = self
            .executor
            .execute_content(request, decode_collection)
            .await?;
        info!(collection = %collection.name, "Collection schema updated");
        Ok(collection)
    }

    pub async fn list(&self) -> ClientResult<Vec<CollectionDescriptor>> {
        let request = ApiRequest::get(["api", "collections"]);
        Ok(self
            .executor
            .execute(request, decode_collection_list)
            .await?
            .into_option()
            .unwrap_or_default())
    }

    /// Case-insensitive lookup against the full listing.
    pub async fn find(&self, name: &str) -> ClientResult<CollectionDescriptor> {
        let wanted = name.to_lowercase();
        self.list()
            .await?
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted)
            .ok_or_else(|| ClientError::CollectionNotFound(name.to_string()))
    }
}
