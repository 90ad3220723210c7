use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::executor::RequestExecutor;
use super::resolver::CollectionResolver;
use super::DocbaseClient;
use crate::error::ClientResult;
use crate::protocol::types::{FieldDefinition, Schema};
use crate::protocol::{CollectionDescriptor, PrimaryKeyConfig};

/// Fluent configuration for a collection, resolved against the server when
/// awaited.
///
/// ```no_run
/// # async fn run(client: docbase_client::DocbaseClient) -> docbase_client::ClientResult<()> {
/// use docbase_client::FieldDefinition;
///
/// let users = client
///     .collection("users")
///     .field("name", FieldDefinition::string().required())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CollectionBuilder {
    client: DocbaseClient,
    name: String,
    schema: Option<Schema>,
    primary_key: Option<PrimaryKeyConfig>,
}

impl CollectionBuilder {
    pub(crate) fn new(client: DocbaseClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            schema: None,
            primary_key: None,
        }
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn field(mut self, name: &str, definition: FieldDefinition) -> Self {
        self.schema
            .get_or_insert_with(Schema::new)
            .insert(name.to_string(), definition);
        self
    }

    pub fn primary_key(mut self, config: PrimaryKeyConfig) -> Self {
        self.primary_key = Some(config);
        self
    }

    /// Create the collection, or adopt it if it already exists.
    ///
    /// Safe to call repeatedly; each call re-runs the same create-or-adopt
    /// sequence with the configuration captured so far.
    pub async fn resolve(&self) -> ClientResult<Collection> {
        let executor = self.client.executor();
        let descriptor = CollectionResolver::new(executor)
            .ensure(&self.name, self.schema.as_ref(), self.primary_key.as_ref())
            .await?;
        Ok(Collection::new(executor.clone(), descriptor))
    }
}

impl IntoFuture for CollectionBuilder {
    type Output = ClientResult<Collection>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.resolve().await })
    }
}

/// A resolved collection. Document operations live in `document.rs` and
/// `query.rs`.
#[derive(Clone)]
pub struct Collection {
    pub(crate) executor: Arc<RequestExecutor>,
    name: String,
    descriptor: Arc<RwLock<CollectionDescriptor>>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Collection {
    pub(crate) fn new(executor: Arc<RequestExecutor>, descriptor: CollectionDescriptor) -> Self {
        Self {
            executor,
            name: descriptor.name.clone(),
            descriptor: Arc::new(RwLock::new(descriptor)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached descriptor from the last resolve or refresh.
    pub async fn descriptor(&self) -> CollectionDescriptor {
        self.descriptor.read().await.clone()
    }

    /// Re-read the descriptor from the server and replace the cached copy.
    pub async fn refresh(&self) -> ClientResult<CollectionDescriptor> {
        let fresh = CollectionResolver::new(&self.executor)
            .find(&self.name)
            .await?;
        *self.descriptor.write().await = fresh.clone();
        Ok(fresh)
    }

    /// Push a new schema to the server and cache the result.
    pub async fn update_schema(&self, schema: &Schema) -> ClientResult<CollectionDescriptor> {
        let updated = CollectionResolver::new(&self.executor)
            .update_schema(&self.name, schema)
            .await?;
        *self.descriptor.write().await = updated.clone();
        Ok(updated)
    }

    pub(crate) fn path<'a>(&'a self, tail: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["api", "collections", self.name.as_str()];
        segments.extend_from_slice(tail);
        segments
    }
}
