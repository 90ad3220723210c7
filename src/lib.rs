//! Docbase Rust Client
//!
//! HTTP client for the Docbase multi-tenant document database, with an
//! optional in-memory offline queue for writes.
//!
//! # Example
//!
//! ```no_run
//! use docbase_client::{DocbaseClient, FieldDefinition, Filter, QueryRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docbase_client::ClientError> {
//!     let client = DocbaseClient::builder("https://api.docbase.example")
//!         .api_key("sk_live_...")
//!         .build()?;
//!
//!     let users = client
//!         .collection("users")
//!         .field("name", FieldDefinition::string().required())
//!         .await?;
//!
//!     let doc = users.create(&json!({"name": "Sambo"})).await?;
//!     println!("Created {} (v{})", doc.id, doc.version);
//!
//!     let page = users
//!         .query(&QueryRequest::new().filter(Filter::eq("name", "Sambo")).limit(10))
//!         .await?;
//!     println!("Found {}", page.items.len());
//!     Ok(())
//! }
//! ```
//!
//! # Offline Example
//!
//! ```no_run
//! use docbase_client::DocbaseClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docbase_client::ClientError> {
//!     let client = DocbaseClient::builder("https://api.docbase.example")
//!         .api_key("sk_live_...")
//!         .offline(true)
//!         .build()?;
//!     let notes = client.collection("notes").await?;
//!
//!     match notes.create(&json!({"title": "written on a plane"})).await {
//!         Ok(doc) => println!("Saved {}", doc.id),
//!         Err(e) if e.is_queued() => println!("Saved for later"),
//!         Err(e) => return Err(e),
//!     }
//!
//!     // Later, once connectivity is back:
//!     client.flush().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod sync;
pub mod transport;

pub use client::{
    ApiRequest, Collection, CollectionBuilder, DocbaseClient, DocbaseClientBuilder,
    RealtimeTransport, Reply, SubscriptionRequest,
};
pub use error::{ClientError, ClientResult};
pub use protocol::query::{
    Filter, ListOptions, Operator, QueryRequest, SortDirection, SortSpec, SyncOptions,
};
pub use protocol::types::{
    schema, FieldDefinition, FieldType, Pagination, PrimaryKeyConfig, PrimaryKeyType, Schema,
};
pub use protocol::{
    ChangeType, CollectionDescriptor, DocumentPage, DocumentRecord, SyncChange, SyncPage,
    DOC_ID_FIELD, RAW_FALLBACK_KEY,
};
pub use sync::QueuedOperation;
pub use transport::{
    HttpTransport, Method, RequestBody, Transport, TransportError, TransportErrorKind,
    TransportRequest, TransportResponse,
};
