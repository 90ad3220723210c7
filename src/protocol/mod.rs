//! Wire envelopes and the typed records decoded from them.
//!
//! The server nests JSON inside JSON: a collection's `schema` and a
//! document's `data` travel as JSON-encoded strings. The envelopes here mirror
//! the wire exactly; [`codec`] turns them into [`CollectionDescriptor`] and
//! [`DocumentRecord`].

pub mod codec;
pub mod query;
pub mod types;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};
pub use types::{Pagination, PrimaryKeyConfig};

/// Key under which unparseable nested JSON is preserved verbatim.
pub const RAW_FALLBACK_KEY: &str = "_raw";

/// Field inside `data` mirroring the record id.
pub const DOC_ID_FIELD: &str = "_doc_id";

/// Ids may arrive as strings or numbers.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Numeric key form: numbers or numeric strings; anything else reads as absent.
fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    })
}

// ==================== Wire envelopes ====================

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEnvelope {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub tenant_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub app_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub primary_key_field: Option<String>,
    #[serde(default)]
    pub primary_key_type: Option<types::PrimaryKeyType>,
    #[serde(default)]
    pub primary_key_auto: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEnvelope {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub tenant_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub collection_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub primary_key_value: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub primary_key_numeric: Option<f64>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncEntryEnvelope {
    pub document: DocumentEnvelope,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncEnvelope {
    #[serde(default = "Vec::new")]
    pub items: Vec<SyncEntryEnvelope>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub since: Option<String>,
}

// ==================== Request bodies ====================

#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKeyConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCollectionBody {
    pub schema: String,
}

// ==================== Typed records ====================

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDescriptor {
    pub id: String,
    pub tenant_id: Option<String>,
    pub app_id: Option<String>,
    pub name: String,
    /// Parsed schema object; `{"_raw": "..."}` when the server sent invalid JSON.
    pub schema: Option<Map<String, Value>>,
    pub primary_key: Option<PrimaryKeyConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CollectionDescriptor {
    /// Schema entries that parse as field definitions.
    pub fn fields(&self) -> types::Schema {
        self.schema
            .as_ref()
            .map(types::typed_schema)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub tenant_id: Option<String>,
    pub collection_id: Option<String>,
    pub primary_key_value: Option<String>,
    pub primary_key_numeric: Option<f64>,
    /// Always an object; carries [`DOC_ID_FIELD`].
    pub data: Map<String, Value>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn doc_id(&self) -> Option<&str> {
        self.data.get(DOC_ID_FIELD).and_then(Value::as_str)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Deserialize `data` into an application type.
    pub fn data_as<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(ClientError::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncChange {
    pub document: DocumentRecord,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub items: Vec<DocumentRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPage {
    pub items: Vec<SyncChange>,
    pub pagination: Pagination,
    /// Server watermark to pass back as `since` on the next call.
    pub since: Option<String>,
}
