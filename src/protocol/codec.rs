//! Envelope <-> record conversion.
//!
//! Every decoder here has the shape `fn(&str) -> ClientResult<T>` so the
//! request executor can hold on to it and re-run it when a queued operation
//! is replayed.

use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{PrimaryKeyConfig, Schema};
use super::{
    CollectionDescriptor, CollectionEnvelope, DocumentEnvelope, DocumentPage, DocumentRecord,
    ItemsEnvelope, SyncChange, SyncEnvelope, SyncPage, DOC_ID_FIELD, RAW_FALLBACK_KEY,
};
use crate::error::{ClientError, ClientResult};

/// Decoder signature shared by the executor and the offline queue.
pub type Decoder<T> = fn(&str) -> ClientResult<T>;

fn parse_body<T: serde::de::DeserializeOwned>(body: &str, what: &str) -> ClientResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ClientError::decode(format!("Invalid {} payload: {}", what, e)))
}

fn raw_wrapped(raw: impl Into<String>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(RAW_FALLBACK_KEY.to_string(), Value::String(raw.into()));
    map
}

/// Schema arrives as a JSON string; a malformed one is kept under `_raw`.
fn decode_schema(schema: Option<Value>) -> Option<Map<String, Value>> {
    match schema? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Some(map),
            Ok(Value::Null) => None,
            _ => Some(raw_wrapped(text)),
        },
        Value::Object(map) => Some(map),
        other => Some(raw_wrapped(other.to_string())),
    }
}

/// Data arrives as a JSON string; anything that is not an object becomes `{"_raw": ...}`.
fn decode_data(data: Option<Value>) -> Map<String, Value> {
    match data {
        None | Some(Value::Null) => Map::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            _ => raw_wrapped(text),
        },
        Some(Value::Object(map)) => map,
        Some(other) => raw_wrapped(other.to_string()),
    }
}

/// Versions start at 1; anything missing, non-numeric or below 1 falls back to it.
fn decode_version(version: Option<&Value>) -> u64 {
    let parsed = match version {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 1.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.filter(|v| *v >= 1).unwrap_or(1)
}

pub fn collection_from_envelope(envelope: CollectionEnvelope) -> CollectionDescriptor {
    let primary_key = PrimaryKeyConfig {
        field: envelope.primary_key_field,
        key_type: envelope.primary_key_type,
        auto: envelope.primary_key_auto,
    };

    CollectionDescriptor {
        id: envelope.id,
        tenant_id: envelope.tenant_id,
        app_id: envelope.app_id,
        name: envelope.name,
        schema: decode_schema(envelope.schema),
        primary_key: (!primary_key.is_empty()).then_some(primary_key),
        created_at: envelope.created_at,
        updated_at: envelope.updated_at,
        deleted_at: envelope.deleted_at,
    }
}

pub fn document_from_envelope(envelope: DocumentEnvelope) -> DocumentRecord {
    let mut data = decode_data(envelope.data);

    let has_doc_id = matches!(data.get(DOC_ID_FIELD), Some(Value::String(s)) if !s.is_empty());
    if !has_doc_id {
        data.insert(DOC_ID_FIELD.to_string(), Value::String(envelope.id.clone()));
    }

    DocumentRecord {
        version: decode_version(envelope.version.as_ref()),
        id: envelope.id,
        tenant_id: envelope.tenant_id,
        collection_id: envelope.collection_id,
        primary_key_value: envelope.primary_key_value,
        primary_key_numeric: envelope.primary_key_numeric,
        data,
        created_at: envelope.created_at,
        updated_at: envelope.updated_at,
        deleted_at: envelope.deleted_at,
    }
}

// ==================== Decoders ====================

pub fn decode_collection(body: &str) -> ClientResult<CollectionDescriptor> {
    parse_body::<CollectionEnvelope>(body, "collection").map(collection_from_envelope)
}

/// Accepts a bare array or an `{items: [...]}` / `{collections: [...]}` wrapper.
pub fn decode_collection_list(body: &str) -> ClientResult<Vec<CollectionDescriptor>> {
    let value: Value = parse_body(body, "collection list")?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("items").or_else(|| obj.remove("collections")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ClientError::decode(
                    "Collection list response has no items array",
                ))
            }
        },
        _ => {
            return Err(ClientError::decode(
                "Collection list response is not an array",
            ))
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<CollectionEnvelope>(item)
                .map(collection_from_envelope)
                .map_err(|e| ClientError::decode(format!("Invalid collection payload: {}", e)))
        })
        .collect()
}

pub fn decode_document(body: &str) -> ClientResult<DocumentRecord> {
    parse_body::<DocumentEnvelope>(body, "document").map(document_from_envelope)
}

/// Bulk create response: `{items: [...]}`.
pub fn decode_document_list(body: &str) -> ClientResult<Vec<DocumentRecord>> {
    decode_document_page(body).map(|page| page.items)
}

pub fn decode_document_page(body: &str) -> ClientResult<DocumentPage> {
    let envelope: ItemsEnvelope<DocumentEnvelope> = parse_body(body, "document page")?;
    Ok(DocumentPage {
        items: envelope
            .items
            .into_iter()
            .map(document_from_envelope)
            .collect(),
        pagination: envelope.pagination.unwrap_or_default(),
    })
}

pub fn decode_sync_page(body: &str) -> ClientResult<SyncPage> {
    let envelope: SyncEnvelope = parse_body(body, "sync")?;
    Ok(SyncPage {
        items: envelope
            .items
            .into_iter()
            .map(|entry| SyncChange {
                document: document_from_envelope(entry.document),
                change_type: entry.change_type,
            })
            .collect(),
        pagination: envelope.pagination.unwrap_or_default(),
        since: envelope.since,
    })
}

/// Any JSON body, untyped.
pub fn decode_json(body: &str) -> ClientResult<Value> {
    parse_body(body, "response")
}

/// Acknowledgement bodies (delete, purge) are kept as plain JSON.
pub fn decode_ack(body: &str) -> ClientResult<Value> {
    parse_body(body, "acknowledgement")
}

// ==================== Encoders ====================

/// Schemas travel as a JSON string with unset keys dropped.
pub fn encode_schema(schema: &Schema) -> ClientResult<String> {
    serde_json::to_string(schema).map_err(ClientError::from)
}

/// Caller documents are sent as-is; only objects are accepted.
pub fn encode_document<T: Serialize + ?Sized>(document: &T) -> ClientResult<Value> {
    match serde_json::to_value(document)? {
        Value::Object(map) => Ok(Value::Object(map)),
        other => Err(ClientError::invalid_request(format!(
            "Document body must be a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
