//! Common test utilities for client tests
//!
//! Provides:
//! - A scripted transport that records every request
//! - Wire payload builders for collections and documents
//! - Client construction against the mock

#![allow(dead_code)]

use async_trait::async_trait;
use docbase_client::{
    Collection, DocbaseClient, Transport, TransportError, TransportRequest, TransportResponse,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://db.test";
pub const API_KEY: &str = "test-key";
pub const TS: &str = "2024-05-01T10:00:00Z";

enum Scripted {
    Response(TransportResponse),
    Error(TransportError),
}

/// Replays scripted replies in order and records what was sent.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
    yields: bool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Suspends inside every `send`, so concurrent callers interleave.
    pub fn yielding() -> Arc<Self> {
        Arc::new(Self {
            yields: true,
            ..Self::default()
        })
    }

    pub fn respond(&self, status: u16, body: Value) -> &Self {
        self.respond_raw(status, &body.to_string())
    }

    pub fn respond_raw(&self, status: u16, body: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(TransportResponse::new(status, body)));
        self
    }

    pub fn respond_empty(&self, status: u16) -> &Self {
        self.respond_raw(status, "")
    }

    pub fn fail_network(&self, message: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(TransportError::network(message)));
        self
    }

    pub fn fail_other(&self, message: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(TransportError::other(message)));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        if self.yields {
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Error(error)) => Err(error),
            None => Err(TransportError::other("mock transport has no scripted reply")),
        }
    }
}

pub fn client(mock: &Arc<MockTransport>, offline: bool) -> DocbaseClient {
    DocbaseClient::builder(BASE_URL)
        .api_key(API_KEY)
        .offline(offline)
        .transport(mock.clone())
        .build()
        .expect("Failed to build client")
}

pub fn collection_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "tenant_id": "tenant-1",
        "name": name,
        "created_at": TS,
        "updated_at": TS
    })
}

pub fn collection_with_schema_json(id: &str, name: &str, schema: &Value) -> Value {
    let mut c = collection_json(id, name);
    c["schema"] = Value::String(schema.to_string());
    c
}

/// Document envelope with `data` string-encoded, as the server sends it.
pub fn document_json(id: &str, data: Value) -> Value {
    json!({
        "id": id,
        "tenant_id": "tenant-1",
        "collection_id": "col-1",
        "data": data.to_string(),
        "version": 1,
        "created_at": TS,
        "updated_at": TS
    })
}

/// Resolve `name` against the mock with a scripted 201.
pub async fn resolved_collection(
    client: &DocbaseClient,
    mock: &Arc<MockTransport>,
    name: &str,
) -> Collection {
    mock.respond(201, collection_json("col-1", name));
    client
        .collection(name)
        .resolve()
        .await
        .expect("Failed to resolve collection")
}

pub fn body_json(request: &TransportRequest) -> Value {
    serde_json::from_str(request.json_body().expect("request has no JSON body"))
        .expect("request body is not JSON")
}
