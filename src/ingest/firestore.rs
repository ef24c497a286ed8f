/// Firestore REST client
///
/// Lists a day's reading subcollection through the Firestore v1 REST API
/// and decodes Firestore's typed field values into `RawReading`s.
///
/// API Documentation: https://firebase.google.com/docs/firestore/reference/rest
/// List endpoint: GET {base}/projects/{p}/databases/(default)/documents/{path}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::ingest::store::{CollectionPath, RawReading, RawTimestamp, ReadingStore};
use crate::logging::{self, Component};
use crate::model::StoreError;

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Documents requested per page.
const PAGE_SIZE: u32 = 300;

// ============================================================================
// Firestore API Response Structures
// ============================================================================

/// Response of a `documents.list` call
#[derive(Debug, Deserialize)]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<FirestoreDocument>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Single document; every field value is a one-key typed object such as
/// `{"doubleValue": 21.5}` or `{"integerValue": "42"}`.
#[derive(Debug, Deserialize)]
pub struct FirestoreDocument {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

// ============================================================================
// API Client
// ============================================================================

pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn new(base_url: &str, project_id: &str, api_key: Option<&str>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key: api_key.map(String::from),
        })
    }

    /// Document URL of a reading subcollection.
    pub fn collection_url(&self, path: &CollectionPath) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, path
        )
    }

    async fn fetch_page(
        &self,
        path: &CollectionPath,
        page_token: Option<&str>,
    ) -> Result<Option<ListDocumentsResponse>, StoreError> {
        let mut query: Vec<(&str, String)> = vec![
            ("orderBy", "timestamp".to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let response = self
            .client
            .get(self.collection_url(path))
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        parse_list_response(&body).map(Some)
    }
}

#[async_trait]
impl ReadingStore for FirestoreStore {
    async fn list_readings(&self, path: &CollectionPath) -> Result<Vec<RawReading>, StoreError> {
        let mut readings = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let Some(page) = self.fetch_page(path, page_token.as_deref()).await? else {
                break;
            };
            let context = path.to_string();
            readings.extend(
                page.documents
                    .into_iter()
                    .filter_map(|doc| decode_document(doc, &context)),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(readings)
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Parses a `documents.list` response body.
pub fn parse_list_response(body: &str) -> Result<ListDocumentsResponse, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Parse(e.to_string()))
}

/// Converts one document into a `RawReading`. Documents without a usable
/// `timestamp` field are skipped with a warning.
pub fn decode_document(doc: FirestoreDocument, context: &str) -> Option<RawReading> {
    let timestamp = match doc.fields.get("timestamp").and_then(decode_timestamp) {
        Some(ts) => ts,
        None => {
            logging::warn(
                Component::Store,
                Some(context),
                &format!("document {} has no usable timestamp; skipped", doc.name),
            );
            return None;
        }
    };

    let mut reading = RawReading::new(timestamp);
    for (name, typed) in &doc.fields {
        if name == "timestamp" {
            continue;
        }
        if let Some(value) = decode_number(typed) {
            reading = reading.with_field(name, value);
        }
    }
    Some(reading)
}

fn decode_timestamp(typed: &Value) -> Option<RawTimestamp> {
    typed
        .get("timestampValue")
        .or_else(|| typed.get("stringValue"))
        .and_then(Value::as_str)
        .map(|s| RawTimestamp::Iso(s.to_string()))
}

/// Numeric value of a typed field. `integerValue` arrives as a decimal
/// string; `nullValue` and non-numeric types yield `None`.
fn decode_number(typed: &Value) -> Option<f64> {
    if let Some(v) = typed.get("doubleValue") {
        return v.as_f64();
    }
    if let Some(v) = typed.get("integerValue") {
        return match v {
            Value::String(s) => s.parse::<i64>().ok().map(|n| n as f64),
            other => other.as_f64(),
        };
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
