/// Read interface to the remote document store.
///
/// Readings are stored one document per reading under
/// `{root_collection}/{local date}/readings`. The assembler only ever lists
/// such a subcollection; everything else about the store is hidden behind
/// `ReadingStore`.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Reading, SensorKind, StoreError};
use crate::sensors;

// ---------------------------------------------------------------------------
// Collection paths
// ---------------------------------------------------------------------------

/// Subcollection holding one day's readings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    pub root: String,
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
}

impl CollectionPath {
    pub fn new(root: &str, date: &str) -> Self {
        Self {
            root: root.to_string(),
            date: date.to_string(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/readings", self.root, self.date)
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// Timestamp as written by either generation of the ingestion backend: an
/// ISO-8601 string, or the store's native `{seconds, nanoseconds}` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Iso(String),
    Native { seconds: i64, nanoseconds: u32 },
}

impl RawTimestamp {
    /// Normalizes both forms to a UTC instant.
    pub fn to_instant(&self) -> Result<DateTime<Utc>, StoreError> {
        match self {
            RawTimestamp::Iso(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| StoreError::InvalidTimestamp(s.clone())),
            RawTimestamp::Native { seconds, nanoseconds } => Utc
                .timestamp_opt(*seconds, *nanoseconds)
                .single()
                .ok_or_else(|| StoreError::InvalidTimestamp(format!("{}s {}ns", seconds, nanoseconds))),
        }
    }
}

/// One reading document: a timestamp plus whatever fields the writer chose
/// to include. Non-numeric fields are carried but never read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub timestamp: RawTimestamp,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl RawReading {
    pub fn new(timestamp: RawTimestamp) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), Value::from(value));
        self
    }

    /// Value of `kind` in its display unit, through the field fallback
    /// chain: the first field present wins and is scaled, and a record
    /// carrying none of them reads as 0.
    pub fn value_for(&self, kind: SensorKind) -> f64 {
        sensors::spec_for(kind)
            .fields
            .iter()
            .find_map(|field| {
                self.fields
                    .get(field.name)
                    .and_then(Value::as_f64)
                    .map(|stored| field.apply(stored))
            })
            .unwrap_or(0.0)
    }

    /// Expands the record into one `Reading` per kind in `kinds`.
    pub fn to_readings(
        &self,
        kinds: impl IntoIterator<Item = SensorKind>,
    ) -> Result<Vec<Reading>, StoreError> {
        let timestamp = self.timestamp.to_instant()?;
        Ok(kinds
            .into_iter()
            .map(|kind| Reading::new(kind, timestamp, self.value_for(kind)))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Lists every reading document under `path`, ordered by stored
    /// timestamp. A day-document that does not exist lists as empty.
    async fn list_readings(&self, path: &CollectionPath) -> Result<Vec<RawReading>, StoreError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
