/// Development mode utilities for working without the live store
///
/// When the document store is unreachable (offline development, CI, demo
/// laptops), load captured day-documents from JSON and serve them through the
/// same `ReadingStore` interface the assembler uses in production.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::ingest::store::{CollectionPath, RawReading, ReadingStore};
use crate::model::StoreError;

/// In-memory replay of reading subcollections.
#[derive(Default)]
pub struct ReplayStore {
    collections: BTreeMap<CollectionPath, Vec<RawReading>>,
    /// Paths that answer with an outage instead of data.
    unavailable: BTreeSet<CollectionPath>,
    /// Every path listed so far, in call order.
    requests: Mutex<Vec<CollectionPath>>,
}

impl ReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a capture of the form `{"YYYY-MM-DD": [raw reading, ...], ...}`
    /// under one root collection.
    pub fn from_json(root: &str, body: &str) -> Result<Self, StoreError> {
        let days: BTreeMap<String, Vec<RawReading>> =
            serde_json::from_str(body).map_err(|e| StoreError::Parse(e.to_string()))?;

        let mut store = Self::new();
        for (date, readings) in days {
            for reading in readings {
                store.insert(CollectionPath::new(root, &date), reading);
            }
        }
        Ok(store)
    }

    pub fn insert(&mut self, path: CollectionPath, reading: RawReading) {
        self.collections.entry(path).or_default().push(reading);
    }

    /// Makes every listing of `path` fail, simulating a store outage.
    pub fn mark_unavailable(&mut self, path: CollectionPath) {
        self.unavailable.insert(path);
    }

    pub fn requested_paths(&self) -> Vec<CollectionPath> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReadingStore for ReplayStore {
    async fn list_readings(&self, path: &CollectionPath) -> Result<Vec<RawReading>, StoreError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.clone());
        }
        if self.unavailable.contains(path) {
            return Err(StoreError::Request(format!("replay store marked {} unavailable", path)));
        }

        let mut readings = self.collections.get(path).cloned().unwrap_or_default();
        // Unparseable timestamps sort first, as the live store orders them by raw value.
        readings.sort_by_key(|r| r.timestamp.to_instant().ok());
        Ok(readings)
    }
}
