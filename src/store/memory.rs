//! In-memory store implementations.
//!
//! These back the test suite and offline experimentation with the same trait
//! surface as the REST clients. Collections are ordered maps, so store
//! iteration order is ascending key order - the same ordering the hosted
//! database exposes - and push keys are generated so that creation order and
//! key order coincide.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{Error, Result};
use crate::store::{BlobStore, DocumentStore};

/// Ordered in-memory document tree.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
    push_counter: AtomicU64,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row directly, bypassing the trait. Test setup helper.
    pub fn seed(&self, path: &str, key: &str, value: Value) {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_tree(&self, path: &str) -> Result<Option<Value>> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(map) = collections.get(path) {
            if map.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )));
        }

        // No exact collection: gather one level of nested child collections,
        // e.g. get_tree("BoM") assembles {"ModelA": {...}, "ModelB": {...}}.
        let prefix = format!("{path}/");
        let mut tree = serde_json::Map::new();
        for (child_path, map) in collections.range(prefix.clone()..) {
            let Some(child_key) = child_path.strip_prefix(&prefix) else {
                break;
            };
            tree.insert(
                child_key.to_string(),
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            );
        }

        if tree.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Value::Object(tree)))
        }
    }

    async fn get(&self, path: &str, key: &str) -> Result<Option<Value>> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(collections.get(path).and_then(|map| map.get(key)).cloned())
    }

    async fn query_from(
        &self,
        path: &str,
        start: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, Value)>> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let Some(map) = collections.get(path) else {
            return Ok(Vec::new());
        };

        let rows = match start {
            // Inclusive start, matching the remote range API.
            Some(cursor) => map.range(cursor.to_string()..),
            None => map.range(String::new()..),
        };

        Ok(rows
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn put(&self, path: &str, key: &str, value: Value) -> Result<()> {
        self.seed(path, key, value);
        Ok(())
    }

    async fn delete(&self, path: &str, key: &str) -> Result<()> {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(collection) = collections.get_mut(path) {
            collection.remove(key);
        }
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String> {
        // Zero-padded counter keys sort in creation order, like remote push keys.
        let n = self.push_counter.fetch_add(1, Ordering::SeqCst);
        let key = format!("-P{n:010}");
        self.seed(path, &key, value);
        Ok(key)
    }
}

/// In-memory blob store issuing `memory://` download URLs.
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, (String, Bytes)>>,
    base: String,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            base: "memory://blobs".to_string(),
        }
    }
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob exists at `key`. Test assertion helper.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.contains_key(key)
    }

    /// Raw bytes stored at `key`, if any. Test assertion helper.
    #[must_use]
    pub fn bytes_at(&self, key: &str) -> Option<Bytes> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.get(key).map(|(_, bytes)| bytes.clone())
    }

    fn key_from_url(&self, url: &str) -> Result<String> {
        url.strip_prefix(&format!("{}/", self.base))
            .and_then(|rest| rest.strip_suffix("?alt=media"))
            .map(ToString::to_string)
            .ok_or_else(|| Error::remote(format!("URL not served by this store: {url}")))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(format!("{}/{}?alt=media", self.base, key))
    }

    async fn download_url(&self, key: &str) -> Result<String> {
        Ok(format!("{}/{}?alt=media", self.base, key))
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let key = self.key_from_url(url)?;
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(&key)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| Error::remote(format!("no blob at key {key}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::remote(format!("no blob at key {key}")))
    }
}
