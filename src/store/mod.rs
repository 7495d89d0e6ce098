//! Store layer - Trait seams over the hosted document store and blob store.
//!
//! Every persistent operation in this crate is a single remote read or write
//! delegated to these two collaborators. The traits capture exactly the
//! primitives the hosted services offer; notably the blob store has no rename,
//! which is why image re-homing (copy, repoint, delete) exists at all.

/// In-memory store implementations backing tests and offline use
pub mod memory;
/// HTTP-backed store implementations over the hosted services
pub mod rest;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::errors::Result;

pub use memory::{MemoryBlobStore, MemoryDocumentStore};
pub use rest::{RestBlobStore, RestDocumentStore};

/// Collection paths - the wire contract with the hosted document store.
pub mod paths {
    /// Base parts dataset, refreshed by external import
    pub const BASE_PARTS: &str = "material_summary_2025";
    /// Admin overrides, also the source collection for pagination
    pub const PART_OVERRIDES: &str = "Parts";
    /// Bill-of-materials subtrees, one child collection per model
    pub const BOM: &str = "BoM";
    /// Part applications, keyed by identifier
    pub const APPLICATIONS: &str = "PartApplications";
}

/// Hosted hierarchical key-value database with ordered range queries.
///
/// `path` arguments are slash-separated collection paths relative to the
/// store root, e.g. `"Parts"` or `"BoM/ModelA_2025"`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads an entire subtree. `None` when the path holds nothing.
    async fn get_tree(&self, path: &str) -> Result<Option<Value>>;

    /// Reads a single child value by key. `None` when absent.
    async fn get(&self, path: &str, key: &str) -> Result<Option<Value>>;

    /// Key-ordered range query with an *inclusive* start key - the remote
    /// API offers no exclusive-start variant, so cursor consumers must drop
    /// the boundary row themselves. Returns at most `limit` entries in store
    /// iteration order.
    async fn query_from(
        &self,
        path: &str,
        start: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, Value)>>;

    /// Writes an entire value under `path/key`, replacing what was there.
    async fn put(&self, path: &str, key: &str, value: Value) -> Result<()>;

    /// Removes the value under `path/key`. Removing an absent key succeeds.
    async fn delete(&self, path: &str, key: &str) -> Result<()>;

    /// Appends `value` under a store-generated, time-ordered unique key and
    /// returns that key.
    async fn push(&self, path: &str, value: Value) -> Result<String>;
}

/// Hosted object storage addressed by string keys.
///
/// Offers upload, download-URL issuance, raw fetch, and delete - and nothing
/// else. No rename, no copy, no listing.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads bytes under `key` and returns the blob's download URL.
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    /// Resolves the download URL for `key` without touching the blob.
    async fn download_url(&self, key: &str) -> Result<String>;

    /// Fetches the raw bytes behind a previously issued download URL.
    async fn fetch(&self, url: &str) -> Result<Bytes>;

    /// Deletes the blob at `key`. Deleting a missing blob is an error the
    /// caller may choose to swallow.
    async fn delete(&self, key: &str) -> Result<()>;
}
