//! HTTP-backed store implementations.
//!
//! `RestDocumentStore` speaks the hosted database's REST dialect: every
//! subtree is addressable as `{base}/{path}.json`, range queries use
//! `orderBy`/`startAt`/`limitToFirst`, and POST generates push keys. A read
//! of a missing path returns HTTP 200 with a JSON `null`, which surfaces
//! here as `None` rather than an error.
//!
//! `RestBlobStore` follows the object-storage URL contract
//! `{storageBaseUrl}/{urlEncodedKey}?alt=media`.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::{Error, Result};
use crate::store::{BlobStore, DocumentStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the shared HTTP client used by both REST stores.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(Into::into)
}

fn encode_key(key: &str) -> String {
    url::form_urlencoded::byte_serialize(key.as_bytes()).collect()
}

/// Document store client over the hosted database's REST API.
#[derive(Debug)]
pub struct RestDocumentStore {
    client: reqwest::Client,
    base: String,
}

impl RestDocumentStore {
    /// Creates a client for the database rooted at `base_url`.
    ///
    /// # Errors
    /// Returns `Error::Config` when `base_url` is not a valid absolute URL.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid database URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn tree_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base, path)
    }

    fn child_url(&self, path: &str, key: &str) -> String {
        format!("{}/{}/{}.json", self.base, path, encode_key(key))
    }

    async fn get_value(&self, url: &str, query: &[(&str, String)]) -> Result<Option<Value>> {
        let value: Value = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn get_tree(&self, path: &str) -> Result<Option<Value>> {
        self.get_value(&self.tree_url(path), &[]).await
    }

    async fn get(&self, path: &str, key: &str) -> Result<Option<Value>> {
        self.get_value(&self.child_url(path, key), &[]).await
    }

    async fn query_from(
        &self,
        path: &str,
        start: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, Value)>> {
        // The remote API requires JSON-quoted parameter values.
        let mut query: Vec<(&str, String)> = vec![
            ("orderBy", "\"$key\"".to_string()),
            ("limitToFirst", limit.to_string()),
        ];
        if let Some(cursor) = start {
            query.push(("startAt", format!("\"{cursor}\"")));
        }

        let tree = self.get_value(&self.tree_url(path), &query).await?;
        let Some(Value::Object(map)) = tree else {
            return Ok(Vec::new());
        };

        // The response is an object; re-sort by key so the page order matches
        // the query's $key ordering regardless of serialization order.
        let mut rows: Vec<(String, Value)> = map.into_iter().collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }

    async fn put(&self, path: &str, key: &str, value: Value) -> Result<()> {
        self.client
            .put(self.child_url(path, key))
            .json(&value)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, path: &str, key: &str) -> Result<()> {
        self.client
            .delete(self.child_url(path, key))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct PushResponse {
            name: String,
        }

        let response: PushResponse = self
            .client
            .post(self.tree_url(path))
            .json(&value)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.name)
    }
}

/// Blob store client over the hosted object storage's public endpoint.
#[derive(Debug)]
pub struct RestBlobStore {
    client: reqwest::Client,
    base: String,
}

impl RestBlobStore {
    /// Creates a client for the bucket rooted at `base_url`.
    ///
    /// # Errors
    /// Returns `Error::Config` when `base_url` is not a valid absolute URL.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid storage URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base, encode_key(key))
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        self.client
            .post(self.object_url(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        self.download_url(key).await
    }

    async fn download_url(&self, key: &str) -> Result<String> {
        Ok(format!("{}?alt=media", self.object_url(key)))
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
            .map_err(Into::into)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete(self.object_url(key))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn doc_store() -> RestDocumentStore {
        RestDocumentStore::new(build_client().unwrap(), "https://db.example.com/").unwrap()
    }

    #[test]
    fn test_tree_and_child_urls() {
        let store = doc_store();
        assert_eq!(
            store.tree_url("Parts"),
            "https://db.example.com/Parts.json"
        );
        assert_eq!(
            store.child_url("BoM/ModelA", "MAT-001"),
            "https://db.example.com/BoM/ModelA/MAT-001.json"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = RestDocumentStore::new(build_client().unwrap(), "not a url");
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }

    #[test]
    fn test_blob_download_url_shape() {
        let store =
            RestBlobStore::new(build_client().unwrap(), "https://files.example.com/bucket")
                .unwrap();
        assert_eq!(
            store.object_url("APP0001.png"),
            "https://files.example.com/bucket/APP0001.png"
        );
    }

    #[test]
    fn test_key_encoding() {
        assert_eq!(encode_key("APP0001.png"), "APP0001.png");
        assert_eq!(encode_key("parts/PC-100.png"), "parts%2FPC-100.png");
    }
}
