//! REST client for the remote document store.
//!
//! Documents are addressed as `{base}/{path}.json`: `PUT` replaces,
//! `PATCH` merges top-level fields, `DELETE` removes, `GET` reads
//! (`null` body means "nothing there"). Counter increments use the
//! store's server-value sentinel so they apply atomically server-side.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use super::{key, DocumentStore, StoreError};

/// HTTP adapter for a keyed JSON document database.
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RestStore {
    /// Creates a store client for the given base URL, e.g.
    /// `https://flashdeck.example.com`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Attaches an auth token sent as the `auth` query parameter.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Builds the URL for a document path.
    fn node_url(&self, path: &str) -> String {
        let mut url = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }

    /// Maps a non-success response to `StoreError::Rejected`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl DocumentStore for RestStore {
    fn generate_key(&self, _path: &str) -> String {
        key::push_key()
    }

    async fn write(&self, path: &str, doc: &Value) -> Result<(), StoreError> {
        let response = self.http.put(self.node_url(path)).json(doc).send().await?;
        Self::check(response).await?;
        tracing::debug!(path, "document written");
        Ok(())
    }

    async fn update_fields(&self, path: &str, fields: &Value) -> Result<(), StoreError> {
        let response = self
            .http
            .patch(self.node_url(path))
            .json(fields)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::debug!(path, "document fields updated");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let response = self.http.delete(self.node_url(path)).send().await?;
        Self::check(response).await?;
        tracing::debug!(path, "document removed");
        Ok(())
    }

    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let response = self.http.get(self.node_url(path)).send().await?;
        let doc: Value = Self::check(response).await?.json().await?;
        Ok(match doc {
            Value::Null => None,
            doc => Some(doc),
        })
    }

    async fn read_children_once(
        &self,
        path: &str,
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let response = self.http.get(self.node_url(path)).send().await?;
        let doc: Value = Self::check(response).await?.json().await?;
        Ok(match doc {
            Value::Object(children) => children.into_iter().collect(),
            // null or anything non-object means no children
            _ => BTreeMap::new(),
        })
    }

    async fn increment_field(
        &self,
        path: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        let sentinel = json!({ field: { ".sv": { "increment": delta } } });
        let response = self
            .http
            .patch(self.node_url(path))
            .json(&sentinel)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
