//! In-memory document store.
//!
//! Backs tests and local development with the same contract as the
//! remote store: a flat map from full path to JSON document, guarded
//! by an `RwLock`. Increments are atomic under the write lock.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::{json, Map, Value};

use super::{key, DocumentStore, StoreError};

/// Thread-safe in-memory store of path -> JSON document.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().unwrap().is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn generate_key(&self, _path: &str) -> String {
        key::push_key()
    }

    async fn write(&self, path: &str, doc: &Value) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap();
        docs.insert(path.to_string(), doc.clone());
        Ok(())
    }

    async fn update_fields(&self, path: &str, fields: &Value) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap();
        let doc = docs
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let (Value::Object(target), Value::Object(updates)) = (doc, fields) {
            for (field, value) in updates {
                target.insert(field.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let subtree = format!("{path}/");
        let mut docs = self.docs.write().unwrap();
        docs.remove(path);
        docs.retain(|stored_path, _| !stored_path.starts_with(&subtree));
        Ok(())
    }

    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let docs = self.docs.read().unwrap();
        Ok(docs.get(path).cloned())
    }

    async fn read_children_once(
        &self,
        path: &str,
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let prefix = format!("{path}/");
        let docs = self.docs.read().unwrap();
        let children = docs
            .range(prefix.clone()..)
            .take_while(|(stored_path, _)| stored_path.starts_with(&prefix))
            .filter_map(|(stored_path, doc)| {
                let child = &stored_path[prefix.len()..];
                // direct children only, not grandchildren
                if child.is_empty() || child.contains('/') {
                    None
                } else {
                    Some((child.to_string(), doc.clone()))
                }
            })
            .collect();
        Ok(children)
    }

    async fn increment_field(
        &self,
        path: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap();
        let doc = docs
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(target) = doc {
            let current = target.get(field).and_then(Value::as_i64).unwrap_or(0);
            target.insert(field.to_string(), json!(current + delta));
        }
        Ok(())
    }
}
