//! In-process document store.

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{require_object, DocPath, Document, DocumentStore};
use crate::Result;

/// Document store kept in memory; same semantics as the Firestore store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        Ok(self.docs.read().await.get(path.as_str()).cloned())
    }

    async fn set(&self, path: &DocPath, data: &Value) -> Result<()> {
        require_object(path, data)?;
        self.docs
            .write()
            .await
            .insert(path.as_str().to_string(), data.clone());
        Ok(())
    }

    async fn merge(&self, path: &DocPath, data: &Value) -> Result<()> {
        let fields = require_object(path, data)?;
        let mut docs = self.docs.write().await;
        let doc = docs
            .entry(path.as_str().to_string())
            .or_insert_with(|| Value::Object(Default::default()));

        if let Value::Object(existing) = doc {
            for (key, value) in fields {
                existing.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn list(&self, collection: &DocPath) -> Result<Vec<Document>> {
        let prefix = format!("{}/", collection.as_str());
        let docs = self.docs.read().await;

        Ok(docs
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(key, data)| Document {
                id: key[prefix.len()..].to_string(),
                data: data.clone(),
            })
            .collect())
    }
}
