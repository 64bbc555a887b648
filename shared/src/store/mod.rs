//! Document store abstraction.
//!
//! All durable state lives in an external hierarchical document database.
//! Documents are JSON objects addressed by slash-separated paths that
//! alternate collection and document ids. Writes are last-writer-wins.

mod firestore;
mod memory;
pub mod paths;

use std::fmt;
use std::future::Future;

use serde_json::Value;

pub use firestore::{FirestoreStore, ServiceAccount};
pub use memory::MemoryStore;

use crate::{Error, Result};

const MAX_SEGMENT_BYTES: usize = 128;

/// Validated path to a document or collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn root(collection: &str) -> Result<Self> {
        validate_segment(collection)?;
        Ok(Self(collection.to_string()))
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> Result<Self> {
        validate_segment(segment)?;
        Ok(Self(format!("{}/{}", self.0, segment)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment: the document id for document paths.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.len() > MAX_SEGMENT_BYTES
    {
        return Err(Error::Validation(format!("Invalid document id: {:?}", segment)));
    }
    Ok(())
}

/// A document returned from a collection listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Hierarchical JSON document storage.
pub trait DocumentStore: Send + Sync {
    /// Read a document; `None` when it does not exist.
    fn get(&self, path: &DocPath) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Replace the whole document, creating it if needed.
    fn set(&self, path: &DocPath, data: &Value) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite only the top-level fields present in `data`, creating the document if needed.
    fn merge(&self, path: &DocPath, data: &Value) -> impl Future<Output = Result<()>> + Send;

    /// Direct child documents of a collection.
    fn list(&self, collection: &DocPath) -> impl Future<Output = Result<Vec<Document>>> + Send;
}

/// Read a document and deserialize it.
pub async fn get_as<S, T>(store: &S, path: &DocPath) -> Result<Option<T>>
where
    S: DocumentStore,
    T: serde::de::DeserializeOwned,
{
    match store.get(path).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

fn require_object<'a>(path: &DocPath, data: &'a Value) -> Result<&'a serde_json::Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| Error::Store(format!("Document {} must be a JSON object", path)))
}
