//! In-process [`DocumentStore`] used by the test suites.

use crate::db::{Document, DocumentStore, Filter, StoreError, ID_FIELD};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Keeps every collection as an insertion-ordered `Vec` of documents.
pub struct MemoryStore {
    available: bool,
    fail_list_collections: bool,
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            available: true,
            fail_list_collections: false,
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Behaves like a store that could not connect at startup.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Connected, but the collections query fails.
    pub fn with_failing_collections() -> Self {
        Self {
            fail_list_collections: true,
            ..Self::new()
        }
    }

    /// Number of documents in a collection, for assertions.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Inserts a document as-is, bypassing validation.
    pub async fn seed(&self, collection: &str, document: Value) {
        if let Value::Object(map) = document {
            self.collections
                .write()
                .await
                .entry(collection.to_string())
                .or_default()
                .push(map);
        }
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

fn matches(document: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<String, StoreError> {
        self.ensure_available()?;

        let id = ObjectId::new().to_hex();
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        self.ensure_available()?;

        let guard = self.collections.read().await;
        let Some(documents) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|document| matches(document, filter))
            .take(limit as usize)
            .map(|document| {
                let mut document = document.clone();
                document.remove(ID_FIELD);
                document
            })
            .collect())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_available()?;
        if self.fail_list_collections {
            return Err(StoreError::Operation(
                "not authorized on proplift to execute command { listCollections: 1 }"
                    .to_string(),
            ));
        }

        Ok(self.collections.read().await.keys().cloned().collect())
    }
}
