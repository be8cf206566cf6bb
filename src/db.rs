use crate::config::DatabaseConfig;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Database};
use serde_json::{Map, Value};
use std::fmt;

/// A plain JSON mapping as stored in, or read back from, a collection.
pub type Document = Map<String, Value>;

/// Field name to required value. An empty filter matches every document.
pub type Filter = Map<String, Value>;

/// Identifier field the store adds to every document. Never exposed on read.
pub const ID_FIELD: &str = "_id";

/// Errors raised by the document store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No live connection to the backing store.
    Unavailable,
    /// The store was reached but the operation failed.
    Operation(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "Database not available"),
            StoreError::Operation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Operation(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Operation(format!("failed to encode document: {}", err))
    }
}

/// Single-document access to named collections.
///
/// Implementations must be constructible while the backing store is
/// unreachable; every operation then fails with [`StoreError::Unavailable`]
/// and [`DocumentStore::is_available`] reports `false`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether a live connection was established at startup.
    fn is_available(&self) -> bool;

    /// Inserts one document and returns the store-generated id.
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// Up to `limit` documents matching `filter`, in insertion order, without
    /// the internal id field.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError>;

    /// Names of the collections currently known to the store.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;
}

/// MongoDB-backed store holding one process-wide client.
pub struct MongoStore {
    client: Option<Client>,
    database: Option<Database>,
}

impl MongoStore {
    /// Connects once using `DATABASE_URL` and `DATABASE_NAME`.
    ///
    /// Never fails: a missing setting, a bad connection string or a failed
    /// ping yields a store in degraded mode.
    pub async fn connect(config: &DatabaseConfig) -> Self {
        let (Some(url), Some(name)) = (config.url.as_deref(), config.name.as_deref()) else {
            tracing::warn!(
                "DATABASE_URL or DATABASE_NAME not set, running without a database"
            );
            return Self::unavailable();
        };

        match Self::try_connect(url, name).await {
            Ok(store) => {
                tracing::info!("✓ Connected to MongoDB database '{}'", name);
                store
            }
            Err(e) => {
                tracing::warn!("Failed to connect to MongoDB, running without a database: {}", e);
                Self::unavailable()
            }
        }
    }

    async fn try_connect(url: &str, name: &str) -> Result<Self, mongodb::error::Error> {
        let mut options = ClientOptions::parse(url).await?;
        options.app_name = Some("proplift-api".to_string());

        let client = Client::with_options(options)?;
        let database = client.database(name);
        database.run_command(doc! { "ping": 1 }, None).await?;

        Ok(Self {
            client: Some(client),
            database: Some(database),
        })
    }

    /// A store with no connection.
    pub fn unavailable() -> Self {
        Self {
            client: None,
            database: None,
        }
    }

    /// Closes the client, waiting for in-flight operations to finish.
    pub async fn shutdown(&self) {
        if let Some(client) = &self.client {
            client.clone().shutdown().await;
            tracing::info!("MongoDB client shut down");
        }
    }

    fn database(&self) -> Result<&Database, StoreError> {
        self.database.as_ref().ok_or(StoreError::Unavailable)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn is_available(&self) -> bool {
        self.database.is_some()
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        let database = self.database()?;
        let document = bson::to_document(&document)?;

        let result = database
            .collection::<bson::Document>(collection)
            .insert_one(document, None)
            .await?;

        Ok(match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        })
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        let database = self.database()?;
        // MongoDB treats a zero limit as "no limit".
        if limit == 0 {
            return Ok(Vec::new());
        }

        let filter = bson::to_document(filter)?;
        let options = FindOptions::builder().limit(i64::from(limit)).build();

        let raw: Vec<bson::Document> = database
            .collection::<bson::Document>(collection)
            .find(filter, options)
            .await?
            .try_collect()
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|mut document| {
                document.remove(ID_FIELD);
                match Bson::Document(document).into_relaxed_extjson() {
                    Value::Object(map) => Some(map),
                    _ => None,
                }
            })
            .collect())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let database = self.database()?;
        Ok(database.list_collection_names(None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_settings_is_degraded() {
        let store = MongoStore::connect(&DatabaseConfig {
            url: None,
            name: Some("proplift".to_string()),
        })
        .await;
        assert!(!store.is_available());
    }

    #[tokio::test]
    async fn test_connect_with_bad_url_is_degraded() {
        let store = MongoStore::connect(&DatabaseConfig {
            url: Some("not-a-mongo-url".to_string()),
            name: Some("proplift".to_string()),
        })
        .await;
        assert!(!store.is_available());
    }

    #[tokio::test]
    async fn test_degraded_operations_fail_unavailable() {
        let store = MongoStore::unavailable();
        assert_eq!(
            store.insert("lead", Document::new()).await,
            Err(StoreError::Unavailable)
        );
        assert_eq!(
            store.find("property", &Filter::new(), 12).await,
            Err(StoreError::Unavailable)
        );
        assert_eq!(
            store.list_collections().await,
            Err(StoreError::Unavailable)
        );
        store.shutdown().await;
    }
}
