//! Document-store adapter backed by MongoDB.
//!
//! No pooling of our own: one shared logical client, created lazily and
//! reused for the life of the process. Request-level ordering on that shared
//! client is whatever the driver's internal queuing provides.
//!
//! Schema is implicit, so `initialize` is a no-op beyond connecting, and
//! `health_check` (a `ping` command) is equivalent to the connection
//! succeeding; there is no independent lightweight probe.

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::db::DbError;
use crate::db::adapter::ItemStore;
use crate::db::retry::{RetryPolicy, with_retries};
use crate::db::types::{Item, ItemId, NewItem};

/// Collection holding the one record shape a generated backend stores.
const ITEMS_COLLECTION: &str = "items";

/// Wire shape of an item document.
#[derive(Debug, Serialize, Deserialize)]
struct ItemDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<ItemDocument> for Item {
    fn from(doc: ItemDocument) -> Self {
        Item {
            // ObjectIds are unique and roughly monotonic, rendered as hex.
            id: ItemId::Str(doc.id.map(|oid| oid.to_hex()).unwrap_or_default()),
            name: doc.name,
            description: doc.description,
        }
    }
}

/// Single-client document adapter.
pub struct DocumentAdapter {
    uri: String,
    database: String,
    client: OnceCell<Client>,
}

impl DocumentAdapter {
    /// Create an adapter without performing any I/O.
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            client: OnceCell::new(),
        }
    }

    /// Return the existing client or construct one from configuration.
    /// Idempotent; the driver connects lazily on first operation.
    async fn client(&self) -> Result<&Client, DbError> {
        self.client
            .get_or_try_init(|| async {
                Client::with_uri_str(&self.uri)
                    .await
                    .map_err(DbError::connection)
            })
            .await
    }

    async fn items(&self) -> Result<Collection<ItemDocument>, DbError> {
        let client = self.client().await?;
        Ok(client
            .database(&self.database)
            .collection::<ItemDocument>(ITEMS_COLLECTION))
    }

    /// One server round trip through the shared client.
    async fn ping(&self) -> Result<(), DbError> {
        let client = self.client().await?;
        client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn parse_id(id: &str) -> Result<ObjectId, DbError> {
        ObjectId::parse_str(id).map_err(|_| DbError::InvalidId(id.to_string()))
    }
}

#[async_trait::async_trait]
impl ItemStore for DocumentAdapter {
    fn engine_name(&self) -> &'static str {
        "mongo"
    }

    /// Connect-only: there is no schema to create. The retry budget still
    /// applies so a containerized server gets its startup window.
    async fn initialize(&self, policy: RetryPolicy) -> Result<(), DbError> {
        let attempts = policy.max_attempts.max(1);

        with_retries(policy, "mongo-connect", || self.ping())
            .await
            .map_err(|last| DbError::InitExhausted {
                attempts,
                last: Box::new(last),
            })?;

        tracing::info!(database = %self.database, "document store is ready");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DbError> {
        self.ping().await
    }

    async fn list_items(&self) -> Result<Vec<Item>, DbError> {
        let docs: Vec<ItemDocument> = self
            .items()
            .await?
            .find(Document::new())
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(docs.into_iter().map(Item::from).collect())
    }

    async fn create_item(&self, new: NewItem) -> Result<Item, DbError> {
        let collection = self.items().await?;
        let mut document = ItemDocument {
            id: None,
            name: new.name,
            description: new.description,
        };

        let result = collection.insert_one(&document).await?;
        document.id = result.inserted_id.as_object_id();

        Ok(document.into())
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>, DbError> {
        let oid = Self::parse_id(id)?;
        let found = self
            .items()
            .await?
            .find_one(doc! { "_id": oid })
            .await?;

        Ok(found.map(Item::from))
    }

    async fn delete_item(&self, id: &str) -> Result<bool, DbError> {
        let oid = Self::parse_id(id)?;
        let result = self
            .items()
            .await?
            .delete_one(doc! { "_id": oid })
            .await?;

        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_object_id_is_rejected() {
        match DocumentAdapter::parse_id("definitely-not-an-oid") {
            Err(DbError::InvalidId(id)) => assert_eq!(id, "definitely-not-an-oid"),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn test_item_document_wire_shape() {
        let oid = ObjectId::new();
        let doc = ItemDocument {
            id: Some(oid),
            name: "Widget".into(),
            description: None,
        };

        let item: Item = doc.into();
        assert_eq!(item.id, ItemId::Str(oid.to_hex()));
        assert_eq!(item.name, "Widget");
        assert_eq!(item.description, None);
    }

    #[test]
    fn test_new_document_skips_unset_id() {
        let doc = ItemDocument {
            id: None,
            name: "Widget".into(),
            description: Some("blue".into()),
        };
        let bson = mongodb::bson::to_document(&doc).unwrap();
        assert!(!bson.contains_key("_id"));
        assert_eq!(bson.get_str("name").unwrap(), "Widget");
    }
}
