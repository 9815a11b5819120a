/// Document database operations.
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use log::info;

use mongodb::bson::{doc, Document};
use mongodb::options::{Acknowledgment, InsertManyOptions, WriteConcern};
use mongodb::{Client, Collection, Database};

/// Acknowledgment level requested for an insert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteAck {
    /// Server default.
    #[default]
    Default,

    /// Acknowledged by a majority of the replica set.
    Majority,
}

/// The collection operations the pipeline needs from a document database.
///
/// Every pipeline function takes the store as a parameter, so tests can run
/// against `MemoryStore` instead of a live server.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Count from collection metadata, may be stale.
    async fn estimated_count(&self, collection: &str) -> Result<u64>;

    /// Whether at least one document has `field` set.
    async fn has_field(&self, collection: &str, field: &str) -> Result<bool>;

    /// Delete all documents, return how many were deleted.
    async fn clear(&self, collection: &str) -> Result<u64>;

    /// Insert `docs` in order, never replacing an existing document.
    ///
    /// Return the number of inserted documents.
    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
        ack: WriteAck,
    ) -> Result<usize>;

    /// All documents of the collection.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>>;
}

/// `mongodb` backed store.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;

        info!("connected to mongodb, db: {}", db_name);

        Ok(Self {
            db: client.database(db_name),
        })
    }

    #[inline]
    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

    fn insert_options(ack: WriteAck) -> InsertManyOptions {
        let mut options = InsertManyOptions::default();
        options.ordered = Some(true);

        if ack == WriteAck::Majority {
            let mut write_concern = WriteConcern::default();
            write_concern.w = Some(Acknowledgment::Majority);
            options.write_concern = Some(write_concern);
        }

        options
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn estimated_count(&self, collection: &str) -> Result<u64> {
        self.collection(collection)
            .estimated_document_count(None)
            .await
            .map_err(|e| e.into())
    }

    async fn has_field(&self, collection: &str, field: &str) -> Result<bool> {
        let mut filter = Document::new();
        filter.insert(field, doc! { "$exists": true });

        let found = self.collection(collection).find_one(filter, None).await?;

        Ok(found.is_some())
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        let res = self.collection(collection).delete_many(doc! {}, None).await?;
        Ok(res.deleted_count)
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
        ack: WriteAck,
    ) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let res = self
            .collection(collection)
            .insert_many(docs, Self::insert_options(ack))
            .await?;

        Ok(res.inserted_ids.len())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let cursor = self.collection(collection).find(None, None).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;

        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_insert_options() {
        let options = MongoStore::insert_options(WriteAck::Majority);

        assert_eq!(options.ordered, Some(true));
        assert_eq!(
            options.write_concern.and_then(|w| w.w),
            Some(Acknowledgment::Majority)
        );
    }

    #[test]
    fn test_default_insert_options() {
        let options = MongoStore::insert_options(WriteAck::Default);
        assert!(options.write_concern.is_none());
    }
}
