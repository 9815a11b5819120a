use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::db::{DocumentStore, WriteAck};

/// In process store with the same append semantics as `MongoStore`.
///
/// Documents without `_id` get a fresh `ObjectId` on insert, like the driver does.
/// Every `insert_many` call is recorded with its document count and acknowledgment.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    inserts: Mutex<Vec<(String, usize, WriteAck)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collections<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<Document>>) -> T,
    ) -> Result<T> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|e| anyhow!("memory store lock poisoned: {}", e))?;

        Ok(f(&mut guard))
    }

    /// `(documents, ack)` of each `insert_many` call on `collection`, in call order.
    pub fn insert_calls(&self, collection: &str) -> Result<Vec<(usize, WriteAck)>> {
        let guard = self
            .inserts
            .lock()
            .map_err(|e| anyhow!("memory store lock poisoned: {}", e))?;

        Ok(guard
            .iter()
            .filter(|(name, _, _)| name == collection)
            .map(|&(_, n, ack)| (n, ack))
            .collect())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn estimated_count(&self, collection: &str) -> Result<u64> {
        self.with_collections(|c| c.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn has_field(&self, collection: &str, field: &str) -> Result<bool> {
        self.with_collections(|c| {
            c.get(collection)
                .map_or(false, |docs| docs.iter().any(|d| d.contains_key(field)))
        })
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        self.with_collections(|c| {
            c.get_mut(collection)
                .map_or(0, |docs| docs.drain(..).count() as u64)
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
        ack: WriteAck,
    ) -> Result<usize> {
        self.inserts
            .lock()
            .map_err(|e| anyhow!("memory store lock poisoned: {}", e))?
            .push((collection.to_string(), docs.len(), ack));

        self.with_collections(|c| {
            let target = c.entry(collection.to_string()).or_default();
            let n = docs.len();

            for mut doc in docs {
                if !doc.contains_key("_id") {
                    doc.insert("_id", ObjectId::new());
                }
                target.push(doc);
            }

            n
        })
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.with_collections(|c| c.get(collection).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_insert_and_count() -> Result<()> {
        let store = MemoryStore::new();

        assert_eq!(store.estimated_count("a").await?, 0);
        assert!(!store.has_field("a", "x").await?);

        let n = store
            .insert_many("a", vec![doc! { "x": 1 }, doc! { "y": 2 }], WriteAck::Default)
            .await?;

        assert_eq!(n, 2);
        assert_eq!(store.estimated_count("a").await?, 2);
        assert!(store.has_field("a", "x").await?);
        assert!(store.has_field("a", "_id").await?);
        assert!(!store.has_field("a", "z").await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_clear() -> Result<()> {
        let store = MemoryStore::new();
        store
            .insert_many("a", vec![doc! { "x": 1 }], WriteAck::Default)
            .await?;

        assert_eq!(store.clear("a").await?, 1);
        assert_eq!(store.estimated_count("a").await?, 0);
        assert_eq!(store.clear("missing").await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_calls() -> Result<()> {
        let store = MemoryStore::new();

        store
            .insert_many("a", vec![doc! { "x": 1 }, doc! { "x": 2 }], WriteAck::Majority)
            .await?;
        store.insert_many("b", vec![doc! { "y": 1 }], WriteAck::Default).await?;
        store.insert_many("a", vec![], WriteAck::Default).await?;

        assert_eq!(
            store.insert_calls("a")?,
            vec![(2, WriteAck::Majority), (0, WriteAck::Default)]
        );
        assert_eq!(store.insert_calls("b")?, vec![(1, WriteAck::Default)]);
        assert!(store.insert_calls("missing")?.is_empty());

        Ok(())
    }
}
