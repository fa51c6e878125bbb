use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::filter::Filter;
use crate::types::{Collection, Document, ID_FIELD};

use super::store::{
    with_id, DeleteResult, DocumentStore, InsertOneResult, StoreError, Update, UpdateResult,
};

/// In-process document store with the same semantics as `PgStore`.
/// Backs the test suite and `--in-memory` local runs.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<(Uuid, Document)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|(id, doc)| filter.matches(id, doc))
                    .map(|(id, doc)| with_id(doc.clone(), *id))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|rows| {
            rows.iter()
                .find(|(id, doc)| filter.matches(id, doc))
                .map(|(id, doc)| with_id(doc.clone(), *id))
        }))
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        doc.remove(ID_FIELD);
        let id = Uuid::new_v4();
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push((id, doc));
        debug!("Inserted {} into {}", id, collection);
        Ok(InsertOneResult::new(id))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        // Held across match and write so concurrent $inc calls never interleave
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection).or_default();

        if let Some((_, doc)) = rows.iter_mut().find(|(id, doc)| filter.matches(id, doc)) {
            let mut next = doc.clone();
            let modified = update.apply(&mut next)?;
            *doc = next;
            return Ok(UpdateResult::matched(modified));
        }

        if !upsert {
            return Ok(UpdateResult::unmatched());
        }

        let id = filter.pinned_id().unwrap_or_else(Uuid::new_v4);
        let mut doc = filter.seed_document();
        update.apply(&mut doc)?;
        rows.push((id, doc));
        debug!("Upserted {} into {}", id, collection);
        Ok(UpdateResult::upserted(id))
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };
        match rows.iter().position(|(id, doc)| filter.matches(id, doc)) {
            Some(index) => {
                rows.remove(index);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
