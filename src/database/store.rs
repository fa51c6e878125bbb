use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{lookup, set_path, FieldPath, Filter, FilterError};
use crate::types::{Collection, Document, ID_FIELD};

/// Errors from a DocumentStore
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Cannot apply update: {0}")]
    InvalidUpdate(String),

    #[error("Stored document is not an object in {0}")]
    CorruptDocument(Collection),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Update operators understood by `update_one`
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// `$set`: write each field into the document; dotted keys address
    /// nested fields and create missing parents
    Set(Document),
    /// `$inc`: add `by` to a numeric field; a missing field counts as zero
    Inc { field: String, by: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl InsertOneResult {
    pub fn new(inserted_id: Uuid) -> Self {
        Self { acknowledged: true, inserted_id }
    }
}

impl UpdateResult {
    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: modified as u64,
            upserted_id: None,
            upserted_count: 0,
        }
    }

    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: None,
            upserted_count: 0,
        }
    }

    pub fn upserted(id: Uuid) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
            upserted_count: 1,
        }
    }
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self { acknowledged: true, deleted_count }
    }
}

/// Schema-less collection store. Every route handler issues exactly one
/// of these calls; implementations own identity assignment.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, in insertion order, each carrying `_id`
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Stores `doc` under a fresh id; any client-supplied `_id` is discarded
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult, StoreError>;

    /// Applies `update` to the first match. With `upsert` and no match, a
    /// new document is created from the filter's equalities plus the update.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError>;

    /// Connectivity probe for /health
    async fn ping(&self) -> Result<(), StoreError>;
}

impl Update {
    /// `$set` with the store-owned `_id` stripped from the payload
    pub fn set(mut fields: Document) -> Self {
        fields.remove(ID_FIELD);
        Update::Set(fields)
    }

    pub fn inc(field: impl Into<String>, by: i64) -> Self {
        Update::Inc { field: field.into(), by }
    }

    /// Applies the update in place; returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, StoreError> {
        match self {
            Update::Set(fields) => {
                let mut changed = false;
                for (key, value) in fields {
                    // Dotted keys address nested fields, as in `$set`
                    let path = match FieldPath::parse(key) {
                        Ok(FieldPath::Data(path)) => path,
                        _ => return Err(StoreError::InvalidUpdate(format!("cannot $set field '{}'", key))),
                    };
                    if lookup(doc, &path) == Some(value) {
                        continue;
                    }
                    if !set_path(doc, &path, value.clone()) {
                        return Err(StoreError::InvalidUpdate(format!(
                            "cannot create field '{}' inside a non-object value",
                            key
                        )));
                    }
                    changed = true;
                }
                Ok(changed)
            }
            Update::Inc { field, by } => {
                let next = match doc.get(field) {
                    None | Some(Value::Null) => Value::from(*by),
                    Some(Value::Number(n)) => {
                        if let Some(i) = n.as_i64() {
                            Value::from(i.checked_add(*by).ok_or_else(|| {
                                StoreError::InvalidUpdate(format!("$inc overflows field '{}'", field))
                            })?)
                        } else {
                            let f = n.as_f64().unwrap_or_default() + *by as f64;
                            serde_json::Number::from_f64(f).map(Value::Number).ok_or_else(|| {
                                StoreError::InvalidUpdate(format!("$inc produced a non-finite '{}'", field))
                            })?
                        }
                    }
                    Some(_) => {
                        return Err(StoreError::InvalidUpdate(format!(
                            "cannot apply $inc to non-numeric field '{}'",
                            field
                        )))
                    }
                };
                doc.insert(field.clone(), next);
                Ok(*by != 0)
            }
        }
    }
}

/// Copies the store id into the document the way clients expect to see it
pub fn with_id(mut doc: Document, id: Uuid) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc
}

/// Parses a path `:id` into a store identity
pub fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw.trim()).map_err(|_| StoreError::InvalidId(raw.to_string()))
}
