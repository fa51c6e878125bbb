use serde_json::Value;
use uuid::Uuid;

/// Where a condition looks: the store-owned identity or a dotted path
/// into the document body (`postedBy.email` -> ["postedBy", "email"]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Id,
    Data(Vec<String>),
}

/// Equality between a field and a JSON value
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: FieldPath,
    pub data: Value,
}

/// Positional parameter for a generated query. Kept typed so each binds
/// to the matching Postgres type (uuid, jsonb, text[]).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Id(Uuid),
    Json(Value),
    Path(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
