/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema-less JSON record as stored in a collection
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Field under which a document's identity is exposed to clients
pub const ID_FIELD: &str = "_id";

/// The two collections the job board keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Jobs,
    Applications,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Jobs, Collection::Applications];

    /// Backing table name; also used as the collection name in logs
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Applications => "applications",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
