use serde_json::Value;
use uuid::Uuid;

use crate::types::{Document, ID_FIELD};

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FieldPath, FilterCondition, SqlResult};

/// Mongo-style document filter: a conjunction of field equalities such as
/// `{"postedBy.email": "a@b.c"}` or `{"_id": ..}`. Evaluated against an
/// in-memory document or compiled to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<FilterCondition>,
}

impl Filter {
    /// Matches every document
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self {
            conditions: vec![FilterCondition {
                field: FieldPath::Id,
                data: Value::String(id.to_string()),
            }],
        }
    }

    /// Adds an equality condition on a dotted field path
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Result<Self, FilterError> {
        let field = FieldPath::parse(field)?;
        let data = value.into();

        if field == FieldPath::Id && data.as_str().and_then(|s| Uuid::parse_str(s).ok()).is_none() {
            return Err(FilterError::InvalidId(data.to_string()));
        }

        self.conditions.push(FilterCondition { field, data });
        Ok(self)
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn matches(&self, id: &Uuid, doc: &Document) -> bool {
        self.conditions.iter().all(|c| Self::condition_matches(c, id, doc))
    }

    /// Identity pinned by an `_id` equality, if the filter has one
    pub fn pinned_id(&self) -> Option<Uuid> {
        self.conditions.iter().find_map(|c| match c.field {
            FieldPath::Id => c.data.as_str().and_then(|s| Uuid::parse_str(s).ok()),
            FieldPath::Data(_) => None,
        })
    }

    /// Starting document for an upsert: every body-field equality becomes
    /// a field of the new document, nested along its path.
    pub fn seed_document(&self) -> Document {
        let mut doc = Document::new();
        for condition in &self.conditions {
            if let FieldPath::Data(path) = &condition.field {
                if !condition.data.is_null() {
                    set_path(&mut doc, path, condition.data.clone());
                }
            }
        }
        doc
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        FilterWhere::generate(self, starting_param_index)
    }

    fn condition_matches(condition: &FilterCondition, id: &Uuid, doc: &Document) -> bool {
        match &condition.field {
            FieldPath::Id => condition.data.as_str().and_then(|s| Uuid::parse_str(s).ok()) == Some(*id),
            FieldPath::Data(path) => {
                let actual = lookup(doc, path);
                if condition.data.is_null() {
                    actual.map_or(true, Value::is_null)
                } else {
                    actual == Some(&condition.data)
                }
            }
        }
    }
}

impl FieldPath {
    pub fn parse(field: &str) -> Result<Self, FilterError> {
        if field == ID_FIELD {
            return Ok(FieldPath::Id);
        }
        let segments: Vec<String> = field.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty() || s.starts_with('$')) {
            return Err(FilterError::InvalidField(field.to_string()));
        }
        Ok(FieldPath::Data(segments))
    }
}

/// Resolves a dotted path; numeric segments index into arrays.
pub fn lookup<'a>(doc: &'a Document, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = doc.get(first)?;
    for segment in rest {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at a dotted path, creating missing (or null) parents as
/// objects. Returns false, leaving `doc` untouched, when a parent holds a
/// non-object value.
pub fn set_path(doc: &mut Document, path: &[String], value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };

    // Check before writing so a blocked path never leaves half-built parents
    let mut probe = Some(&*doc);
    for segment in parents {
        probe = match probe.and_then(|obj| obj.get(segment)) {
            None | Some(Value::Null) => None,
            Some(Value::Object(obj)) => Some(obj),
            Some(_) => return false,
        };
    }

    let mut current = doc;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Document::new()));
        if entry.is_null() {
            *entry = Value::Object(Document::new());
        }
        current = match entry {
            Value::Object(obj) => obj,
            _ => return false,
        };
    }
    current.insert(last.clone(), value);
    true
}
