use serde_json::Value;
use uuid::Uuid;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FieldPath, FilterCondition, SqlParam, SqlResult};

/// Compiles a `Filter` into a WHERE clause over a `(id uuid, data jsonb)`
/// table. Field paths are bound as `text[]` parameters, never spliced in.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(filter: &Filter, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = vec![];
        for condition in filter.conditions() {
            sql_conditions.push(filter_where.build_sql_condition(condition)?);
        }
        let query = if sql_conditions.is_empty() {
            "TRUE".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        Ok(SqlResult { query, params: filter_where.param_values })
    }

    fn build_sql_condition(&mut self, condition: &FilterCondition) -> Result<String, FilterError> {
        match &condition.field {
            FieldPath::Id => Ok(format!("id = {}", self.id_param(&condition.data)?)),
            FieldPath::Data(path) => {
                let column = format!("data #> {}", self.param(SqlParam::Path(path.clone())));
                if condition.data.is_null() {
                    Ok(format!("({column} IS NULL OR {column} = 'null'::jsonb)"))
                } else {
                    Ok(format!("{} = {}", column, self.param(SqlParam::Json(condition.data.clone()))))
                }
            }
        }
    }

    fn id_param(&mut self, value: &Value) -> Result<String, FilterError> {
        let id = value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| FilterError::InvalidId(value.to_string()))?;
        Ok(self.param(SqlParam::Id(id)))
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
