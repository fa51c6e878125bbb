use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    PgPool, Postgres, Row,
};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::filter::{Filter, SqlParam};
use crate::types::{Collection, Document, ID_FIELD};

use super::store::{
    with_id, DeleteResult, DocumentStore, InsertOneResult, StoreError, Update, UpdateResult,
};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed store: one `(id uuid, seq bigserial, data jsonb)`
/// table per collection. `seq` preserves insertion order for `find`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Created database pool for: {}", config.name);
        Ok(Self { pool })
    }

    /// Creates the collection tables if they do not exist yet
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            sqlx::query(&create_table_sql(collection))
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationError(format!("{}: {}", collection, e)))?;
        }
        info!("Collections ready: jobs, applications");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// DATABASE_URL wins; otherwise the URL is composed from DB_USER/DB_PASS
    /// so credentials with reserved characters are percent-encoded.
    fn build_connection_string(config: &DatabaseConfig) -> Result<String, StoreError> {
        if let Some(url) = &config.url {
            return Ok(url.clone());
        }

        let user = config.user.as_deref().ok_or(StoreError::ConfigMissing("DB_USER"))?;
        let mut url = url::Url::parse(&format!("postgres://{}/{}", config.host, config.name))
            .map_err(|_| StoreError::InvalidDatabaseUrl)?;
        url.set_username(user).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        url.set_password(config.password.as_deref())
            .map_err(|_| StoreError::InvalidDatabaseUrl)?;
        Ok(url.into())
    }

    /// Locks the first match, applies `update` to it and writes it back in
    /// one transaction. The row lock serializes concurrent `$inc` calls.
    async fn try_update(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<UpdateResult>, StoreError> {
        let where_sql = filter.to_where_sql(0)?;
        let sql = locking_select_sql(collection, &where_sql.query);

        let mut tx = self.pool.begin().await?;
        let row = bind_params(sqlx::query(&sql), &where_sql.params)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.try_get("id")?;
        let mut doc = match row.try_get::<Value, _>("data")? {
            Value::Object(doc) => doc,
            _ => return Err(StoreError::CorruptDocument(collection)),
        };

        // An Err here drops `tx`, which rolls back and releases the lock
        let modified = update.apply(&mut doc)?;
        if modified {
            sqlx::query(&write_back_sql(collection))
                .bind(id)
                .bind(Value::Object(doc))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(Some(UpdateResult::matched(modified)))
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let where_sql = filter.to_where_sql(0)?;
        let sql = select_sql(collection, &where_sql.query, false);
        let rows = bind_params(sqlx::query(&sql), &where_sql.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| row_to_document(collection, row)).collect()
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let where_sql = filter.to_where_sql(0)?;
        let sql = select_sql(collection, &where_sql.query, true);
        let row = bind_params(sqlx::query(&sql), &where_sql.params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(|r| row_to_document(collection, r)).transpose()
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        doc.remove(ID_FIELD);
        let id = Uuid::new_v4();
        let sql = format!("INSERT INTO \"{}\" (id, data) VALUES ($1, $2)", collection.table_name());
        sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(doc))
            .execute(&self.pool)
            .await?;
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
        if let Some(result) = self.try_update(collection, filter, &update).await? {
            return Ok(result);
        }
        if !upsert {
            return Ok(UpdateResult::unmatched());
        }

        let id = filter.pinned_id().unwrap_or_else(Uuid::new_v4);
        let mut doc = filter.seed_document();
        update.apply(&mut doc)?;

        let sql = format!(
            "INSERT INTO \"{}\" (id, data) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            collection.table_name()
        );
        let inserted = sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(doc))
            .execute(&self.pool)
            .await?
            .rows_affected();

        if inserted == 1 {
            debug!("Upserted {} into {}", id, collection);
            return Ok(UpdateResult::upserted(id));
        }

        // Lost a race with a concurrent upsert of the same id; update theirs
        Ok(self
            .try_update(collection, filter, &update)
            .await?
            .unwrap_or_else(UpdateResult::unmatched))
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let where_sql = filter.to_where_sql(0)?;
        let sql = delete_sql(collection, &where_sql.query);
        let deleted = bind_params(sqlx::query(&sql), &where_sql.params)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(DeleteResult::new(deleted))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn create_table_sql(collection: Collection) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" (\
            id UUID PRIMARY KEY, \
            seq BIGSERIAL NOT NULL, \
            data JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()\
        )",
        collection.table_name()
    )
}

fn select_sql(collection: Collection, where_clause: &str, limit_one: bool) -> String {
    let mut sql = format!(
        "SELECT id, data FROM \"{}\" WHERE {} ORDER BY seq",
        collection.table_name(),
        where_clause
    );
    if limit_one {
        sql.push_str(" LIMIT 1");
    }
    sql
}

fn locking_select_sql(collection: Collection, where_clause: &str) -> String {
    format!(
        "SELECT id, data FROM \"{}\" WHERE {} ORDER BY seq LIMIT 1 FOR UPDATE",
        collection.table_name(),
        where_clause
    )
}

fn write_back_sql(collection: Collection) -> String {
    format!("UPDATE \"{}\" SET data = $2 WHERE id = $1", collection.table_name())
}

fn delete_sql(collection: Collection, where_clause: &str) -> String {
    let table = collection.table_name();
    format!(
        "DELETE FROM \"{table}\" WHERE id = (SELECT id FROM \"{table}\" WHERE {where_clause} ORDER BY seq LIMIT 1)"
    )
}

fn bind_params<'q>(mut q: PgQuery<'q>, params: &[SqlParam]) -> PgQuery<'q> {
    for param in params {
        q = match param {
            SqlParam::Id(id) => q.bind(*id),
            SqlParam::Json(value) => q.bind(value.clone()),
            SqlParam::Path(path) => q.bind(path.clone()),
        };
    }
    q
}

fn row_to_document(collection: Collection, row: &PgRow) -> Result<Document, StoreError> {
    let id: Uuid = row.try_get("id")?;
    match row.try_get::<Value, _>("data")? {
        Value::Object(doc) => Ok(with_id(doc, id)),
        _ => Err(StoreError::CorruptDocument(collection)),
    }
}
