use super::{Row, Store};
use crate::error::AppError;
use crate::query::SelectPlan;
use crate::schema::{ColumnType, TableDef};
use crate::sql::{self, bind_all, SqlValue};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row as _};

/// Tables live in `schema`, created by `schema::ensure_tables`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    async fn fetch_rows(&self, table: &TableDef, q: sql::QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "select");
        let rows = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| decode_row(table, r)).collect()
    }

    async fn fetch_optional(&self, table: &TableDef, q: sql::QueryBuf) -> Result<Option<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "fetch one");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(|r| decode_row(table, r)).transpose()
    }
}

fn decode_row(table: &TableDef, row: &PgRow) -> Result<Row, AppError> {
    let mut out = Row::new();
    for c in table.columns {
        let value = match c.ty {
            ColumnType::Id | ColumnType::Reference(_) => SqlValue::I64(row.try_get::<i64, _>(c.name)?),
            ColumnType::Int => SqlValue::I64(row.try_get::<i32, _>(c.name)? as i64),
            ColumnType::Text => SqlValue::Text(row.try_get::<String, _>(c.name)?),
            ColumnType::Date => SqlValue::Date(row.try_get::<NaiveDate, _>(c.name)?),
            ColumnType::Timestamp => SqlValue::Timestamp(row.try_get::<DateTime<Utc>, _>(c.name)?),
            ColumnType::Bool => SqlValue::Bool(row.try_get::<bool, _>(c.name)?),
        };
        out.insert(c.name, value);
    }
    Ok(out)
}

#[async_trait]
impl Store for PgStore {
    async fn count(&self, plan: &SelectPlan) -> Result<u64, AppError> {
        let q = sql::count(&self.schema, plan);
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get(0)?;
        Ok(n.max(0) as u64)
    }

    async fn select(&self, plan: &SelectPlan, offset: u64, limit: u64) -> Result<Vec<Row>, AppError> {
        let q = sql::select_page(&self.schema, plan, offset, limit);
        self.fetch_rows(plan.table, q).await
    }

    async fn find(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError> {
        let mut q = sql::select_by_id(&self.schema, table);
        q.params.push(SqlValue::I64(id));
        self.fetch_optional(table, q).await
    }

    async fn exists(&self, table: &'static TableDef, id: i64) -> Result<bool, AppError> {
        let q = sql::exists_by_id(&self.schema, table);
        let (found,): (bool,) = sqlx::query_as(&q.sql).bind(id).fetch_one(&self.pool).await?;
        Ok(found)
    }

    async fn insert(&self, table: &'static TableDef, row: Row) -> Result<Row, AppError> {
        let q = sql::insert(&self.schema, table, &row);
        self.fetch_optional(table, q)
            .await?
            .ok_or_else(|| AppError::Internal(format!("insert into {} returned no row", table.name)))
    }

    async fn update(&self, table: &'static TableDef, id: i64, row: Row) -> Result<Option<Row>, AppError> {
        let q = sql::update(&self.schema, table, id, &row);
        self.fetch_optional(table, q).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
