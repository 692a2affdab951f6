//! Row storage behind one async trait: PostgreSQL in production, memory for tests and local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::query::SelectPlan;
use crate::schema::TableDef;
use crate::sql::SqlValue;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// One stored row, keyed by column name.
pub type Row = BTreeMap<&'static str, SqlValue>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Size of the plan's filtered set, ignoring its order.
    async fn count(&self, plan: &SelectPlan) -> Result<u64, AppError>;

    /// Window of the plan's ordered set.
    async fn select(&self, plan: &SelectPlan, offset: u64, limit: u64) -> Result<Vec<Row>, AppError>;

    /// Row by id regardless of its deleted flag.
    async fn find(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError>;

    async fn exists(&self, table: &'static TableDef, id: i64) -> Result<bool, AppError>;

    /// Insert with a store-assigned id; returns the stored row.
    async fn insert(&self, table: &'static TableDef, row: Row) -> Result<Row, AppError>;

    /// Overwrite the given columns; `None` when the id does not exist.
    async fn update(&self, table: &'static TableDef, id: i64, row: Row) -> Result<Option<Row>, AppError>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Typed column access. A missing or mistyped column is a storage bug, not a client error.
pub trait RowExt {
    fn value(&self, column: &str) -> Result<&SqlValue, AppError>;
    fn i64(&self, column: &str) -> Result<i64, AppError>;
    fn text(&self, column: &str) -> Result<String, AppError>;
    fn flag(&self, column: &str) -> Result<bool, AppError>;
    fn date(&self, column: &str) -> Result<NaiveDate, AppError>;
    fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, AppError>;
}

fn mistyped(column: &str, want: &str, got: &SqlValue) -> AppError {
    AppError::Internal(format!("column {}: expected {}, got {:?}", column, want, got))
}

impl RowExt for Row {
    fn value(&self, column: &str) -> Result<&SqlValue, AppError> {
        self.get(column)
            .ok_or_else(|| AppError::Internal(format!("column {} missing from row", column)))
    }

    fn i64(&self, column: &str) -> Result<i64, AppError> {
        let v = self.value(column)?;
        v.as_i64().ok_or_else(|| mistyped(column, "integer", v))
    }

    fn text(&self, column: &str) -> Result<String, AppError> {
        let v = self.value(column)?;
        v.as_str().map(str::to_string).ok_or_else(|| mistyped(column, "text", v))
    }

    fn flag(&self, column: &str) -> Result<bool, AppError> {
        let v = self.value(column)?;
        v.as_bool().ok_or_else(|| mistyped(column, "boolean", v))
    }

    fn date(&self, column: &str) -> Result<NaiveDate, AppError> {
        let v = self.value(column)?;
        v.as_date().ok_or_else(|| mistyped(column, "date", v))
    }

    fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, AppError> {
        let v = self.value(column)?;
        v.as_timestamp().ok_or_else(|| mistyped(column, "timestamp", v))
    }
}
