use super::Resource;
use crate::error::AppError;
use crate::schema::{CREATED_DATE, ID, IS_DELETED, LAST_UPDATED_DATE};
use crate::store::{Row, RowExt};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored resource: its fields plus id and audit columns.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<R> {
    pub id: i64,
    #[serde(flatten)]
    pub fields: R,
    pub created_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
    pub is_deleted: bool,
}

impl<R: Resource> Record<R> {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Record {
            id: row.i64(ID)?,
            fields: R::from_row(row)?,
            created_date: row.timestamp(CREATED_DATE)?,
            last_updated_date: row.timestamp(LAST_UPDATED_DATE)?,
            is_deleted: row.flag(IS_DELETED)?,
        })
    }
}
