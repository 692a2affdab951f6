//! Generic list, read and mutation lifecycle for every resource.

use crate::error::AppError;
use crate::query::{paginate, Page, ResourceParameters};
use crate::resources::{Record, Resource};
use crate::schema::{TableDef, CREATED_DATE, IS_DELETED, LAST_UPDATED_DATE};
use crate::store::{Row, RowExt, Store};
use chrono::{DateTime, SubsecRound, Utc};

/// Stored timestamps keep microsecond precision, as the database column does.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn not_found(table: &TableDef, id: i64) -> AppError {
    AppError::NotFound(format!("{} with ID {} was not found.", table.label, id))
}

pub struct ResourceService;

impl ResourceService {
    /// Filtered, ordered page of `R`. Join resources first check the ids they filter by.
    pub async fn list<R: Resource>(
        store: &dyn Store,
        params: &ResourceParameters<R::Filters>,
    ) -> Result<Page<Record<R>>, AppError> {
        R::check_filters(&params.filters).validate(store).await?;
        let plan = R::plan(params);
        tracing::debug!(table = R::TABLE.name, filters = ?params.filters, order_by = %params.order_by, "list");
        paginate(store, &plan, params.page)
            .await?
            .try_map(|row| Record::from_row(&row))
    }

    /// Any row by id, deleted or not.
    pub async fn get<R: Resource>(store: &dyn Store, id: i64) -> Result<Record<R>, AppError> {
        let row = store
            .find(R::TABLE, id)
            .await?
            .ok_or_else(|| not_found(R::TABLE, id))?;
        Record::from_row(&row)
    }

    pub async fn create<R: Resource>(store: &dyn Store, payload: R::Payload) -> Result<Record<R>, AppError> {
        R::check_payload(&payload).validate(store).await?;
        let mut row = Row::new();
        R::write_row(payload, &mut row)?;
        let now = now();
        row.insert(CREATED_DATE, now.into());
        row.insert(LAST_UPDATED_DATE, now.into());
        row.insert(IS_DELETED, false.into());
        let stored = store.insert(R::TABLE, row).await?;
        let record = Record::from_row(&stored)?;
        tracing::info!(table = R::TABLE.name, id = record.id, "created");
        Ok(record)
    }

    /// Replace the updatable fields of `id`. Id and audit columns other than
    /// `last_updated_date` are never taken from the body.
    pub async fn update<R: Resource>(
        store: &dyn Store,
        id: i64,
        payload: R::Payload,
    ) -> Result<Record<R>, AppError> {
        if let Some(body_id) = R::payload_id(&payload) {
            if body_id != id {
                return Err(AppError::BadRequest(format!(
                    "Route ID {} does not match body ID {}.",
                    id, body_id
                )));
            }
        }
        let existing = store
            .find(R::TABLE, id)
            .await?
            .ok_or_else(|| not_found(R::TABLE, id))?;
        R::check_payload(&payload).validate(store).await?;
        let mut row = Row::new();
        R::write_row(payload, &mut row)?;
        row.insert(LAST_UPDATED_DATE, touched(&existing)?.into());
        let stored = store
            .update(R::TABLE, id, row)
            .await?
            .ok_or_else(|| not_found(R::TABLE, id))?;
        tracing::info!(table = R::TABLE.name, id, "updated");
        Record::from_row(&stored)
    }

    /// Soft delete. Returns the confirmation message.
    pub async fn delete<R: Resource>(store: &dyn Store, id: i64) -> Result<String, AppError> {
        let existing = store
            .find(R::TABLE, id)
            .await?
            .ok_or_else(|| not_found(R::TABLE, id))?;
        let mut row = Row::new();
        row.insert(IS_DELETED, true.into());
        row.insert(LAST_UPDATED_DATE, touched(&existing)?.into());
        store
            .update(R::TABLE, id, row)
            .await?
            .ok_or_else(|| not_found(R::TABLE, id))?;
        tracing::info!(table = R::TABLE.name, id, "soft deleted");
        Ok(format!("{} successfully deleted", R::TABLE.label))
    }
}

/// New `last_updated_date`, never earlier than the row's creation.
fn touched(existing: &Row) -> Result<DateTime<Utc>, AppError> {
    Ok(now().max(existing.timestamp(CREATED_DATE)?))
}
