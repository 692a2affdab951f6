//! Per-entity resource definitions plugged into the generic list and mutation pipeline.

mod city;
mod department;
mod gender;
mod record;
mod student;
mod student_subject;
mod subject;
mod teacher;
mod teacher_subject;

pub use city::{City, CityPayload, CitySort};
pub use department::{Department, DepartmentFilters, DepartmentPayload, DepartmentSort};
pub use gender::{Gender, RawEnum};
pub use record::Record;
pub use student::{Student, StudentFilters, StudentPayload, StudentSort};
pub use student_subject::{StudentSubject, StudentSubjectFilters, StudentSubjectPayload, StudentSubjectSort};
pub use subject::{Subject, SubjectFilters, SubjectPayload, SubjectSort};
pub use teacher::{Teacher, TeacherFilters, TeacherPayload, TeacherSort};
pub use teacher_subject::{TeacherSubject, TeacherSubjectFilters, TeacherSubjectPayload, TeacherSubjectSort};

use crate::error::AppError;
use crate::query::{FilterPipeline, OrderingResolver, QueryMap, ResourceParameters, SelectPlan, SortKey};
use crate::schema::TableDef;
use crate::service::ReferentialValidator;
use crate::store::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// One CRUD resource: its table, query vocabulary, checks and row conversions.
///
/// The implementing type is the resource's own fields (no id or audit columns);
/// `Record<Self>` adds those.
pub trait Resource: Serialize + Send + Sync + Sized + 'static {
    const TABLE: &'static TableDef;
    /// Column matched by `SearchString`; `None` disables search.
    const SEARCH_COLUMN: Option<&'static str>;
    /// Sort key used when `OrderBy` is not sent.
    const DEFAULT_ORDER: &'static str;

    type Filters: Default + Debug + Send + Sync;
    type Sort: SortKey;
    type Payload: DeserializeOwned + Send;

    fn parse_filters(q: &QueryMap) -> Result<Self::Filters, AppError>;

    fn apply_filters(pipeline: FilterPipeline, filters: &Self::Filters) -> FilterPipeline;

    /// Reference checks on filter ids, run before listing.
    fn check_filters(_filters: &Self::Filters) -> ReferentialValidator {
        ReferentialValidator::new()
    }

    fn check_payload(payload: &Self::Payload) -> ReferentialValidator;

    /// Id carried in the body, if any. Must match the route id on update.
    fn payload_id(payload: &Self::Payload) -> Option<i64>;

    /// Copy the updatable fields into `row`. Runs only after `check_payload` passed.
    fn write_row(payload: Self::Payload, row: &mut Row) -> Result<(), AppError>;

    fn from_row(row: &Row) -> Result<Self, AppError>;

    fn parameters(q: &QueryMap) -> Result<ResourceParameters<Self::Filters>, AppError> {
        ResourceParameters::from_query(
            q,
            Self::DEFAULT_ORDER,
            Self::SEARCH_COLUMN.is_some(),
            Self::parse_filters,
        )
    }

    fn plan(params: &ResourceParameters<Self::Filters>) -> SelectPlan {
        let pipeline = FilterPipeline::new()
            .audit_dates(&params.common)
            .soft_delete(params.common.is_deleted)
            .search(Self::SEARCH_COLUMN, params.search.as_deref());
        let predicates = Self::apply_filters(pipeline, &params.filters).finish();
        let order = OrderingResolver::resolve::<Self::Sort>(&params.order_by);
        SelectPlan::new(Self::TABLE, predicates, order)
    }
}

/// Integer column value that must fit the resource's `i32` field.
pub(crate) fn int_column(row: &Row, column: &str) -> Result<i32, AppError> {
    use crate::store::RowExt;
    let n = row.i64(column)?;
    i32::try_from(n).map_err(|_| AppError::Internal(format!("column {} out of range: {}", column, n)))
}
