//! Conjunctive filter predicates and the pipeline that assembles them.

use crate::query::params::CommonFilters;
use crate::schema::{TableDef, CREATED_DATE, IS_DELETED, LAST_UPDATED_DATE};
use crate::sql::SqlValue;
use chrono::{DateTime, Days, NaiveDate, Utc};

/// Something a predicate or ordering can look at on a row of the plan's table.
///
/// Derived fields are evaluated per row: as correlated subqueries in SQL, and by
/// walking the related table in the in-memory store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Field {
    Column(&'static str),
    /// Number of rows in `table` whose `fk` points at this row.
    CountOf { table: &'static TableDef, fk: &'static str },
    /// Largest `column` among rows in `table` whose `fk` points at this row; null when none.
    MaxOf { table: &'static TableDef, fk: &'static str, column: &'static str },
    /// Mean of `column` among rows in `table` whose `fk` points at this row; null when none.
    AvgOf { table: &'static TableDef, fk: &'static str, column: &'static str },
    /// `column` of the row in `table` that this row's `fk` points at.
    Lookup { fk: &'static str, table: &'static TableDef, column: &'static str },
    /// Current calendar year minus the year of the date `column`.
    YearsSince(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(Field, SqlValue),
    Gte(Field, SqlValue),
    Lte(Field, SqlValue),
    Lt(Field, SqlValue),
    /// Case-insensitive substring match; the needle is literal text.
    Contains(Field, String),
    /// Membership; an empty list matches nothing.
    In(Field, Vec<SqlValue>),
}

/// Start of `date` in UTC.
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Builds the AND-ed predicate list for a list request.
///
/// Each step is independent; a step whose input is absent adds nothing.
#[derive(Clone, Debug, Default)]
pub struct FilterPipeline {
    predicates: Vec<Predicate>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        FilterPipeline::default()
    }

    /// Inclusive calendar-day bounds on a timestamp column.
    ///
    /// `to` covers the whole day: the bound is `< to + 1 day`.
    pub fn day_range(mut self, column: &'static str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        if let Some(from) = from {
            self.predicates
                .push(Predicate::Gte(Field::Column(column), day_start(from).into()));
        }
        if let Some(to) = to {
            let next = to.checked_add_days(Days::new(1)).map(day_start);
            match next {
                Some(bound) => self.predicates.push(Predicate::Lt(Field::Column(column), bound.into())),
                None => self.predicates.push(Predicate::Lte(Field::Column(column), day_start(to).into())),
            }
        }
        self
    }

    pub fn audit_dates(self, common: &CommonFilters) -> Self {
        self.day_range(CREATED_DATE, common.created_date_from, common.created_date_to)
            .day_range(
                LAST_UPDATED_DATE,
                common.last_updated_date_from,
                common.last_updated_date_to,
            )
    }

    /// Applied only when the caller set it explicitly.
    pub fn soft_delete(self, is_deleted: Option<bool>) -> Self {
        self.eq(Field::Column(IS_DELETED), is_deleted)
    }

    pub fn search(mut self, field: Option<&'static str>, needle: Option<&str>) -> Self {
        let needle = needle.map(str::trim).filter(|s| !s.is_empty());
        if let (Some(column), Some(needle)) = (field, needle) {
            self.predicates
                .push(Predicate::Contains(Field::Column(column), needle.to_string()));
        }
        self
    }

    pub fn eq<V: Into<SqlValue>>(mut self, field: Field, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.predicates.push(Predicate::Eq(field, v.into()));
        }
        self
    }

    /// Inclusive range; either side may be absent.
    pub fn range<V: Into<SqlValue>>(mut self, field: Field, min: Option<V>, max: Option<V>) -> Self {
        if let Some(v) = min {
            self.predicates.push(Predicate::Gte(field, v.into()));
        }
        if let Some(v) = max {
            self.predicates.push(Predicate::Lte(field, v.into()));
        }
        self
    }

    pub fn one_of(mut self, field: Field, values: Vec<SqlValue>) -> Self {
        self.predicates.push(Predicate::In(field, values));
        self
    }

    pub fn finish(self) -> Vec<Predicate> {
        self.predicates
    }
}
