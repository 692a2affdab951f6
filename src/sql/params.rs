//! Typed values that flow through plans, rows and bound parameters.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use std::cmp::Ordering;
use std::fmt;

/// A single column value. Used as a bound SQL parameter, as a cell in a `Row`,
/// and as the comparison operand when the in-memory store evaluates a plan.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Total order used for in-memory sorting and range checks.
    ///
    /// `Null` sorts before everything. Text compares case-insensitively first so
    /// "algebra" and "Algebra" land next to each other, as a collated column would.
    /// Integers and floats compare numerically; other mismatched variants compare equal.
    pub fn total_cmp(&self, other: &SqlValue) -> Ordering {
        match (self, other) {
            (SqlValue::Null, SqlValue::Null) => Ordering::Equal,
            (SqlValue::Null, _) => Ordering::Less,
            (_, SqlValue::Null) => Ordering::Greater,
            (SqlValue::Bool(a), SqlValue::Bool(b)) => a.cmp(b),
            (SqlValue::I64(a), SqlValue::I64(b)) => a.cmp(b),
            (SqlValue::F64(a), SqlValue::F64(b)) => a.total_cmp(b),
            (SqlValue::I64(a), SqlValue::F64(b)) => (*a as f64).total_cmp(b),
            (SqlValue::F64(a), SqlValue::I64(b)) => a.total_cmp(&(*b as f64)),
            (SqlValue::Text(a), SqlValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (SqlValue::Date(a), SqlValue::Date(b)) => a.cmp(b),
            (SqlValue::Timestamp(a), SqlValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::I64(n) => write!(f, "{}", n),
            SqlValue::F64(n) => write!(f, "{}", n),
            SqlValue::Text(s) => write!(f, "'{}'", s),
            SqlValue::Date(d) => write!(f, "{}", d),
            SqlValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::I64(n)
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        SqlValue::I64(n as i64)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(d: NaiveDate) -> Self {
        SqlValue::Date(d)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(t: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(t)
    }
}

/// Bind one value with its concrete Postgres type.
pub fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::I64(n) => query.bind(*n),
        SqlValue::F64(n) => query.bind(*n),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::Timestamp(t) => query.bind(*t),
    }
}

/// Bind every parameter in order.
pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = bind_value(query, p);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_first() {
        assert_eq!(SqlValue::Null.total_cmp(&SqlValue::I64(-5)), Ordering::Less);
        assert_eq!(SqlValue::I64(0).total_cmp(&SqlValue::Null), Ordering::Greater);
    }

    #[test]
    fn text_ignores_case_before_tiebreak() {
        let lower = SqlValue::from("biology");
        let upper = SqlValue::from("Chemistry");
        assert_eq!(lower.total_cmp(&upper), Ordering::Less);
        assert_eq!(
            SqlValue::from("Art").total_cmp(&SqlValue::from("art")),
            Ordering::Less
        );
    }
}
