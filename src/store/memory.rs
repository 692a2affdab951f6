use super::{Row, Store};
use crate::error::AppError;
use crate::query::{Direction, Field, Predicate, SelectPlan};
use crate::schema::{TableDef, ALL_TABLES, ID};
use crate::sql::SqlValue;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    rows: HashMap<&'static str, BTreeMap<i64, Row>>,
    next_id: HashMap<&'static str, i64>,
}

impl Tables {
    fn table(&self, name: &str) -> impl Iterator<Item = &Row> {
        self.rows.get(name).into_iter().flat_map(|t| t.values())
    }

    fn children<'a>(&'a self, table: &TableDef, fk: &'static str, id: &'a SqlValue) -> impl Iterator<Item = &'a Row> {
        self.table(table.name)
            .filter(move |r| r.get(fk).map(|v| sql_eq(v, id)).unwrap_or(false))
    }

    fn eval(&self, row: &Row, field: &Field) -> SqlValue {
        let id = row.get(ID).cloned().unwrap_or(SqlValue::Null);
        match field {
            Field::Column(c) => row.get(c).cloned().unwrap_or(SqlValue::Null),
            Field::CountOf { table, fk } => SqlValue::I64(self.children(table, *fk, &id).count() as i64),
            Field::MaxOf { table, fk, column } => self
                .children(table, *fk, &id)
                .filter_map(|r| r.get(column))
                .filter(|v| !v.is_null())
                .max_by(|a, b| a.total_cmp(b))
                .cloned()
                .unwrap_or(SqlValue::Null),
            Field::AvgOf { table, fk, column } => {
                let values: Vec<f64> = self
                    .children(table, *fk, &id)
                    .filter_map(|r| r.get(column).and_then(SqlValue::as_i64))
                    .map(|n| n as f64)
                    .collect();
                if values.is_empty() {
                    SqlValue::Null
                } else {
                    SqlValue::F64(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Field::Lookup { fk, table, column } => row
                .get(fk)
                .and_then(SqlValue::as_i64)
                .and_then(|target| self.rows.get(table.name)?.get(&target))
                .and_then(|r| r.get(column).cloned())
                .unwrap_or(SqlValue::Null),
            Field::YearsSince(c) => match row.get(c).and_then(SqlValue::as_date) {
                Some(d) => SqlValue::I64((Utc::now().year() - d.year()) as i64),
                None => SqlValue::Null,
            },
        }
    }

    fn matches(&self, row: &Row, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Eq(f, v) => sql_eq(&self.eval(row, f), v),
            Predicate::Gte(f, v) => sql_cmp(&self.eval(row, f), v).is_some_and(|o| o != Ordering::Less),
            Predicate::Lte(f, v) => sql_cmp(&self.eval(row, f), v).is_some_and(|o| o != Ordering::Greater),
            Predicate::Lt(f, v) => sql_cmp(&self.eval(row, f), v) == Some(Ordering::Less),
            Predicate::Contains(f, needle) => match self.eval(row, f) {
                SqlValue::Text(s) => s.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Predicate::In(f, values) => {
                let v = self.eval(row, f);
                values.iter().any(|candidate| sql_eq(&v, candidate))
            }
        }
    }

    fn filtered<'a>(&'a self, plan: &'a SelectPlan) -> impl Iterator<Item = &'a Row> {
        self.table(plan.table.name)
            .filter(move |r| plan.predicates.iter().all(|p| self.matches(r, p)))
    }
}

/// Comparison with SQL null semantics: anything compared with null is unknown.
fn sql_cmp(a: &SqlValue, b: &SqlValue) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        None
    } else {
        Some(a.total_cmp(b))
    }
}

fn sql_eq(a: &SqlValue, b: &SqlValue) -> bool {
    match (a, b) {
        (SqlValue::Text(x), SqlValue::Text(y)) => x == y,
        _ => sql_cmp(a, b) == Some(Ordering::Equal),
    }
}

/// Evaluates plans directly over in-process tables.
///
/// Filter, count and ordering semantics mirror the SQL the Postgres store runs,
/// including nulls sorting first ascending and last descending.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

fn known_table(table: &TableDef) -> Result<(), AppError> {
    if ALL_TABLES.iter().any(|t| *t == table) {
        Ok(())
    } else {
        Err(AppError::Internal(format!("unknown table {}", table.name)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn count(&self, plan: &SelectPlan) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.filtered(plan).count() as u64)
    }

    async fn select(&self, plan: &SelectPlan, offset: u64, limit: u64) -> Result<Vec<Row>, AppError> {
        let tables = self.tables.read().await;
        let terms = plan.order.terms();
        let mut keyed: Vec<(Vec<SqlValue>, &Row)> = tables
            .filtered(plan)
            .map(|r| (terms.iter().map(|t| tables.eval(r, &t.field)).collect(), r))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            for (i, term) in terms.iter().enumerate() {
                let ord = a[i].total_cmp(&b[i]);
                let ord = match term.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(keyed
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn find(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.rows.get(table.name).and_then(|t| t.get(&id)).cloned())
    }

    async fn exists(&self, table: &'static TableDef, id: i64) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.rows.get(table.name).is_some_and(|t| t.contains_key(&id)))
    }

    async fn insert(&self, table: &'static TableDef, mut row: Row) -> Result<Row, AppError> {
        known_table(table)?;
        for c in table.insert_columns() {
            if row.get(c.name).map_or(true, SqlValue::is_null) {
                return Err(AppError::Internal(format!(
                    "null value in column {} of {}",
                    c.name, table.name
                )));
            }
        }
        let mut tables = self.tables.write().await;
        let next = tables.next_id.entry(table.name).or_insert(0);
        *next += 1;
        let id = *next;
        row.insert(ID, SqlValue::I64(id));
        tables.rows.entry(table.name).or_default().insert(id, row.clone());
        tracing::debug!(table = table.name, id, "memory insert");
        Ok(row)
    }

    async fn update(&self, table: &'static TableDef, id: i64, row: Row) -> Result<Option<Row>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.rows.get_mut(table.name).and_then(|t| t.get_mut(&id)) else {
            return Ok(None);
        };
        for (column, value) in row {
            if column != ID {
                stored.insert(column, value);
            }
        }
        Ok(Some(stored.clone()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
