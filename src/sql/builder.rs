//! Builds parameterized SELECT, COUNT, INSERT and UPDATE statements from table definitions and plans.

use crate::query::{Direction, Field, OrderSpec, Predicate, SelectPlan};
use crate::schema::{qualified_table, quoted, TableDef, ID};
use crate::sql::SqlValue;

const MAIN_ALIAS: &str = "main";
const SUB_ALIAS: &str = "sub";

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) -> String {
        self.params.push(v);
        format!("${}", self.params.len())
    }
}

/// Column list for SELECT / RETURNING, optionally alias-qualified.
fn select_column_list(table: &TableDef, alias: Option<&str>) -> String {
    table
        .columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{}.{}", a, quoted(c.name)),
            None => quoted(c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQL expression for a field of the main row.
fn field_expr(schema: &str, field: &Field) -> String {
    let main = |c: &str| format!("{}.{}", MAIN_ALIAS, quoted(c));
    let sub = |c: &str| format!("{}.{}", SUB_ALIAS, quoted(c));
    match field {
        Field::Column(c) => main(c),
        Field::CountOf { table, fk } => format!(
            "(SELECT COUNT(*) FROM {} {} WHERE {} = {})",
            qualified_table(schema, table.name),
            SUB_ALIAS,
            sub(fk),
            main(ID)
        ),
        Field::MaxOf { table, fk, column } => format!(
            "(SELECT MAX({}) FROM {} {} WHERE {} = {})",
            sub(column),
            qualified_table(schema, table.name),
            SUB_ALIAS,
            sub(fk),
            main(ID)
        ),
        Field::AvgOf { table, fk, column } => format!(
            "(SELECT AVG({})::float8 FROM {} {} WHERE {} = {})",
            sub(column),
            qualified_table(schema, table.name),
            SUB_ALIAS,
            sub(fk),
            main(ID)
        ),
        Field::Lookup { fk, table, column } => format!(
            "(SELECT {} FROM {} {} WHERE {} = {})",
            sub(column),
            qualified_table(schema, table.name),
            SUB_ALIAS,
            sub(ID),
            main(fk)
        ),
        Field::YearsSince(c) => format!(
            "(EXTRACT(YEAR FROM CURRENT_DATE) - EXTRACT(YEAR FROM {}))::bigint",
            main(c)
        ),
    }
}

/// Escape LIKE wildcards so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn where_clause(q: &mut QueryBuf, schema: &str, predicates: &[Predicate]) -> String {
    let mut parts = Vec::with_capacity(predicates.len());
    for p in predicates {
        let part = match p {
            Predicate::Eq(f, v) => format!("{} = {}", field_expr(schema, f), q.push_param(v.clone())),
            Predicate::Gte(f, v) => format!("{} >= {}", field_expr(schema, f), q.push_param(v.clone())),
            Predicate::Lte(f, v) => format!("{} <= {}", field_expr(schema, f), q.push_param(v.clone())),
            Predicate::Lt(f, v) => format!("{} < {}", field_expr(schema, f), q.push_param(v.clone())),
            Predicate::Contains(f, needle) => format!(
                "{} ILIKE {} ESCAPE '\\'",
                field_expr(schema, f),
                q.push_param(SqlValue::Text(like_pattern(needle)))
            ),
            Predicate::In(_, values) if values.is_empty() => "FALSE".to_string(),
            Predicate::In(f, values) => {
                let placeholders: Vec<String> = values.iter().map(|v| q.push_param(v.clone())).collect();
                format!("{} IN ({})", field_expr(schema, f), placeholders.join(", "))
            }
        };
        parts.push(part);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Nulls (missing aggregates) sort as the smallest value in both directions.
fn order_clause(schema: &str, order: &OrderSpec) -> String {
    let terms: Vec<String> = order
        .terms()
        .iter()
        .map(|t| match t.direction {
            Direction::Asc => format!("{} ASC NULLS FIRST", field_expr(schema, &t.field)),
            Direction::Desc => format!("{} DESC NULLS LAST", field_expr(schema, &t.field)),
        })
        .collect();
    format!(" ORDER BY {}", terms.join(", "))
}

/// COUNT(*) over the plan's filtered set.
pub fn count(schema: &str, plan: &SelectPlan) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, plan.table.name);
    let where_sql = where_clause(&mut q, schema, &plan.predicates);
    q.sql = format!("SELECT COUNT(*) FROM {} {}{}", table, MAIN_ALIAS, where_sql);
    q
}

/// Filtered, ordered SELECT with LIMIT/OFFSET bound as parameters.
pub fn select_page(schema: &str, plan: &SelectPlan, offset: u64, limit: u64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, plan.table.name);
    let cols = select_column_list(plan.table, Some(MAIN_ALIAS));
    let where_sql = where_clause(&mut q, schema, &plan.predicates);
    let order_sql = order_clause(schema, &plan.order);
    let limit_ph = q.push_param(SqlValue::I64(limit as i64));
    let offset_ph = q.push_param(SqlValue::I64(offset as i64));
    q.sql = format!(
        "SELECT {} FROM {} {}{}{} LIMIT {} OFFSET {}",
        cols, table, MAIN_ALIAS, where_sql, order_sql, limit_ph, offset_ph
    );
    q
}

/// SELECT by primary key. Caller binds the id as `$1`.
pub fn select_by_id(schema: &str, table: &TableDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(table, None),
        qualified_table(schema, table.name),
        quoted(ID)
    );
    q
}

/// EXISTS by primary key. Caller binds the id as `$1`.
pub fn exists_by_id(schema: &str, table: &TableDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1)",
        qualified_table(schema, table.name),
        quoted(ID)
    );
    q
}

/// INSERT every non-id column, RETURNING the stored row.
/// Columns missing from `row` are bound as NULL so the table's NOT NULL constraint reports them.
pub fn insert(schema: &str, table: &TableDef, row: &crate::store::Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.insert_columns() {
        let v = row.get(c.name).cloned().unwrap_or(SqlValue::Null);
        cols.push(quoted(c.name));
        placeholders.push(q.push_param(v));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(schema, table.name),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(table, None)
    );
    q
}

/// UPDATE by id: SET every non-id column present in `row`, RETURNING the stored row.
pub fn update(schema: &str, table: &TableDef, id: i64, row: &crate::store::Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in table.insert_columns() {
        let Some(v) = row.get(c.name) else { continue };
        let ph = q.push_param(v.clone());
        sets.push(format!("{} = {}", quoted(c.name), ph));
    }
    let id_ph = q.push_param(SqlValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(schema, table.name),
        sets.join(", "),
        quoted(ID),
        id_ph,
        select_column_list(table, None)
    );
    q
}
