//! Static table definitions and idempotent DDL.
//!
//! Identifiers used by the SQL builder come only from these definitions; nothing a
//! client sends ever becomes an identifier.

use crate::error::{AppError, ConfigError};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Column storage type. Drives DDL and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Store-assigned primary key.
    Id,
    /// Foreign key to another table's `id`.
    Reference(&'static str),
    Int,
    Text,
    Date,
    Timestamp,
    Bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef { name, ty }
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    /// Human label used in messages ("City with ID 3 was not found.").
    pub label: &'static str,
    pub columns: &'static [ColumnDef],
    /// Extra table constraints appended to CREATE TABLE.
    pub checks: &'static [&'static str],
}

impl PartialEq for TableDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns written by INSERT (everything except the store-assigned id).
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.ty != ColumnType::Id)
    }
}

pub const ID: &str = "id";
pub const CREATED_DATE: &str = "created_date";
pub const LAST_UPDATED_DATE: &str = "last_updated_date";
pub const IS_DELETED: &str = "is_deleted";
pub const NAME: &str = "name";

/// Maximum length of any name column.
pub const MAX_NAME_LENGTH: usize = 100;

pub const CITIES: TableDef = TableDef {
    name: "cities",
    label: "City",
    columns: &[
        col(ID, ColumnType::Id),
        col(NAME, ColumnType::Text),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &[],
};

pub const DEPARTMENTS: TableDef = TableDef {
    name: "departments",
    label: "Department",
    columns: &[
        col(ID, ColumnType::Id),
        col(NAME, ColumnType::Text),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &[],
};

pub const STUDENTS: TableDef = TableDef {
    name: "students",
    label: "Student",
    columns: &[
        col(ID, ColumnType::Id),
        col(NAME, ColumnType::Text),
        col("birth_date", ColumnType::Date),
        col("gender", ColumnType::Text),
        col("current_grade_level", ColumnType::Int),
        col("city_id", ColumnType::Reference("cities")),
        col("department_id", ColumnType::Reference("departments")),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &["CHECK (gender IN ('Male', 'Female'))"],
};

pub const TEACHERS: TableDef = TableDef {
    name: "teachers",
    label: "Teacher",
    columns: &[
        col(ID, ColumnType::Id),
        col(NAME, ColumnType::Text),
        col("birth_date", ColumnType::Date),
        col("gender", ColumnType::Text),
        col("city_id", ColumnType::Reference("cities")),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &["CHECK (gender IN ('Male', 'Female'))"],
};

pub const SUBJECTS: TableDef = TableDef {
    name: "subjects",
    label: "Subject",
    columns: &[
        col(ID, ColumnType::Id),
        col(NAME, ColumnType::Text),
        col("grade_level", ColumnType::Int),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &[],
};

pub const STUDENT_SUBJECTS: TableDef = TableDef {
    name: "student_subjects",
    label: "StudentSubject",
    columns: &[
        col(ID, ColumnType::Id),
        col("student_id", ColumnType::Reference("students")),
        col("subject_id", ColumnType::Reference("subjects")),
        col("mark", ColumnType::Int),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &["CHECK (mark BETWEEN 0 AND 100)"],
};

pub const TEACHER_SUBJECTS: TableDef = TableDef {
    name: "teacher_subjects",
    label: "TeacherSubject",
    columns: &[
        col(ID, ColumnType::Id),
        col("teacher_id", ColumnType::Reference("teachers")),
        col("subject_id", ColumnType::Reference("subjects")),
        col(CREATED_DATE, ColumnType::Timestamp),
        col(LAST_UPDATED_DATE, ColumnType::Timestamp),
        col(IS_DELETED, ColumnType::Bool),
    ],
    checks: &[],
};

/// All tables in FK dependency order (parents first).
pub static ALL_TABLES: [&TableDef; 7] = [
    &CITIES,
    &DEPARTMENTS,
    &SUBJECTS,
    &STUDENTS,
    &TEACHERS,
    &STUDENT_SUBJECTS,
    &TEACHER_SUBJECTS,
];

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// Schema names come from config; keep them to plain identifiers.
pub fn validate_schema_name(schema: &str) -> Result<(), ConfigError> {
    let mut chars = schema.chars();
    let starts_ok = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(false);
    if !starts_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(ConfigError::InvalidIdentifier(schema.to_string()));
    }
    Ok(())
}

fn column_ddl(schema: &str, c: &ColumnDef) -> String {
    let name = quoted(c.name);
    match c.ty {
        ColumnType::Id => format!("{} BIGSERIAL PRIMARY KEY", name),
        ColumnType::Reference(target) => format!(
            "{} BIGINT NOT NULL REFERENCES {}({})",
            name,
            qualified_table(schema, target),
            quoted(ID)
        ),
        ColumnType::Int => format!("{} INTEGER NOT NULL", name),
        ColumnType::Text if c.name == NAME => {
            format!("{} VARCHAR({}) NOT NULL", name, MAX_NAME_LENGTH)
        }
        ColumnType::Text => format!("{} TEXT NOT NULL", name),
        ColumnType::Date => format!("{} DATE NOT NULL", name),
        ColumnType::Timestamp => format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", name),
        ColumnType::Bool => format!("{} BOOLEAN NOT NULL DEFAULT FALSE", name),
    }
}

/// CREATE TABLE IF NOT EXISTS for one definition.
pub fn create_table_sql(schema: &str, table: &TableDef) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(|c| column_ddl(schema, c)).collect();
    parts.push(format!(
        "CHECK ({} >= {})",
        quoted(LAST_UPDATED_DATE),
        quoted(CREATED_DATE)
    ));
    parts.extend(table.checks.iter().map(|c| c.to_string()));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified_table(schema, table.name),
        parts.join(",\n    ")
    )
}

/// Indexes on every FK column; the list pipeline joins and counts through them.
pub fn create_index_sql(schema: &str, table: &TableDef) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|c| matches!(c.ty, ColumnType::Reference(_)))
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("ix_{}_{}", table.name, c.name)),
                qualified_table(schema, table.name),
                quoted(c.name)
            )
        })
        .collect()
}

/// Create the schema and all tables if they do not exist.
pub async fn ensure_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    validate_schema_name(schema)?;
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for table in ALL_TABLES {
        let ddl = create_table_sql(schema, table);
        tracing::debug!(table = table.name, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
        for idx in create_index_sql(schema, table) {
            sqlx::query(&idx).execute(pool).await?;
        }
    }
    tracing::info!(schema = %schema, tables = ALL_TABLES.len(), "schema ready");
    Ok(())
}

/// Create the target database when it is missing. Connects through the `postgres` maintenance database.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| {
        AppError::Config(ConfigError::InvalidValue {
            key: "DATABASE_URL",
            value: url.to_string(),
        })
    })? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_ddl_has_references_and_checks() {
        let ddl = create_table_sql("school", &STUDENTS);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"school\".\"students\""));
        assert!(ddl.contains("\"id\" BIGSERIAL PRIMARY KEY"));
        assert!(ddl.contains("\"city_id\" BIGINT NOT NULL REFERENCES \"school\".\"cities\"(\"id\")"));
        assert!(ddl.contains("\"name\" VARCHAR(100) NOT NULL"));
        assert!(ddl.contains("CHECK (gender IN ('Male', 'Female'))"));
        assert!(ddl.contains("CHECK (\"last_updated_date\" >= \"created_date\")"));
    }

    #[test]
    fn join_tables_get_fk_indexes() {
        let idx = create_index_sql("school", &STUDENT_SUBJECTS);
        assert_eq!(idx.len(), 2);
        assert!(idx[0].contains("(\"student_id\")"));
        assert!(create_index_sql("school", &CITIES).is_empty());
    }

    #[test]
    fn parents_precede_children() {
        let pos = |name: &str| ALL_TABLES.iter().position(|t| t.name == name).unwrap();
        for table in ALL_TABLES {
            for c in table.columns {
                if let ColumnType::Reference(target) = c.ty {
                    assert!(pos(target) < pos(table.name), "{} before {}", target, table.name);
                }
            }
        }
    }

    #[test]
    fn schema_names_are_plain_identifiers() {
        assert!(validate_schema_name("school").is_ok());
        assert!(validate_schema_name("school_2").is_ok());
        assert!(validate_schema_name("School").is_err());
        assert!(validate_schema_name("a;drop").is_err());
        assert!(validate_schema_name("").is_err());
    }

    #[test]
    fn admin_url_swaps_database() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@host:5432/school?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@host:5432/postgres");
        assert_eq!(db, "school");
    }
}
