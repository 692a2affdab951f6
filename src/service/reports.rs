//! Name listings over the join tables.

use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderSpec, OrderTerm, SelectPlan};
use crate::schema::{TableDef, NAME, STUDENTS, STUDENT_SUBJECTS, SUBJECTS, TEACHERS, TEACHER_SUBJECTS};
use crate::service::resource::not_found;
use crate::sql::SqlValue;
use crate::store::{Row, RowExt, Store};

const TOP_BY_SUBJECT: u64 = 10;
const TOP_BY_AVERAGE: u64 = 5;

static AVERAGE_MARK: Field = Field::AvgOf {
    table: &STUDENT_SUBJECTS,
    fk: "student_id",
    column: "mark",
};

static MARK_COUNT: Field = Field::CountOf {
    table: &STUDENT_SUBJECTS,
    fk: "student_id",
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rank {
    Highest,
    Lowest,
}

async fn fetch_all(store: &dyn Store, plan: &SelectPlan) -> Result<Vec<Row>, AppError> {
    let total = store.count(plan).await?;
    if total == 0 {
        return Ok(Vec::new());
    }
    store.select(plan, 0, total).await
}

async fn require(store: &dyn Store, table: &'static TableDef, id: i64) -> Result<(), AppError> {
    if store.exists(table, id).await? {
        Ok(())
    } else {
        Err(not_found(table, id))
    }
}

/// Names of the rows in `table` that `rows` point at through `fk`, in row order.
async fn names_via(
    store: &dyn Store,
    rows: &[Row],
    fk: &str,
    table: &'static TableDef,
) -> Result<Vec<String>, AppError> {
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.i64(fk)?;
        match store.find(table, id).await? {
            Some(target) => names.push(target.text(NAME)?),
            None => tracing::warn!(table = table.name, id, "dangling reference"),
        }
    }
    Ok(names)
}

fn ids(rows: &[Row], column: &str) -> Result<Vec<SqlValue>, AppError> {
    let mut out: Vec<SqlValue> = Vec::with_capacity(rows.len());
    for row in rows {
        let v = SqlValue::I64(row.i64(column)?);
        if !out.contains(&v) {
            out.push(v);
        }
    }
    Ok(out)
}

pub struct ReportService;

impl ReportService {
    /// Students holding the ten best live marks in `subject_id`, best first.
    pub async fn top_students_by_subject_mark(
        store: &dyn Store,
        subject_id: i64,
    ) -> Result<Vec<String>, AppError> {
        require(store, &SUBJECTS, subject_id).await?;
        let plan = SelectPlan::new(
            &STUDENT_SUBJECTS,
            FilterPipeline::new()
                .soft_delete(Some(false))
                .eq(Field::Column("subject_id"), Some(subject_id))
                .finish(),
            OrderSpec::then_id(OrderTerm::desc(Field::Column("mark"))),
        );
        let rows = store.select(&plan, 0, TOP_BY_SUBJECT).await?;
        names_via(store, &rows, "student_id", &STUDENTS).await
    }

    pub async fn subjects_of_student(store: &dyn Store, student_id: i64) -> Result<Vec<String>, AppError> {
        require(store, &STUDENTS, student_id).await?;
        Self::linked_subjects(store, &STUDENT_SUBJECTS, "student_id", student_id).await
    }

    pub async fn subjects_of_teacher(store: &dyn Store, teacher_id: i64) -> Result<Vec<String>, AppError> {
        require(store, &TEACHERS, teacher_id).await?;
        Self::linked_subjects(store, &TEACHER_SUBJECTS, "teacher_id", teacher_id).await
    }

    async fn linked_subjects(
        store: &dyn Store,
        join: &'static TableDef,
        fk: &'static str,
        id: i64,
    ) -> Result<Vec<String>, AppError> {
        let plan = SelectPlan::new(
            join,
            FilterPipeline::new()
                .soft_delete(Some(false))
                .eq(Field::Column(fk), Some(id))
                .finish(),
            OrderSpec::by_id(),
        );
        let rows = fetch_all(store, &plan).await?;
        names_via(store, &rows, "subject_id", &SUBJECTS).await
    }

    /// Distinct names of teachers who teach a subject taken by one of the five
    /// students with the highest (or lowest) average mark.
    pub async fn teachers_of_ranked_students(store: &dyn Store, rank: Rank) -> Result<Vec<String>, AppError> {
        let order = match rank {
            Rank::Highest => OrderTerm::desc(AVERAGE_MARK),
            Rank::Lowest => OrderTerm::asc(AVERAGE_MARK),
        };
        let students = SelectPlan::new(
            &STUDENTS,
            FilterPipeline::new().range(MARK_COUNT, Some(1i64), None).finish(),
            OrderSpec::then_id(order),
        );
        let student_ids = ids(&store.select(&students, 0, TOP_BY_AVERAGE).await?, "id")?;
        tracing::debug!(?rank, students = ?student_ids, "ranked students");

        let marks = SelectPlan::new(
            &STUDENT_SUBJECTS,
            FilterPipeline::new()
                .soft_delete(Some(false))
                .one_of(Field::Column("student_id"), student_ids)
                .finish(),
            OrderSpec::by_id(),
        );
        let subject_ids = ids(&fetch_all(store, &marks).await?, "subject_id")?;

        let teaching = SelectPlan::new(
            &TEACHER_SUBJECTS,
            FilterPipeline::new()
                .soft_delete(Some(false))
                .one_of(Field::Column("subject_id"), subject_ids)
                .finish(),
            OrderSpec::by_id(),
        );
        let teaching_rows = fetch_all(store, &teaching).await?;
        let mut names = names_via(store, &teaching_rows, "teacher_id", &TEACHERS).await?;
        let mut seen = std::collections::HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
        Ok(names)
    }
}
