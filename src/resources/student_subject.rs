use super::{int_column, Resource};
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, NAME, STUDENTS, STUDENT_SUBJECTS, SUBJECTS};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const STUDENT_ID: &str = "student_id";
const SUBJECT_ID: &str = "subject_id";
const MARK: &str = "mark";

static STUDENT_NAME: Field = Field::Lookup {
    fk: STUDENT_ID,
    table: &STUDENTS,
    column: NAME,
};

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubject {
    pub student_id: i64,
    pub subject_id: i64,
    pub mark: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubjectPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub student_id: i64,
    pub subject_id: i64,
    /// Whole number; `85.0` is accepted.
    pub mark: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudentSubjectFilters {
    pub student_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub min_mark: Option<i32>,
    pub max_mark: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudentSubjectSort {
    Mark,
    MarkDesc,
    Student,
    StudentDesc,
}

impl SortKey for StudentSubjectSort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "mark" => Some(StudentSubjectSort::Mark),
            "markdesc" => Some(StudentSubjectSort::MarkDesc),
            "student" => Some(StudentSubjectSort::Student),
            "studentdesc" => Some(StudentSubjectSort::StudentDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        match self {
            StudentSubjectSort::Mark => OrderTerm::asc(Field::Column(MARK)),
            StudentSubjectSort::MarkDesc => OrderTerm::desc(Field::Column(MARK)),
            StudentSubjectSort::Student => OrderTerm::asc(STUDENT_NAME),
            StudentSubjectSort::StudentDesc => OrderTerm::desc(STUDENT_NAME),
        }
    }
}

impl Resource for StudentSubject {
    const TABLE: &'static TableDef = &STUDENT_SUBJECTS;
    const SEARCH_COLUMN: Option<&'static str> = None;
    const DEFAULT_ORDER: &'static str = "markdesc";

    type Filters = StudentSubjectFilters;
    type Sort = StudentSubjectSort;
    type Payload = StudentSubjectPayload;

    fn parse_filters(q: &QueryMap) -> Result<StudentSubjectFilters, AppError> {
        Ok(StudentSubjectFilters {
            student_id: q.parse("StudentId")?,
            subject_id: q.parse("SubjectId")?,
            min_mark: q.parse("MinMark")?,
            max_mark: q.parse("MaxMark")?,
        })
    }

    fn apply_filters(pipeline: FilterPipeline, f: &StudentSubjectFilters) -> FilterPipeline {
        pipeline
            .eq(Field::Column(STUDENT_ID), f.student_id)
            .eq(Field::Column(SUBJECT_ID), f.subject_id)
            .range(Field::Column(MARK), f.min_mark, f.max_mark)
    }

    fn check_filters(f: &StudentSubjectFilters) -> ReferentialValidator {
        ReferentialValidator::new()
            .optional_reference(&STUDENTS, f.student_id)
            .optional_reference(&SUBJECTS, f.subject_id)
    }

    fn check_payload(p: &StudentSubjectPayload) -> ReferentialValidator {
        ReferentialValidator::new()
            .reference(&STUDENTS, p.student_id)
            .reference(&SUBJECTS, p.subject_id)
            .mark(p.mark)
    }

    fn payload_id(p: &StudentSubjectPayload) -> Option<i64> {
        p.id
    }

    fn write_row(p: StudentSubjectPayload, row: &mut Row) -> Result<(), AppError> {
        row.insert(STUDENT_ID, p.student_id.into());
        row.insert(SUBJECT_ID, p.subject_id.into());
        row.insert(MARK, (p.mark as i64).into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(StudentSubject {
            student_id: row.i64(STUDENT_ID)?,
            subject_id: row.i64(SUBJECT_ID)?,
            mark: int_column(row, MARK)?,
        })
    }
}
