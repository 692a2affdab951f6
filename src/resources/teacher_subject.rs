use super::Resource;
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, CREATED_DATE, SUBJECTS, TEACHERS, TEACHER_SUBJECTS};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const TEACHER_ID: &str = "teacher_id";
const SUBJECT_ID: &str = "subject_id";

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubject {
    pub teacher_id: i64,
    pub subject_id: i64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubjectPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub teacher_id: i64,
    pub subject_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeacherSubjectFilters {
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeacherSubjectSort {
    CreatedDate,
    CreatedDateDesc,
}

impl SortKey for TeacherSubjectSort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "createddate" => Some(TeacherSubjectSort::CreatedDate),
            "createddatedesc" => Some(TeacherSubjectSort::CreatedDateDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        match self {
            TeacherSubjectSort::CreatedDate => OrderTerm::asc(Field::Column(CREATED_DATE)),
            TeacherSubjectSort::CreatedDateDesc => OrderTerm::desc(Field::Column(CREATED_DATE)),
        }
    }
}

impl Resource for TeacherSubject {
    const TABLE: &'static TableDef = &TEACHER_SUBJECTS;
    const SEARCH_COLUMN: Option<&'static str> = None;
    const DEFAULT_ORDER: &'static str = "createddate";

    type Filters = TeacherSubjectFilters;
    type Sort = TeacherSubjectSort;
    type Payload = TeacherSubjectPayload;

    fn parse_filters(q: &QueryMap) -> Result<TeacherSubjectFilters, AppError> {
        Ok(TeacherSubjectFilters {
            teacher_id: q.parse("TeacherId")?,
            subject_id: q.parse("SubjectId")?,
        })
    }

    fn apply_filters(pipeline: FilterPipeline, f: &TeacherSubjectFilters) -> FilterPipeline {
        pipeline
            .eq(Field::Column(TEACHER_ID), f.teacher_id)
            .eq(Field::Column(SUBJECT_ID), f.subject_id)
    }

    fn check_filters(f: &TeacherSubjectFilters) -> ReferentialValidator {
        ReferentialValidator::new()
            .optional_reference(&TEACHERS, f.teacher_id)
            .optional_reference(&SUBJECTS, f.subject_id)
    }

    fn check_payload(p: &TeacherSubjectPayload) -> ReferentialValidator {
        ReferentialValidator::new()
            .reference(&TEACHERS, p.teacher_id)
            .reference(&SUBJECTS, p.subject_id)
    }

    fn payload_id(p: &TeacherSubjectPayload) -> Option<i64> {
        p.id
    }

    fn write_row(p: TeacherSubjectPayload, row: &mut Row) -> Result<(), AppError> {
        row.insert(TEACHER_ID, p.teacher_id.into());
        row.insert(SUBJECT_ID, p.subject_id.into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(TeacherSubject {
            teacher_id: row.i64(TEACHER_ID)?,
            subject_id: row.i64(SUBJECT_ID)?,
        })
    }
}
