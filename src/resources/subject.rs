use super::{int_column, Resource};
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, NAME, SUBJECTS};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const GRADE_LEVEL: &str = "grade_level";

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub grade_level: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub grade_level: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubjectFilters {
    pub grade_level: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectSort {
    Name,
    NameDesc,
    GradeLevel,
    GradeLevelDesc,
}

impl SortKey for SubjectSort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(SubjectSort::Name),
            "namedesc" => Some(SubjectSort::NameDesc),
            "gradelevel" => Some(SubjectSort::GradeLevel),
            "gradeleveldesc" => Some(SubjectSort::GradeLevelDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        match self {
            SubjectSort::Name => OrderTerm::asc(Field::Column(NAME)),
            SubjectSort::NameDesc => OrderTerm::desc(Field::Column(NAME)),
            SubjectSort::GradeLevel => OrderTerm::asc(Field::Column(GRADE_LEVEL)),
            SubjectSort::GradeLevelDesc => OrderTerm::desc(Field::Column(GRADE_LEVEL)),
        }
    }
}

impl Resource for Subject {
    const TABLE: &'static TableDef = &SUBJECTS;
    const SEARCH_COLUMN: Option<&'static str> = Some(NAME);
    const DEFAULT_ORDER: &'static str = "name";

    type Filters = SubjectFilters;
    type Sort = SubjectSort;
    type Payload = SubjectPayload;

    fn parse_filters(q: &QueryMap) -> Result<SubjectFilters, AppError> {
        Ok(SubjectFilters {
            grade_level: q.parse("GradeLevel")?,
        })
    }

    fn apply_filters(pipeline: FilterPipeline, f: &SubjectFilters) -> FilterPipeline {
        pipeline.eq(Field::Column(GRADE_LEVEL), f.grade_level)
    }

    fn check_payload(p: &SubjectPayload) -> ReferentialValidator {
        ReferentialValidator::new().name(&p.name)
    }

    fn payload_id(p: &SubjectPayload) -> Option<i64> {
        p.id
    }

    fn write_row(p: SubjectPayload, row: &mut Row) -> Result<(), AppError> {
        row.insert(NAME, p.name.trim().into());
        row.insert(GRADE_LEVEL, p.grade_level.into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Subject {
            name: row.text(NAME)?,
            grade_level: int_column(row, GRADE_LEVEL)?,
        })
    }
}
