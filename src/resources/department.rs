use super::Resource;
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, DEPARTMENTS, NAME, STUDENTS};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of students assigned to the department, deleted ones included.
static STUDENT_COUNT: Field = Field::CountOf {
    table: &STUDENTS,
    fk: "department_id",
};

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepartmentFilters {
    pub min_student_count: Option<i64>,
    pub max_student_count: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepartmentSort {
    Name,
    NameDesc,
    StudentsCount,
    StudentsCountDesc,
}

impl SortKey for DepartmentSort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(DepartmentSort::Name),
            "namedesc" => Some(DepartmentSort::NameDesc),
            "studentscount" => Some(DepartmentSort::StudentsCount),
            "studentscountdesc" => Some(DepartmentSort::StudentsCountDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        match self {
            DepartmentSort::Name => OrderTerm::asc(Field::Column(NAME)),
            DepartmentSort::NameDesc => OrderTerm::desc(Field::Column(NAME)),
            DepartmentSort::StudentsCount => OrderTerm::asc(STUDENT_COUNT),
            DepartmentSort::StudentsCountDesc => OrderTerm::desc(STUDENT_COUNT),
        }
    }
}

impl Resource for Department {
    const TABLE: &'static TableDef = &DEPARTMENTS;
    const SEARCH_COLUMN: Option<&'static str> = Some(NAME);
    const DEFAULT_ORDER: &'static str = "name";

    type Filters = DepartmentFilters;
    type Sort = DepartmentSort;
    type Payload = DepartmentPayload;

    fn parse_filters(q: &QueryMap) -> Result<DepartmentFilters, AppError> {
        Ok(DepartmentFilters {
            min_student_count: q.parse("MinStudentCount")?,
            max_student_count: q.parse("MaxStudentCount")?,
        })
    }

    fn apply_filters(pipeline: FilterPipeline, f: &DepartmentFilters) -> FilterPipeline {
        pipeline.range(STUDENT_COUNT, f.min_student_count, f.max_student_count)
    }

    fn check_payload(payload: &DepartmentPayload) -> ReferentialValidator {
        ReferentialValidator::new().name(&payload.name)
    }

    fn payload_id(payload: &DepartmentPayload) -> Option<i64> {
        payload.id
    }

    fn write_row(payload: DepartmentPayload, row: &mut Row) -> Result<(), AppError> {
        row.insert(NAME, payload.name.trim().into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Department { name: row.text(NAME)? })
    }
}
