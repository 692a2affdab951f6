use super::{int_column, Gender, RawEnum, Resource};
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, CITIES, DEPARTMENTS, NAME, STUDENTS, STUDENT_SUBJECTS};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BIRTH_DATE: &str = "birth_date";
const GENDER: &str = "gender";
const GRADE: &str = "current_grade_level";
const CITY_ID: &str = "city_id";
const DEPARTMENT_ID: &str = "department_id";

/// Highest mark among the student's subject rows; null without any.
static BEST_MARK: Field = Field::MaxOf {
    table: &STUDENT_SUBJECTS,
    fk: "student_id",
    column: "mark",
};

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub current_grade_level: i32,
    pub city_id: i64,
    pub department_id: i64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: RawEnum,
    pub current_grade_level: i32,
    pub city_id: i64,
    pub department_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudentFilters {
    pub birth_date_from: Option<NaiveDate>,
    pub birth_date_to: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub current_grade_level: Option<i32>,
    pub department_id: Option<i64>,
    pub city_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudentSort {
    Name,
    NameDesc,
    Mark,
    MarkDesc,
    Grade,
    GradeDesc,
    Age,
    AgeDesc,
}

impl SortKey for StudentSort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(StudentSort::Name),
            "namedesc" => Some(StudentSort::NameDesc),
            "mark" => Some(StudentSort::Mark),
            "markdesc" => Some(StudentSort::MarkDesc),
            "grade" => Some(StudentSort::Grade),
            "gradedesc" => Some(StudentSort::GradeDesc),
            "age" => Some(StudentSort::Age),
            "agedesc" => Some(StudentSort::AgeDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        let age = Field::YearsSince(BIRTH_DATE);
        match self {
            StudentSort::Name => OrderTerm::asc(Field::Column(NAME)),
            StudentSort::NameDesc => OrderTerm::desc(Field::Column(NAME)),
            StudentSort::Mark => OrderTerm::asc(BEST_MARK),
            StudentSort::MarkDesc => OrderTerm::desc(BEST_MARK),
            StudentSort::Grade => OrderTerm::asc(Field::Column(GRADE)),
            StudentSort::GradeDesc => OrderTerm::desc(Field::Column(GRADE)),
            StudentSort::Age => OrderTerm::asc(age),
            StudentSort::AgeDesc => OrderTerm::desc(age),
        }
    }
}

impl Resource for Student {
    const TABLE: &'static TableDef = &STUDENTS;
    const SEARCH_COLUMN: Option<&'static str> = Some(NAME);
    const DEFAULT_ORDER: &'static str = "name";

    type Filters = StudentFilters;
    type Sort = StudentSort;
    type Payload = StudentPayload;

    fn parse_filters(q: &QueryMap) -> Result<StudentFilters, AppError> {
        Ok(StudentFilters {
            birth_date_from: q.date("BirthDateFrom")?,
            birth_date_to: q.date("BirthDateTo")?,
            gender: q.parse("Gender")?,
            current_grade_level: q.parse("CurrentGradeLevel")?,
            department_id: q.parse("DepartmentId")?,
            city_id: q.parse("CityId")?,
        })
    }

    fn apply_filters(pipeline: FilterPipeline, f: &StudentFilters) -> FilterPipeline {
        pipeline
            .range(Field::Column(BIRTH_DATE), f.birth_date_from, f.birth_date_to)
            .eq(Field::Column(GENDER), f.gender.map(Gender::as_str))
            .eq(Field::Column(GRADE), f.current_grade_level)
            .eq(Field::Column(DEPARTMENT_ID), f.department_id)
            .eq(Field::Column(CITY_ID), f.city_id)
    }

    fn check_payload(p: &StudentPayload) -> ReferentialValidator {
        ReferentialValidator::new()
            .name(&p.name)
            .reference(&CITIES, p.city_id)
            .reference(&DEPARTMENTS, p.department_id)
            .gender(&p.gender)
    }

    fn payload_id(p: &StudentPayload) -> Option<i64> {
        p.id
    }

    fn write_row(p: StudentPayload, row: &mut Row) -> Result<(), AppError> {
        let gender = Gender::from_raw(&p.gender)
            .ok_or_else(|| AppError::Validation(format!("Invalid gender value: {}", p.gender)))?;
        row.insert(NAME, p.name.trim().into());
        row.insert(BIRTH_DATE, p.birth_date.into());
        row.insert(GENDER, gender.as_str().into());
        row.insert(GRADE, p.current_grade_level.into());
        row.insert(CITY_ID, p.city_id.into());
        row.insert(DEPARTMENT_ID, p.department_id.into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        let gender = row.text(GENDER)?;
        Ok(Student {
            name: row.text(NAME)?,
            birth_date: row.date(BIRTH_DATE)?,
            gender: Gender::from_name(&gender)
                .ok_or_else(|| AppError::Internal(format!("stored gender '{}'", gender)))?,
            current_grade_level: int_column(row, GRADE)?,
            city_id: row.i64(CITY_ID)?,
            department_id: row.i64(DEPARTMENT_ID)?,
        })
    }
}
