use super::{Gender, RawEnum, Resource};
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, CITIES, NAME, TEACHERS};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BIRTH_DATE: &str = "birth_date";
const GENDER: &str = "gender";
const CITY_ID: &str = "city_id";

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub city_id: i64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: RawEnum,
    pub city_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeacherFilters {
    pub birth_date_from: Option<NaiveDate>,
    pub birth_date_to: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub city_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeacherSort {
    Name,
    NameDesc,
    BirthDate,
    BirthDateDesc,
}

impl SortKey for TeacherSort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(TeacherSort::Name),
            "namedesc" => Some(TeacherSort::NameDesc),
            "birthdate" => Some(TeacherSort::BirthDate),
            "birthdatedesc" => Some(TeacherSort::BirthDateDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        match self {
            TeacherSort::Name => OrderTerm::asc(Field::Column(NAME)),
            TeacherSort::NameDesc => OrderTerm::desc(Field::Column(NAME)),
            TeacherSort::BirthDate => OrderTerm::asc(Field::Column(BIRTH_DATE)),
            TeacherSort::BirthDateDesc => OrderTerm::desc(Field::Column(BIRTH_DATE)),
        }
    }
}

impl Resource for Teacher {
    const TABLE: &'static TableDef = &TEACHERS;
    const SEARCH_COLUMN: Option<&'static str> = Some(NAME);
    const DEFAULT_ORDER: &'static str = "name";

    type Filters = TeacherFilters;
    type Sort = TeacherSort;
    type Payload = TeacherPayload;

    fn parse_filters(q: &QueryMap) -> Result<TeacherFilters, AppError> {
        Ok(TeacherFilters {
            birth_date_from: q.date("BirthDateFrom")?,
            birth_date_to: q.date("BirthDateTo")?,
            gender: q.parse("Gender")?,
            city_id: q.parse("CityId")?,
        })
    }

    fn apply_filters(pipeline: FilterPipeline, f: &TeacherFilters) -> FilterPipeline {
        pipeline
            .range(Field::Column(BIRTH_DATE), f.birth_date_from, f.birth_date_to)
            .eq(Field::Column(GENDER), f.gender.map(Gender::as_str))
            .eq(Field::Column(CITY_ID), f.city_id)
    }

    fn check_payload(p: &TeacherPayload) -> ReferentialValidator {
        ReferentialValidator::new()
            .name(&p.name)
            .reference(&CITIES, p.city_id)
            .gender(&p.gender)
    }

    fn payload_id(p: &TeacherPayload) -> Option<i64> {
        p.id
    }

    fn write_row(p: TeacherPayload, row: &mut Row) -> Result<(), AppError> {
        let gender = Gender::from_raw(&p.gender)
            .ok_or_else(|| AppError::Validation(format!("Invalid gender value: {}", p.gender)))?;
        row.insert(NAME, p.name.trim().into());
        row.insert(BIRTH_DATE, p.birth_date.into());
        row.insert(GENDER, gender.as_str().into());
        row.insert(CITY_ID, p.city_id.into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        let gender = row.text(GENDER)?;
        Ok(Teacher {
            name: row.text(NAME)?,
            birth_date: row.date(BIRTH_DATE)?,
            gender: Gender::from_name(&gender)
                .ok_or_else(|| AppError::Internal(format!("stored gender '{}'", gender)))?,
            city_id: row.i64(CITY_ID)?,
        })
    }
}
