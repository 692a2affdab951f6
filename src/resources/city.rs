use super::Resource;
use crate::error::AppError;
use crate::query::{Field, FilterPipeline, OrderTerm, QueryMap, SortKey};
use crate::schema::{TableDef, CITIES, NAME};
use crate::service::ReferentialValidator;
use crate::store::{Row, RowExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CitySort {
    Name,
    NameDesc,
}

impl SortKey for CitySort {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(CitySort::Name),
            "namedesc" => Some(CitySort::NameDesc),
            _ => None,
        }
    }

    fn term(self) -> OrderTerm {
        match self {
            CitySort::Name => OrderTerm::asc(Field::Column(NAME)),
            CitySort::NameDesc => OrderTerm::desc(Field::Column(NAME)),
        }
    }
}

impl Resource for City {
    const TABLE: &'static TableDef = &CITIES;
    const SEARCH_COLUMN: Option<&'static str> = Some(NAME);
    const DEFAULT_ORDER: &'static str = "name";

    type Filters = ();
    type Sort = CitySort;
    type Payload = CityPayload;

    fn parse_filters(_q: &QueryMap) -> Result<(), AppError> {
        Ok(())
    }

    fn apply_filters(pipeline: FilterPipeline, _filters: &()) -> FilterPipeline {
        pipeline
    }

    fn check_payload(payload: &CityPayload) -> ReferentialValidator {
        ReferentialValidator::new().name(&payload.name)
    }

    fn payload_id(payload: &CityPayload) -> Option<i64> {
        payload.id
    }

    fn write_row(payload: CityPayload, row: &mut Row) -> Result<(), AppError> {
        row.insert(NAME, payload.name.trim().into());
        Ok(())
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(City { name: row.text(NAME)? })
    }
}
