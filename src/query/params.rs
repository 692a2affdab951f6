//! Resource parameters: the filter, sort and paging inputs of a list request.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

pub const DEFAULT_PAGE_NUMBER: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 15;
pub const MAX_PAGE_SIZE: i64 = 25;

/// Query-string pairs with normalized keys.
///
/// Keys match without regard to case, underscores or dashes, so `PageSize`,
/// `pageSize` and `page_size` are the same parameter. Later duplicates win.
#[derive(Clone, Debug, Default)]
pub struct QueryMap {
    values: HashMap<String, String>,
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl QueryMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        QueryMap { values }
    }

    /// Raw value, including present-but-empty.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Trimmed value; blank counts as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw(key).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, AppError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key)
            .map(|s| {
                s.parse::<T>()
                    .map_err(|e| AppError::BadRequest(format!("invalid {}: '{}' ({})", key, s, e)))
            })
            .transpose()
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, AppError> {
        self.get(key)
            .map(|s| {
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(AppError::BadRequest(format!(
                        "invalid {}: '{}' (expected true or false)",
                        key, s
                    )))
                }
            })
            .transpose()
    }

    /// Calendar date. Accepts `2024-05-01`, `2024-05-01T10:00:00` or RFC 3339; the time part is dropped.
    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>, AppError> {
        self.get(key)
            .map(|s| {
                parse_date(s).ok_or_else(|| {
                    AppError::BadRequest(format!("invalid {}: '{}' (expected YYYY-MM-DD)", key, s))
                })
            })
            .transpose()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Page number and page size. Size is clamped to `MAX_PAGE_SIZE`; both are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(number: i64, size: i64) -> Result<Self, AppError> {
        if number < 1 {
            return Err(AppError::BadRequest(format!(
                "PageNumber must be at least 1, got {}",
                number
            )));
        }
        if size < 1 {
            return Err(AppError::BadRequest(format!(
                "PageSize must be at least 1, got {}",
                size
            )));
        }
        let number = u32::try_from(number)
            .map_err(|_| AppError::BadRequest(format!("PageNumber too large: {}", number)))?;
        Ok(PageRequest {
            number,
            size: size.min(MAX_PAGE_SIZE) as u32,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }

    pub fn from_query(q: &QueryMap) -> Result<Self, AppError> {
        let number = q.parse::<i64>("PageNumber")?.unwrap_or(DEFAULT_PAGE_NUMBER);
        let size = q.parse::<i64>("PageSize")?.unwrap_or(DEFAULT_PAGE_SIZE);
        PageRequest::new(number, size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            number: DEFAULT_PAGE_NUMBER as u32,
            size: DEFAULT_PAGE_SIZE as u32,
        }
    }
}

/// Filters every resource accepts: audit date bounds and soft-delete visibility.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommonFilters {
    pub created_date_from: Option<NaiveDate>,
    pub created_date_to: Option<NaiveDate>,
    pub last_updated_date_from: Option<NaiveDate>,
    pub last_updated_date_to: Option<NaiveDate>,
    /// Unset means deleted and live rows are both candidates.
    pub is_deleted: Option<bool>,
}

impl CommonFilters {
    pub fn from_query(q: &QueryMap) -> Result<Self, AppError> {
        Ok(CommonFilters {
            created_date_from: q.date("CreatedDateFrom")?,
            created_date_to: q.date("CreatedDateTo")?,
            last_updated_date_from: q.date("LastUpdatedDateFrom")?,
            last_updated_date_to: q.date("LastUpdatedDateTo")?,
            is_deleted: q.bool("IsDeleted")?,
        })
    }
}

/// Everything a list request asks for, with entity-specific filters in `F`.
#[derive(Clone, Debug)]
pub struct ResourceParameters<F> {
    pub page: PageRequest,
    pub common: CommonFilters,
    pub search: Option<String>,
    /// Raw sort key as sent; resolved later against the entity vocabulary.
    pub order_by: String,
    pub filters: F,
}

impl<F: Default> ResourceParameters<F> {
    /// Defaults for an entity whose default sort key is `default_order`.
    pub fn with_order(default_order: &str) -> Self {
        ResourceParameters {
            page: PageRequest::default(),
            common: CommonFilters::default(),
            search: None,
            order_by: default_order.to_string(),
            filters: F::default(),
        }
    }
}

impl<F> ResourceParameters<F> {
    /// Parse common parameters, then entity filters with `parse_filters`.
    /// `SearchString` is read only when the entity has a searchable column.
    pub fn from_query(
        q: &QueryMap,
        default_order: &str,
        searchable: bool,
        parse_filters: impl FnOnce(&QueryMap) -> Result<F, AppError>,
    ) -> Result<Self, AppError> {
        let search = if searchable {
            q.get("SearchString").map(str::to_string)
        } else {
            None
        };
        Ok(ResourceParameters {
            page: PageRequest::from_query(q)?,
            common: CommonFilters::from_query(q)?,
            search,
            order_by: q
                .raw("OrderBy")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| default_order.to_string()),
            filters: parse_filters(q)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(pairs: &[(&str, &str)]) -> QueryMap {
        QueryMap::from_pairs(pairs.iter().map(|(k, v)| (*k, v.to_string())))
    }

    fn parse(pairs: &[(&str, &str)]) -> Result<ResourceParameters<()>, AppError> {
        ResourceParameters::from_query(&q(pairs), "name", true, |_| Ok(()))
    }

    #[test]
    fn defaults_apply_when_absent() {
        let p = parse(&[]).unwrap();
        assert_eq!(p.page.number(), 1);
        assert_eq!(p.page.size(), 15);
        assert_eq!(p.order_by, "name");
        assert_eq!(p.common, CommonFilters::default());
        assert!(p.search.is_none());
    }

    #[test]
    fn keys_match_any_casing() {
        let p = parse(&[("pagesize", "4"), ("PAGE_NUMBER", "2"), ("orderBy", "NameDesc")]).unwrap();
        assert_eq!(p.page.size(), 4);
        assert_eq!(p.page.number(), 2);
        assert_eq!(p.order_by, "NameDesc");
    }

    #[test]
    fn page_size_is_clamped_not_rejected() {
        assert_eq!(PageRequest::new(1, 26).unwrap(), PageRequest::new(1, 25).unwrap());
        assert_eq!(PageRequest::new(1, 10_000).unwrap().size(), 25);
    }

    #[test]
    fn non_positive_page_inputs_are_rejected() {
        assert!(matches!(PageRequest::new(1, 0), Err(AppError::BadRequest(_))));
        assert!(matches!(PageRequest::new(1, -3), Err(AppError::BadRequest(_))));
        assert!(matches!(PageRequest::new(0, 10), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn offset_follows_page_number() {
        assert_eq!(PageRequest::new(1, 10).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn is_deleted_is_tri_state() {
        assert_eq!(parse(&[]).unwrap().common.is_deleted, None);
        assert_eq!(parse(&[("IsDeleted", "TRUE")]).unwrap().common.is_deleted, Some(true));
        assert_eq!(parse(&[("IsDeleted", "false")]).unwrap().common.is_deleted, Some(false));
        assert!(parse(&[("IsDeleted", "maybe")]).is_err());
    }

    #[test]
    fn blank_search_is_absent() {
        assert!(parse(&[("SearchString", "   ")]).unwrap().search.is_none());
        assert_eq!(parse(&[("SearchString", " alg ")]).unwrap().search.as_deref(), Some("alg"));
    }

    #[test]
    fn search_ignored_when_not_searchable() {
        let p: ResourceParameters<()> =
            ResourceParameters::from_query(&q(&[("SearchString", "x")]), "mark", false, |_| Ok(()))
                .unwrap();
        assert!(p.search.is_none());
    }

    #[test]
    fn empty_order_by_stays_empty() {
        assert_eq!(parse(&[("OrderBy", "")]).unwrap().order_by, "");
    }

    #[test]
    fn dates_accept_datetime_forms() {
        let p = parse(&[
            ("CreatedDateFrom", "2024-01-05"),
            ("CreatedDateTo", "2024-01-09T13:45:00"),
            ("LastUpdatedDateFrom", "2024-02-01T00:00:00Z"),
        ])
        .unwrap();
        assert_eq!(p.common.created_date_from, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(p.common.created_date_to, NaiveDate::from_ymd_opt(2024, 1, 9));
        assert_eq!(p.common.last_updated_date_from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert!(parse(&[("CreatedDateFrom", "yesterday")]).is_err());
    }

    #[test]
    fn malformed_number_names_parameter() {
        match parse(&[("PageSize", "ten")]) {
            Err(AppError::BadRequest(m)) => assert!(m.contains("PageSize")),
            other => panic!("unexpected {:?}", other.map(|p| p.page)),
        }
    }
}
