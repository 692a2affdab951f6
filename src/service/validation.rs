//! Referential and value checks run before a mutation or a filtered join listing.

use crate::error::AppError;
use crate::resources::{Gender, RawEnum};
use crate::schema::{TableDef, MAX_NAME_LENGTH};
use crate::store::Store;

pub const MIN_MARK: i64 = 0;
pub const MAX_MARK: i64 = 100;

enum Check {
    Exists { table: &'static TableDef, id: i64 },
    Failed(String),
}

/// Collects checks, then runs all of them and reports every violation at once.
///
/// Messages keep the order the checks were added in and are joined with a space.
#[derive(Default)]
pub struct ReferentialValidator {
    checks: Vec<Check>,
}

impl ReferentialValidator {
    pub fn new() -> Self {
        ReferentialValidator::default()
    }

    /// `id` must exist in `table`. Soft-deleted rows count as existing.
    pub fn reference(mut self, table: &'static TableDef, id: i64) -> Self {
        self.checks.push(Check::Exists { table, id });
        self
    }

    /// Like `reference`, skipped when the id is absent.
    pub fn optional_reference(self, table: &'static TableDef, id: Option<i64>) -> Self {
        match id {
            Some(id) => self.reference(table, id),
            None => self,
        }
    }

    pub fn gender(mut self, raw: &RawEnum) -> Self {
        if Gender::from_raw(raw).is_none() {
            self.checks
                .push(Check::Failed(format!("Invalid gender value: {}", raw)));
        }
        self
    }

    /// Marks arrive as JSON numbers; `85.0` is accepted as 85, `85.5` is not.
    pub fn mark(mut self, mark: f64) -> Self {
        if !mark.is_finite() || mark.fract() != 0.0 {
            self.checks.push(Check::Failed(format!(
                "Mark must be a whole number, got {}.",
                mark
            )));
        } else if !(MIN_MARK as f64..=MAX_MARK as f64).contains(&mark) {
            self.checks.push(Check::Failed(format!(
                "Mark must be between {} and {}, got {}.",
                MIN_MARK, MAX_MARK, mark
            )));
        }
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() {
            self.checks.push(Check::Failed("Name is required.".into()));
        } else if name.chars().count() > MAX_NAME_LENGTH {
            self.checks.push(Check::Failed(format!(
                "Name must be at most {} characters.",
                MAX_NAME_LENGTH
            )));
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub async fn validate(self, store: &dyn Store) -> Result<(), AppError> {
        let mut errors = Vec::new();
        for check in self.checks {
            match check {
                Check::Exists { table, id } => {
                    if !store.exists(table, id).await? {
                        errors.push(format!("{} with ID {} not found.", table.label, id));
                    }
                }
                Check::Failed(message) => errors.push(message),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(violations = errors.len(), "validation failed");
            Err(AppError::Validation(errors.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CITIES, DEPARTMENTS};
    use crate::store::{MemoryStore, Row};
    use chrono::Utc;

    async fn city(store: &MemoryStore) -> i64 {
        let mut row = Row::new();
        row.insert("name", "Samarkand".into());
        row.insert("created_date", Utc::now().into());
        row.insert("last_updated_date", Utc::now().into());
        row.insert("is_deleted", false.into());
        store.insert(&CITIES, row).await.unwrap()["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn passes_when_everything_resolves() {
        let store = MemoryStore::new();
        let id = city(&store).await;
        ReferentialValidator::new()
            .reference(&CITIES, id)
            .gender(&RawEnum::Name("Male".into()))
            .name("Ali")
            .mark(100.0)
            .validate(&store)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reports_every_violation_in_order() {
        let store = MemoryStore::new();
        let id = city(&store).await;
        let err = ReferentialValidator::new()
            .reference(&CITIES, id)
            .reference(&DEPARTMENTS, 42)
            .gender(&RawEnum::Code(5))
            .validate(&store)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(m) => {
                assert_eq!(m, "Department with ID 42 not found. Invalid gender value: 5")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn value_checks_need_no_lookup() {
        let store = MemoryStore::new();
        let v = ReferentialValidator::new().mark(101.0).name("   ");
        assert!(!v.is_empty());
        let err = v.validate(&store).await.unwrap_err();
        assert!(err.to_string().contains("Mark must be between 0 and 100"));
        assert!(err.to_string().contains("Name is required."));
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(ReferentialValidator::new().name(&long).validate(&store).await.is_err());
        assert!(ReferentialValidator::new().optional_reference(&CITIES, None).is_empty());
    }

    #[tokio::test]
    async fn mark_accepts_whole_floats_only() {
        let store = MemoryStore::new();
        assert!(ReferentialValidator::new().mark(85.0).validate(&store).await.is_ok());
        assert!(ReferentialValidator::new().mark(0.0).validate(&store).await.is_ok());
        match ReferentialValidator::new().mark(85.5).validate(&store).await {
            Err(AppError::Validation(m)) => assert_eq!(m, "Mark must be a whole number, got 85.5."),
            other => panic!("unexpected {:?}", other),
        }
        match ReferentialValidator::new().mark(-1.0).validate(&store).await {
            Err(AppError::Validation(m)) => assert_eq!(m, "Mark must be between 0 and 100, got -1."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn name_length_ignores_surrounding_whitespace() {
        let store = MemoryStore::new();
        let padded = format!("  {}  ", "a".repeat(MAX_NAME_LENGTH));
        assert!(ReferentialValidator::new().name(&padded).validate(&store).await.is_ok());
        let over = format!(" {} ", "a".repeat(MAX_NAME_LENGTH + 1));
        assert!(ReferentialValidator::new().name(&over).validate(&store).await.is_err());
    }
}
