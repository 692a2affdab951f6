//! Pagination: total count, page window and paging metadata.

use crate::error::AppError;
use crate::query::params::PageRequest;
use crate::query::SelectPlan;
use crate::store::{Row, Store};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total_count: u64) -> Self {
        let page_size = request.size().max(1);
        let total_pages = total_count.div_ceil(page_size as u64);
        let page_number = request.number();
        PageMeta {
            page_number,
            page_size,
            total_count,
            total_pages,
            has_previous: page_number > 1,
            has_next: (page_number as u64) < total_pages,
        }
    }

    /// Number of items a page with this metadata holds.
    #[cfg(test)]
    fn expected_len(&self) -> u64 {
        let skipped = (self.page_number as u64 - 1) * self.page_size as u64;
        self.total_count.saturating_sub(skipped).min(self.page_size as u64)
    }
}

#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page { items, meta: self.meta })
    }
}

/// Count the full filtered set, then fetch the requested window.
///
/// The two reads are separate store calls, so a concurrent writer can make the
/// count and the page disagree.
pub async fn paginate(
    store: &dyn Store,
    plan: &SelectPlan,
    request: PageRequest,
) -> Result<Page<Row>, AppError> {
    let total_count = store.count(plan).await?;
    let meta = PageMeta::new(request, total_count);
    let items = if request.offset() >= total_count {
        Vec::new()
    } else {
        store.select(plan, request.offset(), request.size() as u64).await?
    };
    tracing::debug!(
        table = plan.table.name,
        total_count,
        page = meta.page_number,
        returned = items.len(),
        "page"
    );
    Ok(Page { items, meta })
}
