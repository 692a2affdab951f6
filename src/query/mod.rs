//! Resource-query pipeline: parameters, filters, ordering and pagination.

pub mod filter;
pub mod order;
pub mod page;
pub mod params;

pub use filter::{Field, FilterPipeline, Predicate};
pub use order::{Direction, OrderSpec, OrderTerm, OrderingResolver, SortKey};
pub use page::{paginate, Page, PageMeta};
pub use params::{CommonFilters, PageRequest, QueryMap, ResourceParameters};

use crate::schema::TableDef;

/// A filtered, ordered selection over one table. Stores turn this into rows.
#[derive(Clone, Debug)]
pub struct SelectPlan {
    pub table: &'static TableDef,
    pub predicates: Vec<Predicate>,
    pub order: OrderSpec,
}

impl SelectPlan {
    pub fn new(table: &'static TableDef, predicates: Vec<Predicate>, order: OrderSpec) -> Self {
        SelectPlan { table, predicates, order }
    }

    /// Every row of `table`, by id.
    pub fn all(table: &'static TableDef) -> Self {
        SelectPlan::new(table, Vec::new(), OrderSpec::by_id())
    }
}
