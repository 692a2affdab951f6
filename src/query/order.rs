//! Sort-key resolution against a closed per-resource vocabulary.

use crate::query::filter::Field;
use crate::schema::ID;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrderTerm {
    pub field: Field,
    pub direction: Direction,
}

impl OrderTerm {
    pub fn asc(field: Field) -> Self {
        OrderTerm { field, direction: Direction::Asc }
    }

    pub fn desc(field: Field) -> Self {
        OrderTerm { field, direction: Direction::Desc }
    }
}

/// Ordered list of terms. Always ends with `id ASC`, so rows that tie on the
/// requested key still come back in a stable order across pages.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    pub fn by_id() -> Self {
        OrderSpec { terms: vec![OrderTerm::asc(Field::Column(ID))] }
    }

    pub fn then_id(term: OrderTerm) -> Self {
        if term == OrderTerm::asc(Field::Column(ID)) {
            return OrderSpec::by_id();
        }
        OrderSpec { terms: vec![term, OrderTerm::asc(Field::Column(ID))] }
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }
}

/// A resource's sort vocabulary.
pub trait SortKey: Copy + fmt::Debug + Send + Sync + 'static {
    /// Match an already lowercased key.
    fn parse(key: &str) -> Option<Self>;

    fn term(self) -> OrderTerm;
}

pub struct OrderingResolver;

impl OrderingResolver {
    /// Case-insensitive lookup. Unknown or empty keys fall back to ascending id.
    pub fn resolve<K: SortKey>(raw: &str) -> OrderSpec {
        let key = raw.trim().to_lowercase();
        match K::parse(&key) {
            Some(k) => OrderSpec::then_id(k.term()),
            None => {
                if !key.is_empty() {
                    tracing::debug!(order_by = %raw, "unknown sort key, ordering by id");
                }
                OrderSpec::by_id()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug)]
    enum Demo {
        Name,
        NameDesc,
        Id,
    }

    impl SortKey for Demo {
        fn parse(key: &str) -> Option<Self> {
            match key {
                "name" => Some(Demo::Name),
                "namedesc" => Some(Demo::NameDesc),
                "id" => Some(Demo::Id),
                _ => None,
            }
        }

        fn term(self) -> OrderTerm {
            match self {
                Demo::Name => OrderTerm::asc(Field::Column("name")),
                Demo::NameDesc => OrderTerm::desc(Field::Column("name")),
                Demo::Id => OrderTerm::asc(Field::Column(ID)),
            }
        }
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(
            OrderingResolver::resolve::<Demo>("NameDesc"),
            OrderingResolver::resolve::<Demo>("namedesc")
        );
        assert_eq!(
            OrderingResolver::resolve::<Demo>(" NAME ").terms()[0],
            OrderTerm::asc(Field::Column("name"))
        );
    }

    #[test]
    fn unknown_and_empty_fall_back_to_id() {
        assert_eq!(OrderingResolver::resolve::<Demo>("shoe_size"), OrderSpec::by_id());
        assert_eq!(OrderingResolver::resolve::<Demo>(""), OrderSpec::by_id());
    }

    #[test]
    fn id_tiebreak_is_appended_once() {
        let spec = OrderingResolver::resolve::<Demo>("namedesc");
        assert_eq!(
            spec.terms(),
            &[OrderTerm::desc(Field::Column("name")), OrderTerm::asc(Field::Column(ID))]
        );
        assert_eq!(OrderingResolver::resolve::<Demo>("id").terms().len(), 1);
    }
}
