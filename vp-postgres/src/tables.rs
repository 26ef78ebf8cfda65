//! The fixed table registry.
//!
//! Admin operations (dumps, counts, clears) never interpolate a
//! caller-supplied name into SQL: the name is first resolved against
//! this registry, and only the registry's own `&'static str` reaches a
//! query string.

/// Every table the service owns, in presentation order.
pub(crate) const TABLES: [&str; 7] = [
    "products",
    "movement",
    "vendor_cost",
    "price_change_log",
    "price_proposal",
    "movement_staging",
    "vendor_cost_staging",
];

/// The same tables in deletion order: FK children before `products`.
pub(crate) const CLEAR_ORDER: [&str; 7] = [
    "movement",
    "vendor_cost",
    "price_change_log",
    "price_proposal",
    "movement_staging",
    "vendor_cost_staging",
    "products",
];

/// Resolve a caller-supplied name to the registry's static string.
pub(crate) fn resolve(name: &str) -> Option<&'static str> {
    TABLES.iter().find(|t| **t == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_order_is_a_permutation_with_products_last() {
        let mut sorted_tables = TABLES;
        let mut sorted_clear = CLEAR_ORDER;
        sorted_tables.sort_unstable();
        sorted_clear.sort_unstable();
        assert_eq!(sorted_tables, sorted_clear);
        assert_eq!(CLEAR_ORDER.last(), Some(&"products"));
    }

    #[test]
    fn resolve_rejects_unknown_names() {
        assert_eq!(resolve("products"), Some("products"));
        assert_eq!(resolve("pg_catalog.pg_tables"), None);
        assert_eq!(resolve("products; drop table products"), None);
    }
}
