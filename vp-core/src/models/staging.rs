//! Raw per-cycle ingest rows, prior to promotion into the catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Vendor;

/// A row extracted from the point-of-sale movement report.
///
/// `upc_clean` is the cross-vendor match key, not the canonical SKU;
/// promotion derives the SKU from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedMovement {
    /// Cross-vendor match key
    pub upc_clean: String,
    /// Brand name, when the report carries one
    pub brand: Option<String>,
    /// Category label
    pub category: Option<String>,
    /// Item description
    pub item_name: Option<String>,
    /// Average retail price, when parseable
    pub avg_price: Option<Decimal>,
    /// Units sold, when the report carries a quantity
    pub units_sold: Option<i32>,
}

/// A row extracted from a vendor cost list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedCost {
    /// Cross-vendor match key
    pub upc_clean: String,
    /// The vendor the row came from
    pub vendor: Vendor,
    /// Quoted unit cost, when parseable
    pub cost: Option<Decimal>,
}
