//! Canonical catalog entities: products, movement and vendor costs.

use crate::models::CycleTag;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A product in the canonical catalog.
///
/// The SKU is the canonical 12-digit UPC (see [`crate::models::canonical`]);
/// everything else is descriptive text taken from the most recent
/// point-of-sale movement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Product {
    /// Canonical 12-digit UPC, the primary key
    pub sku: String,
    /// Brand name, when known
    pub brand: Option<String>,
    /// Category label, when known
    pub category: Option<String>,
    /// Item description, when known
    pub item_name: Option<String>,
    /// Pack size, e.g. `1 EA`
    pub size: Option<String>,
}

/// One product's sales movement for one pricing cycle.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Movement {
    /// Row identifier
    pub id: i64,
    /// Product SKU
    pub sku: String,
    /// Units sold over the cycle, when the report carries a quantity
    pub units_sold: Option<i32>,
    /// Average retail price over the cycle
    #[schemars(schema_with = "crate::models::decimal_schema")]
    pub avg_price: Option<Decimal>,
    /// The pricing cycle the row belongs to
    pub cycle_tag: CycleTag,
}

/// Movement data ready for insertion (the id and cycle are assigned by
/// the store).
#[derive(Debug, Clone)]
pub struct NewMovement {
    /// Product SKU
    pub sku: String,
    /// Units sold over the cycle
    pub units_sold: Option<i32>,
    /// Average retail price over the cycle
    pub avg_price: Option<Decimal>,
}

/// One vendor's quoted unit cost for one product in one cycle.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VendorCost {
    /// Row identifier
    pub id: i64,
    /// Product SKU
    pub sku: String,
    /// Vendor the quote came from
    pub vendor_id: String,
    /// Quoted unit cost
    #[schemars(schema_with = "crate::models::decimal_schema")]
    pub cost: Decimal,
    /// The pricing cycle the quote belongs to
    pub cycle_tag: CycleTag,
}

/// Vendor cost data ready for insertion.
#[derive(Debug, Clone)]
pub struct NewVendorCost {
    /// Product SKU
    pub sku: String,
    /// Vendor the quote came from
    pub vendor_id: String,
    /// Quoted unit cost
    pub cost: Decimal,
}

/// An applied retail price change.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PriceChangeLog {
    /// Row identifier
    pub id: i64,
    /// Product SKU
    pub sku: String,
    /// The new retail price
    #[schemars(schema_with = "crate::models::decimal_schema")]
    pub new_price: Decimal,
    /// When the price takes effect
    #[schemars(schema_with = "crate::models::time_schema")]
    #[serde(with = "time::serde::rfc3339")]
    pub effective_date: OffsetDateTime,
}
