mod admin;
mod catalog;
mod cycle;
mod proposal;
mod staging;
mod upc;
mod vendor;

pub use admin::{TableDump, TableInfo};
pub use catalog::{Movement, NewMovement, NewVendorCost, PriceChangeLog, Product, VendorCost};
pub use cycle::{
    CycleReport, CycleSummary, CycleTag, IdentifiedFile, InvalidCycleTag, StatusCount,
    VendorCostCount, VendorMatchStats,
};
pub use proposal::{PriceProposal, ProposalDraft, ProposalQuery, ProposalStatus, auto_price};
pub use staging::{StagedCost, StagedMovement};
pub use upc::{canonical, match_key};
pub use vendor::{ColumnMap, Detection, Vendor, detect_rainforest, detect_vendor};

/// JSON schema for [`rust_decimal::Decimal`] fields.
///
/// The decimal crate serializes as a numeric string; schemars has no
/// built-in knowledge of the type.
pub(crate) fn decimal_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "format": "decimal",
    })
}

/// JSON schema for [`time::OffsetDateTime`] fields serialized as RFC3339.
pub(crate) fn time_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "format": "date-time",
    })
}
