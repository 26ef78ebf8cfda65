//! Pricing-cycle identity and reporting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::models::{ProposalStatus, Vendor};

/// Error returned when a cycle tag fails validation.
#[derive(Debug, thiserror::Error)]
#[error("invalid cycle tag {0:?}: tags are 1-32 characters of [A-Za-z0-9_-]")]
pub struct InvalidCycleTag(pub String);

/// Label identifying one pricing period, e.g. `2025-02`.
///
/// Scheduled cycles derive their tag from the run's UTC year and month;
/// manually triggered cycles may use any short identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CycleTag(String);

impl schemars::JsonSchema for CycleTag {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> std::borrow::Cow<'static, str> {
        "CycleTag".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": "^[A-Za-z0-9_-]{1,32}$",
        })
    }
}

impl CycleTag {
    /// Validate and wrap a tag.
    pub fn new(tag: impl Into<String>) -> Result<Self, InvalidCycleTag> {
        let tag = tag.into();
        let ok = !tag.is_empty()
            && tag.len() <= 32
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if ok { Ok(Self(tag)) } else { Err(InvalidCycleTag(tag)) }
    }

    /// The tag for the pricing period containing `at`: its UTC year-month.
    pub fn from_datetime(at: OffsetDateTime) -> Self {
        let utc = at.to_offset(time::UtcOffset::UTC);
        Self(format!("{:04}-{:02}", utc.year(), u8::from(utc.month())))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CycleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CycleTag {
    type Err = InvalidCycleTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CycleTag {
    type Error = InvalidCycleTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CycleTag> for String {
    fn from(value: CycleTag) -> Self {
        value.0
    }
}

/// A downloaded file that was identified as a vendor feed.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct IdentifiedFile {
    /// The identified feed source
    pub vendor: Vendor,
    /// The attachment's file name
    pub file: String,
}

/// Per-vendor match statistics against the ECRS baseline.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VendorMatchStats {
    /// The vendor being matched
    pub vendor: Vendor,
    /// Rows staged from the vendor's file
    pub staged: u64,
    /// Rows whose match key appears in the baseline
    pub matched: u64,
    /// `matched` as a fraction of the baseline size
    pub match_rate: f64,
}

/// Everything one ingestion run did, returned to the caller and logged.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CycleReport {
    /// The cycle the run belonged to
    pub cycle_tag: CycleTag,
    /// File names downloaded from the mailbox
    pub files_found: Vec<String>,
    /// Files identified as vendor feeds, one per vendor
    pub identified: Vec<IdentifiedFile>,
    /// Files no signature matched
    pub unidentified: Vec<String>,
    /// Identified files set aside because a newer file won the vendor slot
    pub superseded: Vec<String>,
    /// Rows staged from the ECRS movement baseline
    pub baseline_rows: u64,
    /// Per-vendor staging and match statistics
    pub matches: Vec<VendorMatchStats>,
    /// Products inserted or updated during promotion
    pub products_upserted: u64,
    /// Canonical movement rows written
    pub movement_rows: u64,
    /// Canonical vendor cost rows written
    pub cost_rows: u64,
    /// Pending proposals generated
    pub proposals: u64,
}

/// Breakdown of a past cycle, read back from the store.
///
/// The per-vendor `matches` are rebuilt from the staging tables, so a
/// summary lines up with the [`CycleReport`] the run itself returned.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CycleSummary {
    /// The cycle summarized
    pub cycle_tag: CycleTag,
    /// Rows staged from the ECRS movement baseline
    pub baseline_rows: i64,
    /// Canonical movement rows for the cycle
    pub movement_rows: i64,
    /// Per-vendor staging and match statistics
    pub matches: Vec<VendorMatchStats>,
    /// Promoted vendor cost rows, per vendor
    pub vendor_costs: Vec<VendorCostCount>,
    /// Proposals, per review status
    pub proposals: Vec<StatusCount>,
}

/// Vendor cost row count for one vendor.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VendorCostCount {
    /// Vendor identifier as stored
    pub vendor_id: String,
    /// Number of cost rows
    pub rows: i64,
}

/// Proposal count for one review status.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StatusCount {
    /// The review status
    pub status: ProposalStatus,
    /// Number of proposals in that status
    pub rows: i64,
}

impl CycleReport {
    /// An empty report for a cycle that found nothing to ingest.
    pub fn empty(cycle_tag: CycleTag) -> Self {
        Self {
            cycle_tag,
            files_found: Vec::new(),
            identified: Vec::new(),
            unidentified: Vec::new(),
            superseded: Vec::new(),
            baseline_rows: 0,
            matches: Vec::new(),
            products_upserted: 0,
            movement_rows: 0,
            cost_rows: 0,
            proposals: 0,
        }
    }

    /// Map of vendor to identified file name.
    pub fn identified_by_vendor(&self) -> BTreeMap<Vendor, &str> {
        self.identified
            .iter()
            .map(|f| (f.vendor, f.file.as_str()))
            .collect()
    }
}
