//! Price proposals and the auto-pricing rule.

use crate::models::CycleTag;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Lifecycle of a price proposal. Status only ever moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Generated by a cycle, awaiting review
    Pending,
    /// Accepted by a reviewer
    Approved,
    /// Sent to the point-of-sale system
    Pushed,
}

impl ProposalStatus {
    /// The lowercase wire/database spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Pushed => "pushed",
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProposalStatus::Pending),
            "approved" => Ok(ProposalStatus::Approved),
            "pushed" => Ok(ProposalStatus::Pushed),
            other => Err(format!("unknown proposal status {other:?}")),
        }
    }
}

/// A suggested retail price for one product in one cycle.
///
/// `auto_price` is what the cycle computed; a reviewer may record an
/// `edited_price`, which supersedes it from then on.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PriceProposal {
    /// Row identifier
    pub id: i64,
    /// Product SKU
    pub sku: String,
    /// The pricing cycle that generated the proposal
    pub cycle_tag: CycleTag,
    /// Machine-computed price
    #[schemars(schema_with = "crate::models::decimal_schema")]
    pub auto_price: Decimal,
    /// Reviewer override, when present
    #[schemars(schema_with = "crate::models::decimal_schema")]
    pub edited_price: Option<Decimal>,
    /// Review status
    pub status: ProposalStatus,
}

impl PriceProposal {
    /// The price that would be applied: the reviewer's edit when there
    /// is one, the computed price otherwise.
    pub fn effective_price(&self) -> Decimal {
        self.edited_price.unwrap_or(self.auto_price)
    }
}

/// Proposal data ready for insertion (pending, no edit yet).
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    /// Product SKU
    pub sku: String,
    /// Machine-computed price
    pub auto_price: Decimal,
}

/// Filters for listing proposals.
#[derive(Debug, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProposalQuery {
    /// Restrict to one pricing cycle
    #[serde(default)]
    pub cycle: Option<CycleTag>,
    /// Restrict to one review status
    #[serde(default)]
    pub status: Option<ProposalStatus>,
}

/// Compute the proposed retail price from the best vendor cost.
///
/// The rule is cost-plus: the price that yields `target_margin` gross
/// margin on the cheapest quoted cost, rounded half-up to cents. A
/// margin outside `[0, 1)` is treated as zero margin (the cost itself).
pub fn auto_price(min_cost: Decimal, target_margin: Decimal) -> Decimal {
    let price = if target_margin >= Decimal::ZERO && target_margin < Decimal::ONE {
        min_cost / (Decimal::ONE - target_margin)
    } else {
        min_cost
    };
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
