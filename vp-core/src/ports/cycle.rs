use crate::models::{CycleSummary, CycleTag, NewMovement, NewVendorCost, StagedCost, StagedMovement};

/// Repository interface for per-cycle data: staging rows, canonical
/// movement/cost rows, and summaries.
///
/// Every writer here has replace semantics for its cycle tag, so
/// re-running an ingestion cycle converges instead of duplicating.
pub trait CycleRepository: super::Repository {
    /// Replace the staging rows for a cycle with a fresh extraction.
    fn replace_staging(
        &self,
        cycle: &CycleTag,
        movement: &[StagedMovement],
        costs: &[StagedCost],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Replace the canonical movement rows for a cycle.
    ///
    /// Returns the number of rows written.
    fn replace_movement(
        &self,
        cycle: &CycleTag,
        rows: &[NewMovement],
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Replace the canonical vendor cost rows for a cycle.
    ///
    /// Returns the number of rows written.
    fn replace_vendor_costs(
        &self,
        cycle: &CycleTag,
        rows: &[NewVendorCost],
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Row-count breakdown of a past cycle.
    ///
    /// `None` when the store has no data at all for the tag.
    fn cycle_summary(
        &self,
        cycle: &CycleTag,
    ) -> impl Future<Output = Result<Option<CycleSummary>, Self::Error>> + Send;
}
