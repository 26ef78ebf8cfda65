use crate::models::{CycleTag, PriceProposal, ProposalDraft, ProposalQuery};
use rust_decimal::Decimal;

/// Domain-level reasons a proposal operation can be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalFailure {
    /// No proposal with that id
    DoesNotExist,
    /// The proposal is not in a status that permits the operation
    InvalidStatus,
}

/// Repository interface for price proposal review.
pub trait ProposalRepository: super::Repository {
    /// Replace a cycle's proposals with freshly generated drafts
    /// (pending, no edits).
    ///
    /// Returns the number of proposals written.
    fn replace_proposals(
        &self,
        cycle: &CycleTag,
        drafts: &[ProposalDraft],
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// List proposals matching the query, newest first.
    fn list_proposals(
        &self,
        query: &ProposalQuery,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<PriceProposal>, Self::Error>> + Send;

    /// Record a reviewer's price override on a pending proposal.
    fn edit_proposal(
        &self,
        id: i64,
        new_price: Decimal,
    ) -> impl Future<Output = Result<Result<PriceProposal, ProposalFailure>, Self::Error>> + Send;

    /// Move a pending proposal to approved.
    fn approve_proposal(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Result<PriceProposal, ProposalFailure>, Self::Error>> + Send;
}
