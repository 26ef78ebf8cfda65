use crate::models::{CycleReport, CycleTag};
use crate::ports::{AdminRepository, CatalogRepository, CycleRepository, ProposalRepository};
use time::OffsetDateTime;

/// The application port: everything the HTTP layer needs from the rest
/// of the system, specified upfront and in one place so handlers can be
/// written against a single generic parameter.
pub trait Application: Clone + Send + Sync + 'static {
    /// The storage backend
    type Repository: CatalogRepository
        + CycleRepository
        + ProposalRepository
        + AdminRepository
        + Clone
        + Send
        + Sync
        + 'static;

    /// Error type of a failed ingestion cycle
    type IngestError: std::error::Error + Send + Sync + 'static;

    /// Access the storage backend.
    fn database(&self) -> &Self::Repository;

    /// The current wall-clock time.
    fn now(&self) -> OffsetDateTime;

    /// Run one full ingestion cycle (mailbox download through proposal
    /// generation) for the given tag.
    fn run_cycle(
        &self,
        cycle: CycleTag,
    ) -> impl Future<Output = Result<CycleReport, Self::IngestError>> + Send;
}
