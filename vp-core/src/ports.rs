mod admin;
mod application;
mod catalog;
mod cycle;
mod proposal;

pub use admin::AdminRepository;
pub use application::Application;
pub use catalog::CatalogRepository;
pub use cycle::CycleRepository;
pub use proposal::{ProposalFailure, ProposalRepository};

/// Base trait for every repository port: names the backend's error type.
///
/// Domain-level failures (an unknown proposal, a status conflict) are not
/// errors in this sense; ports express those as an inner `Result` so the
/// caller can tell "the database broke" apart from "the request was
/// wrong".
pub trait Repository {
    /// The backend's transport/storage error type
    type Error: std::error::Error + Send + Sync + 'static;
}
