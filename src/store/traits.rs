//! Trait abstraction for proposal persistence.
//!
//! The service never touches a backend directly. The in-memory store backs
//! tests and ephemeral deployments; the SQLite store persists across
//! restarts. A chain-backed store would be a third implementation.

use crate::crypto::Address;
use crate::governance::types::{Proposal, ProposalDraft, ProposalId, Tallies, VoteRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced proposal does not exist.
    #[error("proposal {0} not found")]
    NotFound(ProposalId),

    /// Voter already has a record for this proposal.
    #[error("voter already voted on this proposal")]
    AlreadyVoted,

    /// Backend failure (I/O, lock poisoning, connection loss).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Proposal persistence capability.
///
/// Implementations encapsulate their own locking: `add_vote` must be atomic
/// per proposal, and `list` must enumerate in ascending id order.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Fetch one proposal.
    async fn get_by_id(&self, id: ProposalId) -> StoreResult<Option<Proposal>>;

    /// Enumerate every proposal, ascending by id.
    async fn list(&self) -> StoreResult<Vec<Proposal>>;

    /// Persist a new proposal and return its fresh id.
    async fn append(&self, draft: ProposalDraft) -> StoreResult<ProposalId>;

    /// Record a ballot and add its weight to the matching side.
    ///
    /// Returns the tallies after the update. Rejects a second ballot from the
    /// same voter with `StoreError::AlreadyVoted`.
    async fn add_vote(
        &self,
        id: ProposalId,
        voter: &Address,
        vote: VoteRecord,
    ) -> StoreResult<Tallies>;

    /// Whether `voter` has a ballot on proposal `id`.
    async fn has_voted(&self, id: ProposalId, voter: &Address) -> StoreResult<bool>;
}
