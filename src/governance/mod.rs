//! Governance proposal lifecycle and authenticated voting.
//!
//! Proposals are stored without a status; status is derived from the clock
//! at read time (see `status`). Writes are authenticated by wallet signature
//! over a canonical message (see `admission`).

pub mod admission;
pub mod clock;
pub mod error;
pub mod query;
pub mod service;
pub mod status;
pub mod types;

#[cfg(test)]
mod proptests;

pub use admission::{
    create_message, parse_proposal_id, vote_message, CreateProposalRequest, VoteRequest,
    DESCRIPTION_LENGTH, TITLE_LENGTH,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{GovernanceError, GovernanceResult};
pub use query::{ListParams, ListQuery, ProposalPage, DEFAULT_LIMIT, MAX_LIMIT};
pub use service::{
    CreateReceipt, GovernanceService, GovernanceSettings, TallySnapshot, VoteReceipt,
};
pub use status::{derive_status, StatusEngine};
pub use types::{
    Proposal, ProposalAction, ProposalDraft, ProposalId, ProposalType, ProposalView, Status,
    Tallies, Tally, VoteRecord,
};
