//! Proposal data model.
//!
//! Status is derived (see `status.rs`) and never stored on `Proposal`.

pub use crate::crypto::Address;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proposal identifier (`>= 1`).
pub type ProposalId = u64;

/// Arbitrary-precision vote weight sum.
pub type Tally = BigUint;

/// Proposal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalType {
    Integration,
    Parameter,
    Upgrade,
    Funding,
}

impl ProposalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integration => "integration",
            Self::Parameter => "parameter",
            Self::Upgrade => "upgrade",
            Self::Funding => "funding",
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integration" => Ok(Self::Integration),
            "parameter" => Ok(Self::Parameter),
            "upgrade" => Ok(Self::Upgrade),
            "funding" => Ok(Self::Funding),
            other => Err(format!(
                "unknown proposalType '{}' (expected integration, parameter, upgrade or funding)",
                other
            )),
        }
    }
}

/// One on-chain action attached to a proposal. Opaque to the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalAction {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub calldata: String,
}

/// Derived lifecycle token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Active,
    Succeeded,
    Defeated,
    Executed,
    Canceled,
    Expired,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Pending,
        Status::Active,
        Status::Succeeded,
        Status::Defeated,
        Status::Executed,
        Status::Canceled,
        Status::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Active => "active",
            Status::Succeeded => "succeeded",
            Status::Defeated => "defeated",
            Status::Executed => "executed",
            Status::Canceled => "canceled",
            Status::Expired => "expired",
        }
    }

    /// Case-insensitive lookup; `None` for unknown tokens.
    pub fn parse(token: &str) -> Option<Status> {
        Status::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub for_votes: Tally,
    pub against_votes: Tally,
    pub executed: bool,
    pub canceled: bool,
    pub proposal_type: ProposalType,
    pub actions: Vec<ProposalAction>,
    pub created_at: u64,
}

/// Proposal content before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub proposal_type: ProposalType,
    pub actions: Vec<ProposalAction>,
    pub created_at: u64,
    pub start_time: u64,
    pub end_time: u64,
}

impl ProposalDraft {
    /// Materialize with zero tallies and cleared flags.
    pub fn into_proposal(self, id: ProposalId) -> Proposal {
        Proposal {
            id,
            title: self.title,
            description: self.description,
            proposer: self.proposer,
            start_time: self.start_time,
            end_time: self.end_time,
            for_votes: Tally::default(),
            against_votes: Tally::default(),
            executed: false,
            canceled: false,
            proposal_type: self.proposal_type,
            actions: self.actions,
            created_at: self.created_at,
        }
    }
}

/// A single voter's ballot on a proposal (append-only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    pub support: bool,
    pub weight: Tally,
    pub timestamp: u64,
}

/// Both sides of a proposal's tally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tallies {
    pub for_votes: Tally,
    pub against_votes: Tally,
}

/// Wire form of a proposal with its stamped status.
///
/// Tallies are decimal strings to avoid precision loss in JSON clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalView {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub for_votes: String,
    pub against_votes: String,
    pub executed: bool,
    pub canceled: bool,
    pub proposal_type: ProposalType,
    pub actions: Vec<ProposalAction>,
    pub created_at: u64,
    pub status: Status,
}

impl ProposalView {
    pub fn stamp(proposal: Proposal, status: Status) -> Self {
        Self {
            id: proposal.id,
            title: proposal.title,
            description: proposal.description,
            proposer: proposal.proposer,
            start_time: proposal.start_time,
            end_time: proposal.end_time,
            for_votes: proposal.for_votes.to_str_radix(10),
            against_votes: proposal.against_votes.to_str_radix(10),
            executed: proposal.executed,
            canceled: proposal.canceled,
            proposal_type: proposal.proposal_type,
            actions: proposal.actions,
            created_at: proposal.created_at,
            status,
        }
    }
}
