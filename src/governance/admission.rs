//! Request admission for write operations.
//!
//! Checks field presence, shape and length. Signature recovery happens in the
//! service against the canonical message built here; those strings are part
//! of the wire protocol and must stay byte-identical.

use super::error::{GovernanceError, GovernanceResult};
use super::types::{ProposalAction, ProposalId, ProposalType};
use crate::crypto::{Address, Signature};
use serde::Deserialize;
use serde_json::Value;
use std::ops::RangeInclusive;

/// Allowed title length in characters.
pub const TITLE_LENGTH: RangeInclusive<usize> = 5..=100;

/// Allowed description length in characters.
pub const DESCRIPTION_LENGTH: RangeInclusive<usize> = 100..=10_000;

/// Message signed to create a proposal.
pub fn create_message(title: &str) -> String {
    format!("Create Proposal: {}", title)
}

/// Message signed to vote on a proposal.
pub fn vote_message(proposal_id: ProposalId, support: bool) -> String {
    if support {
        format!("Vote For Proposal {}", proposal_id)
    } else {
        format!("Vote Against Proposal {}", proposal_id)
    }
}

/// Body of `POST /governance/proposal`. Every field is optional on the wire
/// so absence surfaces as `invalid-input` rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub proposal_type: Option<String>,
    pub actions: Option<Vec<ProposalAction>>,
    pub address: Option<String>,
    pub network_id: Option<Value>,
    pub signature: Option<String>,
}

/// Body of `POST /governance/vote`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub proposal_id: Option<Value>,
    pub support: Option<bool>,
    pub address: Option<String>,
    pub network_id: Option<Value>,
    pub signature: Option<String>,
}

/// Shape-checked create request, not yet authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedCreate {
    pub title: String,
    pub description: String,
    pub proposal_type: ProposalType,
    pub actions: Vec<ProposalAction>,
    pub address: Address,
    pub network_id: u64,
    pub signature: Signature,
}

impl AdmittedCreate {
    pub fn message(&self) -> String {
        create_message(&self.title)
    }
}

/// Shape-checked vote request, not yet authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedVote {
    pub proposal_id: ProposalId,
    pub support: bool,
    pub address: Address,
    pub network_id: u64,
    pub signature: Signature,
}

impl AdmittedVote {
    pub fn message(&self) -> String {
        vote_message(self.proposal_id, self.support)
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> GovernanceResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> GovernanceError {
    GovernanceError::invalid_input(format!("missing required field '{}'", field))
}

fn check_length(value: &str, field: &str, range: &RangeInclusive<usize>) -> GovernanceResult<()> {
    let len = value.chars().count();
    if range.contains(&len) {
        Ok(())
    } else {
        Err(GovernanceError::invalid_input(format!(
            "{} must be {}-{} characters (got {})",
            field,
            range.start(),
            range.end(),
            len
        )))
    }
}

/// Non-negative integer from a JSON number or a decimal string.
fn integer_field(value: &Value, field: &str) -> GovernanceResult<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        GovernanceError::invalid_input(format!("{} must be a non-negative integer", field))
    })
}

fn parse_address(raw: &str) -> GovernanceResult<Address> {
    raw.parse::<Address>()
        .map_err(|_| GovernanceError::invalid_input("address must be 0x followed by 40 hex digits"))
}

fn parse_signature(raw: &str) -> GovernanceResult<Signature> {
    raw.parse::<Signature>().map_err(|_| {
        GovernanceError::invalid_input("signature must be 0x followed by 130 hex digits")
    })
}

fn positive_id(id: u64) -> GovernanceResult<ProposalId> {
    if id >= 1 {
        Ok(id)
    } else {
        Err(GovernanceError::invalid_input("proposalId must be >= 1"))
    }
}

impl CreateProposalRequest {
    /// Presence first, then lengths, then formats.
    pub fn admit(&self) -> GovernanceResult<AdmittedCreate> {
        let title = required(&self.title, "title")?;
        let description = required(&self.description, "description")?;
        let proposal_type = required(&self.proposal_type, "proposalType")?;
        let address = required(&self.address, "address")?;
        let network_id = self.network_id.as_ref().ok_or_else(|| missing("networkId"))?;
        let signature = required(&self.signature, "signature")?;

        check_length(title, "title", &TITLE_LENGTH)?;
        check_length(description, "description", &DESCRIPTION_LENGTH)?;

        Ok(AdmittedCreate {
            title: title.to_string(),
            description: description.to_string(),
            proposal_type: proposal_type
                .parse::<ProposalType>()
                .map_err(GovernanceError::InvalidInput)?,
            actions: self.actions.clone().unwrap_or_default(),
            address: parse_address(address)?,
            network_id: integer_field(network_id, "networkId")?,
            signature: parse_signature(signature)?,
        })
    }
}

impl VoteRequest {
    pub fn admit(&self) -> GovernanceResult<AdmittedVote> {
        let proposal_id = self.proposal_id.as_ref().ok_or_else(|| missing("proposalId"))?;
        let support = self.support.ok_or_else(|| missing("support"))?;
        let address = required(&self.address, "address")?;
        let network_id = self.network_id.as_ref().ok_or_else(|| missing("networkId"))?;
        let signature = required(&self.signature, "signature")?;

        Ok(AdmittedVote {
            proposal_id: positive_id(integer_field(proposal_id, "proposalId")?)?,
            support,
            address: parse_address(address)?,
            network_id: integer_field(network_id, "networkId")?,
            signature: parse_signature(signature)?,
        })
    }
}

/// Parse the `id` query parameter of `GET /governance/proposal`.
pub fn parse_proposal_id(raw: Option<&str>) -> GovernanceResult<ProposalId> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("id"))?;
    let id = raw
        .parse::<u64>()
        .map_err(|_| GovernanceError::invalid_input("id must be a positive integer"))?;
    positive_id(id)
}
