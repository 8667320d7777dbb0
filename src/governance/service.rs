//! Governance service: list, get, create, vote.
//!
//! Vote request flow:
//! received -> validated -> authenticated -> proposal-fetched -> status-gated
//! -> tally-updated -> responded
//!
//! Any step may short-circuit with a `GovernanceError`. The response is built
//! from the tallies `add_vote` returns, so it always reflects the update.

use super::admission::{CreateProposalRequest, VoteRequest};
use super::clock::{Clock, SystemClock};
use super::error::{GovernanceError, GovernanceResult};
use super::query::{AddressFilter, ListParams, ListQuery, ProposalPage};
use super::status::StatusEngine;
use super::types::{
    Proposal, ProposalDraft, ProposalId, ProposalView, Status, Tally, VoteRecord,
};
use crate::crypto::{transaction_hash, Address, Signature, SignatureVerifier};
use crate::store::ProposalStore;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default delay between creation and the start of voting (1 day).
pub const DEFAULT_VOTING_DELAY_SECS: u64 = 86_400;

/// Default voting window length (7 days).
pub const DEFAULT_VOTING_PERIOD_SECS: u64 = 604_800;

/// Tunables for proposal timing and request acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceSettings {
    /// Seconds from creation to `start_time`. Clamped to at least 1 so a new
    /// proposal is always `pending`.
    pub voting_delay: u64,
    /// Seconds from `start_time` to `end_time`.
    pub voting_period: u64,
    /// Enables `expired` for succeeded proposals left unexecuted this long.
    pub execution_window: Option<u64>,
    /// When set, requests for any other network are rejected.
    pub network_id: Option<u64>,
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self {
            voting_delay: DEFAULT_VOTING_DELAY_SECS,
            voting_period: DEFAULT_VOTING_PERIOD_SECS,
            execution_window: None,
            network_id: None,
        }
    }
}

/// Response payload for a created proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceipt {
    pub proposal_id: ProposalId,
    pub transaction_hash: String,
}

/// Post-vote tallies as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallySnapshot {
    pub id: ProposalId,
    pub for_votes: String,
    pub against_votes: String,
}

/// Response payload for an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub transaction_hash: String,
    pub proposal: TallySnapshot,
}

/// Composes store, verifier and status engine into the four operations.
///
/// Holds no mutable state of its own; the store is the only shared resource.
pub struct GovernanceService {
    store: Arc<dyn ProposalStore>,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
    engine: StatusEngine,
    settings: GovernanceSettings,
}

impl GovernanceService {
    pub fn new(
        store: Arc<dyn ProposalStore>,
        verifier: Arc<dyn SignatureVerifier>,
        settings: GovernanceSettings,
    ) -> Self {
        let engine = match settings.execution_window {
            Some(window) => StatusEngine::with_execution_window(window),
            None => StatusEngine::new(),
        };
        Self {
            store,
            verifier,
            clock: Arc::new(SystemClock),
            engine,
            settings,
        }
    }

    /// Replace the wall clock (tests, replay tooling).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &GovernanceSettings {
        &self.settings
    }

    /// Current status of `proposal`.
    pub fn status_of(&self, proposal: &Proposal) -> Status {
        self.engine.status(proposal, self.clock.now())
    }

    /// `GET /governance/proposals`
    pub async fn list_proposals(&self, params: &ListParams) -> GovernanceResult<ProposalPage> {
        let query = ListQuery::parse(params)?;
        let now = self.clock.now();

        let stamped: Vec<ProposalView> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(|p| {
                let status = self.engine.status(&p, now);
                ProposalView::stamp(p, status)
            })
            .collect();

        let voted = match query.voter {
            Some(AddressFilter::Address(voter)) => {
                let candidates = stamped
                    .iter()
                    .filter(|view| query.matches_local(view))
                    .map(|view| view.id);
                self.voted_set(candidates, voter).await?
            }
            _ => HashSet::new(),
        };

        let page = query.filter_and_paginate(stamped, |id| voted.contains(&id));
        debug!(
            total = page.total,
            returned = page.proposals.len(),
            offset = page.offset,
            limit = page.limit,
            "listed proposals"
        );
        Ok(page)
    }

    async fn voted_set(
        &self,
        ids: impl Iterator<Item = ProposalId>,
        voter: Address,
    ) -> GovernanceResult<HashSet<ProposalId>> {
        let checks = ids.map(|id| {
            let store = Arc::clone(&self.store);
            async move { store.has_voted(id, &voter).await.map(|voted| (id, voted)) }
        });
        let results = try_join_all(checks).await?;
        Ok(results
            .into_iter()
            .filter_map(|(id, voted)| voted.then_some(id))
            .collect())
    }

    /// `GET /governance/proposal?id=N`
    pub async fn get_proposal(&self, id: ProposalId) -> GovernanceResult<ProposalView> {
        let proposal = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(GovernanceError::NotFound(id))?;
        let status = self.status_of(&proposal);
        Ok(ProposalView::stamp(proposal, status))
    }

    /// `POST /governance/proposal`
    pub async fn create_proposal(
        &self,
        request: &CreateProposalRequest,
    ) -> GovernanceResult<CreateReceipt> {
        let admitted = request.admit()?;
        self.check_network(admitted.network_id)?;

        let message = admitted.message();
        self.authenticate(&message, &admitted.signature, &admitted.address)?;

        let now = self.clock.now();
        let start_time = now.saturating_add(self.settings.voting_delay.max(1));
        let end_time = start_time.saturating_add(self.settings.voting_period);

        let draft = ProposalDraft {
            title: admitted.title,
            description: admitted.description,
            proposer: admitted.address,
            proposal_type: admitted.proposal_type,
            actions: admitted.actions,
            created_at: now,
            start_time,
            end_time,
        };
        let proposal_id = self.store.append(draft).await?;
        let tx_hash = transaction_hash(&message, &admitted.signature, proposal_id);

        info!(
            proposal_id,
            proposer = %admitted.address,
            proposal_type = %admitted.proposal_type,
            start_time,
            end_time,
            "proposal created"
        );

        Ok(CreateReceipt {
            proposal_id,
            transaction_hash: tx_hash,
        })
    }

    /// `POST /governance/vote`
    pub async fn vote(&self, request: &VoteRequest) -> GovernanceResult<VoteReceipt> {
        // validated
        let admitted = request.admit()?;
        self.check_network(admitted.network_id)?;

        // authenticated
        let message = admitted.message();
        self.authenticate(&message, &admitted.signature, &admitted.address)?;

        // proposal-fetched
        let id = admitted.proposal_id;
        let proposal = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(GovernanceError::NotFound(id))?;

        // status-gated
        let now = self.clock.now();
        let status = self.engine.status(&proposal, now);
        if status != Status::Active {
            debug!(proposal_id = id, %status, "vote rejected: proposal not active");
            return Err(GovernanceError::InvalidState(
                "proposal not active".to_string(),
            ));
        }
        if self.store.has_voted(id, &admitted.address).await? {
            return Err(GovernanceError::InvalidState("already voted".to_string()));
        }

        // tally-updated
        let ballot = VoteRecord {
            support: admitted.support,
            weight: Tally::from(1u8),
            timestamp: now,
        };
        let tallies = self.store.add_vote(id, &admitted.address, ballot).await?;

        info!(
            proposal_id = id,
            voter = %admitted.address,
            support = admitted.support,
            "vote recorded"
        );

        // responded
        Ok(VoteReceipt {
            transaction_hash: transaction_hash(&message, &admitted.signature, id),
            proposal: TallySnapshot {
                id,
                for_votes: tallies.for_votes.to_str_radix(10),
                against_votes: tallies.against_votes.to_str_radix(10),
            },
        })
    }

    fn check_network(&self, network_id: u64) -> GovernanceResult<()> {
        match self.settings.network_id {
            Some(expected) if expected != network_id => Err(GovernanceError::invalid_input(
                format!("unsupported networkId {} (expected {})", network_id, expected),
            )),
            _ => Ok(()),
        }
    }

    fn authenticate(
        &self,
        message: &str,
        signature: &Signature,
        claimed: &Address,
    ) -> GovernanceResult<()> {
        if self.verifier.verify(message, signature, claimed)? {
            Ok(())
        } else {
            warn!(address = %claimed, "signature does not recover to claimed address");
            Err(GovernanceError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{address_of, sign_message, EthereumVerifier};
    use crate::governance::clock::ManualClock;
    use crate::store::InMemoryProposalStore;
    use secp256k1::SecretKey;
    use serde_json::json;

    const NOW: u64 = 1_700_000_000;

    fn service(store: &InMemoryProposalStore, settings: GovernanceSettings) -> GovernanceService {
        GovernanceService::new(
            Arc::new(store.clone()),
            Arc::new(EthereumVerifier::new()),
            settings,
        )
        .with_clock(Arc::new(ManualClock::new(NOW)))
    }

    fn key() -> SecretKey {
        SecretKey::from_slice(&[0x42; 32]).unwrap()
    }

    fn create_request(title: &str, network_id: u64) -> CreateProposalRequest {
        let key = key();
        CreateProposalRequest {
            title: Some(title.to_string()),
            description: Some("p".repeat(200)),
            proposal_type: Some("upgrade".to_string()),
            actions: None,
            address: Some(address_of(&key).to_string()),
            network_id: Some(json!(network_id)),
            signature: Some(sign_message(&key, &format!("Create Proposal: {}", title)).to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_sets_voting_window() {
        let store = InMemoryProposalStore::new();
        let settings = GovernanceSettings {
            voting_delay: 60,
            voting_period: 3_600,
            ..Default::default()
        };
        let svc = service(&store, settings);

        let receipt = svc.create_proposal(&create_request("Upgrade core", 1)).await.unwrap();
        assert_eq!(receipt.proposal_id, 1);
        assert!(receipt.transaction_hash.starts_with("0x"));

        let view = svc.get_proposal(1).await.unwrap();
        assert_eq!(view.created_at, NOW);
        assert_eq!(view.start_time, NOW + 60);
        assert_eq!(view.end_time, NOW + 3_660);
        assert_eq!(view.status, Status::Pending);
        assert_eq!(view.proposer, address_of(&key()));
    }

    #[tokio::test]
    async fn test_zero_delay_still_starts_in_future() {
        let store = InMemoryProposalStore::new();
        let settings = GovernanceSettings {
            voting_delay: 0,
            ..Default::default()
        };
        let svc = service(&store, settings);
        svc.create_proposal(&create_request("Upgrade core", 1)).await.unwrap();
        assert_eq!(svc.get_proposal(1).await.unwrap().status, Status::Pending);
    }

    #[tokio::test]
    async fn test_network_id_enforced_when_configured() {
        let store = InMemoryProposalStore::new();
        let settings = GovernanceSettings {
            network_id: Some(1),
            ..Default::default()
        };
        let svc = service(&store, settings);

        let err = svc
            .create_proposal(&create_request("Upgrade core", 5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid-input");
        assert_eq!(store.append_calls(), 0);

        assert!(svc.create_proposal(&create_request("Upgrade core", 1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_signature_over_other_title_is_unauthorized() {
        let store = InMemoryProposalStore::new();
        let svc = service(&store, GovernanceSettings::default());

        let mut req = create_request("Upgrade core", 1);
        req.title = Some("Upgrade everything".to_string());
        let err = svc.create_proposal(&req).await.unwrap_err();
        assert_eq!(err, GovernanceError::Unauthorized);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_proposal() {
        let store = InMemoryProposalStore::new();
        let svc = service(&store, GovernanceSettings::default());
        assert_eq!(
            svc.get_proposal(99).await.unwrap_err(),
            GovernanceError::NotFound(99)
        );
    }

    #[tokio::test]
    async fn test_execution_window_setting_reaches_engine() {
        let store = InMemoryProposalStore::new();
        let settings = GovernanceSettings {
            voting_delay: 1,
            voting_period: 10,
            execution_window: Some(100),
            ..Default::default()
        };
        let clock = Arc::new(ManualClock::new(NOW));
        let svc = GovernanceService::new(
            Arc::new(store.clone()),
            Arc::new(EthereumVerifier::new()),
            settings,
        )
        .with_clock(clock.clone());

        svc.create_proposal(&create_request("Upgrade core", 1)).await.unwrap();
        clock.set(NOW + 5);
        let voter = key();
        let vote = VoteRequest {
            proposal_id: Some(json!(1)),
            support: Some(true),
            address: Some(address_of(&voter).to_string()),
            network_id: Some(json!(1)),
            signature: Some(sign_message(&voter, "Vote For Proposal 1").to_string()),
        };
        svc.vote(&vote).await.unwrap();

        clock.set(NOW + 12);
        assert_eq!(svc.get_proposal(1).await.unwrap().status, Status::Succeeded);
        clock.set(NOW + 112);
        assert_eq!(svc.get_proposal(1).await.unwrap().status, Status::Expired);
    }
}
