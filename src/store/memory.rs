//! In-memory proposal store.
//!
//! Cloning shares the underlying state, so tests keep a handle for setup and
//! assertions while the service owns another.

use super::traits::*;
use crate::crypto::Address;
use crate::governance::types::{Proposal, ProposalDraft, ProposalId, Tallies, VoteRecord};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory `ProposalStore`.
#[derive(Clone, Default)]
pub struct InMemoryProposalStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: HashMap<(ProposalId, Address), VoteRecord>,
    next_id: ProposalId,
    add_vote_calls: usize,
    append_calls: usize,
    unavailable: bool,
}

impl InMemoryProposalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::BackendUnavailable("store lock poisoned".to_string()))?;
        if state.unavailable {
            return Err(StoreError::BackendUnavailable(
                "store marked unavailable".to_string(),
            ));
        }
        Ok(state)
    }

    fn lock_for_setup(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a fully-formed proposal (for fixtures). Keeps `next_id` ahead.
    pub fn insert(&self, proposal: Proposal) {
        let mut state = self.lock_for_setup();
        state.next_id = state.next_id.max(proposal.id);
        state.proposals.insert(proposal.id, proposal);
    }

    /// Set the executed flag. Returns `false` if the proposal is canceled.
    pub fn mark_executed(&self, id: ProposalId) -> StoreResult<bool> {
        let mut state = self.lock()?;
        let proposal = state.proposals.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if proposal.canceled {
            return Ok(false);
        }
        proposal.executed = true;
        Ok(true)
    }

    /// Set the canceled flag. Returns `false` if the proposal is executed.
    pub fn mark_canceled(&self, id: ProposalId) -> StoreResult<bool> {
        let mut state = self.lock()?;
        let proposal = state.proposals.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if proposal.executed {
            return Ok(false);
        }
        proposal.canceled = true;
        Ok(true)
    }

    /// Make every subsequent call fail with `BackendUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock_for_setup().unavailable = unavailable;
    }

    /// Number of `add_vote` calls received.
    pub fn add_vote_calls(&self) -> usize {
        self.lock_for_setup().add_vote_calls
    }

    /// Number of `append` calls received.
    pub fn append_calls(&self) -> usize {
        self.lock_for_setup().append_calls
    }

    /// Number of stored proposals.
    pub fn len(&self) -> usize {
        self.lock_for_setup().proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProposalStore for InMemoryProposalStore {
    async fn get_by_id(&self, id: ProposalId) -> StoreResult<Option<Proposal>> {
        let state = self.lock()?;
        Ok(state.proposals.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Proposal>> {
        let state = self.lock()?;
        Ok(state.proposals.values().cloned().collect())
    }

    async fn append(&self, draft: ProposalDraft) -> StoreResult<ProposalId> {
        let mut state = self.lock()?;
        state.append_calls += 1;
        state.next_id += 1;
        let id = state.next_id;
        state.proposals.insert(id, draft.into_proposal(id));
        Ok(id)
    }

    async fn add_vote(
        &self,
        id: ProposalId,
        voter: &Address,
        vote: VoteRecord,
    ) -> StoreResult<Tallies> {
        let mut state = self.lock()?;
        state.add_vote_calls += 1;

        if !state.proposals.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        if state.votes.contains_key(&(id, *voter)) {
            return Err(StoreError::AlreadyVoted);
        }

        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if vote.support {
            proposal.for_votes += &vote.weight;
        } else {
            proposal.against_votes += &vote.weight;
        }
        let tallies = Tallies {
            for_votes: proposal.for_votes.clone(),
            against_votes: proposal.against_votes.clone(),
        };

        state.votes.insert((id, *voter), vote);
        Ok(tallies)
    }

    async fn has_voted(&self, id: ProposalId, voter: &Address) -> StoreResult<bool> {
        let state = self.lock()?;
        Ok(state.votes.contains_key(&(id, *voter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::types::{ProposalType, Tally};

    fn draft(title: &str) -> ProposalDraft {
        ProposalDraft {
            title: title.to_string(),
            description: "d".repeat(120),
            proposer: Address::from_bytes([9; 20]),
            proposal_type: ProposalType::Upgrade,
            actions: vec![],
            created_at: 1,
            start_time: 2,
            end_time: 3,
        }
    }

    fn ballot(support: bool, weight: u64) -> VoteRecord {
        VoteRecord {
            support,
            weight: Tally::from(weight),
            timestamp: 2,
        }
    }

    #[tokio::test]
    async fn test_append_assigns_sequential_ids() {
        let store = InMemoryProposalStore::new();
        assert_eq!(store.append(draft("first")).await.unwrap(), 1);
        assert_eq!(store.append(draft("second")).await.unwrap(), 2);

        let listed = store.list().await.unwrap();
        assert_eq!(
            listed.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(listed[0].for_votes, Tally::default());
        assert!(!listed[0].executed && !listed[0].canceled);
    }

    #[tokio::test]
    async fn test_insert_keeps_ids_unique() {
        let store = InMemoryProposalStore::new();
        store.insert(draft("fixture").into_proposal(5));
        assert_eq!(store.append(draft("next")).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_add_vote_updates_tallies() {
        let store = InMemoryProposalStore::new();
        let id = store.append(draft("vote")).await.unwrap();
        let alice = Address::from_bytes([1; 20]);
        let bob = Address::from_bytes([2; 20]);

        let after_alice = store.add_vote(id, &alice, ballot(true, 3)).await.unwrap();
        assert_eq!(after_alice.for_votes, Tally::from(3u8));

        let after_bob = store.add_vote(id, &bob, ballot(false, 2)).await.unwrap();
        assert_eq!(after_bob.for_votes, Tally::from(3u8));
        assert_eq!(after_bob.against_votes, Tally::from(2u8));

        let stored = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.against_votes, Tally::from(2u8));
        assert!(store.has_voted(id, &alice).await.unwrap());
        assert!(!store.has_voted(id, &Address::from_bytes([3; 20])).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_vote_rejected() {
        let store = InMemoryProposalStore::new();
        let id = store.append(draft("dup")).await.unwrap();
        let alice = Address::from_bytes([1; 20]);

        store.add_vote(id, &alice, ballot(true, 1)).await.unwrap();
        let second = store.add_vote(id, &alice, ballot(false, 1)).await;
        assert_eq!(second, Err(StoreError::AlreadyVoted));

        let stored = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.against_votes, Tally::default());
    }

    #[tokio::test]
    async fn test_add_vote_unknown_proposal() {
        let store = InMemoryProposalStore::new();
        let result = store
            .add_vote(42, &Address::from_bytes([1; 20]), ballot(true, 1))
            .await;
        assert_eq!(result, Err(StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = InMemoryProposalStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.list().await,
            Err(StoreError::BackendUnavailable(_))
        ));
        assert!(matches!(
            store.get_by_id(1).await,
            Err(StoreError::BackendUnavailable(_))
        ));
        store.set_unavailable(false);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_executed_and_canceled_are_exclusive() {
        let store = InMemoryProposalStore::new();
        let id = store.append(draft("flags")).await.unwrap();
        assert!(store.mark_canceled(id).unwrap());
        assert!(!store.mark_executed(id).unwrap());
        assert!(store.get_by_id(id).await.unwrap().unwrap().canceled);
    }
}
