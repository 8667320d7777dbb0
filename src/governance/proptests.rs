//! Property-based tests for governance status and list queries
//!
//! Tests for:
//! - Status: totality, time monotonicity, override dominance, tie-is-defeat
//! - Listing: pagination bounds, filter idempotence
//! - Voting: non-active proposals never reach the store

use super::query::{ListParams, ListQuery};
use super::service::{GovernanceService, GovernanceSettings};
use super::status::{derive_status, StatusEngine};
use super::types::{Proposal, ProposalType, ProposalView, Status, Tally};
use super::{ManualClock, VoteRequest};
use crate::crypto::{address_of, sign_message, Address, EthereumVerifier};
use crate::store::InMemoryProposalStore;
use proptest::prelude::*;
use secp256k1::SecretKey;
use std::sync::Arc;

fn proposal(start: u64, len: u64, for_votes: u64, against_votes: u64) -> Proposal {
    Proposal {
        id: 1,
        title: "Property proposal".to_string(),
        description: "d".repeat(100),
        proposer: Address::from_bytes([7; 20]),
        start_time: start,
        end_time: start.saturating_add(len),
        for_votes: Tally::from(for_votes),
        against_votes: Tally::from(against_votes),
        executed: false,
        canceled: false,
        proposal_type: ProposalType::Parameter,
        actions: vec![],
        created_at: start.saturating_sub(1),
    }
}

fn rank(status: Status) -> u8 {
    match status {
        Status::Pending => 0,
        Status::Active => 1,
        Status::Succeeded | Status::Defeated => 2,
        other => panic!("unexpected status {}", other),
    }
}

fn arb_views() -> impl Strategy<Value = Vec<ProposalView>> {
    prop::collection::vec((0usize..7, 0u8..3), 0..60).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (status_idx, proposer))| {
                let mut p = proposal(10, 10, 0, 0);
                p.id = i as u64 + 1;
                p.proposer = Address::from_bytes([proposer; 20]);
                ProposalView::stamp(p, Status::ALL[status_idx])
            })
            .collect()
    })
}

fn arb_params() -> impl Strategy<Value = ListParams> {
    (
        prop::option::of(prop::sample::select(vec![
            "pending", "active", "succeeded", "defeated", "executed", "canceled", "queued",
        ])),
        prop::option::of(1usize..=50),
        prop::option::of(0usize..80),
        prop::option::of(0u8..3),
    )
        .prop_map(|(status, limit, offset, proposer)| ListParams {
            status: status.map(str::to_string),
            limit: limit.map(|n| n.to_string()),
            offset: offset.map(|n| n.to_string()),
            voter: None,
            proposer: proposer.map(|b| Address::from_bytes([b; 20]).to_string()),
        })
}

// ============================================================================
// STATUS PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: Status totality
    /// Without an execution window the engine never yields `expired`
    #[test]
    fn status_is_total(
        start in 0u64..1_000_000,
        len in 0u64..1_000_000,
        for_votes in 0u64..1_000,
        against_votes in 0u64..1_000,
        executed in any::<bool>(),
        canceled in any::<bool>(),
        now in any::<u64>(),
    ) {
        let mut p = proposal(start, len, for_votes, against_votes);
        p.executed = executed;
        p.canceled = canceled;

        let status = StatusEngine::new().status(&p, now);
        prop_assert_ne!(status, Status::Expired);
        prop_assert!(Status::ALL[..6].contains(&status));
    }

    /// Property: Status monotonicity over time
    /// pending -> active -> {succeeded | defeated}, never backwards
    #[test]
    fn status_is_monotonic_in_time(
        start in 0u64..10_000,
        len in 0u64..10_000,
        for_votes in 0u64..100,
        against_votes in 0u64..100,
        mut times in prop::collection::vec(0u64..25_000, 2..40),
    ) {
        let p = proposal(start, len, for_votes, against_votes);
        times.sort_unstable();

        let statuses: Vec<Status> = times.iter().map(|&t| derive_status(&p, t)).collect();
        for pair in statuses.windows(2) {
            prop_assert!(rank(pair[0]) <= rank(pair[1]), "{:?}", statuses);
        }
        let terminal: Vec<Status> = statuses.iter().copied().filter(|s| rank(*s) == 2).collect();
        prop_assert!(terminal.windows(2).all(|w| w[0] == w[1]));
    }

    /// Property: Override dominance
    /// executed / canceled win for every `now`
    #[test]
    fn overrides_dominate(
        start in 0u64..1_000_000,
        len in 0u64..1_000_000,
        for_votes in 0u64..1_000,
        against_votes in 0u64..1_000,
        now in any::<u64>(),
        window in prop::option::of(0u64..1_000_000),
    ) {
        let engine = window.map_or_else(StatusEngine::new, StatusEngine::with_execution_window);

        let mut executed = proposal(start, len, for_votes, against_votes);
        executed.executed = true;
        prop_assert_eq!(engine.status(&executed, now), Status::Executed);

        let mut canceled = proposal(start, len, for_votes, against_votes);
        canceled.canceled = true;
        prop_assert_eq!(engine.status(&canceled, now), Status::Canceled);
    }

    /// Property: Tie is defeat
    #[test]
    fn tie_is_defeat(
        start in 0u64..1_000_000,
        len in 0u64..1_000_000,
        votes in 0u64..1_000_000,
        after in 1u64..1_000_000,
    ) {
        let p = proposal(start, len, votes, votes);
        prop_assert_eq!(derive_status(&p, p.end_time + after), Status::Defeated);
    }
}

// ============================================================================
// LIST QUERY PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: Pagination bounds
    /// |returned| <= limit, offset + |returned| <= total, and an offset at or
    /// past the total yields an empty page
    #[test]
    fn pagination_is_bounded(views in arb_views(), params in arb_params()) {
        let query = ListQuery::parse(&params).unwrap();
        let page = query.filter_and_paginate(views, |_| false);

        prop_assert!(page.proposals.len() <= page.limit);
        if page.offset >= page.total {
            prop_assert!(page.proposals.is_empty());
        } else {
            prop_assert!(page.offset + page.proposals.len() <= page.total);
        }
        let ids: Vec<u64> = page.proposals.iter().map(|v| v.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        prop_assert_eq!(ids, sorted, "input order must be preserved");
    }

    /// Property: Filter idempotence
    /// Re-filtering an unpaginated result with the same filters changes nothing
    #[test]
    fn filtering_is_idempotent(views in arb_views(), params in arb_params()) {
        let mut query = ListQuery::parse(&params).unwrap();
        query.offset = 0;
        query.limit = usize::MAX;

        let once = query.filter_and_paginate(views, |_| false);
        let twice = query.filter_and_paginate(once.proposals.clone(), |_| false);
        prop_assert_eq!(once.total, twice.total);
        prop_assert_eq!(once.proposals, twice.proposals);
    }
}

// ============================================================================
// VOTE GATE PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: Vote-state gate
    /// A vote on a non-active proposal is `invalid-state` and never calls add_vote
    #[test]
    fn inactive_proposals_reject_votes(
        offset_from_start in prop_oneof![
            (0u64..1_000).prop_map(|d| -(d as i64) - 1),
            (1u64..1_000).prop_map(|d| 100 + d as i64),
        ],
        flag in 0u8..3,
        support in any::<bool>(),
    ) {
        let start = 1_000_000u64;
        let now = (start as i64 + offset_from_start) as u64;
        let store = InMemoryProposalStore::new();
        let mut p = proposal(start, 100, 0, 0);
        match flag {
            1 => p.executed = true,
            2 => p.canceled = true,
            _ => {}
        }
        store.insert(p);

        let service = GovernanceService::new(
            Arc::new(store.clone()),
            Arc::new(EthereumVerifier::new()),
            GovernanceSettings::default(),
        )
        .with_clock(Arc::new(ManualClock::new(now)));

        let key = SecretKey::from_slice(&[0x33; 32]).unwrap();
        let request = VoteRequest {
            proposal_id: Some(serde_json::json!(1)),
            support: Some(support),
            address: Some(address_of(&key).to_string()),
            network_id: Some(serde_json::json!(1)),
            signature: Some(
                sign_message(&key, &super::vote_message(1, support)).to_string(),
            ),
        };

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let err = runtime.block_on(service.vote(&request)).unwrap_err();
        prop_assert_eq!(err.kind(), "invalid-state");
        prop_assert_eq!(store.add_vote_calls(), 0);
    }
}
