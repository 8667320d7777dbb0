//! Filter-and-paginate contract for `GET /governance/proposals`.

use super::error::{GovernanceError, GovernanceResult};
use super::types::{ProposalId, ProposalView, Status};
use crate::crypto::Address;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;

/// Raw query-string parameters. Numbers stay strings so a non-integer is
/// reported as `invalid-input` instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub voter: Option<String>,
    pub proposer: Option<String>,
}

/// Address filter. A value that is not a valid address matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFilter {
    Address(Address),
    Unmatchable,
}

impl AddressFilter {
    fn parse(raw: &str) -> Self {
        raw.parse::<Address>()
            .map(AddressFilter::Address)
            .unwrap_or(AddressFilter::Unmatchable)
    }

    pub fn matches(&self, address: &Address) -> bool {
        matches!(self, AddressFilter::Address(a) if a == address)
    }
}

/// Status filter. Unknown tokens match nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Status(Status),
    Unmatchable,
}

/// Validated list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<StatusFilter>,
    pub proposer: Option<AddressFilter>,
    pub voter: Option<AddressFilter>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            proposer: None,
            voter: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalPage {
    pub proposals: Vec<ProposalView>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ListQuery {
    pub fn parse(params: &ListParams) -> GovernanceResult<Self> {
        let limit = match non_empty(&params.limit) {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
                _ => {
                    return Err(GovernanceError::invalid_input(format!(
                        "limit must be an integer between 1 and {}",
                        MAX_LIMIT
                    )))
                }
            },
        };

        let offset = match non_empty(&params.offset) {
            None => 0,
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                GovernanceError::invalid_input("offset must be a non-negative integer")
            })?,
        };

        Ok(Self {
            status: non_empty(&params.status).map(|raw| match Status::parse(raw) {
                Some(status) => StatusFilter::Status(status),
                None => StatusFilter::Unmatchable,
            }),
            proposer: non_empty(&params.proposer).map(AddressFilter::parse),
            voter: non_empty(&params.voter).map(AddressFilter::parse),
            limit,
            offset,
        })
    }

    /// Status and proposer filters (the ones that need no store access).
    pub fn matches_local(&self, view: &ProposalView) -> bool {
        let status_ok = match self.status {
            None => true,
            Some(StatusFilter::Status(status)) => view.status == status,
            Some(StatusFilter::Unmatchable) => false,
        };
        let proposer_ok = self
            .proposer
            .map_or(true, |filter| filter.matches(&view.proposer));
        status_ok && proposer_ok
    }

    /// Apply every filter conjunctively, preserving input order, then slice
    /// `[offset, offset + limit)`.
    ///
    /// `has_voted` is consulted only when a voter filter is present.
    pub fn filter_and_paginate<F>(&self, stamped: Vec<ProposalView>, mut has_voted: F) -> ProposalPage
    where
        F: FnMut(ProposalId) -> bool,
    {
        let filtered: Vec<ProposalView> = stamped
            .into_iter()
            .filter(|view| self.matches_local(view))
            .filter(|view| match self.voter {
                None => true,
                Some(AddressFilter::Unmatchable) => false,
                Some(AddressFilter::Address(_)) => has_voted(view.id),
            })
            .collect();

        let total = filtered.len();
        let proposals = filtered
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();

        ProposalPage {
            proposals,
            total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
