//! Proposal status derivation.
//!
//! Priority order (earlier wins):
//! 1. executed
//! 2. canceled
//! 3. now < start_time                    -> pending
//! 4. start_time <= now <= end_time       -> active
//! 5. now > end_time, for > against       -> succeeded
//! 6. now > end_time, for <= against      -> defeated (a tie is a defeat)
//!
//! `expired` only appears when an execution window is configured.

use super::types::{Proposal, Status};

/// Pure derivation. Never returns `Status::Expired`.
pub fn derive_status(proposal: &Proposal, now: u64) -> Status {
    if proposal.executed {
        return Status::Executed;
    }
    if proposal.canceled {
        return Status::Canceled;
    }
    if now < proposal.start_time {
        return Status::Pending;
    }
    if now <= proposal.end_time {
        return Status::Active;
    }
    if proposal.for_votes > proposal.against_votes {
        Status::Succeeded
    } else {
        Status::Defeated
    }
}

/// Status derivation with an optional execution window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusEngine {
    execution_window: Option<u64>,
}

impl StatusEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A succeeded proposal becomes `expired` once `now > end_time + window`.
    pub fn with_execution_window(window_secs: u64) -> Self {
        Self {
            execution_window: Some(window_secs),
        }
    }

    pub fn execution_window(&self) -> Option<u64> {
        self.execution_window
    }

    pub fn status(&self, proposal: &Proposal, now: u64) -> Status {
        let status = derive_status(proposal, now);
        match (status, self.execution_window) {
            (Status::Succeeded, Some(window))
                if now > proposal.end_time.saturating_add(window) =>
            {
                Status::Expired
            }
            _ => status,
        }
    }
}
