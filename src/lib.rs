//! govdash - Governance proposal lifecycle and authenticated voting
//!
//! Serves a small JSON API for a DAO governance dashboard:
//! - list and fetch proposals with a status derived from the clock
//! - create proposals and cast votes, authenticated by wallet signature
//!
//! Key principles:
//! - Status is never stored; it is derived at read time
//! - Writes carry no session; every request is signed
//! - The store is the only shared state

pub mod api;
pub mod crypto;
pub mod governance;
pub mod store;
