//! Proposal persistence.
//!
//! `ProposalStore` is the only shared resource the service touches; every
//! backend encapsulates its own locking.

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryProposalStore;
pub use sqlite::SqliteProposalStore;
pub use traits::{ProposalStore, StoreError, StoreResult};
