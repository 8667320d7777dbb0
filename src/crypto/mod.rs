//! Cryptographic primitives for authenticated governance writes
//!
//! - Address and signature wire types
//! - `personal_sign` recovery over secp256k1 (`SignatureVerifier`)
//! - Receipt hashes for accepted writes

pub mod signature;

pub use signature::{
    address_of, sign_message, transaction_hash, Address, EthereumVerifier, Signature,
    SignatureError, SignatureVerifier,
};
