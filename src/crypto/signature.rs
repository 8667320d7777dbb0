//! Wallet signature recovery (EIP-191 `personal_sign` over secp256k1)
//!
//! Write operations carry no session. The caller signs a canonical message
//! with their wallet key and the service recovers the signer address from
//! `(message, signature)`.
//!
//! ## Digest
//!
//! ```text
//! keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)
//! ```
//!
//! ## Address
//!
//! Last 20 bytes of `keccak256(uncompressed_pubkey[1..])`, compared as raw
//! bytes (equivalent to case-insensitive hex comparison).

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Signature recovery errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Hex or length problem in the wire form
    #[error("malformed {0}")]
    Malformed(&'static str),

    /// Well-formed signature that does not recover to any public key
    #[error("signature recovery failed")]
    Recovery,

    /// Verifier could not be reached (remote/HSM-backed verifiers)
    #[error("verifier unavailable: {0}")]
    Backend(String),
}

/// 20-byte account address.
///
/// Parsed from `0x`-prefixed hex in any case; always rendered lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive the address of a secp256k1 public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let uncompressed = key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_prefixed_hex(s, 20, "address")?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 65-byte recoverable signature in `r || s || v` form.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 65]);

impl Signature {
    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Normalize `v` (0/1 or 27/28) to a recovery id.
    fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        let v = match self.0[64] {
            0 | 27 => 0,
            1 | 28 => 1,
            _ => return Err(SignatureError::Recovery),
        };
        RecoveryId::from_i32(v).map_err(|_| SignatureError::Recovery)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_prefixed_hex(s, 65, "signature")?;
        let mut arr = [0u8; 65];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

fn decode_prefixed_hex(
    s: &str,
    expected_len: usize,
    what: &'static str,
) -> Result<Vec<u8>, SignatureError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(SignatureError::Malformed(what))?;
    let bytes = hex::decode(digits).map_err(|_| SignatureError::Malformed(what))?;
    if bytes.len() != expected_len {
        return Err(SignatureError::Malformed(what));
    }
    Ok(bytes)
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Digest signed by `personal_sign` for `message`.
pub fn personal_message_digest(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Sign `message` the way a wallet's `personal_sign` does (v = 27/28).
pub fn sign_message(secret_key: &SecretKey, message: &str) -> Signature {
    let secp = Secp256k1::signing_only();
    let digest = Message::from_digest(personal_message_digest(message));
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&digest, secret_key)
        .serialize_compact();

    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&compact);
    bytes[64] = 27 + recovery_id.to_i32() as u8;
    Signature(bytes)
}

/// Address controlled by `secret_key`.
pub fn address_of(secret_key: &SecretKey) -> Address {
    let secp = Secp256k1::signing_only();
    Address::from_public_key(&PublicKey::from_secret_key(&secp, secret_key))
}

/// Deterministic receipt hash for an accepted write.
///
/// Nothing is submitted on-chain; this digest lets clients correlate the
/// response with the signed request.
pub fn transaction_hash(message: &str, signature: &Signature, proposal_id: u64) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(message.as_bytes());
    hasher.update(signature.as_bytes());
    hasher.update(proposal_id.to_be_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Recovers the signer of a canonical message.
///
/// Treated as synchronous by callers; implementations may be CPU-bound.
pub trait SignatureVerifier: Send + Sync {
    /// Recover the address that produced `signature` over `message`.
    fn recover(&self, message: &str, signature: &Signature) -> Result<Address, SignatureError>;

    /// Check that `signature` over `message` was produced by `claimed`.
    fn verify(
        &self,
        message: &str,
        signature: &Signature,
        claimed: &Address,
    ) -> Result<bool, SignatureError> {
        match self.recover(message, signature) {
            Ok(signer) => Ok(signer == *claimed),
            Err(SignatureError::Recovery) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// secp256k1 `personal_sign` verifier.
pub struct EthereumVerifier {
    secp: Secp256k1<secp256k1::VerifyOnly>,
}

impl EthereumVerifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for EthereumVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for EthereumVerifier {
    fn recover(&self, message: &str, signature: &Signature) -> Result<Address, SignatureError> {
        let recovery_id = signature.recovery_id()?;
        let recoverable = RecoverableSignature::from_compact(&signature.0[..64], recovery_id)
            .map_err(|_| SignatureError::Recovery)?;
        let digest = Message::from_digest(personal_message_digest(message));
        let key = self
            .secp
            .recover_ecdsa(&digest, &recoverable)
            .map_err(|_| SignatureError::Recovery)?;
        Ok(Address::from_public_key(&key))
    }
}
