use govdash::crypto::{address_of, sign_message};
use govdash::governance::{create_message, vote_message, ProposalId};
use secp256k1::SecretKey;
use zeroize::Zeroizing;

/// What to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Arbitrary text
    Message(String),
    /// Canonical create-proposal message for this title
    Create(String),
    /// Canonical vote message
    Vote { proposal_id: ProposalId, support: bool },
}

impl Payload {
    pub fn from_args(
        message: Option<String>,
        create: Option<String>,
        vote: Option<ProposalId>,
        against: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        match (message, create, vote) {
            (Some(message), None, None) => Ok(Payload::Message(message)),
            (None, Some(title), None) => Ok(Payload::Create(title)),
            (None, None, Some(proposal_id)) => Ok(Payload::Vote {
                proposal_id,
                support: !against,
            }),
            _ => Err("Specify exactly one of --message, --create or --vote".into()),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Payload::Message(message) => message.clone(),
            Payload::Create(title) => create_message(title),
            Payload::Vote {
                proposal_id,
                support,
            } => vote_message(*proposal_id, *support),
        }
    }
}

/// Parse a hex-encoded secp256k1 private key (optional 0x prefix)
pub fn parse_secret_key(hex_key: &str) -> Result<SecretKey, Box<dyn std::error::Error>> {
    let trimmed = hex_key.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let mut bytes = Zeroizing::new([0u8; 32]);
    hex::decode_to_slice(digits, &mut bytes[..])
        .map_err(|e| format!("Invalid private key: expected 64 hex digits ({})", e))?;
    SecretKey::from_slice(&bytes[..]).map_err(|e| format!("Invalid private key: {}", e).into())
}

/// Sign a payload with `personal_sign` and print the request fields
///
/// Intended for operators and integration testing; the key never leaves
/// this process and is wiped from memory on exit.
pub fn execute(key: String, payload: Payload) -> Result<(), Box<dyn std::error::Error>> {
    let key = Zeroizing::new(key);
    let secret_key = parse_secret_key(&key)?;
    let message = payload.message();
    let signature = sign_message(&secret_key, &message);

    println!("message:   {}", message);
    println!("address:   {}", address_of(&secret_key));
    println!("signature: {}", signature);
    Ok(())
}
