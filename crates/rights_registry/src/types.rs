//! Types for the rights registry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequential right identifier. `0` is never issued.
pub type RightId = u64;

/// Minimum accepted metadata length, in characters.
pub const MIN_METADATA_LEN: usize = 1;
/// Maximum accepted metadata length, in characters.
pub const MAX_METADATA_LEN: usize = 256;
/// Maximum number of entries accepted by a single batch registration.
pub const MAX_BATCH_SIZE: usize = 10;

/// Number of raw bytes in an identity.
pub const IDENTITY_BYTES: usize = 32;

/// Errors that can occur when parsing an identity from its hex form.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("identity is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Externally authenticated identity (account key, principal, ...).
///
/// The registry only ever compares identities for equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(pub [u8; IDENTITY_BYTES]);

impl Identity {
    pub fn new(bytes: [u8; IDENTITY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != IDENTITY_BYTES * 2 {
            return Err(IdentityError::InvalidLength {
                expected: IDENTITY_BYTES * 2,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; IDENTITY_BYTES];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.to_hex()
    }
}

impl From<[u8; IDENTITY_BYTES]> for Identity {
    fn from(value: [u8; IDENTITY_BYTES]) -> Self {
        Self(value)
    }
}

/// Per-request context supplied by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// Identity that issued the current request
    pub caller: Identity,
}

impl RequestContext {
    pub fn new(caller: Identity) -> Self {
        Self { caller }
    }
}

impl From<Identity> for RequestContext {
    fn from(caller: Identity) -> Self {
        Self { caller }
    }
}

/// An active right: id, current owner and its metadata entry (if retained).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Right {
    pub id: RightId,
    pub owner: Identity,
    pub metadata: Option<String>,
}

/// Lifecycle state of an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RightStatus {
    /// Never issued
    Unregistered,
    /// Issued and currently owned
    Active,
    /// Issued and revoked; terminal
    Revoked,
}
