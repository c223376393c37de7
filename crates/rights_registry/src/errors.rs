//! Error types for the rights registry

use crate::types::{Identity, RightId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Caller is not the registry administrator
    #[error("Operation restricted to the registry administrator (caller {caller})")]
    OwnerOnly { caller: Identity },

    /// Caller does not own the right, or the right does not exist
    #[error("Unauthorized: caller does not own right {id}")]
    Unauthorized { id: RightId },

    #[error("Invalid royalty data: length {length} outside 1..=256")]
    InvalidRoyaltyData { length: usize },

    /// Rejected by the identity policy. Unreachable with [`crate::AcceptAnyIdentity`].
    #[error("Invalid new owner: {identity}")]
    InvalidNewOwner { identity: Identity },

    #[error("Right not found: {id}")]
    RightNotFound { id: RightId },

    #[error("Invalid batch size {size}: expected 1..=10 entries")]
    InvalidBatchSize { size: usize },

    #[error("Registry storage error: {0}")]
    Storage(String),
}

impl From<sled::Error> for RegistryError {
    fn from(err: sled::Error) -> Self {
        RegistryError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Storage(format!("serialization: {err}"))
    }
}

/// Payload-free tag for [`RegistryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OwnerOnly,
    Unauthorized,
    InvalidRoyaltyData,
    InvalidNewOwner,
    RightNotFound,
    InvalidBatchSize,
    Storage,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::OwnerOnly { .. } => ErrorKind::OwnerOnly,
            RegistryError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RegistryError::InvalidRoyaltyData { .. } => ErrorKind::InvalidRoyaltyData,
            RegistryError::InvalidNewOwner { .. } => ErrorKind::InvalidNewOwner,
            RegistryError::RightNotFound { .. } => ErrorKind::RightNotFound,
            RegistryError::InvalidBatchSize { .. } => ErrorKind::InvalidBatchSize,
            RegistryError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
