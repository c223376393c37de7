//! Authorization guard: administrator and owner checks

use crate::errors::{RegistryError, Result};
use crate::ownership::OwnershipDirectory;
use crate::types::{Identity, RightId};
use std::fmt;

/// Validation applied to the recipient of a transfer.
pub trait IdentityPolicy: Send + Sync + fmt::Debug {
    fn validate_new_identity(&self, identity: &Identity) -> bool;
}

/// Accepts every identity. No recipient validation is performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyIdentity;

impl IdentityPolicy for AcceptAnyIdentity {
    fn validate_new_identity(&self, _identity: &Identity) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct AuthorizationGuard {
    administrator: Identity,
    identity_policy: Box<dyn IdentityPolicy>,
}

impl AuthorizationGuard {
    pub fn new(administrator: Identity) -> Self {
        Self::with_policy(administrator, Box::new(AcceptAnyIdentity))
    }

    pub fn with_policy(administrator: Identity, identity_policy: Box<dyn IdentityPolicy>) -> Self {
        Self {
            administrator,
            identity_policy,
        }
    }

    pub fn administrator(&self) -> Identity {
        self.administrator
    }

    pub fn require_admin(&self, caller: &Identity) -> Result<()> {
        if *caller == self.administrator {
            Ok(())
        } else {
            Err(RegistryError::OwnerOnly { caller: *caller })
        }
    }

    pub fn require_owner(
        &self,
        directory: &OwnershipDirectory,
        id: RightId,
        caller: &Identity,
    ) -> Result<()> {
        if directory.is_owner(id, caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized { id })
        }
    }

    pub fn validate_new_identity(&self, identity: &Identity) -> bool {
        self.identity_policy.validate_new_identity(identity)
    }

    pub fn require_valid_new_identity(&self, identity: &Identity) -> Result<()> {
        if self.validate_new_identity(identity) {
            Ok(())
        } else {
            Err(RegistryError::InvalidNewOwner {
                identity: *identity,
            })
        }
    }
}
