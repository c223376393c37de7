//! Rights registry service
//!
//! Orchestrates the sequence allocator, metadata store and ownership directory
//! behind the authorization guard. Each command is planned against a read-only
//! view of the ledger, committed to storage as one change set and only then
//! applied in memory, all while holding the registry write lock.

use crate::config::{BatchValidation, MetadataRetention, PolicyConfig, RegistryConfig, StorageBackend};
use crate::errors::{RegistryError, Result};
use crate::guard::{AuthorizationGuard, IdentityPolicy};
use crate::metadata::{metadata_len, validate_length};
use crate::state::{ChangeSet, LedgerSnapshot, LedgerState, Mutation};
use crate::storage::{MemoryStorage, RegistryStorage, SledStorage};
use crate::types::{Identity, RequestContext, Right, RightId, RightStatus, MAX_BATCH_SIZE};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

pub struct RightsRegistry<S: RegistryStorage = MemoryStorage> {
    guard: AuthorizationGuard,
    policy: PolicyConfig,
    storage: S,
    state: RwLock<LedgerState>,
}

impl RightsRegistry<MemoryStorage> {
    /// Empty registry backed by memory only.
    pub fn in_memory(administrator: Identity) -> Self {
        Self {
            guard: AuthorizationGuard::new(administrator),
            policy: PolicyConfig::default(),
            storage: MemoryStorage::new(),
            state: RwLock::new(LedgerState::new()),
        }
    }
}

impl RightsRegistry<Box<dyn RegistryStorage>> {
    /// Build a registry with the backend and policies named in `config`.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let storage: Box<dyn RegistryStorage> = match config.storage.backend {
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
            StorageBackend::Sled => Box::new(SledStorage::new(&config.storage.path)?),
        };
        Ok(Self::open(config.administrator, storage)?.with_policy(config.policy))
    }
}

impl<S: RegistryStorage> RightsRegistry<S> {
    /// Open a registry over `storage`, restoring any persisted state.
    pub fn open(administrator: Identity, storage: S) -> Result<Self> {
        let snapshot = storage.load()?;
        info!(
            administrator = %administrator,
            last_issued_id = snapshot.last_issued_id,
            active = snapshot.owners.len(),
            "Opened rights registry"
        );
        Ok(Self {
            guard: AuthorizationGuard::new(administrator),
            policy: PolicyConfig::default(),
            storage,
            state: RwLock::new(LedgerState::from_snapshot(snapshot)),
        })
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the transfer recipient check.
    pub fn with_identity_policy(mut self, identity_policy: Box<dyn IdentityPolicy>) -> Self {
        self.guard = AuthorizationGuard::with_policy(self.guard.administrator(), identity_policy);
        self
    }

    pub fn policy(&self) -> PolicyConfig {
        self.policy
    }

    /// Mint a new right owned by the administrator.
    pub fn register(&self, ctx: &RequestContext, royalty_data: impl Into<String>) -> Result<RightId> {
        let royalty_data = royalty_data.into();
        let id = self.execute("register", ctx, |state| {
            self.guard.require_admin(&ctx.caller)?;
            require_valid_data(&royalty_data)?;

            let mut sequence = *state.sequence();
            let mut changes = ChangeSet::new();
            let id = plan_registration(&mut changes, sequence.next_id(), ctx.caller, royalty_data);
            Ok((changes, id))
        })?;

        info!(id, owner = %ctx.caller, "Registered right");
        Ok(id)
    }

    /// Register 1..=10 entries in order. Invalid entries are handled according
    /// to [`PolicyConfig::batch_validation`].
    pub fn register_batch(
        &self,
        ctx: &RequestContext,
        royalty_data_list: Vec<String>,
    ) -> Result<Vec<RightId>> {
        let ids = self.execute("register_batch", ctx, |state| {
            self.guard.require_admin(&ctx.caller)?;
            let size = royalty_data_list.len();
            if size == 0 || size > MAX_BATCH_SIZE {
                return Err(RegistryError::InvalidBatchSize { size });
            }

            if self.policy.batch_validation == BatchValidation::RejectAll {
                for data in &royalty_data_list {
                    require_valid_data(data)?;
                }
            }

            let mut sequence = *state.sequence();
            let mut changes = ChangeSet::new();
            let mut ids = Vec::with_capacity(size);
            for (index, data) in royalty_data_list.into_iter().enumerate() {
                if !validate_length(&data) {
                    warn!(index, length = metadata_len(&data), "Skipping invalid batch entry");
                    continue;
                }
                ids.push(plan_registration(&mut changes, sequence.next_id(), ctx.caller, data));
            }
            Ok((changes, ids))
        })?;

        info!(count = ids.len(), ids = ?ids, owner = %ctx.caller, "Registered batch of rights");
        Ok(ids)
    }

    /// Hand the right over to `new_owner`. Only the current owner may do this.
    pub fn transfer(&self, ctx: &RequestContext, id: RightId, new_owner: Identity) -> Result<()> {
        self.execute("transfer", ctx, |state| {
            self.guard.require_owner(state.owners(), id, &ctx.caller)?;
            self.guard.require_valid_new_identity(&new_owner)?;

            let mut changes = ChangeSet::new();
            changes.push(Mutation::SetOwner(id, new_owner));
            Ok((changes, ()))
        })?;

        info!(id, from = %ctx.caller, to = %new_owner, "Transferred right");
        Ok(())
    }

    /// Replace the metadata of a right. Only the current owner may do this.
    pub fn update_metadata(
        &self,
        ctx: &RequestContext,
        id: RightId,
        new_data: impl Into<String>,
    ) -> Result<()> {
        let new_data = new_data.into();
        self.execute("update_metadata", ctx, |state| {
            self.guard.require_owner(state.owners(), id, &ctx.caller)?;
            require_valid_data(&new_data)?;

            let mut changes = ChangeSet::new();
            changes.push(Mutation::SetMetadata(id, new_data));
            Ok((changes, ()))
        })?;

        info!(id, owner = %ctx.caller, "Updated right metadata");
        Ok(())
    }

    /// Remove the ownership entry of an active right.
    pub fn revoke(&self, ctx: &RequestContext, id: RightId) -> Result<()> {
        self.execute("revoke", ctx, |state| {
            self.guard.require_admin(&ctx.caller)?;
            if !state.owners().contains(id) {
                return Err(RegistryError::RightNotFound { id });
            }

            let mut changes = ChangeSet::new();
            changes.push(Mutation::RemoveOwner(id));
            if self.policy.metadata_on_revoke == MetadataRetention::Clear
                && state.metadata().get(id).is_some()
            {
                changes.push(Mutation::RemoveMetadata(id));
            }
            Ok((changes, ()))
        })?;

        info!(id, retention = ?self.policy.metadata_on_revoke, "Revoked right");
        Ok(())
    }

    pub fn get_metadata(&self, id: RightId) -> Option<String> {
        self.state.read().metadata().get(id).map(str::to_string)
    }

    pub fn get_owner(&self, id: RightId) -> Option<Identity> {
        self.state.read().owners().owner_of(id)
    }

    pub fn exists(&self, id: RightId) -> bool {
        self.state.read().owners().contains(id)
    }

    /// Last identifier issued. Doubles as the total number of rights ever minted.
    pub fn last_issued_id(&self) -> RightId {
        self.state.read().sequence().last_issued()
    }

    pub fn administrator(&self) -> Identity {
        self.guard.administrator()
    }

    pub fn caller_identity(&self, ctx: &RequestContext) -> Identity {
        ctx.caller
    }

    pub fn get_right(&self, id: RightId) -> Option<Right> {
        let state = self.state.read();
        let owner = state.owners().owner_of(id)?;
        Some(Right {
            id,
            owner,
            metadata: state.metadata().get(id).map(str::to_string),
        })
    }

    pub fn status(&self, id: RightId) -> RightStatus {
        self.state.read().status(id)
    }

    pub fn rights_of(&self, owner: &Identity) -> Vec<RightId> {
        self.state.read().owners().rights_of(owner)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().snapshot()
    }

    pub fn flush(&self) -> Result<()> {
        self.storage.flush()
    }

    /// Plan under the write lock, commit to storage, then apply in memory.
    /// Any error before the apply step leaves the ledger untouched.
    fn execute<T>(
        &self,
        operation: &'static str,
        ctx: &RequestContext,
        plan: impl FnOnce(&LedgerState) -> Result<(ChangeSet, T)>,
    ) -> Result<T> {
        let mut state = self.state.write();

        let (changes, output) = match plan(&*state) {
            Ok(planned) => planned,
            Err(err) => {
                warn!(operation, caller = %ctx.caller, error = %err, "Rejected registry request");
                return Err(err);
            }
        };

        if !changes.is_empty() {
            if let Err(err) = self.storage.commit(&changes) {
                error!(operation, error = %err, "Failed to commit registry changes");
                return Err(err);
            }
            state.apply(&changes);
            debug!(operation, mutations = changes.len(), "Applied change set");
        }

        Ok(output)
    }
}

fn require_valid_data(data: &str) -> Result<()> {
    if validate_length(data) {
        Ok(())
    } else {
        Err(RegistryError::InvalidRoyaltyData {
            length: metadata_len(data),
        })
    }
}

fn plan_registration(changes: &mut ChangeSet, id: RightId, owner: Identity, data: String) -> RightId {
    changes.push(Mutation::AdvanceSequence(id));
    changes.push(Mutation::SetMetadata(id, data));
    changes.push(Mutation::SetOwner(id, owner));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn admin() -> Identity {
        Identity::new([0xAA; 32])
    }

    fn ctx(identity: Identity) -> RequestContext {
        RequestContext::new(identity)
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let registry = RightsRegistry::in_memory(admin());
        assert_eq!(registry.register(&ctx(admin()), "alpha").unwrap(), 1);
        assert_eq!(registry.register(&ctx(admin()), "beta").unwrap(), 2);
        assert_eq!(registry.last_issued_id(), 2);
        assert_eq!(registry.get_owner(1), Some(admin()));
        assert_eq!(registry.get_metadata(2).as_deref(), Some("beta"));
    }

    #[test]
    fn test_register_by_non_admin_is_rejected() {
        let registry = RightsRegistry::in_memory(admin());
        let err = registry
            .register(&ctx(Identity::new([1u8; 32])), "alpha")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OwnerOnly);
        assert_eq!(registry.last_issued_id(), 0);
    }

    #[test]
    fn test_admin_check_precedes_length_check() {
        let registry = RightsRegistry::in_memory(admin());
        let err = registry
            .register(&ctx(Identity::new([1u8; 32])), "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OwnerOnly);
    }

    #[test]
    fn test_batch_rejects_whole_batch_on_invalid_entry() {
        let registry = RightsRegistry::in_memory(admin());
        let before = registry.snapshot().digest();

        let err = registry
            .register_batch(
                &ctx(admin()),
                vec!["ok".into(), String::new(), "also ok".into()],
            )
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidRoyaltyData { length: 0 }));
        assert_eq!(registry.snapshot().digest(), before);
    }

    #[test]
    fn test_batch_skip_invalid_policy() {
        let registry = RightsRegistry::in_memory(admin()).with_policy(PolicyConfig {
            batch_validation: BatchValidation::SkipInvalid,
            ..Default::default()
        });

        let ids = registry
            .register_batch(
                &ctx(admin()),
                vec!["one".into(), "x".repeat(257), "three".into()],
            )
            .unwrap();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(registry.get_metadata(2).as_deref(), Some("three"));
        assert_eq!(registry.last_issued_id(), 2);
    }

    #[test]
    fn test_batch_size_bounds() {
        let registry = RightsRegistry::in_memory(admin());
        let err = registry.register_batch(&ctx(admin()), vec![]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBatchSize { size: 0 }));

        let err = registry
            .register_batch(&ctx(admin()), vec!["x".to_string(); 11])
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBatchSize { size: 11 }));

        let ids = registry
            .register_batch(&ctx(admin()), vec!["x".to_string(); 10])
            .unwrap();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_revoke_clear_policy_drops_metadata() {
        let registry = RightsRegistry::in_memory(admin()).with_policy(PolicyConfig {
            metadata_on_revoke: MetadataRetention::Clear,
            ..Default::default()
        });
        let id = registry.register(&ctx(admin()), "alpha").unwrap();

        registry.revoke(&ctx(admin()), id).unwrap();

        assert!(!registry.exists(id));
        assert!(registry.get_metadata(id).is_none());
        assert_eq!(registry.status(id), RightStatus::Revoked);
    }

    #[test]
    fn test_caller_identity_reflects_request() {
        let registry = RightsRegistry::in_memory(admin());
        let caller = Identity::new([5u8; 32]);
        assert_eq!(registry.caller_identity(&ctx(caller)), caller);
        assert_eq!(registry.administrator(), admin());
    }
}
