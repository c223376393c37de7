//! Storage backends for the rights registry
//!
//! Persisted layout is three logical tables: the sequence counter, id → metadata
//! and id → owner. Ids are encoded big-endian so sled iterates them in order.

use crate::errors::{RegistryError, Result};
use crate::state::{ChangeSet, LedgerSnapshot, Mutation};
use crate::types::{Identity, RightId, IDENTITY_BYTES};
use parking_lot::RwLock;
use sled::transaction::{TransactionError, TransactionResult, Transactional};
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

const LAST_ISSUED_KEY: &[u8] = b"last_issued_id";

/// Backend that persists committed change sets.
pub trait RegistryStorage: Send + Sync {
    /// Read the full persisted state.
    fn load(&self) -> Result<LedgerSnapshot>;
    /// Persist every mutation in `changes`, or none of them.
    fn commit(&self, changes: &ChangeSet) -> Result<()>;
    fn flush(&self) -> Result<()>;
}

impl<S: RegistryStorage + ?Sized> RegistryStorage for Box<S> {
    fn load(&self) -> Result<LedgerSnapshot> {
        (**self).load()
    }

    fn commit(&self, changes: &ChangeSet) -> Result<()> {
        (**self).commit(changes)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: RegistryStorage + ?Sized> RegistryStorage for Arc<S> {
    fn load(&self) -> Result<LedgerSnapshot> {
        (**self).load()
    }

    fn commit(&self, changes: &ChangeSet) -> Result<()> {
        (**self).commit(changes)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<LedgerSnapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStorage for MemoryStorage {
    fn load(&self) -> Result<LedgerSnapshot> {
        Ok(self.tables.read().clone())
    }

    fn commit(&self, changes: &ChangeSet) -> Result<()> {
        self.tables.write().apply(changes);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Sled-backed implementation
pub struct SledStorage {
    db: Db,
    sequence: Tree,
    metadata: Tree,
    owners: Tree,
}

impl SledStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// Database removed on drop.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self> {
        let sequence = db.open_tree("sequence")?;
        let metadata = db.open_tree("metadata")?;
        let owners = db.open_tree("owners")?;
        Ok(Self {
            db,
            sequence,
            metadata,
            owners,
        })
    }
}

fn decode_id(bytes: &[u8]) -> Result<RightId> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| RegistryError::Storage(format!("corrupt id key of {} bytes", bytes.len())))?;
    Ok(RightId::from_be_bytes(raw))
}

fn decode_identity(bytes: &[u8]) -> Result<Identity> {
    let raw: [u8; IDENTITY_BYTES] = bytes.try_into().map_err(|_| {
        RegistryError::Storage(format!("corrupt owner entry of {} bytes", bytes.len()))
    })?;
    Ok(Identity::new(raw))
}

impl RegistryStorage for SledStorage {
    fn load(&self) -> Result<LedgerSnapshot> {
        let mut snapshot = LedgerSnapshot {
            last_issued_id: match self.sequence.get(LAST_ISSUED_KEY)? {
                Some(v) => decode_id(&v)?,
                None => 0,
            },
            ..Default::default()
        };

        for item in self.metadata.iter() {
            let (key, value) = item?;
            let data = String::from_utf8(value.to_vec())
                .map_err(|e| RegistryError::Storage(format!("corrupt metadata entry: {e}")))?;
            snapshot.metadata.insert(decode_id(&key)?, data);
        }

        for item in self.owners.iter() {
            let (key, value) = item?;
            snapshot
                .owners
                .insert(decode_id(&key)?, decode_identity(&value)?);
        }

        Ok(snapshot)
    }

    fn commit(&self, changes: &ChangeSet) -> Result<()> {
        let result: TransactionResult<(), ()> = (&self.sequence, &self.metadata, &self.owners)
            .transaction(|(sequence, metadata, owners)| {
                for mutation in changes.mutations() {
                    match mutation {
                        Mutation::AdvanceSequence(id) => {
                            sequence.insert(LAST_ISSUED_KEY, &id.to_be_bytes()[..])?;
                        }
                        Mutation::SetMetadata(id, data) => {
                            metadata.insert(&id.to_be_bytes()[..], data.as_bytes())?;
                        }
                        Mutation::RemoveMetadata(id) => {
                            metadata.remove(&id.to_be_bytes()[..])?;
                        }
                        Mutation::SetOwner(id, owner) => {
                            owners.insert(&id.to_be_bytes()[..], &owner.as_bytes()[..])?;
                        }
                        Mutation::RemoveOwner(id) => {
                            owners.remove(&id.to_be_bytes()[..])?;
                        }
                    }
                }
                Ok(())
            });

        result.map_err(|err| match err {
            TransactionError::Abort(()) => RegistryError::Storage("transaction aborted".into()),
            TransactionError::Storage(e) => RegistryError::from(e),
        })
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_changes() -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.push(Mutation::AdvanceSequence(1));
        changes.push(Mutation::SetMetadata(1, "alpha".into()));
        changes.push(Mutation::SetOwner(1, Identity::new([1u8; 32])));
        changes.push(Mutation::AdvanceSequence(2));
        changes.push(Mutation::SetMetadata(2, "beta".into()));
        changes.push(Mutation::SetOwner(2, Identity::new([2u8; 32])));
        changes
    }

    #[test]
    fn memory_storage_commit_and_load() {
        let storage = MemoryStorage::new();
        storage.commit(&sample_changes()).unwrap();

        let snapshot = storage.load().unwrap();
        assert_eq!(snapshot.last_issued_id, 2);
        assert_eq!(snapshot.metadata.get(&2).map(String::as_str), Some("beta"));
    }

    #[test]
    fn sled_storage_matches_memory_storage() {
        let memory = MemoryStorage::new();
        let sled = SledStorage::temporary().unwrap();

        let mut revoke = ChangeSet::new();
        revoke.push(Mutation::RemoveOwner(1));
        revoke.push(Mutation::RemoveMetadata(2));

        for backend in [&memory as &dyn RegistryStorage, &sled] {
            backend.commit(&sample_changes()).unwrap();
            backend.commit(&revoke).unwrap();
        }

        let loaded = sled.load().unwrap();
        assert_eq!(loaded, memory.load().unwrap());
        assert!(!loaded.owners.contains_key(&1));
        assert!(loaded.metadata.contains_key(&1));
        assert!(!loaded.metadata.contains_key(&2));
    }

    #[test]
    fn sled_rejects_corrupt_owner_entry() {
        let storage = SledStorage::temporary().unwrap();
        storage
            .owners
            .insert(&1u64.to_be_bytes()[..], &[0u8; 5][..])
            .unwrap();
        assert!(matches!(storage.load(), Err(RegistryError::Storage(_))));
    }
}
