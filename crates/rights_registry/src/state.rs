//! In-memory ledger state and the change sets that mutate it

use crate::metadata::MetadataStore;
use crate::ownership::OwnershipDirectory;
use crate::sequence::SequenceAllocator;
use crate::types::{Identity, RightId, RightStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single write against one of the three ledger tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    AdvanceSequence(RightId),
    SetMetadata(RightId, String),
    RemoveMetadata(RightId),
    SetOwner(RightId, Identity),
    RemoveOwner(RightId),
}

/// Ordered writes produced by one registry operation.
///
/// A change set is committed to storage as a unit and then applied to memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

/// Plain copy of the three persisted tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub last_issued_id: RightId,
    pub metadata: BTreeMap<RightId, String>,
    pub owners: BTreeMap<RightId, Identity>,
}

impl LedgerSnapshot {
    /// blake3 commitment over a canonical encoding of all three tables.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ippan-rights-registry/ledger/v1");
        hasher.update(&self.last_issued_id.to_be_bytes());

        hasher.update(&(self.metadata.len() as u64).to_be_bytes());
        for (id, data) in &self.metadata {
            hasher.update(&id.to_be_bytes());
            hasher.update(&(data.len() as u64).to_be_bytes());
            hasher.update(data.as_bytes());
        }

        hasher.update(&(self.owners.len() as u64).to_be_bytes());
        for (id, owner) in &self.owners {
            hasher.update(&id.to_be_bytes());
            hasher.update(owner.as_bytes());
        }

        *hasher.finalize().as_bytes()
    }

    pub fn apply(&mut self, changes: &ChangeSet) {
        for mutation in changes.mutations() {
            match mutation {
                Mutation::AdvanceSequence(id) => {
                    self.last_issued_id = self.last_issued_id.max(*id);
                }
                Mutation::SetMetadata(id, data) => {
                    self.metadata.insert(*id, data.clone());
                }
                Mutation::RemoveMetadata(id) => {
                    self.metadata.remove(id);
                }
                Mutation::SetOwner(id, owner) => {
                    self.owners.insert(*id, *owner);
                }
                Mutation::RemoveOwner(id) => {
                    self.owners.remove(id);
                }
            }
        }
    }
}

/// Working state of the registry: allocator, metadata store and ownership directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub(crate) sequence: SequenceAllocator,
    pub(crate) metadata: MetadataStore,
    pub(crate) owners: OwnershipDirectory,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            sequence: SequenceAllocator::new(snapshot.last_issued_id),
            metadata: snapshot.metadata.into_iter().collect(),
            owners: snapshot.owners.into_iter().collect(),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            last_issued_id: self.sequence.last_issued(),
            metadata: self
                .metadata
                .iter()
                .map(|(id, data)| (id, data.to_string()))
                .collect(),
            owners: self.owners.iter().map(|(id, owner)| (id, *owner)).collect(),
        }
    }

    pub fn sequence(&self) -> &SequenceAllocator {
        &self.sequence
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn owners(&self) -> &OwnershipDirectory {
        &self.owners
    }

    pub fn status(&self, id: RightId) -> RightStatus {
        if self.owners.contains(id) {
            RightStatus::Active
        } else if (1..=self.sequence.last_issued()).contains(&id) {
            RightStatus::Revoked
        } else {
            RightStatus::Unregistered
        }
    }

    /// Apply a change set that has already been committed to storage.
    pub fn apply(&mut self, changes: &ChangeSet) {
        for mutation in changes.mutations() {
            match mutation {
                Mutation::AdvanceSequence(id) => self.sequence.advance_to(*id),
                Mutation::SetMetadata(id, data) => self.metadata.set(*id, data.clone()),
                Mutation::RemoveMetadata(id) => {
                    self.metadata.remove(*id);
                }
                Mutation::SetOwner(id, owner) => self.owners.set_owner(*id, *owner),
                Mutation::RemoveOwner(id) => {
                    self.owners.remove(*id);
                }
            }
        }
    }
}
