//! Ownership directory: right id → current owner

use crate::types::{Identity, RightId};
use std::collections::BTreeMap;

/// Holds exactly one owner per active right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipDirectory {
    owners: BTreeMap<RightId, Identity>,
}

impl OwnershipDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, id: RightId) -> Option<Identity> {
        self.owners.get(&id).copied()
    }

    pub fn set_owner(&mut self, id: RightId, owner: Identity) {
        self.owners.insert(id, owner);
    }

    pub fn remove(&mut self, id: RightId) -> Option<Identity> {
        self.owners.remove(&id)
    }

    /// Fails closed: an id without an entry is owned by nobody.
    pub fn is_owner(&self, id: RightId, identity: &Identity) -> bool {
        self.owners.get(&id) == Some(identity)
    }

    pub fn contains(&self, id: RightId) -> bool {
        self.owners.contains_key(&id)
    }

    /// Ids currently held by `owner`, ascending.
    pub fn rights_of(&self, owner: &Identity) -> Vec<RightId> {
        self.owners
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RightId, &Identity)> {
        self.owners.iter().map(|(id, owner)| (*id, owner))
    }
}

impl FromIterator<(RightId, Identity)> for OwnershipDirectory {
    fn from_iter<T: IntoIterator<Item = (RightId, Identity)>>(iter: T) -> Self {
        Self {
            owners: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_owner_fails_closed_for_missing_id() {
        let dir = OwnershipDirectory::new();
        assert!(!dir.is_owner(42, &Identity::new([1u8; 32])));
    }

    #[test]
    fn set_owner_replaces_previous_owner() {
        let alice = Identity::new([1u8; 32]);
        let bob = Identity::new([2u8; 32]);
        let mut dir = OwnershipDirectory::new();

        dir.set_owner(1, alice);
        dir.set_owner(1, bob);

        assert!(!dir.is_owner(1, &alice));
        assert!(dir.is_owner(1, &bob));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn rights_of_lists_ids_in_order() {
        let alice = Identity::new([1u8; 32]);
        let bob = Identity::new([2u8; 32]);
        let mut dir = OwnershipDirectory::new();
        for id in [3, 1, 2] {
            dir.set_owner(id, alice);
        }
        dir.set_owner(4, bob);

        assert_eq!(dir.rights_of(&alice), vec![1, 2, 3]);
        assert_eq!(dir.remove(2), Some(alice));
        assert_eq!(dir.rights_of(&alice), vec![1, 3]);
    }
}
