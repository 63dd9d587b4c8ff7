//! Key-indexed entity storage with uniqueness enforcement.
//!
//! A [`UniqueRegistry`] owns entities of one kind and indexes them by a
//! string key the entity carries itself (a correction id, a media reference
//! URI). Entities are addressed through typed [`Handle`]s.
//!
//! Two occupancy rules exist:
//!
//! - [`Occupancy::Exclusive`]: at most one entity per key, a second one is an
//!   identity error (corrections)
//! - [`Occupancy::Shared`]: any number of entities may share a key and are
//!   kept in insertion order (media references)
//!
//! Changing an entity's key goes through [`UniqueRegistry::rekey`], which
//! checks the new key, applies the change and moves the handle from the old
//! key's member list to the new one. A key whose list becomes empty is
//! dropped from the index.
//!
//! The registry is single-threaded state; a rename touches two keys and is
//! not atomic against other writers.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tracing::debug;

use crate::{CdlError, CdlResult};

/// Implemented by entities that are indexed by a key they own.
pub trait Registered {
    /// The key the entity is currently indexed under.
    fn registry_key(&self) -> &str;
}

/// How many entities may share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// One entity per key.
    Exclusive,
    /// Many entities per key.
    Shared,
}

/// Typed reference to an entity stored in a [`UniqueRegistry`].
///
/// Handles stay valid until the entity is removed or the registry is
/// cleared; after that, lookups return `None`.
pub struct Handle<T> {
    index: u32,
    epoch: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, epoch: u32) -> Self {
        Self {
            index,
            epoch,
            _marker: PhantomData,
        }
    }

    /// Slot index, stable for the lifetime of the entity.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.epoch == other.epoch
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.epoch.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@{})", self.index, self.epoch)
    }
}

/// Owning, key-indexed store of entities.
pub struct UniqueRegistry<T> {
    occupancy: Occupancy,
    epoch: u32,
    slots: Vec<Option<T>>,
    members: BTreeMap<String, Vec<Handle<T>>>,
}

impl<T> fmt::Debug for UniqueRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueRegistry")
            .field("occupancy", &self.occupancy)
            .field("epoch", &self.epoch)
            .field("members", &self.members)
            .finish()
    }
}

impl<T: Registered> UniqueRegistry<T> {
    /// Creates a registry allowing one entity per key.
    pub fn exclusive() -> Self {
        Self::with_occupancy(Occupancy::Exclusive)
    }

    /// Creates a registry allowing many entities per key.
    pub fn shared() -> Self {
        Self::with_occupancy(Occupancy::Shared)
    }

    fn with_occupancy(occupancy: Occupancy) -> Self {
        Self {
            occupancy,
            epoch: 0,
            slots: Vec::new(),
            members: BTreeMap::new(),
        }
    }

    /// Returns the occupancy rule.
    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    /// Returns the entity behind `handle`, if it is still registered.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.slots.get(handle.index as usize)?.as_ref()
    }

    /// Mutable access to the entity behind `handle`.
    ///
    /// Key-changing mutations are not reachable through this reference;
    /// they are registry methods so the index stays in sync.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.slots.get_mut(handle.index as usize)?.as_mut()
    }

    pub(crate) fn try_get(&self, handle: Handle<T>) -> CdlResult<&T> {
        self.get(handle).ok_or(CdlError::StaleHandle)
    }

    /// Returns true if any entity is registered under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    /// Handles registered under `key`, in insertion order.
    pub fn members(&self, key: &str) -> &[Handle<T>] {
        self.members.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All keys currently in use, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// All live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        let epoch = self.epoch;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(i, slot)| slot.as_ref().map(|e| (Handle::new(i as u32, epoch), e)))
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns true if no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Checks whether `handle` may hold `key`.
    pub(crate) fn check_key(&self, key: &str, handle: Handle<T>) -> CdlResult<()> {
        if self.occupancy == Occupancy::Exclusive
            && self.members(key).iter().any(|h| *h != handle)
        {
            return Err(CdlError::duplicate_id(key));
        }
        Ok(())
    }

    /// Builds an entity with its future handle and registers it.
    ///
    /// Nothing is stored if `build` fails or the key is taken.
    pub(crate) fn insert_with<F>(&mut self, build: F) -> CdlResult<Handle<T>>
    where
        F: FnOnce(Handle<T>) -> CdlResult<T>,
    {
        let handle = Handle::new(self.slots.len() as u32, self.epoch);
        let entity = build(handle)?;
        self.check_key(entity.registry_key(), handle)?;

        self.link(entity.registry_key().to_string(), handle);
        self.slots.push(Some(entity));
        Ok(handle)
    }

    /// Moves `handle` to `new_key`, applying `apply` to the entity in between.
    ///
    /// `apply` must leave the entity's [`Registered::registry_key`] equal to
    /// `new_key`. On a key collision nothing is changed.
    pub(crate) fn rekey<F>(&mut self, handle: Handle<T>, new_key: &str, apply: F) -> CdlResult<()>
    where
        F: FnOnce(&mut T),
    {
        let old_key = self.try_get(handle)?.registry_key().to_string();
        self.check_key(new_key, handle)?;

        let entity = self.get_mut(handle).ok_or(CdlError::StaleHandle)?;
        apply(entity);
        debug_assert_eq!(entity.registry_key(), new_key);

        if old_key != new_key {
            debug!(old = %old_key, new = %new_key, "re-keying registry member");
            self.unlink(&old_key, handle);
            self.link(new_key.to_string(), handle);
        }
        Ok(())
    }

    /// Removes and returns the entity behind `handle`.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if handle.epoch != self.epoch {
            return None;
        }
        let entity = self.slots.get_mut(handle.index as usize)?.take()?;
        self.unlink(entity.registry_key(), handle);
        Some(entity)
    }

    /// Drops every entity and invalidates all outstanding handles.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.members.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn link(&mut self, key: String, handle: Handle<T>) {
        self.members.entry(key).or_default().push(handle);
    }

    // Tolerates a handle that is not listed under `key`.
    fn unlink(&mut self, key: &str, handle: Handle<T>) {
        if let Some(list) = self.members.get_mut(key) {
            list.retain(|h| *h != handle);
            if list.is_empty() {
                self.members.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(String);

    impl Registered for Named {
        fn registry_key(&self) -> &str {
            &self.0
        }
    }

    fn add(reg: &mut UniqueRegistry<Named>, key: &str) -> CdlResult<Handle<Named>> {
        reg.insert_with(|_| Ok(Named(key.to_string())))
    }

    fn rename(reg: &mut UniqueRegistry<Named>, h: Handle<Named>, key: &str) -> CdlResult<()> {
        reg.rekey(h, key, |e| e.0 = key.to_string())
    }

    #[test]
    fn test_exclusive_rejects_duplicates() {
        let mut reg = UniqueRegistry::exclusive();
        add(&mut reg, "uniqueId").unwrap();
        let err = add(&mut reg, "uniqueId").unwrap_err();
        assert!(err.is_identity_error());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_rename_moves_membership() {
        let mut reg = UniqueRegistry::exclusive();
        let h = add(&mut reg, "betterId").unwrap();
        rename(&mut reg, h, "betterishId").unwrap();

        assert!(!reg.contains_key("betterId"));
        assert_eq!(reg.members("betterishId"), &[h]);
        assert_eq!(reg.get(h).unwrap().0, "betterishId");
    }

    #[test]
    fn test_rename_collision_leaves_state() {
        let mut reg = UniqueRegistry::exclusive();
        let a = add(&mut reg, "uniqueId").unwrap();
        let b = add(&mut reg, "betterId").unwrap();

        assert!(rename(&mut reg, b, "uniqueId").unwrap_err().is_identity_error());
        assert_eq!(reg.get(b).unwrap().0, "betterId");
        assert_eq!(reg.members("uniqueId"), &[a]);
        assert_eq!(reg.members("betterId"), &[b]);
    }

    #[test]
    fn test_rename_to_own_key() {
        let mut reg = UniqueRegistry::exclusive();
        let a = add(&mut reg, "uniqueId").unwrap();
        rename(&mut reg, a, "uniqueId").unwrap();
        assert_eq!(reg.members("uniqueId"), &[a]);
    }

    #[test]
    fn test_shared_normal_operation() {
        let mut reg = UniqueRegistry::shared();
        let mr = add(&mut reg, "hello").unwrap();
        rename(&mut reg, mr, "goodbye").unwrap();
        assert_eq!(reg.keys().collect::<Vec<_>>(), ["goodbye"]);
        assert_eq!(reg.members("goodbye"), &[mr]);
    }

    #[test]
    fn test_shared_multiple_new_refs() {
        let mut reg = UniqueRegistry::shared();
        let mr = add(&mut reg, "hello").unwrap();
        let mr2 = add(&mut reg, "goodbye").unwrap();

        rename(&mut reg, mr, "goodbye").unwrap();
        assert!(!reg.contains_key("hello"));
        assert_eq!(reg.members("goodbye"), &[mr2, mr]);
    }

    #[test]
    fn test_shared_multiple_old_refs() {
        let mut reg = UniqueRegistry::shared();
        let mr = add(&mut reg, "hello").unwrap();
        let mr2 = add(&mut reg, "hello").unwrap();
        assert_eq!(reg.members("hello"), &[mr, mr2]);

        rename(&mut reg, mr, "goodbye").unwrap();
        assert_eq!(reg.members("hello"), &[mr2]);
        assert_eq!(reg.members("goodbye"), &[mr]);
    }

    #[test]
    fn test_unlink_tolerates_missing_entry() {
        let mut reg = UniqueRegistry::shared();
        let mr = add(&mut reg, "hello").unwrap();
        reg.members.clear();

        rename(&mut reg, mr, "goodbye").unwrap();
        assert_eq!(reg.keys().collect::<Vec<_>>(), ["goodbye"]);
    }

    #[test]
    fn test_remove() {
        let mut reg = UniqueRegistry::exclusive();
        let a = add(&mut reg, "a").unwrap();
        let b = add(&mut reg, "b").unwrap();
        assert_eq!(reg.remove(a).unwrap().0, "a");
        assert!(reg.get(a).is_none());
        assert!(!reg.contains_key("a"));
        assert_eq!(reg.iter().map(|(h, _)| h).collect::<Vec<_>>(), [b]);
        // The key is free again.
        add(&mut reg, "a").unwrap();
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut reg = UniqueRegistry::exclusive();
        let a = add(&mut reg, "a").unwrap();
        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.get(a).is_none());

        let a2 = add(&mut reg, "a").unwrap();
        assert_eq!(a2.index(), a.index());
        assert_ne!(a2, a);
        assert!(rename(&mut reg, a, "b").is_err());
    }
}
