use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{AuthorityError, ModelError, StoreError};
use crate::model::{Collection, Group, GroupId, Item, ItemId};
use crate::ordering::MoveCommand;
use crate::sync::OrderingAuthority;

/// In-process ordering authority holding the canonical collection.
///
/// Group and item ids come from one shared counter, so an id is never reused across kinds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: Mutex<Collection>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing collection. New ids continue after the largest one seen.
    pub fn with_collection(collection: Collection) -> Result<Self, ModelError> {
        collection.validate()?;
        let max_id = collection
            .groups()
            .iter()
            .flat_map(|group| {
                std::iter::once(group.id.0).chain(group.items.iter().map(|item| item.id.0))
            })
            .max();
        Ok(Self {
            groups: Mutex::new(collection),
            next_id: AtomicU64::new(max_id.map_or(0, |id| id + 1)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collection>, StoreError> {
        self.groups.lock().map_err(|_| StoreError::Poisoned)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Result<Collection, StoreError> {
        Ok(self.lock()?.clone())
    }

    /// Move a group so it ends up at `position`.
    pub fn reorder_group(&self, group_id: GroupId, position: usize) -> Result<(), StoreError> {
        let mut collection = self.lock()?;
        let from = collection
            .group_position(group_id)
            .ok_or(StoreError::GroupNotFound(group_id))?;
        let len = collection.len();
        if position >= len {
            return Err(StoreError::PositionOutOfRange { position, len });
        }

        let groups = collection.groups_mut();
        let group = groups.remove(from);
        groups.insert(position, group);
        Ok(())
    }

    /// Move an item into `group_id` so it ends up at `position_in_group`.
    pub fn reorder_item(
        &self,
        item_id: ItemId,
        group_id: GroupId,
        position_in_group: usize,
    ) -> Result<(), StoreError> {
        let mut collection = self.lock()?;
        let (from_group_ix, from_item_ix) = collection
            .locate_item(item_id)
            .ok_or(StoreError::ItemNotFound(item_id))?;
        let to_group_ix = collection
            .group_position(group_id)
            .ok_or(StoreError::GroupNotFound(group_id))?;

        let groups = collection.groups_mut();
        let mut len = groups[to_group_ix].items.len();
        if from_group_ix == to_group_ix {
            len -= 1;
        }
        if position_in_group > len {
            return Err(StoreError::PositionOutOfRange {
                position: position_in_group,
                len,
            });
        }

        let item = groups[from_group_ix].items.remove(from_item_ix);
        groups[to_group_ix].items.insert(position_in_group, item);
        Ok(())
    }

    /// Add an empty group at the front.
    pub fn add_group(&self) -> Result<GroupId, StoreError> {
        let mut collection = self.lock()?;
        let id = GroupId(self.next_id());
        collection.groups_mut().insert(0, Group::new(id));
        tracing::debug!(%id, "added group");
        Ok(id)
    }

    pub fn remove_group(&self, id: GroupId) -> Result<Group, StoreError> {
        let mut collection = self.lock()?;
        let position = collection
            .group_position(id)
            .ok_or(StoreError::GroupNotFound(id))?;
        Ok(collection.groups_mut().remove(position))
    }

    /// Drop every group without items. Returns how many were removed.
    pub fn remove_empty_groups(&self) -> Result<usize, StoreError> {
        let mut collection = self.lock()?;
        let groups = collection.groups_mut();
        let before = groups.len();
        groups.retain(|group| !group.items.is_empty());
        let removed = before - groups.len();
        tracing::debug!(removed, "removed empty groups");
        Ok(removed)
    }

    /// Add an item at the front of `group_id`.
    pub fn add_item(
        &self,
        group_id: GroupId,
        uri: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<ItemId, StoreError> {
        let mut collection = self.lock()?;
        let group_ix = collection
            .group_position(group_id)
            .ok_or(StoreError::GroupNotFound(group_id))?;
        let id = ItemId(self.next_id());
        collection.groups_mut()[group_ix]
            .items
            .insert(0, Item::new(id, title, uri));
        Ok(id)
    }

    pub fn remove_item(&self, id: ItemId) -> Result<Item, StoreError> {
        let mut collection = self.lock()?;
        let (group_ix, item_ix) = collection
            .locate_item(id)
            .ok_or(StoreError::ItemNotFound(id))?;
        Ok(collection.groups_mut()[group_ix].items.remove(item_ix))
    }
}

impl OrderingAuthority for MemoryStore {
    fn apply_move(&self, command: &MoveCommand) -> Result<(), AuthorityError> {
        match command {
            MoveCommand::Group(mv) => self.reorder_group(mv.group_id, mv.position)?,
            MoveCommand::Item(mv) => {
                self.reorder_item(mv.item_id, mv.group_id, mv.position_in_group)?
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        MemoryStore::with_collection(Collection::new(vec![
            Group::new(GroupId(1)).items([
                Item::new(ItemId(10), "a", "https://a.example"),
                Item::new(ItemId(11), "b", "https://b.example"),
            ]),
            Group::new(GroupId(2)).item(Item::new(ItemId(20), "c", "https://c.example")),
            Group::new(GroupId(3)),
        ]))
        .unwrap()
    }

    fn order(store: &MemoryStore) -> Vec<(u64, Vec<u64>)> {
        store
            .snapshot()
            .unwrap()
            .groups()
            .iter()
            .map(|group| (group.id.0, group.items.iter().map(|item| item.id.0).collect()))
            .collect()
    }

    #[test]
    fn new_ids_continue_after_seeded_ids() {
        let store = seeded();
        let group = store.add_group().unwrap();
        let item = store.add_item(group, "https://d.example", "d").unwrap();
        assert_eq!(group, GroupId(21));
        assert_eq!(item, ItemId(22));
        assert_eq!(order(&store)[0], (21, vec![22]));
    }

    #[test]
    fn reorder_item_within_and_across_groups() {
        let store = seeded();
        store.reorder_item(ItemId(10), GroupId(1), 1).unwrap();
        assert_eq!(order(&store)[0], (1, vec![11, 10]));

        store.reorder_item(ItemId(20), GroupId(1), 0).unwrap();
        assert_eq!(order(&store)[0], (1, vec![20, 11, 10]));
        assert_eq!(order(&store)[1], (2, vec![]));
    }

    #[test]
    fn out_of_range_positions_are_rejected() {
        let store = seeded();
        let before = store.snapshot().unwrap();

        assert_eq!(
            store.reorder_group(GroupId(1), 3),
            Err(StoreError::PositionOutOfRange { position: 3, len: 3 })
        );
        assert_eq!(
            store.reorder_item(ItemId(10), GroupId(1), 2),
            Err(StoreError::PositionOutOfRange { position: 2, len: 1 })
        );
        assert_eq!(store.reorder_item(ItemId(10), GroupId(2), 1), Ok(()));
        assert_ne!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn missing_ids_surface_as_errors() {
        let store = seeded();
        assert_eq!(
            store.reorder_group(GroupId(9), 0),
            Err(StoreError::GroupNotFound(GroupId(9)))
        );
        assert_eq!(
            store.reorder_item(ItemId(99), GroupId(1), 0),
            Err(StoreError::ItemNotFound(ItemId(99)))
        );
        assert_eq!(
            store.remove_item(ItemId(99)),
            Err(StoreError::ItemNotFound(ItemId(99)))
        );
        assert!(matches!(
            store.apply_move(&MoveCommand::Group(crate::ordering::GroupMove {
                group_id: GroupId(9),
                position: 0,
            })),
            Err(AuthorityError::Rejected(_))
        ));
    }

    #[test]
    fn remove_empty_groups_keeps_order() {
        let store = seeded();
        store.remove_item(ItemId(20)).unwrap();
        assert_eq!(store.remove_empty_groups().unwrap(), 2);
        assert_eq!(order(&store), vec![(1, vec![10, 11])]);
    }
}
