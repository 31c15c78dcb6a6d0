use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Group,
    Item,
}

/// Identity of a draggable row: the entity id together with its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RowKey {
    Group(GroupId),
    Item(ItemId),
}

impl RowKey {
    #[inline]
    pub fn kind(&self) -> RowKind {
        match self {
            RowKey::Group(_) => RowKind::Group,
            RowKey::Item(_) => RowKind::Item,
        }
    }
}

impl From<GroupId> for RowKey {
    fn from(value: GroupId) -> Self {
        RowKey::Group(value)
    }
}

impl From<ItemId> for RowKey {
    fn from(value: ItemId) -> Self {
        RowKey::Item(value)
    }
}

/// A leaf entry (a saved link) that belongs to exactly one group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub uri: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            uri: uri.into(),
            tags: Vec::new(),
        }
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Group {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn position_of(&self, item_id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }
}

/// The ordered two-level collection: groups in display order, each holding ordered items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    groups: Vec<Group>,
}

impl Collection {
    pub fn new(groups: impl Into<Vec<Group>>) -> Self {
        Self {
            groups: groups.into(),
        }
    }

    /// Build a collection and reject it if ids are duplicated.
    pub fn try_new(groups: impl Into<Vec<Group>>) -> Result<Self, ModelError> {
        let collection = Self::new(groups);
        collection.validate()?;
        Ok(collection)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn group_position(&self, id: GroupId) -> Option<usize> {
        self.groups.iter().position(|group| group.id == id)
    }

    /// Returns `(group index, item index)` of the given item.
    pub fn locate_item(&self, id: ItemId) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(group_ix, group)| {
            group.position_of(id).map(|item_ix| (group_ix, item_ix))
        })
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        let (group_ix, item_ix) = self.locate_item(id)?;
        self.groups.get(group_ix)?.items.get(item_ix)
    }

    pub fn group_of(&self, id: ItemId) -> Option<GroupId> {
        let (group_ix, _) = self.locate_item(id)?;
        self.groups.get(group_ix).map(|group| group.id)
    }

    pub fn contains(&self, key: RowKey) -> bool {
        match key {
            RowKey::Group(id) => self.group_position(id).is_some(),
            RowKey::Item(id) => self.locate_item(id).is_some(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    /// All items in display order, tagged with their owning group.
    pub fn flatten_items(&self) -> Vec<(GroupId, &Item)> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter().map(move |item| (group.id, item)))
            .collect()
    }

    /// Check that every group id and every item id appears exactly once.
    ///
    /// Since items are stored inside their group, a unique item id also means the item has a
    /// single owning group.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut group_ids = HashSet::with_capacity(self.groups.len());
        let mut item_ids = HashSet::with_capacity(self.item_count());
        for group in &self.groups {
            if !group_ids.insert(group.id) {
                return Err(ModelError::DuplicateGroup(group.id));
            }
            for item in &group.items {
                if !item_ids.insert(item.id) {
                    return Err(ModelError::DuplicateItem(item.id));
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Group>> for Collection {
    fn from(groups: Vec<Group>) -> Self {
        Self::new(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> Item {
        Item::new(ItemId(id), format!("Link {id}"), format!("https://example.com/{id}"))
    }

    #[test]
    fn locate_item_reports_group_and_position() {
        let collection = Collection::new(vec![
            Group::new(GroupId(1)).items([item(10), item(11)]),
            Group::new(GroupId(2)).items([item(20)]),
        ]);

        assert_eq!(collection.locate_item(ItemId(11)), Some((0, 1)));
        assert_eq!(collection.locate_item(ItemId(20)), Some((1, 0)));
        assert_eq!(collection.locate_item(ItemId(99)), None);
        assert_eq!(collection.group_of(ItemId(20)), Some(GroupId(2)));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let duplicate_item = Collection::new(vec![
            Group::new(GroupId(1)).items([item(10)]),
            Group::new(GroupId(2)).items([item(10)]),
        ]);
        assert_eq!(
            duplicate_item.validate(),
            Err(ModelError::DuplicateItem(ItemId(10)))
        );

        let duplicate_group = Collection::new(vec![Group::new(GroupId(1)), Group::new(GroupId(1))]);
        assert_eq!(
            duplicate_group.validate(),
            Err(ModelError::DuplicateGroup(GroupId(1)))
        );
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let collection = Collection::new(vec![
            Group::new(GroupId(1)).items([item(10).tags(["rust"])]),
        ]);
        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.starts_with("[{\"id\":1,"));
        let back: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, collection);
    }
}
