use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::model::{Collection, GroupId, Item};
use crate::store::MemoryStore;
use crate::sync::{CacheKey, SnapshotCache};

/// One entry of the flat link list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub group_id: GroupId,
    pub item: Item,
}

#[derive(Debug, Default)]
struct Entries {
    link_groups: Option<Collection>,
    links: Option<Vec<LinkEntry>>,
}

/// Read-through cache over a [`MemoryStore`], one slot per [`CacheKey`].
///
/// Reads are served from the cached slot until that key is invalidated.
#[derive(Debug)]
pub struct StoreCache {
    store: Arc<MemoryStore>,
    entries: Mutex<Entries>,
    fetches: AtomicUsize,
}

impl StoreCache {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            entries: Mutex::new(Entries::default()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Number of reads that went through to the store.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn fetch(&self) -> Option<Collection> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        match self.store.snapshot() {
            Ok(collection) => Some(collection),
            Err(err) => {
                tracing::warn!(%err, "failed to read snapshot from store");
                None
            }
        }
    }

    /// The flat link list in display order.
    pub fn links(&self) -> Vec<LinkEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(links) = &entries.links {
            return links.clone();
        }
        let Some(collection) = self.fetch() else {
            return Vec::new();
        };
        let links = collection
            .flatten_items()
            .into_iter()
            .map(|(group_id, item)| LinkEntry {
                group_id,
                item: item.clone(),
            })
            .collect::<Vec<_>>();
        entries.links = Some(links.clone());
        links
    }
}

impl SnapshotCache for StoreCache {
    fn current_snapshot(&self) -> Collection {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(collection) = &entries.link_groups {
            return collection.clone();
        }
        let Some(collection) = self.fetch() else {
            return Collection::default();
        };
        entries.link_groups = Some(collection.clone());
        collection
    }

    fn invalidate(&self, keys: &[CacheKey]) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            tracing::trace!(key = key.as_str(), "invalidating cache key");
            match key {
                CacheKey::LinkGroups => entries.link_groups = None,
                CacheKey::Links => entries.links = None,
            }
        }
    }
}
