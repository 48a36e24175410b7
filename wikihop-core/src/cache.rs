use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use wikihop_scanner::{NeighborSet, PageId};

/// Memoizes resolved neighbor sets per page.
///
/// The first successful `put` for a page is authoritative: later writes for the same
/// page are ignored, so a slow resolution can never replace a set the traversal
/// already used. Implementations must be safe to share between workers.
pub trait LinkCache: Send + Sync {
    fn get(&self, page: &PageId) -> Option<Arc<NeighborSet>>;

    fn put(&self, page: &PageId, links: Arc<NeighborSet>);
}

/// Process-lifetime cache backed by a locked map. Entries never expire.
#[derive(Debug, Default)]
pub struct InMemoryLinkCache {
    entries: RwLock<HashMap<PageId, Arc<NeighborSet>>>,
}

impl InMemoryLinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LinkCache for InMemoryLinkCache {
    fn get(&self, page: &PageId) -> Option<Arc<NeighborSet>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(page)
            .cloned()
    }

    fn put(&self, page: &PageId, links: Arc<NeighborSet>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(page.clone())
            .or_insert(links);
    }
}
