use crate::cache::{InMemoryLinkCache, LinkCache};
use crate::error::Result;
use crate::fetch::{FetchCoordinator, FetchMode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use wikihop_scanner::{NeighborResolver, NeighborSet, PageId, SiteScope};

pub const DEFAULT_MAX_EXPANDED: usize = 1000;

/// Outcome of one search: the path if one was found, and how many pages were expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: Option<Vec<PageId>>,
    pub nodes_expanded: usize,
}

impl SearchResult {
    pub fn found(path: Vec<PageId>, nodes_expanded: usize) -> Self {
        Self {
            path: Some(path),
            nodes_expanded,
        }
    }

    pub fn not_found(nodes_expanded: usize) -> Self {
        Self {
            path: None,
            nodes_expanded,
        }
    }

    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }

    /// Number of links followed, one less than the number of pages on the path.
    pub fn hops(&self) -> Option<usize> {
        self.path.as_ref().map(|p| p.len().saturating_sub(1))
    }
}

/// Per-query BFS bookkeeping.
struct SearchState {
    frontier: VecDeque<PageId>,
    discovered: HashSet<PageId>,
    parent: HashMap<PageId, PageId>,
    expanded: usize,
}

impl SearchState {
    fn new(start: &PageId) -> Self {
        let mut discovered = HashSet::new();
        discovered.insert(start.clone());
        Self {
            frontier: VecDeque::from([start.clone()]),
            discovered,
            parent: HashMap::new(),
            expanded: 0,
        }
    }

    /// Record `page` as reached from `from`. Returns false if it was already known.
    fn discover(&mut self, page: &PageId, from: &PageId) -> bool {
        if !self.discovered.insert(page.clone()) {
            return false;
        }
        self.parent.insert(page.clone(), from.clone());
        self.frontier.push_back(page.clone());
        true
    }

    fn path_to(&self, start: &PageId, end: &PageId) -> Vec<PageId> {
        let mut path = vec![end.clone()];
        let mut current = end;
        while current != start {
            match self.parent.get(current) {
                Some(previous) => {
                    path.push(previous.clone());
                    current = previous;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}

/// Bounded breadth-first search over the link graph.
///
/// The cache and the fetch worker pool belong to the finder, so one instance shared
/// behind an `Arc` serves every query in the process with a single cache. Each query
/// expands its frontier one page at a time.
///
/// Paths are shortest by hop count within the expansion budget. Neighbor sets are
/// unordered, so when several shortest paths exist which one is returned may vary.
pub struct PathFinder {
    scope: SiteScope,
    cache: Arc<dyn LinkCache>,
    fetcher: FetchCoordinator,
    max_expanded: usize,
}

impl PathFinder {
    pub fn new(scope: SiteScope, resolver: Arc<dyn NeighborResolver>) -> Self {
        Self {
            scope,
            cache: Arc::new(InMemoryLinkCache::new()),
            fetcher: FetchCoordinator::new(resolver),
            max_expanded: DEFAULT_MAX_EXPANDED,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn LinkCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        let resolver = Arc::clone(self.fetcher.resolver());
        self.fetcher = FetchCoordinator::with_mode(resolver, mode, self.fetcher.deadline());
        self
    }

    pub fn with_fetch_timeout(mut self, deadline: Duration) -> Self {
        let resolver = Arc::clone(self.fetcher.resolver());
        self.fetcher = FetchCoordinator::with_mode(resolver, self.fetcher.mode(), deadline);
        self
    }

    pub fn with_max_expanded(mut self, max_expanded: usize) -> Self {
        self.max_expanded = max_expanded;
        self
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }

    pub fn cache(&self) -> &Arc<dyn LinkCache> {
        &self.cache
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.fetcher.mode()
    }

    pub fn max_expanded(&self) -> usize {
        self.max_expanded
    }

    /// Validate both URLs, then search. Invalid input fails before anything is fetched.
    pub async fn find_path(&self, start: &str, end: &str) -> Result<SearchResult> {
        let start = self.scope.page(start)?;
        let end = self.scope.page(end)?;
        Ok(self.find_path_between(&start, &end).await)
    }

    pub async fn find_path_between(&self, start: &PageId, end: &PageId) -> SearchResult {
        if start == end {
            return SearchResult::found(vec![start.clone()], 1);
        }

        info!("Searching for a path from {} to {}", start, end);
        let started = Instant::now();
        let mut state = SearchState::new(start);

        while state.expanded < self.max_expanded {
            let Some(current) = state.frontier.pop_front() else {
                break;
            };
            state.expanded += 1;
            debug!("[{}] Expanding {}", state.expanded, current);

            let neighbors = self.neighbors(&current).await;
            for neighbor in neighbors.iter() {
                if state.discover(neighbor, &current) && neighbor == end {
                    let path = state.path_to(start, end);
                    info!(
                        "Found a {}-hop path after expanding {} page(s) in {:?}",
                        path.len() - 1,
                        state.expanded,
                        started.elapsed()
                    );
                    return SearchResult::found(path, state.expanded);
                }
            }
        }

        info!(
            "No path from {} to {} after expanding {} page(s) in {:?}",
            start,
            end,
            state.expanded,
            started.elapsed()
        );
        SearchResult::not_found(state.expanded)
    }

    async fn neighbors(&self, page: &PageId) -> Arc<NeighborSet> {
        if let Some(links) = self.cache.get(page) {
            debug!("  -> cache hit ({} links)", links.len());
            return links;
        }

        let resolved = Arc::new(self.fetcher.resolve(page).await);
        debug!("  -> resolved {} links", resolved.len());
        self.cache.put(page, Arc::clone(&resolved));
        // Another writer may have won the race; traverse whatever the cache kept.
        self.cache.get(page).unwrap_or(resolved)
    }
}
