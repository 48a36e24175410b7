// Tests for the bounded path search

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wikihop_core::{
    FetchMode, FinderError, InMemoryLinkCache, LinkCache, PathFinder, SearchResult,
};
use wikihop_scanner::{
    DEFAULT_MAX_LINKS, NeighborResolver, NeighborSet, PageId, Result, ScanError, SiteScope,
};

const PREFIX: &str = "https://en.wikipedia.org";

fn wiki(title: &str) -> PageId {
    SiteScope::default()
        .page(&format!("{}/wiki/{}", PREFIX, title))
        .unwrap()
}

fn url(title: &str) -> String {
    format!("{}/wiki/{}", PREFIX, title)
}

/// In-memory graph that records every page it is asked to resolve.
#[derive(Default)]
struct GraphResolver {
    edges: HashMap<PageId, Vec<PageId>>,
    calls: Mutex<Vec<PageId>>,
}

impl GraphResolver {
    fn new(edges: &[(&str, &[&str])]) -> Self {
        let edges = edges
            .iter()
            .map(|(from, to)| (wiki(from), to.iter().map(|t| wiki(t)).collect()))
            .collect();
        Self {
            edges,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn chain(len: usize) -> Self {
        let mut edges = HashMap::new();
        for i in 0..len {
            edges.insert(wiki(&format!("N{}", i)), vec![wiki(&format!("N{}", i + 1))]);
        }
        Self {
            edges,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<PageId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NeighborResolver for GraphResolver {
    async fn resolve(&self, page: &PageId) -> Result<NeighborSet> {
        self.calls.lock().unwrap().push(page.clone());
        let links = self.edges.get(page).cloned().unwrap_or_default();
        Ok(NeighborSet::capped(links, DEFAULT_MAX_LINKS))
    }
}

struct HangingResolver {
    calls: AtomicUsize,
}

#[async_trait]
impl NeighborResolver for HangingResolver {
    async fn resolve(&self, _page: &PageId) -> Result<NeighborSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

struct FailingResolver;

#[async_trait]
impl NeighborResolver for FailingResolver {
    async fn resolve(&self, page: &PageId) -> Result<NeighborSet> {
        Err(ScanError::Other(format!("cannot reach {}", page)))
    }
}

fn finder(resolver: Arc<GraphResolver>) -> PathFinder {
    PathFinder::new(SiteScope::default(), resolver)
}

// ============================================================================
// Trivial and invalid queries
// ============================================================================

#[tokio::test]
async fn test_same_start_and_end() {
    let resolver = Arc::new(GraphResolver::new(&[]));
    let result = finder(resolver.clone())
        .find_path(&url("A"), &url("A"))
        .await
        .unwrap();

    assert_eq!(result, SearchResult::found(vec![wiki("A")], 1));
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_inputs_fail_before_fetching() {
    let resolver = Arc::new(GraphResolver::new(&[("A", &["B"])]));
    let finder = finder(resolver.clone());

    for (start, end) in [
        ("", url("B")),
        ("   ", url("B")),
        ("invalid-url", url("B")),
        ("https://example.com/wiki/A", url("B")),
    ] {
        let err = finder.find_path(start, &end).await.unwrap_err();
        assert!(matches!(err, FinderError::InvalidArgument(_)), "{}", start);
        let err = finder.find_path(&end, start).await.unwrap_err();
        assert!(matches!(err, FinderError::InvalidArgument(_)), "{}", start);
    }

    assert!(resolver.calls().is_empty());
}

// ============================================================================
// Traversal
// ============================================================================

#[tokio::test]
async fn test_direct_link_expands_only_start() {
    let resolver = Arc::new(GraphResolver::new(&[("A", &["B"])]));
    let result = finder(resolver.clone())
        .find_path(&url("A"), &url("B"))
        .await
        .unwrap();

    assert_eq!(result.path, Some(vec![wiki("A"), wiki("B")]));
    assert_eq!(result.nodes_expanded, 1);
    assert_eq!(result.hops(), Some(1));
    assert_eq!(resolver.calls(), vec![wiki("A")]);
}

#[tokio::test]
async fn test_linear_chain_explores_each_node_once() {
    const CHAIN_LENGTH: usize = 30;
    let resolver = Arc::new(GraphResolver::chain(CHAIN_LENGTH));
    let result = finder(resolver.clone())
        .find_path(&url("N0"), &url(&format!("N{}", CHAIN_LENGTH)))
        .await
        .unwrap();

    let expected: Vec<PageId> = (0..=CHAIN_LENGTH).map(|i| wiki(&format!("N{}", i))).collect();
    assert_eq!(result.path, Some(expected));
    assert_eq!(result.nodes_expanded, CHAIN_LENGTH);
    assert_eq!(resolver.calls().len(), CHAIN_LENGTH);
}

#[tokio::test]
async fn test_dead_end_start_is_not_found() {
    let resolver = Arc::new(GraphResolver::new(&[]));
    let result = finder(resolver)
        .find_path(&url("A"), &url("B"))
        .await
        .unwrap();

    assert!(!result.is_found());
    assert!(result.nodes_expanded >= 1);
}

#[tokio::test]
async fn test_returns_a_shortest_path() {
    // A -> B -> C -> D and A -> E -> D: the path through E is one hop shorter.
    let resolver = Arc::new(GraphResolver::new(&[
        ("A", &["B", "E"]),
        ("B", &["C"]),
        ("C", &["D"]),
        ("E", &["D"]),
    ]));
    let result = finder(resolver)
        .find_path(&url("A"), &url("D"))
        .await
        .unwrap();

    assert_eq!(result.path, Some(vec![wiki("A"), wiki("E"), wiki("D")]));
}

#[tokio::test]
async fn test_cycles_do_not_loop() {
    let resolver = Arc::new(GraphResolver::new(&[
        ("A", &["B"]),
        ("B", &["A", "C"]),
        ("C", &["B", "A"]),
    ]));
    let result = finder(resolver.clone())
        .find_path(&url("A"), &url("Z"))
        .await
        .unwrap();

    assert!(!result.is_found());
    assert_eq!(result.nodes_expanded, 3);
    assert_eq!(resolver.calls().len(), 3);
}

#[tokio::test]
async fn test_expansion_cap_stops_search() {
    let resolver = Arc::new(GraphResolver::chain(50));
    let result = finder(resolver.clone())
        .with_max_expanded(10)
        .find_path(&url("N0"), &url("N50"))
        .await
        .unwrap();

    assert!(!result.is_found());
    assert_eq!(result.nodes_expanded, 10);
    assert_eq!(resolver.calls().len(), 10);
}

#[tokio::test]
async fn test_sequential_mode_matches_parallel() {
    let edges: &[(&str, &[&str])] = &[("A", &["B"]), ("B", &["C"]), ("C", &["D"])];

    let parallel = finder(Arc::new(GraphResolver::new(edges)))
        .with_fetch_mode(FetchMode::Parallel { workers: 2 })
        .find_path(&url("A"), &url("D"))
        .await
        .unwrap();
    let sequential = finder(Arc::new(GraphResolver::new(edges)))
        .with_fetch_mode(FetchMode::Sequential)
        .find_path(&url("A"), &url("D"))
        .await
        .unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel.hops(), Some(3));
}

// ============================================================================
// Failures are absorbed
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_always_timing_out_resolver_is_not_found() {
    let resolver = Arc::new(HangingResolver {
        calls: AtomicUsize::new(0),
    });
    let finder = PathFinder::new(SiteScope::default(), resolver.clone())
        .with_fetch_timeout(Duration::from_secs(6));

    let result = finder.find_path(&url("A"), &url("B")).await.unwrap();

    assert!(!result.is_found());
    assert_eq!(result.nodes_expanded, 1);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_resolver_is_not_found() {
    for mode in [FetchMode::Sequential, FetchMode::Parallel { workers: 1 }] {
        let finder = PathFinder::new(SiteScope::default(), Arc::new(FailingResolver))
            .with_fetch_mode(mode);
        let result = finder.find_path(&url("A"), &url("B")).await.unwrap();
        assert!(!result.is_found());
    }
}

// ============================================================================
// Cache interaction
// ============================================================================

#[tokio::test]
async fn test_cache_hits_skip_the_resolver() {
    let resolver = Arc::new(GraphResolver::new(&[("A", &["B"]), ("B", &["C"])]));
    let cache = Arc::new(InMemoryLinkCache::new());
    let finder = finder(resolver.clone()).with_cache(cache.clone());

    finder.find_path(&url("A"), &url("C")).await.unwrap();
    assert_eq!(resolver.calls().len(), 2);
    assert_eq!(cache.len(), 2);

    let again = finder.find_path(&url("A"), &url("C")).await.unwrap();
    assert_eq!(again.hops(), Some(2));
    assert_eq!(resolver.calls().len(), 2);
}

#[tokio::test]
async fn test_prepopulated_cache_overrides_resolver() {
    let resolver = Arc::new(GraphResolver::new(&[("A", &["B"])]));
    let cache = Arc::new(InMemoryLinkCache::new());
    cache.put(
        &wiki("A"),
        Arc::new(NeighborSet::capped(vec![wiki("C")], DEFAULT_MAX_LINKS)),
    );

    let result = finder(resolver.clone())
        .with_cache(cache)
        .find_path(&url("A"), &url("C"))
        .await
        .unwrap();

    assert_eq!(result.path, Some(vec![wiki("A"), wiki("C")]));
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn test_failed_resolution_is_cached_as_empty() {
    let cache = Arc::new(InMemoryLinkCache::new());
    let finder = PathFinder::new(SiteScope::default(), Arc::new(FailingResolver))
        .with_cache(cache.clone());

    finder.find_path(&url("A"), &url("B")).await.unwrap();

    let cached = cache.get(&wiki("A")).unwrap();
    assert!(cached.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_share_one_finder() {
    let resolver = Arc::new(GraphResolver::chain(5));
    let finder = Arc::new(finder(resolver));

    let queries: Vec<_> = (1..=5)
        .map(|i| {
            let finder = Arc::clone(&finder);
            tokio::spawn(async move {
                finder
                    .find_path(&url("N0"), &url(&format!("N{}", i)))
                    .await
                    .unwrap()
            })
        })
        .collect();

    for (i, query) in queries.into_iter().enumerate() {
        let result = query.await.unwrap();
        assert_eq!(result.hops(), Some(i + 1));
    }
}
