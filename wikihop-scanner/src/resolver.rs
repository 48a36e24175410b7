use crate::error::{Result, ScanError};
use crate::page::{DEFAULT_MAX_LINKS, NeighborSet, Page, PageId, SiteScope};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Turns a page into the set of pages it links to.
///
/// Implementations may block on the network for as long as they like; callers that
/// need a deadline wrap the call themselves.
#[async_trait]
pub trait NeighborResolver: Send + Sync {
    async fn resolve(&self, page: &PageId) -> Result<NeighborSet>;

    async fn is_reachable(&self, page: &PageId) -> bool {
        self.resolve(page).await.is_ok()
    }
}

/// Resolves neighbors by downloading the page and reading links out of its HTML.
pub struct HttpResolver {
    client: Client,
    scope: SiteScope,
    max_links: usize,
    verify_links: bool,
    verify_concurrency: usize,
}

impl HttpResolver {
    pub fn new(scope: SiteScope) -> Result<Self> {
        Self::with_timeout(scope, Duration::from_secs(6))
    }

    pub fn with_timeout(scope: SiteScope, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("wikihop/0.1 (https://github.com/trapdoorsec/wikihop)")
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            scope,
            max_links: DEFAULT_MAX_LINKS,
            verify_links: false,
            verify_concurrency: DEFAULT_MAX_LINKS,
        })
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// Only accept links whose target answers with a success status.
    pub fn with_verify_links(mut self, verify_links: bool) -> Self {
        self.verify_links = verify_links;
        self
    }

    pub fn with_verify_concurrency(mut self, concurrency: usize) -> Self {
        self.verify_concurrency = concurrency.max(1);
        self
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }

    /// Download a page. Failures produce an unreachable page rather than an error.
    pub async fn fetch_page(&self, page: &PageId) -> Page {
        let start = Instant::now();
        match self.fetch_document(page).await {
            Ok(html) => {
                debug!("Fetched {} in {:?}", page, start.elapsed());
                Page::new(page.clone(), html)
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", page, e);
                Page::unreachable(page.clone())
            }
        }
    }

    async fn fetch_document(&self, page: &PageId) -> Result<String> {
        let response = self.client.get(page.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status(status.as_u16()));
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        let body = response.text().await?;
        if is_html {
            Ok(body)
        } else {
            debug!("{} is not HTML, treating it as a page without links", page);
            Ok(String::new())
        }
    }

    async fn keep_reachable(&self, candidates: Vec<PageId>) -> Vec<PageId> {
        stream::iter(candidates)
            .map(|candidate| async move {
                let reachable = self.is_reachable(&candidate).await;
                (candidate, reachable)
            })
            .buffered(self.verify_concurrency)
            .filter_map(|(candidate, reachable)| async move {
                if !reachable {
                    debug!("  -> {} is unreachable, skipping", candidate);
                }
                reachable.then_some(candidate)
            })
            .take(self.max_links)
            .collect()
            .await
    }
}

#[async_trait]
impl NeighborResolver for HttpResolver {
    async fn resolve(&self, page: &PageId) -> Result<NeighborSet> {
        let fetched = self.fetch_page(page).await;
        if !fetched.is_reachable() {
            return Ok(NeighborSet::new());
        }

        let candidates = fetched.candidate_links(&self.scope)?;
        debug!("Found {} candidate link(s) on {}", candidates.len(), page);

        if self.verify_links {
            let verified = self.keep_reachable(candidates).await;
            Ok(NeighborSet::capped(verified, self.max_links))
        } else {
            Ok(NeighborSet::capped(candidates, self.max_links))
        }
    }

    async fn is_reachable(&self, page: &PageId) -> bool {
        match self.client.head(page.as_str()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("HEAD {} failed: {}", page, e);
                false
            }
        }
    }
}
