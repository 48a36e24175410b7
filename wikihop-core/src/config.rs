use crate::cache::{InMemoryLinkCache, LinkCache};
use crate::data::SqliteLinkCache;
use crate::error::Result;
use crate::fetch::{DEFAULT_FETCH_TIMEOUT, FetchMode};
use crate::finder::{DEFAULT_MAX_EXPANDED, PathFinder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wikihop_scanner::{DEFAULT_MAX_LINKS, DEFAULT_SITE_PREFIX, HttpResolver, SiteScope};

/// Where resolved neighbor sets are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// Lives as long as the process.
    Memory,
    /// Survives restarts; rows older than `ttl` are refetched.
    Sqlite {
        path: PathBuf,
        ttl: Option<Duration>,
    },
}

/// Options for building a [`PathFinder`] that talks to a live site.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub site_prefix: String,
    pub max_expanded: usize,
    pub fetch_timeout: Duration,
    pub max_links: usize,
    pub fetch_mode: FetchMode,
    pub verify_links: bool,
    pub cache: CacheBackend,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            site_prefix: DEFAULT_SITE_PREFIX.to_string(),
            max_expanded: DEFAULT_MAX_EXPANDED,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_links: DEFAULT_MAX_LINKS,
            fetch_mode: FetchMode::default(),
            verify_links: false,
            cache: CacheBackend::Memory,
        }
    }
}

impl FinderConfig {
    pub fn scope(&self) -> SiteScope {
        SiteScope::new(self.site_prefix.as_str())
    }

    pub fn open_cache(&self) -> Result<Arc<dyn LinkCache>> {
        match &self.cache {
            CacheBackend::Memory => Ok(Arc::new(InMemoryLinkCache::new())),
            CacheBackend::Sqlite { path, ttl } => {
                info!("Using link cache at {}", path.display());
                let mut cache = SqliteLinkCache::open(path)?;
                if let Some(ttl) = ttl {
                    cache = cache.with_ttl(*ttl);
                }
                Ok(Arc::new(cache))
            }
        }
    }

    /// Build a finder backed by the HTTP resolver and the configured cache.
    pub fn build(&self) -> Result<PathFinder> {
        let scope = self.scope();
        let resolver = HttpResolver::with_timeout(scope.clone(), self.fetch_timeout)?
            .with_max_links(self.max_links)
            .with_verify_links(self.verify_links);

        Ok(PathFinder::new(scope, Arc::new(resolver))
            .with_cache(self.open_cache()?)
            .with_fetch_mode(self.fetch_mode)
            .with_fetch_timeout(self.fetch_timeout)
            .with_max_expanded(self.max_expanded))
    }
}
