use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};
use wikihop_scanner::{NeighborResolver, NeighborSet, PageId, ScanError};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(6);

/// How neighbor resolutions are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Spawned tasks, at most `workers` resolving at once.
    Parallel { workers: usize },
    /// Inline on the caller's task.
    Sequential,
}

impl FetchMode {
    pub fn parallel() -> Self {
        FetchMode::Parallel {
            workers: default_workers(),
        }
    }
}

impl Default for FetchMode {
    fn default() -> Self {
        Self::parallel()
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Runs neighbor resolutions under a deadline and never fails: errors, panics and
/// timeouts all come back as an empty neighbor set.
pub struct FetchCoordinator {
    resolver: Arc<dyn NeighborResolver>,
    mode: FetchMode,
    deadline: Duration,
    pool: Option<Arc<Semaphore>>,
}

impl FetchCoordinator {
    pub fn new(resolver: Arc<dyn NeighborResolver>) -> Self {
        Self::with_mode(resolver, FetchMode::default(), DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_mode(
        resolver: Arc<dyn NeighborResolver>,
        mode: FetchMode,
        deadline: Duration,
    ) -> Self {
        let pool = match mode {
            FetchMode::Parallel { workers } => Some(Arc::new(Semaphore::new(workers.max(1)))),
            FetchMode::Sequential => None,
        };
        Self {
            resolver,
            mode,
            deadline,
            pool,
        }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn resolver(&self) -> &Arc<dyn NeighborResolver> {
        &self.resolver
    }

    pub async fn resolve(&self, page: &PageId) -> NeighborSet {
        match &self.pool {
            Some(pool) => self.resolve_on_pool(pool, page).await,
            None => self.resolve_inline(page).await,
        }
    }

    async fn resolve_inline(&self, page: &PageId) -> NeighborSet {
        match timeout(self.deadline, self.resolver.resolve(page)).await {
            Ok(Ok(links)) => links,
            Ok(Err(e)) => {
                debug!("Resolver failed for {}: {}", page, e);
                NeighborSet::new()
            }
            Err(_) => {
                warn!("Timed out resolving {} after {:?}", page, self.deadline);
                NeighborSet::new()
            }
        }
    }

    async fn resolve_on_pool(&self, pool: &Arc<Semaphore>, page: &PageId) -> NeighborSet {
        let resolver = Arc::clone(&self.resolver);
        let pool = Arc::clone(pool);
        let target = page.clone();

        let mut handle = tokio::spawn(async move {
            let _permit = pool
                .acquire_owned()
                .await
                .map_err(|e| ScanError::Other(format!("worker pool closed: {}", e)))?;
            resolver.resolve(&target).await
        });

        match timeout(self.deadline, &mut handle).await {
            Ok(joined) => match joined.map_err(ScanError::from).and_then(|resolved| resolved) {
                Ok(links) => links,
                Err(ScanError::Join(e)) => {
                    warn!("Worker task for {} failed: {}", page, e);
                    NeighborSet::new()
                }
                Err(e) => {
                    debug!("Resolver failed for {}: {}", page, e);
                    NeighborSet::new()
                }
            },
            Err(_) => {
                handle.abort();
                warn!("Timed out resolving {} after {:?}", page, self.deadline);
                NeighborSet::new()
            }
        }
    }
}
