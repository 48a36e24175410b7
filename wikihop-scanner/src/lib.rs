pub mod error;
pub mod page;
pub mod resolver;

pub use error::{Result, ScanError};
pub use page::{DEFAULT_MAX_LINKS, DEFAULT_SITE_PREFIX, NeighborSet, Page, PageId, SiteScope};
pub use resolver::{HttpResolver, NeighborResolver};
