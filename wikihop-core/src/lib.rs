use colored::Colorize;

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod finder;
pub mod query;
pub mod report;

pub use cache::{InMemoryLinkCache, LinkCache};
pub use config::{CacheBackend, FinderConfig};
pub use data::{CacheStats, SqliteLinkCache};
pub use error::{FinderError, Result};
pub use fetch::{FetchCoordinator, FetchMode};
pub use finder::{DEFAULT_MAX_EXPANDED, PathFinder, SearchResult};
pub use query::{QueryResponse, QueryStatus, run_query};
pub use report::ReportFormat;

pub fn print_banner() {
    let banner = r#"
           _ _    _ _
 __      _(_) | _(_) |__   ___  _ __
 \ \ /\ / / | |/ / | '_ \ / _ \| '_ \
  \ V  V /| |   <| | | | | (_) | |_) |
   \_/\_/ |_|_|\_\_|_| |_|\___/| .__/
                               |_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} v{}\n",
        "shortest link paths between pages".bright_black(),
        env!("CARGO_PKG_VERSION")
    );
}
