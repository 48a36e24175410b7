use crate::error::{Result, ScanError};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use url::Url;

pub const DEFAULT_SITE_PREFIX: &str = "https://en.wikipedia.org";
pub const DEFAULT_MAX_LINKS: usize = 10;

/// Content regions searched for links, in order of preference.
const CONTENT_REGIONS: [&str; 2] = ["#bodyContent a[href]", "#mw-content-text a[href]"];

/// Hrefs containing any of these point at administrative or media pages, not articles.
const NON_CONTENT_MARKERS: [&str; 9] = [
    "index.php",
    "File:",
    "Category:",
    "Help:",
    "Special:",
    "Wikipedia:",
    "Talk:",
    "Template:",
    "Portal:",
];

/// Canonical URL of a single page. Only a [`SiteScope`] can mint one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The site prefix every page in the graph must live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    prefix: String,
}

impl SiteScope {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim().trim_end_matches('/').to_string();
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when `url` is the prefix itself or a path below it. A host that merely
    /// starts with the same characters (`en.wikipedia.org.example`) does not match.
    pub fn contains(&self, url: &str) -> bool {
        match url.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?']),
            None => false,
        }
    }

    /// Validate and canonicalise a raw URL into a [`PageId`].
    pub fn page(&self, raw: &str) -> Result<PageId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ScanError::InvalidPage("page URL cannot be empty".to_string()));
        }
        if !self.contains(raw) {
            return Err(ScanError::InvalidPage(format!(
                "{} is not under {}",
                raw, self.prefix
            )));
        }

        let mut url = Url::parse(raw)
            .map_err(|e| ScanError::InvalidPage(format!("{}: {}", raw, e)))?;
        url.set_fragment(None);

        let canonical = url.to_string();
        if !self.contains(&canonical) {
            return Err(ScanError::InvalidPage(format!(
                "{} is not under {}",
                canonical, self.prefix
            )));
        }
        Ok(PageId(canonical))
    }
}

impl Default for SiteScope {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_PREFIX)
    }
}

/// Deduplicated outbound links of one page, never larger than the cap it was built with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborSet {
    links: HashSet<PageId>,
}

impl NeighborSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect links until `max` distinct ones have been seen; the rest are ignored.
    pub fn capped<I>(links: I, max: usize) -> Self
    where
        I: IntoIterator<Item = PageId>,
    {
        let mut set = HashSet::new();
        for link in links {
            if set.len() >= max {
                break;
            }
            set.insert(link);
        }
        Self { links: set }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, page: &PageId) -> bool {
        self.links.contains(page)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageId> {
        self.links.iter()
    }
}

impl<'a> IntoIterator for &'a NeighborSet {
    type Item = &'a PageId;
    type IntoIter = std::collections::hash_set::Iter<'a, PageId>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

/// A fetched page. A page whose fetch failed has no document and is a dead end.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    document: Option<String>,
}

impl Page {
    pub fn new(id: PageId, html: String) -> Self {
        Self {
            id,
            document: Some(html),
        }
    }

    pub fn unreachable(id: PageId) -> Self {
        Self { id, document: None }
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn is_reachable(&self) -> bool {
        self.document.is_some()
    }

    /// In-scope article links from the primary content region, in document order,
    /// without duplicates.
    pub fn candidate_links(&self, scope: &SiteScope) -> Result<Vec<PageId>> {
        let Some(html) = self.document.as_deref() else {
            return Ok(Vec::new());
        };
        let base = Url::parse(self.id.as_str())
            .map_err(|e| ScanError::InvalidPage(format!("{}: {}", self.id, e)))?;
        let document = Html::parse_document(html);

        for region in CONTENT_REGIONS {
            let selector =
                Selector::parse(region).map_err(|e| ScanError::Selector(e.to_string()))?;
            let mut anchors = document.select(&selector).peekable();
            if anchors.peek().is_none() {
                continue;
            }

            let mut seen = HashSet::new();
            let mut links = Vec::new();
            for element in anchors {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if let Some(link) = resolve_href(&base, href, scope)
                    && seen.insert(link.clone())
                {
                    links.push(link);
                }
            }
            return Ok(links);
        }

        Ok(Vec::new())
    }

    pub fn outbound_links(&self, scope: &SiteScope, max: usize) -> Result<NeighborSet> {
        Ok(NeighborSet::capped(self.candidate_links(scope)?, max))
    }
}

fn is_skippable(href: &str) -> bool {
    href.is_empty()
        || href.starts_with('#')
        || NON_CONTENT_MARKERS.iter().any(|marker| href.contains(marker))
}

fn resolve_href(base: &Url, href: &str, scope: &SiteScope) -> Option<PageId> {
    let href = href.trim();
    if is_skippable(href) {
        return None;
    }
    let resolved = base.join(href).ok()?;
    scope.page(resolved.as_str()).ok()
}
