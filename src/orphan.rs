//! The orphan module builds the internal link graph of a site and finds pages that
//! nothing links to, along with other internal-linking gaps.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, FixedOffset};
use log::{debug, info};
use serde::Serialize;
use url::Url;

use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_SUGGESTIONS, DEFAULT_MIN_SIMILARITY,
    DIRECTORY_SIMILARITY_WEIGHT, PATH_SIMILARITY_WEIGHT, TITLE_SIMILARITY_WEIGHT,
};
use crate::page::{PageSignals, content_tokens, normalize_url, same_site};
use crate::sitemap::SitemapEntry;

/// Directed graph of internal links keyed by normalized URL.
#[derive(Debug, Default)]
pub struct LinkGraph {
    outbound: BTreeMap<String, BTreeSet<String>>,
    inbound: BTreeMap<String, BTreeSet<String>>,
}

impl LinkGraph {
    /// Builds the graph from crawled pages, keeping only links that stay on the site of
    /// `root`. Self links are ignored.
    pub fn build(root: &Url, pages: &[PageSignals]) -> Self {
        let mut graph = Self::default();

        for page in pages {
            let source = normalize_url(&page.url).to_string();
            graph.add_page(&source);

            for link in &page.links {
                if !same_site(root, &link.href) {
                    continue;
                }

                let target = normalize_url(&link.href).to_string();
                if target != source {
                    graph.add_edge(&source, &target);
                }
            }
        }

        graph
    }

    /// Registers a page with no known links, e.g. one only listed in the sitemap.
    pub fn add_page(&mut self, url: &str) {
        self.outbound.entry(url.to_string()).or_default();
        self.inbound.entry(url.to_string()).or_default();
    }

    fn add_edge(&mut self, source: &str, target: &str) {
        self.add_page(target);
        self.outbound
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string());
        self.inbound
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string());
    }

    /// Number of distinct pages linking to `url`.
    pub fn inbound(&self, url: &str) -> usize {
        self.inbound.get(url).map_or(0, BTreeSet::len)
    }

    /// Number of distinct pages `url` links to.
    pub fn outbound(&self, url: &str) -> usize {
        self.outbound.get(url).map_or(0, BTreeSet::len)
    }

    /// Pages linked from `url`.
    pub fn targets(&self, url: &str) -> impl Iterator<Item = &String> {
        self.outbound.get(url).into_iter().flatten()
    }

    /// All known pages, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.outbound.keys()
    }

    /// Click depth of every page reachable from `root`.
    pub fn depths(&self, root: &str) -> BTreeMap<String, usize> {
        let mut depths = BTreeMap::from([(root.to_string(), 0)]);
        let mut queue = VecDeque::from([(root.to_string(), 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            for target in self.targets(&current) {
                if !depths.contains_key(target) {
                    depths.insert(target.clone(), depth + 1);
                    queue.push_back((target.clone(), depth + 1));
                }
            }
        }

        depths
    }
}

/// Thresholds for [`OrphanPageDetector`].
#[derive(Debug, Clone)]
pub struct OrphanConfig {
    /// Pages deeper than this many clicks from the root are reported.
    pub max_depth: usize,
    /// Link sources suggested per orphan.
    pub max_suggestions: usize,
    /// Suggestions scoring below this are dropped.
    pub min_similarity: f64,
}

impl Default for OrphanConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSuggestion {
    /// Page that should link to the orphan.
    pub source: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanPage {
    pub url: String,
    pub in_sitemap: bool,
    pub lastmod: Option<DateTime<FixedOffset>>,
    pub suggestions: Vec<LinkSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinkStats {
    pub url: String,
    pub inbound: usize,
    pub outbound: usize,
    /// Clicks from the root, `None` when unreachable.
    pub depth: Option<usize>,
}

/// An internal link to a page that is neither crawled nor in the sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingLink {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Default, Serialize)]
pub struct OrphanReport {
    pub orphans: Vec<OrphanPage>,
    pub weakly_linked: Vec<PageLinkStats>,
    pub too_deep: Vec<PageLinkStats>,
    pub unreachable: Vec<String>,
    pub dangling: Vec<DanglingLink>,
    pub not_in_sitemap: Vec<String>,
    pub pages: Vec<PageLinkStats>,
}

/// The tokens of a page used to judge topical closeness to another page.
#[derive(Debug, Clone)]
pub struct PageProfile {
    title_tokens: BTreeSet<String>,
    path_tokens: BTreeSet<String>,
    parent: String,
}

impl PageProfile {
    pub fn new(url: &Url, title: Option<&str>) -> Self {
        let path = url.path().trim_end_matches('/');
        let parent = path
            .rsplit_once('/')
            .map(|(parent, _)| parent.to_string())
            .unwrap_or_default();

        Self {
            title_tokens: title.map(content_tokens).unwrap_or_default().into_iter().collect(),
            path_tokens: content_tokens(path).into_iter().collect(),
            parent,
        }
    }
}

/// Topical similarity of two pages in `0.0..=1.0`.
///
/// Weighted sum of title token overlap, a shared parent directory (other than the site
/// root) and URL path token overlap.
pub fn similarity(a: &PageProfile, b: &PageProfile) -> f64 {
    let same_directory = !a.parent.is_empty() && a.parent == b.parent;

    TITLE_SIMILARITY_WEIGHT * jaccard(&a.title_tokens, &b.title_tokens)
        + if same_directory { DIRECTORY_SIMILARITY_WEIGHT } else { 0.0 }
        + PATH_SIMILARITY_WEIGHT * jaccard(&a.path_tokens, &b.path_tokens)
}

/// The inventory key of `root`, matching its path on whichever `www.` variant of the
/// host the inventory uses.
fn resolve_root(root: &Url, inventory: &BTreeSet<&String>) -> String {
    let root = normalize_url(root);
    let key = root.to_string();
    if inventory.contains(&key) {
        return key;
    }

    inventory
        .iter()
        .find(|candidate| {
            Url::parse(candidate).is_ok_and(|candidate| {
                same_site(&root, &candidate) && candidate.path() == root.path()
            })
        })
        .map_or(key, |candidate| (*candidate).clone())
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Finds orphan pages and internal-linking gaps.
#[derive(Debug, Default)]
pub struct OrphanPageDetector {
    config: OrphanConfig,
}

impl OrphanPageDetector {
    pub fn new(config: OrphanConfig) -> Self {
        Self { config }
    }

    /// Analyzes the crawled `pages` and `sitemap` inventory of the site rooted at `root`.
    pub fn detect(
        &self,
        root: &Url,
        pages: &[PageSignals],
        sitemap: &[SitemapEntry],
    ) -> OrphanReport {
        let crawled: BTreeMap<String, &PageSignals> = pages
            .iter()
            .map(|page| (normalize_url(&page.url).to_string(), page))
            .collect();
        let listed: BTreeMap<String, &SitemapEntry> = sitemap
            .iter()
            .map(|entry| (normalize_url(&entry.url).to_string(), entry))
            .collect();
        let inventory: BTreeSet<&String> = crawled.keys().chain(listed.keys()).collect();
        let root_key = resolve_root(root, &inventory);

        let mut graph = LinkGraph::build(root, pages);
        for url in &inventory {
            graph.add_page(url);
        }
        let depths = graph.depths(&root_key);

        let mut report = OrphanReport::default();
        let mut orphan_urls = Vec::new();

        for url in &inventory {
            let stats = PageLinkStats {
                url: (*url).clone(),
                inbound: graph.inbound(url),
                outbound: graph.outbound(url),
                depth: depths.get(*url).copied(),
            };
            let is_root = **url == root_key;

            if !is_root && stats.inbound == 0 {
                orphan_urls.push((*url).clone());
            } else if !is_root {
                if stats.inbound == 1 {
                    report.weakly_linked.push(stats.clone());
                }
                match stats.depth {
                    Some(depth) if depth > self.config.max_depth => {
                        report.too_deep.push(stats.clone());
                    }
                    Some(_) => {}
                    None => report.unreachable.push((*url).clone()),
                }
            }

            report.pages.push(stats);
        }

        for source in crawled.keys() {
            for target in graph.targets(source) {
                if !inventory.contains(target) {
                    report.dangling.push(DanglingLink {
                        source: source.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        if !listed.is_empty() {
            report.not_in_sitemap = crawled
                .keys()
                .filter(|url| !listed.contains_key(*url))
                .cloned()
                .collect();
        }

        let sources: Vec<(&String, PageProfile)> = crawled
            .iter()
            .filter(|(url, _)| depths.contains_key(*url))
            .map(|(url, page)| (url, PageProfile::new(&page.url, page.title.as_deref())))
            .collect();

        report.orphans = orphan_urls
            .into_iter()
            .map(|url| {
                let title = crawled.get(&url).and_then(|page| page.title.as_deref());
                let entry = listed.get(&url).copied();
                self.orphan_page(url, title, entry, &sources)
            })
            .collect();

        info!(
            "Link graph: {} pages, {} orphans, {} unreachable, {} dangling links",
            report.pages.len(),
            report.orphans.len(),
            report.unreachable.len(),
            report.dangling.len()
        );

        report
    }

    fn orphan_page(
        &self,
        url: String,
        title: Option<&str>,
        entry: Option<&SitemapEntry>,
        sources: &[(&String, PageProfile)],
    ) -> OrphanPage {
        let suggestions = match Url::parse(&url) {
            Ok(parsed) => self.suggest(&url, &PageProfile::new(&parsed, title), sources),
            Err(err) => {
                debug!("Unable to profile {url}: {err}");
                Vec::new()
            }
        };

        OrphanPage {
            in_sitemap: entry.is_some(),
            lastmod: entry.and_then(|entry| entry.lastmod),
            url,
            suggestions,
        }
    }

    fn suggest(
        &self,
        orphan_url: &str,
        orphan: &PageProfile,
        sources: &[(&String, PageProfile)],
    ) -> Vec<LinkSuggestion> {
        let mut suggestions: Vec<LinkSuggestion> = sources
            .iter()
            .filter(|(url, _)| url.as_str() != orphan_url)
            .map(|(url, profile)| LinkSuggestion {
                source: (*url).clone(),
                score: similarity(orphan, profile),
            })
            .filter(|suggestion| suggestion.score >= self.config.min_similarity)
            .collect();

        suggestions.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.source.cmp(&b.source))
        });
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }
}
