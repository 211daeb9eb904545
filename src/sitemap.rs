use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use log::{debug, info, warn};
use serde::Serialize;
use sitemap::{
    reader::{SiteMapEntity, SiteMapReader},
    structs::{LastMod, Location},
};
use url::Url;

use crate::fetch::Fetcher;
use crate::page::normalize_url;

/// A page listed in a sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub url: Url,
    pub lastmod: Option<DateTime<FixedOffset>>,
}

/// The contents of a single sitemap file.
#[derive(Debug, Default)]
pub struct SitemapDocument {
    /// `<url>` entries.
    pub entries: Vec<SitemapEntry>,
    /// Nested sitemaps from a `<sitemapindex>`.
    pub sitemaps: Vec<Url>,
}

/// Parses a sitemap or sitemap index.
///
/// Entries whose location or structure cannot be parsed are skipped.
pub fn parse_sitemap(content: &[u8]) -> SitemapDocument {
    let mut document = SitemapDocument::default();

    for entity in SiteMapReader::new(content) {
        match entity {
            SiteMapEntity::Url(url_entry) => {
                if let Location::Url(url) = url_entry.loc {
                    document.entries.push(SitemapEntry {
                        url,
                        lastmod: lastmod_datetime(url_entry.lastmod),
                    });
                }
            }
            SiteMapEntity::SiteMap(sitemap_entry) => {
                if let Location::Url(url) = sitemap_entry.loc {
                    document.sitemaps.push(url);
                }
            }
            SiteMapEntity::Err(_) => debug!("Skipping malformed sitemap entity"),
        }
    }

    document
}

fn lastmod_datetime(lastmod: LastMod) -> Option<DateTime<FixedOffset>> {
    match lastmod {
        LastMod::DateTime(datetime) => Some(datetime),
        LastMod::None | LastMod::ParseErr(_) => None,
    }
}

/// Collects page entries from a sitemap, following nested sitemap indexes.
///
/// # Errors
///
/// This function will return an error if the root sitemap cannot be fetched.
/// Nested sitemaps that fail to load are logged and skipped.
pub async fn fetch_sitemap_entries(
    fetcher: &Fetcher,
    sitemap_url: &Url,
) -> Result<Vec<SitemapEntry>> {
    walk_sitemaps(sitemap_url, move |url: Url| async move {
        fetcher.fetch_bytes(&url).await
    })
    .await
}

/// Walks a sitemap and its nested indexes depth first, loading each file with `fetch`.
///
/// Every sitemap is fetched at most once. Entries are deduplicated by normalized URL,
/// keeping the first occurrence, and returned sorted by URL.
///
/// # Errors
///
/// This function will return an error if the root sitemap cannot be fetched.
/// Nested sitemaps that fail to load are logged and skipped.
pub async fn walk_sitemaps<F, Fut>(
    sitemap_url: &Url,
    mut fetch: F,
) -> Result<Vec<SitemapEntry>>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<Vec<u8>>>,
{
    let root = fetch(sitemap_url.clone())
        .await
        .context(format!("Failed to fetch sitemap {sitemap_url}"))?;

    let mut entries = BTreeMap::new();
    let mut visited = HashSet::from([sitemap_url.to_string()]);
    let mut sitemaps_to_process = Vec::new();

    collect_document(parse_sitemap(&root), &mut entries, &mut sitemaps_to_process);

    while let Some(current_sitemap) = sitemaps_to_process.pop() {
        if !visited.insert(current_sitemap.to_string()) {
            continue;
        }

        match fetch(current_sitemap.clone()).await {
            Ok(content) => collect_document(
                parse_sitemap(&content),
                &mut entries,
                &mut sitemaps_to_process,
            ),
            Err(err) => warn!("Skipping nested sitemap {current_sitemap}: {err}"),
        }
    }

    info!("Sitemap entries: {}", entries.len());
    Ok(entries.into_values().collect())
}

fn collect_document(
    document: SitemapDocument,
    entries: &mut BTreeMap<String, SitemapEntry>,
    sitemaps_to_process: &mut Vec<Url>,
) {
    for mut entry in document.entries {
        entry.url = normalize_url(&entry.url);
        entries.entry(entry.url.to_string()).or_insert(entry);
    }
    sitemaps_to_process.extend(document.sitemaps.into_iter().rev());
}
