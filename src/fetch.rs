//! The fetch module downloads sitemaps, pages and response headers over HTTP.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, redirect::Policy};
use url::Url;

use crate::constants::{DEFAULT_USER_AGENT, REDIRECT_LIMIT, USER_AGENT_ENV_NAME};
use crate::page::{PageSignals, extract_page, normalize_url, same_site};

/// A polite sequential HTTP client.
pub struct Fetcher {
    client: Client,
    delay: Duration,
}

impl Fetcher {
    /// Creates a fetcher that waits `delay_ms` milliseconds between page requests.
    ///
    /// The user agent is read from `SEOAUDIT_USER_AGENT` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(delay_ms: u64) -> Result<Self> {
        let user_agent =
            std::env::var(USER_AGENT_ENV_NAME).unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(REDIRECT_LIMIT))
            .build()
            .context("Unable to build HTTP client.")?;

        Ok(Self {
            client,
            delay: Duration::from_millis(delay_ms),
        })
    }

    /// Fetches the body of `url` as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }

    /// Fetches the response headers of `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure.
    pub async fn fetch_headers(&self, url: &Url) -> Result<HeaderMap> {
        let response = self.client.get(url.as_str()).send().await?;
        info!("Fetched headers of {url} with {}", response.status());

        Ok(response.headers().clone())
    }

    /// Fetches and extracts every page in `urls`, one request at a time.
    ///
    /// Pages that fail to load or answer with a non-success status are skipped.
    pub async fn fetch_pages(&self, urls: &[Url]) -> Vec<PageSignals> {
        let mut pages = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.fetch_html(url).await {
                Ok(html) => {
                    info!("Fetched {url}");
                    pages.push(extract_page(url, &html));
                }
                Err(err) => warn!("Skipping {url}: {err}"),
            }
        }

        info!("Fetched {}/{} pages", pages.len(), urls.len());
        pages
    }

    /// Crawls the site of `root`, starting from `root` and then `seeds`, following every
    /// same-site link until the frontier is empty or `max_pages` pages are queued.
    ///
    /// Pages that fail to load or answer with a non-success status are skipped.
    pub async fn crawl(&self, root: &Url, seeds: &[Url], max_pages: usize) -> Vec<PageSignals> {
        let mut frontier = CrawlFrontier::new(root, max_pages);
        for seed in seeds {
            frontier.push(seed);
        }

        let mut pages = Vec::new();
        while let Some(url) = frontier.next() {
            if !pages.is_empty() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.fetch_html(&url).await {
                Ok(html) => {
                    info!("Crawled {url}");
                    let page = extract_page(&url, &html);
                    frontier.follow_links(&page);
                    pages.push(page);
                }
                Err(err) => warn!("Skipping {url}: {err}"),
            }
        }

        info!("Crawled {} pages, {} queued", pages.len(), frontier.queued());
        pages
    }

    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

/// Breadth-first queue of same-site pages, each queued at most once.
///
/// URLs are compared normalized and with an optional `www.` host prefix.
#[derive(Debug)]
pub struct CrawlFrontier {
    root: Url,
    queue: VecDeque<Url>,
    seen: HashSet<String>,
    max_pages: usize,
}

impl CrawlFrontier {
    /// Creates a frontier holding `root`.
    pub fn new(root: &Url, max_pages: usize) -> Self {
        let mut frontier = Self {
            root: root.clone(),
            queue: VecDeque::new(),
            seen: HashSet::new(),
            max_pages,
        };
        frontier.push(root);
        frontier
    }

    /// Queues `url` unless it is off-site, already queued, or the page limit is reached.
    pub fn push(&mut self, url: &Url) -> bool {
        if self.seen.len() >= self.max_pages
            || !matches!(url.scheme(), "http" | "https")
            || !same_site(&self.root, url)
        {
            return false;
        }

        let url = normalize_url(url);
        let key = url.as_str().replacen("://www.", "://", 1);
        if !self.seen.insert(key) {
            return false;
        }

        self.queue.push_back(url);
        true
    }

    /// Queues the internal links of a fetched page.
    pub fn follow_links(&mut self, page: &PageSignals) {
        for link in &page.links {
            self.push(&link.href);
        }
    }

    /// Number of pages ever queued.
    pub fn queued(&self) -> usize {
        self.seen.len()
    }
}

impl Iterator for CrawlFrontier {
    type Item = Url;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }
}
