//! The page module turns raw HTML into the on-page signals every analyzer works from.

use anyhow::Result;
use dom_smoothie::{Article, CandidateSelectMode, Config, Readability, TextMode};
use log::{debug, warn};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector as ScraperSelector};
use serde::Serialize;
use url::Url;

use crate::constants::STOPWORDS;

static TITLE_SELECTOR: Lazy<ScraperSelector> =
    Lazy::new(|| ScraperSelector::parse("title").expect("Failed to parse title selector"));
static H1_SELECTOR: Lazy<ScraperSelector> =
    Lazy::new(|| ScraperSelector::parse("h1").expect("Failed to parse h1 selector"));
static META_DESCRIPTION_SELECTOR: Lazy<ScraperSelector> = Lazy::new(|| {
    ScraperSelector::parse(r#"meta[name="description"]"#)
        .expect("Failed to parse meta description selector")
});
static META_ROBOTS_SELECTOR: Lazy<ScraperSelector> = Lazy::new(|| {
    ScraperSelector::parse(r#"meta[name="robots"]"#).expect("Failed to parse meta robots selector")
});
static CANONICAL_SELECTOR: Lazy<ScraperSelector> = Lazy::new(|| {
    ScraperSelector::parse(r#"link[rel="canonical"]"#).expect("Failed to parse canonical selector")
});
static ANCHOR_SELECTOR: Lazy<ScraperSelector> =
    Lazy::new(|| ScraperSelector::parse("a[href]").expect("Failed to parse anchor selector"));
static JSON_LD_SELECTOR: Lazy<ScraperSelector> = Lazy::new(|| {
    ScraperSelector::parse(r#"script[type="application/ld+json"]"#)
        .expect("Failed to parse JSON-LD selector")
});
static BODY_SELECTOR: Lazy<ScraperSelector> =
    Lazy::new(|| ScraperSelector::parse("body").expect("Failed to parse body selector"));

/// A hyperlink found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Absolute, normalized link target.
    pub href: Url,
    /// Visible anchor text.
    pub anchor: String,
    /// Whether the link carries `rel="nofollow"`.
    pub nofollow: bool,
}

/// Everything the analyzers need to know about a single page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSignals {
    /// Normalized page URL.
    pub url: Url,
    /// The `<title>`, or the first `<h1>` when there is no title.
    pub title: Option<String>,
    pub h1: Vec<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<Url>,
    /// Whether a robots meta tag asks engines not to index the page.
    pub noindex: bool,
    pub links: Vec<Link>,
    #[serde(skip)]
    pub json_ld: Vec<serde_json::Value>,
    #[serde(skip)]
    pub text: String,
}

impl PageSignals {
    /// Returns `true` when the page declares a canonical URL other than itself.
    pub fn is_canonicalized_elsewhere(&self) -> bool {
        self.canonical
            .as_ref()
            .is_some_and(|canonical| normalize_url(canonical) != self.url)
    }
}

/// Normalizes a URL for link-graph comparisons.
///
/// Fragments and query strings are dropped and a trailing slash is removed from any
/// path other than the root.
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.set_query(None);

    let path = normalized.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        normalized.set_path(path.trim_end_matches('/'));
    }

    normalized
}

/// Returns `true` when both URLs live on the same site, treating `www.` as optional.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => a.trim_start_matches("www.") == b.trim_start_matches("www."),
        _ => false,
    }
}

/// Extracts on-page SEO signals from the HTML of `url`.
///
/// Never fails: missing elements are reported as `None` or empty collections and
/// malformed JSON-LD blocks are skipped with a warning.
pub fn extract_page(url: &Url, html: &str) -> PageSignals {
    let document = Html::parse_document(html);
    let page_url = normalize_url(url);

    let h1: Vec<String> = document
        .select(&H1_SELECTOR)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    let title = document
        .select(&TITLE_SELECTOR)
        .map(element_text)
        .find(|text| !text.is_empty())
        .or_else(|| h1.first().cloned());

    let meta_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty());

    let canonical = document
        .select(&CANONICAL_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| url.join(href.trim()).ok());

    let noindex = document
        .select(&META_ROBOTS_SELECTOR)
        .filter_map(|element| element.value().attr("content"))
        .any(|content| content.to_lowercase().contains("noindex"));

    let links: Vec<Link> = document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| extract_link(url, element))
        .collect();

    let json_ld: Vec<serde_json::Value> = document
        .select(&JSON_LD_SELECTOR)
        .filter_map(|element| {
            let body = element.text().collect::<String>();
            match serde_json::from_str(body.trim()) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!("Skipping malformed JSON-LD on {url}: {err}");
                    None
                }
            }
        })
        .collect();

    let text = match readable_text(html) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => body_text(&document),
        Err(err) => {
            debug!("Readability failed on {url}, using body text: {err}");
            body_text(&document)
        }
    };

    PageSignals {
        url: page_url,
        title,
        h1,
        meta_description,
        canonical,
        noindex,
        links,
        json_ld,
        text,
    }
}

fn extract_link(base: &Url, element: ElementRef<'_>) -> Option<Link> {
    let href = element.value().attr("href")?.trim();
    let lowered = href.to_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["mailto:", "tel:", "javascript:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let target = base.join(href).ok()?;
    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }

    let nofollow = element
        .value()
        .attr("rel")
        .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("nofollow")));

    Some(Link {
        href: normalize_url(&target),
        anchor: element_text(element),
        nofollow,
    })
}

fn readable_text(html: &str) -> Result<String> {
    let config = Config {
        text_mode: TextMode::Markdown,
        candidate_select_mode: CandidateSelectMode::DomSmoothie,
        ..Default::default()
    };

    let mut readability = Readability::new(html, None, Some(config))?;
    let article: Article = readability.parse()?;

    Ok(article.text_content.to_string())
}

fn body_text(document: &Html) -> String {
    document
        .select(&BODY_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercases `text` and folds every run of non-alphanumeric characters into one space.
pub(crate) fn fold_text(text: &str) -> String {
    words(text).collect::<Vec<_>>().join(" ")
}

/// Lowercase words of `text` that carry meaning: stopwords and words under three
/// characters are dropped.
pub(crate) fn content_tokens(text: &str) -> Vec<String> {
    words(text)
        .filter(|word| word.chars().count() >= 3 && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}
