//! The cannibalization module finds groups of pages competing for the same keyword.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::Serialize;

use crate::constants::{
    DEFAULT_TARGET_THRESHOLD, DENSITY_THRESHOLD, DENSITY_WEIGHT, H1_WEIGHT, HIGH_SEVERITY_SCORE,
    MEDIUM_SEVERITY_SCORE, META_WEIGHT, TITLE_WEIGHT, URL_WEIGHT,
};
use crate::page::{PageSignals, content_tokens, fold_text};

/// Settings for [`CannibalizationAnalyzer`].
#[derive(Debug, Clone)]
pub struct CannibalizationConfig {
    /// Minimum keyword score for a page to count as targeting the keyword.
    pub target_threshold: f64,
    /// Keywords to check. When empty, candidates are derived from titles and headings.
    pub keywords: Vec<String>,
}

impl Default for CannibalizationConfig {
    fn default() -> Self {
        Self {
            target_threshold: DEFAULT_TARGET_THRESHOLD,
            keywords: Vec::new(),
        }
    }
}

/// How strongly a page targets a keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageKeywordScore {
    pub url: String,
    pub score: f64,
    pub in_title: bool,
    pub in_h1: bool,
    pub in_url: bool,
    pub in_meta: bool,
    /// Share of body words taken by the keyword.
    pub density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    /// Keep an eye on rankings.
    Monitor,
    /// Retarget the secondary pages to distinct intents.
    Differentiate,
    /// Merge the pages into the primary one and redirect.
    Consolidate,
}

impl From<Severity> for Recommendation {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::High => Self::Consolidate,
            Severity::Medium => Self::Differentiate,
            Severity::Low => Self::Monitor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CannibalizationIssue {
    pub keyword: String,
    /// Competing pages, strongest first.
    pub pages: Vec<PageKeywordScore>,
    /// The page that should keep the keyword.
    pub primary: String,
    pub severity: Severity,
    pub recommendation: Recommendation,
}

impl CannibalizationIssue {
    fn urls(&self) -> BTreeSet<&str> {
        self.pages.iter().map(|page| page.url.as_str()).collect()
    }
}

/// Scores how strongly `page` targets `keyword`.
///
/// Matching is case-insensitive and whole-word; punctuation and hyphens count as spaces.
pub fn keyword_score(page: &PageSignals, keyword: &str) -> PageKeywordScore {
    let phrase = fold_text(keyword);

    let in_title = page
        .title
        .as_deref()
        .is_some_and(|title| contains_phrase(&fold_text(title), &phrase));
    let in_h1 = page
        .h1
        .iter()
        .any(|heading| contains_phrase(&fold_text(heading), &phrase));
    let in_url = contains_phrase(&fold_text(page.url.path()), &phrase);
    let in_meta = page
        .meta_description
        .as_deref()
        .is_some_and(|meta| contains_phrase(&fold_text(meta), &phrase));
    let density = phrase_density(&page.text, &phrase);

    let score = [
        (in_title, TITLE_WEIGHT),
        (in_h1, H1_WEIGHT),
        (in_url, URL_WEIGHT),
        (in_meta, META_WEIGHT),
        (density >= DENSITY_THRESHOLD, DENSITY_WEIGHT),
    ]
    .iter()
    .filter(|(matched, _)| *matched)
    .map(|(_, weight)| weight)
    .sum::<f64>()
    .min(1.0);

    PageKeywordScore {
        url: page.url.to_string(),
        score,
        in_title,
        in_h1,
        in_url,
        in_meta,
        density,
    }
}

fn contains_phrase(folded: &str, phrase: &str) -> bool {
    !phrase.is_empty() && format!(" {folded} ").contains(&format!(" {phrase} "))
}

fn phrase_density(text: &str, phrase: &str) -> f64 {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    let phrase_words: Vec<&str> = phrase.split(' ').filter(|word| !word.is_empty()).collect();

    if words.is_empty() || phrase_words.is_empty() {
        return 0.0;
    }

    let occurrences = words
        .windows(phrase_words.len())
        .filter(|window| {
            window
                .iter()
                .zip(&phrase_words)
                .all(|(word, expected)| word.to_lowercase() == *expected)
        })
        .count();

    (occurrences * phrase_words.len()) as f64 / words.len() as f64
}

/// Keywords that appear in the titles or headings of at least two pages.
///
/// Both single words and adjacent word pairs are considered.
pub fn candidate_keywords(pages: &[PageSignals]) -> Vec<String> {
    let mut page_counts: BTreeMap<String, usize> = BTreeMap::new();

    for page in pages {
        let heading_text = std::iter::once(page.title.clone().unwrap_or_default())
            .chain(page.h1.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let tokens = content_tokens(&heading_text);

        let keywords: BTreeSet<String> = tokens
            .iter()
            .cloned()
            .chain(tokens.windows(2).map(|pair| pair.join(" ")))
            .collect();

        for keyword in keywords {
            *page_counts.entry(keyword).or_default() += 1;
        }
    }

    page_counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(keyword, _)| keyword)
        .collect()
}

/// Finds keywords targeted by more than one indexable page.
#[derive(Debug, Default)]
pub struct CannibalizationAnalyzer {
    config: CannibalizationConfig,
}

impl CannibalizationAnalyzer {
    pub fn new(config: CannibalizationConfig) -> Self {
        Self { config }
    }

    /// Returns cannibalization issues sorted by severity (highest first), then keyword.
    ///
    /// Pages marked `noindex` or canonicalized to another URL do not compete.
    pub fn analyze(&self, pages: &[PageSignals]) -> Vec<CannibalizationIssue> {
        let eligible: Vec<PageSignals> = pages
            .iter()
            .filter(|page| !page.noindex && !page.is_canonicalized_elsewhere())
            .cloned()
            .collect();

        let keywords: BTreeSet<String> = if self.config.keywords.is_empty() {
            candidate_keywords(&eligible).into_iter().collect()
        } else {
            self.config
                .keywords
                .iter()
                .map(String::as_str)
                .map(fold_text)
                .filter(|keyword| !keyword.is_empty())
                .collect()
        };
        debug!("Checking {} keywords over {} pages", keywords.len(), eligible.len());

        let issues: Vec<CannibalizationIssue> = keywords
            .iter()
            .filter_map(|keyword| self.issue_for(keyword, &eligible))
            .collect();

        let mut issues = suppress_contained(issues);
        issues.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        info!("Found {} cannibalization issues", issues.len());
        issues
    }

    fn issue_for(&self, keyword: &str, pages: &[PageSignals]) -> Option<CannibalizationIssue> {
        let mut competing: Vec<PageKeywordScore> = pages
            .iter()
            .map(|page| keyword_score(page, keyword))
            .filter(|score| score.score >= self.config.target_threshold)
            .collect();

        if competing.len() < 2 {
            return None;
        }

        competing.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.url.len().cmp(&b.url.len()))
                .then_with(|| a.url.cmp(&b.url))
        });

        let mean = competing.iter().map(|page| page.score).sum::<f64>() / competing.len() as f64;
        let severity = if mean >= HIGH_SEVERITY_SCORE {
            Severity::High
        } else if mean >= MEDIUM_SEVERITY_SCORE {
            Severity::Medium
        } else {
            Severity::Low
        };

        Some(CannibalizationIssue {
            keyword: keyword.to_string(),
            primary: competing.first()?.url.clone(),
            pages: competing,
            severity,
            recommendation: severity.into(),
        })
    }
}

/// Drops issues whose keyword is part of a longer keyword raised over the same pages.
fn suppress_contained(issues: Vec<CannibalizationIssue>) -> Vec<CannibalizationIssue> {
    let keep: Vec<bool> = issues
        .iter()
        .map(|issue| {
            !issues.iter().any(|other| {
                other.keyword != issue.keyword
                    && contains_phrase(&other.keyword, &issue.keyword)
                    && other.urls() == issue.urls()
            })
        })
        .collect();

    issues
        .into_iter()
        .zip(keep)
        .filter_map(|(issue, keep)| keep.then_some(issue))
        .collect()
}
