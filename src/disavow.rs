//! The disavow module scores backlinks for toxicity and builds a disavow list.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DISAVOW_SCORE, LOW_AUTHORITY, LOW_AUTHORITY_PENALTY, MONEY_ANCHOR_PENALTY, REVIEW_SCORE,
    SITEWIDE_LINK_COUNT, SITEWIDE_PENALTY, SPAM_SCORE_FACTOR, SPAMMY_ANCHOR_PENALTY,
    SPAMMY_ANCHOR_TERMS, SPAMMY_DOMAIN_PENALTY, SPAMMY_DOMAIN_TOKENS, SUSPICIOUS_TLD_PENALTY,
    SUSPICIOUS_TLDS, VERY_LOW_AUTHORITY, VERY_LOW_AUTHORITY_PENALTY,
};
use crate::page::fold_text;

/// A backlink as exported by a link-index tool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Backlink {
    pub source_url: String,
    pub target_url: String,
    #[serde(default)]
    pub anchor_text: String,
    /// Domain authority/rating of the source, 0 to 100.
    pub domain_rating: Option<f64>,
    /// Third-party spam score of the source, 0 to 100.
    pub spam_score: Option<f64>,
    #[serde(default)]
    pub nofollow: bool,
    /// Total links from the source domain to the site.
    pub links_from_domain: Option<u32>,
}

/// A heuristic that contributed to a toxicity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ToxicSignal {
    SpamScore(f64),
    VeryLowAuthority(f64),
    LowAuthority(f64),
    SuspiciousTld(String),
    SpammyAnchor(String),
    MoneyAnchor(String),
    Sitewide(u32),
    SpammyDomain,
    Nofollow,
    Trusted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Verdict {
    Keep,
    Review,
    Disavow,
}

impl Verdict {
    fn from_score(score: f64) -> Self {
        if score >= DISAVOW_SCORE {
            Self::Disavow
        } else if score >= REVIEW_SCORE {
            Self::Review
        } else {
            Self::Keep
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkAssessment {
    pub source_url: String,
    pub source_domain: String,
    /// Toxicity from 0 (clean) to 100.
    pub score: f64,
    pub signals: Vec<ToxicSignal>,
    pub verdict: Verdict,
}

/// What the disavow command prints.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DisavowOutput {
    /// A disavow file body, one `domain:` line per toxic domain.
    #[default]
    File,
    /// Every assessment as JSON.
    Json,
}

impl std::str::FromStr for DisavowOutput {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "file" => Ok(DisavowOutput::File),
            "json" => Ok(DisavowOutput::Json),
            _ => Err(format!("Invalid disavow output: {input}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisavowConfig {
    /// Domains that are never disavowed, subdomains included.
    pub trusted_domains: Vec<String>,
    /// Commercial keywords; an anchor exactly matching one looks manipulative.
    pub money_keywords: Vec<String>,
}

/// Scores backlinks with fixed-weight toxicity heuristics.
#[derive(Debug, Default)]
pub struct DisavowScorer {
    config: DisavowConfig,
}

impl DisavowScorer {
    pub fn new(config: DisavowConfig) -> Self {
        Self { config }
    }

    /// Scores a single backlink.
    ///
    /// # Errors
    ///
    /// Returns an error if `source_url` is not an absolute URL with a host.
    pub fn score(&self, backlink: &Backlink) -> Result<LinkAssessment> {
        let source = Url::parse(&backlink.source_url)
            .context(format!("Invalid backlink source: {}", backlink.source_url))?;
        let domain = source
            .host_str()
            .context(format!("Backlink source has no host: {}", backlink.source_url))?
            .trim_start_matches("www.")
            .to_lowercase();

        if self.is_trusted(&domain) {
            return Ok(LinkAssessment {
                source_url: backlink.source_url.clone(),
                source_domain: domain,
                score: 0.0,
                signals: vec![ToxicSignal::Trusted],
                verdict: Verdict::Keep,
            });
        }

        let mut signals = Vec::new();
        let mut score = 0.0;

        if let Some(spam_score) = backlink.spam_score.filter(|spam| *spam > 0.0) {
            score += SPAM_SCORE_FACTOR * spam_score.min(100.0);
            signals.push(ToxicSignal::SpamScore(spam_score));
        }

        match backlink.domain_rating {
            Some(rating) if rating < VERY_LOW_AUTHORITY => {
                score += VERY_LOW_AUTHORITY_PENALTY;
                signals.push(ToxicSignal::VeryLowAuthority(rating));
            }
            Some(rating) if rating < LOW_AUTHORITY => {
                score += LOW_AUTHORITY_PENALTY;
                signals.push(ToxicSignal::LowAuthority(rating));
            }
            _ => {}
        }

        if let Some(tld) = domain.rsplit('.').next()
            && SUSPICIOUS_TLDS.contains(&tld)
        {
            score += SUSPICIOUS_TLD_PENALTY;
            signals.push(ToxicSignal::SuspiciousTld(tld.to_string()));
        }

        let anchor = fold_text(&backlink.anchor_text);
        if let Some(term) = SPAMMY_ANCHOR_TERMS
            .iter()
            .find(|term| anchor.split(' ').any(|word| word == **term))
        {
            score += SPAMMY_ANCHOR_PENALTY;
            signals.push(ToxicSignal::SpammyAnchor((*term).to_string()));
        }

        if !anchor.is_empty()
            && self
                .config
                .money_keywords
                .iter()
                .any(|keyword| fold_text(keyword) == anchor)
        {
            score += MONEY_ANCHOR_PENALTY;
            signals.push(ToxicSignal::MoneyAnchor(anchor.clone()));
        }

        if let Some(count) = backlink
            .links_from_domain
            .filter(|count| *count > SITEWIDE_LINK_COUNT)
        {
            score += SITEWIDE_PENALTY;
            signals.push(ToxicSignal::Sitewide(count));
        }

        if is_spammy_domain(&domain) {
            score += SPAMMY_DOMAIN_PENALTY;
            signals.push(ToxicSignal::SpammyDomain);
        }

        if backlink.nofollow {
            score /= 2.0;
            signals.push(ToxicSignal::Nofollow);
        }

        let score = f64::clamp(score, 0.0, 100.0);
        debug!("{} scored {score:.1}", backlink.source_url);

        Ok(LinkAssessment {
            source_url: backlink.source_url.clone(),
            source_domain: domain,
            score,
            signals,
            verdict: Verdict::from_score(score),
        })
    }

    /// Scores every backlink in order.
    ///
    /// # Errors
    ///
    /// Returns an error on the first backlink with an invalid source URL.
    pub fn assess_all(&self, backlinks: &[Backlink]) -> Result<Vec<LinkAssessment>> {
        let assessments = backlinks
            .iter()
            .map(|backlink| self.score(backlink))
            .collect::<Result<Vec<_>>>()?;

        let disavowed = assessments
            .iter()
            .filter(|assessment| assessment.verdict == Verdict::Disavow)
            .count();
        info!("Assessed {} backlinks, {disavowed} to disavow", assessments.len());

        Ok(assessments)
    }

    fn is_trusted(&self, domain: &str) -> bool {
        self.config.trusted_domains.iter().any(|trusted| {
            let trusted = trusted.trim_start_matches("www.").to_lowercase();
            domain == trusted || domain.ends_with(&format!(".{trusted}"))
        })
    }
}

fn is_spammy_domain(domain: &str) -> bool {
    let name = domain.rsplit_once('.').map_or(domain, |(name, _)| name);

    name.matches('-').count() >= 3
        || name.chars().filter(char::is_ascii_digit).count() >= 4
        || name
            .split(|c: char| c == '-' || c == '.' || c.is_ascii_digit())
            .any(|token| SPAMMY_DOMAIN_TOKENS.contains(&token))
}

/// Lines of a disavow file: one `domain:` entry per domain with a disavow verdict.
pub fn disavow_entries(assessments: &[LinkAssessment]) -> Vec<String> {
    assessments
        .iter()
        .filter(|assessment| assessment.verdict == Verdict::Disavow)
        .map(|assessment| format!("domain:{}", assessment.source_domain))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
