//! The headers module grades the security headers of an HTTP response.

use log::debug;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::constants::HSTS_MIN_MAX_AGE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HeaderStatus {
    Pass,
    /// Present but configured weakly, with the reason.
    Weak(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCheck {
    pub header: String,
    pub status: HeaderStatus,
    pub weight: u32,
}

impl HeaderCheck {
    /// Points earned: full weight on pass, half (rounded down) when weak.
    pub fn points(&self) -> u32 {
        match self.status {
            HeaderStatus::Pass => self.weight,
            HeaderStatus::Weak(_) => self.weight / 2,
            HeaderStatus::Missing => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::A,
            75..=89 => Self::B,
            60..=74 => Self::C,
            40..=59 => Self::D,
            _ => Self::F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderAudit {
    pub checks: Vec<HeaderCheck>,
    /// Headers disclosing server software.
    pub leaks: Vec<String>,
    /// 0 to 100.
    pub score: u32,
    pub grade: Grade,
}

/// Audits response headers for common security hardening.
///
/// Any header leaking server details caps the grade at B.
pub fn audit_headers(headers: &HeaderMap) -> HeaderAudit {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
    };
    let csp = value("content-security-policy");

    let checks = vec![
        check(
            "strict-transport-security",
            25,
            value("strict-transport-security"),
            check_hsts,
        ),
        check("content-security-policy", 25, csp, check_csp),
        check(
            "x-content-type-options",
            15,
            value("x-content-type-options"),
            |nosniff| {
                (!nosniff.eq_ignore_ascii_case("nosniff"))
                    .then(|| format!("unexpected value {nosniff}"))
            },
        ),
        check_frame_options(value("x-frame-options"), csp),
        check("referrer-policy", 10, value("referrer-policy"), check_referrer_policy),
        check("permissions-policy", 10, value("permissions-policy"), |_| None),
    ];

    let mut leaks = Vec::new();
    if let Some(powered_by) = value("x-powered-by") {
        leaks.push(format!("x-powered-by: {powered_by}"));
    }
    if let Some(server) =
        value("server").filter(|server| server.chars().any(|c| c.is_ascii_digit()))
    {
        leaks.push(format!("server: {server}"));
    }

    let score = checks.iter().map(HeaderCheck::points).sum::<u32>().min(100);
    let grade = if leaks.is_empty() {
        Grade::from_score(score)
    } else {
        Grade::from_score(score).max(Grade::B)
    };
    debug!("Security headers scored {score} ({grade:?})");

    HeaderAudit {
        checks,
        leaks,
        score,
        grade,
    }
}

fn check(
    header: &str,
    weight: u32,
    value: Option<&str>,
    weakness: impl Fn(&str) -> Option<String>,
) -> HeaderCheck {
    let status = match value {
        None => HeaderStatus::Missing,
        Some(value) => weakness(value).map_or(HeaderStatus::Pass, HeaderStatus::Weak),
    };

    HeaderCheck {
        header: header.to_string(),
        status,
        weight,
    }
}

fn check_hsts(value: &str) -> Option<String> {
    let max_age = value
        .split(';')
        .map(str::trim)
        .find_map(|directive| {
            let (name, age) = directive.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("max-age")
                .then(|| age.trim().trim_matches('"').parse::<u64>().ok())?
        });

    match max_age {
        None => Some("max-age is missing".to_string()),
        Some(age) if age < HSTS_MIN_MAX_AGE => {
            Some(format!("max-age {age} is below {HSTS_MIN_MAX_AGE}"))
        }
        Some(_) => None,
    }
}

/// Scripts are governed by `script-src`, or by `default-src` when it is absent.
fn check_csp(value: &str) -> Option<String> {
    let directive = |wanted: &str| {
        value.split(';').map(str::trim).find(|directive| {
            let name = directive.split_whitespace().next().unwrap_or_default();
            name.eq_ignore_ascii_case(wanted)
        })
    };
    let script_sources = directive("script-src").or_else(|| directive("default-src"))?;

    let unsafe_sources: Vec<&str> = script_sources
        .split_whitespace()
        .skip(1)
        .filter(|source| {
            source.eq_ignore_ascii_case("'unsafe-inline'")
                || source.eq_ignore_ascii_case("'unsafe-eval'")
        })
        .collect();

    (!unsafe_sources.is_empty()).then(|| format!("allows {}", unsafe_sources.join(" ")))
}

fn check_frame_options(value: Option<&str>, csp: Option<&str>) -> HeaderCheck {
    let has_frame_ancestors = csp.is_some_and(|policy| {
        policy
            .split(';')
            .any(|directive| directive.trim().to_lowercase().starts_with("frame-ancestors"))
    });

    let mut frame_check = check("x-frame-options", 15, value, |option| {
        let valid =
            option.eq_ignore_ascii_case("deny") || option.eq_ignore_ascii_case("sameorigin");
        (!valid).then(|| format!("unexpected value {option}"))
    });

    if frame_check.status != HeaderStatus::Pass && has_frame_ancestors {
        frame_check.status = HeaderStatus::Pass;
    }

    frame_check
}

fn check_referrer_policy(value: &str) -> Option<String> {
    let effective = value
        .split(',')
        .map(str::trim)
        .rfind(|policy| !policy.is_empty())
        .unwrap_or_default();

    (effective.eq_ignore_ascii_case("unsafe-url")
        || effective.eq_ignore_ascii_case("no-referrer-when-downgrade"))
    .then(|| format!("{effective} leaks full URLs"))
}
