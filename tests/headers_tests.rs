use reqwest::header::{HeaderMap, HeaderValue};
use seoaudit::headers::{Grade, HeaderAudit, HeaderStatus, audit_headers};
use spectral::prelude::*;

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(*name, HeaderValue::from_static(*value));
    }
    map
}

fn hardened() -> Vec<(&'static str, &'static str)> {
    vec![
        ("strict-transport-security", "max-age=31536000; includeSubDomains"),
        ("content-security-policy", "default-src 'self'; frame-ancestors 'none'"),
        ("x-content-type-options", "nosniff"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
        ("permissions-policy", "geolocation=()"),
        ("server", "nginx"),
    ]
}

fn status_of<'a>(audit: &'a HeaderAudit, header: &str) -> Option<&'a HeaderStatus> {
    audit
        .checks
        .iter()
        .find(|check| check.header == header)
        .map(|check| &check.status)
}

#[test]
fn hardened_site_gets_an_a() {
    let audit = audit_headers(&headers(&hardened()));

    assert_that(&audit.score).is_equal_to(100);
    assert_that(&audit.grade).is_equal_to(Grade::A);
    assert_that(&audit.leaks).has_length(0);
    assert_that(&status_of(&audit, "x-frame-options")).is_equal_to(Some(&HeaderStatus::Pass));
}

#[test]
fn bare_response_fails() {
    let audit = audit_headers(&HeaderMap::new());

    assert_that(&audit.score).is_equal_to(0);
    assert_that(&audit.grade).is_equal_to(Grade::F);
    assert_that(&audit.checks.iter().all(|check| check.status == HeaderStatus::Missing)).is_true();
}

#[test]
fn weak_values_earn_half_points() {
    let audit = audit_headers(&headers(&[
        ("strict-transport-security", "max-age=300"),
        ("content-security-policy", "script-src 'self' 'unsafe-inline'"),
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "no-referrer, unsafe-url"),
    ]));

    assert_that(&audit.score).is_equal_to(59);
    assert_that(&audit.grade).is_equal_to(Grade::D);
    assert_that(&matches!(
        status_of(&audit, "content-security-policy"),
        Some(HeaderStatus::Weak(_))
    ))
    .is_true();
    assert_that(&status_of(&audit, "permissions-policy")).is_equal_to(Some(&HeaderStatus::Missing));
}

#[test]
fn leaking_server_details_caps_the_grade() {
    let mut pairs = hardened();
    pairs.push(("x-powered-by", "PHP/8.1.2"));
    let audit = audit_headers(&headers(&pairs));

    assert_that(&audit.score).is_equal_to(100);
    assert_that(&audit.grade).is_equal_to(Grade::B);
    assert_that(&audit.leaks).is_equal_to(vec!["x-powered-by: PHP/8.1.2".to_string()]);

    let audit = audit_headers(&headers(&[("server", "Apache/2.4.1")]));
    assert_that(&audit.leaks).is_equal_to(vec!["server: Apache/2.4.1".to_string()]);
    assert_that(&audit.grade).is_equal_to(Grade::F);
}

#[test]
fn script_src_overrides_default_src_for_scripts() {
    let status = |policy: &'static str| {
        let audit = audit_headers(&headers(&[("content-security-policy", policy)]));
        status_of(&audit, "content-security-policy").cloned()
    };

    assert_that(&status("default-src 'self' 'unsafe-inline'; script-src 'self'"))
        .is_equal_to(Some(HeaderStatus::Pass));
    assert_that(&status("default-src 'self'; script-src 'self' 'unsafe-eval'")).is_equal_to(Some(
        HeaderStatus::Weak("allows 'unsafe-eval'".to_string()),
    ));
    assert_that(&status("default-src 'unsafe-inline'; img-src *")).is_equal_to(Some(
        HeaderStatus::Weak("allows 'unsafe-inline'".to_string()),
    ));
}
