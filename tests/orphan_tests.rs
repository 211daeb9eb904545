use seoaudit::orphan::{LinkGraph, OrphanConfig, OrphanPageDetector, PageProfile, similarity};
use seoaudit::page::PageSignals;
use seoaudit::sitemap::SitemapEntry;
use spectral::prelude::*;

use crate::fixtures::{page, url};

mod fixtures;

fn site() -> Vec<PageSignals> {
    vec![
        page(
            "https://acme.com/",
            "Acme Plumbing",
            &["/services", "/about", "https://twitter.com/acme", "/"],
        ),
        page("https://acme.com/services", "Plumbing Services", &["/services/drain-cleaning", "/"]),
        page(
            "https://acme.com/services/drain-cleaning",
            "Drain Cleaning Services",
            &["/services"],
        ),
        page("https://acme.com/about", "About Acme", &["/missing-page"]),
        page("https://acme.com/island-a", "Island", &["/island-b"]),
        page("https://acme.com/island-b", "Island B", &["/"]),
    ]
}

fn sitemap() -> Vec<SitemapEntry> {
    [
        "https://acme.com/",
        "https://acme.com/services",
        "https://acme.com/services/drain-cleaning",
        "https://acme.com/about",
        "https://acme.com/services/water-heater-repair/",
        "https://acme.com/island-b",
    ]
    .iter()
    .map(|address| SitemapEntry {
        url: url(address),
        lastmod: None,
    })
    .collect()
}

fn urls<T>(items: &[T], url_of: impl Fn(&T) -> &str) -> Vec<&str> {
    items.iter().map(url_of).collect()
}

#[test]
fn graph_ignores_external_and_self_links() {
    let graph = LinkGraph::build(&url("https://acme.com/"), &site());

    assert_that(&graph.outbound("https://acme.com/")).is_equal_to(2);
    assert_that(&graph.inbound("https://acme.com/")).is_equal_to(2);
    assert_that(&graph.inbound("https://twitter.com/acme")).is_equal_to(0);
    assert_that(&graph.nodes().any(|node| node.contains("twitter"))).is_false();
}

#[test]
fn graph_measures_click_depth() {
    let graph = LinkGraph::build(&url("https://acme.com/"), &site());
    let depths = graph.depths("https://acme.com/");

    assert_that(&depths.get("https://acme.com/services/drain-cleaning").copied()).is_equal_to(Some(2));
    assert_that(&depths.get("https://acme.com/missing-page").copied()).is_equal_to(Some(2));
    assert_that(&depths.get("https://acme.com/island-a").copied()).is_equal_to(None);
}

#[test]
fn finds_orphans_from_crawl_and_sitemap() {
    let report =
        OrphanPageDetector::default().detect(&url("https://acme.com/"), &site(), &sitemap());

    assert_that(&urls(&report.orphans, |orphan| orphan.url.as_str())).is_equal_to(vec![
        "https://acme.com/island-a",
        "https://acme.com/services/water-heater-repair",
    ]);

    let in_sitemap: Vec<bool> = report.orphans.iter().map(|orphan| orphan.in_sitemap).collect();
    assert_that(&in_sitemap).is_equal_to(vec![false, true]);
}

#[test]
fn reports_linking_gaps() {
    let report =
        OrphanPageDetector::default().detect(&url("https://acme.com/"), &site(), &sitemap());

    assert_that(&urls(&report.weakly_linked, |stats| stats.url.as_str())).is_equal_to(vec![
        "https://acme.com/about",
        "https://acme.com/island-b",
        "https://acme.com/services/drain-cleaning",
    ]);
    assert_that(&report.unreachable).is_equal_to(vec!["https://acme.com/island-b".to_string()]);
    assert_that(&report.not_in_sitemap).is_equal_to(vec!["https://acme.com/island-a".to_string()]);
    assert_that(&report.too_deep).has_length(0);

    let dangling: Vec<(&str, &str)> = report
        .dangling
        .iter()
        .map(|link| (link.source.as_str(), link.target.as_str()))
        .collect();
    assert_that(&dangling).is_equal_to(vec![("https://acme.com/about", "https://acme.com/missing-page")]);
}

#[test]
fn reports_pages_deeper_than_allowed() {
    let detector = OrphanPageDetector::new(OrphanConfig {
        max_depth: 1,
        ..Default::default()
    });
    let report = detector.detect(&url("https://acme.com/"), &site(), &sitemap());

    assert_that(&urls(&report.too_deep, |stats| stats.url.as_str()))
        .is_equal_to(vec!["https://acme.com/services/drain-cleaning"]);
    assert_that(&report.too_deep.first().and_then(|stats| stats.depth)).is_equal_to(Some(2));
}

#[test]
fn suggests_related_pages_as_link_sources() {
    let report =
        OrphanPageDetector::default().detect(&url("https://acme.com/"), &site(), &sitemap());

    let water_heater = report
        .orphans
        .iter()
        .find(|orphan| orphan.url.ends_with("water-heater-repair"))
        .expect("Expected the sitemap-only page to be an orphan.");
    assert_that(&urls(&water_heater.suggestions, |suggestion| suggestion.source.as_str()))
        .is_equal_to(vec!["https://acme.com/services/drain-cleaning"]);

    let island = report
        .orphans
        .iter()
        .find(|orphan| orphan.url.ends_with("island-a"))
        .expect("Expected the unlinked page to be an orphan.");
    assert_that(&island.suggestions).has_length(0);
}

#[test]
fn a_site_with_only_a_homepage_has_no_orphans() {
    let report = OrphanPageDetector::default().detect(
        &url("https://acme.com/"),
        &[page("https://acme.com/", "Acme", &[])],
        &[],
    );

    assert_that(&report.orphans).has_length(0);
    assert_that(&report.not_in_sitemap).has_length(0);
    assert_that(&report.pages).has_length(1);
}

#[test]
fn similarity_rewards_shared_topic_and_directory() {
    let drain = PageProfile::new(&url("https://acme.com/services/drain-cleaning"), Some("Drain Cleaning"));
    let clogged = PageProfile::new(
        &url("https://acme.com/services/clogged-drain"),
        Some("Clogged Drain Cleaning"),
    );
    let about = PageProfile::new(&url("https://acme.com/about"), Some("About Acme"));

    assert_that(&similarity(&drain, &clogged)).is_greater_than(similarity(&drain, &about));
    assert_that(&similarity(&drain, &about)).is_equal_to(0.0);
    assert_that(&similarity(&drain, &drain)).is_greater_than(0.99);
}

#[test]
fn root_matches_the_www_variant_used_by_the_site() {
    let report =
        OrphanPageDetector::default().detect(&url("https://www.acme.com/"), &site(), &sitemap());

    assert_that(&urls(&report.orphans, |orphan| orphan.url.as_str())).is_equal_to(vec![
        "https://acme.com/island-a",
        "https://acme.com/services/water-heater-repair",
    ]);
    assert_that(&report.unreachable).is_equal_to(vec!["https://acme.com/island-b".to_string()]);
}

#[test]
fn root_level_pages_do_not_share_a_directory() {
    let about = PageProfile::new(&url("https://acme.com/about"), Some("About Acme"));
    let careers = PageProfile::new(&url("https://acme.com/careers"), Some("Join Our Team"));
    let drain = PageProfile::new(&url("https://acme.com/services/drain-cleaning"), Some("Drains"));
    let heater = PageProfile::new(&url("https://acme.com/services/water-heater"), Some("Heaters"));

    assert_that(&similarity(&about, &careers)).is_equal_to(0.0);
    assert_that(&similarity(&drain, &heater)).is_greater_than(0.33);
    assert_that(&similarity(&drain, &heater)).is_less_than(0.35);
}
