use seoaudit::local::{
    Citation, IssueLevel, LocalSeoChecker, Nap, NapField, compare_nap, find_business_schemas,
    normalize_address, normalize_name, normalize_phone, validate_schema,
};
use seoaudit::page::PageSignals;
use serde_json::json;
use spectral::prelude::*;

use crate::fixtures::page;

mod fixtures;

fn canonical() -> Nap {
    Nap {
        name: Some("Acme Plumbing LLC".to_string()),
        address: Some("123 Main Street, Boston, MA 02110".to_string()),
        phone: Some("(617) 555-0123".to_string()),
    }
}

fn plumber_schema(telephone: &str) -> serde_json::Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Plumber",
        "name": "Acme Plumbing",
        "telephone": telephone,
        "address": {
            "@type": "PostalAddress",
            "streetAddress": "123 Main St",
            "addressLocality": "Boston",
            "addressRegion": "MA",
            "postalCode": "02110"
        },
        "geo": {"@type": "GeoCoordinates", "latitude": 42.35, "longitude": -71.06},
        "openingHours": "Mo-Fr 08:00-18:00",
        "url": "https://acme.com/",
        "image": "https://acme.com/logo.png",
        "priceRange": "$$"
    })
}

fn page_with(address: &str, json_ld: Vec<serde_json::Value>, text: &str) -> PageSignals {
    let mut signals = page(address, "", &[]);
    signals.json_ld = json_ld;
    signals.text = text.to_string();
    signals
}

#[test]
fn normalizes_nap_fields() {
    assert_that(&normalize_phone("+1 (617) 555-0123").as_str()).is_equal_to("6175550123");
    assert_that(&normalize_phone("617.555.0123").as_str()).is_equal_to("6175550123");
    assert_that(&normalize_address("123 Main Street, Suite #4").as_str())
        .is_equal_to("123 main st ste 4");
    assert_that(&normalize_name("Acme Plumbing & Heating, LLC").as_str())
        .is_equal_to("acme plumbing and heating");
}

#[test]
fn finds_businesses_in_graphs_and_nested_objects() {
    let graph = json!({
        "@context": "https://schema.org",
        "@graph": [
            {"@type": "WebSite", "name": "Acme"},
            {"@type": ["Plumber", "LocalBusiness"], "name": "Acme Plumbing"}
        ]
    });
    let nested = json!({
        "@type": "WebPage",
        "publisher": {"@type": "schema:Organization", "name": "Acme"}
    });
    let unrelated = json!({"@type": "BreadcrumbList"});

    let schemas = find_business_schemas(&[graph, nested, unrelated]);

    let names: Vec<Option<String>> = schemas.iter().map(|schema| schema.name()).collect();
    assert_that(&names).is_equal_to(vec![
        Some("Acme Plumbing".to_string()),
        Some("Acme".to_string()),
    ]);
    assert_that(&schemas.first().map(|schema| schema.types.clone())).is_equal_to(Some(vec![
        "Plumber".to_string(),
        "LocalBusiness".to_string(),
    ]));
}

#[test]
fn complete_schema_has_no_issues() {
    let schemas = find_business_schemas(&[plumber_schema("+1-617-555-0123")]);
    let schema = schemas.first().expect("Expected a business schema.");

    assert_that(&validate_schema(schema)).has_length(0);
    assert_that(&schema.address()).is_equal_to(Some("123 Main St, Boston, MA, 02110".to_string()));
}

#[test]
fn reports_missing_properties() {
    let schemas = find_business_schemas(&[json!({
        "@type": "LocalBusiness",
        "name": "Acme Plumbing",
        "address": {"@type": "PostalAddress", "streetAddress": "123 Main St", "addressLocality": "Boston"}
    })]);
    let schema = schemas.first().expect("Expected a business schema.");
    let issues = validate_schema(schema);

    let errors: Vec<&str> = issues
        .iter()
        .filter(|issue| issue.level == IssueLevel::Error)
        .map(|issue| issue.property.as_str())
        .collect();
    assert_that(&errors).is_equal_to(vec!["telephone", "address.postalCode"]);

    let warnings: Vec<&str> = issues
        .iter()
        .filter(|issue| issue.level == IssueLevel::Warning)
        .map(|issue| issue.property.as_str())
        .collect();
    assert_that(&warnings).is_equal_to(vec!["openingHours", "geo", "url", "image", "priceRange"]);
}

#[test]
fn compares_only_present_fields() {
    let found = Nap {
        name: Some("ACME Plumbing".to_string()),
        address: None,
        phone: Some("617-555-9999".to_string()),
    };

    let mismatches = compare_nap("yelp", &canonical(), &found);

    assert_that(&mismatches).has_length(1);
    let mismatch = mismatches.first().expect("Expected one mismatch.");
    assert_that(&mismatch.field).is_equal_to(NapField::Phone);
    assert_that(&mismatch.found.as_str()).is_equal_to("617-555-9999");
}

#[test]
fn scores_nap_consistency_across_pages_and_citations() {
    let pages = vec![
        page_with(
            "https://acme.com/",
            vec![plumber_schema("+1-617-555-0123")],
            "Call us at 617.555.0123 any time.",
        ),
        page_with("https://acme.com/contact", vec![plumber_schema("(617) 555-9999")], ""),
        page_with("https://acme.com/offer", Vec::new(), "Call (617) 555-0000 today."),
        page_with("https://acme.com/about", Vec::new(), "Family owned since 1982."),
    ];
    let citations: Vec<Citation> = serde_json::from_value(json!([
        {"source": "yelp", "name": "Acme Plumbing", "address": "123 Main St, Boston, MA 02110", "phone": "617-555-0123"},
        {"source": "yellowpages", "address": "125 Main St, Boston, MA 02110"},
        {"source": "empty listing"}
    ]))
    .expect("Expected valid citations.");

    let report = LocalSeoChecker::new(canonical()).audit(&pages, &citations);

    let mismatched_pages: Vec<&str> = report
        .pages
        .iter()
        .filter(|audit| !audit.mismatches.is_empty())
        .map(|audit| audit.url.as_str())
        .collect();
    assert_that(&mismatched_pages)
        .is_equal_to(vec!["https://acme.com/contact", "https://acme.com/offer"]);

    let sources: Vec<&str> = report
        .citation_mismatches
        .iter()
        .map(|mismatch| mismatch.source.as_str())
        .collect();
    assert_that(&sources).is_equal_to(vec!["yellowpages"]);

    assert_that(&report.consistency_score).is_greater_than(49.9);
    assert_that(&report.consistency_score).is_less_than(50.1);
}

#[test]
fn is_fully_consistent_without_nap_sources() {
    let report = LocalSeoChecker::new(canonical()).audit(&[], &[]);

    assert_that(&report.consistency_score).is_equal_to(100.0);
}

#[test]
fn pages_without_schema_are_not_nap_sources() {
    let pages = vec![page_with("https://acme.com/offer", Vec::new(), "Call (617) 555-0000 today.")];
    let citations = vec![Citation {
        source: "yelp".to_string(),
        nap: canonical(),
    }];

    let report = LocalSeoChecker::new(canonical()).audit(&pages, &citations);

    assert_that(&report.consistency_score).is_equal_to(100.0);
    let offer = report.pages.first().expect("Expected one page audit.");
    assert_that(&offer.schema_found).is_false();
    assert_that(&offer.mismatches).has_length(1);
}

#[test]
fn schema_country_is_ignored_unless_the_canonical_address_names_it() {
    let mut schema = plumber_schema("+1-617-555-0123");
    schema["address"]["addressCountry"] = json!("US");
    let pages = vec![page_with("https://acme.com/", vec![schema], "")];

    let report = LocalSeoChecker::new(canonical()).audit(&pages, &[]);
    assert_that(&report.consistency_score).is_equal_to(100.0);

    let with_country = Nap {
        address: Some("123 Main Street, Boston, MA 02110, US".to_string()),
        ..canonical()
    };
    let report = LocalSeoChecker::new(with_country).audit(&pages, &[]);
    assert_that(&report.consistency_score).is_equal_to(100.0);

    let other_country = Nap {
        address: Some("123 Main Street, Boston, MA 02110, CA".to_string()),
        ..canonical()
    };
    let report = LocalSeoChecker::new(other_country).audit(&pages, &[]);
    let found: Vec<&str> = report
        .pages
        .iter()
        .flat_map(|audit| &audit.mismatches)
        .map(|mismatch| mismatch.found.as_str())
        .collect();
    assert_that(&found).is_equal_to(vec!["123 Main St, Boston, MA, 02110"]);
}

#[test]
fn digits_inside_longer_numbers_are_not_phones() {
    let pages = vec![page_with(
        "https://acme.com/order",
        Vec::new(),
        "Order reference 98123456789012, tracking 1Z9999617555012345. Call 617-555-9999.",
    )];

    let report = LocalSeoChecker::new(canonical()).audit(&pages, &[]);

    let found: Vec<&str> = report
        .pages
        .iter()
        .flat_map(|audit| &audit.mismatches)
        .map(|mismatch| mismatch.found.as_str())
        .collect();
    assert_that(&found).is_equal_to(vec!["617-555-9999"]);
}
