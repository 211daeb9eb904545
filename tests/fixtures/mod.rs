#![allow(dead_code)]

use seoaudit::page::{Link, PageSignals, normalize_url};
use url::Url;

#[macro_export]
macro_rules! assert_verdicts {
    (
        $(
            $test_name:ident : backlink => $backlink:expr, verdict => $verdict:expr
        ),+ $(,)?
    ) => {
        $(
            #[test]
            fn $test_name() {
                let assessment = scorer()
                    .score(&$backlink)
                    .expect("Expected a valid backlink.");

                assert_that(&assessment.verdict).is_equal_to($verdict);
            }
        )+
    }
}

pub(crate) fn url(address: &str) -> Url {
    Url::parse(address).expect("Expected a valid URL.")
}

/// A crawled page with a title and plain links, everything else empty.
pub(crate) fn page(address: &str, title: &str, links: &[&str]) -> PageSignals {
    let page_url = url(address);

    PageSignals {
        links: links
            .iter()
            .map(|href| Link {
                href: normalize_url(&page_url.join(href).expect("Expected a valid link.")),
                anchor: String::new(),
                nofollow: false,
            })
            .collect(),
        url: normalize_url(&page_url),
        title: (!title.is_empty()).then(|| title.to_string()),
        h1: Vec::new(),
        meta_description: None,
        canonical: None,
        noindex: false,
        json_ld: Vec::new(),
        text: String::new(),
    }
}
