//! The seoaudit library provides SEO audits for a marketing site: orphan pages and
//! internal linking, keyword cannibalization, backlink toxicity, local business
//! schema and NAP consistency, and security headers.

pub mod cannibalization;
pub mod constants;
pub mod disavow;
pub mod fetch;
pub mod headers;
pub mod local;
pub mod orphan;
pub mod page;
pub mod sitemap;

pub use cannibalization::{CannibalizationAnalyzer, CannibalizationConfig};
pub use disavow::{DisavowConfig, DisavowScorer, disavow_entries};
pub use fetch::Fetcher;
pub use headers::audit_headers;
pub use local::{LocalSeoChecker, Nap};
pub use orphan::{OrphanConfig, OrphanPageDetector};
pub use page::{PageSignals, extract_page};
pub use sitemap::{SitemapEntry, fetch_sitemap_entries, parse_sitemap};
