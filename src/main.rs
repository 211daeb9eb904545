//! seoaudit is a CLI tool that audits a marketing site and prints the findings as JSON.
//!
//! Commands:
//! 1. `orphans` - Finds pages nothing links to and other internal-linking gaps
//! 2. `cannibalization` - Finds pages competing for the same keyword
//! 3. `disavow` - Scores exported backlinks and prints a disavow file
//! 4. `local` - Checks LocalBusiness schema and NAP consistency
//! 5. `headers` - Grades the security headers of a URL

use std::fs;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, info};
use serde::Serialize;
use url::Url;

use seoaudit::{
    CannibalizationAnalyzer, CannibalizationConfig, DisavowConfig, DisavowScorer, Fetcher,
    LocalSeoChecker, Nap, OrphanConfig, OrphanPageDetector, PageSignals, audit_headers,
    disavow::{Backlink, DisavowOutput}, disavow_entries, fetch_sitemap_entries, local::Citation,
};

/// A CLI tool to audit the SEO health of a marketing site
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The audit to run
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Find orphan pages, unreachable pages and dangling internal links
    Orphans {
        /// The sitemap URL listing the site's pages
        sitemap: String,
        /// Homepage to measure click depth from (default: root of the sitemap host)
        #[arg(long)]
        root: Option<String>,
        /// Pages deeper than this many clicks are reported
        #[arg(long, default_value_t = 3)]
        max_depth: usize,
        /// Stop crawling after this many pages
        #[arg(long, default_value_t = 500)]
        max_pages: usize,
        /// Delay between requests in milliseconds (rate limiting)
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
    },
    /// Find keywords targeted by more than one page
    Cannibalization {
        /// The sitemap URL listing the site's pages
        sitemap: String,
        /// Keyword to check, repeatable (default: derived from titles and headings)
        #[arg(long, short)]
        keyword: Vec<String>,
        /// Minimum score for a page to count as targeting a keyword
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,
        /// Delay between requests in milliseconds (rate limiting)
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
    },
    /// Score backlinks exported as a JSON array and print a disavow file
    Disavow {
        /// Path to the JSON file with backlinks
        backlinks: String,
        /// Domain that is never disavowed, repeatable
        #[arg(long)]
        trusted: Vec<String>,
        /// Commercial keyword, repeatable; exact-match anchors are penalized
        #[arg(long)]
        money_keyword: Vec<String>,
        /// Output: file (disavow file body), json (every assessment)
        #[arg(long, short, default_value = "file")]
        output: DisavowOutput,
    },
    /// Check LocalBusiness schema and NAP consistency against the canonical NAP
    Local {
        /// The sitemap URL listing the site's pages
        sitemap: String,
        /// Canonical business name
        #[arg(long)]
        name: Option<String>,
        /// Canonical business address
        #[arg(long)]
        address: Option<String>,
        /// Canonical business phone
        #[arg(long)]
        phone: Option<String>,
        /// Path to a JSON file with third-party citations
        #[arg(long, short)]
        citations: Option<String>,
        /// Delay between requests in milliseconds (rate limiting)
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
    },
    /// Grade the security headers returned by a URL
    Headers {
        /// The URL to request
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match cli.command {
        Command::Orphans {
            sitemap,
            root,
            max_depth,
            max_pages,
            delay,
        } => handle_orphans_command(&sitemap, root, max_depth, max_pages, delay).await,
        Command::Cannibalization {
            sitemap,
            keyword,
            threshold,
            delay,
        } => {
            let (_, pages) = load_site(&sitemap, delay).await?;
            let analyzer = CannibalizationAnalyzer::new(CannibalizationConfig {
                target_threshold: threshold,
                keywords: keyword,
            });
            print_json(&analyzer.analyze(&pages))
        }
        Command::Disavow {
            backlinks,
            trusted,
            money_keyword,
            output,
        } => handle_disavow_command(backlinks, trusted, money_keyword, output),
        Command::Local {
            sitemap,
            name,
            address,
            phone,
            citations,
            delay,
        } => {
            let citations: Vec<Citation> = match citations {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            let (_, pages) = load_site(&sitemap, delay).await?;
            let checker = LocalSeoChecker::new(Nap {
                name,
                address,
                phone,
            });
            print_json(&checker.audit(&pages, &citations))
        }
        Command::Headers { url } => {
            let url = Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid url: {}", e))?;
            let headers = Fetcher::new(0)?.fetch_headers(&url).await?;
            print_json(&audit_headers(&headers))
        }
    }
}

async fn handle_orphans_command(
    sitemap: &str,
    root: Option<String>,
    max_depth: usize,
    max_pages: usize,
    delay: u64,
) -> Result<()> {
    let sitemap_url =
        Url::parse(sitemap).map_err(|e| anyhow::anyhow!("Invalid sitemap url: {}", e))?;
    let root = match root {
        Some(root) => Url::parse(&root).map_err(|e| anyhow::anyhow!("Invalid root url: {}", e))?,
        None => sitemap_url.join("/")?,
    };
    let fetcher = Fetcher::new(delay)?;

    info!("Reading sitemap {sitemap_url}");
    let entries = fetch_sitemap_entries(&fetcher, &sitemap_url).await?;
    let seeds: Vec<Url> = entries.iter().map(|entry| entry.url.clone()).collect();
    let pages = fetcher.crawl(&root, &seeds, max_pages).await;

    let detector = OrphanPageDetector::new(OrphanConfig {
        max_depth,
        ..Default::default()
    });

    print_json(&detector.detect(&root, &pages, &entries))
}

fn handle_disavow_command(
    backlinks_path: String,
    trusted_domains: Vec<String>,
    money_keywords: Vec<String>,
    output: DisavowOutput,
) -> Result<()> {
    let backlinks: Vec<Backlink> = read_json(&backlinks_path)?;
    let scorer = DisavowScorer::new(DisavowConfig {
        trusted_domains,
        money_keywords,
    });
    let scored = scorer.assess_all(&backlinks)?;

    if output == DisavowOutput::Json {
        return print_json(&scored);
    }

    for entry in disavow_entries(&scored) {
        println!("{entry}");
    }
    Ok(())
}

async fn load_site(
    sitemap: &str,
    delay: u64,
) -> Result<(Vec<seoaudit::SitemapEntry>, Vec<PageSignals>)> {
    let sitemap_url =
        Url::parse(sitemap).map_err(|e| anyhow::anyhow!("Invalid sitemap url: {}", e))?;
    let fetcher = Fetcher::new(delay)?;

    info!("Reading sitemap {sitemap_url}");
    let entries = fetch_sitemap_entries(&fetcher, &sitemap_url).await?;
    let urls: Vec<Url> = entries.iter().map(|entry| entry.url.clone()).collect();
    let pages = fetcher.fetch_pages(&urls).await;

    Ok((entries, pages))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let content = fs::read_to_string(path).context(format!("Failed to read file: {path}"))?;
    serde_json::from_str(&content).context(format!("Failed to parse JSON from {path}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
