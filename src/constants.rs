pub const USER_AGENT_ENV_NAME: &str = "SEOAUDIT_USER_AGENT";

pub(crate) const DEFAULT_USER_AGENT: &str = "SEOAudit Bot";

pub(crate) const REDIRECT_LIMIT: usize = 3;

// Orphan detection
pub(crate) const DEFAULT_MAX_DEPTH: usize = 3;
pub(crate) const DEFAULT_MAX_SUGGESTIONS: usize = 3;
pub(crate) const DEFAULT_MIN_SIMILARITY: f64 = 0.15;
pub(crate) const TITLE_SIMILARITY_WEIGHT: f64 = 0.5;
pub(crate) const DIRECTORY_SIMILARITY_WEIGHT: f64 = 0.3;
pub(crate) const PATH_SIMILARITY_WEIGHT: f64 = 0.2;

// Keyword cannibalization
pub(crate) const DEFAULT_TARGET_THRESHOLD: f64 = 0.5;
pub(crate) const TITLE_WEIGHT: f64 = 0.35;
pub(crate) const H1_WEIGHT: f64 = 0.25;
pub(crate) const URL_WEIGHT: f64 = 0.2;
pub(crate) const META_WEIGHT: f64 = 0.1;
pub(crate) const DENSITY_WEIGHT: f64 = 0.1;
pub(crate) const DENSITY_THRESHOLD: f64 = 0.01;
pub(crate) const HIGH_SEVERITY_SCORE: f64 = 0.75;
pub(crate) const MEDIUM_SEVERITY_SCORE: f64 = 0.6;

pub(crate) const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "your", "you", "our", "are", "from", "that", "this", "how",
    "what", "why", "best", "top", "new", "all", "about", "into", "near", "can", "get", "use",
];

// Backlink toxicity
pub(crate) const DISAVOW_SCORE: f64 = 60.0;
pub(crate) const REVIEW_SCORE: f64 = 30.0;
pub(crate) const SPAM_SCORE_FACTOR: f64 = 0.3;
pub(crate) const VERY_LOW_AUTHORITY: f64 = 10.0;
pub(crate) const LOW_AUTHORITY: f64 = 20.0;
pub(crate) const VERY_LOW_AUTHORITY_PENALTY: f64 = 20.0;
pub(crate) const LOW_AUTHORITY_PENALTY: f64 = 10.0;
pub(crate) const SUSPICIOUS_TLD_PENALTY: f64 = 15.0;
pub(crate) const SPAMMY_ANCHOR_PENALTY: f64 = 20.0;
pub(crate) const MONEY_ANCHOR_PENALTY: f64 = 10.0;
pub(crate) const SITEWIDE_PENALTY: f64 = 10.0;
pub(crate) const SITEWIDE_LINK_COUNT: u32 = 50;
pub(crate) const SPAMMY_DOMAIN_PENALTY: f64 = 10.0;

pub(crate) const SUSPICIOUS_TLDS: &[&str] = &[
    "xyz", "top", "click", "loan", "work", "gq", "tk", "ml", "cf", "ga", "buzz", "rest",
];

pub(crate) const SPAMMY_ANCHOR_TERMS: &[&str] = &[
    "casino", "viagra", "cialis", "payday", "porn", "replica", "essay", "betting", "loan",
];

pub(crate) const SPAMMY_DOMAIN_TOKENS: &[&str] = &["seo", "links", "directory", "bookmark"];

// Local SEO
pub(crate) const LOCAL_BUSINESS_TYPES: &[&str] = &[
    "LocalBusiness",
    "Organization",
    "Restaurant",
    "Dentist",
    "Store",
    "Plumber",
    "Electrician",
    "LegalService",
    "MedicalBusiness",
    "AutoRepair",
    "HomeAndConstructionBusiness",
    "ProfessionalService",
    "RealEstateAgent",
];

pub(crate) const ADDRESS_ABBREVIATIONS: &[(&str, &str)] = &[
    ("street", "st"),
    ("avenue", "ave"),
    ("road", "rd"),
    ("boulevard", "blvd"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("court", "ct"),
    ("place", "pl"),
    ("highway", "hwy"),
    ("parkway", "pkwy"),
    ("suite", "ste"),
    ("apartment", "apt"),
    ("building", "bldg"),
    ("floor", "fl"),
    ("north", "n"),
    ("south", "s"),
    ("east", "e"),
    ("west", "w"),
];

pub(crate) const LEGAL_SUFFIXES: &[&str] = &["llc", "inc", "ltd", "co", "corp"];

pub(crate) const PHONE_PATTERN: &str = r"(?:\+?1[\s.\-]?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}";

// Security headers
pub(crate) const HSTS_MIN_MAX_AGE: u64 = 15_552_000;
