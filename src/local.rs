//! The local module validates LocalBusiness structured data and checks that the
//! business name, address and phone (NAP) are consistent across pages and citations.

use std::collections::BTreeSet;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{ADDRESS_ABBREVIATIONS, LEGAL_SUFFIXES, LOCAL_BUSINESS_TYPES, PHONE_PATTERN};
use crate::page::{PageSignals, fold_text};

const POSTAL_ADDRESS_PARTS: [&str; 4] =
    ["streetAddress", "addressLocality", "addressRegion", "postalCode"];

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PHONE_PATTERN).expect("Failed to compile PHONE_PATTERN regex"));

/// Business name, address and phone as published somewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Nap {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Nap {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.phone.is_none()
    }
}

/// A business listing on a third-party site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Citation {
    pub source: String,
    #[serde(flatten)]
    pub nap: Nap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NapField {
    Name,
    Address,
    Phone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NapMismatch {
    pub source: String,
    pub field: NapField,
    pub expected: String,
    pub found: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum IssueLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    pub level: IssueLevel,
    /// The missing or incomplete schema property.
    pub property: String,
}

/// A JSON-LD object describing a business.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessSchema {
    pub types: Vec<String>,
    properties: Map<String, Value>,
}

impl BusinessSchema {
    pub fn name(&self) -> Option<String> {
        self.text("name")
    }

    pub fn telephone(&self) -> Option<String> {
        self.text("telephone")
    }

    /// The address as one line, whether it was given as text or as a `PostalAddress`.
    ///
    /// The country of a `PostalAddress` is left out.
    pub fn address(&self) -> Option<String> {
        self.address_line(false)
    }

    pub fn nap(&self) -> Nap {
        Nap {
            name: self.name(),
            address: self.address(),
            phone: self.telephone(),
        }
    }

    /// The NAP to compare against `canonical`. The address keeps its country only when
    /// the canonical address names that country.
    pub fn nap_against(&self, canonical: &Nap) -> Nap {
        let with_country = canonical
            .address
            .as_deref()
            .zip(self.postal_part("addressCountry"))
            .is_some_and(|(address, country)| {
                format!(" {} ", normalize_address(address))
                    .contains(&format!(" {} ", normalize_address(&country)))
            });

        Nap {
            address: self.address_line(with_country),
            ..self.nap()
        }
    }

    fn address_value(&self) -> Option<&Value> {
        match self.properties.get("address")? {
            Value::Array(items) => items.first(),
            address => Some(address),
        }
    }

    fn postal_part(&self, key: &str) -> Option<String> {
        let Value::Object(postal) = self.address_value()? else {
            return None;
        };
        match postal.get(key)? {
            Value::Object(named) => text_value(named.get("name")?),
            value => text_value(value),
        }
    }

    fn address_line(&self, with_country: bool) -> Option<String> {
        match self.address_value()? {
            Value::String(text) => non_empty(text),
            Value::Object(_) => {
                let parts: Vec<String> = POSTAL_ADDRESS_PARTS
                    .iter()
                    .chain(with_country.then_some(&"addressCountry"))
                    .filter_map(|key| self.postal_part(key))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            _ => None,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        text_value(self.properties.get(key)?)
    }

    fn has(&self, key: &str) -> bool {
        self.properties.get(key).is_some_and(|value| match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Collects business objects from parsed JSON-LD blocks.
///
/// Arrays and `@graph` containers are searched, as are nested objects such as a
/// page's `publisher`. A business object is not searched further.
pub fn find_business_schemas(json_ld: &[Value]) -> Vec<BusinessSchema> {
    let mut schemas = Vec::new();
    for value in json_ld {
        collect_business_schemas(value, &mut schemas);
    }
    schemas
}

fn collect_business_schemas(value: &Value, schemas: &mut Vec<BusinessSchema>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_business_schemas(item, schemas);
            }
        }
        Value::Object(properties) => {
            let types = schema_types(properties);
            if types.iter().any(|schema_type| is_business_type(schema_type)) {
                schemas.push(BusinessSchema {
                    types,
                    properties: properties.clone(),
                });
                return;
            }
            for nested in properties.values() {
                collect_business_schemas(nested, schemas);
            }
        }
        _ => {}
    }
}

fn schema_types(properties: &Map<String, Value>) -> Vec<String> {
    let short = |name: &str| {
        name.rsplit(['/', ':'])
            .next()
            .unwrap_or(name)
            .to_string()
    };

    match properties.get("@type") {
        Some(Value::String(name)) => vec![short(name.as_str())],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).map(short).collect(),
        _ => Vec::new(),
    }
}

fn is_business_type(schema_type: &str) -> bool {
    LOCAL_BUSINESS_TYPES.contains(&schema_type) || schema_type.ends_with("Business")
}

/// Lists missing required (errors) and recommended (warnings) properties.
pub fn validate_schema(schema: &BusinessSchema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    let mut report = |level: IssueLevel, property: &str| {
        issues.push(SchemaIssue {
            level,
            property: property.to_string(),
        });
    };

    for required in ["name", "address", "telephone"] {
        if !schema.has(required) {
            report(IssueLevel::Error, required);
        }
    }

    if let Some(Value::Object(postal)) = schema.properties.get("address") {
        for required in ["streetAddress", "addressLocality", "postalCode"] {
            let present = postal.get(required).and_then(text_value).is_some();
            if !present {
                report(IssueLevel::Error, &format!("address.{required}"));
            }
        }
    }

    if !schema.has("openingHours") && !schema.has("openingHoursSpecification") {
        report(IssueLevel::Warning, "openingHours");
    }
    for recommended in ["geo", "url", "image", "priceRange"] {
        if !schema.has(recommended) {
            report(IssueLevel::Warning, recommended);
        }
    }

    issues
}

/// Digits of a phone number, without a leading North American country code.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11
        && let Some(national) = digits.strip_prefix('1')
    {
        return national.to_string();
    }
    digits
}

/// Lowercase address with punctuation removed and common words abbreviated.
pub fn normalize_address(address: &str) -> String {
    fold_text(address)
        .split(' ')
        .map(|word| {
            ADDRESS_ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == word)
                .map_or(word, |(_, short)| *short)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase business name without punctuation or a trailing legal suffix.
pub fn normalize_name(name: &str) -> String {
    let folded = fold_text(&name.replace('&', " and "));
    let mut words: Vec<&str> = folded.split(' ').filter(|word| !word.is_empty()).collect();

    while words.len() > 1
        && words
            .last()
            .is_some_and(|word| LEGAL_SUFFIXES.contains(word))
    {
        words.pop();
    }

    words.join(" ")
}

/// Compares `found` against `expected` field by field on normalized values.
///
/// A field missing on either side is not a mismatch.
pub fn compare_nap(source: &str, expected: &Nap, found: &Nap) -> Vec<NapMismatch> {
    let fields: [(NapField, &Option<String>, &Option<String>, fn(&str) -> String); 3] = [
        (NapField::Name, &expected.name, &found.name, normalize_name),
        (NapField::Address, &expected.address, &found.address, normalize_address),
        (NapField::Phone, &expected.phone, &found.phone, normalize_phone),
    ];

    fields
        .into_iter()
        .filter_map(|(field, expected, found, normalize)| {
            let (expected, found) = (expected.as_deref()?, found.as_deref()?);
            (normalize(expected) != normalize(found)).then(|| NapMismatch {
                source: source.to_string(),
                field,
                expected: expected.to_string(),
                found: found.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLocalAudit {
    pub url: String,
    pub schema_found: bool,
    pub issues: Vec<SchemaIssue>,
    pub mismatches: Vec<NapMismatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalSeoReport {
    pub pages: Vec<PageLocalAudit>,
    pub citation_mismatches: Vec<NapMismatch>,
    /// Percentage of NAP sources that agree with the canonical NAP.
    pub consistency_score: f64,
}

/// Audits pages and citations against the canonical NAP of the business.
#[derive(Debug)]
pub struct LocalSeoChecker {
    canonical: Nap,
}

impl LocalSeoChecker {
    pub fn new(canonical: Nap) -> Self {
        Self { canonical }
    }

    pub fn audit(&self, pages: &[PageSignals], citations: &[Citation]) -> LocalSeoReport {
        let mut sources = 0;
        let mut consistent = 0;

        let page_audits: Vec<PageLocalAudit> = pages
            .iter()
            .map(|page| {
                let audit = self.audit_page(page);
                if audit.schema_found {
                    sources += 1;
                    if audit.mismatches.is_empty() {
                        consistent += 1;
                    }
                }
                audit
            })
            .collect();

        let mut citation_mismatches = Vec::new();
        for citation in citations.iter().filter(|citation| !citation.nap.is_empty()) {
            let mismatches = compare_nap(&citation.source, &self.canonical, &citation.nap);
            sources += 1;
            if mismatches.is_empty() {
                consistent += 1;
            }
            citation_mismatches.extend(mismatches);
        }

        let consistency_score = if sources == 0 {
            100.0
        } else {
            100.0 * f64::from(consistent) / f64::from(sources)
        };
        info!("NAP consistency: {consistent}/{sources} sources");

        LocalSeoReport {
            pages: page_audits,
            citation_mismatches,
            consistency_score,
        }
    }

    fn audit_page(&self, page: &PageSignals) -> PageLocalAudit {
        let url = page.url.to_string();
        let schemas = find_business_schemas(&page.json_ld);
        debug!("{url}: {} business schemas", schemas.len());

        let mut issues = Vec::new();
        let mut mismatches = Vec::new();
        for schema in &schemas {
            issues.extend(validate_schema(schema));
            let found = schema.nap_against(&self.canonical);
            mismatches.extend(compare_nap(&url, &self.canonical, &found));
        }
        mismatches.extend(self.text_phone_mismatches(&url, &page.text));

        PageLocalAudit {
            url,
            schema_found: !schemas.is_empty(),
            issues,
            mismatches,
        }
    }

    fn text_phone_mismatches(&self, url: &str, text: &str) -> Vec<NapMismatch> {
        let Some(expected) = self.canonical.phone.as_deref() else {
            return Vec::new();
        };
        let expected_digits = normalize_phone(expected);
        let mut seen = BTreeSet::new();

        PHONE_REGEX
            .find_iter(text)
            .filter(|found| is_standalone_number(text, found.start(), found.end()))
            .filter(|found| {
                let digits = normalize_phone(found.as_str());
                digits != expected_digits && seen.insert(digits)
            })
            .map(|found| NapMismatch {
                source: url.to_string(),
                field: NapField::Phone,
                expected: expected.to_string(),
                found: found.as_str().trim().to_string(),
            })
            .collect()
    }
}

/// `false` when the digits at `start..end` are part of a longer number such as an
/// order reference.
fn is_standalone_number(text: &str, start: usize, end: usize) -> bool {
    let before = text.get(..start).and_then(|head| head.chars().next_back());
    let after = text.get(end..).and_then(|tail| tail.chars().next());

    !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
}
