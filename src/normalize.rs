//! Normalization Module
//!
//! Text, location and URL normalization shared by the filters, plus
//! de-duplication of discovery output.
//!
//! Matching rules:
//! - Text comparisons are case-insensitive with whitespace collapsed
//! - Industry terms match as plain substrings of the tag, so "restaurant"
//!   covers "Restaurants" and "Fast Food Restaurant"
//! - Name keywords match on word boundaries, so "bar" does not hit "Barrie"
//! - Domains match as plain substrings of the hostname

use crate::types::BusinessRecord;
use regex::Regex;
use std::collections::HashMap;

/// Canadian province and territory names mapped to their postal codes
const PROVINCE_NAMES: &[(&str, &str)] = &[
    ("alberta", "AB"),
    ("british columbia", "BC"),
    ("manitoba", "MB"),
    ("new brunswick", "NB"),
    ("newfoundland and labrador", "NL"),
    ("nova scotia", "NS"),
    ("northwest territories", "NT"),
    ("nunavut", "NU"),
    ("ontario", "ON"),
    ("prince edward island", "PE"),
    ("quebec", "QC"),
    ("québec", "QC"),
    ("saskatchewan", "SK"),
    ("yukon", "YT"),
];

/// Normalize text for comparison (lowercase, collapse whitespace)
pub fn normalize_text(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a province to its two-letter code when the name is known
pub fn normalize_province(province: &str) -> String {
    let text = normalize_text(&province.replace('.', ""));
    PROVINCE_NAMES
        .iter()
        .find(|(name, _)| *name == text)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| text.to_uppercase())
}

/// Normalize a city name ("St. Jacobs" and "st jacobs" compare equal)
pub fn normalize_city(city: &str) -> String {
    normalize_text(&city.replace('.', ""))
}

/// Uppercase postal code with all whitespace removed
pub fn normalize_postal(postal: &str) -> String {
    postal
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Check if `term` occurs in `text` as a whole word or phrase (case-insensitive)
pub fn contains_term(text: &str, term: &str) -> bool {
    let term = normalize_text(term);
    if term.is_empty() {
        return false;
    }
    let text = normalize_text(text);

    let starts_word = term.chars().next().map(is_word_char).unwrap_or(false);
    let ends_word = term.chars().last().map(is_word_char).unwrap_or(false);
    let pattern = format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(&term),
        if ends_word { r"\b" } else { "" },
    );

    Regex::new(&pattern)
        .map(|re| re.is_match(&text))
        .unwrap_or_else(|_| text.contains(&term))
}

/// Tag matches a configured term either exactly or as a contained word/phrase
pub fn matches_term(tag: &str, term: &str) -> bool {
    let tag_norm = normalize_text(tag);
    !tag_norm.is_empty() && (tag_norm == normalize_text(term) || contains_term(&tag_norm, term))
}

/// First configured term that matches the text
pub fn find_term<'a>(text: &str, terms: &'a [String]) -> Option<&'a str> {
    terms
        .iter()
        .find(|term| matches_term(text, term))
        .map(|s| s.as_str())
}

/// First industry term contained in the tag, or equal to it
pub fn find_industry_term<'a>(tag: &str, terms: &'a [String]) -> Option<&'a str> {
    let tag = normalize_text(tag);
    if tag.is_empty() {
        return None;
    }
    terms
        .iter()
        .find(|term| {
            let term = normalize_text(term);
            !term.is_empty() && tag.contains(&term)
        })
        .map(|s| s.as_str())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Normalize URL for comparison
///
/// 1. Add `https://` when no scheme is present
/// 2. Lowercase scheme and hostname
/// 3. Drop fragment and trailing slash on non-root paths
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    let (scheme, rest) = match url.find("://") {
        Some(pos) => (url[..pos].to_lowercase(), &url[pos + 3..]),
        None => ("https".to_string(), url),
    };

    let (host_port, path) = match rest.find(|c: char| c == '/' || c == '?' || c == '#') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, "/"),
    };

    let path = path.split('#').next().unwrap_or("");
    let path = if path.is_empty() {
        "/"
    } else if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/')
    } else {
        path
    };

    format!("{}://{}{}", scheme, host_port.to_lowercase(), path)
}

/// Hostname of a URL without port or credentials, lowercased
pub fn extract_host(url: &str) -> Option<String> {
    let normalized = normalize_url(url);
    let rest = &normalized[normalized.find("://")? + 3..];
    let authority = rest.split('/').next().unwrap_or("");
    let authority = authority.split('?').next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// De-duplication result with statistics
#[derive(Debug, Default)]
pub struct DeduplicationStats {
    pub total_input: usize,
    pub unique_output: usize,
    pub duplicates_removed: usize,
}

/// Identity of a business across discovery sources: normalized name + city
pub fn dedup_key(record: &BusinessRecord) -> String {
    format!("{}|{}", normalize_text(&record.name), normalize_city(&record.city))
}

/// Collapse records for the same business, keeping the most complete one.
///
/// Input order is preserved by first sighting of each business.
pub fn deduplicate_records(records: Vec<BusinessRecord>) -> (Vec<BusinessRecord>, DeduplicationStats) {
    let mut stats = DeduplicationStats {
        total_input: records.len(),
        ..Default::default()
    };

    let mut order: Vec<String> = Vec::new();
    let mut kept: HashMap<String, BusinessRecord> = HashMap::new();

    for record in records {
        let key = dedup_key(&record);
        match kept.get(&key) {
            Some(existing) => {
                stats.duplicates_removed += 1;
                if completeness(&record) > completeness(existing) {
                    kept.insert(key, record);
                }
            }
            None => {
                order.push(key.clone());
                kept.insert(key, record);
            }
        }
    }

    let unique: Vec<BusinessRecord> = order
        .into_iter()
        .filter_map(|key| kept.remove(&key))
        .collect();
    stats.unique_output = unique.len();

    (unique, stats)
}

/// Number of populated optional fields
pub fn completeness(record: &BusinessRecord) -> usize {
    [
        record.website_url().is_some(),
        record.revenue_estimate.is_some(),
        record.employee_count.is_some(),
        record.postal_code.as_deref().map(|p| !p.trim().is_empty()).unwrap_or(false),
        record.review_count.is_some(),
        record.years_in_business.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count()
}
