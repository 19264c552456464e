//! Business-Type Detection
//!
//! Two detectors that catch records which are not the kind of business being
//! sought:
//! - Retail: storefront platforms, retail industries, consumer shops
//! - Location labels: map pins for a site or facility rather than a company
//!
//! A name-only keyword hit never excludes on its own. Retail names need a
//! consumer industry; location labels need a missing web presence or a
//! stricter multi-word pattern.

use crate::config::PolicyConfig;
use crate::normalize::{contains_term, extract_host, find_term, normalize_text};
use crate::types::BusinessRecord;

/// Detect retail / e-commerce businesses. Returns `(is_match, reason)`.
pub fn detect_retail(record: &BusinessRecord, policy: &PolicyConfig) -> (bool, String) {
    // 1. Website hosted on a storefront platform
    if let Some(website) = record.website_url() {
        let host = extract_host(website).unwrap_or_else(|| website.to_lowercase());
        if let Some(domain) = policy
            .retail_platform_domains
            .iter()
            .find(|d| !d.trim().is_empty() && host.contains(&d.trim().to_lowercase()))
        {
            return (
                true,
                format!("WRONG_TYPE: E-commerce platform website ({})", domain.trim()),
            );
        }
    }

    // 2. Industry tag is itself retail
    if let Some(keyword) = find_term(&record.industry, &policy.retail_keywords) {
        return (
            true,
            format!(
                "WRONG_TYPE: Retail industry '{}' (matched '{}')",
                record.industry.trim(),
                keyword
            ),
        );
    }

    // 3. Retail word in the name, corroborated by a consumer industry
    let name_keyword = policy
        .retail_keywords
        .iter()
        .find(|k| contains_term(&record.name, k));
    if let Some(keyword) = name_keyword {
        if let Some(indicator) = find_term(&record.industry, &policy.consumer_indicators) {
            return (
                true,
                format!(
                    "WRONG_TYPE: Retail business name (matched '{}') with consumer industry (matched '{}')",
                    keyword, indicator
                ),
            );
        }
    }

    (false, String::new())
}

/// Detect location labels posing as businesses. Returns `(is_match, reason)`.
pub fn detect_location_label(record: &BusinessRecord, policy: &PolicyConfig) -> (bool, String) {
    let keyword = match policy
        .location_label_keywords
        .iter()
        .find(|k| contains_term(&record.name, k))
    {
        Some(k) => k,
        None => return (false, String::new()),
    };

    let name = normalize_text(&record.name);
    if let Some(pattern) = policy
        .suspicious_location_patterns
        .iter()
        .find(|p| !p.trim().is_empty() && name.contains(&normalize_text(p)))
    {
        return (
            true,
            format!(
                "WRONG_TYPE: Location label, not an operating business (matched pattern '{}')",
                pattern
            ),
        );
    }

    let reviews = record.review_count.unwrap_or(0);
    if record.website_url().is_none() && reviews <= 1 {
        return (
            true,
            format!(
                "WRONG_TYPE: Location label, not an operating business (matched '{}', no website, {} reviews)",
                keyword, reviews
            ),
        );
    }

    (false, String::new())
}
