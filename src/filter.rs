//! Hard Filters
//!
//! Industry, location and size gates. Each check is a pure function from a
//! record and a policy to a `FilterOutcome`; `run_filters` applies them in
//! order and stops at the first exclusion.
//!
//! Order: Industry -> Location -> Size -> Business type

use crate::business_type::{detect_location_label, detect_retail};
use crate::config::{PolicyConfig, UnknownIndustryPolicy};
use crate::normalize::{find_industry_term, normalize_city, normalize_postal, normalize_province};
use crate::types::BusinessRecord;
use tracing::debug;

/// Result of a single filter stage
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Pass,
    /// Passes, but carries a `CODE: message` advisory
    Advisory(String),
    /// Terminal exclusion with a human-readable reason
    Exclude(String),
}

/// Classification of an industry tag against the policy
#[derive(Debug, Clone, PartialEq)]
pub enum IndustryMatch {
    Forbidden(String),
    Allowed(String),
    Unknown,
}

/// Classify an industry tag. Forbidden entries win over allowed ones.
pub fn classify_industry(industry: &str, policy: &PolicyConfig) -> IndustryMatch {
    if let Some(term) = find_industry_term(industry, &policy.forbidden_industries) {
        return IndustryMatch::Forbidden(term.to_string());
    }
    if let Some(term) = find_industry_term(industry, &policy.allowed_industries) {
        return IndustryMatch::Allowed(term.to_string());
    }
    IndustryMatch::Unknown
}

pub fn check_industry(record: &BusinessRecord, policy: &PolicyConfig) -> FilterOutcome {
    let tag = record.industry.trim();
    match classify_industry(tag, policy) {
        IndustryMatch::Forbidden(_) => FilterOutcome::Exclude(format!("Non-target industry: {}", tag)),
        IndustryMatch::Allowed(_) => FilterOutcome::Pass,
        IndustryMatch::Unknown => {
            let shown = if tag.is_empty() { "(none)" } else { tag };
            match policy.unknown_industry {
                UnknownIndustryPolicy::Review => FilterOutcome::Advisory(format!(
                    "UNKNOWN_INDUSTRY: Industry '{}' is not in the allowed list",
                    shown
                )),
                UnknownIndustryPolicy::Exclude => {
                    FilterOutcome::Exclude(format!("Unrecognized industry: {}", shown))
                }
                UnknownIndustryPolicy::Qualify => FilterOutcome::Pass,
            }
        }
    }
}

/// Province and city are hard gates; the postal prefix is advisory only
pub fn check_location(record: &BusinessRecord, policy: &PolicyConfig) -> FilterOutcome {
    let province = normalize_province(&record.province);
    if province.is_empty() {
        return FilterOutcome::Exclude("Outside target region: province missing".to_string());
    }
    let province_ok = policy
        .allowed_provinces
        .iter()
        .any(|p| normalize_province(p) == province);
    if !province_ok {
        return FilterOutcome::Exclude(format!(
            "Outside target region: province '{}' not allowed",
            record.province.trim()
        ));
    }

    let city = normalize_city(&record.city);
    if city.is_empty() {
        return FilterOutcome::Exclude("Outside target area: city missing".to_string());
    }
    if !policy.allowed_cities.iter().any(|c| normalize_city(c) == city) {
        return FilterOutcome::Exclude(format!(
            "Outside target area: city '{}' not allowed",
            record.city.trim()
        ));
    }

    if let Some(postal) = record.postal_code.as_deref() {
        let postal = normalize_postal(postal);
        if !postal.is_empty() && !policy.allowed_postal_prefixes.is_empty() {
            let prefix_ok = policy
                .allowed_postal_prefixes
                .iter()
                .any(|prefix| postal.starts_with(&normalize_postal(prefix)));
            if !prefix_ok {
                return FilterOutcome::Advisory(format!(
                    "POSTAL_PREFIX: Postal code {} outside preferred prefixes ({})",
                    postal,
                    policy.allowed_postal_prefixes.join(", ")
                ));
            }
        }
    }

    FilterOutcome::Pass
}

/// Revenue, employee and review caps. Absent values never exclude.
pub fn check_size(record: &BusinessRecord, policy: &PolicyConfig) -> FilterOutcome {
    if let Some(revenue) = record.revenue_estimate {
        if revenue > policy.max_revenue {
            return FilterOutcome::Exclude(format!(
                "Revenue too high: {} exceeds cap {}",
                format_currency(revenue),
                format_currency(policy.max_revenue)
            ));
        }
    }

    if let Some(employees) = record.employee_count {
        if employees > policy.max_employee_count {
            return FilterOutcome::Exclude(format!(
                "Too many employees: {} exceeds cap {}",
                employees, policy.max_employee_count
            ));
        }
    }

    if let (Some(reviews), Some(cap)) = (record.review_count, policy.max_review_count) {
        if reviews > cap {
            return FilterOutcome::Exclude(format!(
                "Too many reviews: {} exceeds cap {}",
                reviews, cap
            ));
        }
    }

    FilterOutcome::Pass
}

/// Retail and location-label detection folded into one stage
pub fn check_business_type(record: &BusinessRecord, policy: &PolicyConfig) -> FilterOutcome {
    let (is_retail, reason) = detect_retail(record, policy);
    if is_retail {
        return FilterOutcome::Exclude(reason);
    }

    let (is_label, reason) = detect_location_label(record, policy);
    if is_label {
        return FilterOutcome::Exclude(reason);
    }

    FilterOutcome::Pass
}

/// Run the hard filter chain, short-circuiting on the first exclusion.
///
/// Marks the record excluded when a filter fires and returns the advisories
/// collected from the stages that passed.
pub fn run_filters(record: &mut BusinessRecord, policy: &PolicyConfig) -> Vec<String> {
    let stages: [(&str, fn(&BusinessRecord, &PolicyConfig) -> FilterOutcome); 4] = [
        ("industry", check_industry),
        ("location", check_location),
        ("size", check_size),
        ("business_type", check_business_type),
    ];

    let mut advisories = Vec::new();
    for (stage, check) in stages {
        match check(record, policy) {
            FilterOutcome::Pass => {}
            FilterOutcome::Advisory(warning) => advisories.push(warning),
            FilterOutcome::Exclude(reason) => {
                debug!(name = %record.name, stage, reason = %reason, "record excluded");
                record.exclude(reason);
                return Vec::new();
            }
        }
    }

    advisories
}

/// Format a dollar amount with thousands separators ("$1,500,000").
///
/// Cents are shown only when the amount is not a whole number of dollars.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as i64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if cents % 100 != 0 {
        grouped.push_str(&format!(".{:02}", cents % 100));
    }
    if amount < 0.0 && cents != 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
