//! Warning Generator
//!
//! Non-fatal advisories for records that passed every hard filter. Rules are
//! evaluated in a fixed order and a record may carry any subset of them:
//!
//! 1. HIGH_VISIBILITY - many reviews
//! 2. UPPER_RANGE     - revenue close to the cap
//! 3. VERIFY_SIZE     - headcount and reviews both high
//! 4. NO_WEBSITE      - no website declared
//! 5. NEW_BUSINESS / ESTABLISHED - tenure at either extreme

use crate::config::PolicyConfig;
use crate::filter::format_currency;
use crate::types::BusinessRecord;

pub fn generate_warnings(record: &BusinessRecord, policy: &PolicyConfig) -> Vec<String> {
    if record.is_excluded() {
        return Vec::new();
    }

    let thresholds = &policy.warnings;
    let mut warnings = Vec::new();

    if let Some(reviews) = record.review_count {
        if reviews > thresholds.high_visibility_reviews {
            warnings.push(format!(
                "HIGH_VISIBILITY: {} reviews suggests an established local brand",
                reviews
            ));
        }
    }

    if let Some(revenue) = record.revenue_estimate {
        if revenue > policy.upper_range_revenue {
            warnings.push(format!(
                "UPPER_RANGE: Revenue {} is above {} and close to the {} cap",
                format_currency(revenue),
                format_currency(policy.upper_range_revenue),
                format_currency(policy.max_revenue)
            ));
        }
    }

    if let (Some(employees), Some(reviews)) = (record.employee_count, record.review_count) {
        if employees > thresholds.verify_size_employees && reviews > thresholds.verify_size_reviews {
            warnings.push(format!(
                "VERIFY_SIZE: {} employees with {} reviews, confirm the business is not larger than reported",
                employees, reviews
            ));
        }
    }

    if record.website_url().is_none() {
        warnings.push("NO_WEBSITE: No website listed".to_string());
    }

    if let Some(years) = record.years_in_business {
        if years < thresholds.new_business_years {
            warnings.push(format!("NEW_BUSINESS: Only {} years in business", years));
        } else if years > thresholds.established_years {
            warnings.push(format!(
                "ESTABLISHED: {} years in business, check for succession plans",
                years
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::warning_code;

    fn create_test_record() -> BusinessRecord {
        BusinessRecord {
            website: Some("https://northstartech.com/".to_string()),
            revenue_estimate: Some(900_000.0),
            employee_count: Some(8),
            review_count: Some(11),
            years_in_business: Some(12),
            ..BusinessRecord::new("North Star Technical Inc", "Manufacturing", "Kitchener", "ON")
        }
    }

    fn codes(warnings: &[String]) -> Vec<&str> {
        warnings.iter().map(|w| warning_code(w)).collect()
    }

    #[test]
    fn test_clean_record_has_no_warnings() {
        let policy = PolicyConfig::default();
        assert!(generate_warnings(&create_test_record(), &policy).is_empty());
    }

    #[test]
    fn test_high_visibility_and_verify_size() {
        let policy = PolicyConfig::default();
        let mut record = create_test_record();
        record.review_count = Some(76);
        record.employee_count = Some(20);

        let warnings = generate_warnings(&record, &policy);
        assert_eq!(codes(&warnings), vec!["HIGH_VISIBILITY", "VERIFY_SIZE"]);
    }

    #[test]
    fn test_verify_size_needs_both_conditions() {
        let policy = PolicyConfig::default();
        let mut record = create_test_record();
        record.employee_count = Some(20);
        assert!(generate_warnings(&record, &policy).is_empty());
    }

    #[test]
    fn test_full_order() {
        let policy = PolicyConfig::default();
        let mut record = create_test_record();
        record.review_count = Some(30);
        record.employee_count = Some(18);
        record.revenue_estimate = Some(1_400_000.0);
        record.website = None;
        record.years_in_business = Some(1);

        let warnings = generate_warnings(&record, &policy);
        assert_eq!(
            codes(&warnings),
            vec!["HIGH_VISIBILITY", "UPPER_RANGE", "VERIFY_SIZE", "NO_WEBSITE", "NEW_BUSINESS"]
        );
    }

    #[test]
    fn test_tenure_extremes() {
        let policy = PolicyConfig::default();
        let mut record = create_test_record();

        record.years_in_business = Some(45);
        assert_eq!(codes(&generate_warnings(&record, &policy)), vec!["ESTABLISHED"]);

        record.years_in_business = Some(40);
        assert!(generate_warnings(&record, &policy).is_empty());

        record.years_in_business = Some(2);
        assert!(generate_warnings(&record, &policy).is_empty());
    }

    #[test]
    fn test_blank_website_counts_as_missing() {
        let policy = PolicyConfig::default();
        let mut record = create_test_record();
        record.website = Some("   ".to_string());
        assert_eq!(codes(&generate_warnings(&record, &policy)), vec!["NO_WEBSITE"]);
    }

    #[test]
    fn test_excluded_record_gets_no_warnings() {
        let policy = PolicyConfig::default();
        let mut record = create_test_record();
        record.website = None;
        record.exclude("Non-target industry: Restaurant".to_string());
        assert!(generate_warnings(&record, &policy).is_empty());
    }
}
