//! Integration tests for the acquisition lead pipeline
//! Runs whole batches through the public API with a stubbed website probe

use acquisition_leads::config::PolicyConfig;
use acquisition_leads::error::ConfigError;
use acquisition_leads::link_health::WebsiteProbe;
use acquisition_leads::pipeline::{evaluate_record, Pipeline};
use acquisition_leads::report::generate_summary_report;
use acquisition_leads::storage;
use acquisition_leads::types::{BusinessRecord, RecordStatus, WebsiteCheck};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Probe that verifies every site except those containing "dead"
struct FixedProbe;

#[async_trait]
impl WebsiteProbe for FixedProbe {
    async fn probe(&self, url: &str) -> WebsiteCheck {
        if url.contains("dead") {
            WebsiteCheck::ConnectionFailed
        } else {
            WebsiteCheck::Verified(200)
        }
    }
}

fn pipeline() -> Pipeline {
    Pipeline::new(PolicyConfig::default(), Arc::new(FixedProbe)).expect("default policy is valid")
}

fn north_star() -> BusinessRecord {
    BusinessRecord {
        website: Some("https://northstartech.com/".to_string()),
        revenue_estimate: Some(900_000.0),
        revenue_confidence: Some(0.8),
        employee_count: Some(9),
        postal_code: Some("N2H 3T1".to_string()),
        review_count: Some(11),
        years_in_business: Some(14),
        ..BusinessRecord::new("North Star Technical Inc", "Manufacturing", "Kitchener", "ON")
    }
}

fn assert_reason_invariant(records: &[BusinessRecord]) {
    for r in records {
        let has_reason = r.exclusion_reason.as_deref().map(|s| !s.is_empty()).unwrap_or(false);
        assert_eq!(
            r.status == RecordStatus::Excluded,
            has_reason,
            "status/reason mismatch for {:?}",
            r.name
        );
        if r.status == RecordStatus::Excluded {
            assert!(r.warnings.is_empty(), "excluded record carries warnings: {:?}", r.name);
        }
    }
}

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("acquisition-leads-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("tracking")).unwrap();
    dir
}

#[tokio::test]
async fn test_north_star_qualifies() {
    let report = pipeline().run_batch(vec![north_star()]).await;
    let record = &report.records[0];

    assert_eq!(record.status, RecordStatus::Qualified);
    assert!(record.exclusion_reason.is_none());
    assert!(record.warnings.len() <= 1);
    assert!(record.score.unwrap() >= 60);
    assert_eq!(record.website_check, Some(WebsiteCheck::Verified(200)));
}

#[tokio::test]
async fn test_shopify_store_excluded() {
    let mut record = BusinessRecord::new("Container57", "Packaging", "Cambridge", "ON");
    record.website = Some("https://container57.myshopify.com/collections/all".to_string());

    let report = pipeline().run_batch(vec![record]).await;
    let record = &report.records[0];
    assert_eq!(record.status, RecordStatus::Excluded);
    let reason = record.exclusion_reason.as_deref().unwrap();
    assert!(reason.starts_with("WRONG_TYPE:"));
    assert!(reason.contains("E-commerce platform"));
}

#[tokio::test]
async fn test_plural_forbidden_industry_excluded() {
    let tags = ["Restaurants", "Bars", "Cafes", "Banks", "Schools", "Churches"];
    let records: Vec<BusinessRecord> = tags
        .iter()
        .map(|tag| {
            let mut record = north_star();
            record.industry = tag.to_string();
            record
        })
        .collect();

    let report = pipeline().run_batch(records).await;
    for (record, tag) in report.records.iter().zip(tags) {
        assert_eq!(record.status, RecordStatus::Excluded, "{}", tag);
        assert_eq!(
            record.exclusion_reason.as_deref(),
            Some(format!("Non-target industry: {}", tag).as_str())
        );
        assert!(record.warnings.is_empty());
    }
    assert_eq!(report.stats.exclusions_by_category.get("Non-target industry"), Some(&6));
}

#[tokio::test]
async fn test_dead_websites_go_to_review() {
    let mut record = north_star();
    record.website = Some("https://dead-link.example.com".to_string());

    let report = pipeline().run_batch(vec![record]).await;
    let record = &report.records[0];
    assert_eq!(record.status, RecordStatus::Review);
    assert_eq!(record.website_check, Some(WebsiteCheck::ConnectionFailed));
    assert_eq!(record.warning_codes(), vec!["UNVERIFIED_WEBSITE"]);
    assert!(record.exclusion_reason.is_none());
}

#[tokio::test]
async fn test_location_label_excluded() {
    let mut record = BusinessRecord::new("Emerald Manufacturing Site", "Manufacturing", "Guelph", "ON");
    record.review_count = Some(1);

    let report = pipeline().run_batch(vec![record]).await;
    let record = &report.records[0];
    assert_eq!(record.status, RecordStatus::Excluded);
    assert!(record.exclusion_reason.as_deref().unwrap().contains("Location label"));
}

#[tokio::test]
async fn test_revenue_over_cap_excluded_with_cap_in_reason() {
    for revenue in [1_500_001.0, 2_000_000.0, 9_999_999.0] {
        let mut record = north_star();
        record.revenue_estimate = Some(revenue);

        let report = pipeline().run_batch(vec![record]).await;
        let record = &report.records[0];
        assert_eq!(record.status, RecordStatus::Excluded);
        assert!(record.exclusion_reason.as_deref().unwrap().contains("$1,500,000"));
    }
}

#[tokio::test]
async fn test_high_visibility_and_verify_size_warnings() {
    let mut record = north_star();
    record.review_count = Some(76);
    record.employee_count = Some(20);

    let report = pipeline().run_batch(vec![record]).await;
    let record = &report.records[0];
    assert_ne!(record.status, RecordStatus::Excluded);
    let codes = record.warning_codes();
    assert!(codes.contains(&"HIGH_VISIBILITY"));
    assert!(codes.contains(&"VERIFY_SIZE"));
    assert_eq!(record.status, RecordStatus::Review);
}

#[tokio::test]
async fn test_shop_name_in_manufacturing_not_retail() {
    let mut record = north_star();
    record.name = "Precision Machine Shop".to_string();
    record.industry = "Manufacturing".to_string();

    let report = pipeline().run_batch(vec![record]).await;
    let record = &report.records[0];
    assert_ne!(record.status, RecordStatus::Excluded);
    assert!(record.exclusion_reason.is_none());
}

#[tokio::test]
async fn test_malformed_record_isolated() {
    let mut nameless = north_star();
    nameless.name = String::new();

    let mut records = vec![north_star(), nameless];
    for city in ["Waterloo", "Guelph", "Toronto"] {
        let mut r = north_star();
        r.name = format!("North Star {}", city);
        r.city = city.to_string();
        records.push(r);
    }

    let report = pipeline().run_batch(records).await;
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.stats.malformed, 1);
    assert_eq!(report.records[1].status, RecordStatus::Malformed);
    assert!(report.records[1].exclusion_reason.is_none());

    let others: Vec<_> = report.records.iter().filter(|r| r.status != RecordStatus::Malformed).collect();
    assert_eq!(others.len(), 4);
    assert!(others.iter().all(|r| r.status != RecordStatus::Pending));
    assert_eq!(report.stats.qualified, 3);
    assert_eq!(report.stats.excluded, 1);
    assert_reason_invariant(&report.records);
}

#[tokio::test]
async fn test_filter_chain_idempotent_on_finalised_records() {
    let mut dead_site = north_star();
    dead_site.name = "Grand River Tooling".to_string();
    dead_site.website = Some("https://dead.example.com".to_string());

    let mut shop = BusinessRecord::new("Container57", "Packaging", "Cambridge", "ON");
    shop.website = Some("https://container57.myshopify.com".to_string());

    let policy = PolicyConfig::default();
    let report = pipeline().run_batch(vec![north_star(), dead_site, shop]).await;
    assert_reason_invariant(&report.records);

    for finalised in &report.records {
        let mut again = finalised.clone();
        evaluate_record(&mut again, &policy);
        assert_eq!(again.status, finalised.status);
        assert_eq!(again.exclusion_reason, finalised.exclusion_reason);
        assert_eq!(again.warnings, finalised.warnings);
        assert_eq!(again.score, finalised.score);
    }

    assert_eq!(report.records[1].warning_codes(), vec!["UNVERIFIED_WEBSITE"]);
}

#[test]
fn test_contradictory_policy_aborts_before_processing() {
    let mut policy = PolicyConfig::default();
    policy.forbidden_industries.push("Manufacturing".to_string());

    let result = Pipeline::new(policy, Arc::new(FixedProbe));
    assert!(matches!(result, Err(ConfigError::IndustryOverlap(_))));
}

#[tokio::test]
async fn test_policy_generations_reproduce_history() {
    let mut record = north_star();
    record.revenue_estimate = Some(2_200_000.0);
    record.employee_count = Some(28);

    let old = Pipeline::new(PolicyConfig::generation_one(), Arc::new(FixedProbe)).unwrap();
    let new = pipeline();

    let old_report = old.run_batch(vec![record.clone()]).await;
    let new_report = new.run_batch(vec![record]).await;

    assert_ne!(old_report.records[0].status, RecordStatus::Excluded);
    assert_eq!(new_report.records[0].status, RecordStatus::Excluded);
    assert_eq!(old_report.policy_version, "2024-q3");
}

#[tokio::test]
async fn test_csv_round_trip_through_storage() {
    let dir = test_dir("csv");
    let root = dir.to_str().unwrap();
    fs::write(
        dir.join("tracking/candidates.csv"),
        "name,website,industry,revenue_estimate,revenue_confidence,employee_count,city,province,postal_code,review_count,years_in_business,source\n\
         North Star Technical Inc,https://northstartech.com/,Manufacturing,900000,0.8,9,Kitchener,ON,N2H 3T1,11,14,maps\n\
         ,https://nameless.example.com,Manufacturing,,,,Kitchener,ON,,,,maps\n\
         Harbour Cafe,,Cafe,300000,,6,Waterloo,ON,,45,8,directory\n\
         Typo Co,,Machining,500000,,4,Guelph,ON,,n/a,12,directory\n",
    )
    .unwrap();

    let records = storage::load_candidates(root).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].review_count, Some(11));
    assert!(records[2].website.is_none());
    assert_eq!(records[3].name, "Typo Co");
    assert_eq!(records[3].invalid_fields, vec!["review_count = 'n/a'".to_string()]);

    let report = pipeline().run_batch(records).await;
    storage::save_report_csv(root, &report).unwrap();
    storage::save_batch(root, &report).unwrap();
    storage::save_summary(root, &generate_summary_report(&report)).unwrap();

    let csv = fs::read_to_string(dir.join("tracking/report.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "name,website,industry,revenue_estimate,revenue_confidence,employee_count,city,province,postal_code,review_count,years_in_business,source,status,exclusion_reason,warnings,score,website_verified,input_error"
    );
    assert!(csv.contains("QUALIFIED"));
    assert!(csv.contains("Non-target industry: Cafe"));

    let mut reader = csv::Reader::from_path(dir.join("tracking/report.csv")).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        let status = &row[12];
        let reason = &row[13];
        let input_error = &row[17];
        assert_eq!(status == "EXCLUDED", !reason.is_empty(), "row {:?}", row);
        assert_eq!(status == "MALFORMED", !input_error.is_empty(), "row {:?}", row);
    }
    assert_eq!(&rows[3][0], "Typo Co");
    assert_eq!(&rows[3][12], "MALFORMED");
    assert!(rows[3][17].contains("review_count = 'n/a'"));

    let saved = storage::load_batch(root).unwrap();
    assert_eq!(saved.stats, report.stats);
    assert_eq!(saved.stats.malformed, 2);

    let summary = fs::read_to_string(dir.join("tracking/summary.md")).unwrap();
    assert!(summary.contains("Malformed input: 2"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_policy_file_loaded_when_present() {
    let dir = test_dir("policy");
    let root = dir.to_str().unwrap();

    let policy = storage::load_policy(root, None).unwrap();
    assert_eq!(policy.version, "2025-q1");

    fs::create_dir_all(dir.join("config")).unwrap();
    let mut custom = PolicyConfig::default();
    custom.version = "custom-1".to_string();
    custom.max_employee_count = 12;
    fs::write(dir.join("config/policy.yaml"), serde_yaml::to_string(&custom).unwrap()).unwrap();

    let loaded = storage::load_policy(root, None).unwrap();
    assert_eq!(loaded, custom);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_requested_version_overrides_policy_file() {
    let dir = test_dir("policy-override");
    let root = dir.to_str().unwrap();

    fs::create_dir_all(dir.join("config")).unwrap();
    let mut custom = PolicyConfig::default();
    custom.version = "custom-1".to_string();
    fs::write(dir.join("config/policy.yaml"), serde_yaml::to_string(&custom).unwrap()).unwrap();

    let loaded = storage::load_policy(root, Some("2024-q3")).unwrap();
    assert_eq!(loaded, PolicyConfig::generation_one());
    assert!(storage::load_policy(root, Some("1999-q1")).is_err());

    let _ = fs::remove_dir_all(&dir);
}
