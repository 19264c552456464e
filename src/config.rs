//! Filtering Policy
//!
//! Every threshold and keyword list the filters use lives here. A policy is
//! versioned so an old batch can be re-run under the policy it was produced
//! with.
//!
//! Generations:
//! - 2024-q3: revenue cap $2.6M, 30 employees
//! - 2025-q1: revenue cap $1.5M, 25 employees (current)

use crate::error::ConfigError;
use crate::normalize::normalize_text;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const GENERATION_ONE: &str = "2024-q3";
pub const GENERATION_TWO: &str = "2025-q1";
pub const LATEST_VERSION: &str = GENERATION_TWO;

/// Longest probe timeout a policy may ask for (milliseconds)
const MAX_PROBE_TIMEOUT_MS: u64 = 10_000;

/// What to do with an industry tag that is neither forbidden nor allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIndustryPolicy {
    #[default]
    Review,
    Exclude,
    Qualify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub version: String,

    // Industry
    pub forbidden_industries: Vec<String>,
    pub allowed_industries: Vec<String>,
    #[serde(default)]
    pub unknown_industry: UnknownIndustryPolicy,

    // Location
    pub allowed_provinces: Vec<String>,
    pub allowed_cities: Vec<String>,
    #[serde(default)]
    pub allowed_postal_prefixes: Vec<String>,

    // Size
    pub min_revenue: f64,
    pub max_revenue: f64,
    pub max_employee_count: u32,
    #[serde(default)]
    pub max_review_count: Option<u32>,
    pub upper_range_revenue: f64,

    // Business type
    pub retail_platform_domains: Vec<String>,
    pub retail_keywords: Vec<String>,
    pub consumer_indicators: Vec<String>,
    pub location_label_keywords: Vec<String>,
    #[serde(default)]
    pub suspicious_location_patterns: Vec<String>,

    #[serde(default)]
    pub warnings: WarningThresholds,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub verifier: VerifierSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningThresholds {
    pub high_visibility_reviews: u32,
    pub verify_size_employees: u32,
    pub verify_size_reviews: u32,
    pub new_business_years: u32,
    pub established_years: u32,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        WarningThresholds {
            high_visibility_reviews: 20,
            verify_size_employees: 15,
            verify_size_reviews: 20,
            new_business_years: 2,
            established_years: 40,
        }
    }
}

/// Point weights on the 100-point scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub revenue_fit: u32,
    pub years_in_business: u32,
    pub completeness: u32,
    pub verified_website: u32,
    pub engagement: u32,
    pub qualification_threshold: u32,
    /// Years at which the tenure component reaches full weight
    pub full_tenure_years: u32,
    /// Confidence assumed when a revenue estimate carries none
    pub default_revenue_confidence: f64,
    /// Warning codes that always send a record to review
    pub always_review: Vec<String>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            revenue_fit: 35,
            years_in_business: 20,
            completeness: 25,
            verified_website: 10,
            engagement: 10,
            qualification_threshold: 60,
            full_tenure_years: 10,
            default_revenue_confidence: 0.5,
            always_review: vec![
                "VERIFY_SIZE".to_string(),
                "UNKNOWN_INDUSTRY".to_string(),
                "UNVERIFIED_WEBSITE".to_string(),
            ],
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> u32 {
        self.revenue_fit
            + self.years_in_business
            + self.completeness
            + self.verified_website
            + self.engagement
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierSettings {
    pub timeout_ms: u64,
    pub max_concurrent: usize,
    pub user_agent: String,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        VerifierSettings {
            timeout_ms: 3000,
            max_concurrent: 8,
            user_agent: "Mozilla/5.0 (compatible; acquisition-leads/0.1)".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PolicyConfig {
    /// First generation: $2.6M revenue cap, 30 employees
    pub fn generation_one() -> Self {
        PolicyConfig {
            version: GENERATION_ONE.to_string(),
            forbidden_industries: strings(&[
                "restaurant", "food service", "bar", "cafe", "real estate",
                "property management", "insurance", "financial services", "bank",
                "law firm", "legal services", "medical", "dental", "healthcare",
                "pharmacy", "franchise", "non-profit", "church", "government",
                "school", "education",
            ]),
            allowed_industries: strings(&[
                "manufacturing", "machining", "metal fabrication", "industrial services",
                "distribution", "wholesale", "logistics", "construction", "electrical",
                "plumbing", "hvac", "engineering services", "technical services",
                "printing", "packaging", "equipment repair", "b2b services",
            ]),
            unknown_industry: UnknownIndustryPolicy::Review,
            allowed_provinces: strings(&["ON"]),
            allowed_cities: strings(&[
                "Kitchener", "Waterloo", "Cambridge", "Guelph", "Brantford",
                "Woodstock", "Stratford", "Elmira", "New Hamburg", "Ayr",
            ]),
            allowed_postal_prefixes: strings(&["N", "L"]),
            min_revenue: 250_000.0,
            max_revenue: 2_600_000.0,
            max_employee_count: 30,
            max_review_count: Some(100),
            upper_range_revenue: 2_000_000.0,
            retail_platform_domains: strings(&[
                "myshopify.com", "shopify.com", "etsy.com", "amazon.com", "amazon.ca",
                "ebay.com", "ebay.ca", "bigcartel.com", "wixsite.com", "squarespace.com",
                "bigcommerce.com", "woocommerce.com",
            ]),
            retail_keywords: strings(&[
                "retail", "e-commerce", "ecommerce", "online store", "boutique",
                "shop", "store", "outlet", "gift",
            ]),
            consumer_indicators: strings(&[
                "retail", "consumer", "apparel", "clothing", "fashion", "gifts",
                "jewelry", "cosmetics", "beauty", "toys", "home decor",
            ]),
            location_label_keywords: strings(&[
                "site", "facility", "complex", "plant", "campus", "depot", "yard",
            ]),
            suspicious_location_patterns: strings(&[
                "manufacturing site", "industrial site", "production facility",
                "industrial complex", "business park", "distribution centre",
                "distribution center",
            ]),
            warnings: WarningThresholds::default(),
            scoring: ScoringWeights::default(),
            verifier: VerifierSettings::default(),
        }
    }

    /// Second generation: caps tightened to $1.5M and 25 employees
    pub fn generation_two() -> Self {
        PolicyConfig {
            version: GENERATION_TWO.to_string(),
            max_revenue: 1_500_000.0,
            max_employee_count: 25,
            upper_range_revenue: 1_200_000.0,
            ..Self::generation_one()
        }
    }

    /// Look up a builtin policy generation by version string
    pub fn builtin(version: &str) -> Result<Self, ConfigError> {
        match version.trim() {
            GENERATION_ONE => Ok(Self::generation_one()),
            GENERATION_TWO | "" | "latest" => Ok(Self::generation_two()),
            other => Err(ConfigError::UnknownVersion(other.to_string())),
        }
    }

    /// Pre-flight validation. Any error here aborts the whole batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required: [(&'static str, &Vec<String>); 8] = [
            ("forbidden_industries", &self.forbidden_industries),
            ("allowed_industries", &self.allowed_industries),
            ("allowed_provinces", &self.allowed_provinces),
            ("allowed_cities", &self.allowed_cities),
            ("retail_platform_domains", &self.retail_platform_domains),
            ("retail_keywords", &self.retail_keywords),
            ("consumer_indicators", &self.consumer_indicators),
            ("location_label_keywords", &self.location_label_keywords),
        ];
        for (name, set) in required {
            if set.iter().all(|s| s.trim().is_empty()) {
                return Err(ConfigError::EmptySet(name));
            }
        }

        let forbidden: HashSet<String> = self
            .forbidden_industries
            .iter()
            .map(|s| normalize_text(s))
            .collect();
        let mut overlap: Vec<String> = self
            .allowed_industries
            .iter()
            .map(|s| normalize_text(s))
            .filter(|s| forbidden.contains(s))
            .collect();
        if !overlap.is_empty() {
            overlap.sort();
            overlap.dedup();
            return Err(ConfigError::IndustryOverlap(overlap));
        }

        if self.min_revenue > self.max_revenue {
            return Err(ConfigError::RevenueBoundsInverted {
                min: self.min_revenue,
                max: self.max_revenue,
            });
        }
        if self.upper_range_revenue >= self.max_revenue {
            return Err(ConfigError::UpperRangeAboveCap {
                threshold: self.upper_range_revenue,
                max: self.max_revenue,
            });
        }

        let total = self.scoring.total();
        if total != 100 {
            return Err(ConfigError::WeightsNot100(total));
        }
        if self.scoring.qualification_threshold > 100 {
            return Err(ConfigError::ThresholdOutOfRange(self.scoring.qualification_threshold));
        }

        if self.verifier.timeout_ms == 0 || self.verifier.timeout_ms > MAX_PROBE_TIMEOUT_MS {
            return Err(ConfigError::Verifier(format!(
                "timeout_ms must be within 1..={}, got {}",
                MAX_PROBE_TIMEOUT_MS, self.verifier.timeout_ms
            )));
        }
        if self.verifier.max_concurrent == 0 {
            return Err(ConfigError::Verifier("max_concurrent must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::generation_two()
    }
}
