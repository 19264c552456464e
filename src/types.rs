use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a candidate business.
///
/// `Qualified`, `Review` and `Excluded` are the final verdicts. `Malformed`
/// marks input that could not be evaluated at all and is kept out of the
/// filter statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    #[default]
    Pending,
    Qualified,
    Review,
    Excluded,
    Malformed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Pending => write!(f, "PENDING"),
            RecordStatus::Qualified => write!(f, "QUALIFIED"),
            RecordStatus::Review => write!(f, "REVIEW"),
            RecordStatus::Excluded => write!(f, "EXCLUDED"),
            RecordStatus::Malformed => write!(f, "MALFORMED"),
        }
    }
}

/// Outcome of a website liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteCheck {
    /// Server answered with a status in the accepted range
    Verified(u16),
    /// Server answered, but with a dead or failing status
    BadStatus(u16),
    Timeout,
    ConnectionFailed,
    Malformed,
}

impl WebsiteCheck {
    pub fn is_verified(&self) -> bool {
        matches!(self, WebsiteCheck::Verified(_))
    }
}

impl fmt::Display for WebsiteCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebsiteCheck::Verified(code) => write!(f, "verified (HTTP {})", code),
            WebsiteCheck::BadStatus(code) => write!(f, "HTTP {}", code),
            WebsiteCheck::Timeout => write!(f, "timed out"),
            WebsiteCheck::ConnectionFailed => write!(f, "connection failed"),
            WebsiteCheck::Malformed => write!(f, "malformed URL"),
        }
    }
}

/// One candidate business under evaluation.
///
/// Created by a discovery source with partially populated fields, then
/// mutated in place by the filters and the warning generator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub revenue_estimate: Option<f64>,
    #[serde(default)]
    pub revenue_confidence: Option<f64>,
    #[serde(default)]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub years_in_business: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    /// Input columns that could not be parsed, as `column = 'value'`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_fields: Vec<String>,

    // Derived
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub exclusion_reason: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub website_check: Option<WebsiteCheck>,
    #[serde(default)]
    pub input_error: Option<String>,
}

impl BusinessRecord {
    pub fn new(name: &str, industry: &str, city: &str, province: &str) -> Self {
        BusinessRecord {
            name: name.to_string(),
            industry: industry.to_string(),
            city: city.to_string(),
            province: province.to_string(),
            ..Default::default()
        }
    }

    /// Website with surrounding whitespace removed, `None` when blank
    pub fn website_url(&self) -> Option<&str> {
        self.website
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }

    /// Mark the record as terminally excluded
    pub fn exclude(&mut self, reason: String) {
        self.status = RecordStatus::Excluded;
        self.exclusion_reason = Some(reason);
        self.warnings.clear();
        self.score = None;
    }

    pub fn is_excluded(&self) -> bool {
        self.status == RecordStatus::Excluded
    }

    /// Clear everything the pipeline derives so the record can be re-evaluated
    pub fn reset_derived(&mut self) {
        self.status = RecordStatus::Pending;
        self.exclusion_reason = None;
        self.warnings.clear();
        self.score = None;
        self.input_error = None;
    }

    /// Warning codes (the part before `:`) in order
    pub fn warning_codes(&self) -> Vec<&str> {
        self.warnings.iter().map(|w| warning_code(w)).collect()
    }
}

/// Code part of a `CODE: message` string
pub fn warning_code(warning: &str) -> &str {
    warning.split(':').next().unwrap_or(warning).trim()
}

/// Input row as produced by discovery exports.
///
/// Kept separate from `BusinessRecord` so a CSV never sets derived fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CandidateRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub revenue_estimate: Option<f64>,
    #[serde(default)]
    pub revenue_confidence: Option<f64>,
    #[serde(default)]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub years_in_business: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<CandidateRow> for BusinessRecord {
    fn from(row: CandidateRow) -> Self {
        BusinessRecord {
            name: row.name.unwrap_or_default(),
            website: row.website.filter(|w| !w.trim().is_empty()),
            industry: row.industry.unwrap_or_default(),
            revenue_estimate: row.revenue_estimate,
            revenue_confidence: row.revenue_confidence,
            employee_count: row.employee_count,
            city: row.city.unwrap_or_default(),
            province: row.province.unwrap_or_default(),
            postal_code: row.postal_code.filter(|p| !p.trim().is_empty()),
            review_count: row.review_count,
            years_in_business: row.years_in_business,
            source: row.source.filter(|s| !s.trim().is_empty()),
            ..Default::default()
        }
    }
}

/// One output row of the CSV report. Column order is append-only.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub website: String,
    pub industry: String,
    pub revenue_estimate: Option<f64>,
    pub revenue_confidence: Option<f64>,
    pub employee_count: Option<u32>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub review_count: Option<u32>,
    pub years_in_business: Option<u32>,
    pub source: String,
    pub status: String,
    pub exclusion_reason: String,
    pub warnings: String,
    pub score: Option<u32>,
    pub website_verified: String,
    pub input_error: String,
}

impl From<&BusinessRecord> for ReportRow {
    fn from(record: &BusinessRecord) -> Self {
        ReportRow {
            name: record.name.clone(),
            website: record.website.clone().unwrap_or_default(),
            industry: record.industry.clone(),
            revenue_estimate: record.revenue_estimate,
            revenue_confidence: record.revenue_confidence,
            employee_count: record.employee_count,
            city: record.city.clone(),
            province: record.province.clone(),
            postal_code: record.postal_code.clone().unwrap_or_default(),
            review_count: record.review_count,
            years_in_business: record.years_in_business,
            source: record.source.clone().unwrap_or_default(),
            status: record.status.to_string(),
            exclusion_reason: record.exclusion_reason.clone().unwrap_or_default(),
            warnings: record.warnings.join("; "),
            score: record.score,
            website_verified: match record.website_check {
                Some(check) => check.is_verified().to_string(),
                None => String::new(),
            },
            input_error: record.input_error.clone().unwrap_or_default(),
        }
    }
}

/// Aggregate counts over a finalised batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub qualified: usize,
    pub review: usize,
    pub excluded: usize,
    pub malformed: usize,
    /// Exclusion counts keyed by the reason category (text before the first `:`)
    pub exclusions_by_category: BTreeMap<String, usize>,
    pub warnings_by_code: BTreeMap<String, usize>,
}

impl BatchStats {
    /// Share of well-formed records that qualified
    pub fn qualification_rate(&self) -> f64 {
        let evaluated = self.total - self.malformed;
        if evaluated == 0 {
            0.0
        } else {
            self.qualified as f64 / evaluated as f64
        }
    }
}

/// Finalised result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub policy_version: String,
    pub generated_at: String,
    pub records: Vec<BusinessRecord>,
    pub stats: BatchStats,
}
