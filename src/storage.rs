use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Result, Context};
use tracing::{info, warn};

use crate::config::{PolicyConfig, LATEST_VERSION};
use crate::types::{BatchReport, BusinessRecord, CandidateRow, ReportRow};

const POLICY_FILE: &str = "config/policy.yaml";
const CANDIDATES_FILE: &str = "tracking/candidates.csv";
const REPORT_FILE: &str = "tracking/report.csv";
const BATCH_FILE: &str = "tracking/batch.json";
const SUMMARY_FILE: &str = "tracking/summary.md";

/// Load the active policy.
///
/// An explicitly requested builtin version wins over `config/policy.yaml`;
/// otherwise the file is used when present, and the latest builtin when not.
pub fn load_policy(root: &str, requested_version: Option<&str>) -> Result<PolicyConfig> {
    let path = PathBuf::from(root).join(POLICY_FILE);

    if let Some(version) = requested_version {
        if path.exists() {
            warn!(version, file = ?path, "policy version requested, ignoring policy file");
        }
        info!(version, "using builtin policy");
        return PolicyConfig::builtin(version)
            .with_context(|| format!("Unknown builtin policy version {:?}", version));
    }

    if !path.exists() {
        info!(version = LATEST_VERSION, "no policy file, using builtin policy");
        return Ok(PolicyConfig::builtin(LATEST_VERSION)?);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read policy from {:?}", path))?;

    let policy: PolicyConfig = serde_yaml::from_str(&content)
        .with_context(|| "Failed to parse policy YAML")?;

    Ok(policy)
}

/// Load candidate records from `tracking/candidates.csv`.
///
/// A row with an unparseable value is kept with the bad columns recorded, so
/// it reaches the report as malformed input. Only lines the CSV reader
/// cannot split at all are logged and skipped.
pub fn load_candidates(root: &str) -> Result<Vec<BusinessRecord>> {
    let path = PathBuf::from(root).join(CANDIDATES_FILE);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open candidates from {:?}", path))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {:?}", path))?
        .clone();

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = i + 2, error = %e, "skipping unreadable candidate row");
                continue;
            }
        };
        match row.deserialize::<CandidateRow>(Some(&headers)) {
            Ok(candidate) => records.push(BusinessRecord::from(candidate)),
            Err(e) => {
                let record = lenient_record(&headers, &row);
                warn!(
                    row = i + 2,
                    name = %record.name,
                    fields = ?record.invalid_fields,
                    error = %e,
                    "candidate row has unreadable fields"
                );
                records.push(record);
            }
        }
    }

    Ok(records)
}

/// Build a record column by column, noting every value that does not parse
fn lenient_record(headers: &csv::StringRecord, row: &csv::StringRecord) -> BusinessRecord {
    let text = |name: &str| column(headers, row, name).map(str::to_string);
    let mut invalid = Vec::new();

    let mut record = BusinessRecord {
        name: text("name").unwrap_or_default(),
        website: text("website"),
        industry: text("industry").unwrap_or_default(),
        revenue_estimate: parse_column(headers, row, "revenue_estimate", &mut invalid),
        revenue_confidence: parse_column(headers, row, "revenue_confidence", &mut invalid),
        employee_count: parse_column(headers, row, "employee_count", &mut invalid),
        city: text("city").unwrap_or_default(),
        province: text("province").unwrap_or_default(),
        postal_code: text("postal_code"),
        review_count: parse_column(headers, row, "review_count", &mut invalid),
        years_in_business: parse_column(headers, row, "years_in_business", &mut invalid),
        source: text("source"),
        ..Default::default()
    };

    record.invalid_fields = invalid;
    record
}

/// Non-blank value of a named column
fn column<'a>(headers: &csv::StringRecord, row: &'a csv::StringRecord, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_column<T: FromStr>(
    headers: &csv::StringRecord,
    row: &csv::StringRecord,
    name: &str,
    invalid: &mut Vec<String>,
) -> Option<T> {
    let value = column(headers, row, name)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            invalid.push(format!("{} = '{}'", name, value));
            None
        }
    }
}

/// Write the CSV report, one row per record
pub fn save_report_csv(root: &str, report: &BatchReport) -> Result<()> {
    let path = PathBuf::from(root).join(REPORT_FILE);
    ensure_parent(&path)?;

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create report at {:?}", path))?;
    for record in &report.records {
        writer
            .serialize(ReportRow::from(record))
            .context("Failed to write report row")?;
    }
    writer.flush()?;
    Ok(())
}

/// Save the finalised batch so it can be re-evaluated later
pub fn save_batch(root: &str, report: &BatchReport) -> Result<()> {
    let path = PathBuf::from(root).join(BATCH_FILE);
    ensure_parent(&path)?;
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write batch to {:?}", path))?;
    Ok(())
}

pub fn load_batch(root: &str) -> Result<BatchReport> {
    let path = PathBuf::from(root).join(BATCH_FILE);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read batch from {:?}", path))?;

    let report: BatchReport = serde_json::from_str(&content)
        .with_context(|| "Failed to parse batch JSON")?;

    Ok(report)
}

pub fn save_summary(root: &str, markdown: &str) -> Result<()> {
    let path = PathBuf::from(root).join(SUMMARY_FILE);
    ensure_parent(&path)?;
    fs::write(&path, markdown)
        .with_context(|| format!("Failed to write summary to {:?}", path))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    Ok(())
}
