//! Pipeline Orchestrator
//!
//! Runs a batch of candidate records through the hard filters, the website
//! verifier, the warning generator and scoring, and aggregates the results.
//!
//! - The policy is validated once, before any record is touched
//! - Records are independent; website probes run with bounded concurrency
//! - A failing record ends up `Malformed`, never aborts the batch

use crate::config::PolicyConfig;
use crate::error::{ConfigError, RecordError};
use crate::filter::run_filters;
use crate::link_health::{unverified_warning, WebsiteProbe};
use crate::scoring::{calculate_score, determine_verdict};
use crate::types::{warning_code, BatchReport, BatchStats, BusinessRecord, RecordStatus};
use crate::warnings::generate_warnings;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Pipeline {
    policy: Arc<PolicyConfig>,
    probe: Arc<dyn WebsiteProbe>,
}

impl Pipeline {
    /// Build a pipeline, failing fast on an invalid policy
    pub fn new(policy: PolicyConfig, probe: Arc<dyn WebsiteProbe>) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Pipeline {
            policy: Arc::new(policy),
            probe,
        })
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Evaluate every record and produce the batch report.
    ///
    /// Output order matches input order.
    pub async fn run_batch(&self, records: Vec<BusinessRecord>) -> BatchReport {
        info!(
            records = records.len(),
            policy = %self.policy.version,
            max_concurrent = self.policy.verifier.max_concurrent,
            "starting batch"
        );

        let results: Vec<BusinessRecord> = stream::iter(records.into_iter().map(|record| {
            let policy = Arc::clone(&self.policy);
            let probe = Arc::clone(&self.probe);
            let fallback = record.clone();
            async move {
                let handle = tokio::spawn(async move {
                    process_record(record, &policy, probe.as_ref()).await
                });
                match handle.await {
                    Ok(done) => done,
                    Err(e) => {
                        warn!(name = %fallback.name, error = %e, "record processing aborted");
                        let mut failed = fallback;
                        failed.reset_derived();
                        failed.status = RecordStatus::Malformed;
                        failed.input_error = Some(format!("processing failed: {}", e));
                        failed
                    }
                }
            }
        }))
        .buffered(self.policy.verifier.max_concurrent)
        .collect()
        .await;

        finish_batch(results, &self.policy)
    }
}

/// Filter, probe and finalise one record
pub async fn process_record(
    mut record: BusinessRecord,
    policy: &PolicyConfig,
    probe: &dyn WebsiteProbe,
) -> BusinessRecord {
    record.website_check = None;

    // Only records that survive the hard filters are worth a network call
    let mut screened = record.clone();
    evaluate_record(&mut screened, policy);
    if matches!(screened.status, RecordStatus::Excluded | RecordStatus::Malformed) {
        return screened;
    }

    if let Some(url) = record.website_url().map(str::to_string) {
        let check = probe.probe(&url).await;
        if !check.is_verified() {
            warn!(name = %record.name, url = %url, result = %check, "website did not verify");
        }
        record.website_check = Some(check);
    }

    evaluate_record(&mut record, policy);
    record
}

/// Apply every rule to a record using its stored website check.
///
/// Resets derived fields first, so running it again on a finalised record
/// yields the same status, reason, warnings and score.
pub fn evaluate_record(record: &mut BusinessRecord, policy: &PolicyConfig) {
    record.reset_derived();

    if let Err(e) = validate_record(record) {
        warn!(name = %record.name, error = %e, "malformed input record");
        record.status = RecordStatus::Malformed;
        record.input_error = Some(format!("Malformed input: {}", e));
        return;
    }

    let mut warnings = run_filters(record, policy);
    if record.is_excluded() {
        return;
    }

    warnings.extend(generate_warnings(record, policy));
    if let (Some(url), Some(check)) = (record.website_url(), record.website_check) {
        if let Some(w) = unverified_warning(url, &check) {
            warnings.push(w);
        }
    }
    record.warnings = warnings;

    let score = calculate_score(record, policy).total();
    record.score = Some(score);
    record.status = determine_verdict(record, score, policy);
    debug!(name = %record.name, status = %record.status, score, "record finalised");
}

/// Reject records that cannot be evaluated at all
pub fn validate_record(record: &BusinessRecord) -> Result<(), RecordError> {
    if record.name.trim().is_empty() {
        return Err(RecordError::MissingName);
    }
    if !record.invalid_fields.is_empty() {
        return Err(RecordError::UnreadableFields(record.invalid_fields.join(", ")));
    }
    if let Some(revenue) = record.revenue_estimate {
        if !revenue.is_finite() {
            return Err(RecordError::InvalidRevenue(revenue));
        }
        if revenue < 0.0 {
            return Err(RecordError::NegativeRevenue(revenue));
        }
    }
    if let Some(confidence) = record.revenue_confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(RecordError::ConfidenceOutOfRange(confidence));
        }
    }
    Ok(())
}

/// Re-run stored records under another policy.
///
/// Stored website checks are reused. A record that was never probed (it was
/// excluded under the policy that produced the batch) is probed now if it
/// survives the hard filters, so the result matches a fresh run.
pub async fn reevaluate_batch(
    records: Vec<BusinessRecord>,
    policy: &PolicyConfig,
    probe: &dyn WebsiteProbe,
) -> Result<BatchReport, ConfigError> {
    policy.validate()?;
    let records: Vec<BusinessRecord> = stream::iter(records.into_iter().map(move |mut record| async move {
        if record.website_check.is_none() && record.website_url().is_some() {
            process_record(record, policy, probe).await
        } else {
            evaluate_record(&mut record, policy);
            record
        }
    }))
    .buffered(policy.verifier.max_concurrent)
    .collect()
    .await;
    Ok(finish_batch(records, policy))
}

fn finish_batch(records: Vec<BusinessRecord>, policy: &PolicyConfig) -> BatchReport {
    let stats = compute_stats(&records);
    info!(
        total = stats.total,
        qualified = stats.qualified,
        review = stats.review,
        excluded = stats.excluded,
        malformed = stats.malformed,
        "batch finished"
    );

    BatchReport {
        policy_version: policy.version.clone(),
        generated_at: Utc::now().to_rfc3339(),
        records,
        stats,
    }
}

/// Reduce finalised records into batch counts
pub fn compute_stats(records: &[BusinessRecord]) -> BatchStats {
    let mut stats = BatchStats {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        match record.status {
            RecordStatus::Qualified => stats.qualified += 1,
            RecordStatus::Review => stats.review += 1,
            RecordStatus::Excluded => stats.excluded += 1,
            RecordStatus::Malformed => stats.malformed += 1,
            RecordStatus::Pending => {}
        }

        if let Some(reason) = &record.exclusion_reason {
            let category = warning_code(reason).to_string();
            *stats.exclusions_by_category.entry(category).or_insert(0) += 1;
        }
        for warning in &record.warnings {
            *stats
                .warnings_by_code
                .entry(warning_code(warning).to_string())
                .or_insert(0) += 1;
        }
    }

    stats
}
