use acquisition_leads::link_health::{HttpProbe, WebsiteProbe};
use acquisition_leads::normalize::deduplicate_records;
use acquisition_leads::pipeline::{reevaluate_batch, Pipeline};
use acquisition_leads::report::generate_summary_report;
use acquisition_leads::storage;
use acquisition_leads::BatchReport;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,acquisition_leads=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root = std::env::var("ROOT").unwrap_or_else(|_| ".".to_string());
    let version = std::env::var("POLICY_VERSION").ok().filter(|v| !v.trim().is_empty());
    let reevaluate = std::env::var("REEVALUATE").map(|v| v == "1").unwrap_or(false);

    let policy = storage::load_policy(&root, version.as_deref())?;
    info!(version = %policy.version, "policy loaded");

    let probe: Arc<dyn WebsiteProbe> = Arc::new(HttpProbe::new(&policy.verifier));

    let report: BatchReport = if reevaluate {
        // Re-run a saved batch, probing only sites that were never checked
        let previous = storage::load_batch(&root)?;
        info!(
            records = previous.records.len(),
            from = %previous.policy_version,
            to = %policy.version,
            "re-evaluating saved batch"
        );
        reevaluate_batch(previous.records, &policy, probe.as_ref())
            .await
            .context("Invalid policy")?
    } else {
        let candidates = storage::load_candidates(&root)?;
        let (candidates, dedup) = deduplicate_records(candidates);
        info!(
            input = dedup.total_input,
            unique = dedup.unique_output,
            duplicates = dedup.duplicates_removed,
            "candidates loaded"
        );

        let pipeline = Pipeline::new(policy, probe).context("Invalid policy")?;
        pipeline.run_batch(candidates).await
    };

    storage::save_report_csv(&root, &report)?;
    storage::save_batch(&root, &report)?;
    storage::save_summary(&root, &generate_summary_report(&report))?;

    info!(
        qualified = report.stats.qualified,
        review = report.stats.review,
        excluded = report.stats.excluded,
        malformed = report.stats.malformed,
        "reports written to {}/tracking",
        root
    );

    Ok(())
}
