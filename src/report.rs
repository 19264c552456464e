//! Batch Summary Report
//!
//! Renders a finalised batch as `summary.md`.
//!
//! Report structure:
//! - Summary counts and qualification rate
//! - Qualified leads, best score first
//! - Leads needing review with their warnings
//! - Exclusions by category, and malformed input

use crate::types::{BatchReport, BusinessRecord, RecordStatus};

pub fn generate_summary_report(report: &BatchReport) -> String {
    let stats = &report.stats;
    let mut out = String::from("# Acquisition Lead Report\n\n");
    out.push_str(&format!("Generated: {}\n", report.generated_at));
    out.push_str(&format!("Policy: {}\n\n", report.policy_version));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Total records: {}\n", stats.total));
    out.push_str(&format!("- **Qualified**: {}\n", stats.qualified));
    out.push_str(&format!("- Review: {}\n", stats.review));
    out.push_str(&format!("- Excluded: {}\n", stats.excluded));
    out.push_str(&format!("- Malformed input: {}\n", stats.malformed));
    out.push_str(&format!(
        "- Qualification rate: {:.1}%\n\n",
        stats.qualification_rate() * 100.0
    ));

    let mut qualified: Vec<&BusinessRecord> = with_status(report, RecordStatus::Qualified);
    qualified.sort_by(|a, b| b.score.cmp(&a.score));
    if !qualified.is_empty() {
        out.push_str("## Qualified\n\n");
        out.push_str("| Business | City | Industry | Score | Warnings |\n");
        out.push_str("|----------|------|----------|-------|----------|\n");
        for r in &qualified {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                truncate_text(&r.name, 40),
                r.city,
                truncate_text(&r.industry, 30),
                r.score.unwrap_or(0),
                codes_or_dash(r)
            ));
        }
        out.push('\n');
    }

    let review = with_status(report, RecordStatus::Review);
    if !review.is_empty() {
        out.push_str("## Needs Review\n\n");
        out.push_str("| Business | City | Score | Warnings |\n");
        out.push_str("|----------|------|-------|----------|\n");
        for r in &review {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                truncate_text(&r.name, 40),
                r.city,
                r.score.unwrap_or(0),
                codes_or_dash(r)
            ));
        }
        out.push('\n');
    }

    if !stats.exclusions_by_category.is_empty() {
        out.push_str("## Exclusions by Category\n\n");
        out.push_str("| Category | Count |\n");
        out.push_str("|----------|-------|\n");
        for (category, count) in &stats.exclusions_by_category {
            out.push_str(&format!("| {} | {} |\n", category, count));
        }
        out.push('\n');
    }

    let malformed = with_status(report, RecordStatus::Malformed);
    if !malformed.is_empty() {
        out.push_str("## Malformed Input\n\n");
        for r in &malformed {
            let name = if r.name.trim().is_empty() { "(unnamed)" } else { r.name.as_str() };
            out.push_str(&format!(
                "- {}: {}\n",
                name,
                r.input_error.as_deref().unwrap_or("-")
            ));
        }
        out.push('\n');
    }

    out
}

fn with_status(report: &BatchReport, status: RecordStatus) -> Vec<&BusinessRecord> {
    report.records.iter().filter(|r| r.status == status).collect()
}

fn codes_or_dash(record: &BusinessRecord) -> String {
    let codes = record.warning_codes();
    if codes.is_empty() {
        "-".to_string()
    } else {
        codes.join(", ")
    }
}

/// Truncate text for table cells
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        format!("{}...", text.chars().take(max_len - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compute_stats;

    fn report_with(records: Vec<BusinessRecord>) -> BatchReport {
        BatchReport {
            policy_version: "2025-q1".to_string(),
            generated_at: "2025-03-01T00:00:00Z".to_string(),
            stats: compute_stats(&records),
            records,
        }
    }

    #[test]
    fn test_generate_report_empty() {
        let report = generate_summary_report(&report_with(vec![]));
        assert!(report.contains("Total records: 0"));
        assert!(report.contains("Qualification rate: 0.0%"));
        assert!(!report.contains("## Qualified"));
    }

    #[test]
    fn test_report_sections() {
        let mut good = BusinessRecord::new("North Star Technical Inc", "Manufacturing", "Kitchener", "ON");
        good.status = RecordStatus::Qualified;
        good.score = Some(92);

        let mut flagged = BusinessRecord::new("Busy Fab", "Manufacturing", "Guelph", "ON");
        flagged.status = RecordStatus::Review;
        flagged.score = Some(70);
        flagged.warnings = vec![
            "HIGH_VISIBILITY: 76 reviews".to_string(),
            "VERIFY_SIZE: 20 employees".to_string(),
        ];

        let mut cafe = BusinessRecord::new("Harbour Cafe", "Cafe", "Kitchener", "ON");
        cafe.exclude("Non-target industry: Cafe".to_string());

        let mut unnamed = BusinessRecord::default();
        unnamed.status = RecordStatus::Malformed;
        unnamed.input_error = Some("Malformed input: missing business name".to_string());

        let report = generate_summary_report(&report_with(vec![good, flagged, cafe, unnamed]));
        assert!(report.contains("Policy: 2025-q1"));
        assert!(report.contains("| North Star Technical Inc | Kitchener | Manufacturing | 92 | - |"));
        assert!(report.contains("HIGH_VISIBILITY, VERIFY_SIZE"));
        assert!(report.contains("| Non-target industry | 1 |"));
        assert!(report.contains("- (unnamed): Malformed input: missing business name"));
        assert!(report.contains("Qualification rate: 33.3%"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Short", 10), "Short");
        assert_eq!(truncate_text("A very long business name", 10), "A very ...");
    }
}
