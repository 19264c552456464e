//! Scoring and Qualification
//!
//! Weighted 100-point score over populated fields, then the verdict:
//! - EXCLUDED: a hard filter fired
//! - REVIEW: carries an always-review warning, or scored below threshold
//! - QUALIFIED: everything else
//!
//! Components (default weights):
//! - Revenue fit (35): closeness to the midpoint of the revenue band, scaled by confidence
//! - Tenure (20): years in business up to `full_tenure_years`
//! - Completeness (25): share of optional fields populated
//! - Verified website (10)
//! - Engagement (10): some reviews, but not a high-visibility brand

use crate::config::PolicyConfig;
use crate::normalize::completeness;
use crate::types::{warning_code, BusinessRecord, RecordStatus};

/// Optional fields counted by the completeness component
const COMPLETENESS_FIELDS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub revenue_fit: f64,
    pub tenure: f64,
    pub completeness: f64,
    pub website: f64,
    pub engagement: f64,
}

impl ScoreBreakdown {
    /// Rounded total on the 100-point scale
    pub fn total(&self) -> u32 {
        let sum = self.revenue_fit + self.tenure + self.completeness + self.website + self.engagement;
        sum.round().clamp(0.0, 100.0) as u32
    }
}

pub fn calculate_score(record: &BusinessRecord, policy: &PolicyConfig) -> ScoreBreakdown {
    let weights = &policy.scoring;

    let revenue_fit = match record.revenue_estimate {
        Some(revenue) => {
            let confidence = record
                .revenue_confidence
                .unwrap_or(weights.default_revenue_confidence)
                .clamp(0.0, 1.0);
            weights.revenue_fit as f64
                * revenue_closeness(revenue, policy.min_revenue, policy.max_revenue)
                * confidence
        }
        None => 0.0,
    };

    let tenure = match record.years_in_business {
        Some(years) if weights.full_tenure_years == 0 => {
            if years > 0 {
                weights.years_in_business as f64
            } else {
                0.0
            }
        }
        Some(years) => {
            let ratio = years.min(weights.full_tenure_years) as f64 / weights.full_tenure_years as f64;
            weights.years_in_business as f64 * ratio
        }
        None => 0.0,
    };

    let completeness =
        weights.completeness as f64 * completeness(record) as f64 / COMPLETENESS_FIELDS;

    let website = match record.website_check {
        Some(check) if check.is_verified() => weights.verified_website as f64,
        _ => 0.0,
    };

    let engagement = match record.review_count {
        Some(0) | None => 0.0,
        Some(reviews) if reviews > policy.warnings.high_visibility_reviews => {
            weights.engagement as f64 / 2.0
        }
        Some(_) => weights.engagement as f64,
    };

    ScoreBreakdown {
        revenue_fit,
        tenure,
        completeness,
        website,
        engagement,
    }
}

/// 1.0 at the midpoint of `[min, max]`, falling linearly to 0.0 at either bound
pub fn revenue_closeness(revenue: f64, min: f64, max: f64) -> f64 {
    let midpoint = (min + max) / 2.0;
    let half_width = (max - min) / 2.0;
    if half_width <= 0.0 {
        return if (revenue - midpoint).abs() < f64::EPSILON { 1.0 } else { 0.0 };
    }
    (1.0 - (revenue - midpoint).abs() / half_width).clamp(0.0, 1.0)
}

/// Final verdict for a record whose filters and warnings are settled
pub fn determine_verdict(record: &BusinessRecord, score: u32, policy: &PolicyConfig) -> RecordStatus {
    if record.is_excluded() {
        return RecordStatus::Excluded;
    }

    let needs_review = record.warnings.iter().any(|w| {
        let code = warning_code(w);
        policy.scoring.always_review.iter().any(|r| r.eq_ignore_ascii_case(code))
    });
    if needs_review {
        return RecordStatus::Review;
    }

    if score >= policy.scoring.qualification_threshold {
        RecordStatus::Qualified
    } else {
        RecordStatus::Review
    }
}
