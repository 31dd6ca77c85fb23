//! Severity analysis for citizen reports.
//!
//! Turns a raw report into a score in [1, 5], a confidence in [0, 95], a reasoning sentence and
//! the list of factors that drove the score. The analyzer performs no I/O; the only
//! non-deterministic input is the [`ImageSeverityEstimator`] it was built with.
//!
//! Pipeline:
//! 1. base factors from the [`SeverityTable`] (plus the major-city impact bump)
//! 2. weighted base score, rounded
//! 3. description keyword adjustment in [-1, 1], then clamp to [1, 5]
//! 4. image boost (0, 0.5 or 1) when an image reference is present
//! 5. final clamp to [1, 5] and rounding

mod image;
mod keywords;
mod table;

pub use image::{
    estimator_from_env_value, FixedImageBoost, ImageBoost, ImageSeverityEstimator, NoImageBoost,
    RandomImageEstimator,
};
pub use keywords::{
    KeywordScan, HIGH_SEVERITY_KEYWORDS, LOW_SEVERITY_KEYWORDS, MEASUREMENT_WORDS,
    MEDIUM_SEVERITY_KEYWORDS,
};
pub use table::{
    CategoryRule, Escalation, FactorLevels, IssueRule, SeverityFactors, SeverityTable,
};

use crate::constants::{
    BASE_CONFIDENCE, DETAILED_DESCRIPTION_CHARS, DETAIL_CONFIDENCE_BONUS, IMAGE_CONFIDENCE_BONUS,
    IMPACT_WEIGHT, INFRASTRUCTURE_WEIGHT, MAX_CONFIDENCE, MAX_SEVERITY,
    MEASUREMENT_CONFIDENCE_BONUS, MIN_SEVERITY, PUBLIC_SAFETY_WEIGHT, URGENCY_WEIGHT,
    VERY_DETAILED_DESCRIPTION_CHARS,
};
use serde::Serialize;
use std::sync::Arc;

/// The analyzer's verdict for one report. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeverityAssessment {
    score: u8,
    confidence: u8,
    reasoning: String,
    factors: Vec<String>,
}

impl SeverityAssessment {
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Factor labels in detection order, without duplicates.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }
}

const PUBLIC_SAFETY_LABEL: &str = "Public Safety Risk";
const URGENCY_LABEL: &str = "Urgent Response Needed";
const INFRASTRUCTURE_LABEL: &str = "Infrastructure Impact";
const IMPACT_LABEL: &str = "High Community Impact";
const KEYWORDS_LABEL: &str = "Critical Keywords Detected";
const VISUAL_LABEL: &str = "Visual Severity Confirmed";
const STANDARD_LABEL: &str = "Standard Maintenance Issue";

/// A factor counts as elevated at or above this level.
const ELEVATED_FACTOR: u8 = 4;

#[derive(Clone, Debug)]
pub struct SeverityAnalyzer {
    table: Arc<SeverityTable>,
    image_estimator: Arc<dyn ImageSeverityEstimator>,
}

impl Default for SeverityAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(SeverityTable::builtin()), Arc::new(NoImageBoost))
    }
}

impl SeverityAnalyzer {
    pub fn new(
        table: Arc<SeverityTable>,
        image_estimator: Arc<dyn ImageSeverityEstimator>,
    ) -> Self {
        Self {
            table,
            image_estimator,
        }
    }

    pub fn table(&self) -> &SeverityTable {
        &self.table
    }

    /// Assess one report.
    ///
    /// Total over its inputs: blank text is the caller's concern and simply yields baseline
    /// factors here.
    pub fn analyze(
        &self,
        category: &str,
        specific_issue: &str,
        description: &str,
        region: &str,
        image_ref: Option<&str>,
    ) -> SeverityAssessment {
        let factors = self
            .table
            .factors_for(category, specific_issue, description, region);
        let description_lower = description.to_lowercase();

        let weighted = f64::from(factors.urgency) * URGENCY_WEIGHT
            + f64::from(factors.public_safety) * PUBLIC_SAFETY_WEIGHT
            + f64::from(factors.infrastructure) * INFRASTRUCTURE_WEIGHT
            + f64::from(factors.impact) * IMPACT_WEIGHT;

        let scan = keywords::scan(&description_lower);
        let keyword_adjustment = scan.adjustment();
        let base = clamp_score(weighted.round() + keyword_adjustment);

        let image_boost = image_ref
            .map(|r| self.image_estimator.estimate(r))
            .unwrap_or(ImageBoost::None)
            .value();

        let score = clamp_score(base + image_boost).round().max(f64::from(MIN_SEVERITY)) as u8;
        let confidence = confidence(description, &description_lower, image_ref.is_some());

        tracing::debug!(
            category,
            specific_issue,
            ?factors,
            weighted,
            keyword_adjustment,
            image_boost,
            score,
            confidence,
            "severity assessed"
        );

        SeverityAssessment {
            score,
            confidence,
            reasoning: reasoning(score, &factors, keyword_adjustment, image_boost),
            factors: factor_labels(&factors, keyword_adjustment, image_boost),
        }
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(f64::from(MIN_SEVERITY), f64::from(MAX_SEVERITY))
}

fn confidence(description: &str, description_lower: &str, has_image: bool) -> u8 {
    let length = description.chars().count();
    let mut confidence = BASE_CONFIDENCE;

    if length > DETAILED_DESCRIPTION_CHARS {
        confidence += DETAIL_CONFIDENCE_BONUS;
    }
    if length > VERY_DETAILED_DESCRIPTION_CHARS {
        confidence += DETAIL_CONFIDENCE_BONUS;
    }
    if has_image {
        confidence += IMAGE_CONFIDENCE_BONUS;
    }
    if keywords::mentions_measurement(description_lower) {
        confidence += MEASUREMENT_CONFIDENCE_BONUS;
    }

    confidence.min(MAX_CONFIDENCE)
}

fn reasoning(
    score: u8,
    factors: &SeverityFactors,
    keyword_adjustment: f64,
    image_boost: f64,
) -> String {
    let mut sentences = vec![format!("Severity score: {score}/5.")];

    if factors.public_safety >= ELEVATED_FACTOR {
        sentences.push("High public safety risk identified.".into());
    }
    if factors.urgency >= ELEVATED_FACTOR {
        sentences.push("Urgent attention required.".into());
    }
    if factors.infrastructure >= ELEVATED_FACTOR {
        sentences.push("Critical infrastructure impact.".into());
    }
    if keyword_adjustment > 0.0 {
        sentences.push("Description indicates high severity.".into());
    }
    if image_boost > 0.0 {
        sentences.push("Visual analysis confirms elevated severity.".into());
    }

    let priority = match score {
        0..=2 => "Low priority maintenance issue.",
        3 => "Standard priority for department review.",
        4 => "High priority requiring prompt attention.",
        _ => "Critical issue requiring immediate response.",
    };
    sentences.push(priority.into());

    sentences.join(" ")
}

fn factor_labels(
    factors: &SeverityFactors,
    keyword_adjustment: f64,
    image_boost: f64,
) -> Vec<String> {
    let detected = [
        (factors.public_safety >= ELEVATED_FACTOR, PUBLIC_SAFETY_LABEL),
        (factors.urgency >= ELEVATED_FACTOR, URGENCY_LABEL),
        (factors.infrastructure >= ELEVATED_FACTOR, INFRASTRUCTURE_LABEL),
        (factors.impact >= ELEVATED_FACTOR, IMPACT_LABEL),
        (keyword_adjustment > 0.0, KEYWORDS_LABEL),
        (image_boost > 0.0, VISUAL_LABEL),
    ];

    let mut labels: Vec<String> = Vec::new();
    for (present, label) in detected {
        if present && !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    if labels.is_empty() {
        labels.push(STANDARD_LABEL.to_string());
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SeverityAnalyzer {
        SeverityAnalyzer::default()
    }

    fn analyzer_with_boost(boost: ImageBoost) -> SeverityAnalyzer {
        SeverityAnalyzer::new(
            Arc::new(SeverityTable::builtin()),
            Arc::new(FixedImageBoost(boost)),
        )
    }

    #[test]
    fn test_traffic_signal_scenario() {
        let description = "signal broken, dangerous intersection";
        let a = analyzer().analyze(
            "Roads & Transport",
            "Traffic Signal Issue",
            description,
            "Giridih",
            None,
        );

        assert_eq!(a.score(), 5);
        // 37 characters, no image, no measurement words.
        assert_eq!(description.chars().count(), 37);
        assert_eq!(a.confidence(), 70);
        assert_eq!(
            a.factors(),
            [
                "Public Safety Risk",
                "Urgent Response Needed",
                "Infrastructure Impact",
                "High Community Impact",
                "Critical Keywords Detected",
            ]
        );
        assert_eq!(
            a.reasoning(),
            "Severity score: 5/5. High public safety risk identified. Urgent attention required. \
             Critical infrastructure impact. Description indicates high severity. \
             Critical issue requiring immediate response."
        );
    }

    #[test]
    fn test_unknown_category_is_standard_maintenance() {
        let a =
            analyzer().analyze("Street Dogs", "Stray dogs", "pack near market", "Giridih", None);
        // 2*0.3 + 2*0.35 + 2*0.2 + 2*0.15 = 2.0
        assert_eq!(a.score(), 2);
        assert_eq!(a.factors(), ["Standard Maintenance Issue"]);
        assert!(a.reasoning().ends_with("Low priority maintenance issue."));
    }

    #[test]
    fn test_low_keyword_only_matters_with_half_point_boost() {
        // 2.0 - 0.5 = 1.5 rounds back to 2
        let a = analyzer().analyze("Parks", "Bench", "small cosmetic scratch", "Giridih", None);
        assert_eq!(a.score(), 2);

        // With a 0.5 image boost: 1.5 + 0.5 = 2 versus 2 + 0.5 = 2.5 -> 3
        let moderate = analyzer_with_boost(ImageBoost::Moderate);
        let cleaning = moderate.analyze("Parks", "Bench", "needs cleaning", "Giridih", Some("img"));
        let fixing = moderate.analyze("Parks", "Bench", "needs fixing", "Giridih", Some("img"));
        assert_eq!(cleaning.score(), 2);
        assert_eq!(fixing.score(), 3);
    }

    #[test]
    fn test_half_point_adjustment_rounds_up() {
        // Water leakage: 2*0.3 + 2*0.35 + 4*0.2 + 4*0.15 = 2.7 -> 3; "dirty" adds 0.5 -> 3.5 -> 4
        let a =
            analyzer().analyze("Water Supply", "Water Leakage", "dirty puddle", "Giridih", None);
        assert_eq!(a.score(), 4);
        assert!(a.factors().iter().any(|f| f == "Critical Keywords Detected"));
        assert!(a.reasoning().contains("Description indicates high severity."));
    }

    #[test]
    fn test_image_boost_applies_and_is_reported() {
        let a = analyzer_with_boost(ImageBoost::High).analyze(
            "Water Supply",
            "Water Leakage",
            "puddle forming",
            "Giridih",
            Some("https://img.example/1.jpg"),
        );
        // base 3 + 1
        assert_eq!(a.score(), 4);
        assert_eq!(a.confidence(), 85);
        assert!(a.factors().iter().any(|f| f == "Visual Severity Confirmed"));
        assert!(a
            .reasoning()
            .contains("Visual analysis confirms elevated severity."));
    }

    #[test]
    fn test_image_boost_ignored_without_image() {
        let a = analyzer_with_boost(ImageBoost::High).analyze(
            "Water Supply",
            "Water Leakage",
            "puddle forming",
            "Giridih",
            None,
        );
        assert_eq!(a.score(), 3);
        assert_eq!(a.confidence(), 70);
    }

    #[test]
    fn test_confidence_bonuses_and_cap() {
        let long = "x".repeat(101);
        let a = analyzer().analyze("Parks", "Bench", &long, "Giridih", None);
        assert_eq!(a.confidence(), 80);

        let longer = format!("{} about 3 feet wide", "x".repeat(220));
        let b = analyzer().analyze("Parks", "Bench", &longer, "Giridih", Some("img"));
        // 70 + 10 + 10 + 15 + 5 = 110, capped
        assert_eq!(b.confidence(), 95);
    }

    #[test]
    fn test_high_keyword_never_decreases_score() {
        let cases = [
            ("Roads & Transport", "Pothole", "small dip near the gate"),
            ("Water Supply", "Water Leakage", "dirty water pooling"),
            ("Waste Management", "Littering", "needs cleaning"),
            ("Parks", "Bench", "cosmetic scratch"),
            ("Public Facilities", "Missing Manhole Cover", "open hole"),
        ];
        for (category, issue, description) in cases {
            let without = analyzer().analyze(category, issue, description, "Giridih", None);
            let with = analyzer().analyze(
                category,
                issue,
                &format!("{description} urgent"),
                "Giridih",
                None,
            );
            assert!(
                with.score() >= without.score(),
                "{category}/{issue}: {} < {}",
                with.score(),
                without.score()
            );
        }
    }

    #[test]
    fn test_identical_input_gives_identical_assessment() {
        let run = || {
            analyzer_with_boost(ImageBoost::Moderate).analyze(
                "Roads & Transport",
                "Pothole",
                "deep pothole, 2 feet wide",
                "Dhanbad",
                Some("img-1"),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_score_and_confidence_stay_in_range() {
        let categories = [
            "Roads & Transport",
            "Water Supply",
            "Waste Management",
            "Public Facilities",
            "Other",
        ];
        let issues = [
            "Pothole",
            "Traffic Signal Issue",
            "No Water Supply",
            "Contaminated Water",
            "Overflowing Dustbin",
            "Electrical Issues",
            "Missing Manhole Cover",
            "Vandalism",
        ];
        let descriptions = [
            "small cosmetic maintenance",
            "urgent dangerous major deep leak",
            "dirty",
            "fine",
        ];
        let boosts = [ImageBoost::None, ImageBoost::Moderate, ImageBoost::High];

        for category in categories {
            for issue in issues {
                for description in descriptions {
                    for boost in boosts {
                        let a = analyzer_with_boost(boost).analyze(
                            category,
                            issue,
                            description,
                            "Bokaro",
                            Some("img"),
                        );
                        assert!((1..=5).contains(&a.score()));
                        assert!(a.confidence() <= 95);
                        assert!(!a.factors().is_empty());
                    }
                }
            }
        }
    }
}
