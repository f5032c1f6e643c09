use tracing::debug;

use crate::constants::POOR_OCR_CONFIDENCE;

use super::types::{Classification, ClassificationResult, Flag, Recommendation, RiskLevel};

/// When a rule fires. Thresholds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// `similarity >= similarity && ocr_confidence >= ocr_confidence`.
    AtLeast { similarity: f64, ocr_confidence: f64 },
    /// `similarity < threshold`, regardless of OCR confidence.
    SimilarityBelow(f64),
    /// Always fires.
    Otherwise,
}

impl Condition {
    pub fn matches(&self, similarity: f64, ocr_confidence: f64) -> bool {
        match *self {
            Condition::AtLeast {
                similarity: min_similarity,
                ocr_confidence: min_ocr,
            } => similarity >= min_similarity && ocr_confidence >= min_ocr,
            Condition::SimilarityBelow(threshold) => similarity < threshold,
            Condition::Otherwise => true,
        }
    }
}

/// How a rule derives the verdict's confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidenceFormula {
    /// `min(similarity, ocr_confidence)`
    Min,
    /// `(similarity + ocr_confidence) / 2`
    Mean,
    /// `1 - similarity`
    InverseSimilarity,
    Fixed(f64),
}

impl ConfidenceFormula {
    pub fn apply(&self, similarity: f64, ocr_confidence: f64) -> f64 {
        match *self {
            ConfidenceFormula::Min => similarity.min(ocr_confidence),
            ConfidenceFormula::Mean => (similarity + ocr_confidence) / 2.0,
            ConfidenceFormula::InverseSimilarity => 1.0 - similarity,
            ConfidenceFormula::Fixed(value) => value,
        }
    }
}

/// One row of the decision table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub condition: Condition,
    pub classification: Classification,
    pub confidence: ConfidenceFormula,
    pub risk_level: RiskLevel,
    pub reasoning: &'static str,
    pub flag: Option<Flag>,
    pub recommendation: Option<Recommendation>,
}

impl Rule {
    fn verdict(&self, similarity: f64, ocr_confidence: f64) -> ClassificationResult {
        ClassificationResult {
            classification: self.classification,
            confidence: self.confidence.apply(similarity, ocr_confidence),
            reasoning: self.reasoning.to_string(),
            risk_level: self.risk_level,
            flags: self.flag.into_iter().collect(),
            recommendations: self.recommendation.into_iter().collect(),
        }
    }
}

/// Primary rules in evaluation order.
pub static RULES: [Rule; 4] = [
    Rule {
        name: "strong_match",
        condition: Condition::AtLeast {
            similarity: 0.95,
            ocr_confidence: 0.8,
        },
        classification: Classification::Genuine,
        confidence: ConfidenceFormula::Min,
        risk_level: RiskLevel::Low,
        reasoning: "High similarity match with OEM reference and good OCR confidence",
        flag: None,
        recommendation: None,
    },
    Rule {
        name: "good_match",
        condition: Condition::AtLeast {
            similarity: 0.85,
            ocr_confidence: 0.7,
        },
        classification: Classification::Genuine,
        confidence: ConfidenceFormula::Mean,
        risk_level: RiskLevel::Low,
        reasoning: "Good similarity match with OEM reference",
        flag: Some(Flag::ModerateMatch),
        recommendation: None,
    },
    Rule {
        name: "moderate_match",
        condition: Condition::AtLeast {
            similarity: 0.70,
            ocr_confidence: 0.6,
        },
        classification: Classification::Suspicious,
        confidence: ConfidenceFormula::Mean,
        risk_level: RiskLevel::Medium,
        reasoning: "Moderate similarity match - requires human verification",
        flag: Some(Flag::LowSimilarity),
        recommendation: Some(Recommendation::HumanVerification),
    },
    Rule {
        name: "no_match",
        condition: Condition::SimilarityBelow(0.50),
        classification: Classification::Fake,
        confidence: ConfidenceFormula::InverseSimilarity,
        risk_level: RiskLevel::High,
        reasoning: "Low similarity to any known OEM marking",
        flag: Some(Flag::NoMatch),
        recommendation: Some(Recommendation::RejectComponent),
    },
];

/// Fires when none of [`RULES`] does.
pub static FALLBACK_RULE: Rule = Rule {
    name: "inconclusive",
    condition: Condition::Otherwise,
    classification: Classification::Inconclusive,
    confidence: ConfidenceFormula::Fixed(0.5),
    risk_level: RiskLevel::Medium,
    reasoning: "Unable to determine authenticity with confidence",
    flag: Some(Flag::UnclearMarking),
    recommendation: Some(Recommendation::HumanVerification),
};

/// Returns the first rule whose condition holds.
pub fn matching_rule(similarity: f64, ocr_confidence: f64) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| rule.condition.matches(similarity, ocr_confidence))
        .unwrap_or(&FALLBACK_RULE)
}

/// Classifies a `(similarity, ocr_confidence)` pair, both expected in `[0, 1]`.
///
/// Range checking is the caller's job; the OCR client rejects out-of-range
/// confidences before they get here.
pub fn classify(similarity: f64, ocr_confidence: f64) -> ClassificationResult {
    let rule = matching_rule(similarity, ocr_confidence);
    let mut result = rule.verdict(similarity, ocr_confidence);

    if ocr_confidence < POOR_OCR_CONFIDENCE {
        result.flags.insert(Flag::PoorOcrQuality);
        result.recommendations.insert(Recommendation::RetakeImage);
    }

    debug!(
        rule = rule.name,
        similarity,
        ocr_confidence,
        classification = %result.classification,
        confidence = result.confidence,
        "Inspection classified"
    );

    result
}
