use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Final authenticity verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Genuine,
    Fake,
    Suspicious,
    Inconclusive,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Genuine,
        Classification::Fake,
        Classification::Suspicious,
        Classification::Inconclusive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Genuine => "genuine",
            Classification::Fake => "fake",
            Classification::Suspicious => "suspicious",
            Classification::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown classification: {s}"))
    }
}

/// Risk attached to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Ordinal score (1 = low .. 4 = critical).
    pub fn score(&self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warning tag on a classification. Variant order is the serialized order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    ModerateMatch,
    LowSimilarity,
    NoMatch,
    UnclearMarking,
    PoorOcrQuality,
    AnalysisError,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::ModerateMatch => "moderate_match",
            Flag::LowSimilarity => "low_similarity",
            Flag::NoMatch => "no_match",
            Flag::UnclearMarking => "unclear_marking",
            Flag::PoorOcrQuality => "poor_ocr_quality",
            Flag::AnalysisError => "analysis_error",
        }
    }
}

/// Recommended follow-up action. Variant order is the serialized order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HumanVerification,
    RejectComponent,
    RetakeImage,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::HumanVerification => "human_verification",
            Recommendation::RejectComponent => "reject_component",
            Recommendation::RetakeImage => "retake_image",
        }
    }
}

/// Verdict persisted on an inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub classification: Classification,
    pub confidence: f64,
    pub reasoning: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub flags: BTreeSet<Flag>,
    #[serde(default)]
    pub recommendations: BTreeSet<Recommendation>,
}

impl ClassificationResult {
    /// Terminal verdict for an inspection whose pipeline failed.
    pub fn analysis_error() -> Self {
        Self {
            classification: Classification::Inconclusive,
            confidence: 0.0,
            reasoning: "Analysis failed due to technical error".to_string(),
            risk_level: RiskLevel::Medium,
            flags: BTreeSet::from([Flag::AnalysisError]),
            recommendations: BTreeSet::new(),
        }
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn has_recommendation(&self, recommendation: Recommendation) -> bool {
        self.recommendations.contains(&recommendation)
    }
}
