use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a reference (OEM) marking.
pub type MarkingId = Uuid;

/// The slice of a reference marking the matcher needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceMarking {
    /// Marking identifier.
    pub id: MarkingId,
    /// Canonical marking text of the genuine part.
    pub reference_text: String,
    /// Per-marking acceptance threshold in `(0, 1]`.
    pub min_similarity: f64,
    /// Inactive markings never match.
    pub is_active: bool,
}

/// A marking that cleared its own threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    /// The matched reference marking.
    pub reference: ReferenceMarking,
    /// Similarity between the OCR text and the reference text.
    pub similarity: f64,
}

/// Why an alternative was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    TextSimilarity,
}

/// A runner-up candidate recorded beside the best match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeMatch {
    pub oem_id: MarkingId,
    pub similarity: f64,
    pub reason: MatchReason,
}

/// Outcome of matching one OCR reading against the reference database.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Highest-ranked marking that cleared its threshold.
    pub best_match: Option<ReferenceMarking>,
    /// Similarity of `best_match`, or `0.0` when there is none.
    pub similarity: f64,
    /// Up to four runners-up, best first, never containing `best_match`.
    pub alternatives: Vec<AlternativeMatch>,
}

impl MatchResult {
    /// A result with no match, zero similarity and no alternatives.
    pub fn no_match() -> Self {
        Self {
            best_match: None,
            similarity: 0.0,
            alternatives: Vec::new(),
        }
    }

    /// Returns the best match's id, if any.
    pub fn best_match_id(&self) -> Option<MarkingId> {
        self.best_match.as_ref().map(|m| m.id)
    }

    /// Returns `true` if some marking cleared its threshold.
    pub fn is_match(&self) -> bool {
        self.best_match.is_some()
    }
}
