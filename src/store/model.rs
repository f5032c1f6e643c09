//! Reference (OEM) marking records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MIN_SIMILARITY, MAX_NOTES_LEN, MIN_SIMILARITY_FLOOR};
use crate::matching::{MarkingId, ReferenceMarking};

use super::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PackageType {
    Bga,
    Qfp,
    Soic,
    Tssop,
    Lqfp,
    Dfn,
    Qfn,
    Sop,
    Ssop,
    Plcc,
    Dip,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Microcontroller,
    Memory,
    Processor,
    Analog,
    Power,
    Interface,
    Logic,
    Sensor,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingFormat {
    Alphanumeric,
    Numeric,
    Mixed,
    #[serde(rename = "logo+text")]
    LogoText,
    QrCode,
    Barcode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingFont {
    #[default]
    LaserEtched,
    InkPrinted,
    Embossed,
    ScreenPrinted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingSize {
    VerySmall,
    #[default]
    Small,
    Medium,
    Large,
}

fn default_lines() -> u8 {
    1
}

/// The printed marking on the package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<MarkingFormat>,
    #[serde(default = "default_lines")]
    pub lines: u8,
    #[serde(default)]
    pub font: MarkingFont,
    #[serde(default)]
    pub size: MarkingSize,
}

fn default_min_similarity() -> f64 {
    DEFAULT_MIN_SIMILARITY
}

/// Matching constraints attached to a marking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    #[serde(default)]
    pub required_elements: Vec<String>,
    #[serde(default)]
    pub forbidden_elements: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            required_elements: Vec::new(),
            forbidden_elements: Vec::new(),
            case_sensitive: false,
        }
    }
}

/// How a human verification judged a matched marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageOutcome {
    CorrectDetection,
    FalsePositive,
    FalseNegative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub times_used: u64,
    pub correct_detections: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn record(&mut self, outcome: UsageOutcome, at: DateTime<Utc>) {
        self.times_used += 1;
        match outcome {
            UsageOutcome::CorrectDetection => self.correct_detections += 1,
            UsageOutcome::FalsePositive => self.false_positives += 1,
            UsageOutcome::FalseNegative => self.false_negatives += 1,
        }
        self.last_used = Some(at);
    }

    /// Correct detections as a percentage of judged uses, rounded to two
    /// decimals. `100.0` before any judgement.
    pub fn accuracy_rate(&self) -> f64 {
        let judged = self.correct_detections + self.false_positives + self.false_negatives;
        if judged == 0 {
            return 100.0;
        }
        round2(self.correct_detections as f64 / judged as f64 * 100.0)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A genuine reference marking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OemMarking {
    pub id: MarkingId,
    pub ic_part_number: String,
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub package_type: PackageType,
    pub category: Category,
    pub marking: MarkingText,
    #[serde(default)]
    pub validation_rules: ValidationRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
    #[serde(default)]
    pub stats: UsageStats,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OemMarking {
    /// Builds a new active marking from a validated draft.
    pub fn from_draft(draft: MarkingDraft, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: MarkingId::new_v4(),
            ic_part_number: draft.ic_part_number,
            manufacturer: draft.manufacturer,
            series: draft.series,
            package_type: draft.package_type,
            category: draft.category,
            marking: draft.marking,
            validation_rules: draft.validation_rules,
            notes: draft.notes,
            tags: draft.tags,
            is_active: true,
            stats: UsageStats::default(),
            created_by: created_by.to_string(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields, keeping identity, stats and creation audit.
    pub fn apply_draft(&mut self, draft: MarkingDraft, updated_by: &str, now: DateTime<Utc>) {
        self.ic_part_number = draft.ic_part_number;
        self.manufacturer = draft.manufacturer;
        self.series = draft.series;
        self.package_type = draft.package_type;
        self.category = draft.category;
        self.marking = draft.marking;
        self.validation_rules = draft.validation_rules;
        self.notes = draft.notes;
        self.tags = draft.tags;
        self.updated_by = Some(updated_by.to_string());
        self.updated_at = now;
    }

    /// `"{manufacturer} {part number}"`
    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer, self.ic_part_number)
    }

    /// The view of this marking the matcher works on.
    pub fn reference(&self) -> ReferenceMarking {
        ReferenceMarking {
            id: self.id,
            reference_text: self.marking.text.clone(),
            min_similarity: self.validation_rules.min_similarity,
            is_active: self.is_active,
        }
    }

    pub(crate) fn same_identity(&self, manufacturer: &str, part_number: &str) -> bool {
        self.manufacturer.eq_ignore_ascii_case(manufacturer)
            && self.ic_part_number == part_number
    }
}

/// Marking as returned over the API, with derived fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingView {
    #[serde(flatten)]
    pub marking: OemMarking,
    pub accuracy_rate: f64,
    pub display_name: String,
}

impl From<OemMarking> for MarkingView {
    fn from(marking: OemMarking) -> Self {
        Self {
            accuracy_rate: marking.stats.accuracy_rate(),
            display_name: marking.display_name(),
            marking,
        }
    }
}

/// Editable fields of a marking, as submitted on create and update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingDraft {
    pub ic_part_number: String,
    pub manufacturer: String,
    #[serde(default)]
    pub series: Option<String>,
    pub package_type: PackageType,
    pub category: Category,
    pub marking: MarkingText,
    #[serde(default)]
    pub validation_rules: ValidationRules,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MarkingDraft {
    /// Trims and normalizes the draft, then checks field bounds.
    ///
    /// The part number is upper-cased. Every violated bound is reported, not
    /// just the first.
    pub fn validate(mut self) -> StoreResult<Self> {
        self.ic_part_number = self.ic_part_number.trim().to_uppercase();
        self.manufacturer = self.manufacturer.trim().to_string();
        self.marking.text = self.marking.text.trim().to_string();
        self.series = trimmed_non_empty(self.series);
        self.notes = trimmed_non_empty(self.notes);
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let mut problems = Vec::new();
        check_len(&mut problems, "IC part number", &self.ic_part_number, 3, 50);
        check_len(&mut problems, "Manufacturer name", &self.manufacturer, 2, 100);
        check_len(&mut problems, "Marking text", &self.marking.text, 1, 500);
        if let Some(series) = &self.series {
            check_len(&mut problems, "Series", series, 0, 50);
        }
        if let Some(notes) = &self.notes {
            check_len(&mut problems, "Notes", notes, 0, MAX_NOTES_LEN);
        }
        if !(1..=10).contains(&self.marking.lines) {
            problems.push("Marking lines must be between 1 and 10".to_string());
        }
        let min_similarity = self.validation_rules.min_similarity;
        if !min_similarity.is_finite() || !(MIN_SIMILARITY_FLOOR..=1.0).contains(&min_similarity) {
            problems.push(format!(
                "minSimilarity must be between {MIN_SIMILARITY_FLOOR} and 1.0"
            ));
        }

        if problems.is_empty() {
            Ok(self)
        } else {
            Err(StoreError::Validation(problems.join(", ")))
        }
    }
}

fn trimmed_non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_len(problems: &mut Vec<String>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min {
        problems.push(format!("{field} must be at least {min} characters long"));
    } else if len > max {
        problems.push(format!("{field} must be at most {max} characters long"));
    }
}
