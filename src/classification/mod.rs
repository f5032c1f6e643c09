//! Authenticity classification from match similarity and OCR confidence.
//!
//! The verdict comes from an ordered decision table ([`rules::RULES`]) evaluated
//! top to bottom, first match wins, with [`rules::FALLBACK_RULE`] absorbing
//! everything else. A poor-OCR post-check then appends its flag and
//! recommendation on top of whatever rule fired.
//!
//! The fallback band is wide: a strong text match read with low OCR confidence
//! (e.g. similarity `0.86`, OCR `0.5`) lands there too. That is the established
//! behaviour and is kept as-is.

pub mod rules;
pub mod types;


pub use rules::{ConfidenceFormula, Condition, FALLBACK_RULE, RULES, Rule, classify, matching_rule};
pub use types::{Classification, ClassificationResult, Flag, Recommendation, RiskLevel};
