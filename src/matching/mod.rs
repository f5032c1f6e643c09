//! Best-match selection over the reference marking database.
//!
//! Every active marking is scored against the OCR text with
//! [`text_similarity`](crate::similarity::text_similarity). A candidate survives
//! only if it clears its own `min_similarity`, so markings with stricter
//! thresholds are harder to match at the same raw score. Survivors are ranked by
//! similarity (ties broken by marking id) and split into the best match plus up
//! to [`MAX_ALTERNATIVES`](crate::constants::MAX_ALTERNATIVES) alternatives.

pub mod matcher;
pub mod types;


pub use matcher::find_best_match;
pub use types::{
    AlternativeMatch, MarkingId, MatchCandidate, MatchReason, MatchResult, ReferenceMarking,
};
