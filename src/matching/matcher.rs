use std::cmp::Ordering;

use tracing::debug;

use crate::constants::MAX_ALTERNATIVES;
use crate::similarity::text_similarity;

use super::types::{AlternativeMatch, MatchCandidate, MatchReason, MatchResult, ReferenceMarking};

/// Matches OCR text against every active reference marking.
///
/// Empty or whitespace-only text short-circuits to [`MatchResult::no_match`]
/// without scoring anything. Otherwise all active markings are scored; there is
/// no early exit. Inactive markings are skipped even if the caller passes them.
pub fn find_best_match<'a, I>(extracted_text: &str, markings: I) -> MatchResult
where
    I: IntoIterator<Item = &'a ReferenceMarking>,
{
    if extracted_text.trim().is_empty() {
        debug!("Empty OCR text, skipping reference comparison");
        return MatchResult::no_match();
    }

    let mut scanned = 0usize;
    let mut candidates: Vec<MatchCandidate> = markings
        .into_iter()
        .filter(|marking| marking.is_active)
        .filter_map(|marking| {
            scanned += 1;
            let similarity = text_similarity(extracted_text, &marking.reference_text);
            (similarity >= marking.min_similarity).then(|| MatchCandidate {
                reference: marking.clone(),
                similarity,
            })
        })
        .collect();

    candidates.sort_by(rank);

    debug!(
        scanned,
        accepted = candidates.len(),
        "Reference scan complete"
    );

    let mut ranked = candidates.into_iter();
    let Some(best) = ranked.next() else {
        return MatchResult::no_match();
    };

    let alternatives = ranked
        .take(MAX_ALTERNATIVES)
        .map(|candidate| AlternativeMatch {
            oem_id: candidate.reference.id,
            similarity: candidate.similarity,
            reason: MatchReason::TextSimilarity,
        })
        .collect();

    MatchResult {
        best_match: Some(best.reference),
        similarity: best.similarity,
        alternatives,
    }
}

/// Descending similarity, then ascending marking id.
fn rank(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.similarity
        .partial_cmp(&a.similarity)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.reference.id.cmp(&b.reference.id))
}
