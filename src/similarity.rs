//! Related-incident ranking by pairwise feature similarity.
//!
//! Every feature is a commutative equality or proximity test, so
//! `similarity(a, b) == similarity(b, a)` holds for any pair.

use serde::Serialize;
use tracing::debug;

use crate::incident::Incident;

/// Default number of related incidents returned.
pub const DEFAULT_LIMIT: usize = 5;

/// Scores at or below this are not considered related.
pub const MIN_RELATED_SCORE: u32 = 30;

const EXACT_PATTERN_POINTS: u32 = 40;
const FUZZY_PATTERN_POINTS: u32 = 20;
const NAMESPACE_POINTS: u32 = 20;
const KIND_POINTS: u32 = 15;
const SEVERITY_POINTS: u32 = 10;
const NAME_POINTS: u32 = 10;

/// Time proximity bands: (max gap in minutes, exclusive, points).
const PROXIMITY_BANDS: &[(i64, u32, &str)] = &[
    (60, 15, "Occurred within 1 hour"),
    (6 * 60, 10, "Occurred within 6 hours"),
    (24 * 60, 5, "Occurred within 24 hours"),
];

/// Score in [0, 100] plus the reason for every satisfied feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Similarity {
    pub score: u32,
    pub reasons: Vec<String>,
}

/// A past incident related to the current one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedIncident<'a> {
    /// Position in the history slice passed to [`find_related`].
    pub index: usize,
    pub incident: &'a Incident,
    pub similarity_score: u32,
    pub match_reasons: Vec<String>,
    pub correlation_confidence: u32,
}

pub fn similarity(a: &Incident, b: &Incident) -> Similarity {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    // 1. Pattern: exact beats fuzzy.
    if !a.pattern.is_empty() && a.pattern == b.pattern {
        score += EXACT_PATTERN_POINTS;
        reasons.push(format!("Same failure pattern ({})", a.pattern));
    } else {
        let base = a.base_pattern();
        if !base.is_empty() && base == b.base_pattern() {
            score += FUZZY_PATTERN_POINTS;
            reasons.push(format!("Similar pattern family ({base})"));
        }
    }

    // 2. Placement.
    let ns = &a.resource.namespace;
    if !ns.is_empty() && *ns == b.resource.namespace {
        score += NAMESPACE_POINTS;
        reasons.push(format!("Same namespace ({ns})"));
    }

    let kind = &a.resource.kind;
    if !kind.is_empty() && *kind == b.resource.kind {
        score += KIND_POINTS;
        reasons.push(format!("Same resource type ({kind})"));
    }

    if a.severity == b.severity {
        score += SEVERITY_POINTS;
        reasons.push(format!("Same severity ({})", a.severity));
    }

    // 3. Time proximity.
    if let (Some(ta), Some(tb)) = (a.first_seen, b.first_seen) {
        let gap = (ta - tb).num_minutes().abs();
        if let Some((_, points, reason)) = PROXIMITY_BANDS.iter().find(|(max, _, _)| gap < *max) {
            score += points;
            reasons.push(reason.to_string());
        }
    }

    // 4. Same workload behind a generated name suffix.
    let name = strip_generated_suffix(&a.resource.name);
    if !name.is_empty() && name == strip_generated_suffix(&b.resource.name) {
        score += NAME_POINTS;
        reasons.push(format!("Same workload ({name})"));
    }

    Similarity {
        score: score.min(100),
        reasons,
    }
}

/// Drop one trailing `-<8+ alphanumerics>` or `-<digits>` suffix, as added by
/// ReplicaSets, Jobs and StatefulSets.
pub fn strip_generated_suffix(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((stem, suffix)) if is_generated_suffix(suffix) => stem,
        _ => name,
    }
}

fn is_generated_suffix(suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    let digits = suffix.bytes().all(|b| b.is_ascii_digit());
    let hash = suffix.len() >= 8 && suffix.bytes().all(|b| b.is_ascii_alphanumeric());
    digits || hash
}

/// Coarse confidence band for a similarity score.
pub fn correlation_confidence(score: u32) -> u32 {
    match score {
        s if s >= 80 => 95,
        s if s >= 70 => 85,
        s if s >= 60 => 75,
        s if s >= 50 => 65,
        s if s >= 40 => 55,
        _ => 45,
    }
}

/// Rank `history` against `current`, keeping scores strictly above
/// [`MIN_RELATED_SCORE`], best first, at most `limit` entries.
pub fn find_related<'a>(
    current: &Incident,
    history: &'a [Incident],
    limit: usize,
) -> Vec<RelatedIncident<'a>> {
    let mut related: Vec<RelatedIncident<'a>> = history
        .iter()
        .enumerate()
        .filter(|(_, other)| other.id != current.id)
        .filter_map(|(index, other)| {
            let sim = similarity(current, other);
            (sim.score > MIN_RELATED_SCORE).then(|| RelatedIncident {
                index,
                incident: other,
                similarity_score: sim.score,
                match_reasons: sim.reasons,
                correlation_confidence: correlation_confidence(sim.score),
            })
        })
        .collect();

    // Stable: equal scores keep history order.
    related.sort_by(|a, b| b.similarity_score.cmp(&a.similarity_score));
    related.truncate(limit);

    debug!(
        incident = %current.id,
        candidates = history.len(),
        related = related.len(),
        "ranked related incidents"
    );

    related
}
