//! Remediation success prediction.
//!
//! Five fixed-weight factors are averaged into a probability. An optional
//! `variance` adds a perturbation in `[-variance, +variance]` drawn from an RNG
//! seeded by `(incident id, fix id)`, so identical inputs always produce
//! identical predictions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::incident::{Incident, RiskLevel, Severity};

/// Confidence reported when the incident carries no diagnosis confidence.
const DEFAULT_CONFIDENCE: f64 = 50.0;

/// Historical success score when no same-pattern incident exists.
const NEUTRAL_SUCCESS_RATE: f64 = 50.0;

const BASE_COMPLEXITY: u32 = 20;

/// Complexity added per pattern keyword. Additions accumulate.
const COMPLEXITY_KEYWORDS: &[(&str, u32)] = &[
    ("NETWORK", 30),
    ("CONFIG", 25),
    ("CRASH", 20),
    ("OOM", 15),
    ("IMAGE_PULL", 10),
];

/// One weighted input to the prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    /// In [0, 1]; all weights sum to 1.
    pub weight: f64,
    /// In [0, 100].
    pub score: f64,
    pub description: String,
}

impl Factor {
    fn new(name: &str, weight: f64, score: f64, description: String) -> Self {
        Self {
            name: name.to_string(),
            weight,
            score: score.clamp(0.0, 100.0),
            description,
        }
    }

    pub fn contribution(&self) -> f64 {
        self.score * self.weight
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPrediction {
    pub fix_id: String,
    /// In [0, 100].
    pub probability: u32,
    pub confidence: f64,
    pub factors: Vec<Factor>,
    pub risk: RiskLevel,
    pub explanation: String,
    pub similar_cases: usize,
    pub historical_success_rate: f64,
}

/// Predict with no jitter.
pub fn predict_success(incident: &Incident, fix_id: &str, history: &[Incident]) -> SuccessPrediction {
    predict_success_with_variance(incident, fix_id, history, 0.0)
}

pub fn predict_success_with_variance(
    incident: &Incident,
    fix_id: &str,
    history: &[Incident],
    variance: f64,
) -> SuccessPrediction {
    let similar: Vec<&Incident> = history
        .iter()
        .filter(|h| incident.shares_pattern_with(h))
        .collect();
    let resolved = similar.iter().filter(|h| h.is_resolved()).count();
    let historical_success_rate = if similar.is_empty() {
        NEUTRAL_SUCCESS_RATE
    } else {
        resolved as f64 / similar.len() as f64 * 100.0
    };

    let factors = vec![
        diagnosis_factor(incident),
        pattern_factor(similar.len()),
        history_factor(similar.len(), resolved, historical_success_rate),
        health_factor(incident),
        complexity_factor(incident),
    ];

    let weighted: f64 = factors.iter().map(Factor::contribution).sum();
    let jitter = jitter(&incident.id, fix_id, variance);
    let probability = (weighted + jitter).clamp(0.0, 100.0).round() as u32;
    let risk = classify_risk(probability, incident.severity);
    let explanation = explain(probability, &factors, similar.len(), historical_success_rate);

    debug!(
        incident = %incident.id,
        fix = fix_id,
        weighted,
        jitter,
        probability,
        %risk,
        "predicted fix success"
    );

    SuccessPrediction {
        fix_id: fix_id.to_string(),
        probability,
        confidence: incident.confidence().unwrap_or(DEFAULT_CONFIDENCE),
        factors,
        risk,
        explanation,
        similar_cases: similar.len(),
        historical_success_rate: historical_success_rate.round(),
    }
}

fn diagnosis_factor(incident: &Incident) -> Factor {
    let confidence = incident.confidence().unwrap_or(0.0);
    Factor::new(
        "Diagnosis confidence",
        0.35,
        confidence,
        format!("Diagnosis confidence is {}%", confidence.round()),
    )
}

fn pattern_factor(similar: usize) -> Factor {
    let score = match similar {
        0 => 40.0,
        n if n < 3 => 60.0,
        n if n < 10 => 80.0,
        _ => 95.0,
    };
    let description = if similar == 0 {
        "Pattern not seen before".to_string()
    } else {
        format!("Pattern seen in {similar} previous incident(s)")
    };
    Factor::new("Pattern recognition", 0.25, score, description)
}

fn history_factor(similar: usize, resolved: usize, rate: f64) -> Factor {
    let description = if similar == 0 {
        "No history for this pattern; assuming neutral odds".to_string()
    } else {
        format!("{resolved} of {similar} similar incidents were resolved")
    };
    Factor::new("Historical success", 0.20, rate, description)
}

fn health_factor(incident: &Incident) -> Factor {
    let severity_penalty: i64 = match incident.severity {
        Severity::Critical => 40,
        Severity::High => 25,
        Severity::Medium => 10,
        Severity::Low => 5,
    };
    let occurrence_penalty: i64 = match incident.occurrences {
        n if n > 10 => 30,
        n if n > 5 => 15,
        n if n > 2 => 5,
        _ => 0,
    };
    let score = (100 - severity_penalty - occurrence_penalty).max(0);
    Factor::new(
        "Resource health",
        0.15,
        score as f64,
        format!(
            "{} severity with {} occurrence(s)",
            incident.severity, incident.occurrences
        ),
    )
}

/// Complexity of the fix; the factor scores its inverse.
pub fn fix_complexity(incident: &Incident) -> u32 {
    let keywords: u32 = COMPLEXITY_KEYWORDS
        .iter()
        .filter(|(keyword, _)| incident.pattern_contains(keyword))
        .map(|(_, points)| points)
        .sum();
    let recommendations = match incident.recommendations.len() {
        n if n > 3 => 15,
        n if n > 1 => 5,
        _ => 0,
    };
    (BASE_COMPLEXITY + keywords + recommendations).min(100)
}

fn complexity_factor(incident: &Incident) -> Factor {
    let complexity = fix_complexity(incident);
    Factor::new(
        "Fix complexity",
        0.05,
        f64::from(100 - complexity),
        format!("Estimated fix complexity {complexity}/100"),
    )
}

/// Deterministic perturbation in `[-variance, +variance]`.
fn jitter(incident_id: &str, fix_id: &str, variance: f64) -> f64 {
    if variance <= 0.0 || !variance.is_finite() {
        return 0.0;
    }
    let mut rng = StdRng::seed_from_u64(stable_seed(incident_id, fix_id));
    rng.gen_range(-variance..=variance)
}

/// FNV-1a over both ids. Stable across builds and platforms.
fn stable_seed(incident_id: &str, fix_id: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    incident_id
        .bytes()
        .chain(std::iter::once(0))
        .chain(fix_id.bytes())
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

pub fn classify_risk(probability: u32, severity: Severity) -> RiskLevel {
    if probability >= 85 {
        RiskLevel::Low
    } else if probability >= 70 {
        RiskLevel::Medium
    } else if severity == Severity::Critical {
        RiskLevel::High
    } else if probability >= 60 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

fn explain(probability: u32, factors: &[Factor], similar: usize, rate: f64) -> String {
    let strongest = factors
        .iter()
        .max_by(|a, b| a.contribution().total_cmp(&b.contribution()));

    let mut text = format!("{probability}% estimated chance of success.");
    if let Some(f) = strongest {
        text.push_str(&format!(
            " Strongest signal: {} ({}).",
            f.name.to_lowercase(),
            f.description
        ));
    }
    if similar == 0 {
        text.push_str(" No similar incidents on record yet.");
    } else {
        text.push_str(&format!(
            " Based on {} similar case(s) with a {}% historical success rate.",
            similar,
            rate.round()
        ));
    }
    text
}
