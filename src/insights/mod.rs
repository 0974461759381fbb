//! Insight feed -- short advisory messages synthesized from incident history.
//!
//! Each rule family in [`rules`] runs independently and emits zero or more
//! drafts with a fixed priority. The feed is ordered on the composite key
//! `(priority desc, emission order asc)` and truncated to the top K.

pub mod rules;

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::incident::Incident;

/// Default size of the insight feed.
pub const MAX_INSIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Info,
    Warning,
    Success,
    Trend,
    Recommendation,
}

/// A single advisory message. Never persisted; regenerated on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub icon: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// 1 (lowest) to 10 (highest).
    pub priority: u8,
    pub timestamp: DateTime<Utc>,
}

/// Rule output before ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub icon: &'static str,
    pub text: String,
    pub kind: InsightKind,
    pub priority: u8,
}

impl Draft {
    pub fn new(icon: &'static str, kind: InsightKind, priority: u8, text: impl Into<String>) -> Self {
        Self {
            icon,
            text: text.into(),
            kind,
            priority,
        }
    }
}

/// Inputs shared by every rule family.
pub struct RuleContext<'a> {
    pub current: &'a Incident,
    pub history: &'a [Incident],
    pub now: DateTime<Utc>,
}

/// Generate the insight feed for `current` using the wall clock.
pub fn generate_insights(current: &Incident, history: &[Incident]) -> Vec<Insight> {
    generate_insights_at(current, history, Utc::now(), MAX_INSIGHTS)
}

/// Generate at most `max_items` insights as of `now`.
pub fn generate_insights_at(
    current: &Incident,
    history: &[Incident],
    now: DateTime<Utc>,
    max_items: usize,
) -> Vec<Insight> {
    let ctx = RuleContext {
        current,
        history,
        now,
    };

    let mut drafts: Vec<(usize, Draft)> = rules::FAMILIES
        .iter()
        .flat_map(|(name, rule)| {
            let out = rule(&ctx);
            debug!(family = name, emitted = out.len(), "insight rule evaluated");
            out
        })
        .enumerate()
        .collect();

    drafts.sort_by_key(|(seq, d)| (Reverse(d.priority), *seq));
    drafts.truncate(max_items);

    debug!(incident = %current.id, count = drafts.len(), "generated insights");

    drafts
        .into_iter()
        .map(|(_, d)| Insight {
            id: Uuid::new_v4(),
            icon: d.icon.to_string(),
            text: d.text,
            kind: d.kind,
            priority: d.priority,
            timestamp: now,
        })
        .collect()
}
