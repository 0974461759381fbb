//! Insight rule families, evaluated in declaration order.

use std::collections::BTreeSet;

use chrono::Duration;

use super::{Draft, InsightKind, RuleContext};
use crate::incident::{Incident, Severity};

pub type RuleFn = fn(&RuleContext<'_>) -> Vec<Draft>;

/// Every family with a name for tracing. Order defines tie-breaking.
pub const FAMILIES: &[(&str, RuleFn)] = &[
    ("confidence", confidence_band),
    ("pattern", pattern_match),
    ("trend", trend),
    ("cluster_health", cluster_health),
    ("recurrence", recurrence),
    ("proactive", proactive),
];

/// Pattern keyword advisories: (keyword, icon, priority, text).
const PATTERN_ADVISORIES: &[(&str, &str, u8, &str)] = &[
    (
        "CRASH",
        "🔄",
        9,
        "Crash loop detected - check application logs and the most recent deployment",
    ),
    (
        "OOM",
        "💾",
        9,
        "Container is being OOM-killed - memory usage exceeds its limit",
    ),
    (
        "IMAGE_PULL",
        "📦",
        8,
        "Image pull failing - verify the image tag and registry credentials",
    ),
];

/// Proactive recommendations, all at priority 6: (keyword, text).
const PROACTIVE_ADVISORIES: &[(&str, &str)] = &[
    ("CRASH", "Add liveness and readiness probes so crash loops surface earlier"),
    ("OOM", "Size memory requests and limits from observed peak usage"),
    ("IMAGE_PULL", "Pin image digests and pre-pull critical images on nodes"),
    ("NETWORK", "Audit NetworkPolicies and Service endpoints for this workload"),
    ("CONFIG", "Validate ConfigMaps and Secrets in CI before rollout"),
];

pub fn confidence_band(ctx: &RuleContext<'_>) -> Vec<Draft> {
    let confidence = ctx.current.confidence().unwrap_or(0.0);
    let pct = confidence.round() as i64;

    let draft = if confidence >= 95.0 {
        Draft::new(
            "🎯",
            InsightKind::Success,
            10,
            format!("Very high confidence diagnosis ({pct}%) - the recommended fix is safe to apply"),
        )
    } else if confidence >= 80.0 {
        Draft::new(
            "✅",
            InsightKind::Success,
            8,
            format!("High confidence diagnosis ({pct}%) - recommended fix is likely correct"),
        )
    } else if confidence >= 70.0 {
        Draft::new(
            "👍",
            InsightKind::Info,
            7,
            format!("Good confidence ({pct}%) - review the recommendation before applying"),
        )
    } else if confidence >= 50.0 {
        Draft::new(
            "🤔",
            InsightKind::Warning,
            6,
            format!("Moderate confidence ({pct}%) - manual verification recommended"),
        )
    } else {
        Draft::new(
            "⚠️",
            InsightKind::Warning,
            5,
            format!("Low confidence ({pct}%) - further investigation needed"),
        )
    };

    vec![draft]
}

pub fn pattern_match(ctx: &RuleContext<'_>) -> Vec<Draft> {
    let mut out = Vec::new();
    let current = ctx.current;

    let similar: Vec<&Incident> = ctx
        .history
        .iter()
        .filter(|h| current.shares_pattern_with(h))
        .collect();
    let resolved = similar.iter().filter(|h| h.is_resolved()).count();

    if resolved > 0 {
        out.push(Draft::new(
            "📚",
            InsightKind::Success,
            9,
            format!(
                "{} of {} similar {} incidents were resolved before - a known fix exists",
                resolved,
                similar.len(),
                current.pattern
            ),
        ));
    }

    for (keyword, icon, priority, text) in PATTERN_ADVISORIES {
        if current.pattern_contains(keyword) {
            out.push(Draft::new(*icon, InsightKind::Warning, *priority, *text));
        }
    }

    out
}

pub fn trend(ctx: &RuleContext<'_>) -> Vec<Draft> {
    let mut out = Vec::new();

    let day_ago = ctx.now - Duration::hours(24);
    let two_days_ago = ctx.now - Duration::hours(48);

    let mut recent = 0usize;
    let mut previous = 0usize;
    for t in ctx.history.iter().filter_map(Incident::reference_time) {
        if t > day_ago && t <= ctx.now {
            recent += 1;
        } else if t > two_days_ago && t <= day_ago {
            previous += 1;
        }
    }

    if previous > 0 {
        let ratio = recent as f64 / previous as f64;
        let change = ((ratio - 1.0) * 100.0).round().abs() as i64;
        if ratio > 1.5 {
            out.push(Draft::new(
                "📈",
                InsightKind::Warning,
                9,
                format!(
                    "Incident rate up {change}% in the last 24h ({recent} vs {previous} the day before)"
                ),
            ));
        } else if ratio < 0.5 {
            out.push(Draft::new(
                "📉",
                InsightKind::Success,
                7,
                format!(
                    "Incident rate down {change}% in the last 24h ({recent} vs {previous} the day before)"
                ),
            ));
        }
    }

    let current = ctx.current;
    if !current.pattern.is_empty() {
        let namespaces: BTreeSet<&str> = ctx
            .history
            .iter()
            .chain(std::iter::once(current))
            .filter(|h| h.pattern == current.pattern)
            .map(|h| h.resource.namespace.as_str())
            .filter(|ns| !ns.is_empty())
            .collect();

        if namespaces.len() > 1 {
            out.push(Draft::new(
                "🌐",
                InsightKind::Warning,
                10,
                format!(
                    "{} is widespread across {} namespaces - likely a platform-level issue",
                    current.pattern,
                    namespaces.len()
                ),
            ));
        }
    }

    out
}

pub fn cluster_health(ctx: &RuleContext<'_>) -> Vec<Draft> {
    let mut out = Vec::new();

    let criticals = ctx
        .history
        .iter()
        .filter(|h| h.severity == Severity::Critical)
        .count();
    let highs = ctx
        .history
        .iter()
        .filter(|h| h.severity == Severity::High)
        .count();

    if criticals > 5 {
        out.push(Draft::new(
            "🚨",
            InsightKind::Warning,
            10,
            format!("{criticals} critical incidents across the cluster - cluster health is degraded"),
        ));
    } else if criticals > 0 {
        out.push(Draft::new(
            "🔴",
            InsightKind::Warning,
            9,
            format!("{criticals} critical incident(s) need attention"),
        ));
    }

    if highs > 10 {
        out.push(Draft::new(
            "🟠",
            InsightKind::Info,
            7,
            format!("{highs} high-severity incidents on record"),
        ));
    }

    let hour_ago = ctx.now - Duration::hours(1);
    let resolved_recently = ctx
        .history
        .iter()
        .filter(|h| h.is_resolved())
        .filter(|h| matches!(h.last_seen, Some(t) if t >= hour_ago && t <= ctx.now))
        .count();

    if resolved_recently > 3 {
        out.push(Draft::new(
            "✨",
            InsightKind::Success,
            8,
            format!("{resolved_recently} incidents resolved in the last hour - remediation is working"),
        ));
    }

    out
}

pub fn recurrence(ctx: &RuleContext<'_>) -> Vec<Draft> {
    let n = ctx.current.occurrences;
    let draft = if n > 10 {
        Draft::new(
            "🔁",
            InsightKind::Warning,
            9,
            format!("Recurring issue: {n} occurrences - a permanent fix is needed"),
        )
    } else if n > 5 {
        Draft::new(
            "🔁",
            InsightKind::Warning,
            7,
            format!("Repeated {n} times - this is becoming a persistent problem"),
        )
    } else if n == 1 {
        Draft::new(
            "🆕",
            InsightKind::Info,
            5,
            "First occurrence of this incident",
        )
    } else {
        return Vec::new();
    };
    vec![draft]
}

pub fn proactive(ctx: &RuleContext<'_>) -> Vec<Draft> {
    let current = ctx.current;
    let mut out: Vec<Draft> = PROACTIVE_ADVISORIES
        .iter()
        .filter(|(keyword, _)| current.pattern_contains(keyword))
        .map(|(_, text)| Draft::new("💡", InsightKind::Recommendation, 6, *text))
        .collect();

    let resolved = ctx
        .history
        .iter()
        .filter(|h| current.shares_pattern_with(h) && h.is_resolved())
        .count();

    if resolved >= 3 && current.confidence().unwrap_or(0.0) < 80.0 {
        out.push(Draft::new(
            "🧠",
            InsightKind::Info,
            5,
            format!(
                "System is learning from {} resolved {} incidents - confidence will improve",
                resolved, current.pattern
            ),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::{Diagnosis, Status};
    use chrono::{DateTime, Utc};

    fn ctx<'a>(current: &'a Incident, history: &'a [Incident], now: DateTime<Utc>) -> RuleContext<'a> {
        RuleContext {
            current,
            history,
            now,
        }
    }

    fn with_confidence(confidence: f64) -> Incident {
        let mut i = Incident::new("c", Severity::Medium, "");
        i.diagnosis = Some(Diagnosis {
            confidence: Some(confidence),
            ..Default::default()
        });
        i
    }

    #[test]
    fn test_confidence_bands() {
        let now = Utc::now();
        let cases = [(99.0, 10), (95.0, 10), (80.0, 8), (75.0, 7), (50.0, 6), (49.9, 5)];
        for (confidence, priority) in cases {
            let current = with_confidence(confidence);
            let out = confidence_band(&ctx(&current, &[], now));
            assert_eq!(out[0].priority, priority, "confidence {confidence}");
        }
    }

    #[test]
    fn test_pattern_match_counts_resolved() {
        let now = Utc::now();
        let current = Incident::new("cur", Severity::High, "OOM_KILL");
        let mut a = Incident::new("a", Severity::High, "OOM_KILL");
        a.status = Status::Resolved;
        let b = Incident::new("b", Severity::High, "OOM_KILL");
        let history = vec![current.clone(), a, b];

        let out = pattern_match(&ctx(&current, &history, now));
        assert_eq!(out[0].priority, 9);
        assert!(out[0].text.starts_with("1 of 2"));
        assert!(out.iter().any(|d| d.text.contains("OOM-killed")));
    }

    #[test]
    fn test_trend_growth_warning() {
        let now = Utc::now();
        let current = Incident::new("cur", Severity::Low, "");
        let mut history = Vec::new();
        for i in 0..4 {
            let mut h = Incident::new(format!("new{i}"), Severity::Low, "");
            h.first_seen = Some(now - Duration::hours(2));
            history.push(h);
        }
        for i in 0..2 {
            let mut h = Incident::new(format!("old{i}"), Severity::Low, "");
            h.first_seen = Some(now - Duration::hours(30));
            history.push(h);
        }

        let out = trend(&ctx(&current, &history, now));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, 9);
        assert!(out[0].text.contains("up 100%"));
    }

    #[test]
    fn test_trend_decline_success() {
        let now = Utc::now();
        let current = Incident::new("cur", Severity::Low, "");
        let mut history = Vec::new();
        let mut recent = Incident::new("new", Severity::Low, "");
        recent.first_seen = Some(now - Duration::hours(1));
        history.push(recent);
        for i in 0..4 {
            let mut h = Incident::new(format!("old{i}"), Severity::Low, "");
            h.first_seen = Some(now - Duration::hours(36));
            history.push(h);
        }

        let out = trend(&ctx(&current, &history, now));
        assert_eq!(out[0].kind, InsightKind::Success);
        assert_eq!(out[0].priority, 7);
        assert!(out[0].text.contains("down 75%"));
    }

    #[test]
    fn test_widespread_pattern() {
        let now = Utc::now();
        let mut current = Incident::new("cur", Severity::Low, "DNS_FAILURE");
        current.resource.namespace = "prod".to_string();
        let mut other = Incident::new("o", Severity::Low, "DNS_FAILURE");
        other.resource.namespace = "staging".to_string();

        let out = trend(&ctx(&current, std::slice::from_ref(&other), now));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, 10);
        assert!(out[0].text.contains("2 namespaces"));
    }

    #[test]
    fn test_cluster_health_thresholds() {
        let now = Utc::now();
        let current = Incident::new("cur", Severity::Low, "");
        let mut history: Vec<Incident> = (0..3)
            .map(|i| Incident::new(format!("c{i}"), Severity::Critical, ""))
            .collect();
        history.extend((0..11).map(|i| Incident::new(format!("h{i}"), Severity::High, "")));

        let out = cluster_health(&ctx(&current, &history, now));
        let priorities: Vec<u8> = out.iter().map(|d| d.priority).collect();
        assert_eq!(priorities, vec![9, 7]);
    }

    #[test]
    fn test_recurrence_bands() {
        let now = Utc::now();
        let mut current = Incident::new("cur", Severity::Low, "");
        for (occurrences, expected) in [(11, Some(9)), (6, Some(7)), (3, None), (1, Some(5))] {
            current.occurrences = occurrences;
            let out = recurrence(&ctx(&current, &[], now));
            assert_eq!(out.first().map(|d| d.priority), expected);
        }
    }

    #[test]
    fn test_learning_insight_requires_low_confidence() {
        let now = Utc::now();
        let mut current = with_confidence(60.0);
        current.pattern = "NETWORK_TIMEOUT".to_string();
        let history: Vec<Incident> = (0..3)
            .map(|i| {
                let mut h = Incident::new(format!("r{i}"), Severity::Low, "NETWORK_TIMEOUT");
                h.status = Status::Resolved;
                h
            })
            .collect();

        let out = proactive(&ctx(&current, &history, now));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, InsightKind::Recommendation);
        assert_eq!(out[1].priority, 5);

        current.diagnosis = Some(Diagnosis {
            confidence: Some(90.0),
            ..Default::default()
        });
        let out = proactive(&ctx(&current, &history, now));
        assert_eq!(out.len(), 1);
    }
}
