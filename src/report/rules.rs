//! Ordered keyword rule tables for root-cause and recommendation inference.
//!
//! The first matching rule wins for causes; every matching rule applies for
//! recommendations. Adding a rule never touches control flow.

use super::{Priority, ReportRecommendation};

/// A pattern keyword mapped to a result.
pub struct KeywordRule<T: 'static> {
    pub keyword: &'static str,
    pub result: T,
}

impl<T> KeywordRule<T> {
    pub fn matches(&self, pattern: &str) -> bool {
        pattern.contains(self.keyword)
    }
}

pub struct StaticRecommendation {
    pub priority: Priority,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

impl StaticRecommendation {
    pub fn to_recommendation(&self) -> ReportRecommendation {
        ReportRecommendation {
            priority: self.priority,
            category: self.category.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
        }
    }
}

pub const FALLBACK_CAUSE: &str =
    "Root cause analysis in progress - insufficient data for an automated determination";

pub const CAUSE_RULES: &[KeywordRule<&str>] = &[
    KeywordRule {
        keyword: "CRASH",
        result: "Application process is crashing repeatedly shortly after start, leaving the container in a restart back-off loop",
    },
    KeywordRule {
        keyword: "OOM",
        result: "Container memory usage exceeded its configured limit and the process was terminated by the OOM killer",
    },
    KeywordRule {
        keyword: "IMAGE_PULL",
        result: "Container image could not be pulled from the registry (missing tag, wrong repository, or failed authentication)",
    },
    KeywordRule {
        keyword: "NETWORK",
        result: "Network connectivity failure between the workload and one of its dependencies",
    },
    KeywordRule {
        keyword: "CONFIG",
        result: "Invalid or missing configuration (ConfigMap, Secret, or environment variable) prevents the workload from running correctly",
    },
];

pub const RECOMMENDATION_RULES: &[KeywordRule<StaticRecommendation>] = &[
    KeywordRule {
        keyword: "OOM",
        result: StaticRecommendation {
            priority: Priority::High,
            category: "Resource Management",
            title: "Adjust memory limits",
            description: "Raise memory requests and limits based on observed peak usage and alert before the limit is reached",
        },
    },
    KeywordRule {
        keyword: "CRASH",
        result: StaticRecommendation {
            priority: Priority::High,
            category: "Reliability",
            title: "Review health probes",
            description: "Review liveness and readiness probe thresholds and startup timing so healthy pods are not restarted",
        },
    },
];

/// Appended to every report regardless of pattern.
pub const GENERIC_RECOMMENDATIONS: &[StaticRecommendation] = &[
    StaticRecommendation {
        priority: Priority::Medium,
        category: "Monitoring",
        title: "Enhance monitoring",
        description: "Add alerting on this failure pattern so recurrences are detected before users are affected",
    },
    StaticRecommendation {
        priority: Priority::Low,
        category: "Documentation",
        title: "Update runbook",
        description: "Document this incident, its root cause and the resolution steps in the team runbook",
    },
];

/// First matching cause, or the fallback.
pub fn infer_cause(pattern: &str) -> &'static str {
    CAUSE_RULES
        .iter()
        .find(|rule| rule.matches(pattern))
        .map_or(FALLBACK_CAUSE, |rule| rule.result)
}

/// Every matching pattern recommendation, then the generic ones.
pub fn recommendations_for(pattern: &str) -> Vec<ReportRecommendation> {
    RECOMMENDATION_RULES
        .iter()
        .filter(|rule| rule.matches(pattern))
        .map(|rule| &rule.result)
        .chain(GENERIC_RECOMMENDATIONS)
        .map(StaticRecommendation::to_recommendation)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_precedence_follows_table_order() {
        // CRASH precedes OOM in the table.
        assert_eq!(infer_cause("OOM_CRASH"), CAUSE_RULES[0].result);
        assert_eq!(infer_cause("OOM_KILL"), CAUSE_RULES[1].result);
        assert_eq!(infer_cause("CONFIG_ERROR"), CAUSE_RULES[4].result);
        assert_eq!(infer_cause("DISK_PRESSURE"), FALLBACK_CAUSE);
        assert_eq!(infer_cause(""), FALLBACK_CAUSE);
    }

    #[test]
    fn test_generic_recommendations_always_appended() {
        let recs = recommendations_for("DISK_PRESSURE");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[1].priority, Priority::Low);

        let recs = recommendations_for("OOM_CRASH");
        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Adjust memory limits", "Review health probes", "Enhance monitoring", "Update runbook"]
        );
    }
}
