//! Root cause analysis reports.
//!
//! A report is an immutable snapshot composed from a single incident's own
//! fields. It does not consult the insight, similarity or prediction engines.

pub mod export;
pub mod rules;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::incident::{Incident, Resource, Severity, Status};

pub use export::{export_html, export_json, export_markdown, render_artifact, ExportError, ExportFormat, ReportArtifact};

/// Default number of incident events copied into the timeline.
pub const MAX_TIMELINE_EVENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub incident_id: String,
    pub severity: Severity,
    pub duration: String,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCauseAnalysis {
    pub primary_cause: String,
    pub contributing_factors: Vec<String>,
    pub technical_details: Vec<String>,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAssessment {
    pub affected_resources: Vec<String>,
    pub user_impact: String,
    pub business_impact: String,
    pub estimated_downtime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionStep {
    pub step: usize,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecommendation {
    pub priority: Priority,
    pub category: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportingEvidence {
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appendix {
    pub pattern: String,
    pub resource: Resource,
    pub occurrences: u32,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub diagnosis_summary: Option<String>,
    pub generated_by: String,
}

/// A complete RCA report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcaReport {
    pub metadata: ReportMetadata,
    pub executive_summary: String,
    pub incident_timeline: Vec<TimelineEntry>,
    pub root_cause_analysis: RootCauseAnalysis,
    pub impact_assessment: ImpactAssessment,
    pub resolution_steps: Vec<ResolutionStep>,
    pub recommendations: Vec<ReportRecommendation>,
    pub supporting_evidence: SupportingEvidence,
    pub appendix: Appendix,
}

/// Compose a report as of the wall clock.
pub fn generate_report(incident: &Incident) -> RcaReport {
    generate_report_at(incident, Utc::now(), MAX_TIMELINE_EVENTS)
}

pub fn generate_report_at(incident: &Incident, now: DateTime<Utc>, max_events: usize) -> RcaReport {
    let report_id = format!(
        "RCA-{}-{}",
        now.timestamp_millis(),
        incident.id.chars().take(8).collect::<String>()
    );

    let end = incident.last_seen.unwrap_or(now);
    let duration = incident
        .first_seen
        .map_or_else(|| "Unknown".to_string(), |start| format_duration(end - start));

    let report = RcaReport {
        metadata: ReportMetadata {
            report_id,
            generated_at: now,
            incident_id: incident.id.clone(),
            severity: incident.severity,
            duration,
            status: incident.status.clone(),
        },
        executive_summary: executive_summary(incident),
        incident_timeline: timeline(incident, now, max_events),
        root_cause_analysis: root_cause(incident),
        impact_assessment: impact(incident, now),
        resolution_steps: resolution_steps(incident),
        recommendations: rules::recommendations_for(&incident.pattern),
        supporting_evidence: SupportingEvidence {
            logs: incident.events.iter().map(format_log_line).collect(),
        },
        appendix: Appendix {
            pattern: incident.pattern.clone(),
            resource: incident.resource.clone(),
            occurrences: incident.occurrences,
            first_seen: incident.first_seen,
            last_seen: incident.last_seen,
            diagnosis_summary: incident
                .diagnosis
                .as_ref()
                .map(|d| d.summary.clone())
                .filter(|s| !s.is_empty()),
            generated_by: format!("incident-intel {}", env!("CARGO_PKG_VERSION")),
        },
    };

    debug!(
        incident = %incident.id,
        report = %report.metadata.report_id,
        timeline = report.incident_timeline.len(),
        "composed RCA report"
    );

    report
}

fn or_unknown(s: &str) -> &str {
    if s.trim().is_empty() {
        "unknown"
    } else {
        s
    }
}

fn executive_summary(incident: &Incident) -> String {
    let r = &incident.resource;
    format!(
        "A {} severity incident matching pattern {} was detected on {} {} in namespace {}. \
         It has occurred {} time(s) and is currently {}.",
        incident.severity,
        or_unknown(&incident.pattern),
        or_unknown(&r.kind),
        or_unknown(&r.name),
        or_unknown(&r.namespace),
        incident.occurrences,
        incident.status,
    )
}

fn timeline(incident: &Incident, now: DateTime<Utc>, max_events: usize) -> Vec<TimelineEntry> {
    let mut entries = Vec::with_capacity(max_events + 2);

    entries.push(TimelineEntry {
        timestamp: incident.first_seen.unwrap_or(now),
        event: "detected".to_string(),
        description: format!(
            "Incident first detected: {} on {}/{}",
            or_unknown(&incident.pattern),
            or_unknown(&incident.resource.kind),
            or_unknown(&incident.resource.name)
        ),
    });

    entries.extend(incident.events.iter().take(max_events).map(|e| TimelineEntry {
        timestamp: e.timestamp,
        event: if e.kind.is_empty() {
            "event".to_string()
        } else {
            e.kind.clone()
        },
        description: e.message.clone(),
    }));

    entries.push(TimelineEntry {
        timestamp: now,
        event: "report".to_string(),
        description: "RCA report generated".to_string(),
    });

    // Stable: entries sharing a timestamp keep insertion order.
    entries.sort_by_key(|e| e.timestamp);
    entries
}

fn root_cause(incident: &Incident) -> RootCauseAnalysis {
    let primary_cause = incident
        .root_cause()
        .map_or_else(|| rules::infer_cause(&incident.pattern).to_string(), str::to_string);

    let mut contributing_factors = Vec::new();
    if incident.occurrences > 5 {
        contributing_factors.push(format!(
            "Recurring issue: {} occurrences indicate a persistent underlying problem",
            incident.occurrences
        ));
    }
    if incident.severity.is_urgent() {
        contributing_factors.push(format!(
            "{} severity: service impact requires immediate attention",
            capitalize(incident.severity.as_str())
        ));
    }

    let r = &incident.resource;
    let technical_details = vec![
        format!("Pattern: {}", or_unknown(&incident.pattern)),
        format!("Resource: {}/{}", or_unknown(&r.kind), or_unknown(&r.name)),
        format!("Namespace: {}", or_unknown(&r.namespace)),
        format!("Occurrences: {}", incident.occurrences),
        format!("Status: {}", incident.status),
    ];

    RootCauseAnalysis {
        primary_cause,
        contributing_factors,
        technical_details,
        confidence_level: incident.confidence().unwrap_or(50.0),
    }
}

fn impact(incident: &Incident, now: DateTime<Utc>) -> ImpactAssessment {
    let (user_impact, business_impact) = match incident.severity {
        Severity::Critical => (
            "Service outage - users are likely unable to use the affected functionality",
            "High - potential revenue loss and SLA breach",
        ),
        Severity::High => (
            "Significant degradation - users see errors or slow responses",
            "Moderate - SLA at risk if not resolved promptly",
        ),
        Severity::Medium => (
            "Partial degradation - some users may notice intermittent issues",
            "Low - limited business exposure",
        ),
        Severity::Low => ("Minimal user impact expected", "Negligible"),
    };

    let r = &incident.resource;
    ImpactAssessment {
        affected_resources: vec![format!(
            "{}/{} (namespace: {})",
            or_unknown(&r.kind),
            or_unknown(&r.name),
            or_unknown(&r.namespace)
        )],
        user_impact: user_impact.to_string(),
        business_impact: business_impact.to_string(),
        estimated_downtime: incident
            .first_seen
            .map_or_else(|| "Unknown".to_string(), |start| format_duration(now - start)),
    }
}

fn resolution_steps(incident: &Incident) -> Vec<ResolutionStep> {
    if incident.recommendations.is_empty() {
        return vec![ResolutionStep {
            step: 1,
            title: "Manual investigation required".to_string(),
            description: "No automated remediation is available. Inspect events, logs and recent \
                          changes for the affected resource."
                .to_string(),
        }];
    }

    incident
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, rec)| ResolutionStep {
            step: i + 1,
            title: rec.title.clone(),
            description: rec.explanation.clone(),
        })
        .collect()
}

fn format_log_line(event: &crate::incident::IncidentEvent) -> String {
    let kind = if event.kind.is_empty() {
        "EVENT".to_string()
    } else {
        event.kind.to_uppercase()
    };
    format!("[{}] {}: {}", event.timestamp.to_rfc3339(), kind, event.message)
}

/// `Xm` below one hour, `Xh Ym` otherwise. Negative spans render as `0m`.
pub fn format_duration(d: Duration) -> String {
    let minutes = d.num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m")
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
