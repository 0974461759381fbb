//! Incident records consumed by the intelligence engine.
//!
//! These are read-only inputs. Every optional field deserializes to a neutral
//! default so that a sparse record never produces undefined behavior further
//! down the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Severity levels for incidents. Parsing ignores case; unrecognized values
/// fall back to medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Critical and high incidents demand immediate attention.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "low" => Severity::Low,
            _ => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status. Unknown values from the store are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Open,
    Resolved,
    Other(String),
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "open" => Status::Open,
            "resolved" => Status::Resolved,
            _ => Status::Other(s),
        }
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Open => f.write_str("open"),
            Status::Resolved => f.write_str("resolved"),
            Status::Other(s) => f.write_str(s),
        }
    }
}

/// Risk level, shared by remediation recommendations and success predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// The workload an incident was raised against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Diagnosis {
    pub summary: String,
    pub root_cause: Option<String>,
    /// Percentage in [0, 100].
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub title: String,
    pub explanation: String,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// A detected abnormal condition in a monitored resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pattern: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource: Resource,
    #[serde(default = "default_occurrences")]
    pub occurrences: u32,
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(default)]
    pub diagnosis: Option<Diagnosis>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub events: Vec<IncidentEvent>,
}

fn default_occurrences() -> u32 {
    1
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Incident {
    /// Minimal incident with every optional field at its neutral default.
    pub fn new(id: impl Into<String>, severity: Severity, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            pattern: pattern.into(),
            resource: Resource::default(),
            occurrences: default_occurrences(),
            first_seen: None,
            last_seen: None,
            status: Status::Open,
            diagnosis: None,
            recommendations: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Token before the first underscore; the whole pattern when there is none.
    pub fn base_pattern(&self) -> &str {
        base_pattern(&self.pattern)
    }

    pub fn pattern_contains(&self, keyword: &str) -> bool {
        self.pattern.contains(keyword)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.diagnosis.as_ref().and_then(|d| d.confidence)
    }

    pub fn root_cause(&self) -> Option<&str> {
        self.diagnosis
            .as_ref()
            .and_then(|d| d.root_cause.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    pub fn is_resolved(&self) -> bool {
        self.status == Status::Resolved
    }

    /// Same non-empty pattern, different incident.
    pub fn shares_pattern_with(&self, other: &Incident) -> bool {
        !self.pattern.is_empty() && self.pattern == other.pattern && self.id != other.id
    }

    /// When the incident started, falling back to its last sighting.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.first_seen.or(self.last_seen)
    }
}

pub fn base_pattern(pattern: &str) -> &str {
    pattern.split_once('_').map_or(pattern, |(base, _)| base)
}
