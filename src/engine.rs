//! Configured entry point over the four analytic components.
//!
//! Holds only settings; every call is a pure function of its arguments and
//! the clock, so one `Engine` can be shared freely across threads.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::incident::Incident;
use crate::insights::{self, Insight};
use crate::predict::{self, SuccessPrediction};
use crate::report::{self, RcaReport};
use crate::similarity::{self, RelatedIncident};

#[derive(Debug, Clone)]
pub struct Engine {
    pub max_insights: usize,
    pub related_limit: usize,
    pub variance: f64,
    pub max_timeline_events: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            max_insights: insights::MAX_INSIGHTS,
            related_limit: similarity::DEFAULT_LIMIT,
            variance: 0.0,
            max_timeline_events: report::MAX_TIMELINE_EVENTS,
        }
    }
}

impl Engine {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_insights: config.insights.max_items,
            related_limit: config.related.limit,
            variance: config.prediction.variance.max(0.0),
            max_timeline_events: config.report.max_timeline_events,
        }
    }

    pub fn insights(&self, current: &Incident, history: &[Incident]) -> Vec<Insight> {
        self.insights_at(current, history, Utc::now())
    }

    pub fn insights_at(&self, current: &Incident, history: &[Incident], now: DateTime<Utc>) -> Vec<Insight> {
        insights::generate_insights_at(current, history, now, self.max_insights)
    }

    /// Related incidents; `limit` overrides the configured default.
    pub fn related<'a>(
        &self,
        current: &Incident,
        history: &'a [Incident],
        limit: Option<usize>,
    ) -> Vec<RelatedIncident<'a>> {
        similarity::find_related(current, history, limit.unwrap_or(self.related_limit))
    }

    pub fn predict(&self, incident: &Incident, fix_id: &str, history: &[Incident]) -> SuccessPrediction {
        predict::predict_success_with_variance(incident, fix_id, history, self.variance)
    }

    pub fn report(&self, incident: &Incident) -> RcaReport {
        report::generate_report_at(incident, Utc::now(), self.max_timeline_events)
    }
}

/// Fix id used when the caller names none: the first recommendation's title.
pub fn default_fix_id(incident: &Incident) -> String {
    incident
        .recommendations
        .first()
        .map(|r| r.title.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::{Recommendation, Severity};

    #[test]
    fn test_from_config_applies_overrides() {
        let mut config = Config::default();
        config.related.limit = 2;
        config.prediction.variance = -3.0;
        let engine = Engine::from_config(&config);
        assert_eq!(engine.related_limit, 2);
        assert_eq!(engine.variance, 0.0);
        assert_eq!(engine.max_insights, 8);
    }

    #[test]
    fn test_default_fix_id() {
        let mut incident = Incident::new("a", Severity::Low, "");
        assert_eq!(default_fix_id(&incident), "default");
        incident.recommendations.push(Recommendation {
            title: "Raise memory limit".to_string(),
            ..Default::default()
        });
        assert_eq!(default_fix_id(&incident), "Raise memory limit");
    }
}
