//! Report serialization: markdown, JSON, and HTML.
//!
//! The HTML export is not a markdown renderer. It embeds the escaped markdown
//! verbatim in a `<pre>` block so the download opens readably in a browser.

use std::str::FromStr;

use askama::Template;
use thiserror::Error;

use super::RcaReport;

/// Log lines fenced in the markdown evidence section.
pub const MAX_LOG_LINES: usize = 10;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize report as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render HTML report: {0}")]
    Template(#[from] askama::Error),
    #[error("unsupported report format: {0} (expected md, json or html)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Json => "application/json",
            ExportFormat::Html => "text/html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// A rendered report ready for the host to save or serve.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub body: String,
}

pub fn render_artifact(report: &RcaReport, format: ExportFormat) -> Result<ReportArtifact, ExportError> {
    let body = match format {
        ExportFormat::Markdown => export_markdown(report),
        ExportFormat::Json => export_json(report)?,
        ExportFormat::Html => export_html(report)?,
    };
    let stem = sanitize_filename(&report.metadata.report_id);
    Ok(ReportArtifact {
        filename: format!("RCA-{stem}.{}", format.extension()),
        mime_type: format.mime_type(),
        body,
    })
}

/// Keep `[A-Za-z0-9._-]`, map everything else to `_`. Incident ids are
/// caller-supplied and end up in header values and file paths.
fn sanitize_filename(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn export_json(report: &RcaReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[derive(Template)]
#[template(path = "report.html")]
struct HtmlReport<'a> {
    report_id: &'a str,
    markdown: &'a str,
}

pub fn export_html(report: &RcaReport) -> Result<String, ExportError> {
    let markdown = export_markdown(report);
    let page = HtmlReport {
        report_id: &report.metadata.report_id,
        markdown: &markdown,
    };
    Ok(page.render()?)
}

pub fn export_markdown(report: &RcaReport) -> String {
    let mut md = String::new();
    let meta = &report.metadata;

    md.push_str("# Root Cause Analysis Report\n\n");
    md.push_str(&format!("- **Report ID:** {}\n", meta.report_id));
    md.push_str(&format!("- **Generated:** {}\n", meta.generated_at.to_rfc3339()));
    md.push_str(&format!("- **Incident ID:** {}\n", meta.incident_id));
    md.push_str(&format!("- **Severity:** {}\n", meta.severity.as_str().to_uppercase()));
    md.push_str(&format!("- **Status:** {}\n", meta.status));
    md.push_str(&format!("- **Duration:** {}\n", meta.duration));

    md.push_str("\n## Executive Summary\n\n");
    md.push_str(&report.executive_summary);
    md.push('\n');

    md.push_str("\n## Incident Timeline\n\n");
    for entry in &report.incident_timeline {
        md.push_str(&format!(
            "- **{}** [{}] {}\n",
            entry.timestamp.to_rfc3339(),
            entry.event,
            entry.description
        ));
    }

    let rca = &report.root_cause_analysis;
    md.push_str("\n## Root Cause Analysis\n\n### Primary Cause\n\n");
    md.push_str(&rca.primary_cause);
    md.push('\n');
    md.push_str(&format!("\n**Confidence Level:** {}%\n", rca.confidence_level.round()));

    md.push_str("\n### Contributing Factors\n\n");
    push_list(&mut md, &rca.contributing_factors);

    md.push_str("\n### Technical Details\n\n");
    push_list(&mut md, &rca.technical_details);

    let impact = &report.impact_assessment;
    md.push_str("\n## Impact Assessment\n\n**Affected Resources:**\n\n");
    push_list(&mut md, &impact.affected_resources);
    md.push_str(&format!("\n- **User Impact:** {}\n", impact.user_impact));
    md.push_str(&format!("- **Business Impact:** {}\n", impact.business_impact));
    md.push_str(&format!("- **Estimated Downtime:** {}\n", impact.estimated_downtime));

    md.push_str("\n## Resolution Steps\n\n");
    for step in &report.resolution_steps {
        md.push_str(&format!("{}. **{}**\n", step.step, step.title));
        if !step.description.is_empty() {
            md.push_str(&format!("   {}\n", step.description));
        }
    }

    md.push_str("\n## Recommendations\n\n");
    for rec in &report.recommendations {
        md.push_str(&format!(
            "- **[{}] {}** ({}): {}\n",
            rec.priority, rec.title, rec.category, rec.description
        ));
    }

    md.push_str("\n## Supporting Evidence\n\n### Event Logs\n\n");
    let logs = &report.supporting_evidence.logs;
    if logs.is_empty() {
        md.push_str("_No events recorded._\n");
    } else {
        md.push_str("```\n");
        for line in logs.iter().take(MAX_LOG_LINES) {
            md.push_str(line);
            md.push('\n');
        }
        md.push_str("```\n");
        if logs.len() > MAX_LOG_LINES {
            md.push_str(&format!("\n_{} more log line(s) omitted._\n", logs.len() - MAX_LOG_LINES));
        }
    }

    let appendix = &report.appendix;
    md.push_str("\n## Appendix\n\n");
    md.push_str(&format!("- **Pattern:** {}\n", appendix.pattern));
    md.push_str(&format!(
        "- **Resource:** {}/{} (namespace: {})\n",
        appendix.resource.kind, appendix.resource.name, appendix.resource.namespace
    ));
    md.push_str(&format!("- **Occurrences:** {}\n", appendix.occurrences));
    if let Some(first) = appendix.first_seen {
        md.push_str(&format!("- **First Seen:** {}\n", first.to_rfc3339()));
    }
    if let Some(last) = appendix.last_seen {
        md.push_str(&format!("- **Last Seen:** {}\n", last.to_rfc3339()));
    }
    if let Some(summary) = &appendix.diagnosis_summary {
        md.push_str(&format!("- **Diagnosis:** {summary}\n"));
    }

    md.push_str(&format!("\n---\n_Generated by {}_\n", appendix.generated_by));
    md
}

fn push_list(md: &mut String, items: &[String]) {
    if items.is_empty() {
        md.push_str("- None identified\n");
        return;
    }
    for item in items {
        md.push_str(&format!("- {item}\n"));
    }
}
