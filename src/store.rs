//! Incident store adapter -- loads the canonical incident list from disk.
//!
//! The engine never touches the filesystem; this is the host-side loader the
//! CLI and HTTP server hand their `&[Incident]` from.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::incident::Incident;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read incident file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse incident file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("incident not found: {0}")]
    NotFound(String),
}

/// Either a bare array or an `{ "incidents": [...] }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum IncidentFile {
    List(Vec<Incident>),
    Envelope { incidents: Vec<Incident> },
}

/// Load every incident from a JSON file.
pub fn load_incidents(path: &Path) -> Result<Vec<Incident>, StoreError> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: shown.clone(),
        source,
    })?;
    let incidents = parse_incidents(&content).map_err(|source| StoreError::Parse {
        path: shown.clone(),
        source,
    })?;
    debug!(path = %shown, count = incidents.len(), "loaded incidents");
    Ok(incidents)
}

pub fn parse_incidents(content: &str) -> Result<Vec<Incident>, serde_json::Error> {
    let file: IncidentFile = serde_json::from_str(content)?;
    Ok(match file {
        IncidentFile::List(incidents) => incidents,
        IncidentFile::Envelope { incidents } => incidents,
    })
}

/// Locate an incident and its position in the collection.
pub fn find<'a>(incidents: &'a [Incident], id: &str) -> Result<(usize, &'a Incident), StoreError> {
    incidents
        .iter()
        .enumerate()
        .find(|(_, i)| i.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_bare_array_and_envelope() {
        let bare = parse_incidents(r#"[{ "id": "a" }, { "id": "b" }]"#).unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped = parse_incidents(r#"{ "incidents": [{ "id": "c" }] }"#).unwrap();
        assert_eq!(wrapped[0].id, "c");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "id": "inc-1", "pattern": "OOM_KILL" }}]"#).unwrap();

        let incidents = load_incidents(file.path()).unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].pattern, "OOM_KILL");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_incidents(Path::new("/nonexistent/incidents.json")).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_incidents(file.path()).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_find_returns_position() {
        let incidents = parse_incidents(r#"[{ "id": "a" }, { "id": "b" }]"#).unwrap();
        let (idx, incident) = find(&incidents, "b").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(incident.id, "b");
        assert!(matches!(find(&incidents, "zzz"), Err(StoreError::NotFound(_))));
    }
}
