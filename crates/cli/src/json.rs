use std::io;

use serde::Serialize;
use treedup_core::{Diagnostic, InspectStats, Match};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonInstance {
    pub(crate) path: String,
    pub(crate) start_line: u32,
    pub(crate) start_column: u32,
    pub(crate) end_line: u32,
    pub(crate) end_column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) lines: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonMatch {
    pub(crate) hash: String,
    pub(crate) instances: Vec<JsonInstance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonStats {
    pub(crate) candidate_files: u64,
    pub(crate) parsed_files: u64,
    pub(crate) parse_failures: u64,
    pub(crate) skipped_too_large: u64,
    pub(crate) skipped_binary: u64,
    pub(crate) skipped_walk_errors: u64,
    pub(crate) indexed_instances: u64,
    pub(crate) matches_found: u64,
}

impl From<InspectStats> for JsonStats {
    fn from(stats: InspectStats) -> Self {
        Self {
            candidate_files: stats.candidate_files,
            parsed_files: stats.parsed_files,
            parse_failures: stats.parse_failures,
            skipped_too_large: stats.skipped_too_large,
            skipped_binary: stats.skipped_binary,
            skipped_walk_errors: stats.skipped_walk_errors,
            indexed_instances: stats.indexed_instances,
            matches_found: stats.matches_found,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonDiagnostic {
    pub(crate) path: String,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) column: Option<u32>,
}

pub(crate) fn map_matches(matches: Vec<Match>) -> Vec<JsonMatch> {
    matches
        .into_iter()
        .map(|m| JsonMatch {
            hash: m.hash,
            instances: m
                .instances
                .into_iter()
                .map(|i| JsonInstance {
                    path: i.path.to_string(),
                    start_line: i.start.line,
                    start_column: i.start.column,
                    end_line: i.end.line,
                    end_column: i.end.column,
                    lines: i.lines,
                })
                .collect(),
        })
        .collect()
}

pub(crate) fn map_diagnostics(diagnostics: Vec<Diagnostic>) -> Vec<JsonDiagnostic> {
    diagnostics
        .into_iter()
        .map(|d| JsonDiagnostic {
            path: d.path,
            message: d.message,
            line: d.line,
            column: d.column,
        })
        .collect()
}

pub(crate) fn write_json<T: Serialize>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::other(format!("json encode: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use treedup_core::{MatchInstance, Position};

    #[test]
    fn matches_serialize_in_camel_case() {
        let matches = vec![Match {
            hash: "abc".to_string(),
            instances: vec![MatchInstance {
                path: "a.js".into(),
                start: Position::new(1, 0),
                end: Position::new(5, 1),
                lines: Some("function f() {}".to_string()),
            }],
        }];
        let json = serde_json::to_value(map_matches(matches)).expect("serializes");
        assert_eq!(json[0]["hash"], "abc");
        assert_eq!(json[0]["instances"][0]["startLine"], 1);
        assert_eq!(json[0]["instances"][0]["endLine"], 5);
        assert_eq!(json[0]["instances"][0]["path"], "a.js");
    }

    #[test]
    fn absent_lines_are_omitted() {
        let matches = vec![Match {
            hash: "abc".to_string(),
            instances: vec![MatchInstance {
                path: "a.js".into(),
                start: Position::new(1, 0),
                end: Position::new(2, 0),
                lines: None,
            }],
        }];
        let json = serde_json::to_value(map_matches(matches)).expect("serializes");
        assert!(json[0]["instances"][0].get("lines").is_none());
    }
}
