//! JSON output formatter

use super::OutputFormatter;
use crate::engine::ScanResult;
use crate::finding::{Finding, Severity};
use crate::score::ScoreCard;
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_default()
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    findings: Vec<JsonFinding<'a>>,
    failures: Vec<JsonFailure>,
    summary: JsonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<&'a ScoreCard>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFinding<'a> {
    rule_id: &'a str,
    severity: Severity,
    file: String,
    line: usize,
    column: usize,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_fix: Option<JsonFix<'a>>,
    conditional: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    notes: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFix<'a> {
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    replace_with: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    add_attribute: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonFailure {
    file: String,
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    files_processed: usize,
    files_failed: usize,
    files_with_errors: usize,
    files_with_warnings: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    duration_ms: u128,
}

impl<'a> From<&'a Finding> for JsonFinding<'a> {
    fn from(f: &'a Finding) -> Self {
        JsonFinding {
            rule_id: &f.rule_id,
            severity: f.severity,
            file: f.location.file.display().to_string(),
            line: f.location.line,
            column: f.location.column,
            message: &f.message,
            suggested_fix: f.suggested_fix.as_ref().map(|fix| JsonFix {
                description: &fix.description,
                replace_with: fix.replace_with.as_deref(),
                add_attribute: fix.add_attribute.as_deref(),
            }),
            conditional: f.conditional,
            notes: &f.notes,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &ScanResult, score: Option<&ScoreCard>) -> String {
        let output = JsonOutput {
            findings: result.findings().map(JsonFinding::from).collect(),
            failures: result
                .failures
                .iter()
                .map(|f| JsonFailure {
                    file: f.file.display().to_string(),
                    error: f.error.to_string(),
                })
                .collect(),
            summary: JsonSummary {
                files_processed: result.files_processed,
                files_failed: result.failures.len(),
                files_with_errors: result.files_with_errors,
                files_with_warnings: result.files_with_warnings,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                duration_ms: result.duration.as_millis(),
            },
            score,
        };
        self.render(&output)
    }

    fn format_finding(&self, finding: &Finding) -> String {
        self.render(&JsonFinding::from(finding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FindingAggregator;
    use crate::config::ScanConfig;
    use crate::engine::{UnitError, UnitFailure};
    use crate::finding::{Location, SuggestedFix};
    use std::path::{Path, PathBuf};

    fn finding() -> Finding {
        Finding::new(
            "img-missing-alt",
            Severity::Error,
            "<img> has no alt attribute",
            Location::new(PathBuf::from("src/Gallery.jsx"), 12, 9),
        )
        .with_fix(SuggestedFix::add_attribute("Describe the image", "alt"))
    }

    #[test]
    fn test_json_format_finding() {
        let output = JsonFormatter::new().format_finding(&finding());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["ruleId"], "img-missing-alt");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["file"], "src/Gallery.jsx");
        assert_eq!(value["line"], 12);
        assert_eq!(value["column"], 9);
        assert_eq!(value["conditional"], false);
        assert_eq!(value["suggestedFix"]["addAttribute"], "alt");
        assert!(value["suggestedFix"].get("replaceWith").is_none());
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_json_format_result() {
        let config = ScanConfig::default();
        let result = ScanResult {
            reports: vec![FindingAggregator::new(&config)
                .aggregate(Path::new("src/Gallery.jsx"), vec![finding()])],
            failures: vec![UnitFailure::new(
                Path::new("src/Broken.jsx"),
                UnitError::Input("Invalid syntax tree".to_string()),
            )],
            files_processed: 2,
            error_count: 1,
            files_with_errors: 1,
            ..ScanResult::default()
        };

        let output = JsonFormatter::new().format(&result, None);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["findings"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["failures"][0]["file"], "src/Broken.jsx");
        assert_eq!(value["summary"]["filesProcessed"], 2);
        assert_eq!(value["summary"]["filesFailed"], 1);
        assert_eq!(value["summary"]["errorCount"], 1);
        assert!(value.get("score").is_none());
    }

    #[test]
    fn test_json_includes_score() {
        let result = ScanResult::default();
        let card = ScoreCard::compute(&result, &crate::rules::builtin_rules());
        let output = JsonFormatter::new().format(&result, Some(&card));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["score"]["score"], 100);
        assert_eq!(value["score"]["rating"], "Agent-Ready");
    }

    #[test]
    fn test_json_pretty() {
        let output = JsonFormatter::new().pretty().format_finding(&finding());
        assert!(output.contains('\n'));
    }
}
