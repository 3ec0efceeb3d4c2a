//! Human-readable text output formatter

use super::OutputFormatter;
use crate::engine::ScanResult;
use crate::finding::{Finding, Severity};
use crate::score::{CategoryStatus, ScoreCard};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show fix suggestions
    pub show_fixes: bool,

    /// Show notes
    pub show_notes: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_fixes: true,
            show_notes: true,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Hide the summary footer
    pub fn without_stats(mut self) -> Self {
        self.show_stats = false;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.to_string();
        match severity {
            Severity::Error => self.paint(&s, |t| t.red().bold()),
            Severity::Warning => self.paint(&s, |t| t.yellow().bold()),
            Severity::Info => self.paint(&s, |t| t.blue()),
        }
    }

    fn count_str(&self, count: usize, noun: &str, style: fn(&str) -> ColoredString) -> String {
        let s = format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" });
        self.paint(&s, style)
    }

    fn format_score(&self, card: &ScoreCard) -> String {
        let mut output = String::new();
        let headline = format!("Readiness score: {}/100 ({})", card.score, card.rating);
        output.push_str(&self.paint(&headline, |t| t.bold()));
        output.push_str(&format!(" - {}\n", card.rating.summary()));

        for category in &card.categories {
            let status = category.status.to_string();
            let status = match category.status {
                CategoryStatus::Strong => self.paint(&status, |t| t.green()),
                CategoryStatus::NeedsWork => self.paint(&status, |t| t.yellow()),
                CategoryStatus::Weak => self.paint(&status, |t| t.red()),
                CategoryStatus::NotApplicable => self.paint(&status, |t| t.dimmed()),
            };
            output.push_str(&format!(
                "  {:<20} {:>5.1}/{:<3} {}/{} checks passed  {}\n",
                category.category.to_string(),
                category.earned,
                category.max,
                category.passed,
                category.total,
                status
            ));
        }
        output
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &ScanResult, score: Option<&ScoreCard>) -> String {
        let mut output = String::new();

        // Reports are already sorted by path
        for report in result.reports.iter().filter(|r| !r.is_empty()) {
            let file = report.file.display().to_string();
            output.push_str(&self.paint(&file, |t| t.underline()));
            output.push('\n');

            for finding in report.findings() {
                output.push_str(&self.format_finding(finding));
            }
            output.push('\n');
        }

        for failure in &result.failures {
            output.push_str(&format!(
                "{}: {}: {}\n",
                failure.file.display(),
                self.paint("failed", |t| t.red().bold()),
                failure.error
            ));
        }

        if let Some(card) = score {
            output.push('\n');
            output.push_str(&self.format_score(card));
        }

        if self.show_stats {
            output.push_str(&format!(
                "\n{} {} processed",
                result.files_processed,
                if result.files_processed == 1 {
                    "file"
                } else {
                    "files"
                }
            ));

            let mut counts = Vec::new();
            if result.error_count > 0 {
                counts.push(self.count_str(result.error_count, "error", |t| t.red()));
            }
            if result.warning_count > 0 {
                counts.push(self.count_str(result.warning_count, "warning", |t| t.yellow()));
            }
            if result.info_count > 0 {
                counts.push(self.count_str(result.info_count, "info", |t| t.blue()));
            }
            if !result.failures.is_empty() {
                counts.push(self.count_str(result.failures.len(), "failure", |t| t.red()));
            }

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}:{}:{}: {}[{}]: {}",
            finding.location.file.display(),
            finding.location.line,
            finding.location.column,
            self.severity_str(finding.severity),
            self.paint(&finding.rule_id, |t| t.cyan()),
            finding.message
        ));
        if finding.conditional {
            output.push_str(&self.paint(" (conditional)", |t| t.dimmed()));
        }
        output.push('\n');

        if self.show_fixes {
            if let Some(fix) = &finding.suggested_fix {
                let target = match (&fix.replace_with, &fix.add_attribute) {
                    (Some(element), _) => format!(" -> <{}>", element),
                    (None, Some(attribute)) => format!(" -> add {}", attribute),
                    (None, None) => String::new(),
                };
                output.push_str(&format!(
                    "   {} fix: {}{}\n",
                    self.paint("=", |t| t.green()),
                    fix.description,
                    self.paint(&target, |t| t.green())
                ));
            }
        }

        if self.show_notes {
            for note in &finding.notes {
                output.push_str(&format!(
                    "   {} note: {}\n",
                    self.paint("=", |t| t.blue()),
                    note
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FindingAggregator;
    use crate::config::ScanConfig;
    use crate::finding::{Location, SuggestedFix};
    use std::path::{Path, PathBuf};

    fn finding(line: usize) -> Finding {
        Finding::new(
            "clickable-non-interactive",
            Severity::Warning,
            "<div> has an onClick handler but no interactive role or keyboard handler",
            Location::new(PathBuf::from("Menu.jsx"), line, 5),
        )
        .with_fix(SuggestedFix::replace_with("Use <button>", "button"))
    }

    #[test]
    fn test_format_finding() {
        let formatter = TextFormatter::new().without_color();
        let output = formatter.format_finding(&finding(10).with_conditional(true));
        assert!(output.starts_with("Menu.jsx:10:5: warning[clickable-non-interactive]: "));
        assert!(output.contains("(conditional)"));
        assert!(output.contains("fix: Use <button> -> <button>"));
    }

    #[test]
    fn test_format_result() {
        let formatter = TextFormatter::new().without_color();
        let config = ScanConfig::default();
        let result = ScanResult {
            reports: vec![FindingAggregator::new(&config)
                .aggregate(Path::new("Menu.jsx"), vec![finding(3), finding(7)])],
            files_processed: 1,
            warning_count: 2,
            files_with_warnings: 1,
            ..ScanResult::default()
        };

        let output = formatter.format(&result, None);
        assert!(output.starts_with("Menu.jsx\n"));
        assert!(output.find("Menu.jsx:3:5") < output.find("Menu.jsx:7:5"));
        assert!(output.contains("1 file processed: 2 warnings"));
        assert!(!output.contains("Readiness score"));
    }

    #[test]
    fn test_format_score() {
        let formatter = TextFormatter::new().without_color().without_stats();
        let result = ScanResult::default();
        let card = ScoreCard::compute(&result, &crate::rules::builtin_rules());
        let output = formatter.format(&result, Some(&card));
        assert!(output.contains("Readiness score: 100/100 (Agent-Ready)"));
        assert!(output.contains("semantic-html"));
        assert!(!output.contains("processed"));
    }
}
