//! Per-unit finding aggregation: conditional downgrade, dedup, ordering

use crate::config::ScanConfig;
use crate::finding::{Finding, Severity};
use crate::rule::RULE_EVALUATION_ERROR;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Read-side filter over a report
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub min_severity: Severity,
    /// Only these rules (empty = all)
    pub allow: BTreeSet<String>,
    /// Never these rules
    pub deny: BTreeSet<String>,
}

impl ReportFilter {
    pub fn matches(&self, finding: &Finding) -> bool {
        finding.severity >= self.min_severity
            && (self.allow.is_empty() || self.allow.contains(&finding.rule_id))
            && !self.deny.contains(&finding.rule_id)
    }
}

/// Ordered findings for one source unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub file: PathBuf,
    findings: Vec<Finding>,
}

impl Report {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            findings: Vec::new(),
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Findings passing the filter, in report order
    pub fn filter<'a>(&'a self, filter: &'a ReportFilter) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| filter.matches(f))
    }

    /// Copy of the report restricted to the filter
    pub fn filtered(&self, filter: &ReportFilter) -> Report {
        Report {
            file: self.file.clone(),
            findings: self.filter(filter).cloned().collect(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Packages the raw findings of one unit into a [`Report`]
pub struct FindingAggregator<'a> {
    config: &'a ScanConfig,
}

impl<'a> FindingAggregator<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, file: &Path, findings: Vec<Finding>) -> Report {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(findings.len());

        for mut finding in findings {
            // Failures of different rules share the unit root as location
            let key = (finding.rule_id.clone(), finding.location.clone());
            if finding.rule_id != RULE_EVALUATION_ERROR && !seen.insert(key) {
                continue;
            }
            if finding.conditional && self.config.treat_conditional_as_lower_severity {
                finding.severity = finding.severity.downgraded();
            }
            out.push(finding);
        }

        out.sort_by(|a, b| {
            (
                &a.location.file,
                a.location.line,
                a.location.column,
                &a.rule_id,
            )
                .cmp(&(
                    &b.location.file,
                    b.location.line,
                    b.location.column,
                    &b.rule_id,
                ))
        });

        Report {
            file: file.to_path_buf(),
            findings: out,
        }
    }
}
