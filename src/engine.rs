//! Scan orchestration: build, classify, evaluate, aggregate

use crate::aggregate::{FindingAggregator, Report, ReportFilter};
use crate::classify::Classification;
use crate::config::ScanConfig;
use crate::element::{BuildError, ElementTree, TreeBuilder};
use crate::finding::{Finding, Severity};
use crate::rule::{Rule, RuleContext, RuleRegistry, RULE_EVALUATION_ERROR};
use crate::rules::builtin_rules;
use crate::syntax::SyntaxTree;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Per-rule timing statistics
#[derive(Debug, Clone, Default)]
pub struct RuleTiming {
    /// Rule ID
    pub rule_id: String,
    /// Total time spent on this rule
    pub total_time: Duration,
    /// Number of units the rule was evaluated on
    pub evaluation_count: usize,
    /// Number of findings produced
    pub match_count: usize,
}

impl RuleTiming {
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }
}

/// Why a unit produced no report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The syntax tree could not be loaded
    #[error("{0}")]
    Input(String),

    /// A panic outside rule evaluation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A unit that failed as a whole; reported as data, never raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub file: PathBuf,
    #[serde(serialize_with = "serialize_display")]
    pub error: UnitError,
}

fn serialize_display<S: serde::Serializer>(error: &UnitError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

impl UnitFailure {
    pub fn new(file: &Path, error: UnitError) -> Self {
        Self {
            file: file.to_path_buf(),
            error,
        }
    }
}

pub type UnitOutcome = Result<Report, UnitFailure>;

/// Result of a scan over many units
#[derive(Debug, Default)]
pub struct ScanResult {
    /// One report per successfully scanned unit, sorted by path
    pub reports: Vec<Report>,

    /// Units that could not be scanned, sorted by path
    pub failures: Vec<UnitFailure>,

    /// Units processed, failed ones included
    pub files_processed: usize,

    /// Units with at least one error
    pub files_with_errors: usize,

    /// Units with at least one warning
    pub files_with_warnings: usize,

    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,

    /// Processing duration
    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl ScanResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// No errors or warnings
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// Get exit code (0 = clean, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    /// All findings, report by report
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.reports.iter().flat_map(|r| r.findings().iter())
    }

    /// Record the outcome of one unit
    fn add_outcome(&mut self, outcome: UnitOutcome) {
        self.files_processed += 1;
        match outcome {
            Ok(report) => {
                let errors = report.count(Severity::Error);
                let warnings = report.count(Severity::Warning);
                self.error_count += errors;
                self.warning_count += warnings;
                self.info_count += report.count(Severity::Info);
                if errors > 0 {
                    self.files_with_errors += 1;
                }
                if warnings > 0 {
                    self.files_with_warnings += 1;
                }
                self.reports.push(report);
            }
            Err(failure) => {
                warn!("Skipping {}: {}", failure.file.display(), failure.error);
                self.failures.push(failure);
            }
        }
    }

    fn add_timings(&mut self, timings: HashMap<String, RuleTiming>) {
        for (rule_id, timing) in timings {
            let entry = self
                .rule_timings
                .entry(rule_id)
                .or_insert_with(|| RuleTiming::new(&timing.rule_id));
            entry.total_time += timing.total_time;
            entry.evaluation_count += timing.evaluation_count;
            entry.match_count += timing.match_count;
        }
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ScanResult) {
        self.reports.extend(other.reports);
        self.failures.extend(other.failures);
        self.files_processed += other.files_processed;
        self.files_with_errors += other.files_with_errors;
        self.files_with_warnings += other.files_with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
        self.add_timings(other.rule_timings);
        self.sort();
    }

    fn sort(&mut self) {
        self.reports.sort_by(|a, b| a.file.cmp(&b.file));
        self.failures.sort_by(|a, b| a.file.cmp(&b.file));
    }

    /// Get rule timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<&RuleTiming> {
        let mut timings: Vec<_> = self.rule_timings.values().collect();
        timings.sort_by(|a, b| {
            b.total_time
                .cmp(&a.total_time)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        timings
    }

    /// Format timing statistics as a table
    pub fn format_timings(&self) -> String {
        let timings = self.sorted_timings();
        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        let mut output = String::new();
        output.push_str("Rule Timing Statistics:\n");
        output.push_str(&format!(
            "{:<40} {:>12} {:>12} {:>10} {:>12}\n",
            "Rule ID", "Total", "Avg", "Evals", "Matches"
        ));
        output.push_str(&"-".repeat(90));
        output.push('\n');

        for timing in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;
            output.push_str(&format!(
                "{:<40} {:>10.2}ms {:>10.2}µs {:>10} {:>12}\n",
                timing.rule_id, total_ms, avg_us, timing.evaluation_count, timing.match_count
            ));
        }

        output
    }
}

/// The scanner engine
pub struct Engine {
    config: Arc<ScanConfig>,
    registry: RuleRegistry,
    parallel: bool,
    jobs: usize,
}

impl Engine {
    /// Engine with the built-in rules
    pub fn new(config: ScanConfig) -> Self {
        let mut registry = RuleRegistry::new();
        for rule in builtin_rules() {
            if let Err(e) = registry.register(rule) {
                warn!("{}", e);
            }
        }
        Self::with_registry(config, registry)
    }

    /// Engine over a caller-supplied rule set
    pub fn with_registry(config: ScanConfig, registry: RuleRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            parallel: true,
            jobs: 0,
        }
    }

    /// Worker settings; `jobs == 0` uses one thread per CPU
    pub fn with_parallelism(mut self, parallel: bool, jobs: usize) -> Self {
        self.parallel = parallel;
        self.jobs = jobs;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Rules this engine runs, in registration order
    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.registry.enabled(&self.config)
    }

    /// Scan a batch of syntax trees
    pub fn scan(&self, units: &[SyntaxTree]) -> ScanResult {
        let start = Instant::now();
        let outcomes = self.run_all(units, |unit| self.scan_unit_timed(unit));
        let result = self.collect(outcomes, start);
        info!(
            "Scanned {} units in {:?}: {} errors, {} warnings, {} failures",
            result.files_processed,
            result.duration,
            result.error_count,
            result.warning_count,
            result.failures.len()
        );
        result
    }

    /// Load and scan syntax-tree files; unreadable files become failures
    pub fn scan_files(&self, files: &[PathBuf]) -> ScanResult {
        let start = Instant::now();
        let outcomes = self.run_all(files, |path| match SyntaxTree::load(path) {
            Ok(unit) => self.scan_unit_timed(&unit),
            Err(e) => (
                Err(UnitFailure::new(path, UnitError::Input(e.to_string()))),
                HashMap::new(),
            ),
        });
        let result = self.collect(outcomes, start);
        info!(
            "Scanned {} files in {:?}: {} errors, {} warnings, {} failures",
            result.files_processed,
            result.duration,
            result.error_count,
            result.warning_count,
            result.failures.len()
        );
        result
    }

    /// Scan one unit
    pub fn scan_unit(&self, unit: &SyntaxTree) -> UnitOutcome {
        self.scan_unit_timed(unit).0
    }

    fn run_all<T, F>(&self, items: &[T], scan: F) -> Vec<(UnitOutcome, HashMap<String, RuleTiming>)>
    where
        T: Sync,
        F: Fn(&T) -> (UnitOutcome, HashMap<String, RuleTiming>) + Sync + Send,
    {
        if !self.parallel {
            return items.iter().map(&scan).collect();
        }

        let threads = if self.jobs > 0 {
            self.jobs
        } else {
            num_cpus::get()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| items.par_iter().map(&scan).collect()),
            Err(e) => {
                warn!("Could not start {} workers ({}), using the global pool", threads, e);
                items.par_iter().map(&scan).collect()
            }
        }
    }

    fn collect(
        &self,
        outcomes: Vec<(UnitOutcome, HashMap<String, RuleTiming>)>,
        start: Instant,
    ) -> ScanResult {
        let mut result = ScanResult::default();
        for (outcome, timings) in outcomes {
            result.add_outcome(outcome);
            result.add_timings(timings);
        }
        result.sort();
        result.duration = start.elapsed();
        result
    }

    fn scan_unit_timed(&self, unit: &SyntaxTree) -> (UnitOutcome, HashMap<String, RuleTiming>) {
        debug!("Scanning {}", unit.file.display());
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_scan_unit(unit))) {
            Ok(Ok((report, timings))) => (Ok(report), timings),
            Ok(Err(e)) => (Err(UnitFailure::new(&unit.file, e)), HashMap::new()),
            Err(payload) => (
                Err(UnitFailure::new(
                    &unit.file,
                    UnitError::Internal(panic_message(payload.as_ref())),
                )),
                HashMap::new(),
            ),
        }
    }

    fn try_scan_unit(
        &self,
        unit: &SyntaxTree,
    ) -> Result<(Report, HashMap<String, RuleTiming>), UnitError> {
        let built = TreeBuilder::build(unit)?;
        let roles = Classification::classify(&built.tree);
        debug!(
            "{}: {} elements classified",
            unit.file.display(),
            roles.len()
        );

        let (findings, timings) = self.evaluate_rules(&built.tree, &roles);

        let mut all = built.findings;
        all.extend(findings);
        let report = FindingAggregator::new(&self.config).aggregate(&unit.file, all);
        let filter = ReportFilter {
            min_severity: self.config.min_severity,
            ..ReportFilter::default()
        };
        Ok((report.filtered(&filter), timings))
    }

    /// Run every enabled rule; a failing rule becomes an Info finding
    fn evaluate_rules(
        &self,
        tree: &ElementTree,
        roles: &Classification,
    ) -> (Vec<Finding>, HashMap<String, RuleTiming>) {
        let ctx = RuleContext {
            tree,
            roles,
            config: &self.config,
        };
        let mut findings = Vec::new();
        let mut timings: HashMap<String, RuleTiming> = HashMap::new();

        for rule in self.registry.enabled(&self.config) {
            let start = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(&ctx)));
            let elapsed = start.elapsed();

            let timing = timings
                .entry(rule.id.clone())
                .or_insert_with(|| RuleTiming::new(&rule.id));
            timing.total_time += elapsed;
            timing.evaluation_count += 1;

            let failure = match outcome {
                Ok(Ok(found)) => {
                    timing.match_count += found.len();
                    findings.extend(found.into_iter().map(|mut f| {
                        f.severity = self.config.severity_for(&rule.id, f.severity);
                        f
                    }));
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            warn!(
                "Rule {} failed on {}: {}",
                rule.id,
                tree.file.display(),
                failure
            );
            findings.push(
                Finding::new(
                    RULE_EVALUATION_ERROR,
                    Severity::Info,
                    &format!("Rule '{}' could not be evaluated: {}", rule.id, failure),
                    tree.root().location.clone(),
                )
                .with_note(&rule.id),
            );
        }

        (findings, timings)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleCategory, RuleError};
    use crate::rules::{CLICKABLE_NON_INTERACTIVE, IMG_MISSING_ALT};
    use crate::syntax::{Span, SyntaxNode};

    fn unit(file: &str, root: SyntaxNode) -> SyntaxTree {
        SyntaxTree::new(file).with_root(root)
    }

    fn img(line: usize) -> SyntaxNode {
        SyntaxNode::element("img", Span::new(line, 1))
    }

    fn failing(_: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        Err(RuleError::UnexpectedShape {
            rule: "always-fails".to_string(),
            detail: "no tree".to_string(),
        })
    }

    fn panicking(_: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        panic!("boom")
    }

    #[test]
    fn test_scan_result_exit_code() {
        let mut result = ScanResult::default();
        assert_eq!(result.exit_code(), 0);
        assert!(result.is_clean());

        result.warning_count = 1;
        assert_eq!(result.exit_code(), 1);

        result.error_count = 1;
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_scan_result_merge() {
        let mut result1 = ScanResult {
            files_processed: 1,
            error_count: 2,
            ..ScanResult::default()
        };
        let mut result2 = ScanResult {
            files_processed: 1,
            warning_count: 3,
            ..ScanResult::default()
        };
        result2
            .rule_timings
            .insert("r".to_string(), RuleTiming::new("r"));
        result1.rule_timings.insert(
            "r".to_string(),
            RuleTiming {
                evaluation_count: 2,
                ..RuleTiming::new("r")
            },
        );

        result1.merge(result2);
        assert_eq!(result1.files_processed, 2);
        assert_eq!(result1.error_count, 2);
        assert_eq!(result1.warning_count, 3);
        assert_eq!(result1.rule_timings["r"].evaluation_count, 2);
    }

    #[test]
    fn test_scan_unit() {
        let engine = Engine::new(ScanConfig::default());
        let report = engine
            .scan_unit(&unit("Gallery.jsx", SyntaxNode::element("div", Span::new(1, 1)).child(img(2))))
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.findings()[0].rule_id, IMG_MISSING_ALT);
        assert_eq!(report.file, PathBuf::from("Gallery.jsx"));
    }

    #[test]
    fn test_empty_unit_is_a_failure() {
        let engine = Engine::new(ScanConfig::default());
        let outcome = engine.scan_unit(&SyntaxTree::new("Empty.jsx"));
        let failure = outcome.unwrap_err();
        assert!(matches!(failure.error, UnitError::Build(_)));
    }

    #[test]
    fn test_scan_sorts_and_counts() {
        let engine = Engine::new(ScanConfig::default()).with_parallelism(true, 2);
        let result = engine.scan(&[
            unit("b/Second.jsx", img(1)),
            SyntaxTree::new("Broken.jsx"),
            unit("a/First.jsx", img(1)),
        ]);

        assert_eq!(result.files_processed, 3);
        assert_eq!(result.failures.len(), 1);
        let files: Vec<&Path> = result.reports.iter().map(|r| r.file.as_path()).collect();
        assert_eq!(files, vec![Path::new("a/First.jsx"), Path::new("b/Second.jsx")]);
        assert_eq!(result.error_count, 2);
        assert_eq!(result.files_with_errors, 2);
        assert_eq!(result.exit_code(), 2);
        assert_eq!(result.rule_timings[IMG_MISSING_ALT].evaluation_count, 2);
        assert_eq!(result.rule_timings[IMG_MISSING_ALT].match_count, 2);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let units = vec![unit("One.jsx", img(1)), unit("Two.jsx", img(3))];
        let parallel = Engine::new(ScanConfig::default()).scan(&units);
        let sequential = Engine::new(ScanConfig::default())
            .with_parallelism(false, 0)
            .scan(&units);
        assert_eq!(parallel.reports, sequential.reports);
    }

    #[test]
    fn test_failing_rules_become_info_findings() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Rule::new("always-fails", RuleCategory::Aria, failing))
            .unwrap();
        registry
            .register(Rule::new("always-panics", RuleCategory::Aria, panicking))
            .unwrap();
        for rule in builtin_rules() {
            registry.register(rule).unwrap();
        }
        let engine = Engine::with_registry(ScanConfig::default(), registry);

        let report = engine.scan_unit(&unit("App.jsx", img(2))).unwrap();
        let errors: Vec<&Finding> = report
            .findings()
            .iter()
            .filter(|f| f.rule_id == RULE_EVALUATION_ERROR)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|f| f.severity == Severity::Info));
        assert!(errors.iter().any(|f| f.message.contains("always-fails")));
        assert!(errors.iter().any(|f| f.message.contains("always-panics")));
        // Rules after the failing ones still ran
        assert!(report.findings().iter().any(|f| f.rule_id == IMG_MISSING_ALT));
    }

    #[test]
    fn test_severity_override_and_min_severity() {
        let mut config = ScanConfig::default();
        config
            .severity_overrides
            .insert(IMG_MISSING_ALT.to_string(), Severity::Info);
        config.min_severity = Severity::Warning;
        let engine = Engine::new(config);

        let report = engine
            .scan_unit(&unit(
                "App.jsx",
                SyntaxNode::element("div", Span::new(1, 1))
                    .child(img(2))
                    .child(
                        SyntaxNode::element("div", Span::new(3, 1))
                            .attr_expr("onClick", crate::syntax::Expr::ident("open")),
                    ),
            ))
            .unwrap();
        let ids: Vec<&str> = report.findings().iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec![CLICKABLE_NON_INTERACTIVE]);
    }

    #[test]
    fn test_disabled_rules_do_not_run() {
        let mut config = ScanConfig::default();
        config.disabled.insert(IMG_MISSING_ALT.to_string());
        let engine = Engine::new(config);
        let result = engine.scan(&[unit("App.jsx", img(1))]);
        assert!(result.is_clean());
        assert!(!result.rule_timings.contains_key(IMG_MISSING_ALT));
    }

    #[test]
    fn test_scan_files_reports_unreadable_input() {
        let engine = Engine::new(ScanConfig::default());
        let result = engine.scan_files(&[PathBuf::from("/nonexistent/App.ast.json")]);
        assert_eq!(result.files_processed, 1);
        assert!(result.reports.is_empty());
        assert!(matches!(result.failures[0].error, UnitError::Input(_)));
    }

    #[test]
    fn test_format_timings() {
        let result = ScanResult::default();
        assert_eq!(result.format_timings(), "No timing data available");

        let engine = Engine::new(ScanConfig::default());
        let result = engine.scan(&[unit("App.jsx", img(1))]);
        let table = result.format_timings();
        assert!(table.starts_with("Rule Timing Statistics:"));
        assert!(table.contains(IMG_MISSING_ALT));
    }
}
