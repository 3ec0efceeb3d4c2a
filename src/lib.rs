//! Hermes Clew - static accessibility scanner for component markup
//!
//! Scans JSX-style component markup, handed over as syntax trees, for
//! patterns that make an interface hard to use with assistive technology
//! and automation agents: clickable `<div>`s, icon-only buttons, unlabeled
//! form fields, hand-rolled lists and navigation, silent dynamic regions.
//!
//! # Architecture
//!
//! ```text
//! SyntaxTree -> TreeBuilder -> ElementTree -> Classification
//!            -> Rules -> FindingAggregator -> Report
//! ```
//!
//! The [`Engine`] drives units through that pipeline on a worker pool and
//! collects per-unit [`Report`]s into a [`ScanResult`]. Nothing is executed:
//! expressions in the markup are only inspected.
//!
//! # Example
//!
//! ```
//! use hermes_clew::syntax::{Expr, Span, SyntaxNode, SyntaxTree};
//! use hermes_clew::{Engine, ScanConfig};
//!
//! let unit = SyntaxTree::new("Menu.jsx").with_root(
//!     SyntaxNode::element("div", Span::new(1, 1))
//!         .attr_expr("onClick", Expr::ident("toggle")),
//! );
//! let engine = Engine::new(ScanConfig::default());
//! let report = engine.scan_unit(&unit).unwrap();
//! assert_eq!(report.findings()[0].rule_id, "clickable-non-interactive");
//! ```

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod element;
pub mod engine;
pub mod finding;
pub mod output;
pub mod rule;
pub mod rules;
pub mod score;
pub mod syntax;

// Re-export main types
pub use aggregate::{FindingAggregator, Report, ReportFilter};
pub use classify::{Classification, LandmarkKind, SemanticRole};
pub use config::{Config, ConfigError, ScanConfig};
pub use element::{AttributeValue, BuildError, Element, ElementId, ElementTree, Tag, TreeBuilder};
pub use engine::{Engine, RuleTiming, ScanResult, UnitError, UnitFailure, UnitOutcome};
pub use finding::{Finding, Location, Severity, SuggestedFix};
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use rule::{Rule, RuleCategory, RuleContext, RuleError, RuleRegistry};
pub use score::{Rating, ScoreCard};
pub use syntax::{InputError, SyntaxTree};
