//! Rule definition and registry

use crate::classify::Classification;
use crate::config::ScanConfig;
use crate::element::ElementTree;
use crate::finding::{Finding, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rule id of the synthetic finding reported when a rule fails
pub const RULE_EVALUATION_ERROR: &str = "rule-evaluation-error";

/// Error raised by a rule evaluator or at registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Rule '{rule}' met an unexpected tree shape: {detail}")]
    UnexpectedShape { rule: String, detail: String },

    #[error("Rule '{rule}' is misconfigured: {detail}")]
    InvalidConfig { rule: String, detail: String },

    #[error("Rule '{0}' is already registered")]
    Duplicate(String),
}

/// Rule category, matching the readiness score categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    /// Native elements instead of generic containers
    SemanticHtml,
    /// Labels and real form controls
    FormAccessibility,
    /// Names, live regions and ARIA roles
    Aria,
    /// Links and navigation structure
    LinkNavigation,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::SemanticHtml,
        RuleCategory::FormAccessibility,
        RuleCategory::Aria,
        RuleCategory::LinkNavigation,
    ];

    /// Weight of the category in the readiness score
    pub fn weight(self) -> u32 {
        match self {
            RuleCategory::SemanticHtml => 25,
            RuleCategory::FormAccessibility => 20,
            RuleCategory::Aria => 15,
            RuleCategory::LinkNavigation => 10,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::SemanticHtml => write!(f, "semantic-html"),
            RuleCategory::FormAccessibility => write!(f, "form-accessibility"),
            RuleCategory::Aria => write!(f, "aria"),
            RuleCategory::LinkNavigation => write!(f, "link-navigation"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "semantic-html" | "semantic" => Ok(RuleCategory::SemanticHtml),
            "form-accessibility" | "forms" => Ok(RuleCategory::FormAccessibility),
            "aria" => Ok(RuleCategory::Aria),
            "link-navigation" | "links" => Ok(RuleCategory::LinkNavigation),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Everything a rule may read while evaluating one tree
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub tree: &'a ElementTree,
    pub roles: &'a Classification,
    pub config: &'a ScanConfig,
}

/// Rule evaluator: a pure function of the classified tree
pub type Evaluate = fn(&RuleContext<'_>) -> Result<Vec<Finding>, RuleError>;

/// A scan rule definition
#[derive(Clone)]
pub struct Rule {
    /// Unique rule identifier (e.g., "img-missing-alt")
    pub id: String,

    /// Human-readable name
    pub name: Option<String>,

    /// Detailed description
    pub description: Option<String>,

    /// Default severity level
    pub severity: Severity,

    /// Score category
    pub category: RuleCategory,

    /// Tags for categorization
    pub tags: Vec<String>,

    /// Rationale explaining why this rule exists
    pub rationale: Option<String>,

    /// Example of markup that violates this rule
    pub example_bad: Option<String>,

    /// Example of correct markup
    pub example_good: Option<String>,

    /// Evaluator
    pub evaluate: Evaluate,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Create a new rule with minimal required fields
    pub fn new(id: &str, category: RuleCategory, evaluate: Evaluate) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            description: None,
            severity: Severity::Warning,
            category,
            tags: Vec::new(),
            rationale: None,
            example_bad: None,
            example_good: None,
            evaluate,
        }
    }

    /// Set the human-readable name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the description
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Set the rationale
    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    /// Set bad example
    pub fn with_example_bad(mut self, example: &str) -> Self {
        self.example_bad = Some(example.to_string());
        self
    }

    /// Set good example
    pub fn with_example_good(mut self, example: &str) -> Self {
        self.example_good = Some(example.to_string());
        self
    }

    /// Run the evaluator
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        (self.evaluate)(ctx)
    }
}

/// Ordered, append-only collection of rules
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; ids are unique
    pub fn register(&mut self, rule: Rule) -> Result<(), RuleError> {
        if self.get(&rule.id).is_some() {
            return Err(RuleError::Duplicate(rule.id));
        }
        log::debug!("Registered rule {}", rule.id);
        self.rules.push(rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Rule ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    /// Rules the configuration enables, in registration order
    pub fn enabled<'a>(&'a self, config: &'a ScanConfig) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(|r| config.is_rule_enabled(&r.id))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        Ok(Vec::new())
    }

    #[test]
    fn test_rule_builder() {
        let rule = Rule::new("test", RuleCategory::Aria, noop)
            .with_severity(Severity::Error)
            .with_name("Test rule")
            .with_tag("wcag-4.1.2")
            .with_example_bad("<div />")
            .with_example_good("<button />");

        assert_eq!(rule.severity, Severity::Error);
        assert_eq!(rule.name.as_deref(), Some("Test rule"));
        assert_eq!(rule.tags, vec!["wcag-4.1.2"]);
        assert_eq!(rule.example_good.as_deref(), Some("<button />"));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Rule::new("a", RuleCategory::Aria, noop))
            .unwrap();
        registry
            .register(Rule::new("b", RuleCategory::Aria, noop))
            .unwrap();
        let err = registry
            .register(Rule::new("a", RuleCategory::SemanticHtml, noop))
            .unwrap_err();
        assert_eq!(err, RuleError::Duplicate("a".to_string()));
        assert_eq!(registry.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_registry_enabled_filter() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Rule::new("a", RuleCategory::Aria, noop))
            .unwrap();
        registry
            .register(Rule::new("b", RuleCategory::Aria, noop))
            .unwrap();
        let mut config = ScanConfig::default();
        config.disabled.insert("a".to_string());
        let enabled: Vec<&str> = registry.enabled(&config).map(|r| r.id.as_str()).collect();
        assert_eq!(enabled, vec!["b"]);
    }

    #[test]
    fn test_category_weights() {
        let total: u32 = RuleCategory::ALL.iter().map(|c| c.weight()).sum();
        assert_eq!(total, 70);
        assert_eq!(
            "semantic_html".parse::<RuleCategory>(),
            Ok(RuleCategory::SemanticHtml)
        );
        assert_eq!(RuleCategory::LinkNavigation.to_string(), "link-navigation");
    }
}
