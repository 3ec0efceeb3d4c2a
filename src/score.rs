//! Readiness score card

use crate::engine::ScanResult;
use crate::finding::Severity;
use crate::rule::{Rule, RuleCategory};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Overall readiness band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    #[serde(rename = "Agent-Ready")]
    AgentReady,
    #[serde(rename = "Partially Ready")]
    PartiallyReady,
    #[serde(rename = "Agent-Challenged")]
    AgentChallenged,
    #[serde(rename = "Agent-Invisible")]
    AgentInvisible,
}

impl Rating {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Rating::AgentReady,
            60..=79 => Rating::PartiallyReady,
            40..=59 => Rating::AgentChallenged,
            _ => Rating::AgentInvisible,
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Rating::AgentReady => "agents can navigate and interact with this app",
            Rating::PartiallyReady => "agents can find content but struggle with interactions",
            Rating::AgentChallenged => "agents can see the page but can't do much with it",
            Rating::AgentInvisible => "agents bounce immediately",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::AgentReady => write!(f, "Agent-Ready"),
            Rating::PartiallyReady => write!(f, "Partially Ready"),
            Rating::AgentChallenged => write!(f, "Agent-Challenged"),
            Rating::AgentInvisible => write!(f, "Agent-Invisible"),
        }
    }
}

/// Per-category status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryStatus {
    Strong,
    NeedsWork,
    Weak,
    NotApplicable,
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryStatus::Strong => write!(f, "strong"),
            CategoryStatus::NeedsWork => write!(f, "needs work"),
            CategoryStatus::Weak => write!(f, "weak"),
            CategoryStatus::NotApplicable => write!(f, "n/a"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: RuleCategory,
    pub passed: usize,
    pub total: usize,
    /// Points earned out of `max`
    pub earned: f64,
    pub max: u32,
    pub status: CategoryStatus,
    /// Checks that failed
    pub failed_rules: Vec<String>,
}

/// Score card for one scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    /// 0-100
    pub score: u32,
    pub rating: Rating,
    pub categories: Vec<CategoryScore>,
}

impl ScoreCard {
    /// Score a scan; every rule passed in is one check of its category.
    /// A check fails on a Warning or Error finding of its rule; rules that
    /// only ever report Info fail on any finding.
    pub fn compute<'a>(result: &ScanResult, rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        let rules: Vec<&Rule> = rules.into_iter().collect();
        let info_only: BTreeSet<&str> = rules
            .iter()
            .filter(|r| r.severity == Severity::Info)
            .map(|r| r.id.as_str())
            .collect();
        let failing: BTreeSet<&str> = result
            .findings()
            .filter(|f| f.severity >= Severity::Warning || info_only.contains(f.rule_id.as_str()))
            .map(|f| f.rule_id.as_str())
            .collect();

        let mut categories = Vec::new();
        for category in RuleCategory::ALL {
            let checks: Vec<&Rule> = rules
                .iter()
                .copied()
                .filter(|r| r.category == category)
                .collect();
            let failed_rules: Vec<String> = checks
                .iter()
                .filter(|r| failing.contains(r.id.as_str()))
                .map(|r| r.id.clone())
                .collect();
            let total = checks.len();
            let passed = total - failed_rules.len();
            let max = category.weight();

            let (earned, status) = if total == 0 {
                (0.0, CategoryStatus::NotApplicable)
            } else {
                let ratio = passed as f64 / total as f64;
                let status = if ratio >= 0.8 {
                    CategoryStatus::Strong
                } else if ratio >= 0.5 {
                    CategoryStatus::NeedsWork
                } else {
                    CategoryStatus::Weak
                };
                (ratio * max as f64, status)
            };

            categories.push(CategoryScore {
                category,
                passed,
                total,
                earned,
                max,
                status,
                failed_rules,
            });
        }

        // Categories without checks do not count against the total
        let scored: Vec<&CategoryScore> = categories.iter().filter(|c| c.total > 0).collect();
        let possible: u32 = scored.iter().map(|c| c.max).sum();
        let earned: f64 = scored.iter().map(|c| c.earned).sum();
        let score = if possible == 0 {
            100
        } else {
            (earned / possible as f64 * 100.0).round() as u32
        };

        Self {
            score,
            rating: Rating::from_score(score),
            categories,
        }
    }

    pub fn category(&self, category: RuleCategory) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }
}
