//! Finding types for scan results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    #[default]
    Info,
    /// Warning - likely barrier for assistive technology
    Warning,
    /// Error - definite barrier
    Error,
}

impl Severity {
    /// One level less certain (Error -> Warning -> Info, Info stays Info)
    pub fn downgraded(self) -> Self {
        match self {
            Severity::Error => Severity::Warning,
            Severity::Warning | Severity::Info => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Source location of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// End line of the span (inclusive)
    pub end_line: usize,
    /// End column of the span
    pub end_column: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            end_line: line,
            end_column: column,
        }
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }
}

/// A structured hint on how to resolve a finding; no code is generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// Description of the fix
    pub description: String,
    /// Element the markup should use instead, when the fix is a replacement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_with: Option<String>,
    /// Attribute to add, when the fix is an attribute addition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_attribute: Option<String>,
}

impl SuggestedFix {
    /// Suggest replacing the element with another one
    pub fn replace_with(description: &str, element: &str) -> Self {
        Self {
            description: description.to_string(),
            replace_with: Some(element.to_string()),
            add_attribute: None,
        }
    }

    /// Suggest adding an attribute
    pub fn add_attribute(description: &str, attribute: &str) -> Self {
        Self {
            description: description.to_string(),
            replace_with: None,
            add_attribute: Some(attribute.to_string()),
        }
    }

    /// Free-form hint
    pub fn hint(description: &str) -> Self {
        Self {
            description: description.to_string(),
            replace_with: None,
            add_attribute: None,
        }
    }
}

/// A single detected accessibility issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule ID that triggered this finding
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Source location of the offending element
    pub location: Location,
    /// Suggested fix
    pub suggested_fix: Option<SuggestedFix>,
    /// The offending markup sits inside a conditional render branch
    #[serde(default)]
    pub conditional: bool,
    /// Additional notes
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Finding {
    /// Create a new finding
    pub fn new(rule_id: &str, severity: Severity, message: &str, location: Location) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.to_string(),
            location,
            suggested_fix: None,
            conditional: false,
            notes: Vec::new(),
        }
    }

    /// Attach a suggested fix
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.suggested_fix = Some(fix);
        self
    }

    /// Mark the finding as coming from a conditional branch
    pub fn with_conditional(mut self, conditional: bool) -> Self {
        self.conditional = conditional;
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Key used for deduplication
    pub fn dedup_key(&self) -> (&str, &Location) {
        (&self.rule_id, &self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("info".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_downgrade() {
        assert_eq!(Severity::Error.downgraded(), Severity::Warning);
        assert_eq!(Severity::Warning.downgraded(), Severity::Info);
        assert_eq!(Severity::Info.downgraded(), Severity::Info);
    }

    #[test]
    fn test_finding_creation() {
        let loc = Location::new(PathBuf::from("App.jsx"), 10, 5);
        let finding = Finding::new("img-missing-alt", Severity::Error, "Missing alt", loc)
            .with_fix(SuggestedFix::add_attribute("Describe the image", "alt"))
            .with_conditional(true);

        assert_eq!(finding.rule_id, "img-missing-alt");
        assert!(finding.is_error());
        assert!(finding.conditional);
        assert_eq!(
            finding.suggested_fix.as_ref().and_then(|f| f.add_attribute.as_deref()),
            Some("alt")
        );
    }

    #[test]
    fn test_location_ordering() {
        let a = Location::new(PathBuf::from("a.jsx"), 3, 1).with_end(3, 10);
        let b = Location::new(PathBuf::from("a.jsx"), 3, 12);
        assert!(a < b);
        let c = Location::new(PathBuf::from("b.jsx"), 1, 1);
        assert!(b < c);
    }
}
