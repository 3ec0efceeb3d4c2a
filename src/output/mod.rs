//! Output formatters for scan results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::engine::ScanResult;
use crate::finding::Finding;
use crate::score::ScoreCard;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire scan result, with the score card when requested
    fn format(&self, result: &ScanResult, score: Option<&ScoreCard>) -> String;

    /// Format a single finding
    fn format_finding(&self, finding: &Finding) -> String;
}
