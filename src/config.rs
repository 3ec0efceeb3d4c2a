//! Configuration system for the scanner
//!
//! Reads configuration from:
//! - `.hermesrc.yaml` / `.hermesrc.json` (project-level)
//! - `~/.hermesrc.yaml` (user-level)
//!
//! The file form is [`Config`]; a scan runs against the immutable
//! [`ScanConfig`] compiled from it.

use crate::finding::Severity;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Symbol-only text (`×`, `☰`, `⚙`, `+`)
pub const DEFAULT_ICON_GLYPH_PATTERN: &str = r"^[^\p{L}\p{N}\s]+$";

/// Callee paths and assignment targets that change location
pub const DEFAULT_NAVIGATION_PATTERN: &str = r"(?i)^(?:(?:\w+\.)*navigate|redirect|(?:\w+\.)*(?:router|history)\.(?:push|replace|go|back|navigate)|(?:window\.)?location(?:\.href|\.pathname|\.hash|\.assign|\.replace)?|set(?:Active)?(?:Tab|Page|View|Route|Section|Screen)\w*)$";

/// Class names that mark navigation items
pub const DEFAULT_NAVIGATION_CLASS_PATTERN: &str = r"(?i)(?:^|\s)(?:nav|navbar|nav-[\w-]+|tab|tabs|tab-[\w-]+|menu-item|menu-link|breadcrumb[\w-]*|sidebar-(?:item|link))(?:\s|$)";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid file pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scan source units in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Rule and pattern settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Enabled rules (empty = all)
    pub rules: Vec<String>,

    /// Disabled rules
    pub disabled: Vec<String>,

    /// Minimum reported severity
    pub min_severity: Option<Severity>,

    /// Severity overrides (rule_id -> severity)
    pub severity: BTreeMap<String, Severity>,

    /// Text treated as an icon glyph
    pub icon_glyph_pattern: Option<String>,

    /// Handler effects treated as navigation
    pub navigation_pattern: Option<String>,

    /// Class names treated as navigation items
    pub navigation_class_pattern: Option<String>,

    /// Downgrade findings from conditional branches by one level
    pub treat_conditional_as_lower_severity: Option<bool>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Color mode
    pub color: ColorMode,

    /// Verbose output
    pub verbose: bool,

    /// Show statistics
    pub statistics: bool,

    /// Show the readiness score card
    pub score: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            verbose: false,
            statistics: true,
            score: false,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// File handling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Include patterns
    pub include: Vec<String>,

    /// Exclude patterns
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.ast.json".to_string()],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
            ],
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extend from other configuration files or presets
    pub extends: Vec<String>,

    /// Engine settings
    pub engine: EngineConfig,

    /// Rule and pattern settings
    pub scan: ScanSection,

    /// File handling settings
    pub files: FilesConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub verbose: Option<bool>,
    pub jobs: Option<usize>,
    pub min_severity: Option<Severity>,
    pub enabled_rules: Option<Vec<String>>,
    pub disabled_rules: Option<Vec<String>>,
    pub icon_glyph_pattern: Option<String>,
    pub conditional_downgrade: Option<bool>,
    pub color: Option<ColorMode>,
    pub score: Option<bool>,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::default()),
            "strict" => Some(Self::preset_strict()),
            "errors-only" => Some(Self::preset_errors_only()),
            _ => None,
        }
    }

    /// Strict preset - every finding at full severity
    fn preset_strict() -> Self {
        let mut config = Self::default();
        config.scan.min_severity = Some(Severity::Info);
        config.scan.treat_conditional_as_lower_severity = Some(false);
        config
    }

    /// Errors-only preset - definite barriers only
    fn preset_errors_only() -> Self {
        let mut config = Self::default();
        config.scan.min_severity = Some(Severity::Error);
        config
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    /// Load with recursion depth limit (to prevent infinite loops)
    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };
        log::debug!("Loaded configuration from {}", path.display());

        if !config.extends.is_empty() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            let mut base_config = Self::default();

            for extend in &config.extends.clone() {
                let extended = if let Some(preset) = Self::preset(extend) {
                    preset
                } else {
                    let extend_path = if Path::new(extend).is_absolute() {
                        PathBuf::from(extend)
                    } else {
                        base_dir.join(extend)
                    };
                    Self::load_with_depth(&extend_path, depth + 1)?
                };
                base_config.merge(extended);
            }

            base_config.merge(config);
            config = base_config;
        }

        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;

        if !other.scan.rules.is_empty() {
            self.scan.rules = other.scan.rules;
        }
        self.scan.disabled.extend(other.scan.disabled);
        self.scan.severity.extend(other.scan.severity);
        if other.scan.min_severity.is_some() {
            self.scan.min_severity = other.scan.min_severity;
        }
        if other.scan.icon_glyph_pattern.is_some() {
            self.scan.icon_glyph_pattern = other.scan.icon_glyph_pattern;
        }
        if other.scan.navigation_pattern.is_some() {
            self.scan.navigation_pattern = other.scan.navigation_pattern;
        }
        if other.scan.navigation_class_pattern.is_some() {
            self.scan.navigation_class_pattern = other.scan.navigation_class_pattern;
        }
        if other.scan.treat_conditional_as_lower_severity.is_some() {
            self.scan.treat_conditional_as_lower_severity =
                other.scan.treat_conditional_as_lower_severity;
        }

        // Files - extend lists
        for pattern in other.files.include {
            if !self.files.include.contains(&pattern) {
                self.files.include.push(pattern);
            }
        }
        for pattern in other.files.exclude {
            if !self.files.exclude.contains(&pattern) {
                self.files.exclude.push(pattern);
            }
        }

        if other.output.format != OutputFormat::Text {
            self.output.format = other.output.format;
        }
        if other.output.verbose {
            self.output.verbose = true;
        }
        if other.output.color != ColorMode::Auto {
            self.output.color = other.output.color;
        }
        if other.output.score {
            self.output.score = true;
        }
        self.output.statistics = other.output.statistics;
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [
            ".hermesrc.yaml",
            ".hermesrc.yml",
            ".hermesrc.json",
            "hermes.yaml",
            "hermes.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(f) = cli.format {
            self.output.format = f;
        }
        if let Some(v) = cli.verbose {
            self.output.verbose = v;
        }
        if let Some(j) = cli.jobs {
            self.engine.jobs = j;
        }
        if let Some(severity) = cli.min_severity {
            self.scan.min_severity = Some(severity);
        }
        if let Some(enabled) = cli.enabled_rules {
            self.scan.rules = enabled;
        }
        if let Some(disabled) = cli.disabled_rules {
            self.scan.disabled.extend(disabled);
        }
        if let Some(pattern) = cli.icon_glyph_pattern {
            self.scan.icon_glyph_pattern = Some(pattern);
        }
        if let Some(downgrade) = cli.conditional_downgrade {
            self.scan.treat_conditional_as_lower_severity = Some(downgrade);
        }
        if let Some(color) = cli.color {
            self.output.color = color;
        }
        if let Some(score) = cli.score {
            self.output.score = score;
        }
    }

    /// Compile the immutable scan configuration, validating rule ids
    /// against `known_rules`
    pub fn scan_config(&self, known_rules: &[&str]) -> Result<ScanConfig, ConfigError> {
        let check = |id: &String| {
            if known_rules.contains(&id.as_str()) {
                Ok(())
            } else {
                Err(ConfigError::UnknownRule(id.clone()))
            }
        };
        for id in self
            .scan
            .rules
            .iter()
            .chain(self.scan.disabled.iter())
            .chain(self.scan.severity.keys())
        {
            check(id)?;
        }

        let compile = |name: &'static str, pattern: Option<&String>, default: &str| {
            Regex::new(pattern.map(String::as_str).unwrap_or(default))
                .map_err(|source| ConfigError::Pattern { name, source })
        };

        Ok(ScanConfig {
            rules: if self.scan.rules.is_empty() {
                None
            } else {
                Some(self.scan.rules.iter().cloned().collect())
            },
            disabled: self.scan.disabled.iter().cloned().collect(),
            min_severity: self.scan.min_severity.unwrap_or(Severity::Info),
            severity_overrides: self.scan.severity.clone(),
            icon_glyph_pattern: compile(
                "icon glyph",
                self.scan.icon_glyph_pattern.as_ref(),
                DEFAULT_ICON_GLYPH_PATTERN,
            )?,
            navigation_pattern: compile(
                "navigation",
                self.scan.navigation_pattern.as_ref(),
                DEFAULT_NAVIGATION_PATTERN,
            )?,
            navigation_class_pattern: compile(
                "navigation class",
                self.scan.navigation_class_pattern.as_ref(),
                DEFAULT_NAVIGATION_CLASS_PATTERN,
            )?,
            treat_conditional_as_lower_severity: self
                .scan
                .treat_conditional_as_lower_severity
                .unwrap_or(true),
        })
    }

    /// Compile the exclude patterns
    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.files.exclude {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    /// Compile the include patterns
    pub fn include_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.files.include {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

/// Immutable configuration handed to every scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Enabled rule ids (`None` = all)
    pub rules: Option<BTreeSet<String>>,
    pub disabled: BTreeSet<String>,
    pub min_severity: Severity,
    pub severity_overrides: BTreeMap<String, Severity>,
    pub icon_glyph_pattern: Regex,
    pub navigation_pattern: Regex,
    pub navigation_class_pattern: Regex,
    pub treat_conditional_as_lower_severity: bool,
}

impl ScanConfig {
    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.disabled.contains(rule_id) {
            return false;
        }
        match &self.rules {
            Some(enabled) => enabled.contains(rule_id),
            None => true,
        }
    }

    /// Severity a rule reports at, after overrides
    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        self.severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(default)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rules: None,
            disabled: BTreeSet::new(),
            min_severity: Severity::Info,
            severity_overrides: BTreeMap::new(),
            icon_glyph_pattern: Regex::new(DEFAULT_ICON_GLYPH_PATTERN).unwrap(),
            navigation_pattern: Regex::new(DEFAULT_NAVIGATION_PATTERN).unwrap(),
            navigation_class_pattern: Regex::new(DEFAULT_NAVIGATION_CLASS_PATTERN).unwrap(),
            treat_conditional_as_lower_severity: true,
        }
    }
}
