//! Hermes Clew CLI - accessibility scanner for component markup

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use glob::glob;
use globset::GlobSet;
use hermes_clew::config::{CliOverrides, ColorMode, Config, OutputFormat};
use hermes_clew::engine::Engine;
use hermes_clew::finding::Severity;
use hermes_clew::output::{JsonFormatter, OutputFormatter, TextFormatter};
use hermes_clew::rule::Rule;
use hermes_clew::rules::builtin_ids;
use hermes_clew::score::ScoreCard;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "hermes-clew",
    version,
    about = "Accessibility scanner for component markup",
    long_about = "Scans component markup syntax trees (*.ast.json) for patterns that \
                  hide an interface from assistive technology and automation agents."
)]
struct Cli {
    /// Syntax-tree files, directories or glob patterns to scan
    files: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Minimum severity to report
    #[arg(long, value_enum)]
    min_severity: Option<MinSeverity>,

    /// Only enable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Report findings in conditional branches at full severity
    #[arg(long)]
    no_conditional_downgrade: bool,

    /// Regex deciding when a control's text is an icon glyph
    #[arg(long)]
    icon_pattern: Option<String>,

    /// Show the readiness score card
    #[arg(long)]
    score: bool,

    /// Show per-rule timing statistics
    #[arg(long)]
    timing: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show detailed information about a specific rule
    #[arg(long)]
    explain: Option<String>,

    /// Exit with 0 even if errors are found
    #[arg(long)]
    exit_zero: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum MinSeverity {
    Info,
    Warning,
    Error,
}

impl From<MinSeverity> for Severity {
    fn from(value: MinSeverity) -> Self {
        match value {
            MinSeverity::Info => Severity::Info,
            MinSeverity::Warning => Severity::Warning,
            MinSeverity::Error => Severity::Error,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(3);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default().context("Failed to load config")?,
    };

    config.merge_cli(CliOverrides {
        format: cli.format.map(|f| match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }),
        verbose: cli.verbose.then_some(true),
        jobs: cli.jobs,
        min_severity: cli.min_severity.map(Severity::from),
        enabled_rules: cli.select.clone(),
        disabled_rules: cli.disable.clone(),
        icon_glyph_pattern: cli.icon_pattern.clone(),
        conditional_downgrade: cli.no_conditional_downgrade.then_some(false),
        color: cli.no_color.then_some(ColorMode::Never),
        score: cli.score.then_some(true),
    });

    match config.output.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    let scan_config = config.scan_config(&builtin_ids())?;
    let engine = Engine::new(scan_config)
        .with_parallelism(config.engine.parallel, config.engine.jobs);

    if let Some(rule_id) = &cli.explain {
        let Some(rule) = engine.registry().get(rule_id) else {
            bail!("Unknown rule: {}", rule_id);
        };
        explain_rule(rule);
        return Ok(0);
    }

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        println!();
        for rule in engine.registry().iter() {
            print_rule(rule, engine.config().is_rule_enabled(&rule.id));
        }
        return Ok(0);
    }

    let files = collect_files(&cli.files, &config.include_set()?, &config.exclude_set()?)?;
    if files.is_empty() {
        bail!("No syntax-tree files found to scan");
    }
    log::info!("Scanning {} files", files.len());

    let result = engine.scan_files(&files);

    let score = config
        .output
        .score
        .then(|| ScoreCard::compute(&result, engine.enabled_rules()));

    let formatter: Box<dyn OutputFormatter> = match config.output.format {
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Text => {
            let mut text = TextFormatter::new();
            text.colored = colored::control::SHOULD_COLORIZE.should_colorize();
            text.show_stats = config.output.statistics;
            Box::new(text)
        }
    };
    print!("{}", formatter.format(&result, score.as_ref()));
    if config.output.format == OutputFormat::Json {
        println!();
    }

    if cli.timing {
        eprintln!();
        eprint!("{}", result.format_timings());
    }

    Ok(if cli.exit_zero { 0 } else { result.exit_code() })
}

/// Expand arguments into syntax-tree files. Explicit files are taken as
/// given; directory and glob results must match the include patterns.
fn collect_files(args: &[String], include: &GlobSet, exclude: &GlobSet) -> Result<Vec<PathBuf>> {
    let defaults = [".".to_string()];
    let args = if args.is_empty() { &defaults[..] } else { args };

    let mut files = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        let pattern = if path.is_dir() {
            format!("{}/**/*", arg.trim_end_matches('/'))
        } else {
            arg.clone()
        };
        let entries = glob(&pattern).with_context(|| format!("Invalid pattern '{}'", arg))?;
        for entry in entries.flatten() {
            if entry.is_file() && include.is_match(&entry) {
                files.push(entry);
            }
        }
    }

    files.retain(|f| !exclude.is_match(f));
    files.sort();
    files.dedup();
    Ok(files)
}

fn print_rule(rule: &Rule, enabled: bool) {
    let severity = match rule.severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    };
    let state = if enabled { "".normal() } else { " (disabled)".dimmed() };
    println!(
        "  {} [{}] {}{}",
        rule.id.cyan(),
        severity,
        rule.category,
        state
    );
    if let Some(desc) = &rule.description {
        println!("      {}", desc);
    }
}

/// Print detailed rule explanation
fn explain_rule(rule: &Rule) {
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), rule.id.cyan());
    if let Some(name) = &rule.name {
        println!("  {}: {}", "Name".bold(), name);
    }
    println!(
        "  {}: {}",
        "Severity".bold(),
        match rule.severity {
            Severity::Error => "error".red(),
            Severity::Warning => "warning".yellow(),
            Severity::Info => "info".blue(),
        }
    );
    println!("  {}: {}", "Category".bold(), rule.category);
    if !rule.tags.is_empty() {
        println!("  {}: {}", "Tags".bold(), rule.tags.join(", "));
    }

    if let Some(desc) = &rule.description {
        println!();
        println!("  {}", "Description".bold());
        println!("  {}", desc);
    }

    if let Some(rationale) = &rule.rationale {
        println!();
        println!("  {}", "Rationale".bold());
        println!("  {}", rationale);
    }

    if let Some(bad) = &rule.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(incorrect)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = &rule.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(correct)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }
}
