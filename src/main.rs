//! Firestore Lint CLI - Command-line interface for the Firestore linter.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::{DirEntry, WalkDir};

use firestore_lint::config::{discover_config, load_config};
use firestore_lint::firestore::NoUndefinedValuesOptions;
use firestore_lint::output::{format_diagnostics, json_value, DiagnosticSummary, OutputFormat};
use firestore_lint::{
    Dialect, LintConfig, Linter, ProjectLintConfig, RuleCategory, RuleOptions, RuleSet,
    RuleSeverity,
};

/// Directories never descended into.
const SKIPPED_DIRS: [&str; 4] = ["node_modules", ".git", "dist", "build"];

/// Firestore Lint - catch unsafe Firestore writes in JavaScript and TypeScript
#[derive(Parser, Debug)]
#[command(name = "firestore-lint")]
#[command(version)]
#[command(about = "Lint JavaScript and TypeScript for unsafe Firestore writes", long_about = None)]
struct Args {
    /// Files or directories to lint
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: OutputFormatArg,

    /// Minimum severity to report
    #[arg(short, long, value_enum, default_value = "hint")]
    severity: SeverityArg,

    /// Rule types to check (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    categories: Option<Vec<CategoryArg>>,

    /// Rules to disable (comma-separated rule IDs)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Receiver names checked by firestore-no-undefined-values (comma-separated)
    #[arg(long, value_delimiter = ',')]
    additional_objects: Option<Vec<String>>,

    /// Configuration file (default: nearest .firestore-lint.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show fix suggestions
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    show_fixes: bool,

    /// Exit with error code on warnings
    #[arg(long)]
    error_on_warnings: bool,

    /// Only show files with diagnostics
    #[arg(short, long)]
    quiet: bool,

    /// Show rule statistics
    #[arg(long)]
    stats: bool,

    /// Maximum number of diagnostics to show (0 for unlimited)
    #[arg(long, default_value = "0")]
    max_diagnostics: usize,

    /// List the available rules and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Human-readable colored output
    Pretty,
    /// JSON output for tooling integration
    Json,
    /// Compact one-line-per-diagnostic
    Compact,
    /// GitHub Actions format
    Github,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
enum SeverityArg {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Problem,
    Suggestion,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Pretty => OutputFormat::Pretty,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Compact => OutputFormat::Compact,
            OutputFormatArg::Github => OutputFormat::Github,
        }
    }
}

impl From<SeverityArg> for RuleSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Error => RuleSeverity::Error,
            SeverityArg::Warning => RuleSeverity::Warning,
            SeverityArg::Info => RuleSeverity::Info,
            SeverityArg::Hint => RuleSeverity::Hint,
        }
    }
}

impl From<CategoryArg> for RuleCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Problem => RuleCategory::Problem,
            CategoryArg::Suggestion => RuleCategory::Suggestion,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_rules {
        print_rules();
        return ExitCode::SUCCESS;
    }

    let project = match project_config(&args) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    // Build configuration
    let config = LintConfig {
        all_rules: args.categories.is_none(),
        categories: args
            .categories
            .clone()
            .map(|cats| cats.into_iter().map(Into::into).collect())
            .unwrap_or_default(),
        disabled_rules: args.disable.clone().unwrap_or_default(),
        min_severity: args.severity.into(),
        show_fixes: args.show_fixes,
        project,
    };

    let linter = Linter::new(config);

    let files = collect_files(&args.paths);
    if files.is_empty() {
        eprintln!("{}", "No JavaScript or TypeScript files found to lint.".yellow());
        return ExitCode::SUCCESS;
    }
    debug!(count = files.len(), "linting files");

    // Lint files in parallel
    let results: Vec<_> = files
        .par_iter()
        .filter_map(|file| match linter.lint_file(file) {
            Ok(diagnostics) => Some((file.clone(), diagnostics)),
            Err(e) => {
                eprintln!("{}: {} - {:#}", "Error".red().bold(), file.display(), e);
                None
            }
        })
        .collect();

    let summary = DiagnosticSummary::from_files(results.iter().map(|(_, d)| d.as_slice()));

    let mut rule_counts: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    for (_, diagnostics) in &results {
        for diag in diagnostics {
            *rule_counts.entry(diag.rule_id.clone()).or_insert(0) += 1;
        }
    }

    // Apply max diagnostics limit
    let mut remaining = if args.max_diagnostics > 0 {
        args.max_diagnostics
    } else {
        usize::MAX
    };
    if summary.total > remaining {
        eprintln!(
            "{} Showing first {} of {} diagnostics",
            "Note:".blue().bold(),
            args.max_diagnostics,
            summary.total
        );
    }

    let output_format: OutputFormat = args.format.into();

    if matches!(output_format, OutputFormat::Json) {
        // For JSON, output all diagnostics as a single JSON array
        let show_fixes = args.show_fixes;
        let json_diagnostics: Vec<_> = results
            .iter()
            .flat_map(|(file, diagnostics)| {
                diagnostics
                    .iter()
                    .map(move |diag| json_value(file, diag, show_fixes))
            })
            .take(remaining)
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json_diagnostics).unwrap_or_default()
        );
        return exit_code(&summary, args.error_on_warnings);
    }

    // For other formats, group by file
    for (file, diagnostics) in &results {
        if remaining == 0 {
            break;
        }
        if diagnostics.is_empty() {
            if !args.quiet && matches!(output_format, OutputFormat::Pretty) {
                println!("{} {}", "✓".green(), file.display());
            }
            continue;
        }

        let shown = &diagnostics[..diagnostics.len().min(remaining)];
        remaining -= shown.len();
        print!(
            "{}",
            format_diagnostics(file, shown, output_format, args.show_fixes)
        );
    }

    if matches!(output_format, OutputFormat::Pretty) {
        if summary.total > 0 {
            println!();
            println!(
                "{} {} in {} of {} files",
                "Found".bold(),
                summary.format_pretty(),
                summary.files_with_issues,
                summary.total_files
            );
        } else {
            println!("{}", "✓ No issues found!".green().bold());
        }
    }

    // Print statistics if requested
    if args.stats && !rule_counts.is_empty() {
        println!();
        println!("{}", "Rule Statistics:".bold().underline());
        let mut sorted_rules: Vec<_> = rule_counts.into_iter().collect();
        sorted_rules.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (rule_id, count) in &sorted_rules {
            println!("  {:40} {}", rule_id, count);
        }
    }

    exit_code(&summary, args.error_on_warnings)
}

/// Load `--config` or discover one, then apply CLI rule options on top.
fn project_config(args: &Args) -> Result<ProjectLintConfig> {
    let mut project = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let start = match args.paths.first() {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            discover_config(&start)?
        }
    };

    if let Some(objects) = &args.additional_objects {
        let overrides = ProjectLintConfig {
            options: RuleOptions {
                no_undefined_values: Some(NoUndefinedValuesOptions {
                    additional_objects: objects.clone(),
                }),
            },
            ..ProjectLintConfig::default()
        };
        project.merge(&overrides);
    }

    Ok(project)
}

/// Expand directories into the JS/TS files below them.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|path| {
            if path.is_dir() {
                WalkDir::new(path)
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && is_lintable(e.path()))
                    .map(|e| e.path().to_path_buf())
                    .collect::<Vec<_>>()
            } else {
                vec![path.clone()]
            }
        })
        .collect()
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn is_lintable(path: &Path) -> bool {
    // Type declarations hold no calls worth checking.
    let declaration = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".d.ts"));
    !declaration && Dialect::from_path(path).is_some()
}

fn print_rules() {
    let rule_set = RuleSet::new();
    for rule in &rule_set.rules {
        let severity = match rule.severity {
            RuleSeverity::Error => "error".red().bold(),
            RuleSeverity::Warning => "warning".yellow().bold(),
            RuleSeverity::Info => "info".blue().bold(),
            RuleSeverity::Hint => "hint".dimmed(),
        };
        println!("{} [{}] {}", rule.id.cyan().bold(), rule.category, severity);
        println!("    {}", rule.description);
        if rule.has_suggestions {
            println!("    {}", "Offers suggestions.".dimmed());
        }
        println!("    {}", rule.doc_reference.dimmed());
    }
}

fn exit_code(summary: &DiagnosticSummary, error_on_warnings: bool) -> ExitCode {
    if summary.errors > 0 || (error_on_warnings && summary.warnings > 0) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
