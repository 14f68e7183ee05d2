//! Output formatters for diagnostics.
//!
//! This module provides different output formats for linter diagnostics,
//! including human-readable, JSON, compact, and GitHub Actions format.

use std::path::Path;

use colored::Colorize;

use crate::diagnostics::Diagnostic;
use crate::firestore::Suggestion;
use crate::rules::RuleSeverity;

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON output for tooling integration.
    Json,
    /// Compact one-line-per-diagnostic.
    Compact,
    /// GitHub Actions format.
    Github,
}

/// Format diagnostics according to the specified output format.
pub fn format_diagnostics(
    file: &Path,
    diagnostics: &[Diagnostic],
    format: OutputFormat,
    show_fixes: bool,
) -> String {
    match format {
        OutputFormat::Pretty => format_pretty(file, diagnostics, show_fixes),
        OutputFormat::Json => format_json(file, diagnostics, show_fixes),
        OutputFormat::Compact => format_compact(file, diagnostics),
        OutputFormat::Github => format_github(file, diagnostics),
    }
}

/// Format diagnostics in human-readable colored output.
fn format_pretty(file: &Path, diagnostics: &[Diagnostic], show_fixes: bool) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }

    let mut output = String::new();

    // File header
    output.push_str(&format!(
        "\n{}\n",
        file.display().to_string().bold().underline()
    ));

    for diag in diagnostics {
        let severity_str = match diag.severity {
            RuleSeverity::Error => "error".red().bold(),
            RuleSeverity::Warning => "warning".yellow().bold(),
            RuleSeverity::Info => "info".blue().bold(),
            RuleSeverity::Hint => "hint".dimmed(),
        };

        let severity_marker = match diag.severity {
            RuleSeverity::Error => "✖".red(),
            RuleSeverity::Warning => "⚠".yellow(),
            RuleSeverity::Info => "ℹ".blue(),
            RuleSeverity::Hint => "💡".dimmed(),
        };

        // Main diagnostic line
        output.push_str(&format!(
            "\n  {} {} {} [{}]\n",
            severity_marker,
            format!("{}:{}", diag.line, diag.column + 1).dimmed(),
            severity_str,
            diag.rule_id.cyan()
        ));

        output.push_str(&format!("    {} {}\n", "→".dimmed(), diag.rule_name.bold()));
        output.push_str(&format!("    {}\n", diag.message));

        // Source snippet with highlighting
        if let Some(ref snippet) = diag.source_snippet {
            let gutter = diag.line.to_string();
            output.push_str(&format!("\n    {} │ {}\n", gutter, snippet.dimmed()));

            let start = diag.column.min(snippet.len());
            let end = if diag.end_line == diag.line {
                diag.end_column.min(snippet.len())
            } else {
                snippet.len()
            };
            if end > start {
                let indent = snippet
                    .get(..start)
                    .map_or(start, |prefix| prefix.chars().count());
                let width = snippet
                    .get(start..end)
                    .map_or(end - start, |marked| marked.chars().count());
                let marks = "^".repeat(width);
                output.push_str(&format!(
                    "    {} │ {}{}\n",
                    " ".repeat(gutter.len()),
                    " ".repeat(indent),
                    match diag.severity {
                        RuleSeverity::Error => marks.red().to_string(),
                        RuleSeverity::Warning => marks.yellow().to_string(),
                        _ => marks.blue().to_string(),
                    }
                ));
            }
        }

        if show_fixes && !diag.suggestions.is_empty() {
            output.push_str(&format!("\n    {}\n", "Suggestions:".green().bold()));
            for (idx, suggestion) in diag.suggestions.iter().enumerate() {
                output.push_str(&format!(
                    "      {}. {}\n",
                    idx + 1,
                    suggestion.message().green()
                ));
                if let Some(preview) = suggestion_preview(diag, suggestion) {
                    output.push_str(&format!("         {}\n", preview.trim().dimmed()));
                }
            }
        }
    }

    output.push('\n');
    output
}

/// The diagnostic's first line with `suggestion` applied, when the edit
/// falls on that line.
pub fn suggestion_preview(diag: &Diagnostic, suggestion: &Suggestion) -> Option<String> {
    let snippet = diag.source_snippet.as_deref()?;
    let line_start = diag.start_byte.checked_sub(diag.column)?;
    let range = suggestion.edit.range();

    let start = range.start.checked_sub(line_start)?;
    let end = range.end.checked_sub(line_start)?;
    let before = snippet.get(..start)?;
    let after = snippet.get(end..)?;

    Some(format!("{before}{}{after}", suggestion.edit.new_text()))
}

/// A single diagnostic as a JSON value.
pub fn json_value(file: &Path, diag: &Diagnostic, show_fixes: bool) -> serde_json::Value {
    let suggestions: Vec<serde_json::Value> = if show_fixes {
        diag.suggestions
            .iter()
            .map(|suggestion| {
                let range = suggestion.edit.range();
                serde_json::json!({
                    "messageId": suggestion.message_id,
                    "message": suggestion.message(),
                    "range": [range.start, range.end],
                    "text": suggestion.edit.new_text(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    serde_json::json!({
        "file": file.display().to_string(),
        "line": diag.line,
        "column": diag.column,
        "end_line": diag.end_line,
        "end_column": diag.end_column,
        "severity": format!("{:?}", diag.severity).to_lowercase(),
        "rule_id": diag.rule_id,
        "rule_name": diag.rule_name,
        "category": diag.category,
        "message_id": diag.message_id,
        "message": diag.message,
        "suggestions": suggestions,
        "source": diag.source_snippet,
    })
}

/// Format diagnostics as JSON.
fn format_json(file: &Path, diagnostics: &[Diagnostic], show_fixes: bool) -> String {
    let json_diagnostics: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|diag| json_value(file, diag, show_fixes))
        .collect();

    serde_json::to_string_pretty(&json_diagnostics).unwrap_or_default()
}

/// Format diagnostics in compact one-line format.
fn format_compact(file: &Path, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();

    for diag in diagnostics {
        let severity = match diag.severity {
            RuleSeverity::Error => "E",
            RuleSeverity::Warning => "W",
            RuleSeverity::Info => "I",
            RuleSeverity::Hint => "H",
        };

        output.push_str(&format!(
            "{}:{}:{}: {} [{}] {}\n",
            file.display(),
            diag.line,
            diag.column + 1,
            severity,
            diag.rule_id,
            diag.message
        ));
    }

    output
}

/// Format diagnostics for GitHub Actions.
fn format_github(file: &Path, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();

    for diag in diagnostics {
        let level = match diag.severity {
            RuleSeverity::Error => "error",
            RuleSeverity::Warning => "warning",
            RuleSeverity::Info | RuleSeverity::Hint => "notice",
        };

        // ::level file=file,line=line,col=col,endLine=endLine,endColumn=endColumn,title=title::message
        output.push_str(&format!(
            "::{} file={},line={},col={},endLine={},endColumn={},title={}::{}\n",
            level,
            file.display(),
            diag.line,
            diag.column + 1,
            diag.end_line,
            diag.end_column + 1,
            diag.rule_id,
            diag.message.replace('\n', "%0A")
        ));
    }

    output
}

/// Summary statistics for diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub hints: usize,
    pub files_with_issues: usize,
    pub total_files: usize,
}

impl DiagnosticSummary {
    /// Create a summary from diagnostics.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self {
            total: diagnostics.len(),
            ..Self::default()
        };

        for diag in diagnostics {
            summary.count(diag.severity);
        }

        summary
    }

    /// Create a summary over several files.
    pub fn from_files<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a [Diagnostic]>,
    {
        let mut summary = Self::default();

        for diagnostics in files {
            summary.total_files += 1;
            if !diagnostics.is_empty() {
                summary.files_with_issues += 1;
            }
            summary.total += diagnostics.len();
            for diag in diagnostics {
                summary.count(diag.severity);
            }
        }

        summary
    }

    fn count(&mut self, severity: RuleSeverity) {
        match severity {
            RuleSeverity::Error => self.errors += 1,
            RuleSeverity::Warning => self.warnings += 1,
            RuleSeverity::Info => self.info += 1,
            RuleSeverity::Hint => self.hints += 1,
        }
    }

    /// Format the summary as a human-readable string.
    pub fn format_pretty(&self) -> String {
        format!(
            "{} ({} {}, {} {}, {} info, {} hints)",
            format!("{} issues", self.total).bold(),
            self.errors.to_string().red().bold(),
            if self.errors == 1 { "error" } else { "errors" },
            self.warnings.to_string().yellow().bold(),
            if self.warnings == 1 {
                "warning"
            } else {
                "warnings"
            },
            self.info,
            self.hints
        )
    }
}
