//! Diagnostics engine for analyzing Firestore writes.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::RuleOptions;
use crate::firestore::{CallRule, Finding, NoUndefinedValues, SetRequireMerge, Suggestion};
use crate::rules::{MessageId, Rule, RuleCategory, RuleSeverity};
use crate::source::{Dialect, LineIndex, SourceError, SourceFile};

/// Matches `// firestore-lint-disable-line ...`, `// firestore-lint-disable-next-line ...`
/// and `/* firestore-lint-disable ... */`.
static DIRECTIVE_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"//[ \t]*firestore-lint-(disable-next-line|disable-line)\b([^\r\n]*)|/\*\s*firestore-lint-(disable)(?:\s([^*]*))?\*/",
    )
});

/// Which lines an ignore directive covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveScope {
    /// `/* firestore-lint-disable */` anywhere in the file.
    File,
    /// `// firestore-lint-disable-line` on the reported line.
    Line,
    /// `// firestore-lint-disable-next-line` on the line above.
    NextLine,
}

/// Parsed ignore directive from source code.
#[derive(Debug, Clone)]
pub struct IgnoreDirective {
    /// Line number where the directive appears (1-indexed).
    pub line: usize,
    pub scope: DirectiveScope,
    /// Rule IDs to ignore, or None for all rules.
    pub rules: Option<HashSet<String>>,
}

impl IgnoreDirective {
    /// Check if this directive allows (ignores) a specific rule.
    pub fn allows(&self, rule_id: &str) -> bool {
        match &self.rules {
            None => true,
            Some(rules) => rules.contains(rule_id),
        }
    }

    fn covers(&self, line: usize) -> bool {
        match self.scope {
            DirectiveScope::File => true,
            DirectiveScope::Line => self.line == line,
            DirectiveScope::NextLine => self.line + 1 == line,
        }
    }
}

/// Parse ignore directives from source code.
///
/// Rules are comma-separated; text after `--` is a free-form reason. An
/// empty list ignores every rule.
pub fn parse_ignore_directives(content: &str) -> Vec<IgnoreDirective> {
    let Ok(pattern) = DIRECTIVE_PATTERN.as_ref() else {
        return Vec::new();
    };
    let lines = LineIndex::new(content);

    pattern
        .captures_iter(content)
        .filter_map(|caps| {
            let (scope, rules) = if let Some(kind) = caps.get(1) {
                let scope = if kind.as_str() == "disable-line" {
                    DirectiveScope::Line
                } else {
                    DirectiveScope::NextLine
                };
                (scope, caps.get(2))
            } else if caps.get(3).is_some() {
                (DirectiveScope::File, caps.get(4))
            } else {
                return None;
            };

            let start = caps.get(0)?.start();
            let (line, _) = lines.line_col(start);

            Some(IgnoreDirective {
                line,
                scope,
                rules: parse_rule_list(rules.map_or("", |m| m.as_str())),
            })
        })
        .collect()
}

fn parse_rule_list(text: &str) -> Option<HashSet<String>> {
    let text = text.split("--").next().unwrap_or("");
    let rules: HashSet<String> = text
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if rules.is_empty() {
        None
    } else {
        Some(rules)
    }
}

/// Check if a diagnostic should be ignored based on directives.
fn should_ignore_diagnostic(
    diagnostic_line: usize,
    rule_id: &str,
    directives: &[IgnoreDirective],
) -> bool {
    directives
        .iter()
        .any(|directive| directive.covers(diagnostic_line) && directive.allows(rule_id))
}

/// A diagnostic message produced by the linter.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Line number (1-indexed).
    pub line: usize,

    /// Column start (0-indexed, bytes).
    pub column: usize,

    /// Line number where the reported node ends (1-indexed).
    pub end_line: usize,

    /// Column end on `end_line` (0-indexed, bytes).
    pub end_column: usize,

    /// Byte offset of the reported node.
    pub start_byte: usize,

    /// Byte offset just past the reported node.
    pub end_byte: usize,

    /// Severity of the diagnostic.
    pub severity: RuleSeverity,

    /// Rule ID that triggered this diagnostic.
    pub rule_id: String,

    /// Human-readable rule name.
    pub rule_name: String,

    /// Type of the rule.
    pub category: RuleCategory,

    pub message_id: MessageId,

    /// The diagnostic message.
    pub message: String,

    /// Alternative fixes, most preferred first.
    pub suggestions: Vec<Suggestion>,

    /// The source line the diagnostic starts on.
    pub source_snippet: Option<String>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {:?} [{}] {}",
            self.line, self.column, self.severity, self.rule_id, self.message
        )
    }
}

/// Diagnostics engine for Firestore write analysis.
pub struct DiagnosticsEngine {
    rules: Vec<Box<dyn CallRule>>,
}

impl DiagnosticsEngine {
    /// Create an engine with every rule at its default options.
    pub fn new() -> Self {
        Self::with_options(&RuleOptions::default())
    }

    pub fn with_options(options: &RuleOptions) -> Self {
        let no_undefined = options
            .no_undefined_values
            .as_ref()
            .map(NoUndefinedValues::new)
            .unwrap_or_default();

        Self {
            rules: vec![Box::new(no_undefined), Box::new(SetRequireMerge::new())],
        }
    }

    /// Metadata of the rules this engine runs.
    pub fn rules(&self) -> impl Iterator<Item = &'static Rule> + '_ {
        self.rules.iter().map(|rule| rule.rule())
    }

    /// Analyze a file and return its diagnostics.
    ///
    /// Files whose extension is not JavaScript or TypeScript produce none.
    pub fn analyze(&self, content: &str, path: &Path) -> Result<Vec<Diagnostic>, SourceError> {
        let Some(dialect) = Dialect::from_path(path) else {
            debug!(path = %path.display(), "skipping file with unsupported extension");
            return Ok(Vec::new());
        };

        let source = SourceFile::parse(content, dialect)?;
        if source.has_syntax_errors() {
            debug!(
                path = %path.display(),
                dialect = ?source.dialect(),
                "analyzing a file with syntax errors"
            );
        }

        Ok(self.analyze_source(&source))
    }

    /// Run every rule over every call in `source`, in document order.
    pub fn analyze_source(&self, source: &SourceFile) -> Vec<Diagnostic> {
        let directives = parse_ignore_directives(source.content());
        let mut findings = Vec::new();
        let mut diagnostics = Vec::new();

        for call in source.calls() {
            for rule in &self.rules {
                rule.check_call(&call, source, &mut findings);

                for finding in findings.drain(..) {
                    let diagnostic = render(source, rule.rule(), finding);
                    if should_ignore_diagnostic(diagnostic.line, &diagnostic.rule_id, &directives)
                    {
                        trace!(rule = %diagnostic.rule_id, line = diagnostic.line, "suppressed");
                        continue;
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }

        diagnostics
    }
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn render(source: &SourceFile, rule: &'static Rule, finding: Finding) -> Diagnostic {
    let lines = source.line_index();
    let (line, column) = lines.line_col(finding.span.start);
    let (end_line, end_column) = lines.line_col(finding.span.end);

    Diagnostic {
        line,
        column,
        end_line,
        end_column,
        start_byte: finding.span.start,
        end_byte: finding.span.end,
        severity: rule.severity,
        rule_id: finding.rule_id.to_string(),
        rule_name: rule.name.to_string(),
        category: rule.category,
        message_id: finding.message_id,
        message: finding.message_id.text().to_string(),
        suggestions: finding.suggestions,
        source_snippet: Some(lines.line_text(source.content(), line).to_string()),
    }
}
