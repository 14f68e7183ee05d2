//! Firestore Lint - catches unsafe Firestore writes in JavaScript and TypeScript.
//!
//! This crate parses JS/TS sources with tree-sitter and checks every call
//! expression for Firestore writes whose payload contains `undefined`, or
//! whose `set()` would overwrite a document for lack of a merge option. It
//! proposes rewrites for the latter.
//!
//! # Usage
//!
//! ```rust,no_run
//! use firestore_lint::{LintConfig, Linter};
//!
//! let linter = Linter::new(LintConfig::default());
//! let diagnostics = linter.lint_file("src/db/profile.ts").unwrap();
//!
//! for diag in diagnostics {
//!     println!("{}", diag);
//! }
//! ```

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod diagnostics;
pub mod firestore;
pub mod handlers;
pub mod output;
pub mod rules;
pub mod source;
pub mod syntax;

use std::path::Path;

use anyhow::{Context, Result};
pub use config::{ConfigError, ProjectLintConfig, RuleOptions};
pub use diagnostics::{parse_ignore_directives, Diagnostic, DiagnosticsEngine, IgnoreDirective};
pub use rules::{LintLevel, MessageId, Rule, RuleCategory, RuleSet, RuleSeverity};
pub use source::{Dialect, SourceError, SourceFile};

/// Configuration for the linter.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Enable all rules.
    pub all_rules: bool,

    /// Rule types to enable.
    pub categories: Vec<RuleCategory>,

    /// Specific rule IDs to disable.
    pub disabled_rules: Vec<String>,

    /// Minimum severity to report.
    pub min_severity: RuleSeverity,

    /// Whether to include fix suggestions in output.
    pub show_fixes: bool,

    /// Levels and rule options from `.firestore-lint.toml`.
    pub project: ProjectLintConfig,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            all_rules: true,
            categories: vec![],
            disabled_rules: vec![],
            min_severity: RuleSeverity::Hint,
            show_fixes: true,
            project: ProjectLintConfig::default(),
        }
    }
}

/// The main linter struct.
pub struct Linter {
    engine: DiagnosticsEngine,
    config: LintConfig,
}

impl Linter {
    /// Create a new linter with the given configuration.
    pub fn new(config: LintConfig) -> Self {
        Self {
            engine: DiagnosticsEngine::with_options(&config.project.options),
            config,
        }
    }

    /// Lint a single file and return diagnostics.
    pub fn lint_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Diagnostic>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        self.lint_str(&content, path)
    }

    /// Lint a string of content; `path` selects the dialect.
    pub fn lint_str<P: AsRef<Path>>(&self, content: &str, path: P) -> Result<Vec<Diagnostic>> {
        let path = path.as_ref();
        let diagnostics = self
            .engine
            .analyze(content, path)
            .with_context(|| format!("analyzing {}", path.display()))?;

        Ok(self.filter_diagnostics(diagnostics))
    }

    /// Filter diagnostics based on configuration.
    fn filter_diagnostics(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter_map(|mut d| {
                if let Some(level) = self
                    .config
                    .project
                    .effective_level(&d.rule_id, d.category)
                {
                    match level.to_severity() {
                        None => return None,
                        Some(sev) => d.severity = sev,
                    }
                }

                // Filter by minimum severity (CLI --severity flag)
                if d.severity < self.config.min_severity {
                    return None;
                }

                // Filter by disabled rules (CLI --disable flag)
                if self.config.disabled_rules.contains(&d.rule_id) {
                    return None;
                }

                // Filter by rule types if specified (CLI --categories flag)
                if !self.config.all_rules
                    && !self.config.categories.is_empty()
                    && !self.config.categories.contains(&d.category)
                {
                    return None;
                }

                Some(d)
            })
            .collect()
    }
}
