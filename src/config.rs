//! Project configuration discovery and parsing for `firestore-lint`.
//!
//! Reads the `[lints]` table from the nearest `.firestore-lint.toml` (or
//! `firestore-lint.toml`) and produces a [`ProjectLintConfig`] that the
//! linter uses to override default rule severities and pass rule options.
//!
//! # Format
//!
//! ```toml
//! [lints]
//! # Set the default level for every rule:
//! all = "warn"
//!
//! # Override a rule type:
//! problem    = "deny"
//! suggestion = "allow"
//!
//! # Override individual rules, optionally with options:
//! firestore-set-require-merge = "warn"
//! firestore-no-undefined-values = { level = "deny", additionalObjects = ["batch", "transaction"] }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use crate::firestore::NoUndefinedValuesOptions;
use crate::rules::{LintLevel, RuleCategory, RuleSet, NO_UNDEFINED_VALUES};

/// File names searched for, in order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".firestore-lint.toml", "firestore-lint.toml"];

/// Errors in a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("`[lints]` must be a table")]
    LintsNotATable,

    #[error("invalid lint level for `{key}`: {value}")]
    InvalidLevel { key: String, value: String },

    #[error("invalid options for `{rule}`: {message}")]
    InvalidOptions { rule: String, message: String },

    #[error("`{rule}` does not accept options (found `{option}`)")]
    UnexpectedOption { rule: String, option: String },
}

/// Options for the rules that take any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    pub no_undefined_values: Option<NoUndefinedValuesOptions>,
}

/// Configuration extracted from a `[lints]` table.
#[derive(Debug, Clone, Default)]
pub struct ProjectLintConfig {
    /// The file this config was loaded from (for diagnostics).
    pub source: Option<PathBuf>,

    /// Default level for every rule (`all = "warn"`).
    pub all: Option<LintLevel>,

    /// Per-type severity overrides.
    pub categories: HashMap<RuleCategory, LintLevel>,

    /// Per-rule severity overrides (rule ID → level).
    pub rules: HashMap<String, LintLevel>,

    /// Rule options from the table form of a rule entry.
    pub options: RuleOptions,
}

impl ProjectLintConfig {
    /// Resolve the effective [`LintLevel`] for a given rule.
    ///
    /// Precedence (highest → lowest):
    /// 1. Per-rule override (`firestore-set-require-merge = "allow"`)
    /// 2. Per-type override (`suggestion = "deny"`)
    /// 3. `all = "warn"`
    /// 4. `None` – use the rule's built-in default severity.
    pub fn effective_level(&self, rule_id: &str, category: RuleCategory) -> Option<LintLevel> {
        if let Some(&level) = self.rules.get(rule_id) {
            return Some(level);
        }
        if let Some(&level) = self.categories.get(&category) {
            return Some(level);
        }
        self.all
    }

    /// Merge another config on top of this one (other wins on conflicts).
    pub fn merge(&mut self, other: &ProjectLintConfig) {
        if other.all.is_some() {
            self.all = other.all;
        }
        for (&cat, &level) in &other.categories {
            self.categories.insert(cat, level);
        }
        for (rule, &level) in &other.rules {
            self.rules.insert(rule.clone(), level);
        }
        if other.options.no_undefined_values.is_some() {
            self.options
                .no_undefined_values
                .clone_from(&other.options.no_undefined_values);
        }
        if other.source.is_some() {
            self.source.clone_from(&other.source);
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Walk up from `start` and return the first config file found.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load a [`ProjectLintConfig`] from a config file.
pub fn load_config(path: &Path) -> Result<ProjectLintConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut config =
        parse_config(&content).with_context(|| format!("parsing {}", path.display()))?;
    config.source = Some(path.to_path_buf());

    debug!(path = %path.display(), "loaded lint configuration");
    Ok(config)
}

/// Discover and load the lint config for a given path.
///
/// Without a config file anywhere above `path` the defaults apply.
pub fn discover_config(path: &Path) -> Result<ProjectLintConfig> {
    match find_config_file(path) {
        Some(file) => load_config(&file),
        None => Ok(ProjectLintConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the text of a config file.
pub fn parse_config(content: &str) -> Result<ProjectLintConfig, ConfigError> {
    let doc: toml::Value = toml::from_str(content)?;
    let mut config = ProjectLintConfig::default();

    match doc.get("lints") {
        None => {}
        Some(toml::Value::Table(table)) => merge_toml_table(&mut config, table)?,
        Some(_) => return Err(ConfigError::LintsNotATable),
    }

    Ok(config)
}

/// Parse a single TOML value into a [`LintLevel`].
///
/// Supports both:
///   - `"warn"` (plain string)
///   - `{ level = "warn", ... }` (table form; the level may be omitted when
///     only options are given)
fn parse_lint_level(key: &str, value: &toml::Value) -> Result<Option<LintLevel>, ConfigError> {
    let level = match value {
        toml::Value::String(s) => Some(s.as_str()),
        toml::Value::Table(t) => match t.get("level") {
            None => None,
            Some(toml::Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(ConfigError::InvalidLevel {
                    key: key.to_string(),
                    value: other.to_string(),
                })
            }
        },
        other => {
            return Err(ConfigError::InvalidLevel {
                key: key.to_string(),
                value: other.to_string(),
            })
        }
    };

    match level {
        None => Ok(None),
        Some(level) => LintLevel::from_key(level)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidLevel {
                key: key.to_string(),
                value: level.to_string(),
            }),
    }
}

/// Everything in a table entry besides `level`.
fn option_entries(value: &toml::Value) -> toml::value::Table {
    let mut options = value.as_table().cloned().unwrap_or_default();
    options.remove("level");
    options
}

/// Merge a TOML table of lint entries into a [`ProjectLintConfig`].
fn merge_toml_table(
    config: &mut ProjectLintConfig,
    table: &toml::value::Table,
) -> Result<(), ConfigError> {
    let rule_set = RuleSet::new();

    for (key, value) in table {
        let level = parse_lint_level(key, value)?;
        let options = option_entries(value);

        if key == "all" || RuleCategory::from_key(key).is_some() {
            if let Some(option) = options.keys().next() {
                return Err(ConfigError::UnexpectedOption {
                    rule: key.clone(),
                    option: option.clone(),
                });
            }
        }

        if key == "all" {
            config.all = level;
            continue;
        }
        if let Some(cat) = RuleCategory::from_key(key) {
            if let Some(level) = level {
                config.categories.insert(cat, level);
            }
            continue;
        }

        if rule_set.get(key).is_none() {
            warn!(rule = %key, "unknown rule in lint configuration");
        }

        if key == NO_UNDEFINED_VALUES.id {
            let parsed: NoUndefinedValuesOptions = toml::Value::Table(options)
                .try_into()
                .map_err(|err: toml::de::Error| ConfigError::InvalidOptions {
                    rule: key.clone(),
                    message: err.message().to_string(),
                })?;
            if value.is_table() {
                config.options.no_undefined_values = Some(parsed);
            }
        } else if let Some(option) = options.keys().next() {
            return Err(ConfigError::UnexpectedOption {
                rule: key.clone(),
                option: option.clone(),
            });
        }

        if let Some(level) = level {
            config.rules.insert(key.clone(), level);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_levels() {
        let config = parse_config(
            r#"
[lints]
all = "warn"
problem = "deny"
suggestion = "forbid"
firestore-set-require-merge = "allow"
"#,
        )
        .unwrap();

        assert_eq!(config.all, Some(LintLevel::Warn));
        assert_eq!(
            config.categories.get(&RuleCategory::Problem),
            Some(&LintLevel::Deny)
        );
        assert_eq!(
            config.categories.get(&RuleCategory::Suggestion),
            Some(&LintLevel::Forbid)
        );
        assert_eq!(
            config.rules.get("firestore-set-require-merge"),
            Some(&LintLevel::Allow)
        );
        assert_eq!(config.options, RuleOptions::default());
    }

    #[test]
    fn test_parse_table_form_with_options() {
        let config = parse_config(
            r#"
[lints]
firestore-no-undefined-values = { level = "warn", additionalObjects = ["batch"] }
"#,
        )
        .unwrap();

        assert_eq!(
            config.rules.get("firestore-no-undefined-values"),
            Some(&LintLevel::Warn)
        );
        assert_eq!(
            config.options.no_undefined_values,
            Some(NoUndefinedValuesOptions {
                additional_objects: vec!["batch".to_string()],
            })
        );
    }

    #[test]
    fn test_options_without_level() {
        let config = parse_config(
            r#"
[lints.firestore-no-undefined-values]
additionalObjects = ["transaction"]
"#,
        )
        .unwrap();

        assert!(config.rules.is_empty());
        assert!(config.all.is_none());
        assert_eq!(
            config
                .options
                .no_undefined_values
                .map(|options| options.additional_objects),
            Some(vec!["transaction".to_string()])
        );
    }

    #[test]
    fn test_no_lints_table() {
        let config = parse_config("[other]\nkey = 1\n").unwrap();
        assert!(config.all.is_none());
        assert!(config.categories.is_empty());
        assert!(config.rules.is_empty());
        assert_eq!(config.options, RuleOptions::default());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            parse_config("[lints]\nall = \"error\"\n"),
            Err(ConfigError::InvalidLevel { .. })
        ));
        assert!(matches!(
            parse_config("[lints]\nall = 3\n"),
            Err(ConfigError::InvalidLevel { .. })
        ));
        assert!(matches!(
            parse_config("lints = 1\n"),
            Err(ConfigError::LintsNotATable)
        ));
        assert!(matches!(
            parse_config("[lints\n"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            parse_config(
                "[lints]\nfirestore-no-undefined-values = { level = \"deny\", objects = [] }\n"
            ),
            Err(ConfigError::InvalidOptions { .. })
        ));
        assert!(matches!(
            parse_config(
                "[lints]\nfirestore-no-undefined-values = { additionalObjects = \"batch\" }\n"
            ),
            Err(ConfigError::InvalidOptions { .. })
        ));
        assert!(matches!(
            parse_config(
                "[lints]\nfirestore-set-require-merge = { level = \"warn\", merge = true }\n"
            ),
            Err(ConfigError::UnexpectedOption { .. })
        ));
    }

    #[test]
    fn test_priority_is_not_an_option() {
        let err = parse_config(
            "[lints]\nfirestore-set-require-merge = { level = \"warn\", priority = 1 }\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnexpectedOption { ref option, .. } if option == "priority"
        ));

        assert!(matches!(
            parse_config("[lints]\nall = { level = \"warn\", priority = 1 }\n"),
            Err(ConfigError::UnexpectedOption { .. })
        ));
        assert!(matches!(
            parse_config(
                "[lints]\nfirestore-no-undefined-values = { level = \"deny\", priority = 1 }\n"
            ),
            Err(ConfigError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_effective_level_precedence() {
        let mut config = ProjectLintConfig {
            all: Some(LintLevel::Warn),
            ..Default::default()
        };
        config
            .categories
            .insert(RuleCategory::Suggestion, LintLevel::Deny);
        config
            .rules
            .insert("firestore-no-undefined-values".to_string(), LintLevel::Allow);

        // Rule override wins
        assert_eq!(
            config.effective_level("firestore-no-undefined-values", RuleCategory::Problem),
            Some(LintLevel::Allow)
        );
        // Category wins over all
        assert_eq!(
            config.effective_level("firestore-set-require-merge", RuleCategory::Suggestion),
            Some(LintLevel::Deny)
        );
        // Falls back to all
        assert_eq!(
            config.effective_level("some-other-rule", RuleCategory::Problem),
            Some(LintLevel::Warn)
        );
    }

    #[test]
    fn test_effective_level_none_when_empty() {
        let config = ProjectLintConfig::default();
        assert_eq!(
            config.effective_level("firestore-set-require-merge", RuleCategory::Suggestion),
            None
        );
    }

    #[test]
    fn test_merge_other_wins() {
        let mut project = ProjectLintConfig {
            all: Some(LintLevel::Warn),
            ..Default::default()
        };
        project
            .categories
            .insert(RuleCategory::Problem, LintLevel::Deny);

        let mut overrides = ProjectLintConfig::default();
        overrides
            .categories
            .insert(RuleCategory::Problem, LintLevel::Allow);
        overrides.options.no_undefined_values = Some(NoUndefinedValuesOptions {
            additional_objects: vec!["batch".to_string()],
        });

        project.merge(&overrides);

        assert_eq!(project.all, Some(LintLevel::Warn));
        assert_eq!(
            project.categories.get(&RuleCategory::Problem),
            Some(&LintLevel::Allow)
        );
        assert!(project.options.no_undefined_values.is_some());
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src").join("db");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(".firestore-lint.toml"),
            "[lints]\nsuggestion = \"allow\"\n",
        )
        .unwrap();

        let file = nested.join("write.ts");
        std::fs::write(&file, "").unwrap();

        assert_eq!(
            find_config_file(&file),
            Some(dir.path().join(".firestore-lint.toml"))
        );
        let config = discover_config(&file).unwrap();
        assert_eq!(
            config.categories.get(&RuleCategory::Suggestion),
            Some(&LintLevel::Allow)
        );
        assert!(config.source.is_some());
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("firestore-lint.toml");
        std::fs::write(&path, "[lints]\nall = \"loud\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("firestore-lint.toml"));
    }
}
