//! Rule metadata for the Firestore lints.
//!
//! The checks themselves live in [`crate::firestore`]; this module describes
//! them (ids, types, default severities, message texts) for configuration,
//! reporting and `--list-rules`.

use serde::{Deserialize, Serialize};

/// A lint rule with associated metadata.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique identifier for the rule.
    pub id: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    /// Rule type.
    pub category: RuleCategory,

    /// Default severity of violations.
    pub severity: RuleSeverity,

    /// Detailed description.
    pub description: &'static str,

    /// Whether findings carry fix suggestions.
    pub has_suggestions: bool,

    /// Reference to documentation.
    pub doc_reference: &'static str,
}

/// Rule types, configurable as a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Code that will fail or corrupt data at runtime.
    Problem,
    /// Code that works but is likely not what was intended.
    Suggestion,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 2] = [RuleCategory::Problem, RuleCategory::Suggestion];

    /// Parse a category from its configuration key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "problem" => Some(RuleCategory::Problem),
            "suggestion" => Some(RuleCategory::Suggestion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Problem => "problem",
            RuleCategory::Suggestion => "suggestion",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleSeverity {
    /// Hint - suggestions for improvement.
    Hint = 0,
    /// Info - informational guidance.
    Info = 1,
    /// Warning - code may have issues.
    Warning = 2,
    /// Error - the write will be rejected or lose data.
    Error = 3,
}

/// Configured lint level, as written in `[lints]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LintLevel {
    Allow,
    Warn,
    Deny,
    Forbid,
}

impl LintLevel {
    pub fn from_key(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "allow" => Some(LintLevel::Allow),
            "warn" => Some(LintLevel::Warn),
            "deny" => Some(LintLevel::Deny),
            "forbid" => Some(LintLevel::Forbid),
            _ => None,
        }
    }

    /// The severity this level reports at; `None` drops the diagnostic.
    pub fn to_severity(self) -> Option<RuleSeverity> {
        match self {
            LintLevel::Allow => None,
            LintLevel::Warn => Some(RuleSeverity::Warning),
            LintLevel::Deny | LintLevel::Forbid => Some(RuleSeverity::Error),
        }
    }
}

/// Identifies a report or suggestion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageId {
    NoUndefinedValues,
    MissingMerge,
    AddOptionParameterMergeTrue,
    ChangeUpdate,
}

impl MessageId {
    pub fn key(&self) -> &'static str {
        match self {
            MessageId::NoUndefinedValues => "noUndefinedValues",
            MessageId::MissingMerge => "missingMerge",
            MessageId::AddOptionParameterMergeTrue => "addOptionParameterMergeTrue",
            MessageId::ChangeUpdate => "changeUpdate",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            MessageId::NoUndefinedValues => {
                "Firestore does not support undefined values in set(), update(), or create() operations. Use null instead or remove the field."
            }
            MessageId::MissingMerge => "Missing merge option parameter.",
            MessageId::AddOptionParameterMergeTrue => "Add option parameter { merge: true }.",
            MessageId::ChangeUpdate => "Change from set to update.",
        }
    }
}

pub static NO_UNDEFINED_VALUES: Rule = Rule {
    id: "firestore-no-undefined-values",
    name: "No Undefined Values",
    category: RuleCategory::Problem,
    severity: RuleSeverity::Error,
    description: "Disallow undefined values in Firestore set(), update(), and create() operations. Firestore rejects documents that contain undefined.",
    has_suggestions: false,
    doc_reference: "https://github.com/konti-kun/eslint-plugin-firestore/blob/main/docs/rules/firestore-no-undefined-values.md",
};

pub static SET_REQUIRE_MERGE: Rule = Rule {
    id: "firestore-set-require-merge",
    name: "Set Requires Merge",
    category: RuleCategory::Suggestion,
    severity: RuleSeverity::Warning,
    description: "Enforce the merge option when calling DocumentReference.set() or setDoc(). Without it the whole document is overwritten.",
    has_suggestions: true,
    doc_reference: "https://github.com/konti-kun/eslint-plugin-firestore/blob/main/docs/rules/firestore-set-require-merge.md",
};

/// Collection of all Firestore rules.
pub struct RuleSet {
    pub rules: Vec<&'static Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            rules: vec![&NO_UNDEFINED_VALUES, &SET_REQUIRE_MERGE],
        }
    }

    /// Get rules by category.
    pub fn by_category(&self, category: RuleCategory) -> Vec<&'static Rule> {
        self.rules
            .iter()
            .copied()
            .filter(|r| r.category == category)
            .collect()
    }

    /// Get a rule by ID.
    pub fn get(&self, id: &str) -> Option<&'static Rule> {
        self.rules.iter().copied().find(|r| r.id == id)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ids_unique() {
        let rule_set = RuleSet::new();
        let mut ids: Vec<&str> = rule_set.rules.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rule_set.rules.len());
    }

    #[test]
    fn test_lookup_by_category_and_id() {
        let rule_set = RuleSet::new();
        assert_eq!(
            rule_set.by_category(RuleCategory::Problem)[0].id,
            "firestore-no-undefined-values"
        );
        assert_eq!(
            rule_set.get("firestore-set-require-merge").map(|r| r.severity),
            Some(RuleSeverity::Warning)
        );
        assert!(rule_set.get("firestore-set-required-merge").is_none());
    }

    #[test]
    fn test_lint_level_from_key() {
        assert_eq!(LintLevel::from_key("warn"), Some(LintLevel::Warn));
        assert_eq!(LintLevel::from_key("DENY"), Some(LintLevel::Deny));
        assert_eq!(LintLevel::from_key("error"), None);
        assert_eq!(LintLevel::Allow.to_severity(), None);
        assert_eq!(LintLevel::Forbid.to_severity(), Some(RuleSeverity::Error));
    }

    #[test]
    fn test_message_keys_match_serde() {
        for id in [
            MessageId::NoUndefinedValues,
            MessageId::MissingMerge,
            MessageId::AddOptionParameterMergeTrue,
            MessageId::ChangeUpdate,
        ] {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.key()));
        }
    }
}
