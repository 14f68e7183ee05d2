//! The per-call checks behind each Firestore rule.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::firestore::classify::classify;
use crate::firestore::fix::{merge_suggestions, Suggestion};
use crate::firestore::merge::{check_merge, MergeCheck};
use crate::firestore::operations::MonitoredOperations;
use crate::firestore::payload::contains_sentinel;
use crate::rules::{MessageId, Rule, NO_UNDEFINED_VALUES, SET_REQUIRE_MERGE};
use crate::syntax::{CallExpr, SourceContext, Span};

/// A rule violation located in the source, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule_id: &'static str,
    pub message_id: MessageId,
    pub span: Span,
    pub suggestions: Vec<Suggestion>,
}

/// A rule evaluated once per call expression.
pub trait CallRule: Send + Sync {
    fn rule(&self) -> &'static Rule;

    fn check_call(&self, call: &CallExpr, source: &dyn SourceContext, findings: &mut Vec<Finding>);
}

/// Options accepted by `firestore-no-undefined-values`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NoUndefinedValuesOptions {
    /// Receiver names (`batch`, `transaction`) whose `set` / `update` /
    /// `create` methods are checked. Empty checks every receiver.
    #[serde(default)]
    pub additional_objects: Vec<String>,
}

/// Reports write payloads that contain `undefined`.
pub struct NoUndefinedValues {
    operations: MonitoredOperations,
}

impl NoUndefinedValues {
    pub fn new(options: &NoUndefinedValuesOptions) -> Self {
        Self {
            operations: MonitoredOperations::writes(&options.additional_objects),
        }
    }
}

impl Default for NoUndefinedValues {
    fn default() -> Self {
        Self::new(&NoUndefinedValuesOptions::default())
    }
}

impl CallRule for NoUndefinedValues {
    fn rule(&self) -> &'static Rule {
        &NO_UNDEFINED_VALUES
    }

    fn check_call(&self, call: &CallExpr, source: &dyn SourceContext, findings: &mut Vec<Finding>) {
        let Some(signature) = classify(call, &self.operations) else {
            return;
        };
        let Some(payload) = call.argument(signature.payload_index) else {
            return;
        };

        if contains_sentinel(payload, source) {
            debug!(operation = %signature.operation, "undefined in write payload");
            findings.push(Finding {
                rule_id: NO_UNDEFINED_VALUES.id,
                message_id: MessageId::NoUndefinedValues,
                span: payload.span(),
                suggestions: Vec::new(),
            });
        }
    }
}

/// Reports document sets that would overwrite instead of merge.
pub struct SetRequireMerge {
    operations: MonitoredOperations,
}

impl SetRequireMerge {
    pub fn new() -> Self {
        Self {
            operations: MonitoredOperations::overwriting_sets(),
        }
    }
}

impl Default for SetRequireMerge {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRule for SetRequireMerge {
    fn rule(&self) -> &'static Rule {
        &SET_REQUIRE_MERGE
    }

    fn check_call(&self, call: &CallExpr, source: &dyn SourceContext, findings: &mut Vec<Finding>) {
        let Some(signature) = classify(call, &self.operations) else {
            return;
        };

        if let MergeCheck::Missing(reason) = check_merge(call, &signature) {
            debug!(operation = %signature.operation, ?reason, "set without merge");
            findings.push(Finding {
                rule_id: SET_REQUIRE_MERGE.id,
                message_id: MessageId::MissingMerge,
                span: call.span,
                suggestions: merge_suggestions(call, &signature, source),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Dialect, SourceFile};

    fn run(rule: &dyn CallRule, code: &str) -> Vec<Finding> {
        let source = SourceFile::parse(code, Dialect::JavaScript).unwrap();
        let mut findings = Vec::new();
        for call in source.calls() {
            rule.check_call(&call, &source, &mut findings);
        }
        findings
    }

    #[test]
    fn test_no_undefined_reports_payload_span() {
        let code = "doc().set({ name: undefined })";
        let findings = run(&NoUndefinedValues::default(), code);
        assert_eq!(findings.len(), 1);
        let span = findings[0].span;
        assert_eq!(&code[span.start..span.end], "{ name: undefined }");
        assert!(findings[0].suggestions.is_empty());
    }

    #[test]
    fn test_no_undefined_missing_payload() {
        assert!(run(&NoUndefinedValues::default(), "doc().set()").is_empty());
        assert!(run(&NoUndefinedValues::default(), "setDoc(undefined)").is_empty());
    }

    #[test]
    fn test_no_undefined_with_additional_objects() {
        let batch = NoUndefinedValues::new(&NoUndefinedValuesOptions {
            additional_objects: vec!["batch".to_string()],
        });
        assert_eq!(run(&batch, "batch.set({ name: undefined })").len(), 1);

        let transaction = NoUndefinedValues::new(&NoUndefinedValuesOptions {
            additional_objects: vec!["transaction".to_string()],
        });
        assert!(run(&transaction, "batch.set({ name: undefined })").is_empty());
    }

    #[test]
    fn test_set_require_merge_reports_call_span() {
        let code = "doc().set({});";
        let findings = run(&SetRequireMerge::new(), code);
        assert_eq!(findings.len(), 1);
        let span = findings[0].span;
        assert_eq!(&code[span.start..span.end], "doc().set({})");
        assert_eq!(findings[0].message_id, MessageId::MissingMerge);
        assert_eq!(findings[0].suggestions.len(), 2);
    }

    #[test]
    fn test_set_require_merge_passes() {
        assert!(run(&SetRequireMerge::new(), "doc().set({}, { merge: true })").is_empty());
        assert!(run(&SetRequireMerge::new(), "ref.set({})").is_empty());
    }

    #[test]
    fn test_options_deserialize() {
        let options: NoUndefinedValuesOptions =
            serde_json::from_str(r#"{ "additionalObjects": ["batch"] }"#).unwrap();
        assert_eq!(options.additional_objects, vec!["batch".to_string()]);

        let empty: NoUndefinedValuesOptions = serde_json::from_str("{}").unwrap();
        assert!(empty.additional_objects.is_empty());

        assert!(serde_json::from_str::<NoUndefinedValuesOptions>(r#"{ "objects": [] }"#).is_err());
    }
}
