//! Checks the options argument of an overwriting write for a merge directive.

use crate::firestore::classify::CallSignature;
use crate::syntax::{CallExpr, Expr, Literal, LiteralValue, Property};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCheck {
    Satisfied,
    Missing(MissingReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// The call stops before the options argument.
    NoOptionsArgument,
    /// The options argument is not an object literal.
    NotAnObject,
    /// The object literal has no satisfying `merge` / `mergeFields`.
    NoMergeDirective,
}

pub fn check_merge(call: &CallExpr, signature: &CallSignature) -> MergeCheck {
    let Some(options) = call.argument(signature.options_index()) else {
        return MergeCheck::Missing(MissingReason::NoOptionsArgument);
    };
    let Some(options) = options.as_object() else {
        return MergeCheck::Missing(MissingReason::NotAnObject);
    };

    if options.properties().any(is_merge_directive) {
        MergeCheck::Satisfied
    } else {
        MergeCheck::Missing(MissingReason::NoMergeDirective)
    }
}

/// `merge: true` or `mergeFields: [...]`.
pub fn is_merge_directive(property: &Property) -> bool {
    match (property.key.static_name(), &property.value) {
        (
            Some("merge"),
            Expr::Literal(Literal {
                value: LiteralValue::Boolean(true),
                ..
            }),
        ) => true,
        (Some("mergeFields"), Expr::Array(_)) => true,
        _ => false,
    }
}
