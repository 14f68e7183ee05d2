//! Recognizes monitored write calls and locates their payload argument.

use crate::firestore::operations::{MonitoredOperations, ReceiverFilter};
use crate::syntax::{CallExpr, Expr, Span};

/// A call recognized as a monitored operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    /// Logical operation name (`setDoc`, `set`, ...).
    pub operation: String,
    /// Span of the callee identifier or member property naming the operation.
    pub operation_span: Span,
    /// 1 for `setDoc(ref, payload)`, 0 for `ref.set(payload)`.
    pub payload_index: usize,
}

impl CallSignature {
    /// The options argument follows the payload.
    pub fn options_index(&self) -> usize {
        self.payload_index + 1
    }
}

/// Classify `call` against `operations`.
pub fn classify(call: &CallExpr, operations: &MonitoredOperations) -> Option<CallSignature> {
    match call.callee.as_ref() {
        Expr::Ident(ident) if operations.is_function(&ident.name) => Some(CallSignature {
            operation: ident.name.clone(),
            operation_span: ident.span,
            payload_index: 1,
        }),
        Expr::Member(member) => {
            let name = member.property_name()?;
            if !operations.is_method(name) {
                return None;
            }
            if !receiver_matches(&member.object, &operations.receivers) {
                return None;
            }
            Some(CallSignature {
                operation: name.to_string(),
                operation_span: member.property_span(),
                payload_index: 0,
            })
        }
        _ => None,
    }
}

fn receiver_matches(receiver: &Expr, filter: &ReceiverFilter) -> bool {
    match filter {
        ReceiverFilter::Any => true,
        ReceiverFilter::AllowList(names) if names.is_empty() => true,
        ReceiverFilter::AllowList(names) => match receiver {
            Expr::Ident(ident) => names.iter().any(|name| *name == ident.name),
            // Anything else is a chain such as `doc().set(...)`.
            _ => true,
        },
        ReceiverFilter::DocumentCall => is_document_call(receiver),
    }
}

/// `doc(...)` or `something.doc(...)`.
fn is_document_call(receiver: &Expr) -> bool {
    let Expr::Call(call) = receiver else {
        return false;
    };
    match call.callee.as_ref() {
        Expr::Ident(ident) => ident.name == "doc",
        Expr::Member(member) => member.property_name() == Some("doc"),
        _ => false,
    }
}
