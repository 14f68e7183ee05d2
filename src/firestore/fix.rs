//! Suggested rewrites for calls that overwrite a document without merging.

use serde::Serialize;

use crate::firestore::classify::CallSignature;
use crate::firestore::operations::update_variant;
use crate::rules::MessageId;
use crate::syntax::{CallExpr, SourceContext, Span, Token, TokenKind};

/// The options object the insertion suggestion adds.
pub const MERGE_OPTION: &str = "{ merge: true }";

/// A single token-anchored source edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TextEdit {
    InsertBefore { token: Token, text: String },
    Replace { token: Token, text: String },
}

impl TextEdit {
    /// Byte range the edit replaces; empty for insertions.
    pub fn range(&self) -> Span {
        match self {
            TextEdit::InsertBefore { token, .. } => Span::empty(token.span.start),
            TextEdit::Replace { token, .. } => token.span,
        }
    }

    pub fn new_text(&self) -> &str {
        match self {
            TextEdit::InsertBefore { text, .. } | TextEdit::Replace { text, .. } => text,
        }
    }

    /// `content` with the edit applied. Out-of-range edits leave it unchanged.
    pub fn apply(&self, content: &str) -> String {
        let range = self.range();
        match (content.get(..range.start), content.get(range.end..)) {
            (Some(before), Some(after)) if range.start <= range.end => {
                format!("{before}{}{after}", self.new_text())
            }
            _ => content.to_string(),
        }
    }
}

/// One alternative fix for a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub message_id: MessageId,
    pub edit: TextEdit,
}

impl Suggestion {
    pub fn message(&self) -> &'static str {
        self.message_id.text()
    }
}

/// Fixes for a set call that lacks a merge directive, in preference order.
pub fn merge_suggestions(
    call: &CallExpr,
    signature: &CallSignature,
    source: &dyn SourceContext,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    // Appending only yields `op(.., payload, { merge: true })` when the
    // payload is the last argument.
    if call.arguments.len() == signature.options_index() {
        if let Some(edit) = insert_merge_option(call, source) {
            suggestions.push(Suggestion {
                message_id: MessageId::AddOptionParameterMergeTrue,
                edit,
            });
        }
    }

    if let Some(edit) = rewrite_to_update(signature, source) {
        suggestions.push(Suggestion {
            message_id: MessageId::ChangeUpdate,
            edit,
        });
    }

    suggestions
}

/// Insert `, { merge: true }` before the closing parenthesis of `call`.
pub fn insert_merge_option(call: &CallExpr, source: &dyn SourceContext) -> Option<TextEdit> {
    // Only the tokens after the last argument matter.
    let tail_start = call
        .arguments
        .last()
        .map_or(call.callee.span().end, |argument| argument.span().end);
    let tokens = source.tokens_of(Span::new(tail_start, call.span.end));
    let (closing, rest) = tokens.split_last()?;
    if !closing.is_punctuator(")") {
        return None;
    }

    let trailing_comma = rest.last().is_some_and(|token| token.is_punctuator(","));
    let text = if trailing_comma {
        format!(" {MERGE_OPTION}")
    } else {
        format!(", {MERGE_OPTION}")
    };

    Some(TextEdit::InsertBefore {
        token: closing.clone(),
        text,
    })
}

/// Replace the operation name with its update counterpart.
pub fn rewrite_to_update(
    signature: &CallSignature,
    source: &dyn SourceContext,
) -> Option<TextEdit> {
    let replacement = update_variant(&signature.operation)?;
    let token = source
        .tokens_of(signature.operation_span)
        .into_iter()
        .find(|token| token.span == signature.operation_span)?;

    let text = match token.kind {
        TokenKind::String | TokenKind::Template => {
            let quote = token.text.chars().next()?;
            format!("{quote}{replacement}{quote}")
        }
        _ => replacement.to_string(),
    };

    Some(TextEdit::Replace { token, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::classify::classify;
    use crate::firestore::operations::MonitoredOperations;
    use crate::source::{Dialect, SourceFile};

    /// Apply every suggestion for the first call in `code`.
    fn outputs(code: &str) -> Vec<(MessageId, String)> {
        let source = SourceFile::parse(code, Dialect::JavaScript).unwrap();
        let call = source.calls().into_iter().next().unwrap();
        let signature = classify(&call, &MonitoredOperations::overwriting_sets()).unwrap();
        merge_suggestions(&call, &signature, &source)
            .into_iter()
            .map(|suggestion| (suggestion.message_id, suggestion.edit.apply(code)))
            .collect()
    }

    #[test]
    fn test_method_set() {
        assert_eq!(
            outputs("doc().set({});"),
            vec![
                (
                    MessageId::AddOptionParameterMergeTrue,
                    "doc().set({}, { merge: true });".to_string()
                ),
                (MessageId::ChangeUpdate, "doc().update({});".to_string()),
            ]
        );
    }

    #[test]
    fn test_trailing_comma() {
        assert_eq!(
            outputs("doc().set({},);"),
            vec![
                (
                    MessageId::AddOptionParameterMergeTrue,
                    "doc().set({}, { merge: true });".to_string()
                ),
                (MessageId::ChangeUpdate, "doc().update({},);".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_set_doc() {
        let code = "setDoc(doc(getFirestore(), 'test'), {content: 'aaa'})";
        assert_eq!(
            outputs(code),
            vec![
                (
                    MessageId::AddOptionParameterMergeTrue,
                    "setDoc(doc(getFirestore(), 'test'), {content: 'aaa'}, { merge: true })"
                        .to_string()
                ),
                (
                    MessageId::ChangeUpdate,
                    "updateDoc(doc(getFirestore(), 'test'), {content: 'aaa'})".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_comment_before_closing_paren() {
        assert_eq!(
            outputs("doc().set({} /* data */)")[0].1,
            "doc().set({} /* data */, { merge: true })"
        );
    }

    #[test]
    fn test_insertion_withheld_without_payload_or_with_options() {
        let missing_payload =
            outputs("setDoc(doc(getFirestore(), {content: 'aaa'}, {merge: 'aaa'}))");
        assert_eq!(missing_payload.len(), 1);
        assert_eq!(missing_payload[0].0, MessageId::ChangeUpdate);

        let bad_options = outputs("doc().set({}, { merge: false })");
        assert_eq!(
            bad_options,
            vec![(
                MessageId::ChangeUpdate,
                "doc().update({}, { merge: false })".to_string()
            )]
        );
    }

    #[test]
    fn test_computed_key_keeps_quotes() {
        assert_eq!(
            outputs("doc()['set']({})")[1].1,
            "doc()['update']({})"
        );
        assert_eq!(
            outputs("doc()[\"set\"]({})")[1].1,
            "doc()[\"update\"]({})"
        );
    }

    #[test]
    fn test_edit_range_and_apply() {
        let token = Token {
            kind: TokenKind::Punctuator,
            text: ")".to_string(),
            span: Span::new(5, 6),
        };
        let insert = TextEdit::InsertBefore {
            token: token.clone(),
            text: ", x".to_string(),
        };
        assert_eq!(insert.range(), Span::empty(5));
        assert_eq!(insert.apply("f(a, )"), "f(a, , x)");

        let replace = TextEdit::Replace {
            token,
            text: "]".to_string(),
        };
        assert_eq!(replace.apply("f(a, )"), "f(a, ]");
        assert_eq!(replace.apply("f("), "f(");
    }
}
