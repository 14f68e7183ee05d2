//! Code action provider for Firestore fixes.
//!
//! Suggestions travel with each published diagnostic in its `data` field, so
//! a code action request only has to read them back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::*;
use tracing::debug;

use crate::handlers::LSP_SOURCE;

/// One suggestion as stored in `Diagnostic::data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionData {
    pub title: String,
    pub edit: TextEdit,
}

/// Handler for code action requests.
#[derive(Debug, Default)]
pub struct CodeActionHandler;

impl CodeActionHandler {
    /// Create a new code action handler.
    pub fn new() -> Self {
        Self
    }

    /// Provide quick fixes for the diagnostics in the request context.
    pub fn actions(&self, uri: &Url, diagnostics: &[Diagnostic]) -> CodeActionResponse {
        let mut actions = Vec::new();

        for diagnostic in diagnostics {
            if diagnostic.source.as_deref() != Some(LSP_SOURCE) {
                continue;
            }

            let Some(data) = diagnostic.data.clone() else {
                continue;
            };
            let suggestions: Vec<SuggestionData> = match serde_json::from_value(data) {
                Ok(suggestions) => suggestions,
                Err(err) => {
                    debug!(%err, "ignoring diagnostic data that is not a suggestion list");
                    continue;
                }
            };

            for (idx, suggestion) in suggestions.into_iter().enumerate() {
                actions.push(self.quick_fix(uri, diagnostic, suggestion, idx == 0));
            }
        }

        actions
    }

    fn quick_fix(
        &self,
        uri: &Url,
        diagnostic: &Diagnostic,
        suggestion: SuggestionData,
        preferred: bool,
    ) -> CodeActionOrCommand {
        let changes: HashMap<Url, Vec<TextEdit>> =
            [(uri.clone(), vec![suggestion.edit])].into_iter().collect();

        CodeActionOrCommand::CodeAction(CodeAction {
            title: suggestion.title,
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![diagnostic.clone()]),
            edit: Some(WorkspaceEdit {
                changes: Some(changes),
                ..Default::default()
            }),
            is_preferred: Some(preferred),
            ..Default::default()
        })
    }
}
