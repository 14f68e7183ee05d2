//! Conversion of lint diagnostics into LSP diagnostics.

use tower_lsp::lsp_types::{
    Diagnostic as LspDiagnostic, DiagnosticSeverity, NumberOrString, Position, Range, TextEdit,
};

use crate::diagnostics::Diagnostic;
use crate::handlers::code_action::SuggestionData;
use crate::handlers::LSP_SOURCE;
use crate::rules::RuleSeverity;
use crate::source::LineIndex;
use crate::syntax::Span;

/// Convert `diagnostics` for a document whose text is `content`.
pub fn to_lsp_diagnostics(diagnostics: &[Diagnostic], content: &str) -> Vec<LspDiagnostic> {
    let lines = LineIndex::new(content);
    diagnostics
        .iter()
        .map(|diag| to_lsp_diagnostic(diag, content, &lines))
        .collect()
}

fn to_lsp_diagnostic(diag: &Diagnostic, content: &str, lines: &LineIndex) -> LspDiagnostic {
    let suggestions: Vec<SuggestionData> = diag
        .suggestions
        .iter()
        .map(|suggestion| SuggestionData {
            title: suggestion.message().to_string(),
            edit: TextEdit {
                range: lsp_range(content, lines, suggestion.edit.range()),
                new_text: suggestion.edit.new_text().to_string(),
            },
        })
        .collect();

    let data = if suggestions.is_empty() {
        None
    } else {
        serde_json::to_value(suggestions).ok()
    };

    LspDiagnostic {
        range: lsp_range(content, lines, Span::new(diag.start_byte, diag.end_byte)),
        severity: Some(lsp_severity(diag.severity)),
        code: Some(NumberOrString::String(diag.rule_id.clone())),
        source: Some(LSP_SOURCE.to_string()),
        message: diag.message.clone(),
        data,
        ..Default::default()
    }
}

/// Byte span to an LSP range in UTF-16 code units.
pub fn lsp_range(content: &str, lines: &LineIndex, span: Span) -> Range {
    let (start_line, start_character) = lines.utf16_position(content, span.start);
    let (end_line, end_character) = lines.utf16_position(content, span.end);
    Range {
        start: Position {
            line: start_line,
            character: start_character,
        },
        end: Position {
            line: end_line,
            character: end_character,
        },
    }
}

fn lsp_severity(severity: RuleSeverity) -> DiagnosticSeverity {
    match severity {
        RuleSeverity::Error => DiagnosticSeverity::ERROR,
        RuleSeverity::Warning => DiagnosticSeverity::WARNING,
        RuleSeverity::Info => DiagnosticSeverity::INFORMATION,
        RuleSeverity::Hint => DiagnosticSeverity::HINT,
    }
}
