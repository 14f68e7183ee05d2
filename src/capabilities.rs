//! LSP Server capabilities configuration.

use tower_lsp::lsp_types::*;

/// Returns the server capabilities for the Firestore lint server.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Full text document sync
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(false),
                will_save_wait_until: Some(false),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
            },
        )),

        // Quick fixes built from diagnostic suggestions
        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
            work_done_progress_options: WorkDoneProgressOptions::default(),
            resolve_provider: Some(false),
        })),

        // Diagnostics are pushed from didOpen/didChange/didSave, not pulled
        diagnostic_provider: None,

        ..Default::default()
    }
}
