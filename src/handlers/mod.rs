//! LSP handlers for the language server.

mod code_action;
mod publish;

pub use code_action::{CodeActionHandler, SuggestionData};
pub use publish::{lsp_range, to_lsp_diagnostics};

/// `source` of every diagnostic this server publishes.
pub const LSP_SOURCE: &str = "firestore-lint";
