//! LSP backend publishing Firestore lint diagnostics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::capabilities::server_capabilities;
use crate::config::discover_config;
use crate::handlers::{to_lsp_diagnostics, CodeActionHandler};
use crate::{LintConfig, Linter};

/// Document state stored for each open file.
#[derive(Debug)]
pub struct DocumentState {
    pub content: String,
    pub version: i32,
    pub language_id: String,
}

/// The LSP backend for Firestore write linting.
pub struct FirestoreBackend {
    /// LSP client for sending notifications/requests back to the editor.
    client: Client,

    /// Open documents tracked by the server.
    documents: DashMap<Url, DocumentState>,

    /// Linter configured from the workspace's `.firestore-lint.toml`.
    linter: RwLock<Arc<Linter>>,

    /// Code action handler.
    code_action_handler: CodeActionHandler,
}

impl FirestoreBackend {
    /// Create a new backend with the default configuration.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            linter: RwLock::new(Arc::new(Linter::new(LintConfig::default()))),
            code_action_handler: CodeActionHandler::new(),
        }
    }

    /// Load the workspace configuration found above `root`.
    async fn configure(&self, root: &Path) {
        match discover_config(root) {
            Ok(project) => {
                if let Some(source) = &project.source {
                    info!(config = %source.display(), "using lint configuration");
                }
                let config = LintConfig {
                    project,
                    ..LintConfig::default()
                };
                *self.linter.write().await = Arc::new(Linter::new(config));
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "ignoring invalid lint configuration");
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("firestore-lint: invalid configuration: {err:#}"),
                    )
                    .await;
            }
        }
    }

    /// Analyze a document and publish diagnostics.
    async fn analyze_document(&self, uri: &Url) {
        let Some((content, version, path)) = self.documents.get(uri).map(|doc| {
            (
                doc.content.clone(),
                doc.version,
                lint_path(uri, &doc.language_id),
            )
        }) else {
            return;
        };

        let linter = Arc::clone(&*self.linter.read().await);
        let diagnostics = match linter.lint_str(&content, &path) {
            Ok(diagnostics) => to_lsp_diagnostics(&diagnostics, &content),
            Err(err) => {
                warn!(%uri, error = %format!("{err:#}"), "analysis failed");
                Vec::new()
            }
        };

        debug!(%uri, count = diagnostics.len(), "publishing diagnostics");
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(version))
            .await;
    }
}

/// The path used to pick a dialect: the file path itself, or a synthetic
/// one from the language id for unsaved buffers.
fn lint_path(uri: &Url, language_id: &str) -> PathBuf {
    let path = uri
        .to_file_path()
        .unwrap_or_else(|_| PathBuf::from(uri.path()));
    if crate::source::Dialect::from_path(&path).is_some() {
        return path;
    }

    let extension = match language_id {
        "javascript" => "js",
        "javascriptreact" => "jsx",
        "typescript" => "ts",
        "typescriptreact" => "tsx",
        _ => return path,
    };
    path.with_extension(extension)
}

#[tower_lsp::async_trait]
impl LanguageServer for FirestoreBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Firestore lint server initializing");

        #[allow(deprecated)]
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(params.root_uri)
            .and_then(|uri| uri.to_file_path().ok());

        if let Some(root) = root {
            self.configure(&root).await;
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "firestore-lint-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Firestore lint server initialized");

        self.client
            .log_message(MessageType::INFO, "firestore-lint ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Firestore lint server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("Document opened: {}", params.text_document.uri);

        self.documents.insert(
            params.text_document.uri.clone(),
            DocumentState {
                content: params.text_document.text,
                version: params.text_document.version,
                language_id: params.text_document.language_id,
            },
        );

        self.analyze_document(&params.text_document.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("Document changed: {}", params.text_document.uri);

        if let Some(mut doc) = self.documents.get_mut(&params.text_document.uri) {
            // Full sync: the last change holds the whole text
            if let Some(change) = params.content_changes.into_iter().last() {
                doc.content = change.text;
                doc.version = params.text_document.version;
            }
        }

        self.analyze_document(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);

        self.documents.remove(&params.text_document.uri);

        // Clear diagnostics for closed document
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Document saved: {}", params.text_document.uri);

        self.analyze_document(&params.text_document.uri).await;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let actions = self
            .code_action_handler
            .actions(&params.text_document.uri, &params.context.diagnostics);

        if actions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(actions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_path_keeps_known_extensions() {
        let uri = Url::parse("file:///project/src/save.ts").unwrap();
        assert_eq!(lint_path(&uri, "javascript"), PathBuf::from("/project/src/save.ts"));
    }

    #[test]
    fn test_lint_path_from_language_id() {
        let uri = Url::parse("untitled:Untitled-1").unwrap();
        assert_eq!(
            lint_path(&uri, "typescriptreact").extension().and_then(|e| e.to_str()),
            Some("tsx")
        );
        assert_eq!(lint_path(&uri, "markdown").extension(), None);
    }
}
