use dashmap::DashMap;
use std::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::completion::completion_items;
use crate::config::ServerConfig;
use crate::document::Document;
use crate::flatten::flatten;
use crate::observer::TracingObserver;
use crate::workspace::Workspace;

// Custom commands
const CMD_DUMP_SCHEMA: &str = "configSchema.dump";

pub struct ConfigLanguageServer {
    client: Client,
    documents: DashMap<Url, Document>,
    workspace: RwLock<Option<Workspace>>,
}

impl ConfigLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            workspace: RwLock::new(None),
        }
    }

    async fn on_change(&self, uri: Url, text: String, version: i32) {
        tracing::info!("on_change: uri={}, text_len={}", uri, text.len());
        let doc = Document::new(uri.clone(), text, version);

        if let Some(path) = doc.path() {
            if let Ok(mut ws) = self.workspace.write() {
                if let Some(workspace) = ws.as_mut() {
                    workspace.update_file(&path, &doc.text);
                }
            }
        }

        self.documents.insert(uri, doc);
    }

    fn dump_schema(&self, uri: &Url) -> anyhow::Result<serde_json::Value> {
        let path = uri
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("Not a file URI: {}", uri))?;
        let ws = self
            .workspace
            .read()
            .map_err(|_| anyhow::anyhow!("Could not acquire workspace lock"))?;
        let workspace = ws
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Workspace not initialized"))?;

        let (found_in, schema) = workspace.resolve_schema(&path, &TracingObserver)?;
        let suggestions = flatten(&schema, "");
        Ok(serde_json::json!({
            "uri": uri.to_string(),
            "schemaFile": found_in.to_string_lossy(),
            "schema": schema,
            "suggestions": suggestions
        }))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ConfigLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initialize: received request");

        let config = match ServerConfig::from_initialization_options(params.initialization_options) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}, using defaults", e);
                ServerConfig::default()
            }
        };

        #[allow(deprecated)]
        let root_uri = params.root_uri;
        if let Some(root_uri) = root_uri {
            if let Ok(path) = root_uri.to_file_path() {
                tracing::info!("Initializing workspace at {:?}", path);

                let mut workspace = Workspace::new(path, config);
                if let Err(e) = workspace.initialize() {
                    tracing::error!("Failed to initialize workspace: {:#}", e);
                } else {
                    tracing::info!("Workspace initialized: {} files", workspace.program.len());

                    if let Ok(mut ws) = self.workspace.write() {
                        *ws = Some(workspace);
                    }
                }
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), "'".to_string()]),
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![CMD_DUMP_SCHEMA.to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "config-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("initialized: received notification");

        // Get message first, then await
        let message = {
            if let Ok(ws) = self.workspace.read() {
                if let Some(workspace) = ws.as_ref() {
                    format!(
                        "Config LSP initialized: {} files indexed, marker `{}`",
                        workspace.program.len(),
                        workspace.config.marker_type
                    )
                } else {
                    "Config LSP initialized (no workspace)".to_string()
                }
            } else {
                "Config LSP initialized".to_string()
            }
        };

        self.client.log_message(MessageType::INFO, message).await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        tracing::info!("did_open: uri={}", params.text_document.uri);
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;
        self.on_change(uri, text, version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if let Some(change) = params.content_changes.into_iter().next() {
            self.on_change(uri, change.text, version).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let Some((_, doc)) = self.documents.remove(&params.text_document.uri) else {
            return;
        };

        // Unsaved edits are discarded with the buffer
        if let Some(path) = doc.path() {
            if let Ok(mut ws) = self.workspace.write() {
                if let Some(workspace) = ws.as_mut() {
                    if let Err(e) = workspace.reload_file(&path) {
                        tracing::warn!("{:#}", e);
                    }
                }
            }
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let Ok(path) = uri.to_file_path() else {
            return Ok(None);
        };

        let items = {
            let Ok(ws) = self.workspace.read() else {
                return Ok(None);
            };
            let Some(workspace) = ws.as_ref() else {
                tracing::warn!("completion: workspace not initialized");
                return Ok(None);
            };

            match workspace.suggestions(&path, &TracingObserver) {
                Ok(suggestions) => {
                    completion_items(&suggestions, workspace.config.max_completion_items)
                }
                Err(e) => {
                    tracing::info!("completion: {}", e);
                    Vec::new()
                }
            }
        };

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<serde_json::Value>> {
        tracing::info!("execute_command: {:?}", params.command);

        match params.command.as_str() {
            CMD_DUMP_SCHEMA => {
                // Expected arguments: [file_uri]
                if params.arguments.is_empty() {
                    return Ok(Some(serde_json::json!({
                        "error": "Expected 1 argument: file_uri"
                    })));
                }

                let file_uri: String = serde_json::from_value(params.arguments[0].clone())
                    .map_err(|e| tower_lsp::jsonrpc::Error::invalid_params(e.to_string()))?;
                let uri = Url::parse(&file_uri)
                    .map_err(|e| tower_lsp::jsonrpc::Error::invalid_params(format!("Invalid URI: {}", e)))?;

                match self.dump_schema(&uri) {
                    Ok(dump) => Ok(Some(dump)),
                    Err(e) => Ok(Some(serde_json::json!({
                        "error": e.to_string()
                    }))),
                }
            }
            _ => {
                Ok(Some(serde_json::json!({
                    "error": format!("Unknown command: {}", params.command)
                })))
            }
        }
    }
}
