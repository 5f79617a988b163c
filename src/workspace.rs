use anyhow::Context;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::completion::{resolve_schema, CompletionError};
use crate::config::ServerConfig;
use crate::flatten::{flatten, Suggestion};
use crate::observer::SchemaObserver;
use crate::parser::TsParser;
use crate::program::{normalize_path, Program};
use crate::schema::SchemaTree;
use crate::type_service::WorkspaceTypeService;

/// Every TypeScript file under the workspace root, parsed
pub struct Workspace {
    pub root_path: PathBuf,
    pub config: ServerConfig,
    pub program: Program,
    parser: TsParser,
}

impl Workspace {
    pub fn new(root_path: PathBuf, config: ServerConfig) -> Self {
        Self {
            root_path,
            config,
            program: Program::new(),
            parser: TsParser::new(),
        }
    }

    /// Index all TypeScript files, skipping excluded directories
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        let config = &self.config;
        let walker = WalkDir::new(&self.root_path).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !config.is_excluded_dir(&entry.file_name().to_string_lossy())
        });

        let mut paths = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_typescript_file(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        tracing::info!("Indexing {} TypeScript files", paths.len());

        for path in paths {
            if let Err(e) = self.index_file(&path) {
                tracing::warn!("Failed to index {:?}: {:#}", path, e);
            }
        }

        tracing::info!("Indexed {} TypeScript files", self.program.len());
        Ok(())
    }

    fn index_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.program
            .insert(&self.parser, path.to_path_buf(), content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(())
    }

    /// Re-parse a file from editor contents
    pub fn update_file(&mut self, path: &Path, text: &str) {
        if !is_typescript_file(path) {
            return;
        }
        if self
            .program
            .insert(&self.parser, path.to_path_buf(), text.to_string())
            .is_none()
        {
            tracing::warn!("Failed to parse {}", path.display());
        }
    }

    /// Re-read a file from disk, dropping unsaved editor contents
    pub fn reload_file(&mut self, path: &Path) -> anyhow::Result<()> {
        if !is_typescript_file(path) || !path.exists() {
            return Ok(());
        }
        self.index_file(path)
    }

    /// The requested file first, then the configured schema files
    pub fn schema_candidates(&self, requested: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![normalize_path(requested)];
        for file in &self.config.schema_files {
            let path = normalize_path(&self.root_path.join(file));
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
        candidates
    }

    /// Schema of the first candidate file declaring a configuration root
    pub fn resolve_schema(
        &self,
        requested: &Path,
        observer: &dyn SchemaObserver,
    ) -> Result<(PathBuf, SchemaTree), CompletionError> {
        let service = WorkspaceTypeService::new(&self.program);
        let mut first_error = None;

        for candidate in self.schema_candidates(requested) {
            match resolve_schema(&service, &candidate, &self.config.marker_type, observer) {
                Ok(schema) => return Ok((candidate, schema)),
                Err(err) => {
                    tracing::debug!("{}", err);
                    first_error.get_or_insert(err);
                }
            }
        }

        Err(first_error.unwrap_or_else(|| CompletionError::NoConfigSchema {
            file: requested.to_path_buf(),
            marker: self.config.marker_type.clone(),
        }))
    }

    pub fn suggestions(
        &self,
        requested: &Path,
        observer: &dyn SchemaObserver,
    ) -> Result<Vec<Suggestion>, CompletionError> {
        let (_, schema) = self.resolve_schema(requested, observer)?;
        Ok(flatten(&schema, ""))
    }
}

fn is_typescript_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts") | Some("tsx") | Some("mts") | Some("cts")
    )
}
