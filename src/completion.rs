//! Root lookup, schema resolution and flattening for one completion request.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use crate::definition::ServiceDefinitionResolver;
use crate::flatten::{flatten, Suggestion};
use crate::locator::find_config_root;
use crate::observer::SchemaObserver;
use crate::schema::{SchemaResolver, SchemaTree};
use crate::type_service::TypeService;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{} is not part of the program", .0.display())]
    FileNotInProgram(PathBuf),
    #[error("no configuration schema found in {}: no interface extends `{marker}`", file.display())]
    NoConfigSchema { file: PathBuf, marker: String },
}

/// Resolve the schema of the configuration declaration in `file`
pub fn resolve_schema<S: TypeService + ?Sized>(
    service: &S,
    file: &Path,
    marker: &str,
    observer: &dyn SchemaObserver,
) -> Result<SchemaTree, CompletionError> {
    let source = service
        .program()
        .find_source_file(file)
        .ok_or_else(|| CompletionError::FileNotInProgram(file.to_path_buf()))?;
    let root = find_config_root(source, marker).ok_or_else(|| CompletionError::NoConfigSchema {
        file: file.to_path_buf(),
        marker: marker.to_string(),
    })?;

    let definitions = ServiceDefinitionResolver::new(service, observer);
    let mut resolver = SchemaResolver::new(&definitions, observer);
    Ok(resolver.build_schema(root))
}

pub fn suggestions<S: TypeService + ?Sized>(
    service: &S,
    file: &Path,
    marker: &str,
    observer: &dyn SchemaObserver,
) -> Result<Vec<Suggestion>, CompletionError> {
    let schema = resolve_schema(service, file, marker, observer)?;
    Ok(flatten(&schema, ""))
}

/// Editor items for `suggestions`, keeping declaration order
pub fn completion_items(suggestions: &[Suggestion], max_items: usize) -> Vec<CompletionItem> {
    suggestions
        .iter()
        .take(max_items)
        .enumerate()
        .map(|(index, suggestion)| CompletionItem {
            label: suggestion.path.clone(),
            kind: Some(if suggestion.is_leaf {
                CompletionItemKind::FIELD
            } else {
                CompletionItemKind::MODULE
            }),
            detail: suggestion.detail.clone(),
            sort_text: Some(format!("{:05}", index)),
            ..Default::default()
        })
        .collect()
}
