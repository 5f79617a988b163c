//! Diagnostic events emitted while a schema is being resolved.

use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub enum SchemaEvent<'a> {
    /// A definition query was made for a type use
    DefinitionQuery {
        file: &'a Path,
        probe: usize,
        results: usize,
    },
    /// A definition answer could not be mapped back to a declaration node
    DefinitionDropped { file: &'a Path, offset: usize },
    /// A property's named type resolved to nothing
    UnresolvedReference {
        file: &'a Path,
        property: &'a str,
        type_text: &'a str,
    },
    /// A declaration was reached again while it was still being expanded
    CycleDetected { file: &'a Path, declaration: &'a str },
    /// A node finished resolving into `entries` schema entries
    Expanded {
        file: &'a Path,
        kind: &'static str,
        entries: usize,
    },
}

impl SchemaEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaEvent::DefinitionQuery { .. } => "definition_query",
            SchemaEvent::DefinitionDropped { .. } => "definition_dropped",
            SchemaEvent::UnresolvedReference { .. } => "unresolved_reference",
            SchemaEvent::CycleDetected { .. } => "cycle_detected",
            SchemaEvent::Expanded { .. } => "expanded",
        }
    }
}

pub trait SchemaObserver {
    fn on_event(&self, event: &SchemaEvent<'_>);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SchemaObserver for TracingObserver {
    fn on_event(&self, event: &SchemaEvent<'_>) {
        match *event {
            SchemaEvent::DefinitionQuery {
                file,
                probe,
                results,
            } => {
                tracing::debug!(file = %file.display(), probe, results, "definition query");
            }
            SchemaEvent::DefinitionDropped { file, offset } => {
                tracing::debug!(file = %file.display(), offset, "no declaration at definition site");
            }
            SchemaEvent::UnresolvedReference {
                file,
                property,
                type_text,
            } => {
                tracing::debug!(file = %file.display(), property, type_text, "unresolved type reference");
            }
            SchemaEvent::CycleDetected { file, declaration } => {
                tracing::warn!(file = %file.display(), declaration, "cyclic type reference, not expanding again");
            }
            SchemaEvent::Expanded {
                file,
                kind,
                entries,
            } => {
                tracing::trace!(file = %file.display(), kind, entries, "resolved schema node");
            }
        }
    }
}
