//! Resolving a type use to the declaration nodes it refers to.
//!
//! The type service answers queries made from *inside* an identifier, and
//! reports the start of the declaration's name token. The node locator works
//! on full starts (start including leading trivia). [`probe_offset`] and
//! [`locate_offset`] convert between the two and are exact inverses: a use
//! anchored at full start `a` is queried at `a + 1`, and a declaration whose
//! name token starts at `s` is located at `s - 1`. Both assume the single
//! separator character of conventionally formatted source; when that does not
//! hold the answer simply fails to relocate and is dropped.

use crate::locator::locate;
use crate::observer::{SchemaEvent, SchemaObserver};
use crate::syntax::{full_start, named_members, DeclNode, DeclVariant};
use crate::type_service::TypeService;

/// Offset to query the type service at, for a type use whose full start is `anchor`
pub fn probe_offset(anchor: usize) -> usize {
    anchor + 1
}

/// Full start to search for, given the name-token start reported by the type service
pub fn locate_offset(span_start: usize) -> usize {
    span_start.saturating_sub(1)
}

/// Cross-file lookup used by the schema resolver
pub trait DefinitionResolver<'p> {
    fn resolve_definitions(&self, usage: &DeclNode<'p>) -> Vec<DeclNode<'p>>;
}

/// Full start of the type name a usage node refers to, if it is a usage
pub fn usage_anchor(usage: &DeclNode) -> Option<usize> {
    if usage.is_heritage_clause() {
        let first = named_members(usage.node).into_iter().next()?;
        return Some(full_start(first));
    }
    if usage.is_heritage_entry() {
        return Some(full_start(usage.node));
    }
    if usage.is(DeclVariant::Property) {
        return usage.annotated_type().map(full_start);
    }
    if usage.is(DeclVariant::Import) {
        let clause = named_members(usage.node)
            .into_iter()
            .find(|n| n.kind() == "import_clause")?;
        return first_binding(clause).map(full_start);
    }
    None
}

fn first_binding(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    named_members(node).into_iter().find_map(first_binding)
}

/// [`DefinitionResolver`] backed by a [`TypeService`]
pub struct ServiceDefinitionResolver<'p, S: TypeService + ?Sized> {
    service: &'p S,
    observer: &'p dyn SchemaObserver,
}

impl<'p, S: TypeService + ?Sized> ServiceDefinitionResolver<'p, S> {
    pub fn new(service: &'p S, observer: &'p dyn SchemaObserver) -> Self {
        Self { service, observer }
    }
}

impl<'p, S: TypeService + ?Sized> DefinitionResolver<'p> for ServiceDefinitionResolver<'p, S> {
    fn resolve_definitions(&self, usage: &DeclNode<'p>) -> Vec<DeclNode<'p>> {
        let Some(anchor) = usage_anchor(usage) else {
            return Vec::new();
        };
        let probe = probe_offset(anchor);
        let definitions = self.service.definition_at_position(&usage.file.path, probe);
        self.observer.on_event(&SchemaEvent::DefinitionQuery {
            file: &usage.file.path,
            probe,
            results: definitions.len(),
        });

        let program = self.service.program();
        definitions
            .iter()
            .filter_map(|definition| {
                let offset = locate_offset(definition.text_span.start);
                let located = program
                    .find_source_file(&definition.file_name)
                    .and_then(|file| locate(file, offset));
                if located.is_none() {
                    self.observer.on_event(&SchemaEvent::DefinitionDropped {
                        file: &definition.file_name,
                        offset,
                    });
                }
                located
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use crate::parser::TsParser;
    use crate::program::{Program, SourceFile};
    use crate::syntax::top_level_declarations;
    use crate::type_service::WorkspaceTypeService;
    use std::path::{Path, PathBuf};

    fn program(files: &[(&str, &str)]) -> Program {
        let parser = TsParser::new();
        let mut program = Program::new();
        for (path, text) in files {
            program.insert(&parser, PathBuf::from(path), text.to_string());
        }
        program
    }

    fn decl<'p>(file: &'p SourceFile, index: usize) -> DeclNode<'p> {
        DeclNode::new(file, top_level_declarations(file)[index])
    }

    #[test]
    fn test_offset_transforms_are_inverse() {
        for anchor in [0usize, 1, 9, 1024] {
            assert_eq!(locate_offset(probe_offset(anchor)), anchor);
        }
        assert_eq!(probe_offset(locate_offset(10)), 10);
        assert_eq!(locate_offset(0), 0);
    }

    #[test]
    fn test_usage_anchor() {
        let source = "import { Logger } from './logger';\ninterface App extends Base {\n  logger: Logger;\n  port;\n}";
        let program = program(&[("/ws/app.ts", source)]);
        let file = program.find_source_file(Path::new("/ws/app.ts")).unwrap();

        let import = decl(file, 0);
        assert_eq!(usage_anchor(&import), Some(source.find("Logger").unwrap() - 1));

        let app = decl(file, 1);
        let base = app.heritage_entries()[0];
        assert_eq!(usage_anchor(&base), Some(source.find("Base").unwrap() - 1));

        let clause = app.with_node(base.node.parent().unwrap());
        assert_eq!(usage_anchor(&clause), usage_anchor(&base));

        let members = app.members();
        assert_eq!(usage_anchor(&members[0]), Some(source.find(": Logger").unwrap() + 1));
        assert_eq!(usage_anchor(&members[1]), None);
        assert_eq!(usage_anchor(&app), None);
    }

    #[test]
    fn test_resolve_property_type_across_files() {
        let program = program(&[
            ("/ws/app.ts", "import { Logger } from './logger';\ninterface App {\n  logger: Logger;\n}"),
            ("/ws/logger.ts", "// shared logger options\nexport interface Logger {\n  level: string;\n}"),
        ]);
        let file = program.find_source_file(Path::new("/ws/app.ts")).unwrap();
        let service = WorkspaceTypeService::new(&program);
        let observer = RecordingObserver::default();
        let resolver = ServiceDefinitionResolver::new(&service, &observer);

        let property = decl(file, 1).members()[0];
        let found = resolver.resolve_definitions(&property);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), "interface_declaration");
        assert_eq!(found[0].file.path, PathBuf::from("/ws/logger.ts"));
        assert_eq!(observer.count("definition_query"), 1);
    }

    #[test]
    fn test_resolve_heritage_and_import() {
        let program = program(&[
            ("/ws/app.ts", "import { Base } from './base';\ninterface App extends Base {}"),
            ("/ws/base.ts", "export interface Base {\n  keys: string;\n}"),
        ]);
        let file = program.find_source_file(Path::new("/ws/app.ts")).unwrap();
        let service = WorkspaceTypeService::new(&program);
        let observer = RecordingObserver::default();
        let resolver = ServiceDefinitionResolver::new(&service, &observer);

        let base = decl(file, 1).heritage_entries()[0];
        let from_heritage = resolver.resolve_definitions(&base);
        assert_eq!(from_heritage.len(), 1);
        assert!(from_heritage[0].text().starts_with("interface Base"));

        let from_import = resolver.resolve_definitions(&decl(file, 0));
        assert_eq!(from_import.len(), 1);
        assert_eq!(from_import[0].id(), from_heritage[0].id());
    }

    #[test]
    fn test_unlocatable_answer_is_dropped() {
        // Two spaces after `interface`: the reported name start no longer lines up
        let program = program(&[(
            "/ws/app.ts",
            "interface  Logger { level: string }\ninterface App { logger: Logger }",
        )]);
        let file = program.find_source_file(Path::new("/ws/app.ts")).unwrap();
        let service = WorkspaceTypeService::new(&program);
        let observer = RecordingObserver::default();
        let resolver = ServiceDefinitionResolver::new(&service, &observer);

        let property = decl(file, 1).members()[0];
        assert!(resolver.resolve_definitions(&property).is_empty());
        assert_eq!(observer.count("definition_dropped"), 1);
    }
}
