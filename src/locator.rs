//! Finding declarations inside a single file.

use tree_sitter::Node;

use crate::program::SourceFile;
use crate::syntax::{full_start, top_level_declarations, type_name_node, DeclNode};

/// Find the first node, in document pre-order, whose full start equals `offset`.
///
/// Interfaces and type aliases are matched on their name rather than on the
/// whole declaration, since definition queries report the name's position.
/// Every descendant is visited, not only top-level statements.
pub fn locate(file: &SourceFile, offset: usize) -> Option<DeclNode<'_>> {
    let mut cursor = file.root_node().walk();
    loop {
        let node = cursor.node();
        if anchor(node) == Some(offset) {
            return Some(DeclNode::new(file, node));
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn anchor(node: Node) -> Option<usize> {
    if node.is_extra() {
        return None;
    }
    match node.kind() {
        "interface_declaration" | "type_alias_declaration" => {
            node.child_by_field_name("name").map(full_start)
        }
        _ => Some(full_start(node)),
    }
}

/// Find the configuration root: the first top-level interface whose `extends`
/// clause lists `marker` as a base type.
pub fn find_config_root<'f>(file: &'f SourceFile, marker: &str) -> Option<DeclNode<'f>> {
    top_level_declarations(file)
        .into_iter()
        .map(|node| DeclNode::new(file, node))
        .filter(|decl| decl.kind() == "interface_declaration")
        .find(|decl| {
            decl.heritage_entries().iter().any(|base| {
                type_name_node(base.node).is_some_and(|name| file.node_text(name) == marker)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TsParser;
    use crate::program::Program;
    use std::path::{Path, PathBuf};

    fn program_with(source: &str) -> Program {
        let mut program = Program::new();
        program.insert(&TsParser::new(), PathBuf::from("/ws/config.ts"), source.to_string());
        program
    }

    fn file(program: &Program) -> &SourceFile {
        program.find_source_file(Path::new("/ws/config.ts")).unwrap()
    }

    #[test]
    fn test_locate_interface_by_name() {
        let source = "import { X } from './x';\n\ninterface Logger {\n  level: string;\n}\n";
        let program = program_with(source);
        let name_start = source.find("Logger").unwrap();

        let found = locate(file(&program), name_start - 1).unwrap();
        assert_eq!(found.kind(), "interface_declaration");
        assert!(found.text().starts_with("interface Logger"));
    }

    #[test]
    fn test_locate_reaches_nested_nodes() {
        let source = "interface A {\n  items: { port: number }[];\n}";
        let program = program_with(source);
        let inner = source.find("port").unwrap();

        // `port` is preceded by "{ ", so its full start is one before the name
        let found = locate(file(&program), inner - 1).unwrap();
        assert_eq!(found.kind(), "property_signature");
        assert_eq!(found.property_name().as_deref(), Some("port"));
    }

    #[test]
    fn test_locate_missing_offset() {
        let source = "interface A { a: string }";
        let program = program_with(source);
        assert!(locate(file(&program), source.len() + 10).is_none());
    }

    #[test]
    fn test_find_config_root() {
        let source = r#"
import { EggAppConfig } from 'egg';

interface Unrelated extends Base {}

export interface DefaultConfig extends EggAppConfig {
  keys: string;
}

export interface SecondConfig extends EggAppConfig {}
"#;
        let program = program_with(source);
        let root = find_config_root(file(&program), "EggAppConfig").unwrap();
        assert!(root.text().starts_with("interface DefaultConfig"));
    }

    #[test]
    fn test_find_config_root_generic_and_qualified_marker() {
        let program = program_with("interface A extends PowerPartial<X>, egg.EggAppConfig {}");
        assert!(find_config_root(file(&program), "EggAppConfig").is_some());
        assert!(find_config_root(file(&program), "PowerPartial").is_some());
    }

    #[test]
    fn test_find_config_root_missing() {
        let program = program_with("interface A { a: string }\ninterface B extends A {}");
        assert!(find_config_root(file(&program), "EggAppConfig").is_none());
    }

    #[test]
    fn test_find_config_root_ignores_nested_declarations() {
        let program = program_with(
            "declare module 'egg' {\n  interface Inner extends EggAppConfig {}\n}",
        );
        assert!(find_config_root(file(&program), "EggAppConfig").is_none());
    }
}
