//! Declaration handles over tree-sitter TypeScript trees.
//!
//! A [`DeclNode`] borrows both the node and the file it came from, so any
//! handle can be turned back into text, a path, or a definition query.

use tree_sitter::Node;

use crate::program::{FileId, SourceFile};

/// Identity of a declaration within one program snapshot
pub type DeclId = (FileId, usize);

/// The node shapes the schema resolver knows how to expand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclVariant {
    Interface,
    Property,
    /// An `extends` clause, or one base type listed inside it
    Heritage,
    Import,
    TypeLiteral,
    ArrayType,
    TypeAlias,
}

#[derive(Clone, Copy)]
pub struct DeclNode<'p> {
    pub file: &'p SourceFile,
    pub node: Node<'p>,
}

impl std::fmt::Debug for DeclNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclNode")
            .field("file", &self.file.path)
            .field("kind", &self.node.kind())
            .field("start", &self.node.start_byte())
            .finish()
    }
}

impl<'p> DeclNode<'p> {
    pub fn new(file: &'p SourceFile, node: Node<'p>) -> Self {
        Self { file, node }
    }

    pub fn id(&self) -> DeclId {
        (self.file.id, self.node.id())
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn text(&self) -> &'p str {
        &self.file.text[self.node.byte_range()]
    }

    /// Another node of the same file
    pub fn with_node(&self, node: Node<'p>) -> DeclNode<'p> {
        DeclNode::new(self.file, node)
    }

    pub fn is(&self, variant: DeclVariant) -> bool {
        match variant {
            DeclVariant::Interface => self.kind() == "interface_declaration",
            DeclVariant::Property => self.kind() == "property_signature",
            DeclVariant::Heritage => self.is_heritage_clause() || self.is_heritage_entry(),
            DeclVariant::Import => self.kind() == "import_statement",
            DeclVariant::TypeLiteral => self.kind() == "object_type",
            DeclVariant::ArrayType => self.is_array_type(),
            DeclVariant::TypeAlias => self.kind() == "type_alias_declaration",
        }
    }

    /// `T[]`, `Array<T>` or `ReadonlyArray<T>`
    pub fn is_array_type(&self) -> bool {
        match self.kind() {
            "array_type" => true,
            "generic_type" => type_name_node(self.node)
                .is_some_and(|name| matches!(self.file.node_text(name), "Array" | "ReadonlyArray")),
            _ => false,
        }
    }

    pub fn is_heritage_clause(&self) -> bool {
        self.kind() == "extends_type_clause"
    }

    /// A single base type listed in an `extends` clause
    pub fn is_heritage_entry(&self) -> bool {
        self.node.is_named()
            && !self.node.is_extra()
            && self
                .node
                .parent()
                .is_some_and(|parent| parent.kind() == "extends_type_clause")
    }

    /// The `name` field of interfaces, type aliases and property signatures
    pub fn name_node(&self) -> Option<Node<'p>> {
        self.node.child_by_field_name("name")
    }

    /// Each base type listed by the interface's `extends` clauses, in order
    pub fn heritage_entries(&self) -> Vec<DeclNode<'p>> {
        let mut entries = Vec::new();
        let mut cursor = self.node.walk();
        for child in self.node.named_children(&mut cursor) {
            if child.kind() == "extends_type_clause" {
                entries.extend(named_members(child).into_iter().map(|n| self.with_node(n)));
            }
        }
        entries
    }

    /// Members of an interface body or an object type literal
    pub fn members(&self) -> Vec<DeclNode<'p>> {
        let container = if self.is(DeclVariant::Interface) {
            self.node.child_by_field_name("body")
        } else {
            Some(self.node)
        };
        container
            .map(|body| named_members(body).into_iter().map(|n| self.with_node(n)).collect())
            .unwrap_or_default()
    }

    /// The type written after a property's `:`, if any
    pub fn annotated_type(&self) -> Option<Node<'p>> {
        let annotation = self.node.child_by_field_name("type")?;
        if annotation.kind() == "type_annotation" {
            named_members(annotation).into_iter().next()
        } else {
            Some(annotation)
        }
    }

    /// Property key as it appears in a dotted path; quoted keys lose their quotes
    pub fn property_name(&self) -> Option<String> {
        let name = self.name_node()?;
        let text = self.file.node_text(name);
        match name.kind() {
            "string" => Some(text.trim_matches(|c| c == '"' || c == '\'').to_string()),
            "computed_property_name" => None,
            _ => Some(text.to_string()),
        }
    }

    /// Value of a type alias (`type X = <value>`)
    pub fn alias_value(&self) -> Option<Node<'p>> {
        self.node.child_by_field_name("value")
    }
}

/// Named children of `node`, skipping comments and other extras
pub fn named_members(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let members = node
        .named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    members
}

/// Start of a node including its leading trivia: the end of the previous
/// non-comment token in document order, or 0 at the start of the file.
pub fn full_start(node: Node) -> usize {
    let mut current = node;
    loop {
        let mut prev = current.prev_sibling();
        while let Some(sibling) = prev {
            if sibling.is_extra() {
                prev = sibling.prev_sibling();
            } else {
                break;
            }
        }
        if let Some(sibling) = prev {
            return sibling.end_byte();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return 0,
        }
    }
}

/// The identifier naming a type use: `Foo`, `Foo<T>` and `ns.Foo` all name `Foo`
pub fn type_name_node(node: Node) -> Option<Node> {
    match node.kind() {
        "type_identifier" | "identifier" => Some(node),
        "generic_type" | "nested_type_identifier" => {
            type_name_node(node.child_by_field_name("name")?)
        }
        _ => None,
    }
}

/// Statements at file level, looking through `export` and `declare` wrappers
pub fn top_level_declarations(file: &SourceFile) -> Vec<Node<'_>> {
    named_members(file.root_node())
        .into_iter()
        .filter_map(unwrap_declaration)
        .collect()
}

fn unwrap_declaration(node: Node) -> Option<Node> {
    match node.kind() {
        "export_statement" => match node.child_by_field_name("declaration") {
            Some(inner) => unwrap_declaration(inner),
            None => Some(node),
        },
        "ambient_declaration" => named_members(node).into_iter().next().and_then(unwrap_declaration),
        _ => Some(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TsParser;
    use crate::program::Program;
    use std::path::{Path, PathBuf};

    fn program_with(source: &str) -> Program {
        let mut program = Program::new();
        program.insert(&TsParser::new(), PathBuf::from("/ws/a.ts"), source.to_string());
        program
    }

    fn first_decl<'p>(file: &'p SourceFile) -> DeclNode<'p> {
        DeclNode::new(file, top_level_declarations(file)[0])
    }

    #[test]
    fn test_interface_parts() {
        let program = program_with(
            "export interface AppConfig extends Base, Other<string> {\n  // comment\n  port: number;\n  'x-key'?: string;\n  listen(): void;\n}",
        );
        let file = program.find_source_file(Path::new("/ws/a.ts")).unwrap();
        let decl = first_decl(file);

        assert!(decl.is(DeclVariant::Interface));
        assert_eq!(file.node_text(decl.name_node().unwrap()), "AppConfig");

        let heritage = decl.heritage_entries();
        assert_eq!(heritage.len(), 2);
        assert!(heritage.iter().all(|h| h.is(DeclVariant::Heritage)));
        assert_eq!(heritage[1].text(), "Other<string>");

        let members = decl.members();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].property_name().as_deref(), Some("port"));
        assert_eq!(members[1].property_name().as_deref(), Some("x-key"));
        assert_eq!(file.node_text(members[0].annotated_type().unwrap()), "number");
        assert!(!members[2].is(DeclVariant::Property));
    }

    #[test]
    fn test_array_type_variant() {
        let program = program_with(
            "interface A {\n  a: string[];\n  b: Array<string>;\n  c: ReadonlyArray<number>;\n  d: Set<string>;\n  e: string;\n}",
        );
        let file = program.find_source_file(Path::new("/ws/a.ts")).unwrap();
        let arrays: Vec<bool> = first_decl(file)
            .members()
            .into_iter()
            .map(|m| m.with_node(m.annotated_type().unwrap()).is(DeclVariant::ArrayType))
            .collect();

        assert_eq!(arrays, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_full_start_includes_trivia() {
        let source = "interface A extends /* base */ B {}";
        let program = program_with(source);
        let file = program.find_source_file(Path::new("/ws/a.ts")).unwrap();
        let decl = first_decl(file);

        let name = decl.name_node().unwrap();
        assert_eq!(full_start(name), "interface".len());
        assert_eq!(full_start(decl.node), 0);

        let base = decl.heritage_entries()[0];
        assert_eq!(full_start(base.node), "interface A extends".len());
    }

    #[test]
    fn test_type_name_node() {
        let program = program_with("interface A { a: Foo<string>; b: ns.Bar; c: string }");
        let file = program.find_source_file(Path::new("/ws/a.ts")).unwrap();
        let members = first_decl(file).members();

        let name = |i: usize| {
            members[i]
                .annotated_type()
                .and_then(type_name_node)
                .map(|n| file.node_text(n).to_string())
        };
        assert_eq!(name(0).as_deref(), Some("Foo"));
        assert_eq!(name(1).as_deref(), Some("Bar"));
        assert_eq!(name(2), None);
    }

    #[test]
    fn test_top_level_declarations_unwraps_wrappers() {
        let program = program_with("declare interface A {}\nexport interface B {}\ninterface C {}");
        let file = program.find_source_file(Path::new("/ws/a.ts")).unwrap();
        let kinds: Vec<_> = top_level_declarations(file).iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["interface_declaration"; 3]);
    }
}
