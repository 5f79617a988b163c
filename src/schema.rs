//! Recursive resolution of a configuration declaration into a schema tree.
//!
//! [`SchemaResolver::build_schema`] runs a fixed sequence of independent,
//! predicate-guarded merge steps over a node. Every step whose predicate holds
//! contributes to the same tree, later contributions overwriting earlier keys.
//! Cross-file expansion goes through a [`DefinitionResolver`].

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

use crate::definition::DefinitionResolver;
use crate::observer::{SchemaEvent, SchemaObserver};
use crate::program::SourceFile;
use crate::syntax::{named_members, DeclId, DeclNode, DeclVariant};

/// Coarse classification of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Primitive,
    Array,
    Reference,
    ObjectLiteral,
    Unknown,
}

impl TypeKind {
    pub fn classify(file: &SourceFile, node: Node) -> TypeKind {
        let node = unwrap_type(node);
        match node.kind() {
            "predefined_type" | "literal_type" | "template_literal_type" => TypeKind::Primitive,
            "array_type" => TypeKind::Array,
            "generic_type" if is_array_generic(file, node) => TypeKind::Array,
            "type_identifier" | "nested_type_identifier" | "generic_type" => TypeKind::Reference,
            "object_type" => TypeKind::ObjectLiteral,
            _ => TypeKind::Unknown,
        }
    }
}

/// Look through `(T)` and `readonly T`
fn unwrap_type(node: Node) -> Node {
    match node.kind() {
        "parenthesized_type" | "readonly_type" => named_members(node)
            .into_iter()
            .next()
            .map(unwrap_type)
            .unwrap_or(node),
        _ => node,
    }
}

fn is_array_generic(file: &SourceFile, node: Node) -> bool {
    node.kind() == "generic_type" && DeclNode::new(file, node).is(DeclVariant::ArrayType)
}

/// Element type of `T[]` or `Array<T>`
fn element_type<'t>(file: &SourceFile, node: Node<'t>) -> Option<Node<'t>> {
    let node = unwrap_type(node);
    match node.kind() {
        "array_type" => named_members(node).into_iter().next(),
        "generic_type" if is_array_generic(file, node) => node
            .child_by_field_name("type_arguments")
            .and_then(|args| named_members(args).into_iter().next()),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEntry {
    /// `None` when the property has no annotation or its named type did not resolve
    pub kind: Option<TypeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_kind: Option<TypeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<SchemaTree>,
    /// Declared type as written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SchemaEntry {
    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Property name to entry, in declaration order
pub type SchemaTree = IndexMap<String, SchemaEntry>;

enum Expansion {
    Tree(SchemaTree),
    /// The declaration is already being expanded further up the stack
    Cycle,
}

pub struct SchemaResolver<'p, 'r> {
    definitions: &'r dyn DefinitionResolver<'p>,
    observer: &'r dyn SchemaObserver,
    expanding: HashSet<DeclId>,
    expanded: HashMap<DeclId, SchemaTree>,
}

impl<'p, 'r> SchemaResolver<'p, 'r> {
    pub fn new(definitions: &'r dyn DefinitionResolver<'p>, observer: &'r dyn SchemaObserver) -> Self {
        Self {
            definitions,
            observer,
            expanding: HashSet::new(),
            expanded: HashMap::new(),
        }
    }

    pub fn build_schema(&mut self, node: DeclNode<'p>) -> SchemaTree {
        let is_declaration = node.is(DeclVariant::Interface) || node.is(DeclVariant::TypeAlias);
        if is_declaration {
            self.expanding.insert(node.id());
        }

        let mut tree = SchemaTree::new();
        if node.is(DeclVariant::Interface) {
            self.merge_interface(node, &mut tree);
        }
        if node.is(DeclVariant::Property) {
            self.merge_property(node, &mut tree);
        }
        if node.is(DeclVariant::Import) {
            self.merge_resolved(node, &mut tree);
        }
        if node.is(DeclVariant::Heritage) {
            self.merge_resolved(node, &mut tree);
        }
        if node.is(DeclVariant::TypeLiteral) {
            self.merge_members(node, &mut tree);
        }
        if node.is(DeclVariant::TypeAlias) {
            self.merge_alias(node, &mut tree);
        }

        self.observer.on_event(&SchemaEvent::Expanded {
            file: &node.file.path,
            kind: node.kind(),
            entries: tree.len(),
        });

        if is_declaration {
            self.expanding.remove(&node.id());
            self.expanded.insert(node.id(), tree.clone());
        }
        tree
    }

    /// Expand a declaration reached through definition lookup, at most once per run
    fn expand(&mut self, declaration: DeclNode<'p>) -> Expansion {
        let id = declaration.id();
        if let Some(tree) = self.expanded.get(&id) {
            return Expansion::Tree(tree.clone());
        }
        if self.expanding.contains(&id) {
            let name = declaration
                .name_node()
                .map(|n| declaration.file.node_text(n))
                .unwrap_or_else(|| declaration.kind());
            self.observer.on_event(&SchemaEvent::CycleDetected {
                file: &declaration.file.path,
                declaration: name,
            });
            return Expansion::Cycle;
        }
        Expansion::Tree(self.build_schema(declaration))
    }

    /// Inherited members first, then own members over them
    fn merge_interface(&mut self, node: DeclNode<'p>, tree: &mut SchemaTree) {
        for base in node.heritage_entries() {
            let inherited = self.build_schema(base);
            tree.extend(inherited);
        }
        self.merge_members(node, tree);
    }

    fn merge_members(&mut self, node: DeclNode<'p>, tree: &mut SchemaTree) {
        for member in node.members() {
            let schema = self.build_schema(member);
            tree.extend(schema);
        }
    }

    /// Heritage and import uses: merge every declaration they resolve to
    fn merge_resolved(&mut self, usage: DeclNode<'p>, tree: &mut SchemaTree) {
        for declaration in self.definitions.resolve_definitions(&usage) {
            if let Expansion::Tree(schema) = self.expand(declaration) {
                tree.extend(schema);
            }
        }
    }

    fn merge_property(&mut self, property: DeclNode<'p>, tree: &mut SchemaTree) {
        let Some(name) = property.property_name() else {
            return;
        };
        let file = property.file;
        let annotated = property.annotated_type();
        let kind = annotated.map(|ty| TypeKind::classify(file, ty));
        let detail = annotated.map(|ty| file.node_text(ty).to_string());

        if kind == Some(TypeKind::Reference) {
            let entry = self.resolve_reference(property, &name, detail);
            tree.insert(name, entry);
            return;
        }

        let mut entry = SchemaEntry {
            kind,
            detail,
            ..Default::default()
        };
        if let Some(ty) = annotated.map(|ty| property.with_node(unwrap_type(ty))) {
            if ty.is(DeclVariant::ArrayType) {
                entry.element_kind = element_type(file, ty.node).map(|el| TypeKind::classify(file, el));
            }
            if ty.is(DeclVariant::TypeLiteral) {
                entry.children = Some(self.build_schema(ty));
            }
        }
        tree.insert(name, entry);
    }

    /// A property typed by name: its children are the merged schema of every
    /// declaration the name resolves to
    fn resolve_reference(&mut self, property: DeclNode<'p>, name: &str, detail: Option<String>) -> SchemaEntry {
        let declarations = self.definitions.resolve_definitions(&property);
        if declarations.is_empty() {
            self.observer.on_event(&SchemaEvent::UnresolvedReference {
                file: &property.file.path,
                property: name,
                type_text: detail.as_deref().unwrap_or_default(),
            });
            return SchemaEntry {
                kind: None,
                detail,
                ..Default::default()
            };
        }

        let mut children: Option<SchemaTree> = None;
        for declaration in declarations {
            if let Expansion::Tree(schema) = self.expand(declaration) {
                children.get_or_insert_with(SchemaTree::new).extend(schema);
            }
        }
        SchemaEntry {
            kind: Some(TypeKind::Reference),
            children,
            detail,
            ..Default::default()
        }
    }

    /// `type X = { ... }`
    fn merge_alias(&mut self, alias: DeclNode<'p>, tree: &mut SchemaTree) {
        let Some(value) = alias.alias_value().map(unwrap_type) else {
            return;
        };
        if value.kind() == "object_type" {
            let schema = self.build_schema(alias.with_node(value));
            tree.extend(schema);
        }
    }
}
