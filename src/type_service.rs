//! "Where is this type declared" queries over a [`Program`].
//!
//! [`WorkspaceTypeService`] is a scope-level resolver, not a type checker:
//! it maps a type identifier to the interface or type alias declarations that
//! bind that name, looking at the file itself, its imports (following
//! re-exports), then global scripts.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tree_sitter::Node;

use crate::program::{normalize_path, Program, SourceFile};
use crate::syntax::{named_members, top_level_declarations};

/// Re-export chains longer than this are treated as unresolvable
const MAX_REEXPORT_DEPTH: usize = 8;

const MODULE_SUFFIXES: &[&str] = &[".ts", ".tsx", ".d.ts", "/index.ts", "/index.tsx", "/index.d.ts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

/// One answer to a definition query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionInfo {
    pub file_name: PathBuf,
    /// Span of the declaration's name token
    pub text_span: TextSpan,
}

/// The type-checking capability the schema resolver consumes
pub trait TypeService {
    fn program(&self) -> &Program;

    /// Declarations of the type named at (or just after) `offset` in `file_name`
    fn definition_at_position(&self, file_name: &Path, offset: usize) -> Vec<DefinitionInfo>;
}

pub struct WorkspaceTypeService<'p> {
    program: &'p Program,
}

impl<'p> WorkspaceTypeService<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    fn resolve_module(&self, from: &SourceFile, specifier: &str) -> Option<&'p SourceFile> {
        if !(specifier.starts_with('.') || specifier.starts_with('/')) {
            return None;
        }
        let base = from.path.parent().unwrap_or(Path::new("")).join(specifier);

        let mut candidates = vec![base.clone()];
        if let Some(stem) = specifier.strip_suffix(".js") {
            candidates.push(from.path.parent().unwrap_or(Path::new("")).join(format!("{stem}.ts")));
        }
        for suffix in MODULE_SUFFIXES {
            let mut path: OsString = base.clone().into_os_string();
            path.push(suffix);
            candidates.push(PathBuf::from(path));
        }

        candidates
            .iter()
            .find_map(|candidate| self.program.find_source_file(&normalize_path(candidate)))
    }

    /// Declarations a module makes visible under `name`, following re-exports
    fn exported_declarations(&self, file: &'p SourceFile, name: &str, depth: usize) -> Vec<DefinitionInfo> {
        if name == "default" {
            if let Some(local_name) = default_export_name(file) {
                let local = declarations_named(file, local_name);
                if !local.is_empty() || depth >= MAX_REEXPORT_DEPTH {
                    return local;
                }
                // `import X from './x'; export default X;`
                return self
                    .resolve_import(file, local_name, depth + 1)
                    .unwrap_or_default();
            }
        }

        let local = declarations_named(file, name);
        if !local.is_empty() || depth >= MAX_REEXPORT_DEPTH {
            return local;
        }

        let mut found = Vec::new();
        for statement in named_members(file.root_node()) {
            if statement.kind() != "export_statement" {
                continue;
            }
            let Some(source) = statement.child_by_field_name("source") else {
                continue;
            };
            if named_members(statement).iter().any(|n| n.kind() == "namespace_export") {
                continue;
            }
            let Some(target) = self.resolve_module(file, unquote(file.node_text(source))) else {
                continue;
            };

            match named_members(statement).into_iter().find(|n| n.kind() == "export_clause") {
                Some(clause) => {
                    for specifier in named_members(clause) {
                        let original = specifier.child_by_field_name("name");
                        let exported = specifier.child_by_field_name("alias").or(original);
                        if exported.is_some_and(|e| file.node_text(e) == name) {
                            if let Some(original) = original {
                                found.extend(self.exported_declarations(
                                    target,
                                    file.node_text(original),
                                    depth + 1,
                                ));
                            }
                        }
                    }
                }
                // `export * from '...'`
                None => found.extend(self.exported_declarations(target, name, depth + 1)),
            }
        }
        found
    }

    /// Resolve `name` through the file's named and default imports.
    /// `None` means no import binds the name.
    fn resolve_import(&self, file: &'p SourceFile, name: &str, depth: usize) -> Option<Vec<DefinitionInfo>> {
        for (clause, source) in import_clauses(file) {
            for binding in named_members(clause) {
                let imported = match binding.kind() {
                    "named_imports" => named_members(binding).into_iter().find_map(|specifier| {
                        let original = specifier.child_by_field_name("name")?;
                        let local = specifier.child_by_field_name("alias").unwrap_or(original);
                        (file.node_text(local) == name).then(|| file.node_text(original))
                    }),
                    "identifier" if file.node_text(binding) == name => Some("default"),
                    _ => None,
                };

                if let Some(imported) = imported {
                    let resolved = self
                        .resolve_module(file, source)
                        .map(|target| self.exported_declarations(target, imported, depth))
                        .unwrap_or_default();
                    return Some(resolved);
                }
            }
        }
        None
    }

    /// `ns.Name` where `ns` comes from `import * as ns from '...'`
    fn resolve_namespace_member(&self, file: &'p SourceFile, namespace: &str, name: &str) -> Vec<DefinitionInfo> {
        for (clause, source) in import_clauses(file) {
            let binds_namespace = named_members(clause).into_iter().any(|binding| {
                binding.kind() == "namespace_import"
                    && named_members(binding)
                        .into_iter()
                        .any(|ident| file.node_text(ident) == namespace)
            });
            if binds_namespace {
                return self
                    .resolve_module(file, source)
                    .map(|target| self.exported_declarations(target, name, 0))
                    .unwrap_or_default();
            }
        }
        Vec::new()
    }

    /// Declarations contributed to the global scope by script files
    fn resolve_global(&self, from: &SourceFile, name: &str) -> Vec<DefinitionInfo> {
        self.program
            .files()
            .filter(|file| file.id != from.id && !file.is_module())
            .flat_map(|file| declarations_named(file, name))
            .collect()
    }
}

impl TypeService for WorkspaceTypeService<'_> {
    fn program(&self) -> &Program {
        self.program
    }

    fn definition_at_position(&self, file_name: &Path, offset: usize) -> Vec<DefinitionInfo> {
        let Some(file) = self.program.find_source_file(file_name) else {
            return Vec::new();
        };
        let Some((name, qualifier)) = type_reference_at(file, offset) else {
            return Vec::new();
        };
        let name = file.node_text(name);

        if let Some(qualifier) = qualifier {
            return self.resolve_namespace_member(file, file.node_text(qualifier), name);
        }

        let local = declarations_named(file, name);
        if !local.is_empty() {
            return local;
        }
        if let Some(imported) = self.resolve_import(file, name, 0) {
            return imported;
        }
        self.resolve_global(file, name)
    }
}

/// Top-level interfaces and type aliases of `file` named `name`
fn declarations_named(file: &SourceFile, name: &str) -> Vec<DefinitionInfo> {
    top_level_declarations(file)
        .into_iter()
        .filter(|node| matches!(node.kind(), "interface_declaration" | "type_alias_declaration"))
        .filter_map(|node| node.child_by_field_name("name"))
        .filter(|ident| file.node_text(*ident) == name)
        .map(|ident| DefinitionInfo {
            file_name: file.path.clone(),
            text_span: TextSpan {
                start: ident.start_byte(),
                length: ident.end_byte() - ident.start_byte(),
            },
        })
        .collect()
}

/// Local name behind a module's default export: `export default interface X`,
/// `export default X` or `export { X as default }`
fn default_export_name(file: &SourceFile) -> Option<&str> {
    named_members(file.root_node())
        .into_iter()
        .filter(|statement| statement.kind() == "export_statement")
        .filter(|statement| statement.child_by_field_name("source").is_none())
        .find_map(|statement| {
            let mut cursor = statement.walk();
            let is_default = statement
                .children(&mut cursor)
                .any(|child| child.kind() == "default");
            if is_default {
                if let Some(declaration) = statement.child_by_field_name("declaration") {
                    let name = declaration.child_by_field_name("name")?;
                    return Some(file.node_text(name));
                }
                let value = statement.child_by_field_name("value")?;
                return is_identifier(value).then(|| file.node_text(value));
            }

            let clause = named_members(statement)
                .into_iter()
                .find(|n| n.kind() == "export_clause")?;
            named_members(clause).into_iter().find_map(|specifier| {
                let alias = specifier.child_by_field_name("alias")?;
                let original = specifier.child_by_field_name("name")?;
                (file.node_text(alias) == "default").then(|| file.node_text(original))
            })
        })
}

/// `(import_clause, module specifier)` for each import statement with bindings
fn import_clauses(file: &SourceFile) -> Vec<(Node<'_>, &str)> {
    named_members(file.root_node())
        .into_iter()
        .filter(|statement| statement.kind() == "import_statement")
        .filter_map(|statement| {
            let source = statement.child_by_field_name("source")?;
            let clause = named_members(statement)
                .into_iter()
                .find(|n| n.kind() == "import_clause")?;
            Some((clause, unquote(file.node_text(source))))
        })
        .collect()
}

/// The identifier touching or following `offset`, plus its namespace qualifier
fn type_reference_at(file: &SourceFile, offset: usize) -> Option<(Node<'_>, Option<Node<'_>>)> {
    let mut scope = file.root_node().named_descendant_for_byte_range(offset, offset)?;
    let ident = loop {
        if let Some(ident) = first_identifier_after(scope, offset) {
            break ident;
        }
        scope = scope.parent()?;
    };

    match ident.parent() {
        Some(parent) if parent.kind() == "nested_type_identifier" => {
            let name = parent.child_by_field_name("name")?;
            let module = parent
                .child_by_field_name("module")
                .filter(|m| m.kind() == "identifier");
            Some((name, module))
        }
        _ => Some((ident, None)),
    }
}

fn is_identifier(node: Node) -> bool {
    matches!(node.kind(), "type_identifier" | "identifier")
}

fn first_identifier_after(node: Node, offset: usize) -> Option<Node> {
    if is_identifier(node) && node.end_byte() > offset {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.end_byte() > offset)
        .find_map(|child| first_identifier_after(child, offset))
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
