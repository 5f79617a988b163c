//! The set of parsed TypeScript files a completion request reads from.
//!
//! Files are keyed by their exact path. A file keeps its id when it is
//! re-parsed, so declaration identities stay comparable within a request.

use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use tree_sitter::Tree;

use crate::parser::{Dialect, TsParser};

/// Index of a file inside its [`Program`]
pub type FileId = usize;

/// A parsed source file
#[derive(Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
}

impl SourceFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        &self.text[node.byte_range()]
    }

    /// Declaration files and scripts share the global scope unless they import or export
    pub fn is_module(&self) -> bool {
        let root = self.root_node();
        let mut cursor = root.walk();
        let is_module = root
            .children(&mut cursor)
            .any(|child| matches!(child.kind(), "import_statement" | "export_statement"));
        is_module
    }
}

/// An enumerable collection of parsed files
#[derive(Debug, Default)]
pub struct Program {
    files: IndexMap<PathBuf, SourceFile>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and add it under `path`, replacing any previous version of the file
    pub fn insert(&mut self, parser: &TsParser, path: PathBuf, text: String) -> Option<FileId> {
        let path = normalize_path(&path);
        let tree = parser.parse_dialect(&text, Dialect::for_path(&path))?;
        let id = self
            .files
            .get_index_of(&path)
            .unwrap_or_else(|| self.files.len());
        let file = SourceFile {
            id,
            path: path.clone(),
            text,
            tree,
        };
        self.files.insert(path, file);
        Some(id)
    }

    /// Exact path lookup
    pub fn find_source_file(&self, path: &Path) -> Option<&SourceFile> {
        self.files
            .get(path)
            .or_else(|| self.files.get(&normalize_path(path)))
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find() {
        let parser = TsParser::new();
        let mut program = Program::new();
        let id = program
            .insert(&parser, PathBuf::from("/ws/config.ts"), "interface A {}".to_string())
            .unwrap();

        let file = program.find_source_file(Path::new("/ws/config.ts")).unwrap();
        assert_eq!(file.id, id);
        assert!(program.find_source_file(Path::new("/ws/other.ts")).is_none());
    }

    #[test]
    fn test_reinsert_keeps_id() {
        let parser = TsParser::new();
        let mut program = Program::new();
        program.insert(&parser, PathBuf::from("/ws/a.ts"), "interface A {}".to_string());
        let b = program
            .insert(&parser, PathBuf::from("/ws/b.ts"), "interface B {}".to_string())
            .unwrap();
        let b_again = program
            .insert(&parser, PathBuf::from("/ws/b.ts"), "interface C {}".to_string())
            .unwrap();

        assert_eq!(b, b_again);
        assert_eq!(program.len(), 2);
        let file = program.find_source_file(Path::new("/ws/b.ts")).unwrap();
        assert_eq!(file.id, b);
        assert_eq!(file.text, "interface C {}");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/ws/config/../typings/./index.d.ts")),
            PathBuf::from("/ws/typings/index.d.ts")
        );
    }

    #[test]
    fn test_is_module() {
        let parser = TsParser::new();
        let mut program = Program::new();
        program.insert(&parser, PathBuf::from("/ws/global.d.ts"), "interface G {}".to_string());
        program.insert(
            &parser,
            PathBuf::from("/ws/mod.ts"),
            "export interface M {}".to_string(),
        );

        assert!(!program.find_source_file(Path::new("/ws/global.d.ts")).unwrap().is_module());
        assert!(program.find_source_file(Path::new("/ws/mod.ts")).unwrap().is_module());
    }
}
