use std::sync::Mutex;
use tree_sitter::{Language, Parser, Tree};

fn typescript_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

/// Which grammar a file is parsed with, picked from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn for_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }

    fn language(self) -> Language {
        match self {
            Dialect::TypeScript => typescript_language(),
            Dialect::Tsx => tsx_language(),
        }
    }
}

/// One configured parser per dialect, reused across files
pub struct TsParser {
    typescript: Mutex<Parser>,
    tsx: Mutex<Parser>,
}

impl TsParser {
    pub fn new() -> Self {
        Self {
            typescript: Mutex::new(parser_for(Dialect::TypeScript)),
            tsx: Mutex::new(parser_for(Dialect::Tsx)),
        }
    }

    pub fn parse_dialect(&self, source: &str, dialect: Dialect) -> Option<Tree> {
        let parser = match dialect {
            Dialect::TypeScript => &self.typescript,
            Dialect::Tsx => &self.tsx,
        };
        let mut parser = parser.lock().ok()?;
        parser.parse(source, None)
    }
}

fn parser_for(dialect: Dialect) -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .expect("Failed to load TypeScript grammar");
    parser
}

impl Default for TsParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_interface() {
        let parser = TsParser::new();
        let tree = parser
            .parse_dialect("interface Config { port: number }", Dialect::TypeScript)
            .unwrap();
        let root = tree.root_node();
        assert_eq!(root.kind(), "program");
        assert_eq!(root.child(0).unwrap().kind(), "interface_declaration");
        assert!(!root.has_error());
    }

    #[test]
    fn test_parser_is_reused_across_dialects() {
        let parser = TsParser::new();
        let first = parser
            .parse_dialect("interface A { a: string }", Dialect::TypeScript)
            .unwrap();
        let view = parser
            .parse_dialect("const view = <div>{label}</div>;", Dialect::Tsx)
            .unwrap();
        let second = parser
            .parse_dialect("interface B { b: number }", Dialect::TypeScript)
            .unwrap();

        assert!(!first.root_node().has_error());
        assert!(!view.root_node().has_error());
        assert!(!second.root_node().has_error());
    }

    #[test]
    fn test_dialect_for_path() {
        assert_eq!(Dialect::for_path(Path::new("a/b.ts")), Dialect::TypeScript);
        assert_eq!(Dialect::for_path(Path::new("a/b.d.ts")), Dialect::TypeScript);
        assert_eq!(Dialect::for_path(Path::new("a/view.tsx")), Dialect::Tsx);
    }
}
