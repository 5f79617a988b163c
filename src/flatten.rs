use serde::Serialize;

use crate::schema::{SchemaTree, TypeKind};

/// One dotted configuration path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub path: String,
    pub is_leaf: bool,
    pub kind: Option<TypeKind>,
    pub detail: Option<String>,
}

/// Flatten a schema tree into dotted paths, each parent before its children
pub fn flatten(tree: &SchemaTree, prefix: &str) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    flatten_into(tree, prefix, &mut suggestions);
    suggestions
}

fn flatten_into(tree: &SchemaTree, prefix: &str, out: &mut Vec<Suggestion>) {
    for (key, entry) in tree {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        out.push(Suggestion {
            path: path.clone(),
            is_leaf: !entry.has_children(),
            kind: entry.kind,
            detail: entry.detail.clone(),
        });
        if let Some(children) = &entry.children {
            flatten_into(children, &path, out);
        }
    }
}
