//! Short line-oriented description of one entity.

use crate::model::{AccessLevel, EntityId};
use crate::tree::EntityTree;

/// Kind, names, signature and documentation state, one fact per line.
pub fn entity_summary(tree: &EntityTree, id: EntityId) -> String {
    let entity = tree.get(id);
    let mut out = String::new();
    out.push_str(&format!("Kind: {}\n", entity.kind));
    out.push_str(&format!("Name: {}\n", entity.name));
    out.push_str(&format!("Path: {}\n", entity.qualified_path));
    out.push_str(&format!("Signature: {}\n", entity.one_line_signature()));
    if entity.access != AccessLevel::Unspecified {
        out.push_str(&format!("Access: {}\n", entity.access));
    }
    let modifiers = entity.modifiers.names();
    if !modifiers.is_empty() {
        out.push_str(&format!("Modifiers: {}\n", modifiers.join(", ")));
    }
    match tree.documentation(id) {
        Some(doc) if !doc.brief.is_empty() => {
            out.push_str(&format!("Documentation: {}\n", doc.brief))
        }
        Some(_) => out.push_str("Documentation: yes\n"),
        None => out.push_str("Documentation: none\n"),
    }
    if !entity.children.is_empty() {
        out.push_str(&format!("Children: {}\n", entity.children.len()));
    }
    out
}
