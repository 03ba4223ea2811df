//! JSON renderer: structured output for tooling integration.
//!
//! Serializes a nested view of the subtree rather than the arena itself, so
//! consumers see children in place instead of index lists.

use crate::error::Result;
use crate::model::{AccessLevel, DocComment, EntityId, EntityKind, SourceRange};
use crate::render::Renderer;
use crate::tree::EntityTree;
use serde::Serialize;

pub struct JsonRenderer;

#[derive(Serialize)]
struct FileView<'t> {
    path: &'t str,
    entities: Vec<EntityView<'t>>,
}

#[derive(Serialize)]
struct EntityView<'t> {
    kind: EntityKind,
    name: &'t str,
    path: &'t str,
    signature: String,
    #[serde(skip_serializing_if = "is_unspecified")]
    access: AccessLevel,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    modifiers: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<&'t DocComment>,
    range: SourceRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<EntityView<'t>>,
}

fn is_unspecified(access: &AccessLevel) -> bool {
    *access == AccessLevel::Unspecified
}

fn view(tree: &EntityTree, id: EntityId) -> EntityView<'_> {
    let entity = tree.get(id);
    EntityView {
        kind: entity.kind,
        name: &entity.name,
        path: &entity.qualified_path,
        signature: entity.one_line_signature(),
        access: entity.access,
        modifiers: entity.modifiers.names(),
        documentation: entity.documentation.as_ref(),
        range: entity.range,
        children: entity.children.iter().map(|&c| view(tree, c)).collect(),
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, tree: &EntityTree, id: EntityId) -> Result<String> {
        let json = if id == tree.root() {
            serde_json::to_string_pretty(&FileView {
                path: &tree.path,
                entities: tree.children(id).iter().map(|&c| view(tree, c)).collect(),
            })?
        } else {
            serde_json::to_string_pretty(&view(tree, id))?
        };
        Ok(json)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
