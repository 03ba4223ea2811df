//! Arena-backed entity tree and its queries.
//!
//! Nodes live in a flat vector and refer to each other by [`EntityId`]. The
//! root is always `EntityId(0)`. Documentation replacement is the only
//! mutation offered to callers.

use crate::comment::{is_member_doc, parse_documentation_comment, reindent};
use crate::config::FilterConfig;
use crate::error::{Error, Result};
use crate::model::{DocComment, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTree {
    /// Label for the tree; never read from disk
    pub path: String,
    /// The text the tree was built from
    pub source: String,
    nodes: Vec<Entity>,
}

impl EntityTree {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            nodes: vec![Entity::new(EntityKind::Root, "")],
        }
    }

    pub fn root(&self) -> EntityId {
        EntityId(0)
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.nodes[id.0]
    }

    /// Number of entities reachable from the root, root excluded.
    pub fn len(&self) -> usize {
        self.preorder(self.root()).len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.get(self.root()).children.is_empty()
    }

    /// Store `entity` and link it as the last child of `parent`.
    ///
    /// The qualified path is derived from the parent; unnamed entities
    /// inherit the parent's path unchanged.
    pub(crate) fn push(&mut self, parent: EntityId, mut entity: Entity) -> EntityId {
        entity.qualified_path = self.child_path(parent, &entity.name);
        entity.parent = Some(parent);
        let id = EntityId(self.nodes.len());
        self.nodes.push(entity);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Qualified path a child named `name` of `parent` would get.
    pub(crate) fn child_path(&self, parent: EntityId, name: &str) -> String {
        let parent_path = &self.nodes[parent.0].qualified_path;
        if name.is_empty() {
            parent_path.clone()
        } else if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", parent_path, name)
        }
    }

    /// Unlink the last child of `parent`, returning it.
    pub(crate) fn pop_child(&mut self, parent: EntityId) -> Option<EntityId> {
        let id = self.nodes[parent.0].children.pop()?;
        self.nodes[id.0].parent = None;
        Some(id)
    }

    pub fn children(&self, id: EntityId) -> &[EntityId] {
        &self.get(id).children
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.get(id).parent
    }

    /// Ancestors from the nearest parent up to and including the root.
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// Other children of the same parent, in source order.
    pub fn siblings(&self, id: EntityId) -> Vec<EntityId> {
        match self.parent(id) {
            Some(p) => self.children(p).iter().copied().filter(|&c| c != id).collect(),
            None => Vec::new(),
        }
    }

    /// Nesting depth; children of the root are at depth 0.
    pub fn depth(&self, id: EntityId) -> usize {
        self.ancestors(id).len().saturating_sub(1)
    }

    /// `start` and all its descendants in pre-order.
    pub fn preorder(&self, start: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Every non-root entity in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.preorder(self.root())
            .into_iter()
            .skip(1)
            .map(move |id| (id, self.get(id)))
    }

    /// First entity, in pre-order, whose qualified path equals `path`.
    pub fn find_by_path(&self, path: &str) -> Result<EntityId> {
        self.iter()
            .find(|(_, e)| e.qualified_path == path)
            .map(|(id, _)| id)
            .ok_or_else(|| Error::EntityNotFound(path.to_string()))
    }

    pub fn find_by_name(&self, name: &str) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| e.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Pre-order listing. `true` lists every entity, `false` only the
    /// documented ones.
    pub fn list_entities(&self, include_undocumented: bool) -> Vec<EntityId> {
        self.iter()
            .filter(|(id, _)| include_undocumented || self.is_documented(*id))
            .map(|(id, _)| id)
            .collect()
    }

    /// Documented when a record is attached, when a trailing member comment
    /// (`///<`) follows it on the same line, or when a documentation block
    /// sits directly above the entity in the source, allowing blank lines and
    /// the default intervening keywords in between.
    pub fn is_documented(&self, id: EntityId) -> bool {
        self.is_documented_with(id, &FilterConfig::default())
    }

    pub fn is_documented_with(&self, id: EntityId, filter: &FilterConfig) -> bool {
        let entity = self.get(id);
        if self.documentation(id).is_some() {
            return true;
        }
        if entity.kind == EntityKind::Root || entity.is_synthetic {
            return false;
        }
        is_member_doc(&entity.trailing_whitespace)
            || preceded_by_doc_block(&self.source, entity.range.start.offset, filter)
    }

    /// The entity's own record, or the one left on its forward declaration.
    pub fn documentation(&self, id: EntityId) -> Option<&DocComment> {
        let entity = self.get(id);
        entity.documentation.as_ref().or_else(|| {
            entity
                .forward_declaration
                .and_then(|stub| self.get(stub).documentation.as_ref())
        })
    }

    /// The first structural block that carries `@file`.
    pub fn file_documentation(&self) -> Option<DocComment> {
        self.entities_of_kind(EntityKind::RawComment)
            .into_iter()
            .filter_map(|id| parse_documentation_comment(&self.get(id).signature_text))
            .find(DocComment::declares_file)
    }

    /// Whitespace that starts the entity's first source line.
    pub fn indentation_of(&self, id: EntityId) -> String {
        let mut target = id;
        // synthetic namespaces have no text; use their first real descendant
        while self.get(target).is_synthetic {
            match self.children(target).first() {
                Some(&child) => target = child,
                None => return String::new(),
            }
        }
        let offset = self.get(target).range.start.offset.min(self.source.len());
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        self.source[line_start..offset]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect()
    }

    /// Swap in a new documentation record for `id`.
    ///
    /// The record's text is re-indented to the entity's own indentation (or
    /// rendered canonically when it has no text). An entity that had no
    /// documentation gets the block on its own line above the signature,
    /// or inline when the signature shares its line with earlier code.
    pub fn replace_documentation(&mut self, id: EntityId, mut doc: DocComment) {
        let indent = self.indentation_of(id);
        doc.raw_text = if doc.raw_text.trim().is_empty() {
            doc.to_block(&indent)
        } else {
            reindent(&doc.raw_text, &indent)
        };

        let offset = self.get(id).range.start.offset.min(self.source.len());
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let own_line = self.source[line_start..offset].trim().is_empty()
            || self.get(id).documentation.is_some();

        let entity = self.get_mut(id);
        if entity.documentation.is_none() {
            entity.doc_gap = if own_line {
                format!("\n{}", indent)
            } else {
                " ".to_string()
            };
        }
        debug!(path = %entity.qualified_path, "documentation replaced");
        entity.documentation = Some(doc);
    }
}

/// Scan backwards from `offset` over whitespace and intervening keywords
/// (plus `template <...>` lists and `[[...]]` attributes) for a doc block.
fn preceded_by_doc_block(source: &str, offset: usize, filter: &FilterConfig) -> bool {
    let mut end = offset.min(source.len());
    loop {
        let before = source[..end].trim_end();
        end = before.len();
        if before.is_empty() {
            return false;
        }
        if before.ends_with("*/") {
            return match before.rfind("/*") {
                Some(start) => documents_next(&before[start..]),
                None => false,
            };
        }
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before[line_start..].trim_start();
        if line.starts_with("//") {
            return documents_next(line);
        }
        if before.ends_with(">") {
            match matching_open_angle(before) {
                Some(open) if before[..open].trim_end().ends_with("template") => {
                    end = open;
                    continue;
                }
                _ => return false,
            }
        }
        if before.ends_with("]]") {
            match before.rfind("[[") {
                Some(open) => {
                    end = open;
                    continue;
                }
                None => return false,
            }
        }
        let word_start = before
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(0, |(i, c)| i + c.len_utf8());
        if word_start < end && filter.is_intervening_keyword(&before[word_start..]) {
            end = word_start;
            continue;
        }
        return false;
    }
}

/// A doc block that belongs to what follows it: not a trailing member
/// comment (`///<`) and not a structural block.
fn documents_next(comment: &str) -> bool {
    !is_member_doc(comment)
        && parse_documentation_comment(comment).is_some_and(|doc| !doc.is_structural())
}

fn matching_open_angle(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices().rev() {
        match ch {
            '>' => depth += 1,
            '<' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntityTree {
        let mut tree = EntityTree::new("t.hpp", "");
        let ns = tree.push(tree.root(), Entity::new(EntityKind::Namespace, "app"));
        let class = tree.push(ns, Entity::new(EntityKind::Class, "Widget"));
        tree.push(class, Entity::new(EntityKind::Method, "draw"));
        tree.push(class, Entity::new(EntityKind::Field, "size_"));
        tree.push(ns, Entity::new(EntityKind::Namespace, ""));
        tree
    }

    #[test]
    fn qualified_paths_follow_parents() {
        let tree = sample();
        let draw = tree.find_by_path("app::Widget::draw").unwrap();
        assert_eq!(tree.get(draw).name, "draw");
        let anon = tree.entities_of_kind(EntityKind::Namespace)[1];
        assert_eq!(tree.get(anon).qualified_path, "app");
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = sample().find_by_path("app::Nope").unwrap_err();
        assert!(matches!(err, Error::EntityNotFound(p) if p == "app::Nope"));
    }

    #[test]
    fn navigation() {
        let tree = sample();
        let draw = tree.find_by_path("app::Widget::draw").unwrap();
        let size = tree.find_by_path("app::Widget::size_").unwrap();
        assert_eq!(tree.siblings(draw), vec![size]);
        assert_eq!(tree.ancestors(draw).len(), 3);
        assert_eq!(tree.depth(draw), 2);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.find_by_name("Widget").len(), 1);
    }

    #[test]
    fn preorder_is_source_order() {
        let tree = sample();
        let names: Vec<&str> = tree.iter().map(|(_, e)| e.name.as_str()).collect();
        assert_eq!(names, vec!["app", "Widget", "draw", "size_", ""]);
    }

    #[test]
    fn listing_everything_follows_preorder() {
        let tree = sample();
        let all = tree.list_entities(true);
        let expected: Vec<EntityId> = tree.iter().map(|(id, _)| id).collect();
        assert_eq!(all, expected);
        assert!(!all.contains(&tree.root()));
        assert!(tree.list_entities(false).is_empty());
    }

    #[test]
    fn listing_documented_entities() {
        let src = "/** @brief A */\nstruct A {\n    int x; ///< x\n    int y;\n};\n\
                   /** @brief f */\ntemplate <typename T>\nvoid f();\nvoid g();\n";
        let tree = crate::parser::parse("l.hpp", src).tree;
        let paths: Vec<&str> = tree
            .list_entities(false)
            .into_iter()
            .map(|id| tree.get(id).qualified_path.as_str())
            .collect();
        assert_eq!(paths, vec!["A", "A::x", "f"]);
        assert_eq!(tree.list_entities(true).len(), tree.len());
    }

    #[test]
    fn backward_scan_skips_keywords_and_templates() {
        let filter = FilterConfig::default();
        let src = "/** @brief f */\ntemplate <typename T>\ninline void f();";
        let at = src.find("void").unwrap();
        assert!(preceded_by_doc_block(src, at, &filter));
        let plain = "/* plain */\nint x;";
        assert!(!preceded_by_doc_block(plain, plain.find("int").unwrap(), &filter));
        let lines = "/// one\n/// two\n\nint y;";
        assert!(preceded_by_doc_block(lines, lines.find("int").unwrap(), &filter));
        let code = "int a;\nint b;";
        assert!(!preceded_by_doc_block(code, code.find("int b").unwrap(), &filter));
    }

    #[test]
    fn member_and_structural_blocks_document_nothing_below() {
        let filter = FilterConfig::default();
        let member = "int a; /**< first */
int b;";
        assert!(!preceded_by_doc_block(member, member.find("int b").unwrap(), &filter));
        let file = "/** @file x.hpp */
int c;";
        assert!(!preceded_by_doc_block(file, file.find("int c").unwrap(), &filter));
    }
}
