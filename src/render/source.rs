//! Reconstruction: turn a tree, or one subtree, back into C++ text.
//!
//! [`Layout::Lossless`] concatenates the verbatim pieces every entity keeps,
//! so an unmodified tree reproduces its input byte for byte and a replaced
//! documentation block is the only region that changes.
//! [`Layout::Normalized`] lays the structure out from scratch: one indent
//! unit per nesting level, `} // namespace x` closers and the punctuation
//! each kind requires.

use super::Renderer;
use crate::comment::reindent;
use crate::config::FormatConfig;
use crate::error::Result;
use crate::model::{Entity, EntityId, EntityKind};
use crate::tree::EntityTree;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Lossless,
    Normalized,
}

pub struct SourceRenderer {
    layout: Layout,
    format: FormatConfig,
}

impl SourceRenderer {
    pub fn lossless() -> Self {
        Self {
            layout: Layout::Lossless,
            format: FormatConfig::default(),
        }
    }

    pub fn normalized(format: FormatConfig) -> Self {
        Self {
            layout: Layout::Normalized,
            format,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }
}

impl Renderer for SourceRenderer {
    fn render(&self, tree: &EntityTree, id: EntityId) -> Result<String> {
        Ok(match self.layout {
            Layout::Lossless => reconstruct(tree, id),
            Layout::Normalized => normalize(tree, id, &self.format),
        })
    }

    fn file_extension(&self) -> &str {
        "hpp"
    }
}

// -- Lossless -----------------------------------------------------------------

/// Verbatim text of `id` and its subtree. For the root this is the file.
pub fn reconstruct(tree: &EntityTree, id: EntityId) -> String {
    let mut out = String::with_capacity(tree.source.len());
    emit(tree, id, &mut out);
    out
}

fn emit(tree: &EntityTree, id: EntityId, out: &mut String) {
    let entity = tree.get(id);
    out.push_str(&entity.leading_whitespace);
    if let Some(doc) = &entity.documentation {
        out.push_str(&doc.raw_text);
    }
    out.push_str(&entity.doc_gap);
    out.push_str(&entity.signature_text);
    out.push_str(&entity.opening);
    if let Some(body) = &entity.body {
        out.push_str(body);
    }
    for &child in &entity.children {
        emit(tree, child, out);
    }
    out.push_str(&entity.closing);
    out.push_str(&entity.trailing_whitespace);
}

// -- Normalized ---------------------------------------------------------------

/// Re-laid-out text of `id` and its subtree, starting at depth 0.
pub fn normalize(tree: &EntityTree, id: EntityId, format: &FormatConfig) -> String {
    let mut writer = Normalizer {
        tree,
        format,
        out: String::new(),
    };
    if id == tree.root() {
        writer.children(id, 0);
        writer.comments(&tree.get(id).closing, 0);
    } else {
        writer.entity(id, 0, true, None);
    }
    writer.out
}

struct Normalizer<'t> {
    tree: &'t EntityTree,
    format: &'t FormatConfig,
    out: String,
}

impl Normalizer<'_> {
    fn children(&mut self, id: EntityId, depth: usize) {
        let mut previous = None;
        for &child in self.tree.children(id) {
            self.entity(child, depth, previous.is_none(), previous);
            previous = Some(child);
        }
    }

    /// Write relative `lines` at `depth`, appending `suffix` to the last one.
    fn block(&mut self, depth: usize, lines: &[String], suffix: &str) {
        let indent = self.format.indent(depth);
        if lines.is_empty() {
            if !suffix.trim().is_empty() {
                self.out.push_str(&indent);
                self.out.push_str(suffix.trim_start());
                self.out.push('\n');
            }
            return;
        }
        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            if !line.is_empty() {
                self.out.push_str(&indent);
                self.out.push_str(line);
            }
            if i == last {
                self.out.push_str(suffix);
            }
            self.out.push('\n');
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        self.block(depth, &[text.to_string()], "");
    }

    /// Plain comments kept in whitespace pieces, one per line.
    fn comments(&mut self, text: &str, depth: usize) {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.starts_with('*') {
                self.line(depth, &format!(" {}", line));
            } else {
                self.line(depth, line);
            }
        }
    }

    fn entity(&mut self, id: EntityId, depth: usize, first: bool, previous: Option<EntityId>) {
        let tree = self.tree;
        let entity = tree.get(id);

        if entity.is_synthetic {
            self.line(depth, &format!("namespace {} {{", entity.name));
            self.children(id, depth + 1);
            self.line(depth, &format!("}} // namespace {}", entity.name));
            return;
        }

        if !first && blank_line_before(entity, previous.map(|p| tree.get(p))) {
            self.out.push('\n');
        }
        self.comments(&entity.leading_whitespace, depth);
        if let Some(doc) = &entity.documentation {
            let indent = self.format.indent(depth);
            let text = if doc.raw_text.trim().is_empty() {
                doc.to_block(&indent)
            } else {
                reindent(doc.raw_text.trim(), &indent)
            };
            self.out.push_str(&indent);
            self.out.push_str(&text);
            self.out.push('\n');
        }
        self.comments(&entity.doc_gap, depth);

        let tail = trailing_comment(entity);
        let signature = signature_lines(&entity.signature_text);
        match entity.kind {
            EntityKind::PreprocessorLine => {
                self.out.push_str(entity.signature_text.trim_end());
                self.out.push_str(&tail);
                self.out.push('\n');
            }
            EntityKind::RawComment => {
                let indent = self.format.indent(depth);
                self.out.push_str(&indent);
                self.out.push_str(&reindent(entity.signature_text.trim(), &indent));
                self.out.push_str(&tail);
                self.out.push('\n');
            }
            EntityKind::AccessSpecifier => {
                let label = format!("{}:{}", entity.signature_text.trim(), tail);
                self.line(depth.saturating_sub(1), &label);
            }
            EntityKind::Namespace => self.namespace(id, depth, signature, &tail),
            kind if kind.is_record() || kind == EntityKind::Enum => {
                if entity.is_definition {
                    self.scope_head(depth, signature);
                    self.children(id, depth + 1);
                    let (inner, after) = split_closing(&entity.closing);
                    self.comments(inner, depth + 1);
                    let declarators = after.trim().trim_end_matches(';').trim();
                    let semicolon = kind != EntityKind::Enum || after.contains(';');
                    let mut close = String::from("}");
                    if !declarators.is_empty() {
                        close.push(' ');
                        close.push_str(declarators);
                    }
                    if semicolon {
                        close.push(';');
                    }
                    close.push_str(&tail);
                    self.line(depth, &close);
                } else {
                    self.block(depth, &signature, &format!(";{}", tail));
                }
            }
            EntityKind::Enumerator => {
                let comma = if entity.opening.contains(',') { "," } else { "" };
                self.block(depth, &signature, &format!("{}{}", comma, tail));
            }
            kind if kind.is_callable() || kind == EntityKind::Unknown => match &entity.body {
                Some(body) => {
                    let mut lines = signature;
                    let mut body = body_lines(body);
                    if !body.is_empty() {
                        let head = body.remove(0);
                        match lines.last_mut() {
                            Some(last) => {
                                last.push(' ');
                                last.push_str(&head);
                            }
                            None => lines.push(head),
                        }
                        lines.extend(body);
                    }
                    let suffix = format!("{}{}", entity.closing.trim(), tail);
                    self.block(depth, &lines, &suffix);
                }
                None if kind == EntityKind::Unknown => {
                    let suffix = format!("{}{}", entity.opening.trim(), tail);
                    self.block(depth, &signature, &suffix);
                }
                None => self.terminated(depth, signature, &tail),
            },
            _ => self.terminated(depth, signature, &tail),
        }
    }

    /// Declaration that must end in `;`.
    fn terminated(&mut self, depth: usize, signature: Vec<String>, tail: &str) {
        let ends = signature.last().is_some_and(|l| l.ends_with(';'));
        let suffix = if ends { tail.to_string() } else { format!(";{}", tail) };
        self.block(depth, &signature, &suffix);
    }

    fn scope_head(&mut self, depth: usize, mut signature: Vec<String>) {
        match signature.last_mut() {
            Some(last) if last.ends_with('{') => {}
            Some(last) => last.push_str(" {"),
            None => signature.push("{".to_string()),
        }
        self.block(depth, &signature, "");
    }

    fn namespace(&mut self, id: EntityId, depth: usize, signature: Vec<String>, tail: &str) {
        let tree = self.tree;
        let entity = tree.get(id);
        let nested = tree.parent(id).is_some_and(|p| tree.get(p).is_synthetic);
        let head = if nested {
            vec![format!("namespace {}", entity.name)]
        } else {
            signature
        };
        self.scope_head(depth, head);
        self.children(id, depth + 1);
        let (inner, _) = split_closing(&entity.closing);
        self.comments(inner, depth + 1);

        let linkage = entity.signature_text.trim_start().starts_with("extern");
        let marker = if linkage {
            "}".to_string()
        } else if entity.name.is_empty() {
            "} // namespace".to_string()
        } else {
            format!("}} // namespace {}", entity.name)
        };
        let duplicate = tail.trim() == marker.trim_start_matches('}').trim();
        let close = if duplicate { marker } else { format!("{}{}", marker, tail) };
        self.line(depth, &close);
    }
}

fn signature_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Body text as relative lines: the first trimmed, the rest dedented by
/// their common indentation.
fn body_lines(body: &str) -> Vec<String> {
    let mut lines = body.trim().lines();
    let Some(first) = lines.next() else { return Vec::new() };
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = vec![first.trim_end().to_string()];
    out.extend(rest.iter().map(|l| {
        if l.trim().is_empty() {
            String::new()
        } else {
            l.get(common..).unwrap_or_else(|| l.trim_start()).trim_end().to_string()
        }
    }));
    out
}

/// Text before and after the scope's own `}`.
fn split_closing(closing: &str) -> (&str, &str) {
    match closing.rfind('}') {
        Some(i) => (&closing[..i], &closing[i + 1..]),
        None => (closing, ""),
    }
}

/// Same-line comment after the entity, with a separating space.
fn trailing_comment(entity: &Entity) -> String {
    let comment = entity.trailing_whitespace.trim();
    if comment.is_empty() {
        String::new()
    } else {
        format!(" {}", comment)
    }
}

/// A blank source line separated this entity from the previous sibling.
fn blank_line_before(entity: &Entity, previous: Option<&Entity>) -> bool {
    let ws_end = entity
        .leading_whitespace
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(entity.leading_whitespace.len());
    let mut newlines = entity.leading_whitespace[..ws_end].matches('\n').count();
    if let Some(prev) = previous {
        newlines += prev.trailing_whitespace.matches('\n').count();
    }
    newlines >= 2
}
