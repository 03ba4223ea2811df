//! Entity builder: one pass over the scanner's spans.
//!
//! State is a scope stack (each frame carries its access level), a single
//! pending-documentation slot, and an index of type paths used to merge
//! forward declarations with their definitions. Every byte of the input is
//! assigned to exactly one entity text piece; `unassigned` marks the first
//! byte not yet owned.

use super::rules::{recognize, Recognized, RuleInput};
use super::statement::{matching_brace, segment, Mode, Statement, Terminator};
use crate::comment::{is_doc_comment, is_member_doc, parse_documentation_comment};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::model::{AccessLevel, DocComment, Entity, EntityId, EntityKind, Position, SourceRange};
use crate::scanner::{Span, SpanKind};
use crate::tree::EntityTree;
use std::collections::{HashMap, HashSet};
use tracing::{trace, warn};

struct Frame {
    id: EntityId,
    kind: EntityKind,
    /// Unqualified record name, for constructor detection
    name: String,
    access: AccessLevel,
    /// Intermediate namespace from `namespace A::B`; closes with its child
    synthetic: bool,
}

struct PendingDoc {
    start: Position,
    end: Position,
    doc: DocComment,
}

/// Words that cannot appear in a declarator list after a record's `}`.
const NOT_DECLARATOR: &[&str] = &[
    "class", "struct", "union", "enum", "namespace", "template", "typedef", "using", "public",
    "protected", "private", "int", "void", "char", "bool", "float", "double", "long", "short",
    "unsigned", "signed", "auto", "static", "inline", "virtual", "extern", "friend", "constexpr",
];

pub(crate) struct Builder<'a> {
    source: &'a str,
    spans: Vec<Span<'a>>,
    pos: usize,
    unassigned: usize,
    tree: EntityTree,
    frames: Vec<Frame>,
    pending: Option<PendingDoc>,
    types: HashMap<String, EntityId>,
    macros: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

/// Build the entity tree for `source` from its spans.
pub(crate) fn build<'a>(
    path: &str,
    source: &'a str,
    spans: Vec<Span<'a>>,
) -> (EntityTree, Vec<Diagnostic>) {
    let tree = EntityTree::new(path, source);
    let root = tree.root();
    let mut builder = Builder {
        source,
        spans,
        pos: 0,
        unassigned: 0,
        tree,
        frames: vec![Frame {
            id: root,
            kind: EntityKind::Root,
            name: String::new(),
            access: AccessLevel::Unspecified,
            synthetic: false,
        }],
        pending: None,
        types: HashMap::new(),
        macros: HashSet::new(),
        diagnostics: Vec::new(),
    };
    builder.run();
    (builder.tree, builder.diagnostics)
}

impl<'a> Builder<'a> {
    fn run(&mut self) {
        while self.pos < self.spans.len() {
            self.skip_trivia();
            let Some(span) = self.spans.get(self.pos).copied() else { break };
            if span.is_punct('}') {
                self.close_scope(span);
            } else if span.kind == SpanKind::Preprocessor {
                self.directive(span);
            } else {
                let mode = if self.frame().kind == EntityKind::Enum {
                    Mode::Enumerator
                } else {
                    Mode::Declaration
                };
                let statement = segment(&self.spans, self.pos, mode);
                self.statement(statement);
            }
        }
        self.finish();
    }

    fn frame(&self) -> &Frame {
        // the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn eof_position(&self) -> Position {
        self.spans
            .last()
            .map(|s| s.range.end)
            .unwrap_or_else(|| Position::new(1, 1, 0))
    }

    fn report(&mut self, kind: DiagnosticKind, range: SourceRange, message: String) {
        warn!(line = range.start.line, column = range.start.column, ?kind, "{}", message);
        self.diagnostics.push(Diagnostic::new(kind, range, message));
    }

    // -- Trivia and documentation ---------------------------------------------

    fn skip_trivia(&mut self) {
        while let Some(span) = self.spans.get(self.pos).copied() {
            if !span.is_trivia() {
                break;
            }
            if span.is_comment() && is_doc_comment(span.text) {
                let (last, end) = self.doc_run(self.pos);
                self.doc_comment(span.range.start, end);
                self.pos = last + 1;
            } else {
                self.pos += 1;
            }
        }
    }

    /// Consecutive `///` (or `//!`) lines form one block.
    fn doc_run(&self, first: usize) -> (usize, Position) {
        let span = self.spans[first];
        if span.kind != SpanKind::LineComment {
            return (first, span.range.end);
        }
        let marker = &span.text[..3];
        let mut last = first;
        while let (Some(ws), Some(next)) = (self.spans.get(last + 1), self.spans.get(last + 2)) {
            let continues = ws.kind == SpanKind::Whitespace
                && ws.newlines() == 1
                && next.kind == SpanKind::LineComment
                && next.text.starts_with(marker)
                && is_doc_comment(next.text)
                && !is_member_doc(next.text);
            if !continues {
                break;
            }
            last += 2;
        }
        (last, self.spans[last].range.end)
    }

    fn doc_comment(&mut self, start: Position, end: Position) {
        let raw = &self.source[start.offset..end.offset];
        let Some(mut doc) = parse_documentation_comment(raw) else { return };
        self.flush_pending();
        if doc.is_structural() {
            self.raw_comment(start, end);
            return;
        }
        doc.range = Some(SourceRange::new(start, end));
        self.pending = Some(PendingDoc { start, end, doc });
    }

    /// A documentation block nobody claimed stays in the tree as text.
    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            trace!(line = pending.start.line, "unattached documentation block");
            self.raw_comment(pending.start, pending.end);
        }
    }

    fn raw_comment(&mut self, start: Position, end: Position) {
        let mut entity = Entity::new(EntityKind::RawComment, "");
        entity.leading_whitespace = self.source[self.unassigned..start.offset].to_string();
        entity.signature_text = self.source[start.offset..end.offset].to_string();
        entity.range = SourceRange::new(start, end);
        self.unassigned = end.offset;
        self.add(entity);
    }

    /// Start an entity whose signature begins at `sig_start`, claiming the
    /// pending documentation when the kind can carry it.
    fn begin(&mut self, sig_start: usize, documentable: bool) -> Entity {
        if !documentable {
            self.flush_pending();
        }
        let mut entity = Entity::default();
        match self.pending.take() {
            Some(pending) => {
                entity.leading_whitespace =
                    self.source[self.unassigned..pending.start.offset].to_string();
                entity.doc_gap = self.source[pending.end.offset..sig_start].to_string();
                entity.documentation = Some(pending.doc);
            }
            None => {
                entity.leading_whitespace = self.source[self.unassigned..sig_start].to_string();
            }
        }
        entity
    }

    fn add(&mut self, mut entity: Entity) -> EntityId {
        let frame = self.frame();
        let parent = frame.id;
        if entity.kind != EntityKind::AccessSpecifier {
            entity.access = frame.access;
        }
        trace!(kind = %entity.kind, name = %entity.name, line = entity.range.start.line, "entity");
        self.tree.push(parent, entity)
    }

    /// Claim same-line spaces and one comment through the line break.
    fn trailing(&mut self, id: EntityId) {
        let mut i = self.pos;
        let mut saw_comment = false;
        loop {
            match self.spans.get(i) {
                None => {
                    self.commit_trailing(id, self.source.len(), i);
                    return;
                }
                Some(s) if s.kind == SpanKind::Whitespace => {
                    if let Some(nl) = s.text.find('\n') {
                        let end = s.range.start.offset + nl + 1;
                        self.commit_trailing(id, end, i);
                        return;
                    }
                    i += 1;
                }
                Some(s)
                    if !saw_comment
                        && s.is_comment()
                        && !s.text.contains('\n')
                        && (!is_doc_comment(s.text) || is_member_doc(s.text)) =>
                {
                    saw_comment = true;
                    i += 1;
                }
                Some(_) => return,
            }
        }
    }

    fn commit_trailing(&mut self, id: EntityId, end: usize, pos: usize) {
        self.tree.get_mut(id).trailing_whitespace = self.source[self.unassigned..end].to_string();
        self.unassigned = end;
        self.pos = pos;
    }

    // -- Constructs -----------------------------------------------------------

    fn directive(&mut self, span: Span<'a>) {
        let tokens = [span];
        let frame = self.frame();
        let found = recognize(&RuleInput {
            tokens: &tokens,
            has_body: false,
            scope: frame.kind,
            scope_name: &frame.name,
            macros: &self.macros,
        });
        if found.macro_body.as_deref() == Some("") {
            self.macros.insert(found.name.clone());
        }
        let mut entity = self.begin(span.range.start.offset, false);
        entity.kind = EntityKind::PreprocessorLine;
        entity.name = found.name;
        entity.signature_text = span.text.to_string();
        entity.range = span.range;
        self.unassigned = span.range.end.offset;
        self.pos += 1;
        let id = self.add(entity);
        self.trailing(id);
    }

    fn statement(&mut self, st: Statement) {
        let first = self.spans[st.first];
        let sig_start = first.range.start;
        let sig_end = match st.last {
            Some(last) => self.spans[last].range.end,
            None => sig_start,
        };
        let tokens: Vec<Span<'a>> = match st.last {
            Some(last) => self.spans[st.first..=last]
                .iter()
                .filter(|s| !s.is_trivia() && s.kind != SpanKind::Preprocessor)
                .copied()
                .collect(),
            None => Vec::new(),
        };
        let typedef_head = tokens.first().is_some_and(|t| t.is_word("typedef"));

        let frame = self.frame();
        let found = if frame.kind == EntityKind::Enum {
            match tokens.first() {
                Some(t) if t.kind == SpanKind::Word => Recognized {
                    kind: EntityKind::Enumerator,
                    name: t.text.to_string(),
                    ..Default::default()
                },
                _ => Recognized::default(),
            }
        } else {
            recognize(&RuleInput {
                tokens: &tokens,
                has_body: st.terminator == Terminator::OpenBrace,
                scope: frame.kind,
                scope_name: &frame.name,
                macros: &self.macros,
            })
        };

        let piece = Piece {
            st,
            sig_start,
            sig_end,
        };
        match st.terminator {
            Terminator::OpenBrace if found.kind.is_scope() => {
                self.open_scope(piece, found, typedef_head)
            }
            Terminator::OpenBrace => self.body_entity(piece, found),
            _ => self.leaf(piece, found),
        }
    }

    fn text(&self, from: Position, to: Position) -> String {
        self.source[from.offset..to.offset].to_string()
    }

    fn is_type(kind: EntityKind) -> bool {
        kind.is_record() || kind == EntityKind::Enum
    }

    fn leaf(&mut self, piece: Piece, found: Recognized) {
        let st = piece.st;
        let term_end = match st.terminator {
            Terminator::Semicolon | Terminator::Comma | Terminator::AccessLabel => {
                self.spans[st.term].range.end
            }
            _ => piece.sig_end,
        };

        let mut kind = found.kind;
        let mut name = found.name;
        let mut type_path = None;
        if Self::is_type(kind) && !name.is_empty() {
            let path = self.tree.child_path(self.frame().id, &name);
            if self.types.contains_key(&path) {
                // repeated forward declaration: keep the text, drop the name
                trace!(%path, "repeated declaration");
                kind = EntityKind::Unknown;
                name = String::new();
            } else {
                type_path = Some(path);
            }
        }

        if let Some(level) = found.access {
            if let Some(frame) = self.frames.last_mut() {
                frame.access = level;
            }
        }

        let mut entity = self.begin(piece.sig_start.offset, kind.is_documentable());
        entity.kind = kind;
        entity.name = name;
        entity.modifiers = found.modifiers;
        entity.access = found.access.unwrap_or_default();
        entity.signature_text = self.text(piece.sig_start, piece.sig_end);
        entity.opening = self.text(piece.sig_end, term_end);
        entity.range = SourceRange::new(piece.sig_start, term_end);
        self.unassigned = term_end.offset;
        self.pos = match (st.terminator, st.last) {
            (Terminator::CloseBrace | Terminator::Interrupted | Terminator::Eof, Some(last)) => {
                last + 1
            }
            _ => st.resume_at(),
        };
        let id = self.add(entity);
        if let Some(path) = type_path {
            self.types.insert(path, id);
        }
        self.trailing(id);
    }

    /// Function definition or other braced statement kept verbatim.
    fn body_entity(&mut self, piece: Piece, found: Recognized) {
        let open = piece.st.term;
        let (mut next, body_end) = match matching_brace(&self.spans, open) {
            Some(close) => (close + 1, self.spans[close].range.end),
            None => {
                let range = self.spans[open].range;
                self.report(
                    DiagnosticKind::UnclosedScope,
                    range,
                    format!("body of `{}` is not closed before end of file", found.name),
                );
                (self.spans.len(), self.eof_position())
            }
        };

        // `void f() {};`
        let mut end = body_end;
        match (self.spans.get(next), self.spans.get(next + 1)) {
            (Some(s), _) if s.is_punct(';') => {
                end = s.range.end;
                next += 1;
            }
            (Some(ws), Some(s))
                if ws.kind == SpanKind::Whitespace
                    && !ws.text.contains('\n')
                    && s.is_punct(';') =>
            {
                end = s.range.end;
                next += 2;
            }
            _ => {}
        }

        let mut entity = self.begin(piece.sig_start.offset, found.kind.is_documentable());
        entity.kind = found.kind;
        entity.name = found.name;
        entity.modifiers = found.modifiers;
        entity.signature_text = self.text(piece.sig_start, piece.sig_end);
        entity.body = Some(self.text(piece.sig_end, body_end));
        entity.closing = self.text(body_end, end);
        entity.is_definition = true;
        entity.range = SourceRange::new(piece.sig_start, end);
        self.unassigned = end.offset;
        self.pos = next;
        let id = self.add(entity);
        self.trailing(id);
    }

    fn open_scope(&mut self, piece: Piece, found: Recognized, typedef_head: bool) {
        let brace = self.spans[piece.st.term];
        let kind = found.kind;
        let mut name = found.name;

        if name.is_empty() && typedef_head {
            if let Some(close) = matching_brace(&self.spans, piece.st.term) {
                if let Some((_, _, Some(declarator))) = self.declarators(close + 1) {
                    name = declarator;
                }
            }
        }

        if kind == EntityKind::Namespace && name.contains("::") {
            let parts: Vec<String> =
                name.split("::").filter(|p| !p.is_empty()).map(String::from).collect();
            if let Some((last, outer)) = parts.split_last() {
                for part in outer {
                    let mut synthetic = Entity::new(EntityKind::Namespace, part.clone());
                    synthetic.is_synthetic = true;
                    synthetic.range = SourceRange::new(piece.sig_start, piece.sig_start);
                    let id = self.add(synthetic);
                    self.frames.push(Frame {
                        id,
                        kind: EntityKind::Namespace,
                        name: part.clone(),
                        access: AccessLevel::Unspecified,
                        synthetic: true,
                    });
                }
                name = last.clone();
            }
        }

        let mut absorbed = None;
        let mut forward = None;
        let mut duplicate = false;
        let mut type_path = None;
        if Self::is_type(kind) && !name.is_empty() {
            let parent = self.frame().id;
            let path = self.tree.child_path(parent, &name);
            match self.types.get(&path).copied() {
                Some(prev) if !self.tree.get(prev).is_definition => {
                    if self.tree.children(parent).last() == Some(&prev) {
                        // adjacent stub: the definition takes its slot
                        self.tree.pop_child(parent);
                        absorbed = Some(self.tree.get(prev).clone());
                    } else {
                        self.demote(prev);
                        forward = Some(prev);
                    }
                    type_path = Some(path);
                }
                Some(_) => {
                    // another preprocessor branch: one definition per path
                    trace!(%path, "duplicate definition kept as text");
                    duplicate = true;
                }
                None => type_path = Some(path),
            }
        }

        let mut entity = self.begin(piece.sig_start.offset, !duplicate);
        if let Some(stub) = absorbed {
            absorb(&mut entity, stub);
        }
        if duplicate {
            entity.kind = EntityKind::Unknown;
        } else {
            entity.kind = kind;
            entity.name = name.clone();
            entity.is_definition = true;
        }
        entity.forward_declaration = forward;
        entity.modifiers = found.modifiers;
        entity.signature_text = self.text(piece.sig_start, piece.sig_end);
        entity.opening = self.text(piece.sig_end, brace.range.end);
        entity.range = SourceRange::new(piece.sig_start, brace.range.end);
        self.unassigned = brace.range.end.offset;
        self.pos = piece.st.term + 1;
        let id = self.add(entity);
        if let Some(path) = type_path {
            self.types.insert(path, id);
        }

        let short = name.rsplit("::").next().unwrap_or_default().to_string();
        self.frames.push(Frame {
            id,
            kind,
            name: short,
            access: kind.default_member_access(),
            synthetic: false,
        });
    }

    /// Turn a superseded stub into an unnamed text holder.
    fn demote(&mut self, id: EntityId) {
        let parent = self.tree.parent(id).unwrap_or(self.tree.root());
        let path = self.tree.child_path(parent, "");
        let entity = self.tree.get_mut(id);
        trace!(name = %entity.name, "stub demoted");
        entity.kind = EntityKind::Unknown;
        entity.name.clear();
        entity.qualified_path = path;
    }

    /// `} a, *b;` after a record body. Returns the `;` index, its end, and
    /// the first declarator name.
    fn declarators(&self, from: usize) -> Option<(usize, Position, Option<String>)> {
        let mut first_name = None;
        for (i, s) in self.spans.iter().enumerate().skip(from) {
            if s.is_trivia() {
                continue;
            }
            if s.is_punct(';') {
                return Some((i, s.range.end, first_name));
            }
            let allowed = match s.kind {
                SpanKind::Word => !NOT_DECLARATOR.contains(&s.text),
                SpanKind::Punct => matches!(s.text, "*" | "&" | "," | "[" | "]"),
                _ => false,
            };
            if !allowed {
                return None;
            }
            if first_name.is_none()
                && s.kind == SpanKind::Word
                && !s.text.starts_with(|c: char| c.is_ascii_digit())
            {
                first_name = Some(s.text.to_string());
            }
        }
        None
    }

    fn close_scope(&mut self, brace: Span<'a>) {
        if self.frames.len() == 1 {
            self.report(
                DiagnosticKind::UnmatchedCloseBrace,
                brace.range,
                "`}` has no open scope to close".to_string(),
            );
            let mut entity = self.begin(brace.range.start.offset, false);
            entity.kind = EntityKind::Unknown;
            entity.signature_text = brace.text.to_string();
            entity.range = brace.range;
            self.unassigned = brace.range.end.offset;
            self.pos += 1;
            let id = self.add(entity);
            self.trailing(id);
            return;
        }

        self.flush_pending();
        let Some(frame) = self.frames.pop() else { return };
        let mut end = brace.range.end;
        let mut next = self.pos + 1;
        if Self::is_type(frame.kind) {
            if let Some((semi, semi_end, _)) = self.declarators(next) {
                end = semi_end;
                next = semi + 1;
            }
        }
        let closing = self.source[self.unassigned..end.offset].to_string();
        let entity = self.tree.get_mut(frame.id);
        entity.closing = closing;
        entity.range.end = end;
        self.unassigned = end.offset;
        self.pos = next;
        self.trailing(frame.id);

        let range = self.tree.get(frame.id).range;
        while self.frames.last().is_some_and(|f| f.synthetic) {
            if let Some(outer) = self.frames.pop() {
                self.tree.get_mut(outer.id).range = range;
            }
        }
    }

    fn finish(&mut self) {
        self.flush_pending();
        let eof = self.eof_position();
        while self.frames.len() > 1 {
            let Some(frame) = self.frames.pop() else { break };
            let entity = self.tree.get(frame.id);
            if !frame.synthetic {
                let label = if entity.name.is_empty() {
                    format!("anonymous {}", entity.kind)
                } else {
                    format!("{} `{}`", entity.kind, entity.name)
                };
                let range = SourceRange::new(entity.range.start, eof);
                self.report(
                    DiagnosticKind::UnclosedScope,
                    range,
                    format!("{} is not closed before end of file", label),
                );
            }
            self.tree.get_mut(frame.id).range.end = eof;
        }
        let root = self.tree.root();
        let tail = self.source[self.unassigned..].to_string();
        let entity = self.tree.get_mut(root);
        entity.closing = tail;
        entity.range = SourceRange::new(Position::new(1, 1, 0), eof);
        self.unassigned = self.source.len();
    }
}

/// Signature location of the statement being turned into an entity.
struct Piece {
    st: Statement,
    sig_start: Position,
    sig_end: Position,
}

/// Fold a forward declaration's text into the definition that replaces it.
///
/// A documented stub hands its record to an undocumented definition; the
/// stub's remaining text then sits between that block and the signature.
fn absorb(definition: &mut Entity, stub: Entity) {
    let mut rest = String::new();
    rest.push_str(&stub.signature_text);
    rest.push_str(&stub.opening);
    rest.push_str(&stub.closing);
    rest.push_str(&stub.trailing_whitespace);

    match stub.documentation {
        Some(doc) if definition.documentation.is_none() => {
            let mut gap = stub.doc_gap;
            gap.push_str(&rest);
            gap.push_str(&definition.leading_whitespace);
            definition.leading_whitespace = stub.leading_whitespace;
            definition.doc_gap = gap;
            definition.documentation = Some(doc);
        }
        doc => {
            let mut text = stub.leading_whitespace;
            if let Some(doc) = doc {
                text.push_str(&doc.raw_text);
            }
            text.push_str(&stub.doc_gap);
            text.push_str(&rest);
            definition.leading_whitespace.insert_str(0, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use crate::render::source::reconstruct;

    fn build_str(src: &str) -> (EntityTree, Vec<Diagnostic>) {
        build("test.hpp", src, scan(src).spans)
    }

    fn kinds(tree: &EntityTree) -> Vec<(EntityKind, String)> {
        tree.iter().map(|(_, e)| (e.kind, e.qualified_path.clone())).collect()
    }

    #[test]
    fn access_levels_follow_labels() {
        let (tree, _) = build_str("class C { int a; public: int b; private: int c; };");
        let level = |p: &str| tree.get(tree.find_by_path(p).unwrap()).access;
        assert_eq!(level("C::a"), AccessLevel::Private);
        assert_eq!(level("C::b"), AccessLevel::Public);
        assert_eq!(level("C::c"), AccessLevel::Private);
    }

    #[test]
    fn struct_members_default_public() {
        let (tree, _) = build_str("struct S { int x; };");
        let x = tree.find_by_path("S::x").unwrap();
        assert_eq!(tree.get(x).access, AccessLevel::Public);
        assert_eq!(tree.get(x).kind, EntityKind::Field);
    }

    #[test]
    fn forward_declaration_merges_with_definition() {
        let (tree, _) = build_str("class Foo; class Foo { void m(); };");
        let foos = tree.find_by_name("Foo");
        assert_eq!(foos.len(), 1);
        let foo = tree.get(foos[0]);
        assert!(foo.is_definition);
        assert_eq!(foo.children.len(), 1);
        assert_eq!(tree.get(foo.children[0]).name, "m");
    }

    #[test]
    fn distant_stub_is_demoted() {
        let (tree, _) = build_str("class Foo;\nint x;\nclass Foo {};\n");
        assert_eq!(tree.find_by_name("Foo").len(), 1);
        assert_eq!(tree.entities_of_kind(EntityKind::Unknown).len(), 1);
    }

    #[test]
    fn distant_stub_lends_its_documentation() {
        let src = "/** @brief Fwd doc */\nclass Foo;\nvoid g();\nclass Foo {};\n";
        let (tree, _) = build_str(src);
        let foo = tree.find_by_path("Foo").unwrap();
        let stub = tree.get(foo).forward_declaration.unwrap();
        assert_eq!(tree.get(stub).kind, EntityKind::Unknown);
        assert!(tree.get(foo).documentation.is_none());
        assert!(tree.is_documented(foo));
        assert_eq!(tree.documentation(foo).map(|d| d.brief.as_str()), Some("Fwd doc"));
        assert_eq!(reconstruct(&tree, tree.root()), src);
    }

    #[test]
    fn definitions_in_both_branches_keep_one_node() {
        let src = "#ifdef WIDE\nstruct X { long v; };\n#else\nstruct X { int v; };\n#endif\n";
        let (tree, _) = build_str(src);
        let definitions: Vec<EntityId> = tree
            .iter()
            .filter(|(_, e)| e.qualified_path == "X" && e.is_definition)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(definitions.len(), 1);
        assert_eq!(tree.find_by_path("X::v").unwrap(), tree.children(definitions[0])[0]);

        let unknown = tree.entities_of_kind(EntityKind::Unknown);
        assert_eq!(unknown.len(), 1);
        assert_eq!(tree.get(unknown[0]).signature_text, "struct X");
        assert!(!tree.get(unknown[0]).is_definition);
        assert_eq!(reconstruct(&tree, tree.root()), src);
    }

    #[test]
    fn repeated_forward_declarations_collapse() {
        let (tree, _) = build_str("struct A;\nstruct A;\n");
        assert_eq!(tree.find_by_name("A").len(), 1);
    }

    #[test]
    fn compact_namespace_synthesizes_parents() {
        let (tree, _) = build_str("namespace A::B { void f(); }");
        assert_eq!(
            kinds(&tree),
            vec![
                (EntityKind::Namespace, "A".to_string()),
                (EntityKind::Namespace, "A::B".to_string()),
                (EntityKind::Function, "A::B::f".to_string()),
            ]
        );
        let a = tree.find_by_path("A").unwrap();
        assert!(tree.get(a).is_synthetic);
    }

    #[test]
    fn doc_attaches_across_template_prefix() {
        let (tree, _) = build_str("/** @brief F */\ntemplate <typename T> void f();\n");
        let f = tree.find_by_path("f").unwrap();
        assert_eq!(tree.get(f).documentation.as_ref().unwrap().brief, "F");
        assert!(tree.get(f).modifiers.is_template);
    }

    #[test]
    fn nearest_documentation_wins() {
        let (tree, _) = build_str("/** @brief banner */\n\n/** @brief real */\nclass X {};\n");
        let x = tree.get(tree.find_by_path("X").unwrap());
        assert_eq!(x.documentation.as_ref().unwrap().brief, "real");
        assert_eq!(tree.entities_of_kind(EntityKind::RawComment).len(), 1);
    }

    #[test]
    fn structural_blocks_are_not_attached() {
        let (tree, _) = build_str("/** @file a.hpp */\nint x;\n");
        let x = tree.get(tree.find_by_path("x").unwrap());
        assert!(x.documentation.is_none());
        assert!(tree.file_documentation().is_some());
    }

    #[test]
    fn line_comment_runs_merge() {
        let (tree, _) = build_str("/// first\n/// @return r\nint f();\n");
        let f = tree.get(tree.find_by_path("f").unwrap());
        let doc = f.documentation.as_ref().unwrap();
        assert_eq!(doc.brief, "first");
        assert_eq!(doc.returns, "r");
    }

    #[test]
    fn function_bodies_stay_verbatim() {
        let (tree, _) = build_str("struct S {\n  int get() const { return v; }\n  int v;\n};\n");
        let get = tree.get(tree.find_by_path("S::get").unwrap());
        assert_eq!(get.kind, EntityKind::Method);
        assert!(get.children.is_empty());
        assert_eq!(get.body.as_deref(), Some(" { return v; }"));
        assert!(tree.find_by_path("S::v").is_ok());
    }

    #[test]
    fn enumerators_are_children() {
        let (tree, _) = build_str("enum class Color { Red = 1, Green, Blue };");
        let names: Vec<String> = tree
            .entities_of_kind(EntityKind::Enumerator)
            .iter()
            .map(|&id| tree.get(id).qualified_path.clone())
            .collect();
        assert_eq!(names, vec!["Color::Red", "Color::Green", "Color::Blue"]);
    }

    #[test]
    fn typedef_struct_takes_declarator_name() {
        let (tree, _) = build_str("typedef struct {\n  int x;\n} Point;\n");
        let p = tree.find_by_path("Point").unwrap();
        assert_eq!(tree.get(p).kind, EntityKind::Struct);
        assert!(tree.find_by_path("Point::x").is_ok());
    }

    #[test]
    fn unmatched_close_brace_is_reported() {
        let (tree, diags) = build_str("int a;\n}\nint b;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnmatchedCloseBrace);
        assert!(tree.find_by_path("b").is_ok());
    }

    #[test]
    fn unclosed_scope_is_reported() {
        let (tree, diags) = build_str("namespace n {\nint a;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnclosedScope);
        assert!(tree.find_by_path("n::a").is_ok());
    }

    #[test]
    fn trailing_comment_stays_with_entity() {
        let (tree, _) = build_str("namespace n {\n} // namespace n\nint z;\n");
        let n = tree.get(tree.find_by_path("n").unwrap());
        assert_eq!(n.closing, "\n}");
        assert_eq!(n.trailing_whitespace, " // namespace n\n");
    }

    #[test]
    fn empty_macros_do_not_name_classes() {
        let (tree, _) = build_str("#define API\nclass API Widget {};\n");
        assert!(tree.find_by_path("Widget").is_ok());
        assert!(tree.find_by_path("API").is_ok());
        assert_eq!(tree.get(tree.find_by_path("API").unwrap()).kind, EntityKind::PreprocessorLine);
    }
}
