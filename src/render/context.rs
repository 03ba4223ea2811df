//! Bounded source context around one entity, sized for a prompt.

use super::source::reconstruct;
use crate::config::ContextConfig;
use crate::model::{AccessLevel, Entity, EntityId, EntityKind};
use crate::tree::EntityTree;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOptions {
    /// Show the enclosing entity's signature first
    pub include_parent: bool,
    /// Show the other members of the enclosing scope
    pub include_siblings: bool,
    /// Only the entity's own reconstructed text
    pub scope_only: bool,
    /// Outline namespaces and records instead of showing their full text
    pub summary: bool,
    /// Caller-supplied notes placed verbatim at the top
    pub project_context: Option<String>,
}

impl ContextOptions {
    pub fn with_parent(mut self) -> Self {
        self.include_parent = true;
        self
    }

    pub fn with_siblings(mut self) -> Self {
        self.include_siblings = true;
        self
    }

    pub fn scope_only(mut self) -> Self {
        self.scope_only = true;
        self
    }

    pub fn summarized(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn with_project_context(mut self, text: impl Into<String>) -> Self {
        self.project_context = Some(text.into());
        self
    }
}

/// Context text for `id`.
pub fn extract_context(
    tree: &EntityTree,
    id: EntityId,
    options: &ContextOptions,
    caps: &ContextConfig,
) -> String {
    let mut out = String::new();
    if let Some(project) = options.project_context.as_deref().filter(|p| !p.trim().is_empty()) {
        out.push_str("// Project context:\n");
        out.push_str(project.trim_end());
        out.push_str("\n\n");
    }

    if options.scope_only {
        out.push_str(&reconstruct(tree, id));
        return out;
    }

    let entity = tree.get(id);
    if options.summary && !options.include_parent && !options.include_siblings {
        match entity.kind {
            EntityKind::Namespace => {
                namespace_context(tree, entity, &mut out);
                return out;
            }
            kind if kind.is_record() => {
                record_context(tree, entity, caps, &mut out);
                return out;
            }
            _ => {}
        }
    }

    surroundings(tree, id, options, caps, &mut out);
    target(tree, id, &mut out);
    out
}

fn target(tree: &EntityTree, id: EntityId, out: &mut String) {
    out.push_str("// Target entity:\n");
    out.push_str(reconstruct(tree, id).trim_matches('\n'));
    out.push('\n');
}

fn surroundings(
    tree: &EntityTree,
    id: EntityId,
    options: &ContextOptions,
    caps: &ContextConfig,
    out: &mut String,
) {
    let Some(parent) = tree.parent(id) else { return };
    let parent_entity = tree.get(parent);

    if options.include_parent && parent_entity.kind != EntityKind::Root {
        out.push_str("// Parent context:\n");
        out.push_str(&outline(parent_entity));
        out.push_str("\n\n");
    }

    if options.include_siblings {
        let siblings: Vec<&Entity> = tree
            .siblings(id)
            .into_iter()
            .map(|s| tree.get(s))
            .filter(|s| s.kind.is_documentable())
            .collect();
        if !siblings.is_empty() {
            out.push_str("// Sibling context:\n");
            let methods: Vec<&Entity> =
                siblings.iter().copied().filter(|s| s.kind.is_callable()).collect();
            let fields: Vec<&Entity> =
                siblings.iter().copied().filter(|s| is_data(s.kind)).collect();
            capped(&methods, caps.max_methods, "methods", out);
            capped(&fields, caps.max_fields, "fields", out);
            for other in siblings.iter().filter(|s| !s.kind.is_callable() && !is_data(s.kind)) {
                out.push_str(&outline(other));
                out.push('\n');
            }
            out.push('\n');
        }
    }
}

fn is_data(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::Field | EntityKind::Variable)
}

/// Up to `cap` declarations, then a count of the rest.
fn capped(entities: &[&Entity], cap: usize, noun: &str, out: &mut String) {
    for entity in entities.iter().take(cap) {
        out.push_str(&declaration(entity));
        out.push('\n');
    }
    if entities.len() > cap {
        out.push_str(&format!("// ... and {} more {}\n", entities.len() - cap, noun));
    }
}

/// One-line stand-in for an entity whose body is not shown.
fn outline(entity: &Entity) -> String {
    match entity.kind {
        EntityKind::Namespace => format!("namespace {} {{ /* ... */ }}", entity.name),
        EntityKind::Enum => format!("enum {} {{ /* ... */ }};", entity.name),
        kind if kind.is_record() => format!("{} {} {{ /* ... */ }};", kind, entity.name),
        _ => declaration(entity),
    }
}

/// The signature on one line, terminated like a declaration.
fn declaration(entity: &Entity) -> String {
    let signature = entity.one_line_signature();
    match entity.kind {
        EntityKind::Enumerator | EntityKind::AccessSpecifier | EntityKind::PreprocessorLine => {
            signature
        }
        _ if signature.ends_with(';') => signature,
        _ => format!("{};", signature),
    }
}

fn namespace_context(tree: &EntityTree, entity: &Entity, out: &mut String) {
    out.push_str(&entity.one_line_signature());
    out.push('\n');
    let lines: Vec<String> = entity
        .children
        .iter()
        .map(|&c| tree.get(c))
        .filter_map(|child| match child.kind {
            EntityKind::Namespace | EntityKind::Enum => {
                Some(format!("{} {};", child.kind, child.name))
            }
            kind if kind.is_record() => Some(format!("{} {};", kind, child.name)),
            EntityKind::Function => Some(declaration(child)),
            _ => None,
        })
        .collect();
    if !lines.is_empty() {
        out.push_str("  // Contains:\n");
        for line in lines {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    }
}

fn record_context(tree: &EntityTree, entity: &Entity, caps: &ContextConfig, out: &mut String) {
    out.push_str(&entity.one_line_signature());
    out.push('\n');
    let public: Vec<&Entity> = entity
        .children
        .iter()
        .map(|&c| tree.get(c))
        .filter(|c| matches!(c.access, AccessLevel::Public | AccessLevel::Unspecified))
        .collect();
    let methods: Vec<&Entity> = public.iter().copied().filter(|c| c.kind.is_callable()).collect();
    let fields: Vec<&Entity> = public.iter().copied().filter(|c| is_data(c.kind)).collect();
    if methods.is_empty() && fields.is_empty() {
        return;
    }
    out.push_str("  // Public interface:\n");
    let shown = methods
        .iter()
        .take(caps.max_methods)
        .chain(fields.iter().take(caps.max_fields));
    for entity in shown {
        out.push_str("  ");
        out.push_str(&declaration(entity));
        out.push('\n');
    }
    if methods.len() > caps.max_methods {
        let more = methods.len() - caps.max_methods;
        out.push_str(&format!("  // ... and {} more methods\n", more));
    }
    if fields.len() > caps.max_fields {
        let more = fields.len() - caps.max_fields;
        out.push_str(&format!("  // ... and {} more fields\n", more));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "namespace app {
class Engine {
public:
    void start();
    void stop();
    void pause();
    void resume();
    void reset();
    void tick();
    int speed;
private:
    int secret;
};
void helper(int n);
}
";

    fn context(path: &str, options: ContextOptions) -> String {
        let out = parse("app.hpp", HEADER);
        let id = out.tree.find_by_path(path).unwrap();
        extract_context(&out.tree, id, &options, &ContextConfig::default())
    }

    #[test]
    fn namespace_lists_contents() {
        assert_eq!(
            context("app", ContextOptions::default().summarized()),
            "namespace app\n  // Contains:\n  class Engine;\n  void helper(int n);\n"
        );
    }

    #[test]
    fn class_shows_capped_public_interface() {
        let text = context("app::Engine", ContextOptions::default().summarized());
        assert_eq!(
            text,
            "class Engine\n  // Public interface:\n  void start();\n  void stop();\n  \
             void pause();\n  void resume();\n  void reset();\n  int speed;\n  \
             // ... and 1 more methods\n"
        );
        assert!(!text.contains("secret"));
    }

    #[test]
    fn records_show_their_full_text_by_default() {
        let src = "namespace n {\nclass C {\npublic:\n    void a() { x = 1; }\nprivate:\n    \
                   int x;\n};\n}\n";
        let out = parse("n.hpp", src);
        let id = out.tree.find_by_path("n::C").unwrap();
        let options = ContextOptions::default();
        let text = extract_context(&out.tree, id, &options, &ContextConfig::default());
        assert_eq!(
            text,
            "// Target entity:\nclass C {\npublic:\n    void a() { x = 1; }\nprivate:\n    \
             int x;\n};\n"
        );
    }

    #[test]
    fn summary_needs_no_surroundings() {
        let text = context(
            "app::Engine",
            ContextOptions::default().summarized().with_parent(),
        );
        assert!(text.starts_with("// Parent context:\nnamespace app { /* ... */ }\n\n"));
        assert!(text.contains("// Target entity:\nclass Engine {\n"));
        assert!(text.contains("    int secret;\n"));
    }

    #[test]
    fn other_kinds_show_target() {
        assert_eq!(
            context("app::helper", ContextOptions::default()),
            "// Target entity:\nvoid helper(int n);\n"
        );
    }

    #[test]
    fn parent_and_siblings_are_one_line() {
        let options = ContextOptions::default().with_parent().with_siblings();
        let text = context("app::Engine::speed", options);
        assert!(text.starts_with(
            "// Parent context:\nclass Engine { /* ... */ };\n\n// Sibling context:\n"
        ));
        assert!(text.contains("void start();\n"));
        assert!(text.contains("// ... and 1 more methods\n"));
        assert!(text.contains("int secret;\n"));
        assert!(text.ends_with("// Target entity:\n    int speed;\n"));
    }

    #[test]
    fn scope_only_is_verbatim() {
        let text = context("app::helper", ContextOptions::default().scope_only());
        assert_eq!(text, "void helper(int n);\n");
    }

    #[test]
    fn project_context_comes_first() {
        let text = context(
            "app::helper",
            ContextOptions::default().with_project_context("Game engine core."),
        );
        let head = "// Project context:\nGame engine core.\n\n// Target entity:\n";
        assert!(text.starts_with(head));
    }
}
