//! Documentation-need policy: which entities should carry documentation,
//! which of those do, and what is wrong with the ones that do.
//!
//! Filtering happens at query time. The tree always keeps every entity.

use crate::config::FilterConfig;
use crate::model::{Entity, EntityId, EntityKind};
use crate::tree::EntityTree;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// How much of the tree an exclusion rule removes from accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Keep,
    /// The entity only; its children are still considered
    Entity,
    /// The entity and everything below it
    Subtree,
}

fn skip(entity: &Entity, filter: &FilterConfig) -> Skip {
    let name = entity.name.as_str();
    let listed = |names: &[String]| names.iter().any(|n| n == name);

    // text of a duplicate definition; its members belong to the first one
    if entity.kind == EntityKind::Unknown && !entity.children.is_empty() {
        return Skip::Subtree;
    }
    if !entity.kind.is_documentable() || entity.is_synthetic || name.is_empty() {
        return Skip::Entity;
    }
    let single_letter = name.len() == 1 && name.chars().all(|c| c.is_ascii_alphabetic());
    let short_upper = name.chars().count() <= 2 && name.chars().all(|c| c.is_ascii_uppercase());
    if single_letter
        || short_upper
        || listed(&filter.template_param_names)
        || listed(&filter.system_names)
        || listed(&filter.skip_names)
    {
        return Skip::Subtree;
    }
    let alias_kind = matches!(
        entity.kind,
        EntityKind::Typedef | EntityKind::UsingDecl | EntityKind::Variable
    );
    if alias_kind && listed(&filter.type_alias_names) {
        return Skip::Entity;
    }
    Skip::Keep
}

/// Entities that count for documentation accounting, in pre-order.
pub fn eligible(tree: &EntityTree, filter: &FilterConfig) -> Vec<EntityId> {
    let mut out = Vec::new();
    let mut stack: Vec<EntityId> = tree.children(tree.root()).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        match skip(tree.get(id), filter) {
            Skip::Subtree => continue,
            Skip::Entity => {}
            Skip::Keep => out.push(id),
        }
        stack.extend(tree.children(id).iter().rev());
    }
    out
}

/// Eligible entities lacking documentation, once per qualified path.
///
/// A constructor of a documented class is not listed; the class block
/// covers it.
pub fn undocumented(tree: &EntityTree, filter: &FilterConfig) -> Vec<EntityId> {
    let mut seen = HashSet::new();
    eligible(tree, filter)
        .into_iter()
        .filter(|&id| !tree.is_documented_with(id, filter))
        .filter(|&id| {
            let entity = tree.get(id);
            if entity.kind != EntityKind::Constructor {
                return true;
            }
            !tree
                .parent(id)
                .is_some_and(|p| tree.get(p).kind.is_record() && tree.is_documented_with(p, filter))
        })
        .filter(|&id| seen.insert(tree.get(id).qualified_path.clone()))
        .collect()
}

/// Eligible entities with an attached record that lacks `@ingroup group`.
///
/// Entities documented only by a trailing member comment or through a
/// forward declaration have no record of their own and are not listed.
pub fn missing_group(tree: &EntityTree, filter: &FilterConfig, group: &str) -> Vec<EntityId> {
    eligible(tree, filter)
        .into_iter()
        .filter(|&id| {
            tree.get(id)
                .documentation
                .as_ref()
                .is_some_and(|doc| !doc.ingroup.iter().any(|g| g == group))
        })
        .collect()
}

/// Documentation coverage over eligible entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocStats {
    pub total: usize,
    pub documented: usize,
    pub undocumented: usize,
    pub coverage_percent: f64,
}

impl fmt::Display for DocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} documented ({:.1}%)",
            self.documented, self.total, self.coverage_percent
        )
    }
}

pub fn stats(tree: &EntityTree, filter: &FilterConfig) -> DocStats {
    let ids = eligible(tree, filter);
    let total = ids.len();
    let documented = ids.iter().filter(|&&id| tree.is_documented_with(id, filter)).count();
    let coverage_percent = if total == 0 {
        100.0
    } else {
        documented as f64 * 100.0 / total as f64
    };
    DocStats {
        total,
        documented,
        undocumented: total - documented,
        coverage_percent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingDocumentation,
    MissingReturnDoc,
    MissingBrief,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingDocumentation => "missing_documentation",
            IssueKind::MissingReturnDoc => "missing_return_doc",
            IssueKind::MissingBrief => "missing_brief",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn new(entity: &Entity, kind: IssueKind, severity: Severity, message: &str) -> Self {
        Self {
            path: entity.qualified_path.clone(),
            kind,
            severity,
            message: message.to_string(),
        }
    }
}

/// Check every eligible entity's documentation.
pub fn validate(tree: &EntityTree, filter: &FilterConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for id in eligible(tree, filter) {
        let entity = tree.get(id);
        if !tree.is_documented_with(id, filter) {
            issues.push(ValidationIssue::new(
                entity,
                IssueKind::MissingDocumentation,
                Severity::Warning,
                "entity has no documentation",
            ));
            continue;
        }
        let Some(doc) = tree.documentation(id) else { continue };
        let function = matches!(entity.kind, EntityKind::Function | EntityKind::Method);
        if function && doc.returns.is_empty() && !returns_void(entity) {
            issues.push(ValidationIssue::new(
                entity,
                IssueKind::MissingReturnDoc,
                Severity::Info,
                "function returns a value but has no @return",
            ));
        }
        if doc.brief.is_empty() {
            issues.push(ValidationIssue::new(
                entity,
                IssueKind::MissingBrief,
                Severity::Info,
                "documentation has no brief description",
            ));
        }
    }
    issues
}

/// `void` return type: a `void` word before the name with no pointer after it.
fn returns_void(entity: &Entity) -> bool {
    let signature = entity.one_line_signature();
    let short = entity.name.rsplit("::").next().unwrap_or_default();
    let head = match signature.find(&format!("{}(", short)).or_else(|| signature.find(short)) {
        Some(at) => &signature[..at],
        None => signature.as_str(),
    };
    match head.rfind("void") {
        Some(at) => {
            let after = &head[at + 4..];
            let standalone = !after.starts_with(|c: char| c.is_alphanumeric() || c == '_');
            standalone && !after.contains('*')
        }
        None => false,
    }
}
