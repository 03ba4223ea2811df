//! High-level facade over one parsed header.
//!
//! A [`Document`] owns the tree, the diagnostics of its parse and the
//! configuration used for queries and rendering. Lookups take qualified
//! paths; every documentation change marks the document modified.

use crate::comment::normalize_generated_comment;
use crate::config::Config;
use crate::error::{Diagnostic, Result};
use crate::filter::{self, DocStats, ValidationIssue};
use crate::model::{DocComment, Entity, EntityId};
use crate::parser::parse;
use crate::render::context::{extract_context, ContextOptions};
use crate::render::source::{normalize, reconstruct};
use crate::render::summary::entity_summary;
use crate::tree::EntityTree;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Document {
    tree: EntityTree,
    diagnostics: Vec<Diagnostic>,
    config: Config,
    modified: bool,
}

/// Field-level change to one entity's documentation.
///
/// Unset fields keep their current value. Parameters and custom tags are
/// merged by name; groups are appended when not already present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocUpdate {
    pub path: String,
    pub brief: Option<String>,
    pub detailed: Option<String>,
    pub returns: Option<String>,
    pub deprecated: Option<String>,
    pub params: BTreeMap<String, String>,
    pub groups: Vec<String>,
    pub custom_tags: BTreeMap<String, String>,
}

impl DocUpdate {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn brief(mut self, text: impl Into<String>) -> Self {
        self.brief = Some(text.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.params.insert(name.into(), text.into());
        self
    }

    pub fn returns(mut self, text: impl Into<String>) -> Self {
        self.returns = Some(text.into());
        self
    }

    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.groups.push(name.into());
        self
    }

    fn apply(&self, doc: &mut DocComment) {
        if let Some(brief) = &self.brief {
            doc.brief = brief.clone();
        }
        if let Some(detailed) = &self.detailed {
            doc.detailed = detailed.clone();
        }
        if let Some(returns) = &self.returns {
            doc.returns = returns.clone();
        }
        if let Some(deprecated) = &self.deprecated {
            doc.deprecated = deprecated.clone();
        }
        doc.parameters.extend(self.params.clone());
        for group in &self.groups {
            if !doc.ingroup.contains(group) {
                doc.ingroup.push(group.clone());
            }
        }
        doc.custom_tags.extend(self.custom_tags.clone());
        // the block is regenerated from the fields
        doc.raw_text.clear();
        doc.range = None;
    }
}

impl Document {
    /// Parse `text`; `path` only labels the document.
    pub fn from_content(path: &str, text: &str) -> Self {
        let out = parse(path, text);
        Self {
            tree: out.tree,
            diagnostics: out.diagnostics,
            config: Config::default(),
            modified: false,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &str {
        &self.tree.path
    }

    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn find(&self, path: &str) -> Result<&Entity> {
        Ok(self.tree.get(self.tree.find_by_path(path)?))
    }

    pub fn find_id(&self, path: &str) -> Result<EntityId> {
        self.tree.find_by_path(path)
    }

    /// Entities that still need documentation under the configured policy.
    pub fn undocumented(&self) -> Vec<&Entity> {
        filter::undocumented(&self.tree, &self.config.filter)
            .into_iter()
            .map(|id| self.tree.get(id))
            .collect()
    }

    /// Replace the documentation of the entity at `path`.
    pub fn set_documentation(&mut self, path: &str, doc: DocComment) -> Result<()> {
        let id = self.tree.find_by_path(path)?;
        self.tree.replace_documentation(id, doc);
        self.modified = true;
        Ok(())
    }

    /// Attach caller-supplied comment text, normalizing it first.
    ///
    /// Text with no recognizable structure is still attached; the returned
    /// diagnostic says so.
    pub fn set_generated_documentation(
        &mut self,
        path: &str,
        text: &str,
    ) -> Result<Option<Diagnostic>> {
        let id = self.tree.find_by_path(path)?;
        let (doc, diagnostic) = normalize_generated_comment(text);
        self.tree.replace_documentation(id, doc);
        self.modified = true;
        Ok(diagnostic)
    }

    /// Apply several field-level updates. All paths are resolved before
    /// anything changes, so a missing path leaves the document untouched.
    pub fn apply_updates(&mut self, updates: &[DocUpdate]) -> Result<()> {
        let ids = updates
            .iter()
            .map(|u| self.tree.find_by_path(&u.path))
            .collect::<Result<Vec<_>>>()?;
        for (update, id) in updates.iter().zip(ids) {
            let mut doc = self.tree.documentation(id).cloned().unwrap_or_default();
            update.apply(&mut doc);
            self.tree.replace_documentation(id, doc);
        }
        if !updates.is_empty() {
            debug!(count = updates.len(), "documentation updates applied");
            self.modified = true;
        }
        Ok(())
    }

    /// Add `@ingroup group` to every documented entity that lacks it and
    /// return the paths that changed.
    pub fn add_group_to_documented(&mut self, group: &str) -> Vec<String> {
        let ids = filter::missing_group(&self.tree, &self.config.filter, group);
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let path = self.tree.get(id).qualified_path.clone();
            let mut doc = self.tree.get(id).documentation.clone().unwrap_or_default();
            DocUpdate::new(path.as_str()).group(group).apply(&mut doc);
            self.tree.replace_documentation(id, doc);
            updated.push(path);
        }
        if !updated.is_empty() {
            debug!(group, count = updated.len(), "group added");
            self.modified = true;
        }
        updated
    }

    /// The file text, byte-identical to the input outside replaced blocks.
    pub fn render(&self) -> String {
        reconstruct(&self.tree, self.tree.root())
    }

    /// The file re-laid out with the configured indentation.
    pub fn render_formatted(&self) -> String {
        normalize(&self.tree, self.tree.root(), &self.config.format)
    }

    /// Verbatim text of one entity's subtree.
    pub fn render_scope(&self, path: &str) -> Result<String> {
        Ok(reconstruct(&self.tree, self.tree.find_by_path(path)?))
    }

    pub fn context(&self, path: &str, options: &ContextOptions) -> Result<String> {
        let id = self.tree.find_by_path(path)?;
        Ok(extract_context(&self.tree, id, options, &self.config.context))
    }

    pub fn summary(&self, path: &str) -> Result<String> {
        Ok(entity_summary(&self.tree, self.tree.find_by_path(path)?))
    }

    pub fn stats(&self) -> DocStats {
        filter::stats(&self.tree, &self.config.filter)
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        filter::validate(&self.tree, &self.config.filter)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        let name = self.path().rsplit('/').next().unwrap_or_default();
        write!(
            f,
            "Document[{}]: {} entities, {:.1}% documented, modified={}",
            name, stats.total, stats.coverage_percent, self.modified
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::parse_documentation_comment;
    use crate::error::{DiagnosticKind, Error};
    use pretty_assertions::assert_eq;

    const HEADER: &str =
        "namespace io {\n\nclass Reader {\npublic:\n    int read(char* buf, int n);\n};\n\n}\n";

    #[test]
    fn set_documentation_marks_modified() {
        let mut doc = Document::from_content("include/io.hpp", HEADER);
        assert!(!doc.is_modified());
        let record = parse_documentation_comment("/** @brief Reads bytes */").unwrap();
        doc.set_documentation("io::Reader::read", record).unwrap();
        assert!(doc.is_modified());
        assert_eq!(
            doc.render(),
            HEADER.replace(
                "    int read",
                "    /** @brief Reads bytes */\n    int read"
            )
        );
    }

    #[test]
    fn missing_path_is_reported() {
        let mut doc = Document::from_content("io.hpp", HEADER);
        let err = doc
            .set_documentation("io::Writer", DocComment::default())
            .unwrap_err();
        assert!(matches!(err, Error::EntityNotFound(_)));
        assert!(!doc.is_modified());
    }

    #[test]
    fn generated_text_is_normalized() {
        let mut doc = Document::from_content("io.hpp", HEADER);
        let diag = doc
            .set_generated_documentation(
                "io::Reader",
                "```cpp\n/**\n * @brief Buffered reader\n */\n```",
            )
            .unwrap();
        assert!(diag.is_none());
        let reader = doc.find("io::Reader").unwrap();
        assert_eq!(reader.documentation.as_ref().unwrap().brief, "Buffered reader");
        assert!(doc.render().contains("/**\n * @brief Buffered reader\n */\nclass Reader {"));

        let diag = doc.set_generated_documentation("io", "just words").unwrap();
        assert_eq!(diag.map(|d| d.kind), Some(DiagnosticKind::InvalidDocumentationComment));
    }

    #[test]
    fn batch_updates_are_all_or_nothing() {
        let mut doc = Document::from_content("io.hpp", HEADER);
        let bad = [
            DocUpdate::new("io::Reader").brief("Reader"),
            DocUpdate::new("io::Missing").brief("x"),
        ];
        assert!(doc.apply_updates(&bad).is_err());
        assert!(doc.find("io::Reader").unwrap().documentation.is_none());

        let good = [DocUpdate::new("io::Reader::read")
            .brief("Read up to n bytes")
            .param("n", "Maximum count")
            .param("buf", "Destination")
            .returns("Bytes read")
            .group("io")];
        doc.apply_updates(&good).unwrap();
        let expected = "    /**\n     * @brief Read up to n bytes\n     *\n     \
                        * @param buf Destination\n     * @param n Maximum count\n     \
                        * @return Bytes read\n     * @ingroup io\n     */\n    int read";
        assert!(doc.render().contains(expected));
    }

    #[test]
    fn group_is_added_to_documented_entities_only() {
        let src = "/** @brief Reader */\nclass Reader {\npublic:\n    /// Read bytes\n    \
                   int read();\n    int peek();\n};\n";
        let mut doc = Document::from_content("io.hpp", src);
        let updated = doc.add_group_to_documented("io");
        assert_eq!(updated, vec!["Reader", "Reader::read"]);
        assert!(doc.is_modified());

        let read = doc.find("Reader::read").unwrap();
        assert_eq!(read.documentation.as_ref().unwrap().ingroup, vec!["io"]);
        assert!(doc.find("Reader::peek").unwrap().documentation.is_none());
        assert!(doc.render().contains(
            "    /**\n     * @brief Read bytes\n     *\n     * @ingroup io\n     */\n    \
             int read();"
        ));

        // a second pass finds nothing left to do
        assert!(doc.add_group_to_documented("io").is_empty());
    }

    #[test]
    fn queries_delegate_to_tree() {
        let doc = Document::from_content("src/io.hpp", HEADER);
        let undocumented: Vec<&str> = doc
            .undocumented()
            .iter()
            .map(|e| e.qualified_path.as_str())
            .collect();
        assert_eq!(undocumented, vec!["io", "io::Reader", "io::Reader::read"]);
        assert_eq!(doc.stats().total, 3);
        assert_eq!(doc.validate().len(), 3);
        assert!(doc.summary("io::Reader").unwrap().starts_with("Kind: class\n"));
        assert_eq!(
            doc.to_string(),
            "Document[io.hpp]: 3 entities, 0.0% documented, modified=false"
        );
    }

    #[test]
    fn formatted_render_uses_config() {
        let mut config = Config::default();
        config.format.indent_width = 2;
        let doc = Document::from_content("io.hpp", HEADER).with_config(config);
        assert_eq!(
            doc.render_formatted(),
            "namespace io {\n  class Reader {\n  public:\n    int read(char* buf, int n);\n  \
             };\n} // namespace io\n"
        );
    }
}
