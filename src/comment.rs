//! Documentation-comment interpreter.
//!
//! Turns a `/** */`, `/*! */`, `///` or `//!` block into a [`DocComment`],
//! renders records back into canonical blocks, and cleans up comment text
//! handed in from outside (generated comments) before it is attached.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::model::{DocComment, Position};
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*```").unwrap());

static RE_TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[@\\]([A-Za-z_][\w\[\],]*|\{|\})(?:\s+(.*))?$").unwrap());

static RE_HAS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\*?\s*[@\\][A-Za-z]").unwrap());

/// True when `text` opens with a documentation marker.
pub fn is_doc_comment(text: &str) -> bool {
    let t = text.trim_start();
    if t.starts_with("/**") {
        // `/**/` is an empty plain comment, `/***` a banner
        !t.starts_with("/**/") && !t.starts_with("/***")
    } else {
        t.starts_with("/*!")
            || (t.starts_with("///") && !t.starts_with("////"))
            || t.starts_with("//!")
    }
}

/// Trailing member comment such as `int x; ///< count`.
pub fn is_member_doc(text: &str) -> bool {
    let t = text.trim_start();
    ["///<", "//!<", "/**<", "/*!<"].iter().any(|m| t.starts_with(m))
}

/// Parse a raw comment into a record. `None` for plain comments.
pub fn parse_documentation_comment(raw: &str) -> Option<DocComment> {
    if !is_doc_comment(raw) {
        return None;
    }
    let mut doc = DocComment {
        raw_text: raw.to_string(),
        ..Default::default()
    };

    let mut current_tag: Option<String> = None;
    let mut content: Vec<String> = Vec::new();

    for line in clean_lines(raw) {
        if line.is_empty() {
            // a blank line ends the running tag paragraph
            if let Some(tag) = current_tag.take() {
                set_tag(&mut doc, &tag, &content.join(" "));
            }
            content.clear();
            continue;
        }
        if let Some(caps) = RE_TAG_LINE.captures(&line) {
            if let Some(tag) = current_tag.take() {
                set_tag(&mut doc, &tag, &content.join(" "));
            }
            current_tag = Some(caps[1].to_string());
            content.clear();
            if let Some(rest) = caps.get(2) {
                let rest = rest.as_str().trim();
                if !rest.is_empty() {
                    content.push(rest.to_string());
                }
            }
        } else if current_tag.is_some() {
            content.push(line);
        } else if doc.brief.is_empty() {
            doc.brief = line;
        } else if doc.detailed.is_empty() {
            doc.detailed = line;
        } else {
            doc.detailed.push(' ');
            doc.detailed.push_str(&line);
        }
    }
    if let Some(tag) = current_tag {
        set_tag(&mut doc, &tag, &content.join(" "));
    }
    Some(doc)
}

/// Comment body with delimiters and per-line decoration removed.
fn clean_lines(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let is_block = trimmed.starts_with("/*");
    let mut out = Vec::new();

    for line in trimmed.lines() {
        let mut clean = line.trim();
        if is_block {
            clean = clean
                .strip_prefix("/**")
                .or_else(|| clean.strip_prefix("/*!"))
                .unwrap_or(clean);
            clean = clean.strip_suffix("*/").unwrap_or(clean);
            clean = clean.trim_start_matches('*');
        } else {
            clean = clean
                .strip_prefix("///")
                .or_else(|| clean.strip_prefix("//!"))
                .unwrap_or(clean);
        }
        // trailing member docs: `///<` and `/**<`
        clean = clean.strip_prefix('<').unwrap_or(clean);
        out.push(clean.trim().to_string());
    }
    out
}

/// Route one tag's content to its field. Lists accumulate, scalars overwrite.
fn set_tag(doc: &mut DocComment, tag: &str, content: &str) {
    let content = content.trim().to_string();
    // `param[in]`, `param[out]`, `param[in,out]`
    let tag = if tag.starts_with("param[") { "param" } else { tag };
    match tag {
        "brief" | "short" => doc.brief = content,
        "details" | "detailed" => doc.detailed = content,
        "param" => {
            if let Some((name, desc)) = content.split_once(char::is_whitespace) {
                let desc = desc.trim();
                if !desc.is_empty() {
                    doc.parameters.insert(name.to_string(), desc.to_string());
                }
            }
        }
        "return" | "returns" | "result" => doc.returns = content,
        "throw" | "throws" | "exception" => doc.throws.push(content),
        "see" | "sa" => doc.see_also.push(content),
        "since" => doc.since = content,
        "deprecated" => doc.deprecated = content,
        "author" => doc.author = content,
        "version" => doc.version = content,
        "ingroup" => doc.ingroup.push(content),
        "defgroup" => doc.defgroup = content,
        "addtogroup" => doc.addtogroup = content,
        "file" => doc.file_tag = content,
        "namespace" => doc.namespace_tag = content,
        "class" => doc.class_tag = content,
        _ => {
            doc.custom_tags.insert(tag.to_string(), content);
        }
    }
}

/// Clean up comment text supplied from outside the file, typically a
/// generated comment, into a record ready for attachment.
///
/// Code fences are dropped and the first `/** ... */` block is kept. Bare
/// text is wrapped into a block. When nothing recognizable remains the
/// wrapped text is still returned, with an
/// [`InvalidDocumentationComment`](DiagnosticKind::InvalidDocumentationComment)
/// diagnostic.
pub fn normalize_generated_comment(text: &str) -> (DocComment, Option<Diagnostic>) {
    let unfenced: Vec<&str> = text.lines().filter(|l| !RE_FENCE.is_match(l)).collect();

    if let Some(block) = first_block(&unfenced) {
        if let Some(doc) = parse_documentation_comment(&block) {
            return (doc, None);
        }
    }

    let body = unfenced.join("\n");
    let body = body.trim();
    if is_doc_comment(body) {
        if let Some(doc) = parse_documentation_comment(body) {
            return (doc, None);
        }
    }

    let recognizable = RE_HAS_TAG.is_match(body);
    let wrapped = wrap_block(body);
    let doc = parse_documentation_comment(&wrapped).unwrap_or_else(|| DocComment {
        raw_text: wrapped.clone(),
        ..Default::default()
    });
    let diagnostic = (!recognizable).then(|| {
        Diagnostic::at(
            DiagnosticKind::InvalidDocumentationComment,
            Position::default(),
            "no documentation structure found; text was wrapped as a comment block",
        )
    });
    (doc, diagnostic)
}

/// First `/**` block, from its opening line through the line closing it.
fn first_block(lines: &[&str]) -> Option<String> {
    let start = lines.iter().position(|l| l.trim_start().starts_with("/**"))?;
    let mut block = Vec::new();
    for (i, line) in lines[start..].iter().enumerate() {
        block.push(line.trim_end());
        let body = if i == 0 { &line.trim()[3..] } else { line.trim() };
        if body.ends_with("*/") {
            return Some(reindent(&block.join("\n"), ""));
        }
    }
    // never closed; close it here
    block.push(" */");
    Some(reindent(&block.join("\n"), ""))
}

fn wrap_block(text: &str) -> String {
    let mut out = String::from("/**");
    for line in text.lines() {
        let line = line.trim();
        let line = line.strip_prefix('*').map(str::trim_start).unwrap_or(line);
        if line.is_empty() {
            out.push_str("\n *");
        } else {
            out.push_str("\n * ");
            out.push_str(line);
        }
    }
    out.push_str("\n */");
    out
}

/// Re-indent a comment block so every line after the first starts at `indent`.
///
/// The first line is left bare; callers place it after existing indentation.
/// Block decoration lines (`*`) keep their customary one-space offset.
pub fn reindent(raw: &str, indent: &str) -> String {
    let mut out = String::new();
    for (i, line) in raw.trim().lines().enumerate() {
        let t = line.trim();
        if i == 0 {
            out.push_str(t);
            continue;
        }
        out.push('\n');
        if t.is_empty() {
            continue;
        }
        out.push_str(indent);
        if t.starts_with('*') {
            out.push(' ');
        } else if !t.starts_with("//") {
            out.push_str("   ");
        }
        out.push_str(t);
    }
    out
}

impl DocComment {
    /// Render the record as a canonical `/** ... */` block.
    ///
    /// The first line carries no indentation; continuation lines start with
    /// `indent`.
    pub fn to_block(&self, indent: &str) -> String {
        let mut sections: Vec<Vec<String>> = Vec::new();
        if !self.brief.is_empty() {
            sections.push(vec![format!("@brief {}", self.brief)]);
        }
        if !self.detailed.is_empty() {
            sections.push(vec![self.detailed.clone()]);
        }

        let mut tags = Vec::new();
        for (name, desc) in &self.parameters {
            tags.push(format!("@param {} {}", name, desc));
        }
        push_scalar(&mut tags, "return", &self.returns);
        for t in &self.throws {
            tags.push(format!("@throws {}", t));
        }
        push_scalar(&mut tags, "since", &self.since);
        push_scalar(&mut tags, "deprecated", &self.deprecated);
        push_scalar(&mut tags, "author", &self.author);
        push_scalar(&mut tags, "version", &self.version);
        for s in &self.see_also {
            tags.push(format!("@see {}", s));
        }
        for g in &self.ingroup {
            tags.push(format!("@ingroup {}", g));
        }
        push_scalar(&mut tags, "defgroup", &self.defgroup);
        push_scalar(&mut tags, "addtogroup", &self.addtogroup);
        push_scalar(&mut tags, "file", &self.file_tag);
        push_scalar(&mut tags, "namespace", &self.namespace_tag);
        push_scalar(&mut tags, "class", &self.class_tag);
        for (name, value) in &self.custom_tags {
            if value.is_empty() {
                tags.push(format!("@{}", name));
            } else {
                tags.push(format!("@{} {}", name, value));
            }
        }
        if !tags.is_empty() {
            sections.push(tags);
        }

        let mut out = String::from("/**");
        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                out.push_str(indent);
                out.push_str(" *");
            }
            for line in section {
                out.push('\n');
                out.push_str(indent);
                out.push_str(" * ");
                out.push_str(line);
            }
        }
        out.push('\n');
        out.push_str(indent);
        out.push_str(" */");
        out
    }
}

fn push_scalar(tags: &mut Vec<String>, tag: &str, value: &str) {
    if !value.is_empty() {
        tags.push(format!("@{} {}", tag, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_comments_are_not_documentation() {
        assert!(parse_documentation_comment("// plain").is_none());
        assert!(parse_documentation_comment("/* plain */").is_none());
        assert!(parse_documentation_comment("/**/").is_none());
        assert!(parse_documentation_comment("//// banner").is_none());
    }

    #[test]
    fn brief_and_detailed_from_untagged_text() {
        let doc = parse_documentation_comment(
            "/**\n * Opens the file.\n *\n * Blocks until ready.\n * Never throws.\n */",
        )
        .unwrap();
        assert_eq!(doc.brief, "Opens the file.");
        assert_eq!(doc.detailed, "Blocks until ready. Never throws.");
    }

    #[test]
    fn param_last_write_wins() {
        let doc =
            parse_documentation_comment("/** @brief X\n * @param a Y\n * @param a Z\n */").unwrap();
        assert_eq!(doc.brief, "X");
        assert_eq!(doc.parameters["a"], "Z");
        assert_eq!(doc.parameters.len(), 1);
    }

    #[test]
    fn list_tags_accumulate_in_order() {
        let doc = parse_documentation_comment(
            "/**\n * @throw std::bad_alloc\n * @exception Err\n * @see a\n * @sa b\n \
             * @ingroup io\n * @ingroup net\n */",
        )
        .unwrap();
        assert_eq!(doc.throws, vec!["std::bad_alloc", "Err"]);
        assert_eq!(doc.see_also, vec!["a", "b"]);
        assert_eq!(doc.ingroup, vec!["io", "net"]);
    }

    #[test]
    fn param_without_description_is_dropped() {
        let doc =
            parse_documentation_comment("/** @param lonely\n * @param[in] n count */").unwrap();
        assert!(!doc.parameters.contains_key("lonely"));
        assert_eq!(doc.parameters["n"], "count");
    }

    #[test]
    fn multi_line_tag_content_is_space_joined() {
        let doc = parse_documentation_comment(
            "/**\n * @return the number of bytes\n *         actually written\n */",
        )
        .unwrap();
        assert_eq!(doc.returns, "the number of bytes actually written");
    }

    #[test]
    fn backslash_tags_and_unknown_tags() {
        let raw = "/*!\n \\brief B\n \\note careful\n \\returns r\n*/";
        let doc = parse_documentation_comment(raw).unwrap();
        assert_eq!(doc.brief, "B");
        assert_eq!(doc.returns, "r");
        assert_eq!(doc.custom_tags["note"], "careful");
    }

    #[test]
    fn line_comment_runs() {
        let raw = "/// Adds two numbers.\n/// @param a lhs\n/// @param b rhs";
        let doc = parse_documentation_comment(raw).unwrap();
        assert_eq!(doc.brief, "Adds two numbers.");
        assert_eq!(doc.parameters.len(), 2);
    }

    #[test]
    fn raw_text_is_preserved() {
        let raw = "/** @brief x */";
        assert_eq!(parse_documentation_comment(raw).unwrap().raw_text, raw);
    }

    #[test]
    fn member_group_markers_are_structural() {
        assert!(parse_documentation_comment("/** @{ */").unwrap().is_structural());
        assert!(parse_documentation_comment("/** @file util.hpp */").unwrap().is_structural());
        assert!(!parse_documentation_comment("/** @brief x */").unwrap().is_structural());
    }

    #[test]
    fn normalize_strips_fences_and_keeps_first_block() {
        let text = "Here you go:\n```cpp\n/**\n * @brief First\n */\n\
                    /**\n * @brief Second\n */\n```\n";
        let (doc, diag) = normalize_generated_comment(text);
        assert!(diag.is_none());
        assert_eq!(doc.brief, "First");
        assert_eq!(doc.raw_text, "/**\n * @brief First\n */");
    }

    #[test]
    fn normalize_wraps_tagged_bare_text() {
        let (doc, diag) = normalize_generated_comment("@brief Computes a hash.\n@return the hash");
        assert!(diag.is_none());
        assert_eq!(doc.brief, "Computes a hash.");
        assert_eq!(doc.returns, "the hash");
        assert!(doc.raw_text.starts_with("/**\n * @brief"));
    }

    #[test]
    fn normalize_flags_unstructured_text() {
        let (doc, diag) = normalize_generated_comment("Sorry, I cannot help with that.");
        assert_eq!(diag.unwrap().kind, DiagnosticKind::InvalidDocumentationComment);
        assert_eq!(doc.raw_text, "/**\n * Sorry, I cannot help with that.\n */");
        assert_eq!(doc.brief, "Sorry, I cannot help with that.");
    }

    #[test]
    fn reindent_aligns_decoration() {
        let raw = "/**\n         * @brief x\n         */";
        assert_eq!(reindent(raw, "    "), "/**\n     * @brief x\n     */");
    }

    #[test]
    fn to_block_canonical_order() {
        let mut doc = DocComment {
            brief: "Sum".into(),
            returns: "total".into(),
            ..Default::default()
        };
        doc.parameters.insert("b".into(), "second".into());
        doc.parameters.insert("a".into(), "first".into());
        assert_eq!(
            doc.to_block("  "),
            "/**\n   * @brief Sum\n   *\n   * @param a first\n   \
             * @param b second\n   * @return total\n   */"
        );
    }

    #[test]
    fn to_block_round_trips_through_parser() {
        let mut doc = DocComment {
            brief: "B".into(),
            detailed: "More words.".into(),
            ..Default::default()
        };
        doc.throws.push("E".into());
        let parsed = parse_documentation_comment(&doc.to_block("")).unwrap();
        assert_eq!(parsed.brief, "B");
        assert_eq!(parsed.detailed, "More words.");
        assert_eq!(parsed.throws, vec!["E"]);
    }
}
