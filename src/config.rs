//! Tunables for formatting, context extraction, and the documentation filter.

use serde::{Deserialize, Serialize};

/// Indentation used when a layout has to be synthesized rather than copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Spaces per nesting level
    pub indent_width: usize,
    /// Indent with one tab per level instead of spaces
    pub use_tabs: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            use_tabs: false,
        }
    }
}

impl FormatConfig {
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_tabs(mut self, use_tabs: bool) -> Self {
        self.use_tabs = use_tabs;
        self
    }

    /// Indentation string for a nesting depth.
    pub fn indent(&self, depth: usize) -> String {
        if self.use_tabs {
            "\t".repeat(depth)
        } else {
            " ".repeat(depth * self.indent_width)
        }
    }
}

/// Sibling caps for context extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub max_methods: usize,
    pub max_fields: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_methods: 5,
            max_fields: 3,
        }
    }
}

/// Allow/deny lists deciding which entities count as "needs documentation".
///
/// Filtering is a query-time concern; the tree always keeps every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Likely template parameters
    pub template_param_names: Vec<String>,
    /// Standard-library and toolchain namespaces; their subtrees are skipped
    pub system_names: Vec<String>,
    /// Container boilerplate aliases, skipped for typedef/using/variable
    pub type_alias_names: Vec<String>,
    /// Extra names to skip anywhere
    pub skip_names: Vec<String>,
    /// Keywords allowed between a doc block and the declaration it documents
    pub intervening_keywords: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            template_param_names: strings(&[
                "T",
                "U",
                "V",
                "E",
                "N",
                "S",
                "Container",
                "ElementType",
                "OtherElementType",
                "Count",
                "Offset",
                "Extent",
                "OtherExtent",
            ]),
            system_names: strings(&["std", "__gnu_cxx", "__detail"]),
            type_alias_names: strings(&[
                "value_type",
                "size_type",
                "difference_type",
                "pointer",
                "const_pointer",
                "reference",
                "const_reference",
                "iterator",
                "reverse_iterator",
                "element_type",
            ]),
            skip_names: Vec::new(),
            intervening_keywords: strings(&[
                "template",
                "inline",
                "static",
                "constexpr",
                "consteval",
                "extern",
                "virtual",
                "explicit",
                "friend",
                "typename",
                "class",
                "struct",
            ]),
        }
    }
}

impl FilterConfig {
    pub fn with_skip_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_intervening_keyword(&self, word: &str) -> bool {
        self.intervening_keywords.iter().any(|k| k == word)
    }
}

/// Aggregate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub format: FormatConfig,
    pub context: ContextConfig,
    pub filter: FilterConfig,
}
