//! Data model for a parsed header: plain data, no parsing logic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A point in the source text. `line` and `column` are 1-based, `offset` is a
/// byte offset into the original input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// Half-open range `[start, end)` over the original text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

/// Handle into an [`EntityTree`](crate::tree::EntityTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Root,
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    Enumerator,
    Function,
    Method,
    Constructor,
    Destructor,
    Field,
    Variable,
    Typedef,
    UsingDecl,
    AccessSpecifier,
    PreprocessorLine,
    RawComment,
    #[default]
    Unknown,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Root => "root",
            EntityKind::Namespace => "namespace",
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Union => "union",
            EntityKind::Enum => "enum",
            EntityKind::Enumerator => "enumerator",
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::Constructor => "constructor",
            EntityKind::Destructor => "destructor",
            EntityKind::Field => "field",
            EntityKind::Variable => "variable",
            EntityKind::Typedef => "typedef",
            EntityKind::UsingDecl => "using",
            EntityKind::AccessSpecifier => "access",
            EntityKind::PreprocessorLine => "preprocessor",
            EntityKind::RawComment => "comment",
            EntityKind::Unknown => "unknown",
        }
    }

    /// Kinds that can carry a documentation comment of their own.
    pub fn is_documentable(self) -> bool {
        !matches!(
            self,
            EntityKind::Root
                | EntityKind::AccessSpecifier
                | EntityKind::PreprocessorLine
                | EntityKind::RawComment
                | EntityKind::Unknown
        )
    }

    /// Class-like kinds that own an access-level frame.
    pub fn is_record(self) -> bool {
        matches!(self, EntityKind::Class | EntityKind::Struct | EntityKind::Union)
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            EntityKind::Function
                | EntityKind::Method
                | EntityKind::Constructor
                | EntityKind::Destructor
        )
    }

    /// Kinds whose braces open a child scope in the tree.
    pub fn is_scope(self) -> bool {
        matches!(self, EntityKind::Namespace | EntityKind::Enum) || self.is_record()
    }

    /// Default access level for members declared directly inside this kind.
    pub fn default_member_access(self) -> AccessLevel {
        match self {
            EntityKind::Class => AccessLevel::Private,
            EntityKind::Struct | EntityKind::Union => AccessLevel::Public,
            _ => AccessLevel::Unspecified,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    Public,
    Protected,
    Private,
    #[default]
    Unspecified,
}

impl AccessLevel {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(AccessLevel::Public),
            "protected" => Some(AccessLevel::Protected),
            "private" => Some(AccessLevel::Private),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Protected => "protected",
            AccessLevel::Private => "private",
            AccessLevel::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration specifiers detected from signature tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_inline: bool,
    pub is_const: bool,
    pub is_constexpr: bool,
    pub is_noexcept: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub is_explicit: bool,
    pub is_extern: bool,
    pub is_mutable: bool,
    pub is_friend: bool,
    pub is_template: bool,
    /// `= 0`
    pub is_pure: bool,
    /// `= delete`
    pub is_deleted: bool,
    /// `= default`
    pub is_defaulted: bool,
}

impl Modifiers {
    /// Names of the flags that are set, in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        let flags = [
            (self.is_static, "static"),
            (self.is_virtual, "virtual"),
            (self.is_inline, "inline"),
            (self.is_const, "const"),
            (self.is_constexpr, "constexpr"),
            (self.is_noexcept, "noexcept"),
            (self.is_override, "override"),
            (self.is_final, "final"),
            (self.is_explicit, "explicit"),
            (self.is_extern, "extern"),
            (self.is_mutable, "mutable"),
            (self.is_friend, "friend"),
            (self.is_template, "template"),
            (self.is_pure, "pure"),
            (self.is_deleted, "deleted"),
            (self.is_defaulted, "defaulted"),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Structured documentation comment.
///
/// Built once by [`parse_documentation_comment`](crate::comment::parse_documentation_comment)
/// and replaced wholesale on update. `raw_text` is the block exactly as it is
/// emitted into reconstructed source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocComment {
    pub brief: String,
    pub detailed: String,
    pub parameters: BTreeMap<String, String>,
    pub returns: String,
    pub throws: Vec<String>,
    pub see_also: Vec<String>,
    pub since: String,
    pub deprecated: String,
    pub author: String,
    pub version: String,
    pub ingroup: Vec<String>,
    pub defgroup: String,
    pub addtogroup: String,
    pub file_tag: String,
    pub namespace_tag: String,
    pub class_tag: String,
    pub custom_tags: BTreeMap<String, String>,
    pub raw_text: String,
    /// Where the block sat in the original file; `None` for supplied comments
    pub range: Option<SourceRange>,
}

impl DocComment {
    /// `@file`, with or without an argument.
    pub fn declares_file(&self) -> bool {
        !self.file_tag.is_empty() || declares_tag(&self.raw_text, "file")
    }

    /// True when the block declares file or group structure rather than
    /// documenting the next declaration.
    pub fn is_structural(&self) -> bool {
        self.declares_file()
            || !self.defgroup.is_empty()
            || !self.addtogroup.is_empty()
            || self.custom_tags.contains_key("name")
            || self.custom_tags.contains_key("{")
            || self.custom_tags.contains_key("}")
    }
}

/// `@file` may appear without an argument, so presence is checked on the raw text.
fn declares_tag(raw: &str, tag: &str) -> bool {
    raw.split_whitespace().any(|word| {
        (word.starts_with('@') || word.starts_with('\\')) && &word[1..] == tag
    })
}

/// One node of the entity tree.
///
/// Lossless reconstruction emits, in order: `leading_whitespace`,
/// `documentation.raw_text` + `doc_gap`, `signature_text`, `opening`, `body`,
/// the children, `closing`, `trailing_whitespace`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub qualified_path: String,
    /// Declaration text up to the body or terminator, verbatim
    pub signature_text: String,
    pub access: AccessLevel,
    pub modifiers: Modifiers,
    pub range: SourceRange,
    pub leading_whitespace: String,
    pub documentation: Option<DocComment>,
    /// Text between the documentation block and the signature
    pub doc_gap: String,
    /// `{` of a scope, or the terminator of a leaf, with preceding whitespace
    pub opening: String,
    /// Inline function body from after the signature through its `}`
    pub body: Option<String>,
    /// Everything after the last child through `}` and declarators/`;`
    pub closing: String,
    /// Same-line text after the entity, through the line break
    pub trailing_whitespace: String,
    pub is_definition: bool,
    /// Intermediate namespace synthesized from `namespace A::B`
    pub is_synthetic: bool,
    /// Earlier forward declaration, kept apart as text, whose
    /// documentation this definition falls back to
    pub forward_declaration: Option<EntityId>,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has_documentation(&self) -> bool {
        self.documentation.is_some()
    }

    /// Signature collapsed onto one line.
    pub fn one_line_signature(&self) -> String {
        self.signature_text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
