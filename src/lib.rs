//! Tolerant C++ header parser that keeps every byte.
//!
//! [`parse`] scans a header, recognizes its declarations and builds an
//! [`EntityTree`]: namespaces, records, enums, functions, fields and the
//! documentation comments attached to them. Reconstructing an unmodified
//! tree reproduces the input exactly; replacing one entity's documentation
//! changes only that block. [`Document`] bundles the common workflow of
//! finding undocumented entities, extracting prompt context for them and
//! writing new comments back.

pub mod comment;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod render;
pub mod scanner;
pub mod tree;

pub use comment::{is_doc_comment, normalize_generated_comment, parse_documentation_comment};
pub use config::{Config, ContextConfig, FilterConfig, FormatConfig};
pub use document::{DocUpdate, Document};
pub use error::{Diagnostic, DiagnosticKind, Error, Result};
pub use filter::{DocStats, IssueKind, Severity, ValidationIssue};
pub use model::{
    AccessLevel, DocComment, Entity, EntityId, EntityKind, Modifiers, Position, SourceRange,
};
pub use parser::{parse, parse_many, ParseOutput};
pub use render::context::{extract_context, ContextOptions};
pub use render::source::{normalize, reconstruct};
pub use render::{create_renderer, Layout, Renderer};
pub use tree::EntityTree;
