//! Error and diagnostic types.
//!
//! Parse-quality problems are collected as [`Diagnostic`]s and never abort a
//! parse. Only caller mistakes (a wrong lookup path, an unknown render format)
//! surface as [`Error`].

use crate::model::{Position, SourceRange};
use serde::Serialize;
use thiserror::Error;

/// Hard errors returned to callers.
#[derive(Error, Debug)]
pub enum Error {
    /// Qualified-path lookup missed
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// `create_renderer` was given a name it does not know
    #[error("unknown format: {0}. Use source, normalized, or json")]
    UnknownFormat(String),

    /// JSON serialization of a subtree failed
    #[error("failed to serialize entity tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for fallible doxytree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a recoverable parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// String, character, comment or preprocessor span still open at EOF
    UnterminatedSpan,
    /// `}` with no open scope to close
    UnmatchedCloseBrace,
    /// Scope still open at EOF; closed implicitly
    UnclosedScope,
    /// Caller-supplied comment text had no recognizable doc structure
    InvalidDocumentationComment,
}

/// A recoverable problem found while scanning, building, or normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub range: SourceRange,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, range: SourceRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
        }
    }

    /// Diagnostic anchored at a single position.
    pub fn at(kind: DiagnosticKind, pos: Position, message: impl Into<String>) -> Self {
        Self::new(kind, SourceRange::new(pos, pos), message)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {:?}: {}",
            self.range.start.line, self.range.start.column, self.kind, self.message
        )
    }
}
