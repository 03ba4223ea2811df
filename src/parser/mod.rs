//! Header parsing: scanner spans in, entity tree out.
//!
//! Parsing never fails. Malformed input produces diagnostics next to a tree
//! that still reproduces the text byte for byte.

mod builder;
pub mod rules;
pub mod statement;

use crate::error::Diagnostic;
use crate::scanner::scan;
use crate::tree::EntityTree;
use rayon::prelude::*;
use tracing::debug;

/// A parsed file and everything that looked wrong in it.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub tree: EntityTree,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse one header. `path` only labels the result.
pub fn parse(path: &str, text: &str) -> ParseOutput {
    let scanned = scan(text);
    let mut diagnostics = scanned.diagnostics;
    let (tree, built) = builder::build(path, text, scanned.spans);
    diagnostics.extend(built);
    diagnostics.sort_by_key(|d| d.range.start.offset);
    debug!(
        path,
        entities = tree.len(),
        diagnostics = diagnostics.len(),
        "parsed"
    );
    ParseOutput { tree, diagnostics }
}

/// Parse several independent headers in parallel, preserving input order.
pub fn parse_many<P, T>(inputs: &[(P, T)]) -> Vec<ParseOutput>
where
    P: AsRef<str> + Sync,
    T: AsRef<str> + Sync,
{
    inputs
        .par_iter()
        .map(|(path, text)| parse(path.as_ref(), text.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    #[test]
    fn scanner_and_builder_diagnostics_merge_in_order() {
        let out = parse("bad.hpp", "}\nconst char* s = \"open\n");
        let kinds: Vec<DiagnosticKind> = out.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::UnmatchedCloseBrace, DiagnosticKind::UnterminatedSpan]
        );
    }

    #[test]
    fn parse_many_keeps_order() {
        let inputs = vec![("a.hpp", "int a;"), ("b.hpp", "int b;")];
        let outs = parse_many(&inputs);
        assert_eq!(outs.len(), 2);
        assert_eq!(outs[0].tree.path, "a.hpp");
        assert!(outs[1].tree.find_by_path("b").is_ok());
    }
}
