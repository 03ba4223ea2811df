//! Statement segmentation: find where one declaration ends.
//!
//! Works on the scanner's spans at a scope-top position. Braces that belong
//! to initializers (`= {..}`, `x{5}`, member-init lists) and parentheses are
//! balanced so only a structural `;`, `{`, `}` or label ends a statement.

use crate::scanner::{Span, SpanKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `;` at top level, consumed
    Semicolon,
    /// `{` that opens a scope or function body, consumed
    OpenBrace,
    /// `,` between enumerators, consumed
    Comma,
    /// `public:`/`protected:`/`private:`; `term` is the colon, consumed
    AccessLabel,
    /// `}` of the enclosing scope; not consumed
    CloseBrace,
    /// An access label started mid-statement; not consumed
    Interrupted,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Declaration,
    /// Inside an enum body, where `,` separates entries
    Enumerator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    /// First span of the statement (significant)
    pub first: usize,
    /// Last significant span of the signature, if any
    pub last: Option<usize>,
    pub terminator: Terminator,
    /// Index of the terminator span, or where segmentation stopped
    pub term: usize,
}

impl Statement {
    /// Index of the first span after the statement.
    pub fn resume_at(&self) -> usize {
        match self.terminator {
            Terminator::Semicolon
            | Terminator::OpenBrace
            | Terminator::Comma
            | Terminator::AccessLabel => self.term + 1,
            Terminator::CloseBrace | Terminator::Interrupted | Terminator::Eof => self.term,
        }
    }
}

/// Next significant span at or after `from`.
pub fn next_significant(spans: &[Span<'_>], from: usize) -> Option<usize> {
    (from..spans.len()).find(|&i| !spans[i].is_trivia())
}

/// Index of the `}` matching the `{` at `open`, counting only punctuation.
pub fn matching_brace(spans: &[Span<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, span) in spans.iter().enumerate().skip(open) {
        if span.kind != SpanKind::Punct {
            continue;
        }
        if span.is_punct('{') {
            depth += 1;
        } else if span.is_punct('}') {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn is_label(spans: &[Span<'_>], i: usize) -> Option<usize> {
    let span = &spans[i];
    if !(span.is_word("public") || span.is_word("protected") || span.is_word("private")) {
        return None;
    }
    let colon = next_significant(spans, i + 1)?;
    if !spans[colon].is_punct(':') {
        return None;
    }
    // `public::x` is a qualified name, not a label
    match spans.get(colon + 1) {
        Some(next) if next.is_punct(':') => None,
        _ => Some(colon),
    }
}

const SCOPE_KEYWORDS: &[&str] = &["class", "struct", "union", "enum", "namespace"];

/// Split one statement starting at the significant span `start`.
pub fn segment(spans: &[Span<'_>], start: usize, mode: Mode) -> Statement {
    let mut parens = 0usize;
    let mut brackets = 0usize;
    let mut angles = 0usize;
    let mut expect_template_angle = false;
    let mut after_operator = false;
    let mut saw_assign = false;
    let mut saw_call = false;
    let mut member_init = false;
    let mut scope_keyword = false;
    let mut words = 0usize;
    let mut prev: Option<usize> = None;
    let mut last: Option<usize> = None;

    let done = |last, terminator, term| Statement {
        first: start,
        last,
        terminator,
        term,
    };

    let mut i = start;
    while i < spans.len() {
        let span = &spans[i];
        if span.is_trivia() || (span.kind == SpanKind::Preprocessor && i != start) {
            i += 1;
            continue;
        }

        if span.is_punct(';') {
            return done(last, Terminator::Semicolon, i);
        }
        if span.is_punct('}') {
            return done(last, Terminator::CloseBrace, i);
        }

        let top = parens == 0 && brackets == 0 && angles == 0;
        match span.kind {
            SpanKind::Punct => match span.text {
                "(" => {
                    parens += 1;
                    if !after_operator || prev.is_some_and(|p| !spans[p].is_word("operator")) {
                        after_operator = false;
                    }
                }
                ")" => {
                    parens = parens.saturating_sub(1);
                    if parens == 0 && brackets == 0 {
                        saw_call = true;
                    }
                }
                "[" => brackets += 1,
                "]" => brackets = brackets.saturating_sub(1),
                "<" if expect_template_angle || angles > 0 => {
                    angles += 1;
                    expect_template_angle = false;
                }
                ">" if angles > 0 && parens == 0 => angles -= 1,
                "{" if top => {
                    let prev_span = prev.map(|p| &spans[p]);
                    let prev_word = prev_span.is_some_and(|p| p.kind == SpanKind::Word);
                    let prev_angle = prev_span.is_some_and(|p| p.is_punct('>'));
                    let initializer = saw_assign
                        || (member_init && (prev_word || prev_angle))
                        || (!scope_keyword && !saw_call && prev_word && words >= 2);
                    if !initializer {
                        return done(last, Terminator::OpenBrace, i);
                    }
                    match matching_brace(spans, i) {
                        Some(close) => {
                            last = Some(close);
                            prev = Some(close);
                            i = close + 1;
                            continue;
                        }
                        None => return done(last, Terminator::Eof, spans.len()),
                    }
                }
                "{" => {
                    // braces nested in parens: default arguments, lambdas
                    if let Some(close) = matching_brace(spans, i) {
                        last = Some(close);
                        prev = Some(close);
                        i = close + 1;
                        continue;
                    }
                }
                "," if top && mode == Mode::Enumerator => {
                    return done(last, Terminator::Comma, i);
                }
                "=" if top && !after_operator => saw_assign = true,
                ":" if top && saw_call => {
                    let double = spans.get(i + 1).is_some_and(|s| s.is_punct(':'))
                        || prev.is_some_and(|p| spans[p].is_punct(':') && p + 1 == i);
                    if !double {
                        member_init = true;
                    }
                }
                _ => {}
            },
            SpanKind::Word => {
                words += 1;
                if top && mode == Mode::Declaration {
                    if let Some(colon) = is_label(spans, i) {
                        if last.is_none() {
                            return done(Some(i), Terminator::AccessLabel, colon);
                        }
                        return done(last, Terminator::Interrupted, i);
                    }
                }
                if span.text == "template" {
                    expect_template_angle = true;
                } else if span.text == "operator" {
                    after_operator = true;
                } else if top && SCOPE_KEYWORDS.contains(&span.text) {
                    scope_keyword = true;
                }
            }
            _ => {}
        }
        if span.kind == SpanKind::Str && prev.is_some_and(|p| spans[p].is_word("extern")) {
            // `extern "C" {` opens a linkage block
            scope_keyword = true;
        }
        last = Some(i);
        prev = Some(i);
        i += 1;
    }
    done(last, Terminator::Eof, spans.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn seg(src: &str, mode: Mode) -> (String, Terminator) {
        let scanned = scan(src);
        let spans = scanned.spans;
        let first = next_significant(&spans, 0).unwrap();
        let st = segment(&spans, first, mode);
        let sig = match st.last {
            Some(l) => src[spans[first].range.start.offset..spans[l].range.end.offset].to_string(),
            None => String::new(),
        };
        (sig, st.terminator)
    }

    #[test]
    fn plain_declaration() {
        assert_eq!(seg("int x;", Mode::Declaration), ("int x".into(), Terminator::Semicolon));
    }

    #[test]
    fn function_body_opens() {
        assert_eq!(
            seg("void f() const { return; }", Mode::Declaration),
            ("void f() const".into(), Terminator::OpenBrace)
        );
    }

    #[test]
    fn initializer_braces_are_balanced() {
        assert_eq!(
            seg("int a[] = {1, 2};", Mode::Declaration),
            ("int a[] = {1, 2}".into(), Terminator::Semicolon)
        );
        assert_eq!(
            seg("Widget w{1, 2};", Mode::Declaration),
            ("Widget w{1, 2}".into(), Terminator::Semicolon)
        );
        assert_eq!(
            seg("auto f = [] { return 1; };", Mode::Declaration),
            ("auto f = [] { return 1; }".into(), Terminator::Semicolon)
        );
    }

    #[test]
    fn member_init_list_then_body() {
        assert_eq!(
            seg("Foo() : a{1}, b(2) { }", Mode::Declaration),
            ("Foo() : a{1}, b(2)".into(), Terminator::OpenBrace)
        );
    }

    #[test]
    fn scope_keywords_open() {
        assert_eq!(
            seg("struct S : Base<int> {", Mode::Declaration).1,
            Terminator::OpenBrace
        );
        assert_eq!(seg("extern \"C\" {", Mode::Declaration).1, Terminator::OpenBrace);
        assert_eq!(seg("namespace a::b {", Mode::Declaration).1, Terminator::OpenBrace);
    }

    #[test]
    fn template_default_argument_is_not_assignment() {
        assert_eq!(
            seg("template <typename T = int> class X {", Mode::Declaration).1,
            Terminator::OpenBrace
        );
    }

    #[test]
    fn assignment_operator_body() {
        assert_eq!(
            seg("Foo& operator=(const Foo&) { return *this; }", Mode::Declaration).1,
            Terminator::OpenBrace
        );
    }

    #[test]
    fn access_label() {
        let (sig, term) = seg("public: int x;", Mode::Declaration);
        assert_eq!((sig.as_str(), term), ("public", Terminator::AccessLabel));
    }

    #[test]
    fn label_interrupts_unterminated_statement() {
        assert_eq!(
            seg("int x\nprivate: int y;", Mode::Declaration),
            ("int x".into(), Terminator::Interrupted)
        );
    }

    #[test]
    fn base_clause_is_not_a_label() {
        assert_eq!(
            seg("class D : public B {", Mode::Declaration).1,
            Terminator::OpenBrace
        );
    }

    #[test]
    fn enumerators_split_on_commas() {
        assert_eq!(
            seg("Red = f(1, 2), Green", Mode::Enumerator),
            ("Red = f(1, 2)".into(), Terminator::Comma)
        );
        assert_eq!(seg("Blue }", Mode::Enumerator), ("Blue".into(), Terminator::CloseBrace));
    }

    #[test]
    fn unterminated_statement_reaches_eof() {
        assert_eq!(seg("int x", Mode::Declaration), ("int x".into(), Terminator::Eof));
    }

    #[test]
    fn matching_brace_skips_nested() {
        let scanned = scan("{ { } }");
        assert_eq!(matching_brace(&scanned.spans, 0), Some(6));
    }
}
