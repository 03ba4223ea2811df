//! Tolerant lexer: classifies every byte of a header into spans.
//!
//! The output covers the whole input with no gaps or overlaps, so the
//! builder can account for every character. Anything still open at EOF is
//! closed there and reported as [`DiagnosticKind::UnterminatedSpan`].

use crate::error::{Diagnostic, DiagnosticKind};
use crate::model::{Position, SourceRange};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Identifier, keyword or number
    Word,
    /// Single punctuation character
    Punct,
    Str,
    Char,
    LineComment,
    BlockComment,
    /// `#` directive through its unescaped line end
    Preprocessor,
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub kind: SpanKind,
    pub text: &'a str,
    pub range: SourceRange,
}

impl<'a> Span<'a> {
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            SpanKind::Whitespace | SpanKind::LineComment | SpanKind::BlockComment
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, SpanKind::LineComment | SpanKind::BlockComment)
    }

    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == SpanKind::Punct && self.text.starts_with(ch)
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.kind == SpanKind::Word && self.text == word
    }

    /// Number of line breaks inside the span.
    pub fn newlines(&self) -> usize {
        self.text.matches('\n').count()
    }
}

/// Result of scanning one file.
#[derive(Debug, Default)]
pub struct Scanned<'a> {
    pub spans: Vec<Span<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Cursor<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn at_end(&self) -> bool {
        self.offset >= self.text.len()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
    }

    /// Advance past `needle`; false (cursor at EOF) when it never appears.
    fn bump_past(&mut self, needle: &str) -> bool {
        match self.rest().find(needle) {
            Some(idx) => {
                let target = self.offset + idx + needle.len();
                while self.offset < target {
                    self.bump();
                }
                true
            }
            None => {
                while self.bump().is_some() {}
                false
            }
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || !ch.is_ascii()
}

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

const RAW_STRING_PREFIXES: &[&str] = &["R", "LR", "uR", "UR", "u8R"];

/// Scan `text` into a gap-free sequence of classified spans.
pub fn scan(text: &str) -> Scanned<'_> {
    let mut cur = Cursor::new(text);
    let mut out = Scanned::default();
    let mut line_start = true;

    while !cur.at_end() {
        let start = cur.position();
        let Some(ch) = cur.peek() else { break };
        let mut unterminated: Option<&str> = None;

        let kind = if is_space(ch) {
            cur.bump_while(is_space);
            SpanKind::Whitespace
        } else if ch == '#' && line_start {
            if !scan_directive(&mut cur) {
                unterminated = Some("preprocessor line continues past end of file");
            }
            SpanKind::Preprocessor
        } else if ch == '/' && cur.peek_nth(1) == Some('/') {
            cur.bump_while(|c| c != '\n');
            SpanKind::LineComment
        } else if ch == '/' && cur.peek_nth(1) == Some('*') {
            cur.bump();
            cur.bump();
            if !cur.bump_past("*/") {
                unterminated = Some("block comment is not closed");
            }
            SpanKind::BlockComment
        } else if ch == '"' {
            if !scan_quoted(&mut cur, '"') {
                unterminated = Some("string literal is not closed");
            }
            SpanKind::Str
        } else if ch == '\'' {
            if !scan_quoted(&mut cur, '\'') {
                unterminated = Some("character literal is not closed");
            }
            SpanKind::Char
        } else if is_word_char(ch) {
            scan_word(&mut cur);
            let word = &text[start.offset..cur.offset];
            if RAW_STRING_PREFIXES.contains(&word) && cur.peek() == Some('"') {
                if !scan_raw_string(&mut cur) {
                    unterminated = Some("raw string literal is not closed");
                }
                SpanKind::Str
            } else {
                SpanKind::Word
            }
        } else {
            cur.bump();
            SpanKind::Punct
        };

        let span_text = &text[start.offset..cur.offset];
        let range = SourceRange::new(start, cur.position());
        if let Some(message) = unterminated {
            warn!(line = start.line, column = start.column, "{}", message);
            out.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnterminatedSpan,
                range,
                message,
            ));
        }

        line_start = match kind {
            SpanKind::Whitespace => line_start || span_text.contains('\n'),
            // a block comment before `#` still leaves the directive at line start
            SpanKind::BlockComment => line_start && !span_text.contains('\n'),
            _ => false,
        };
        out.spans.push(Span {
            kind,
            text: span_text,
            range,
        });
    }
    out
}

/// Directive body through the first line break not preceded by `\`.
fn scan_directive(cur: &mut Cursor<'_>) -> bool {
    loop {
        match cur.peek() {
            None => return true,
            Some('\n') => return true,
            Some('\\') => {
                cur.bump();
                if cur.peek() == Some('\r') {
                    cur.bump();
                }
                match cur.peek() {
                    Some('\n') => {
                        cur.bump();
                        if cur.at_end() {
                            return false;
                        }
                    }
                    None => return false,
                    _ => {}
                }
            }
            Some(_) => {
                cur.bump();
            }
        }
    }
}

fn scan_quoted(cur: &mut Cursor<'_>, quote: char) -> bool {
    cur.bump();
    scan_quoted_tail(cur, quote)
}

/// `R"delim( ... )delim"`; the cursor sits on the opening quote.
fn scan_raw_string(cur: &mut Cursor<'_>) -> bool {
    cur.bump();
    let delim_start = cur.offset;
    cur.bump_while(|c| c != '(' && c != '\n' && c != '"');
    let delim = cur.text[delim_start..cur.offset].to_string();
    if cur.peek() != Some('(') {
        // not a raw string after all; finish as an ordinary literal
        return scan_quoted_tail(cur, '"');
    }
    cur.bump();
    cur.bump_past(&format!("){}\"", delim))
}

fn scan_quoted_tail(cur: &mut Cursor<'_>, quote: char) -> bool {
    while let Some(ch) = cur.bump() {
        if ch == '\\' {
            cur.bump();
        } else if ch == quote {
            return true;
        }
    }
    false
}

/// Identifier or number; numbers keep `'` digit separators (`1'000'000`).
fn scan_word(cur: &mut Cursor<'_>) {
    let numeric = cur.peek().is_some_and(|c| c.is_ascii_digit());
    loop {
        cur.bump_while(is_word_char);
        if numeric
            && cur.peek() == Some('\'')
            && cur.peek_nth(1).is_some_and(|c| c.is_ascii_alphanumeric())
        {
            cur.bump();
            continue;
        }
        break;
    }
}
