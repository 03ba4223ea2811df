//! Ordered recognizers that decide what a statement declares.
//!
//! Each rule is an independent predicate over the statement's significant
//! tokens. [`recognize`] evaluates them in priority order and the first match
//! wins; a statement nothing matches becomes [`EntityKind::Unknown`].

use crate::model::{AccessLevel, EntityKind, Modifiers};
use crate::scanner::{Span, SpanKind};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static RE_DEFINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^#\s*define\s+(\w+)(\([^)]*\))?(.*)$").unwrap());

static RE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s*(\w*)").unwrap());

/// What the enclosing scope looks like to a rule.
pub struct RuleInput<'s, 'a> {
    /// Significant tokens of the signature, in order
    pub tokens: &'s [Span<'a>],
    /// Statement ended in `{`
    pub has_body: bool,
    pub scope: EntityKind,
    /// Name of the enclosing record, for constructor detection
    pub scope_name: &'s str,
    /// Object-like macros defined with an empty body
    pub macros: &'s HashSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recognized {
    pub kind: EntityKind,
    pub name: String,
    pub modifiers: Modifiers,
    /// Set by the access rule
    pub access: Option<AccessLevel>,
    /// Body of an object-like `#define`, trimmed
    pub macro_body: Option<String>,
}

impl Recognized {
    fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ..Default::default()
        }
    }

    fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Signature tokens with template prefixes and attributes removed.
struct Decl<'s, 'a> {
    core: Vec<Span<'a>>,
    input: &'s RuleInput<'s, 'a>,
    is_template: bool,
}

type Rule = fn(&Decl<'_, '_>) -> Option<Recognized>;

const RULES: &[(&str, Rule)] = &[
    ("preprocessor", preprocessor_rule),
    ("access", access_rule),
    ("namespace", namespace_rule),
    ("record", record_rule),
    ("enum", enum_rule),
    ("constructor", constructor_rule),
    ("function", function_rule),
    ("typedef", typedef_rule),
    ("variable", variable_rule),
];

/// Classify a statement. Never fails; the fallback is an unnamed `Unknown`.
pub fn recognize(input: &RuleInput<'_, '_>) -> Recognized {
    let (core, is_template) = strip_prefixes(input.tokens);
    let decl = Decl {
        core,
        input,
        is_template,
    };
    for (name, rule) in RULES {
        if let Some(mut found) = rule(&decl) {
            found.modifiers.is_template |= decl.is_template;
            tracing::trace!(rule = name, kind = %found.kind, name = %found.name, "recognized");
            return found;
        }
    }
    Recognized::new(EntityKind::Unknown, "")
}

// -- Token helpers ------------------------------------------------------------

fn word<'a>(span: &Span<'a>) -> Option<&'a str> {
    (span.kind == SpanKind::Word).then_some(span.text)
}

fn is_keyword(w: &str) -> bool {
    KEYWORDS.contains(&w)
}

const KEYWORDS: &[&str] = &[
    "void", "int", "char", "bool", "float", "double", "long", "short", "unsigned", "signed",
    "auto", "const", "volatile", "static", "inline", "virtual", "explicit", "constexpr",
    "consteval", "constinit", "extern", "mutable", "friend", "typename", "template", "return",
    "if", "else", "while", "for", "do", "switch", "case", "default", "break", "continue",
    "sizeof", "alignof", "decltype", "noexcept", "typeid", "throw", "new", "delete", "this",
    "static_assert", "using", "typedef", "namespace", "class", "struct", "union", "enum",
    "operator", "public", "protected", "private", "final", "override", "requires", "co_await",
    "wchar_t", "char8_t", "char16_t", "char32_t",
];

/// Parenthesised words that never name a function.
const CALL_LIKE: &[&str] = &["decltype", "alignas", "noexcept", "sizeof", "alignof", "requires"];

const SPECIFIERS: &[&str] = &[
    "explicit", "inline", "constexpr", "consteval", "virtual", "static", "friend", "extern",
];

fn is_number(span: &Span<'_>) -> bool {
    span.kind == SpanKind::Word && span.text.starts_with(|c: char| c.is_ascii_digit())
}

/// Export/attribute macros: empty `#define`s, or ALL_CAPS names with an underscore.
fn is_macro_like(w: &str, macros: &HashSet<String>) -> bool {
    if macros.contains(w) {
        return true;
    }
    w.contains('_')
        && w.len() > 2
        && w.chars().any(|c| c.is_ascii_uppercase())
        && w.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Two adjacent `:` tokens.
fn is_scope_sep(tokens: &[Span<'_>], i: usize) -> bool {
    tokens[i].is_punct(':')
        && tokens
            .get(i + 1)
            .is_some_and(|n| n.is_punct(':') && n.range.start.offset == tokens[i].range.end.offset)
}

/// Nesting depth of each token: `()`, `[]`, `{}` and template `<>`.
fn depths(tokens: &[Span<'_>]) -> Vec<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut out = Vec::with_capacity(tokens.len());
    for (i, t) in tokens.iter().enumerate() {
        let ch = if t.kind == SpanKind::Punct {
            t.text.chars().next()
        } else {
            None
        };
        match ch {
            Some(open @ ('(' | '[' | '{')) => {
                out.push(stack.len());
                stack.push(open);
            }
            Some('<')
                if i > 0
                    && tokens[i - 1].kind == SpanKind::Word
                    && !tokens[i - 1].is_word("operator") =>
            {
                out.push(stack.len());
                stack.push('<');
            }
            Some(close @ (')' | ']' | '}')) => {
                let open = match close {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                while let Some(top) = stack.pop() {
                    if top == open {
                        break;
                    }
                }
                out.push(stack.len());
            }
            Some('>') if stack.last() == Some(&'<') => {
                stack.pop();
                out.push(stack.len());
            }
            _ => out.push(stack.len()),
        }
    }
    out
}

/// Index just past the group opened at `open` (any bracket kind), or the end.
fn skip_group(tokens: &[Span<'_>], open: usize) -> usize {
    let (o, c) = match tokens[open].text {
        "(" => ('(', ')'),
        "[" => ('[', ']'),
        "<" => ('<', '>'),
        _ => ('{', '}'),
    };
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        if t.is_punct(o) {
            depth += 1;
        } else if t.is_punct(c) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i + 1;
            }
        }
    }
    tokens.len()
}

/// Remove `template<...>` prefixes and attributes (`[[..]]`,
/// `__attribute__((..))`, `__declspec(..)`, `alignas(..)`).
fn strip_prefixes<'a>(tokens: &[Span<'a>]) -> (Vec<Span<'a>>, bool) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut is_template = false;
    let mut i = 0;
    while i < tokens.len() {
        let t = &tokens[i];
        if out.is_empty()
            && t.is_word("template")
            && tokens.get(i + 1).is_some_and(|n| n.is_punct('<'))
        {
            is_template = true;
            i = skip_group(tokens, i + 1);
            continue;
        }
        if t.is_punct('[') && tokens.get(i + 1).is_some_and(|n| n.is_punct('[')) {
            i = skip_group(tokens, i);
            continue;
        }
        if matches!(t.text, "__attribute__" | "__declspec" | "alignas")
            && t.kind == SpanKind::Word
        {
            if tokens.get(i + 1).is_some_and(|n| n.is_punct('(')) {
                i = skip_group(tokens, i + 1);
            } else {
                i += 1;
            }
            continue;
        }
        out.push(*t);
        i += 1;
    }
    (out, is_template)
}

/// Last `Word(::Word)*` run at depth 0 among `tokens[..end]`, skipping
/// filtered words. Also reports how many runs were seen.
fn name_runs(decl: &Decl<'_, '_>, start: usize, end: usize) -> (String, usize) {
    let depth = depths(&decl.core);
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut i = start;
    while i < end {
        let t = &decl.core[i];
        if depth[i] > 0 {
            i += 1;
            continue;
        }
        if let Some(w) = word(t) {
            if w == "final" || is_macro_like(w, decl.input.macros) {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            } else if current.is_empty() || current.ends_with("::") {
                current.push_str(w);
            } else {
                runs.push(std::mem::take(&mut current));
                current.push_str(w);
            }
            i += 1;
        } else if is_scope_sep(&decl.core, i) {
            current.push_str("::");
            i += 2;
        } else {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            i += 1;
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    let count = runs.len();
    (runs.pop().unwrap_or_default(), count)
}

/// End of a record/enum head: the base-clause `:` or the end of tokens.
fn head_end(tokens: &[Span<'_>], from: usize) -> usize {
    let depth = depths(tokens);
    let mut i = from;
    while i < tokens.len() {
        if depth[i] == 0 && tokens[i].is_punct(':') {
            if is_scope_sep(tokens, i) {
                i += 2;
                continue;
            }
            return i;
        }
        i += 1;
    }
    tokens.len()
}

/// Top-level indices of `(` in `tokens`.
fn top_parens(tokens: &[Span<'_>]) -> Vec<usize> {
    let depth = depths(tokens);
    tokens
        .iter()
        .enumerate()
        .filter(|(i, t)| depth[*i] == 0 && t.is_punct('('))
        .map(|(i, _)| i)
        .collect()
}

fn top_punct(tokens: &[Span<'_>], ch: char, before: usize) -> bool {
    let depth = depths(tokens);
    tokens[..before.min(tokens.len())]
        .iter()
        .enumerate()
        .any(|(i, t)| depth[i] == 0 && t.is_punct(ch))
}

/// Specifiers before `split`, qualifiers and `= 0|delete|default` after it.
fn detect_modifiers(tokens: &[Span<'_>], split: usize, callable: bool) -> Modifiers {
    let depth = depths(tokens);
    let mut m = Modifiers::default();
    for (i, t) in tokens.iter().enumerate() {
        if depth[i] > 0 {
            continue;
        }
        let Some(w) = word(t) else { continue };
        let before = i < split;
        match w {
            "static" if before => m.is_static = true,
            "virtual" if before => m.is_virtual = true,
            "inline" if before => m.is_inline = true,
            "constexpr" | "consteval" | "constinit" if before => m.is_constexpr = true,
            "explicit" if before => m.is_explicit = true,
            "extern" if before => m.is_extern = true,
            "mutable" if before => m.is_mutable = true,
            "friend" if before => m.is_friend = true,
            "const" if before != callable => m.is_const = true,
            "noexcept" if !before => m.is_noexcept = true,
            "override" if !before => m.is_override = true,
            "final" if !before => m.is_final = true,
            _ => {}
        }
    }
    if callable {
        let eq = (split..tokens.len()).find(|&i| depth[i] == 0 && tokens[i].is_punct('='));
        if let Some(eq) = eq {
            match tokens.get(eq + 1).map(|t| t.text) {
                Some("0") => m.is_pure = true,
                Some("delete") => m.is_deleted = true,
                Some("default") => m.is_defaulted = true,
                _ => {}
            }
        }
    }
    m
}

/// `)` closing the parameter list opened at `open`.
fn param_close(tokens: &[Span<'_>], open: usize) -> usize {
    skip_group(tokens, open).saturating_sub(1)
}

// -- Rules --------------------------------------------------------------------

fn preprocessor_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let [only] = decl.input.tokens else { return None };
    if only.kind != SpanKind::Preprocessor {
        return None;
    }
    if let Some(caps) = RE_DEFINE.captures(only.text) {
        let mut found = Recognized::new(EntityKind::PreprocessorLine, &caps[1]);
        if caps.get(2).is_none() {
            let body = caps[3].replace("\\\n", " ");
            found.macro_body = Some(body.trim().to_string());
        }
        return Some(found);
    }
    let directive = RE_DIRECTIVE
        .captures(only.text)
        .map(|c| format!("#{}", &c[1]))
        .unwrap_or_else(|| "#".to_string());
    Some(Recognized::new(EntityKind::PreprocessorLine, directive))
}

fn access_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let [only] = decl.core.as_slice() else { return None };
    let level = AccessLevel::from_keyword(word(only)?)?;
    let mut found = Recognized::new(EntityKind::AccessSpecifier, level.as_str());
    found.access = Some(level);
    Some(found)
}

fn namespace_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    let first = word(t.first()?)?;

    if first == "extern" && t.get(1).is_some_and(|s| s.kind == SpanKind::Str) && t.len() == 2 {
        return decl.input.has_body.then(|| Recognized::new(EntityKind::Namespace, ""));
    }

    let start = match first {
        "namespace" => 1,
        "inline" if t.get(1).is_some_and(|s| s.is_word("namespace")) => 2,
        _ => return None,
    };
    let mut name = String::new();
    let mut i = start;
    while i < t.len() {
        if let Some(w) = word(&t[i]) {
            if w != "inline" {
                name.push_str(w);
            }
            i += 1;
        } else if is_scope_sep(t, i) {
            name.push_str("::");
            i += 2;
        } else {
            break;
        }
    }
    if i < t.len() && t[i].is_punct('=') {
        // namespace alias
        return Some(Recognized::new(EntityKind::UsingDecl, name));
    }
    if !decl.input.has_body || i != t.len() {
        return None;
    }
    let mut found = Recognized::new(EntityKind::Namespace, name);
    found.modifiers.is_inline = start == 2;
    Some(found)
}

fn record_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    let mut i = 0;
    if t.first()?.is_word("typedef") {
        i += 1;
    }
    let kind = match word(t.get(i)?)? {
        "class" => EntityKind::Class,
        "struct" => EntityKind::Struct,
        "union" => EntityKind::Union,
        _ => return None,
    };
    let end = head_end(t, i + 1);
    let depth = depths(t);
    let bad = t[i + 1..end]
        .iter()
        .enumerate()
        .any(|(j, s)| {
            depth[i + 1 + j] == 0
                && (s.is_punct('(')
                    || s.is_punct('*')
                    || s.is_punct('&')
                    || s.is_punct('=')
                    || s.is_punct(','))
        });
    if bad {
        return None;
    }
    let (name, runs) = name_runs(decl, i + 1, end);
    if !decl.input.has_body && (runs != 1 || i > 0) {
        return None;
    }
    let mut modifiers = Modifiers::default();
    modifiers.is_final = t[i + 1..end].iter().any(|s| s.is_word("final"));
    Some(Recognized::new(kind, name).with_modifiers(modifiers))
}

fn enum_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    let mut i = 0;
    if t.first()?.is_word("typedef") {
        i += 1;
    }
    if !t.get(i)?.is_word("enum") {
        return None;
    }
    i += 1;
    if t.get(i).is_some_and(|s| s.is_word("class") || s.is_word("struct")) {
        i += 1;
    }
    let end = head_end(t, i);
    let (name, runs) = name_runs(decl, i, end);
    if !decl.input.has_body && runs != 1 {
        return None;
    }
    Some(Recognized::new(EntityKind::Enum, name))
}

fn constructor_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    let open = *top_parens(t).first()?;
    if open == 0 {
        return None;
    }
    let name = word(&t[open - 1])?;
    let tilde = open >= 2 && t[open - 2].is_punct('~');
    let name_start = if tilde { open - 2 } else { open - 1 };

    // out-of-class `Foo::Foo(` / `Foo::~Foo(`
    if name_start >= 3 && is_scope_sep(t, name_start - 2) && t[name_start - 3].is_word(name) {
        let prefix_ok = t[..name_start - 3]
            .iter()
            .all(|s| word(s).is_some_and(|w| SPECIFIERS.contains(&w)));
        if !prefix_ok {
            return None;
        }
        let kind = if tilde { EntityKind::Destructor } else { EntityKind::Constructor };
        let local = if tilde { format!("~{}", name) } else { name.to_string() };
        let close = param_close(t, open);
        return Some(
            Recognized::new(kind, format!("{}::{}", name, local))
                .with_modifiers(detect_modifiers(t, close, true)),
        );
    }

    if !decl.input.scope.is_record() || name != decl.input.scope_name {
        return None;
    }
    let prefix_ok = t[..name_start]
        .iter()
        .all(|s| {
            word(s).is_some_and(|w| SPECIFIERS.contains(&w) || is_macro_like(w, decl.input.macros))
        });
    if !prefix_ok {
        return None;
    }
    let close = param_close(t, open);
    let (kind, name) = if tilde {
        (EntityKind::Destructor, format!("~{}", name))
    } else {
        (EntityKind::Constructor, name.to_string())
    };
    Some(Recognized::new(kind, name).with_modifiers(detect_modifiers(t, close, true)))
}

fn function_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    let first = word(t.first()?);
    if matches!(first, Some("typedef" | "using" | "namespace" | "static_assert" | "return")) {
        return None;
    }
    let depth = depths(t);
    let parens = top_parens(t);

    // operator overloads, including conversion operators
    if let Some(op) = (0..t.len()).find(|&i| depth[i] == 0 && t[i].is_word("operator")) {
        if parens.iter().all(|&p| p < op) {
            return None;
        }
        let mut j = op + 1;
        let mut name = String::from("operator");
        if t.get(j).is_some_and(|s| s.is_punct('('))
            && t.get(j + 1).is_some_and(|s| s.is_punct(')'))
        {
            name.push_str("()");
            j += 2;
        }
        while j < t.len() && !t[j].is_punct('(') {
            if t[j].kind == SpanKind::Word {
                name.push(' ');
            }
            name.push_str(t[j].text);
            j += 1;
        }
        if j >= t.len() {
            return None;
        }
        let name = qualify(t, op, name);
        let close = param_close(t, j);
        return Some(callable(decl, name, detect_modifiers(t, close, true)));
    }

    let macros = decl.input.macros;
    let open = parens.iter().copied().find(|&p| {
        p > 0
            && word(&t[p - 1]).is_some_and(|w| !CALL_LIKE.contains(&w) && !is_macro_like(w, macros))
    })?;
    let w = word(&t[open - 1])?;
    if is_keyword(w) || is_number(&t[open - 1]) {
        return None;
    }
    if let Some(next) = t.get(open + 1) {
        let pointer = next.is_punct('*') || next.is_punct('&') || next.is_punct('^');
        if pointer || next.kind == SpanKind::Str || next.kind == SpanKind::Char || is_number(next) {
            return None;
        }
    }
    if top_punct(t, '=', open) {
        return None;
    }
    // a return type (or at least a specifier) must precede the name
    let qualified_start = qualified_start(t, open - 1);
    let has_type = t[..qualified_start]
        .iter()
        .any(|s| {
            word(s).is_some_and(|w| !is_macro_like(w, macros))
                || s.is_punct('*')
                || s.is_punct('&')
                || s.is_punct('>')
        });
    if !has_type {
        return None;
    }
    let name = qualify(t, open - 1, w.to_string());
    let close = param_close(t, open);
    Some(callable(decl, name, detect_modifiers(t, close, true)))
}

fn callable(decl: &Decl<'_, '_>, name: String, modifiers: Modifiers) -> Recognized {
    // a friend declared in a class body is not a member
    let kind = if decl.input.scope.is_record() && !modifiers.is_friend {
        EntityKind::Method
    } else {
        EntityKind::Function
    };
    Recognized::new(kind, name).with_modifiers(modifiers)
}

/// Start of the `A::B::` chain ending at `at`.
fn qualified_start(t: &[Span<'_>], at: usize) -> usize {
    let mut start = at;
    while start >= 3 && is_scope_sep(t, start - 2) && word(&t[start - 3]).is_some() {
        start -= 3;
    }
    start
}

/// Prefix `name` with the `A::B::` chain ending just before `at`.
fn qualify(t: &[Span<'_>], at: usize, name: String) -> String {
    let start = qualified_start(t, at);
    if start == at {
        return name;
    }
    let mut out = String::new();
    let mut i = start;
    while i < at {
        if let Some(w) = word(&t[i]) {
            out.push_str(w);
            i += 1;
        } else {
            out.push_str("::");
            i += 2;
        }
    }
    out.push_str(&name);
    out
}

fn typedef_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    if decl.input.has_body {
        return None;
    }
    let depth = depths(t);
    match word(t.first()?)? {
        "typedef" => {
            let parens = top_parens(t);
            let name = match parens.first() {
                // function pointer: the name is the last word of the first group
                Some(&open) => {
                    let close = param_close(t, open);
                    t[open..close].iter().rev().find_map(word)
                }
                None => {
                    let end = (0..t.len())
                        .find(|&i| depth[i] == 0 && t[i].is_punct('['))
                        .unwrap_or(t.len());
                    t[..end]
                        .iter()
                        .enumerate()
                        .rev()
                        .find(|(i, s)| depth[*i] == 0 && word(s).is_some())
                        .and_then(|(_, s)| word(s))
                }
            };
            Some(Recognized::new(EntityKind::Typedef, name.unwrap_or_default()))
        }
        "using" => {
            let eq = (0..t.len()).find(|&i| depth[i] == 0 && t[i].is_punct('='));
            let name = if let Some(eq) = eq {
                t[1..eq].iter().find_map(word)
            } else {
                t.iter().rev().find_map(word)
            };
            Some(Recognized::new(EntityKind::UsingDecl, name.unwrap_or_default()))
        }
        _ => None,
    }
}

fn variable_rule(decl: &Decl<'_, '_>) -> Option<Recognized> {
    let t = &decl.core;
    if decl.input.has_body || t.is_empty() {
        return None;
    }
    if t.iter().any(|s| {
        matches!(
            s.text,
            "return" | "friend" | "static_assert" | "template" | "typedef" | "using" | "namespace"
        ) && s.kind == SpanKind::Word
    }) {
        return None;
    }
    let depth = depths(t);
    let end = (0..t.len())
        .find(|&i| {
            depth[i] == 0
                && (t[i].is_punct('=')
                    || t[i].is_punct('{')
                    || t[i].is_punct('[')
                    || t[i].is_punct(',')
                    || t[i].is_punct('(')
                    || (t[i].is_punct(':')
                        && !is_scope_sep(t, i)
                        && !(i > 0 && is_scope_sep(t, i - 1))))
        })
        .unwrap_or(t.len());

    // `void (*callback)(int);`
    if end < t.len()
        && t[end].is_punct('(')
        && t.get(end + 1).is_some_and(|s| s.is_punct('*') || s.is_punct('&'))
    {
        let close = param_close(t, end);
        let name = t[end..close].iter().rev().find_map(word)?;
        return Some(variable(decl, name, t));
    }

    let name_idx = (0..end)
        .rev()
        .find(|&i| {
            depth[i] == 0 && word(&t[i]).is_some_and(|w| !matches!(w, "const" | "volatile"))
        })?;
    let name = word(&t[name_idx])?;
    if is_keyword(name) || is_number(&t[name_idx]) {
        return None;
    }
    // a type must come first
    if !t[..name_idx].iter().any(|s| word(s).is_some()) {
        return None;
    }
    Some(variable(decl, name, t))
}

fn variable(decl: &Decl<'_, '_>, name: &str, t: &[Span<'_>]) -> Recognized {
    let kind = if decl.input.scope.is_record() {
        EntityKind::Field
    } else {
        EntityKind::Variable
    };
    Recognized::new(kind, name).with_modifiers(detect_modifiers(t, t.len(), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn classify(src: &str, has_body: bool, scope: EntityKind, scope_name: &str) -> Recognized {
        let scanned = scan(src);
        let tokens: Vec<Span<'_>> =
            scanned.spans.iter().filter(|s| !s.is_trivia()).copied().collect();
        let macros = HashSet::new();
        recognize(&RuleInput {
            tokens: &tokens,
            has_body,
            scope,
            scope_name,
            macros: &macros,
        })
    }

    fn at_ns(src: &str) -> Recognized {
        classify(src, false, EntityKind::Root, "")
    }

    #[test]
    fn preprocessor_define_and_include() {
        let d = at_ns("#define MAX_SIZE 16");
        assert_eq!((d.kind, d.name.as_str()), (EntityKind::PreprocessorLine, "MAX_SIZE"));
        assert_eq!(d.macro_body.as_deref(), Some("16"));
        assert_eq!(at_ns("#include <vector>").name, "#include");
        assert_eq!(at_ns("#define EXPORT").macro_body.as_deref(), Some(""));
    }

    #[test]
    fn namespaces() {
        let n = classify("namespace a::b", true, EntityKind::Root, "");
        assert_eq!((n.kind, n.name.as_str()), (EntityKind::Namespace, "a::b"));
        let anon = classify("namespace", true, EntityKind::Root, "");
        assert_eq!((anon.kind, anon.name.as_str()), (EntityKind::Namespace, ""));
        let alias = at_ns("namespace fs = std::filesystem");
        assert_eq!((alias.kind, alias.name.as_str()), (EntityKind::UsingDecl, "fs"));
        let linkage = classify("extern \"C\"", true, EntityKind::Root, "");
        assert_eq!(linkage.kind, EntityKind::Namespace);
    }

    #[test]
    fn records_and_forward_declarations() {
        let c = classify(
            "class MYLIB_EXPORT Widget final : public Base<int>",
            true,
            EntityKind::Root,
            "",
        );
        assert_eq!((c.kind, c.name.as_str()), (EntityKind::Class, "Widget"));
        assert!(c.modifiers.is_final);
        let fwd = at_ns("struct Node");
        assert_eq!((fwd.kind, fwd.name.as_str()), (EntityKind::Struct, "Node"));
        let t = classify("template <typename T> class Box", true, EntityKind::Root, "");
        assert!(t.modifiers.is_template);
        assert_eq!(t.name, "Box");
    }

    #[test]
    fn elaborated_variable_is_not_a_record() {
        let v = at_ns("struct stat buf");
        assert_eq!((v.kind, v.name.as_str()), (EntityKind::Variable, "buf"));
    }

    #[test]
    fn enums() {
        let e = classify("enum class Color : uint8_t", true, EntityKind::Root, "");
        assert_eq!((e.kind, e.name.as_str()), (EntityKind::Enum, "Color"));
        let anon = classify("typedef enum", true, EntityKind::Root, "");
        assert_eq!((anon.kind, anon.name.as_str()), (EntityKind::Enum, ""));
    }

    #[test]
    fn constructors_and_destructors() {
        let c = classify("explicit Widget(int size)", false, EntityKind::Class, "Widget");
        assert_eq!((c.kind, c.name.as_str()), (EntityKind::Constructor, "Widget"));
        assert!(c.modifiers.is_explicit);
        let d = classify("virtual ~Widget() = default", false, EntityKind::Class, "Widget");
        assert_eq!((d.kind, d.name.as_str()), (EntityKind::Destructor, "~Widget"));
        assert!(d.modifiers.is_virtual && d.modifiers.is_defaulted);
        let out = at_ns("Widget::~Widget()");
        assert_eq!((out.kind, out.name.as_str()), (EntityKind::Destructor, "Widget::~Widget"));
    }

    #[test]
    fn functions_and_methods() {
        let f = at_ns("static inline int add(int a, int b) noexcept");
        assert_eq!((f.kind, f.name.as_str()), (EntityKind::Function, "add"));
        assert!(f.modifiers.is_static && f.modifiers.is_inline && f.modifiers.is_noexcept);
        let m =
            classify("virtual std::string name() const override", false, EntityKind::Class, "W");
        assert_eq!((m.kind, m.name.as_str()), (EntityKind::Method, "name"));
        assert!(m.modifiers.is_const && m.modifiers.is_override && m.modifiers.is_virtual);
        let pure = classify("virtual void run() = 0", false, EntityKind::Struct, "W");
        assert!(pure.modifiers.is_pure);
        let q = at_ns("void Widget::resize(int w)");
        assert_eq!(q.name, "Widget::resize");
    }

    #[test]
    fn operators() {
        let eq = classify("bool operator==(const W& other) const", false, EntityKind::Class, "W");
        assert_eq!(eq.name, "operator==");
        let call = classify("int operator()(int x)", false, EntityKind::Class, "W");
        assert_eq!(call.name, "operator()");
        let conv = classify("explicit operator bool() const", false, EntityKind::Class, "W");
        assert_eq!(conv.name, "operator bool");
    }

    #[test]
    fn friend_functions_are_not_methods() {
        let src = "friend std::ostream& operator<<(std::ostream& os, const D& d)";
        let out = classify(src, false, EntityKind::Class, "D");
        assert_eq!((out.kind, out.name.as_str()), (EntityKind::Function, "operator<<"));
        assert!(out.modifiers.is_friend);
        let swap = classify("friend void swap(D& a, D& b) noexcept", true, EntityKind::Class, "D");
        assert_eq!((swap.kind, swap.name.as_str()), (EntityKind::Function, "swap"));
    }

    #[test]
    fn typedefs_and_usings() {
        let fp = at_ns("typedef void (*callback_t)(int)");
        assert_eq!((fp.kind, fp.name.as_str()), (EntityKind::Typedef, "callback_t"));
        let plain = at_ns("typedef unsigned long ulong");
        assert_eq!(plain.name, "ulong");
        let alias = at_ns("using Map = std::map<int, int>");
        assert_eq!((alias.kind, alias.name.as_str()), (EntityKind::UsingDecl, "Map"));
        let ns = at_ns("using namespace std");
        assert_eq!(ns.name, "std");
    }

    #[test]
    fn variables_and_fields() {
        let v = at_ns("static constexpr int kMax = 10");
        assert_eq!((v.kind, v.name.as_str()), (EntityKind::Variable, "kMax"));
        assert!(v.modifiers.is_static && v.modifiers.is_constexpr);
        let f = classify("std::map<int, int> index_", false, EntityKind::Class, "C");
        assert_eq!((f.kind, f.name.as_str()), (EntityKind::Field, "index_"));
        let arr = classify("char buffer[64]", false, EntityKind::Struct, "S");
        assert_eq!(arr.name, "buffer");
        let cb = at_ns("void (*on_event)(int)");
        assert_eq!((cb.kind, cb.name.as_str()), (EntityKind::Variable, "on_event"));
        let direct = at_ns("Widget w(42)");
        assert_eq!((direct.kind, direct.name.as_str()), (EntityKind::Variable, "w"));
    }

    #[test]
    fn function_pointer_type_in_template_is_a_field() {
        let f = classify("std::function<void(int)> handler", false, EntityKind::Class, "C");
        assert_eq!((f.kind, f.name.as_str()), (EntityKind::Field, "handler"));
    }

    #[test]
    fn attributes_are_ignored() {
        let f = at_ns("[[nodiscard]] int compute()");
        assert_eq!((f.kind, f.name.as_str()), (EntityKind::Function, "compute"));
    }

    #[test]
    fn macro_invocation_is_unknown() {
        assert_eq!(at_ns("Q_DECLARE_METATYPE(Foo)").kind, EntityKind::Unknown);
    }
}
