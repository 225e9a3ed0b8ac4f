//! Parser for the rule dialect driving the HTML lowering.
//!
//! `selector-list { property: value-list; ... }` with `/* */` comments,
//! quoted strings, `\uXXXX` escapes and the `attr(NAME)` / `content`
//! function forms. A rule with a bad selector is dropped; a bad
//! declaration is skipped. Either way a warning is logged and parsing
//! continues.

use log::warn;

use super::selector::{self, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Quoted string literal.
    Str(String),
    /// Bare identifier.
    Ident(String),
    /// `attr(NAME)`: the matched element's attribute, empty if absent.
    Attr(String),
    /// Bare `content`: the element's current leading text run.
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Uppercase,
    Lowercase,
    Capitalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraftStep {
    Parent,
    PrevSibling,
    NextSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Content(Vec<Value>),
    TextTransform(Case),
    TextReplace { needle: String, replacement: String },
    DisplayNone,
    ReplaceWithAttr(String),
    Graft(Vec<GraftStep>),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// An ordered list of rules. Later rules observe the tree as mutated by
/// earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Parse a stylesheet, recovering from per-rule errors.
    pub fn parse(input: &str) -> Stylesheet {
        let src = strip_comments(input);
        let mut rules = Vec::new();

        // Walk `prelude { block }` pairs, ignoring braces inside quoted
        // strings (sentinel values like "^{" appear in declarations).
        let mut prelude_start = 0;
        let mut block_start = None;
        let mut in_string: Option<char> = None;
        let mut escaped = false;
        for (i, c) in src.char_indices() {
            if let Some(q) = in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    in_string = None;
                }
                continue;
            }
            match c {
                '"' | '\'' => in_string = Some(c),
                '{' if block_start.is_none() => block_start = Some(i),
                '}' => {
                    if let Some(open) = block_start.take() {
                        let prelude = &src[prelude_start..open];
                        let block = &src[open + 1..i];
                        match parse_rule(prelude, block) {
                            Ok(rule) => rules.push(rule),
                            Err(e) => warn!("dropping rule {:?}: {}", prelude.trim(), e),
                        }
                        prelude_start = i + c.len_utf8();
                    }
                }
                _ => {}
            }
        }
        if block_start.is_some() {
            warn!("unterminated rule block, dropping remainder");
        } else if !src[prelude_start..].trim().is_empty() {
            warn!(
                "trailing input after last rule ignored: {:?}",
                src[prelude_start..].trim()
            );
        }

        Stylesheet { rules }
    }

    /// Concatenate another sheet's rules after this one's.
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }
}

fn parse_rule(prelude: &str, block: &str) -> Result<Rule, String> {
    let mut selectors = Vec::new();
    for part in prelude.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err("empty selector".into());
        }
        selectors.push(selector::parse(part).map_err(|e| e.to_string())?);
    }

    let mut declarations = Vec::new();
    for decl in block.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let (name, raw_value) = match decl.split_once(':') {
            Some((n, v)) => (n.trim(), v.trim()),
            None => {
                warn!("skipping malformed declaration {decl:?}");
                continue;
            }
        };
        match parse_declaration(name, raw_value) {
            Ok(d) => declarations.push(d),
            Err(e) => warn!("skipping declaration {decl:?}: {e}"),
        }
    }

    Ok(Rule {
        selectors,
        declarations,
    })
}

fn parse_declaration(name: &str, raw_value: &str) -> Result<Declaration, String> {
    let values = parse_values(raw_value)?;
    match name {
        "content" => {
            if values.is_empty() {
                return Err("content needs at least one value".into());
            }
            Ok(Declaration::Content(values))
        }
        "text-transform" => match values.as_slice() {
            [Value::Ident(kind)] => match kind.as_str() {
                "uppercase" => Ok(Declaration::TextTransform(Case::Uppercase)),
                "lowercase" => Ok(Declaration::TextTransform(Case::Lowercase)),
                "capitalize" => Ok(Declaration::TextTransform(Case::Capitalize)),
                other => Err(format!("unknown text-transform {other:?}")),
            },
            _ => Err("text-transform takes a single keyword".into()),
        },
        "text-replace" => match values.as_slice() {
            [a, b] => Ok(Declaration::TextReplace {
                needle: literal(a)?,
                replacement: literal(b)?,
            }),
            _ => Err("text-replace takes exactly two strings".into()),
        },
        "display" => match values.as_slice() {
            [Value::Ident(v)] if v == "none" => Ok(Declaration::DisplayNone),
            _ => Err("only display: none is honored".into()),
        },
        "_replace_with_attr" => match values.as_slice() {
            [v] => Ok(Declaration::ReplaceWithAttr(literal(v)?)),
            _ => Err("_replace_with_attr takes a single attribute name".into()),
        },
        "_graft" => {
            if values.is_empty() {
                return Err("_graft needs at least one step".into());
            }
            let mut steps = Vec::new();
            for v in &values {
                steps.push(match literal(v)?.as_str() {
                    "parent" => GraftStep::Parent,
                    "prev-sib" => GraftStep::PrevSibling,
                    "next-sib" => GraftStep::NextSibling,
                    other => return Err(format!("unknown _graft step {other:?}")),
                });
            }
            Ok(Declaration::Graft(steps))
        }
        other => Err(format!("unknown property {other:?}")),
    }
}

fn literal(value: &Value) -> Result<String, String> {
    match value {
        Value::Str(s) | Value::Ident(s) => Ok(s.clone()),
        other => Err(format!("expected a string, got {other:?}")),
    }
}

/// Split a declaration value into tokens: quoted strings, identifiers,
/// `attr(NAME)` and the bare `content` keyword.
fn parse_values(raw: &str) -> Result<Vec<Value>, String> {
    let mut values = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            let _ = chars.next();
        }
        let quote = match chars.peek() {
            None => break,
            Some(&q) if q == '"' || q == '\'' => {
                let _ = chars.next();
                Some(q)
            }
            _ => None,
        };

        if let Some(q) = quote {
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == q => break,
                    Some('\\') => s.push(unescape(&mut chars)?),
                    Some(c) => s.push(c),
                    None => return Err("unterminated string".into()),
                }
            }
            values.push(Value::Str(s));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' || c == '\'' {
                    break;
                }
                word.push(c);
                let _ = chars.next();
            }
            if let Some(name) = word.strip_prefix("attr(") {
                let name = name
                    .strip_suffix(')')
                    .ok_or_else(|| format!("malformed attr() in {word:?}"))?;
                values.push(Value::Attr(name.trim().to_string()));
            } else if word == "content" {
                values.push(Value::Content);
            } else {
                values.push(Value::Ident(word));
            }
        }
    }

    Ok(values)
}

/// Process the character after a backslash. `\uXXXX` takes exactly four
/// hex digits; anything else escapes to itself.
fn unescape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<char, String> {
    match chars.next() {
        Some('u') => {
            let mut code = 0u32;
            for _ in 0..4 {
                let d = chars
                    .next()
                    .and_then(|c| c.to_digit(16))
                    .ok_or("\\u escape needs four hex digits")?;
                code = code * 16 + d;
            }
            char::from_u32(code).ok_or_else(|| format!("\\u{code:04x} is not a scalar value"))
        }
        Some(c) => Ok(c),
        None => Err("dangling escape".into()),
    }
}

/// Remove `/* ... */` comments, leaving quoted strings untouched.
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string: Option<char> = None;

    while let Some(c) = chars.next() {
        match in_string {
            Some(q) => {
                out.push(c);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else if c == q {
                    in_string = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    in_string = Some(c);
                    out.push(c);
                } else if c == '/' && chars.peek() == Some(&'*') {
                    let _ = chars.next();
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}
