//! Compound selectors: parsing and right-to-left matching.
//!
//! The vocabulary is closed, so selectors are plain tagged variants rather
//! than anything pluggable. No specificity: rule order alone decides.

use std::fmt;

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    /// `[a]`
    Exists,
    /// `[a=v]`
    Equals(String),
    /// `[a^=v]`
    Prefix(String),
    /// `[a$=v]`
    Suffix(String),
    /// `[a*=v]`
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, op: AttrOp },
}

impl SimpleSelector {
    fn matches(&self, doc: &Document, el: NodeId) -> bool {
        let data = match doc.as_element(el) {
            Some(d) => d,
            None => return false,
        };
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(name) => data.name.eq_ignore_ascii_case(name),
            SimpleSelector::Id(id) => data.attr("id") == Some(id.as_str()),
            SimpleSelector::Class(c) => data.has_class(c),
            SimpleSelector::Attr { name, op } => match (data.attr(name), op) {
                (Some(_), AttrOp::Exists) => true,
                (Some(v), AttrOp::Equals(want)) => v == want,
                (Some(v), AttrOp::Prefix(want)) => v.starts_with(want),
                (Some(v), AttrOp::Suffix(want)) => v.ends_with(want),
                (Some(v), AttrOp::Contains(want)) => v.contains(want),
                (None, _) => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: immediate parent.
    Child,
    /// `+`: immediately preceding element sibling.
    Adjacent,
    /// `~`: any preceding element sibling.
    Sibling,
}

/// Insertion slot selected by `:before` / `:after`. Does not affect
/// whether an element matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pseudo {
    #[default]
    None,
    Before,
    After,
}

/// One compound step: the combinator linking it to the step on its left,
/// plus its simple selectors. The first step's combinator is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorStep {
    pub combinator: Combinator,
    pub simples: Vec<SimpleSelector>,
}

impl SelectorStep {
    fn matches(&self, doc: &Document, el: NodeId) -> bool {
        self.simples.iter().all(|s| s.matches(doc, el))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub steps: Vec<SelectorStep>,
    pub pseudo: Pseudo,
}

impl Selector {
    /// Whether `el` matches, walking the compound right-to-left.
    pub fn matches(&self, doc: &Document, el: NodeId) -> bool {
        self.matches_step(doc, self.steps.len() - 1, el)
    }

    fn matches_step(&self, doc: &Document, idx: usize, el: NodeId) -> bool {
        if !self.steps[idx].matches(doc, el) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.steps[idx].combinator {
            Combinator::Child => doc
                .parent_element(el)
                .is_some_and(|p| self.matches_step(doc, idx - 1, p)),
            Combinator::Descendant => {
                let mut cur = doc.parent_element(el);
                while let Some(p) = cur {
                    if self.matches_step(doc, idx - 1, p) {
                        return true;
                    }
                    cur = doc.parent_element(p);
                }
                false
            }
            Combinator::Adjacent => doc
                .prev_sibling_element(el)
                .is_some_and(|s| self.matches_step(doc, idx - 1, s)),
            Combinator::Sibling => {
                let mut cur = doc.prev_sibling_element(el);
                while let Some(s) = cur {
                    if self.matches_step(doc, idx - 1, s) {
                        return true;
                    }
                    cur = doc.prev_sibling_element(s);
                }
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "selector parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

/// Parse one compound selector, e.g. `div.chapter > span[lang=grc]:after`.
pub fn parse(input: &str) -> Result<Selector, ParseError> {
    Parser::new(input).parse_selector()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    src: &'a str,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Parser<'a> {
        Parser {
            chars: src.chars().peekable(),
            src,
        }
    }

    fn err(&self, msg: &str) -> ParseError {
        ParseError(format!("{} in {:?}", msg, self.src))
    }

    fn skip_ws(&mut self) -> bool {
        let mut seen = false;
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            let _ = self.chars.next();
            seen = true;
        }
        seen
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                out.push(c);
                let _ = self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn parse_selector(&mut self) -> Result<Selector, ParseError> {
        let mut steps = Vec::new();
        let mut pseudo = Pseudo::None;
        self.skip_ws();

        let mut combinator = Combinator::Descendant;
        loop {
            let (simples, p) = self.parse_compound()?;
            if simples.is_empty() {
                return Err(self.err("expected a simple selector"));
            }
            if pseudo != Pseudo::None {
                return Err(self.err("pseudo-element must come last"));
            }
            pseudo = p;
            steps.push(SelectorStep {
                combinator,
                simples,
            });

            let ws = self.skip_ws();
            combinator = match self.chars.peek().copied() {
                None => break,
                Some('>') => {
                    let _ = self.chars.next();
                    Combinator::Child
                }
                Some('+') => {
                    let _ = self.chars.next();
                    Combinator::Adjacent
                }
                Some('~') => {
                    let _ = self.chars.next();
                    Combinator::Sibling
                }
                Some(_) if ws => Combinator::Descendant,
                Some(c) => return Err(self.err(&format!("unexpected character {c:?}"))),
            };
            self.skip_ws();
        }

        if steps.is_empty() {
            return Err(self.err("empty selector"));
        }
        Ok(Selector { steps, pseudo })
    }

    /// One compound: `tag#id.class[attr=v]:after` etc.
    fn parse_compound(&mut self) -> Result<(Vec<SimpleSelector>, Pseudo), ParseError> {
        let mut simples = Vec::new();
        let mut pseudo = Pseudo::None;

        loop {
            match self.chars.peek().copied() {
                Some('*') => {
                    let _ = self.chars.next();
                    simples.push(SimpleSelector::Universal);
                }
                Some('#') => {
                    let _ = self.chars.next();
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.err("empty id selector"));
                    }
                    simples.push(SimpleSelector::Id(id));
                }
                Some('.') => {
                    let _ = self.chars.next();
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.err("empty class selector"));
                    }
                    simples.push(SimpleSelector::Class(class));
                }
                Some('[') => {
                    let _ = self.chars.next();
                    simples.push(self.parse_attr()?);
                }
                Some(':') => {
                    let _ = self.chars.next();
                    if self.chars.peek() == Some(&':') {
                        let _ = self.chars.next();
                    }
                    pseudo = match self.ident().as_str() {
                        "before" => Pseudo::Before,
                        "after" => Pseudo::After,
                        other => {
                            return Err(self.err(&format!("unsupported pseudo-element {other:?}")))
                        }
                    };
                    // Nothing may follow the pseudo-element within a compound.
                    match self.chars.peek().copied() {
                        None => break,
                        Some(c) if c.is_whitespace() => break,
                        Some('>') | Some('+') | Some('~') => {
                            return Err(self.err("pseudo-element must come last"))
                        }
                        Some(c) => {
                            return Err(self
                                .err(&format!("unexpected character {c:?} after pseudo-element")))
                        }
                    }
                }
                Some(c) if c.is_alphanumeric() || c == '_' => {
                    let tag = self.ident();
                    if !simples.is_empty() {
                        return Err(self.err("type selector must come first"));
                    }
                    simples.push(SimpleSelector::Tag(tag.to_ascii_lowercase()));
                }
                _ => break,
            }
        }

        Ok((simples, pseudo))
    }

    fn parse_attr(&mut self) -> Result<SimpleSelector, ParseError> {
        self.skip_ws();
        let name = self.ident();
        if name.is_empty() {
            return Err(self.err("empty attribute name"));
        }
        self.skip_ws();

        let op_char = match self.chars.peek().copied() {
            Some(']') => {
                let _ = self.chars.next();
                return Ok(SimpleSelector::Attr {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some(c) if c == '=' || c == '^' || c == '$' || c == '*' => {
                let _ = self.chars.next();
                c
            }
            _ => return Err(self.err("malformed attribute selector")),
        };
        if op_char != '=' && self.chars.next() != Some('=') {
            return Err(self.err("malformed attribute operator"));
        }
        self.skip_ws();

        let value = match self.chars.peek() {
            Some(&q) if q == '"' || q == '\'' => {
                let _ = self.chars.next();
                let mut v = String::new();
                loop {
                    match self.chars.next() {
                        Some(c) if c == q => break,
                        Some('\\') => {
                            if let Some(c) = self.chars.next() {
                                v.push(c);
                            }
                        }
                        Some(c) => v.push(c),
                        None => return Err(self.err("unterminated attribute value")),
                    }
                }
                v
            }
            _ => {
                let mut v = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c == ']' || c.is_whitespace() {
                        break;
                    }
                    v.push(c);
                    let _ = self.chars.next();
                }
                v
            }
        };
        self.skip_ws();
        if self.chars.next() != Some(']') {
            return Err(self.err("unterminated attribute selector"));
        }

        let op = match op_char {
            '=' => AttrOp::Equals(value),
            '^' => AttrOp::Prefix(value),
            '$' => AttrOp::Suffix(value),
            '*' => AttrOp::Contains(value),
            _ => unreachable!(),
        };
        Ok(SimpleSelector::Attr { name, op })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn doc() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        // <div class="figcenter a"><p id="p1">x</p><span lang="grc">y</span></div>
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div", [("class", "figcenter a")]);
        doc.append(root, div);
        let p = doc.create_element("p", [("id", "p1")]);
        doc.append(div, p);
        let span = doc.create_element("span", [("lang", "grc")]);
        doc.append(div, span);
        (doc, root, div, p, span)
    }

    fn matches(sel: &str, doc: &Document, el: NodeId) -> bool {
        parse(sel).unwrap().matches(doc, el)
    }

    #[test]
    fn simple_selectors() {
        let (doc, _, div, p, span) = doc();
        assert!(matches("div", &doc, div));
        assert!(matches("DIV", &doc, div));
        assert!(matches("*", &doc, span));
        assert!(matches(".figcenter", &doc, div));
        assert!(!matches(".fig", &doc, div));
        assert!(matches("#p1", &doc, p));
        assert!(matches("[lang]", &doc, span));
        assert!(matches("[lang=grc]", &doc, span));
        assert!(matches("[class^=fig]", &doc, div));
        assert!(matches("[class$=a]", &doc, div));
        assert!(matches("[class*=center]", &doc, div));
        assert!(!matches("[lang=el]", &doc, span));
    }

    #[test]
    fn combinators() {
        let (doc, _, div, p, span) = doc();
        assert!(matches("div p", &doc, p));
        assert!(matches("div > p", &doc, p));
        assert!(!matches("p > span", &doc, span));
        assert!(matches("p + span", &doc, span));
        assert!(matches("p ~ span", &doc, span));
        assert!(!matches("span + p", &doc, p));
        assert!(!matches("div div", &doc, div));
    }

    #[test]
    fn pseudo_elements_do_not_affect_matching() {
        let (doc, _, div, ..) = doc();
        let sel = parse("div:before").unwrap();
        assert_eq!(sel.pseudo, Pseudo::Before);
        assert!(sel.matches(&doc, div));

        let sel = parse("div::after").unwrap();
        assert_eq!(sel.pseudo, Pseudo::After);
    }

    #[test]
    fn parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("div:hover").is_err());
        assert!(parse("div:before.x").is_err());
        assert!(parse("[=v]").is_err());
        assert!(parse("div >").is_err());
        assert!(parse("..a").is_err());
    }

    #[test]
    fn quoted_attribute_values() {
        let sel = parse(r#"span[class^="pagenum"]"#).unwrap();
        assert_eq!(
            sel.steps[0].simples,
            vec![
                SimpleSelector::Tag("span".into()),
                SimpleSelector::Attr {
                    name: "class".into(),
                    op: AttrOp::Prefix("pagenum".into()),
                }
            ]
        );
    }
}
