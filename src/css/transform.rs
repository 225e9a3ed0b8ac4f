//! Applies parsed rules to the document tree, strictly in rule order.
//!
//! The match set for a rule is snapshotted before any of its declarations
//! run, so a rule that re-parents elements still sees a consistent view.
//! Application is not transactional: a failing declaration is logged and
//! skipped, and partial effects stay visible to later rules.

use log::warn;

use super::parser::{Case, Declaration, GraftStep, Rule, Stylesheet, Value};
use super::selector::Pseudo;
use crate::dom::{Document, NodeId};

pub fn apply_stylesheet(doc: &mut Document, sheet: &Stylesheet) {
    for rule in &sheet.rules {
        apply_rule(doc, rule);
    }
}

fn apply_rule(doc: &mut Document, rule: &Rule) {
    // Snapshot (element, slot) pairs up front. An element matched by both
    // the :before and :after selector of one rule gets both applications,
    // but never the same slot twice.
    let mut matched: Vec<(NodeId, Pseudo)> = Vec::new();
    for el in doc.elements() {
        for sel in &rule.selectors {
            if sel.matches(doc, el) && !matched.contains(&(el, sel.pseudo)) {
                matched.push((el, sel.pseudo));
            }
        }
    }

    for (el, pseudo) in matched {
        for decl in &rule.declarations {
            apply_declaration(doc, el, pseudo, decl);
        }
    }
}

fn apply_declaration(doc: &mut Document, el: NodeId, pseudo: Pseudo, decl: &Declaration) {
    match decl {
        Declaration::Content(values) => {
            let text = concat_values(doc, el, values);
            match pseudo {
                Pseudo::None => set_leading_text(doc, el, text),
                Pseudo::Before => {
                    let t = doc.create_text(text);
                    doc.prepend(el, t);
                }
                Pseudo::After => {
                    let t = doc.create_text(text);
                    doc.append(el, t);
                }
            }
        }
        Declaration::TextTransform(case) => {
            for id in doc.descendant_text_nodes(el) {
                let transformed = transform_case(doc.as_text(id).unwrap_or(""), *case);
                doc.set_text(id, transformed);
            }
        }
        Declaration::TextReplace {
            needle,
            replacement,
        } => {
            for id in doc.descendant_text_nodes(el) {
                if let Some(t) = doc.as_text(id) {
                    if t.contains(needle.as_str()) {
                        let replaced = t.replace(needle.as_str(), replacement);
                        doc.set_text(id, replaced);
                    }
                }
            }
        }
        Declaration::DisplayNone => {
            if let Some(data) = doc.as_element_mut(el) {
                data.suppressed = true;
            }
        }
        Declaration::ReplaceWithAttr(name) => {
            let value = doc
                .as_element(el)
                .and_then(|d| d.attr(name))
                .unwrap_or("")
                .to_string();
            set_leading_text(doc, el, value);
        }
        Declaration::Graft(steps) => {
            if let Err(e) = graft(doc, el, steps) {
                warn!("_graft failed, element left in place: {e}");
            }
        }
    }
}

/// Concatenate a value list for the matched element.
fn concat_values(doc: &Document, el: NodeId, values: &[Value]) -> String {
    let mut out = String::new();
    for v in values {
        match v {
            Value::Str(s) | Value::Ident(s) => out.push_str(s),
            Value::Attr(name) => {
                if let Some(value) = doc.as_element(el).and_then(|d| d.attr(name)) {
                    out.push_str(value);
                }
            }
            Value::Content => {
                if let Some(run) = doc.leading_text_run(el) {
                    out.push_str(doc.as_text(run).unwrap_or(""));
                }
            }
        }
    }
    out
}

/// Replace the element's leading text run, creating one if absent.
fn set_leading_text(doc: &mut Document, el: NodeId, text: String) {
    match doc.leading_text_run(el) {
        Some(run) => doc.set_text(run, text),
        None => {
            let t = doc.create_text(text);
            doc.prepend(el, t);
        }
    }
}

fn transform_case(text: &str, case: Case) -> String {
    match case {
        Case::Uppercase => text.to_uppercase(),
        Case::Lowercase => text.to_lowercase(),
        Case::Capitalize => capitalize_words(text),
    }
}

/// Uppercase the first alphabetic code point of each whitespace-delimited
/// word, lowercase the rest.
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut seen_alpha = false;
    for c in text.chars() {
        if c.is_whitespace() {
            seen_alpha = false;
            out.push(c);
        } else if c.is_alphabetic() {
            if seen_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
                seen_alpha = true;
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Detach the element and re-attach it as the last child of the node
/// reached by the step path. The path is resolved before detaching, with
/// sibling steps taken against the original sibling list.
fn graft(doc: &mut Document, el: NodeId, steps: &[GraftStep]) -> Result<(), String> {
    let mut cur = el;
    for step in steps {
        cur = match step {
            GraftStep::Parent => doc
                .parent(cur)
                .ok_or("no parent to step to")?,
            GraftStep::PrevSibling => doc
                .prev_sibling_element(cur)
                .ok_or("no previous sibling to step to")?,
            GraftStep::NextSibling => doc
                .next_sibling_element(cur)
                .ok_or("no next sibling to step to")?,
        };
    }
    if cur == el {
        return Err("step path resolves to the element itself".into());
    }
    if doc.as_element(cur).is_none() {
        return Err("step path resolves to a text node".into());
    }
    doc.detach(el);
    doc.append(cur, el);
    Ok(())
}
