//! HTML lowering: parse with the external HTML parser, run the transform
//! engine over the combined stylesheet, then serialize to flat text.

use itertools::Itertools;
use kuchikiki::traits::TendrilSink;
use kuchikiki::{NodeData as HtmlNodeData, NodeRef};
use log::warn;
use regex::Regex;

use crate::css::{self, Stylesheet};
use crate::dom::{Document, NodeData, NodeId};
use crate::footnotes;
use crate::{CompareOptions, SideOutput, SmcapStyle};

/// Page-number stripping defaults; suppressed by `--css-no-default`.
pub const DEFAULT_CSS: &str = r#"
span[class^="pagenum"], p[class^="pagenum"], div[class^="pagenum"] { display: none; }
span[class^="pageno"], p[class^="pageno"], div[class^="pageno"] { display: none; }
p[class^="page"] { display: none; }
span[class^="pgnum"] { display: none; }
div[id^="Page_"] { display: none; }
"#;

/// Inline-tag sentinels, always applied; only the bold marker is
/// configurable (`--css-bold`).
fn sentinel_css(bold: &str) -> String {
    format!(
        "i:before, i:after, em:before, em:after, cite:before, cite:after {{ content: \"_\"; }}\n\
         b:before, b:after {{ content: \"{bold}\"; }}\n\
         sup:before {{ content: \"^{{\"; }}\n\
         sup:after {{ content: \"}}\"; }}\n\
         sub:before {{ content: \"_{{\"; }}\n\
         sub:after {{ content: \"}}\"; }}"
    )
}

/// Elements that end a line in the flat-text form.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li",
];

/// Subtrees that never contribute text.
const OPAQUE_ELEMENTS: &[&str] = &["head", "script", "style", "title"];

/// Lower an HTML input to its flat-text form, splitting footnotes out when
/// requested.
pub fn lower(html: &str, options: &CompareOptions) -> SideOutput {
    let mut doc = parse_document(html);

    let sheet = Stylesheet::parse(&combined_css(options));
    css::apply_stylesheet(&mut doc, &sheet);

    let blocks = if options.extract_footnotes {
        extract_footnote_blocks(&mut doc)
    } else {
        Vec::new()
    };

    let start = find_element(&doc, "body").unwrap_or_else(|| doc.root());
    let main = scrub_characters(serialize(&doc, start), options);
    let notes = blocks
        .into_iter()
        .map(|b| footnotes::canonicalize_block(&scrub_characters(b, options)))
        .join("\n");

    SideOutput {
        main,
        footnotes: notes,
    }
}

/// Assemble the full stylesheet text: defaults, sentinels, rules
/// synthesized from options, then user-supplied sheets in order.
fn combined_css(options: &CompareOptions) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !options.css_no_default {
        parts.push(DEFAULT_CSS.to_string());
    }
    parts.push(sentinel_css(options.css_bold.as_deref().unwrap_or("=")));

    if let Some(style) = options.css_smcap {
        let transform = match style {
            SmcapStyle::Uppercase => "uppercase",
            SmcapStyle::Lowercase => "lowercase",
            SmcapStyle::Title => "capitalize",
        };
        parts.push(format!(".smcap {{ text-transform: {transform}; }}"));
    }
    if options.css_add_illustration {
        parts.push(
            ".figcenter:before { content: \"[Illustration: \"; }\n\
             .figcenter:after { content: \"]\"; }"
                .to_string(),
        );
    }
    if options.css_add_sidenote {
        parts.push(
            ".sidenote:before { content: \"[Sidenote: \"; }\n\
             .sidenote:after { content: \"]\"; }"
                .to_string(),
        );
    }
    if options.css_greek_title_plus {
        parts.push("*[lang=grc] { content: \"+\" attr(title) \"+\"; }".to_string());
    }
    parts.extend(options.css.iter().cloned());

    parts.join("\n")
}

/// Convert the external parser's tree into the crate's document tree.
pub fn parse_document(html: &str) -> Document {
    let dom = kuchikiki::parse_html().one(html);
    let mut doc = Document::new();
    let root = doc.root();
    convert_children(&dom, &mut doc, root);
    doc
}

fn convert_children(node: &NodeRef, doc: &mut Document, parent: NodeId) {
    for child in node.children() {
        match child.data() {
            HtmlNodeData::Element(el) => {
                let attrs: Vec<(String, String)> = el
                    .attributes
                    .borrow()
                    .map
                    .iter()
                    .map(|(name, attr)| (name.local.to_string(), attr.value.clone()))
                    .collect();
                let id = doc.create_element(&el.name.local, attrs);
                doc.append(parent, id);
                convert_children(&child, doc, id);
            }
            HtmlNodeData::Text(t) => {
                let id = doc.create_text(t.borrow().clone());
                doc.append(parent, id);
            }
            HtmlNodeData::Document(_) | HtmlNodeData::DocumentFragment => {
                convert_children(&child, doc, parent);
            }
            HtmlNodeData::Comment(_)
            | HtmlNodeData::Doctype(_)
            | HtmlNodeData::ProcessingInstruction(_) => {}
        }
    }
}

pub fn find_element(doc: &Document, name: &str) -> Option<NodeId> {
    doc.elements()
        .into_iter()
        .find(|&el| doc.as_element(el).is_some_and(|d| d.name == name))
}

/// Depth-first in-order serialization. Suppressed subtrees are skipped;
/// text nodes are emitted verbatim; block-level elements end a line.
pub fn serialize(doc: &Document, start: NodeId) -> String {
    let mut out = String::new();
    serialize_node(doc, start, &mut out);
    out
}

fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Text(t) => out.push_str(t),
        NodeData::Element(el) => {
            if el.suppressed || OPAQUE_ELEMENTS.contains(&el.name.as_str()) {
                return;
            }
            for &child in doc.children(id) {
                serialize_node(doc, child, out);
            }
            if BLOCK_ELEMENTS.contains(&el.name.as_str()) {
                out.push('\n');
            }
        }
    }
}

/// Post-serialization character cleanup (always soft hyphen; zero-width
/// space and digit-flanked no-break space behind their options).
fn scrub_characters(text: String, options: &CompareOptions) -> String {
    let mut text = text.replace('\u{ad}', "");
    if options.ignore_0_space {
        text = text.replace('\u{200b}', "");
    }
    if options.suppress_nbsp_num {
        let re = Regex::new(r"(\d)\x{A0}(\d)").unwrap();
        while re.is_match(&text) {
            text = re.replace_all(&text, "${1}${2}").into_owned();
        }
    }
    text
}

/// Pull class/id-recognized footnote elements out of the tree, in document
/// order. Each block is serialized on its own; the element is suppressed so
/// the main stream skips it.
fn extract_footnote_blocks(doc: &mut Document) -> Vec<String> {
    let mut claimed: Vec<NodeId> = Vec::new();
    let mut blocks = Vec::new();

    for el in doc.elements() {
        let data = match doc.as_element(el) {
            Some(d) => d,
            None => continue,
        };
        let recognized = data.has_class("footnote")
            || data.attr("id").is_some_and(|id| id.starts_with("Footnote_"));
        if !recognized || hidden_or_claimed(doc, el, &claimed) {
            continue;
        }
        blocks.push(serialize(doc, el));
        claimed.push(el);
        if let Some(d) = doc.as_element_mut(el) {
            d.suppressed = true;
        }
    }
    if blocks.is_empty() {
        warn!("no footnote blocks recognized on this side");
    }
    blocks
}

/// True if the element sits inside a suppressed subtree or inside a block
/// that was already extracted.
fn hidden_or_claimed(doc: &Document, el: NodeId, claimed: &[NodeId]) -> bool {
    if doc.as_element(el).is_some_and(|d| d.suppressed) {
        return true;
    }
    let mut cur = doc.parent(el);
    while let Some(p) = cur {
        if claimed.contains(&p) {
            return true;
        }
        if doc.as_element(p).is_some_and(|d| d.suppressed) {
            return true;
        }
        cur = doc.parent(p);
    }
    false
}
