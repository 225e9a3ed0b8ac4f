//! In-memory document tree: elements, text, navigation and mutation.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! copyable [`NodeId`] indices. Detached nodes stay in the arena, so ids
//! handed out during matching remain valid for the whole run.

use indexmap::IndexMap;

/// Index of a node in its [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

/// An element node. Attribute names are stored lowercased; lookup is
/// case-insensitive on the name, exact on the value.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    attrs: IndexMap<String, String>,
    /// Set by `display: none`; the subtree is skipped at serialization
    /// but stays structurally present until then.
    pub suppressed: bool,
}

impl ElementData {
    pub fn new<I, S>(name: &str, attrs: I) -> ElementData
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let attrs = attrs
            .into_iter()
            .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
            .collect();
        ElementData {
            name: name.to_ascii_lowercase(),
            attrs,
            suppressed: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(&name.to_ascii_lowercase()).map(|v| &**v)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let _ = self.attrs.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Whitespace-separated token match on the `class` attribute.
    pub fn has_class(&self, token: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|t| t == token))
            .unwrap_or(false)
    }
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena document tree. The root is a synthetic element that never takes
/// part in selector matching.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Document {
        Document {
            nodes: vec![Node {
                data: NodeData::Element(ElementData::new("#document", Vec::<(String, String)>::new())),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element<I, S>(&mut self, name: &str, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        self.push(NodeData::Element(ElementData::new(name, attrs)))
    }

    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(value.into()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()].data
    }

    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.index()].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.index()].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeData::Text(t) = &mut self.nodes[id.index()].data {
            *t = value.into();
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Parent, provided it is a real element (the synthetic root is not).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id)
            .filter(|&p| p != self.root() && self.as_element(p).is_some())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Detach a node from its parent. The node keeps its subtree and stays
    /// valid; it simply no longer appears anywhere in the tree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != id);
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(0, child);
    }

    fn sibling_offset(&self, id: NodeId, back: bool) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        if back {
            pos.checked_sub(1).map(|p| siblings[p])
        } else {
            siblings.get(pos + 1).copied()
        }
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling_offset(id, true)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling_offset(id, false)
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.prev_sibling(id);
        while let Some(s) = cur {
            if self.as_element(s).is_some() {
                return Some(s);
            }
            cur = self.prev_sibling(s);
        }
        None
    }

    /// Nearest following sibling that is an element.
    pub fn next_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.next_sibling(id);
        while let Some(s) = cur {
            if self.as_element(s).is_some() {
                return Some(s);
            }
            cur = self.next_sibling(s);
        }
        None
    }

    /// Preorder traversal of the subtree rooted at `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// All elements in document order, excluding the synthetic root.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&n| self.as_element(n).is_some())
            .collect()
    }

    pub fn descendant_text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.as_text(n).is_some())
            .collect()
    }

    /// The element's leading text run: its first text child, provided no
    /// element child comes before it.
    pub fn leading_text_run(&self, id: NodeId) -> Option<NodeId> {
        for &child in self.children(id) {
            match self.data(child) {
                NodeData::Text(_) => return Some(child),
                NodeData::Element(_) => return None,
            }
        }
        None
    }

    /// Concatenated text of the subtree, ignoring suppression.
    pub fn text_contents(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.as_text(id) {
            out.push_str(t);
        }
        for n in self.descendants(id) {
            if let Some(t) = self.as_text(n) {
                out.push_str(t);
            }
        }
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div", [("CLASS", "outer box")]);
        doc.append(root, div);
        let hello = doc.create_text("hello ");
        doc.append(div, hello);
        let span = doc.create_element("span", [("id", "x")]);
        doc.append(div, span);
        (doc, root, div, span)
    }

    #[test]
    fn attrs_are_case_insensitive_on_name() {
        let (doc, _, div, _) = sample();
        let el = doc.as_element(div).unwrap();
        assert_eq!(el.attr("class"), Some("outer box"));
        assert_eq!(el.attr("Class"), Some("outer box"));
        assert!(el.has_class("box"));
        assert!(!el.has_class("out"));
    }

    #[test]
    fn leading_text_run_stops_at_first_element() {
        let (doc, _, div, _) = sample();
        let run = doc.leading_text_run(div).unwrap();
        assert_eq!(doc.as_text(run), Some("hello "));

        // An element child before any text means there is no leading run.
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p", Vec::<(&str, &str)>::new());
        doc.append(root, p);
        let b = doc.create_element("b", Vec::<(&str, &str)>::new());
        doc.append(p, b);
        let t = doc.create_text("after");
        doc.append(p, t);
        assert!(doc.leading_text_run(p).is_none());
    }

    #[test]
    fn detach_and_reattach() {
        let (mut doc, root, div, span) = sample();
        doc.detach(span);
        assert!(doc.parent(span).is_none());
        assert_eq!(doc.children(div).len(), 1);

        doc.append(root, span);
        assert_eq!(doc.parent(span), Some(root));
        assert_eq!(doc.children(root), &[div, span]);
    }

    #[test]
    fn sibling_navigation_skips_text() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a", Vec::<(&str, &str)>::new());
        let ws = doc.create_text("\n  ");
        let b = doc.create_element("b", Vec::<(&str, &str)>::new());
        doc.append(root, a);
        doc.append(root, ws);
        doc.append(root, b);

        assert_eq!(doc.prev_sibling(b), Some(ws));
        assert_eq!(doc.prev_sibling_element(b), Some(a));
        assert_eq!(doc.next_sibling_element(a), Some(b));
    }

    #[test]
    fn text_contents_concatenates_in_order() {
        let (mut doc, _, div, span) = sample();
        let t = doc.create_text("world");
        doc.append(span, t);
        assert_eq!(doc.text_contents(div), "hello world");
    }
}
