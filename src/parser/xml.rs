//! Arena-backed element tree for problem markup
//!
//! Nodes are addressed by [`NodeId`] indices into one vector. Detaching a
//! node only unlinks it from its parent, so ids handed out earlier stay valid
//! for the lifetime of the document.

use crate::models::MarkupError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed markup of one problem
#[derive(Debug, Clone)]
pub struct MarkupDocument {
    nodes: Vec<Node>,
    root: NodeId,
}

impl MarkupDocument {
    /// Parse well-formed XML into a tree
    ///
    /// Comments, processing instructions and the XML declaration are dropped.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(false);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            let position = reader.buffer_position() as u64;
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let id = open_element(&mut nodes, &stack, &mut root, e, position)?;
                    stack.push(id);
                }
                Ok(Event::Empty(ref e)) => {
                    open_element(&mut nodes, &stack, &mut root, e, position)?;
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                    push_text(&mut nodes, &stack, text)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_text(&mut nodes, &stack, text)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MarkupError::Syntax {
                        position,
                        message: e.to_string(),
                    })
                }
                _ => {}
            }
        }

        if let Some(&open) = stack.last() {
            let tag = match &nodes[open].data {
                NodeData::Element { tag, .. } => tag.clone(),
                NodeData::Text(_) => String::new(),
            };
            return Err(MarkupError::Unclosed(tag));
        }

        let root = root.ok_or(MarkupError::Empty)?;
        Ok(Self { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Tag name of an element, `None` for text nodes
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag(id) == Some(name)
    }

    pub fn set_tag(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { tag, .. } = &mut self.nodes[id].data {
            *tag = name.to_string();
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, keeping the position of an existing one
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id].data {
            let value = value.into();
            match attributes.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value,
                None => attributes.push((name.to_string(), value)),
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Element children in document order
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&child| self.tag(child).is_some())
            .collect()
    }

    pub fn children_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&child| self.is_tag(child, name))
            .collect()
    }

    /// First element child with the given tag
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&child| self.is_tag(child, name))
    }

    /// Elements below `id` (excluding `id`) whose tag is in `names`, document order
    pub fn descendants_named(&self, id: NodeId, names: &[&str]) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(node) = pending.pop() {
            if let Some(tag) = self.tag(node) {
                if names.contains(&tag) {
                    found.push(node);
                }
                pending.extend(self.nodes[node].children.iter().rev().copied());
            }
        }
        found
    }

    /// Attached elements whose tag is in `names`, root included, document order
    pub fn find_all(&self, names: &[&str]) -> Vec<NodeId> {
        let mut found = Vec::new();
        if let Some(tag) = self.tag(self.root) {
            if names.contains(&tag) {
                found.push(self.root);
            }
        }
        found.extend(self.descendants_named(self.root, names));
        found
    }

    /// The element immediately preceding `id` among its siblings
    pub fn preceding_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&sibling| sibling == id)?;
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .find(|&sibling| self.tag(sibling).is_some())
    }

    /// Leading text of an element, before its first child element
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let first = *self.nodes[id].children.first()?;
        match &self.nodes[first].data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    /// Replace the leading text of an element; an empty string removes it
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let leading = self.nodes[id]
            .children
            .first()
            .copied()
            .filter(|&first| self.tag(first).is_none());

        match (leading, text.is_empty()) {
            (Some(node), true) => {
                self.nodes[id].children.remove(0);
                self.nodes[node].parent = None;
            }
            (Some(node), false) => self.nodes[node].data = NodeData::Text(text.to_string()),
            (None, true) => {}
            (None, false) => {
                let node = self.nodes.len();
                self.nodes.push(Node {
                    data: NodeData::Text(text.to_string()),
                    parent: Some(id),
                    children: Vec::new(),
                });
                self.nodes[id].children.insert(0, node);
            }
        }
    }

    /// Text of direct text children only, skipping nested elements
    pub fn own_text(&self, id: NodeId) -> String {
        self.nodes[id]
            .children
            .iter()
            .filter_map(|&child| match &self.nodes[child].data {
                NodeData::Text(text) => Some(text.as_str()),
                NodeData::Element { .. } => None,
            })
            .collect()
    }

    /// All descendant text with tags stripped
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &[], &mut out);
        out
    }

    /// Descendant text, skipping subtrees rooted at any tag in `skip`
    pub fn text_without(&self, id: NodeId, skip: &[&str]) -> String {
        let mut out = String::new();
        self.collect_text(id, skip, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, skip: &[&str], out: &mut String) {
        for &child in &self.nodes[id].children {
            match &self.nodes[child].data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element { tag, .. } => {
                    if !skip.contains(&tag.as_str()) {
                        self.collect_text(child, skip, out);
                    }
                }
            }
        }
    }

    /// Serialized content of an element: its text plus child markup
    pub fn inner_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in &self.nodes[id].children {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Unlink a node from its parent
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
        }
        current == self.root
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push_str(&format!(r#" {}="{}""#, key, escape_attr(value)));
                }
                if self.nodes[id].children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &self.nodes[id].children {
                    self.write_node(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

fn open_element(
    nodes: &mut Vec<Node>,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    start: &BytesStart,
    position: u64,
) -> Result<NodeId, MarkupError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| MarkupError::Syntax {
            position,
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attributes.push((key, value));
    }

    let parent = stack.last().copied();
    if parent.is_none() && root.is_some() {
        return Err(MarkupError::OutsideRoot);
    }

    let id = nodes.len();
    nodes.push(Node {
        data: NodeData::Element { tag, attributes },
        parent,
        children: Vec::new(),
    });
    match parent {
        Some(parent) => nodes[parent].children.push(id),
        None => *root = Some(id),
    }
    Ok(id)
}

fn push_text(nodes: &mut Vec<Node>, stack: &[NodeId], text: String) -> Result<(), MarkupError> {
    let Some(&parent) = stack.last() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(MarkupError::OutsideRoot);
    };

    if let Some(&last) = nodes[parent].children.last() {
        if let NodeData::Text(existing) = &mut nodes[last].data {
            existing.push_str(&text);
            return Ok(());
        }
    }

    let id = nodes.len();
    nodes.push(Node {
        data: NodeData::Text(text),
        parent: Some(parent),
        children: Vec::new(),
    });
    nodes[parent].children.push(id);
    Ok(())
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}
