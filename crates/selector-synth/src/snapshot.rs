//! Offline DOM snapshot
//!
//! Parses HTML once with `scraper` and copies the tree into an owned arena so
//! elements can be shared across tasks. Arena indices follow document order.
//! The parsed document is kept next to the arena for css matching.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ego_tree::NodeId;
use parking_lot::Mutex;
use scraper::{ElementRef, Html};

use crate::dom::{DomChild, DomElement, SelectorQuery};
use crate::errors::SynthError;
use crate::query;

#[derive(Debug)]
pub(crate) enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<usize>,
    },
    Text(String),
}

#[derive(Debug)]
pub(crate) struct SnapshotNode {
    pub(crate) node: NodeId,
    pub(crate) parent: Option<usize>,
    pub(crate) data: NodeData,
}

#[derive(Debug)]
pub(crate) struct SnapshotTree {
    pub(crate) nodes: Vec<SnapshotNode>,
    pub(crate) html: Mutex<Html>,
    by_node: HashMap<NodeId, usize>,
}

impl SnapshotTree {
    pub(crate) const ROOT: usize = 0;

    pub(crate) fn is_element(&self, index: usize) -> bool {
        matches!(self.nodes[index].data, NodeData::Element { .. })
    }

    pub(crate) fn tag(&self, index: usize) -> &str {
        match &self.nodes[index].data {
            NodeData::Element { tag, .. } => tag,
            NodeData::Text(_) => "",
        }
    }

    pub(crate) fn attribute(&self, index: usize, name: &str) -> Option<&str> {
        match &self.nodes[index].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub(crate) fn children(&self, index: usize) -> &[usize] {
        match &self.nodes[index].data {
            NodeData::Element { children, .. } => children,
            NodeData::Text(_) => &[],
        }
    }

    pub(crate) fn element_children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.children(index)
            .iter()
            .copied()
            .filter(move |child| self.is_element(*child))
    }

    pub(crate) fn parent(&self, index: usize) -> Option<usize> {
        self.nodes[index].parent
    }

    pub(crate) fn node_id(&self, index: usize) -> NodeId {
        self.nodes[index].node
    }

    /// Arena index of a parsed element, `None` for nodes outside the arena
    pub(crate) fn index_of(&self, node: NodeId) -> Option<usize> {
        self.by_node.get(&node).copied()
    }

    /// Element indices strictly below `index`, in document order
    pub(crate) fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.element_children(index).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut kids: Vec<usize> = self.element_children(next).collect();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Text of direct text children, whitespace-collapsed
    pub(crate) fn own_text(&self, index: usize) -> String {
        let mut raw = String::new();
        for child in self.children(index) {
            if let NodeData::Text(text) = &self.nodes[*child].data {
                raw.push_str(text);
                raw.push(' ');
            }
        }
        normalize_space(&raw)
    }

    pub(crate) fn text_content(&self, index: usize) -> String {
        match &self.nodes[index].data {
            NodeData::Text(text) => text.clone(),
            NodeData::Element { children, .. } => children
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    fn push_element(&mut self, parent: Option<usize>, element: ElementRef<'_>) -> usize {
        let index = self.nodes.len();
        let value = element.value();
        self.by_node.insert(element.id(), index);
        self.nodes.push(SnapshotNode {
            node: element.id(),
            parent,
            data: NodeData::Element {
                tag: value.name().to_ascii_lowercase(),
                attributes: value
                    .attrs()
                    .map(|(key, val)| (key.to_string(), val.to_string()))
                    .collect(),
                children: Vec::new(),
            },
        });

        let mut children = Vec::new();
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                children.push(self.push_element(Some(index), child_element));
            } else if let Some(text) = child.value().as_text() {
                let text_index = self.nodes.len();
                self.nodes.push(SnapshotNode {
                    node: child.id(),
                    parent: Some(index),
                    data: NodeData::Text(String::from(&*text.text)),
                });
                children.push(text_index);
            }
        }

        if let NodeData::Element {
            children: slot, ..
        } = &mut self.nodes[index].data
        {
            *slot = children;
        }
        index
    }
}

pub(crate) fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Immutable parsed document
#[derive(Clone)]
pub struct DomSnapshot {
    tree: Arc<SnapshotTree>,
}

impl DomSnapshot {
    /// Parse a full HTML document; fragments land in `<body>`.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut tree = SnapshotTree {
            nodes: Vec::new(),
            html: Mutex::new(Html::new_document()),
            by_node: HashMap::new(),
        };
        tree.push_element(None, document.root_element());
        tree.html = Mutex::new(document);
        Self {
            tree: Arc::new(tree),
        }
    }

    pub fn document_element(&self) -> SnapshotElement {
        self.element(SnapshotTree::ROOT)
    }

    /// Evaluate a selector chain synchronously
    pub fn query(&self, selector: &str) -> Result<Vec<SnapshotElement>, SynthError> {
        let matches = query::evaluate(&self.tree, selector)?;
        Ok(matches.into_iter().map(|index| self.element(index)).collect())
    }

    pub fn query_first(&self, selector: &str) -> Result<Option<SnapshotElement>, SynthError> {
        Ok(self.query(selector)?.into_iter().next())
    }

    /// Number of element nodes in the snapshot
    pub fn element_count(&self) -> usize {
        self.tree
            .nodes
            .iter()
            .filter(|node| matches!(node.data, NodeData::Element { .. }))
            .count()
    }

    fn element(&self, index: usize) -> SnapshotElement {
        SnapshotElement {
            tree: Arc::clone(&self.tree),
            index,
        }
    }
}

impl fmt::Debug for DomSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomSnapshot")
            .field("elements", &self.element_count())
            .finish()
    }
}

#[async_trait]
impl SelectorQuery<SnapshotElement> for DomSnapshot {
    async fn query_all(&self, selector: &str) -> Result<Vec<SnapshotElement>, SynthError> {
        self.query(selector)
    }
}

/// Element handle into a [`DomSnapshot`]
#[derive(Clone)]
pub struct SnapshotElement {
    tree: Arc<SnapshotTree>,
    index: usize,
}

impl SnapshotElement {
    pub fn own_text(&self) -> String {
        self.tree.own_text(self.index)
    }
}

impl PartialEq for SnapshotElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree) && self.index == other.index
    }
}

impl fmt::Debug for SnapshotElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}#{}>", self.tree.tag(self.index), self.index)
    }
}

impl DomElement for SnapshotElement {
    fn tag_name(&self) -> String {
        self.tree.tag(self.index).to_string()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.tree.attribute(self.index, name).map(str::to_string)
    }

    fn parent_element(&self) -> Option<Self> {
        self.tree.parent(self.index).map(|index| SnapshotElement {
            tree: Arc::clone(&self.tree),
            index,
        })
    }

    fn children(&self) -> Vec<DomChild<Self>> {
        self.tree
            .children(self.index)
            .iter()
            .map(|child| match &self.tree.nodes[*child].data {
                NodeData::Text(text) => DomChild::Text(text.clone()),
                NodeData::Element { .. } => DomChild::Element(SnapshotElement {
                    tree: Arc::clone(&self.tree),
                    index: *child,
                }),
            })
            .collect()
    }

    fn text_content(&self) -> String {
        self.tree.text_content(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_lands_in_body() {
        let snapshot = DomSnapshot::parse("<div id=\"a\">Hello</div>");
        let root = snapshot.document_element();
        assert_eq!(root.tag_name(), "html");
        assert!(root.is_document_element());

        let div = snapshot.query_first("div").unwrap().unwrap();
        assert_eq!(div.attribute("id").as_deref(), Some("a"));
        assert_eq!(div.parent_element().unwrap().tag_name(), "body");
        assert_eq!(div.text_content(), "Hello");
        assert!(root.contains(&div));
        assert!(!div.contains(&root));
    }

    #[test]
    fn own_text_ignores_nested_elements() {
        let snapshot = DomSnapshot::parse("<p>outer <b>inner</b> tail</p>");
        let p = snapshot.query_first("p").unwrap().unwrap();
        assert_eq!(p.own_text(), "outer tail");
        assert_eq!(p.text_content(), "outer inner tail");
    }
}
