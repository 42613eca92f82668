//! DOM access consumed by selector synthesis.
//!
//! Synthesis never owns a document. It reads element structure through
//! [`DomElement`] and validates candidates through [`SelectorQuery`], so the
//! same walk runs against a live page binding or an offline snapshot.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::SynthError;

/// Child node as seen by synthesis
#[derive(Debug, Clone, PartialEq)]
pub enum DomChild<E> {
    Element(E),
    Text(String),
}

/// Read-only view of one element
pub trait DomElement: Clone + PartialEq + fmt::Debug + Send + Sync {
    /// Lower-case tag name
    fn tag_name(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Parent element; `None` for the document element
    fn parent_element(&self) -> Option<Self>;

    /// Element and text children in document order
    fn children(&self) -> Vec<DomChild<Self>>;

    fn is_document_element(&self) -> bool {
        self.parent_element().is_none()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn element_children(&self) -> Vec<Self> {
        self.children()
            .into_iter()
            .filter_map(|child| match child {
                DomChild::Element(element) => Some(element),
                DomChild::Text(_) => None,
            })
            .collect()
    }

    /// Inclusive containment: an element contains itself.
    fn contains(&self, other: &Self) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if &node == self {
                return true;
            }
            cursor = node.parent_element();
        }
        false
    }

    /// Concatenated text of all descendants
    fn text_content(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            match child {
                DomChild::Text(text) => out.push_str(&text),
                DomChild::Element(element) => out.push_str(&element.text_content()),
            }
        }
        out
    }
}

/// Query capability of the frame hosting the element
#[async_trait]
pub trait SelectorQuery<E: DomElement>: Send + Sync {
    /// All matches of `selector` in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<E>, SynthError>;
}

#[async_trait]
impl<E, Q> SelectorQuery<E> for Arc<Q>
where
    E: DomElement + 'static,
    Q: SelectorQuery<E> + ?Sized,
{
    async fn query_all(&self, selector: &str) -> Result<Vec<E>, SynthError> {
        (**self).query_all(selector).await
    }
}

#[async_trait]
impl<E, Q> SelectorQuery<E> for &Q
where
    E: DomElement + 'static,
    Q: SelectorQuery<E> + ?Sized,
{
    async fn query_all(&self, selector: &str) -> Result<Vec<E>, SynthError> {
        (**self).query_all(selector).await
    }
}
