//! Node identity and state as reported by drivers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable address of an element inside a document.
///
/// A path is the sequence of element-child indices from the document root
/// down to the element. Unlike tree-internal node ids, paths survive
/// re-parsing the same markup, which is what lets a node handle outlive the
/// snapshot it was resolved against as long as the document itself has not
/// changed shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    /// The document root element.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns the path of this element's parent, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Extends the path by one child index.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// True when `other` is this path or lies underneath it.
    pub fn contains(&self, other: &Self) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// A point-in-time view of one element, as resolved by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Address of the element in the current document.
    pub path: NodePath,
    /// Lowercased tag name.
    pub tag: String,
    /// All attributes, in deterministic order.
    pub attrs: BTreeMap<String, String>,
    /// Literal concatenated text content (no whitespace normalization).
    pub text: String,
    /// Current value for form controls: input/textarea contents, or the
    /// value of the selected option for selects. `None` for non-controls.
    pub value: Option<String>,
    /// Checked state for checkboxes and radio buttons.
    pub checked: Option<bool>,
}

impl NodeData {
    /// Returns an attribute value, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The element's id attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// The element's name attribute.
    pub fn name(&self) -> Option<&str> {
        self.attribute("name")
    }

    /// True when the control carries the `disabled` attribute.
    pub fn is_disabled(&self) -> bool {
        self.attrs.contains_key("disabled")
    }
}
