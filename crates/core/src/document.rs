//! Immutable document snapshots.
//!
//! A [`DocumentSnapshot`] captures the raw markup a driver reported at one
//! point in time, together with its parsed tree. Snapshots are never
//! mutated; a navigation or an interaction-triggered re-render produces a
//! replacement with a higher generation number, and node handles detect the
//! change by comparing generations.

use marmot_protocol::{NodeData, NodePath};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An immutable parsed capture of a page at a point in time.
pub struct DocumentSnapshot {
    raw: Arc<str>,
    tree: Html,
    generation: u64,
}

impl DocumentSnapshot {
    /// Parses raw markup into a snapshot tagged with a generation number.
    pub fn parse(raw: impl Into<String>, generation: u64) -> Self {
        let raw: Arc<str> = raw.into().into();
        let tree = Html::parse_document(&raw);
        Self {
            raw,
            tree,
            generation,
        }
    }

    /// The literal markup the driver reported, byte for byte.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The generation this snapshot belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The root `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.tree.root_element()
    }

    /// Resolves a node path to an element, if the document still has an
    /// element at that address.
    pub fn element_at(&self, path: &NodePath) -> Option<ElementRef<'_>> {
        let mut el = self.root();
        for &index in &path.0 {
            el = el.children().filter_map(ElementRef::wrap).nth(index)?;
        }
        Some(el)
    }

    /// Visible text of the document body (whole tree when there is no
    /// `<body>`), with literal whitespace.
    pub fn text(&self) -> String {
        let body = scraper::Selector::parse("body").expect("static selector");
        match self.root().select(&body).next() {
            Some(el) => el.text().collect(),
            None => self.root().text().collect(),
        }
    }
}

impl std::fmt::Debug for DocumentSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSnapshot")
            .field("generation", &self.generation)
            .field("bytes", &self.raw.len())
            .finish()
    }
}

/// Computes the element-child-index path of an element relative to the
/// document root.
pub(crate) fn path_of(el: ElementRef<'_>) -> NodePath {
    let mut segments = Vec::new();
    let mut node = *el;
    loop {
        let Some(parent) = node.parent() else { break };
        if !parent.value().is_element() {
            // `node` is the root <html> element; its path is empty.
            break;
        }
        let index = node
            .prev_siblings()
            .filter(|sibling| sibling.value().is_element())
            .count();
        segments.push(index);
        node = parent;
    }
    segments.reverse();
    NodePath(segments)
}

/// Extracts the driver-facing state of an element from the parsed tree.
///
/// Values reflect the markup only; drivers that track interaction state
/// (filled values, toggled checkboxes) overlay their own state on top.
pub(crate) fn node_data(el: ElementRef<'_>) -> NodeData {
    let tag = el.value().name().to_ascii_lowercase();
    let attrs: BTreeMap<String, String> = el
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let text: String = el.text().collect();
    let value = control_value(el, &tag, &attrs);
    let checked = match (tag.as_str(), attrs.get("type").map(String::as_str)) {
        ("input", Some("checkbox") | Some("radio")) => Some(attrs.contains_key("checked")),
        _ => None,
    };

    NodeData {
        path: path_of(el),
        tag,
        attrs,
        text,
        value,
        checked,
    }
}

fn control_value(
    el: ElementRef<'_>,
    tag: &str,
    attrs: &BTreeMap<String, String>,
) -> Option<String> {
    match tag {
        "input" => {
            let default = match attrs.get("type").map(String::as_str) {
                // Submission default when a checked box carries no value.
                Some("checkbox") | Some("radio") => "on",
                _ => "",
            };
            Some(
                attrs
                    .get("value")
                    .cloned()
                    .unwrap_or_else(|| default.to_string()),
            )
        }
        "textarea" => Some(el.text().collect()),
        "select" => selected_option_value(el, attrs),
        _ => None,
    }
}

fn selected_option_value(
    el: ElementRef<'_>,
    attrs: &BTreeMap<String, String>,
) -> Option<String> {
    let option = scraper::Selector::parse("option").expect("static selector");
    let options: Vec<ElementRef<'_>> = el.select(&option).collect();

    let marked = options
        .iter()
        .find(|opt| opt.value().attr("selected").is_some());
    let chosen = match marked {
        Some(opt) => Some(*opt),
        // A single select with nothing marked falls back to its first
        // option; a multiple select submits nothing.
        None if !attrs.contains_key("multiple") => options.first().copied(),
        None => None,
    };

    chosen.map(option_value)
}

/// An option's submitted value: its `value` attribute, or its text.
pub(crate) fn option_value(opt: ElementRef<'_>) -> String {
    match opt.value().attr("value") {
        Some(value) => value.to_string(),
        None => opt.text().collect::<String>().trim().to_string(),
    }
}
