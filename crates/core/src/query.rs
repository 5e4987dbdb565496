//! Selector resolution against parsed documents.
//!
//! Resolution always yields elements in document order. CSS selectors are
//! delegated to `scraper`; XPath goes through the structural subset
//! evaluator; semantic selectors walk candidate controls through a fixed
//! precedence of match levels — exact id, then exact name, then associated
//! label text, then placeholder or visible text/value — and the first level
//! with any match wins.

use crate::document::{self, DocumentSnapshot};
use crate::error::{Error, Result};
use crate::xpath;
use marmot_protocol::{ControlKind, FindOptions, NodeData, NodePath, Selector, SemanticQuery};
use scraper::ElementRef;

/// Resolves a selector against a snapshot, optionally scoped to a subtree.
pub(crate) fn resolve_in<'a>(
    doc: &'a DocumentSnapshot,
    selector: &Selector,
    scope: Option<&NodePath>,
    options: &FindOptions,
) -> Result<Vec<ElementRef<'a>>> {
    let scope_el = match scope {
        Some(path) => doc
            .element_at(path)
            .ok_or_else(|| Error::Stale(path.to_string()))?,
        None => doc.root(),
    };

    let mut found = match selector {
        Selector::Css(css) => {
            let parsed = scraper::Selector::parse(css)
                .map_err(|e| Error::InvalidArgument(format!("css `{css}`: {e}")))?;
            scope_el.select(&parsed).collect()
        }
        Selector::XPath(expr) => {
            let mut els = xpath::evaluate(scope_el, expr)?;
            els.sort_by_key(|el| document::path_of(*el).0);
            els
        }
        Selector::Semantic(query) => resolve_semantic(doc.root(), scope_el, query, options),
    };

    if let Some(text) = &options.text {
        found.retain(|el| collapsed_text(*el).contains(text.as_str()));
    }

    Ok(found)
}

/// Resolves a selector against raw markup and returns driver-facing node
/// state. This is the building block snapshot drivers use to implement
/// `find_nodes` without their own query engine; values reflect the markup
/// only, so drivers overlay any interaction state they track.
pub fn resolve_nodes(
    markup: &str,
    selector: &Selector,
    scope: Option<&NodePath>,
) -> Result<Vec<NodeData>> {
    let doc = DocumentSnapshot::parse(markup, 0);
    let found = resolve_in(&doc, selector, scope, &FindOptions::new())?;
    Ok(found.into_iter().map(document::node_data).collect())
}

/// Reads the state of the element at `path` from raw markup, if present.
pub fn node_at(markup: &str, path: &NodePath) -> Option<NodeData> {
    let doc = DocumentSnapshot::parse(markup, 0);
    doc.element_at(path).map(document::node_data)
}

fn resolve_semantic<'a>(
    root: ElementRef<'a>,
    scope_el: ElementRef<'a>,
    query: &SemanticQuery,
    options: &FindOptions,
) -> Vec<ElementRef<'a>> {
    let exact = options.exact.unwrap_or(query.exact);
    let candidates: Vec<ElementRef<'a>> = scope_el
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| kind_matches(*el, query.kind))
        .collect();

    for &level in match_levels(query.kind) {
        let matched: Vec<ElementRef<'a>> = candidates
            .iter()
            .copied()
            .filter(|el| level_matches(root, *el, level, &query.query, exact))
            .collect();
        if !matched.is_empty() {
            return matched;
        }
    }
    Vec::new()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchLevel {
    Id,
    Name,
    Label,
    Placeholder,
    Text,
    Value,
    Title,
    ImgAlt,
}

fn match_levels(kind: ControlKind) -> &'static [MatchLevel] {
    use MatchLevel::*;
    match kind {
        ControlKind::Field
        | ControlKind::FillableField
        | ControlKind::Checkbox
        | ControlKind::RadioButton
        | ControlKind::SelectBox
        | ControlKind::FileField => &[Id, Name, Label, Placeholder],
        ControlKind::Link => &[Id, Text, Title, ImgAlt],
        ControlKind::Button | ControlKind::LinkOrButton => &[Id, Text, Value, Title],
        ControlKind::Id => &[Id],
    }
}

fn kind_matches(el: ElementRef<'_>, kind: ControlKind) -> bool {
    let tag = el.value().name();
    let input_type = el.value().attr("type").unwrap_or("text");
    let fillable = (tag == "input"
        && matches!(
            input_type,
            "text" | "password" | "email" | "url" | "tel" | "search" | "number"
        ))
        || tag == "textarea";
    let button = tag == "button"
        || (tag == "input" && matches!(input_type, "submit" | "button" | "image" | "reset"));
    let link = tag == "a" && el.value().attr("href").is_some();

    match kind {
        ControlKind::FillableField => fillable,
        ControlKind::Checkbox => tag == "input" && input_type == "checkbox",
        ControlKind::RadioButton => tag == "input" && input_type == "radio",
        ControlKind::SelectBox => tag == "select",
        ControlKind::FileField => tag == "input" && input_type == "file",
        ControlKind::Field => {
            fillable
                || tag == "select"
                || (tag == "input"
                    && matches!(input_type, "checkbox" | "radio" | "file"))
        }
        ControlKind::Link => link,
        ControlKind::Button => button,
        ControlKind::LinkOrButton => link || button,
        ControlKind::Id => true,
    }
}

fn level_matches(
    root: ElementRef<'_>,
    el: ElementRef<'_>,
    level: MatchLevel,
    query: &str,
    exact: bool,
) -> bool {
    let attr = |name: &str| el.value().attr(name);
    match level {
        // Id and name are identifiers: always compared exactly, and field
        // names with bracket syntax are opaque strings.
        MatchLevel::Id => attr("id") == Some(query),
        MatchLevel::Name => attr("name") == Some(query),
        MatchLevel::Label => label_matches(root, el, query, exact),
        MatchLevel::Placeholder => attr("placeholder")
            .is_some_and(|placeholder| text_matches(placeholder, query, exact)),
        MatchLevel::Text => text_matches(&collapsed_text(el), query, exact),
        MatchLevel::Value => {
            attr("value").is_some_and(|value| text_matches(value, query, exact))
        }
        MatchLevel::Title => attr("title").is_some_and(|title| text_matches(title, query, exact)),
        MatchLevel::ImgAlt => {
            let img = scraper::Selector::parse("img[alt]").expect("static selector");
            el.select(&img)
                .any(|img| text_matches(img.value().attr("alt").unwrap_or(""), query, exact))
        }
    }
}

fn label_matches(root: ElementRef<'_>, el: ElementRef<'_>, query: &str, exact: bool) -> bool {
    // <label for=...> association anywhere in the document.
    if let Some(id) = el.value().attr("id") {
        let labels = scraper::Selector::parse("label[for]").expect("static selector");
        let by_for = root.select(&labels).any(|label| {
            label.value().attr("for") == Some(id)
                && text_matches(&collapsed_text(label), query, exact)
        });
        if by_for {
            return true;
        }
    }

    // Wrapping <label> ancestor.
    let mut node = *el;
    while let Some(parent) = node.parent() {
        if let Some(parent_el) = ElementRef::wrap(parent) {
            if parent_el.value().name() == "label"
                && text_matches(&collapsed_text(parent_el), query, exact)
            {
                return true;
            }
        }
        node = parent;
    }
    false
}

fn text_matches(candidate: &str, query: &str, exact: bool) -> bool {
    if exact {
        candidate == query
    } else {
        candidate.contains(query)
    }
}

/// Text content with runs of whitespace collapsed to single spaces.
fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
