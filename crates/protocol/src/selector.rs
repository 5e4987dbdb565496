//! Selector expressions for locating nodes in a document.
//!
//! A [`Selector`] is a pure value describing *what* to find; resolution
//! against an actual document happens in the session engine or inside a
//! driver with native query support.

use serde::{Deserialize, Serialize};

/// The class of control a semantic selector targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    /// Any form field: text-like inputs, textareas, checkboxes, radio
    /// buttons, selects, and file inputs.
    Field,
    /// Text-like inputs and textareas only (the targets of `fill_in`).
    FillableField,
    /// `<input type="checkbox">`
    Checkbox,
    /// `<input type="radio">`
    RadioButton,
    /// `<select>`
    SelectBox,
    /// `<input type="file">`
    FileField,
    /// `<a href=...>`
    Link,
    /// `<button>` or button-like `<input>`
    Button,
    /// Either a link or a button, whichever matches first.
    LinkOrButton,
    /// Any element, matched by id only.
    Id,
}

impl ControlKind {
    /// Human-readable description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::FillableField => "field",
            Self::Checkbox => "checkbox",
            Self::RadioButton => "radio button",
            Self::SelectBox => "select box",
            Self::FileField => "file field",
            Self::Link => "link",
            Self::Button => "button",
            Self::LinkOrButton => "link or button",
            Self::Id => "element by id",
        }
    }
}

/// A semantic query: locate a control by its human-facing attributes.
///
/// The query string is matched against id, then name, then associated label
/// text, then placeholder or visible text/value, depending on the control
/// kind. Matching is case-sensitive and exact unless `exact` is cleared.
///
/// The query string is treated as opaque: bracketed field names such as
/// `addresses[][city]` are compared verbatim, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticQuery {
    /// The control class to search within.
    pub kind: ControlKind,
    /// The locator string (id, name, label text, ...).
    pub query: String,
    /// Require exact string equality; when false, substring matching is
    /// allowed at the label/text levels.
    pub exact: bool,
}

impl SemanticQuery {
    /// Creates an exact-match query.
    pub fn new(kind: ControlKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
            exact: true,
        }
    }
}

/// A selector expression.
///
/// `From<&str>` parses nothing and produces a CSS selector, so most call
/// sites can pass a plain string literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector, e.g. `"button.primary"`.
    Css(String),
    /// XPath location path, e.g. `".//h1"`.
    XPath(String),
    /// Semantic locator by label, id, name, or visible text.
    Semantic(SemanticQuery),
}

impl Selector {
    /// Creates a CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an XPath selector.
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Locates any form field by id, name, label text, or placeholder.
    pub fn field(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::Field, query))
    }

    /// Locates a fillable (text-like) field.
    pub fn fillable_field(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::FillableField, query))
    }

    /// Locates a checkbox.
    pub fn checkbox(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::Checkbox, query))
    }

    /// Locates a radio button.
    pub fn radio_button(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::RadioButton, query))
    }

    /// Locates a select box.
    pub fn select_box(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::SelectBox, query))
    }

    /// Locates a file input.
    pub fn file_field(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::FileField, query))
    }

    /// Locates a link by id, text, title, or contained image alt text.
    pub fn link(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::Link, query))
    }

    /// Locates a button by id, text, or value.
    pub fn button(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::Button, query))
    }

    /// Locates a link or a button.
    pub fn link_or_button(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::LinkOrButton, query))
    }

    /// Locates any element by exact id.
    pub fn id(query: impl Into<String>) -> Self {
        Self::Semantic(SemanticQuery::new(ControlKind::Id, query))
    }

    /// Returns a copy with the exactness flag set (semantic selectors only;
    /// CSS and XPath selectors are returned unchanged).
    pub fn with_exact(self, exact: bool) -> Self {
        match self {
            Self::Semantic(mut q) => {
                q.exact = exact;
                Self::Semantic(q)
            }
            other => other,
        }
    }
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }
}

impl From<String> for Selector {
    fn from(selector: String) -> Self {
        Self::Css(selector)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{s}`"),
            Self::XPath(s) => write!(f, "xpath `{s}`"),
            Self::Semantic(q) => write!(f, "{} '{}'", q.kind.describe(), q.query),
        }
    }
}
