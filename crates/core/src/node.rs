//! Driver-backed element handles.

use crate::error::{Error, Result};
use crate::session::Session;
use marmot_protocol::{Action, NodeData, NodePath, Selector};
use parking_lot::Mutex;
use std::path::PathBuf;

/// A reference to one element in the session's current document.
///
/// A handle remembers the selector it was resolved from, the element's
/// path, and the document generation it belongs to. When the session
/// navigates or resets, the generation moves on and the handle goes stale:
/// reads and mutations then fail with [`Error::Stale`]. Session-level
/// helpers catch that and re-resolve through the original selector once
/// before giving up.
///
/// Reads are cached until the first mutation; any successful mutation
/// discards the cache, since an interaction may re-render the page.
pub struct NodeHandle {
    session: Session,
    selector: Selector,
    path: NodePath,
    generation: u64,
    tag: String,
    cached: Mutex<Option<NodeData>>,
}

impl NodeHandle {
    pub(crate) fn new(
        session: Session,
        selector: Selector,
        data: NodeData,
        generation: u64,
    ) -> Self {
        Self {
            session,
            selector,
            tag: data.tag.clone(),
            path: data.path.clone(),
            generation,
            cached: Mutex::new(Some(data)),
        }
    }

    /// The selector this handle was resolved from.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The element's address in the document it was resolved against.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Lowercased tag name.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// True when the session has navigated or reset since this handle was
    /// resolved.
    pub fn is_stale(&self) -> bool {
        self.session.generation() != self.generation
    }

    /// Literal text content of the element.
    pub async fn text(&self) -> Result<String> {
        Ok(self.state().await?.text)
    }

    /// Current value of a form control.
    pub async fn value(&self) -> Result<Option<String>> {
        Ok(self.state().await?.value)
    }

    /// An attribute value, if present.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.state().await?.attribute(name).map(str::to_string))
    }

    /// Checked state of a checkbox or radio button (false for other
    /// elements).
    pub async fn is_checked(&self) -> Result<bool> {
        Ok(self.state().await?.checked.unwrap_or(false))
    }

    /// Replaces the value of a text-like input or textarea.
    pub async fn set(&self, value: &str) -> Result<()> {
        self.perform(Action::Fill(value.to_string())).await
    }

    /// Selects the option with the given visible text or value.
    pub async fn select_option(&self, option: &str) -> Result<()> {
        self.perform(Action::SelectOption {
            option: option.to_string(),
        })
        .await
    }

    /// Deselects the option with the given visible text or value
    /// (multiple selects only).
    pub async fn unselect_option(&self, option: &str) -> Result<()> {
        self.perform(Action::UnselectOption {
            option: option.to_string(),
        })
        .await
    }

    /// Sets the checked state of a checkbox or radio button.
    pub async fn set_checked(&self, checked: bool) -> Result<()> {
        self.perform(Action::SetChecked(checked)).await
    }

    /// Flips the checked state.
    pub async fn toggle(&self) -> Result<()> {
        let checked = self.is_checked().await?;
        self.set_checked(!checked).await
    }

    /// Clicks the element. Links navigate; submit buttons submit their
    /// form.
    pub async fn click(&self) -> Result<()> {
        self.perform(Action::Click).await
    }

    /// Attaches a file to a file input.
    pub async fn attach(&self, file: impl Into<PathBuf>) -> Result<()> {
        self.perform(Action::AttachFile(file.into())).await
    }

    /// Performs an interaction and invalidates cached state on success.
    pub(crate) async fn perform(&self, action: Action) -> Result<()> {
        self.ensure_current()?;
        tracing::debug!(node = %self.path, action = action.name(), "interaction");
        self.session.perform_action(&self.path, action).await?;
        self.cached.lock().take();
        Ok(())
    }

    async fn state(&self) -> Result<NodeData> {
        self.ensure_current()?;
        if let Some(data) = self.cached.lock().clone() {
            return Ok(data);
        }
        let data = self.session.read_node_state(&self.path).await?;
        *self.cached.lock() = Some(data.clone());
        Ok(data)
    }

    fn ensure_current(&self) -> Result<()> {
        if self.is_stale() {
            Err(Error::Stale(self.path.to_string()))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle")
            .field("selector", &self.selector.to_string())
            .field("path", &self.path.to_string())
            .field("tag", &self.tag)
            .field("generation", &self.generation)
            .finish()
    }
}
