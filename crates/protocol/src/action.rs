//! Interaction payloads sent to drivers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A driver-level interaction on a single node.
///
/// The session engine resolves the target node first and then hands the
/// driver an `Action` plus the node's path. Drivers that cannot carry out a
/// given action (for example, file attachment on a backend without upload
/// support) must report an unsupported-operation error instead of ignoring
/// the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Replace the current value of a text-like input or textarea.
    Fill(String),
    /// Select the option whose visible text or value equals `option`.
    SelectOption {
        /// Visible text or value attribute of the option.
        option: String,
    },
    /// Deselect the option whose visible text or value equals `option`
    /// (multiple selects only).
    UnselectOption {
        /// Visible text or value attribute of the option.
        option: String,
    },
    /// Set the checked state of a checkbox or radio button. Checking a
    /// radio button unchecks the rest of its group.
    SetChecked(bool),
    /// Click the node. Links navigate; submit buttons submit their form.
    Click,
    /// Attach a file to a file input.
    AttachFile(PathBuf),
}

impl Action {
    /// Short name used in logs and unsupported-operation errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fill(_) => "fill",
            Self::SelectOption { .. } => "select option",
            Self::UnselectOption { .. } => "unselect option",
            Self::SetChecked(true) => "check",
            Self::SetChecked(false) => "uncheck",
            Self::Click => "click",
            Self::AttachFile(_) => "attach file",
        }
    }
}
