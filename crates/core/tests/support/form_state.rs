// Interaction state shared by the snapshot-based test drivers.
//
// Snapshot backends never mutate their markup; filled values, toggled
// checkboxes, and selected options live in this overlay keyed by node
// path, the same way a headless HTTP backend tracks form state between
// page loads.

use marmot::query;
use marmot::{Action, Error, NodeData, NodePath, Result, Selector};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: HashMap<NodePath, String>,
    checked: HashMap<NodePath, bool>,
    selected: HashMap<NodePath, Vec<String>>,
    files: HashMap<NodePath, PathBuf>,
}

impl FormState {
    pub fn clear(&mut self) {
        self.values.clear();
        self.checked.clear();
        self.selected.clear();
        self.files.clear();
    }

    /// Overlays tracked interaction state onto markup-derived node state.
    pub fn overlay(&self, node: &mut NodeData) {
        if let Some(value) = self.values.get(&node.path) {
            node.value = Some(value.clone());
        }
        if let Some(checked) = self.checked.get(&node.path) {
            node.checked = Some(*checked);
        }
        if let Some(selected) = self.selected.get(&node.path) {
            node.value = selected.first().cloned();
        }
        if let Some(file) = self.files.get(&node.path) {
            node.value = Some(file.display().to_string());
        }
    }

    /// Applies a non-click interaction to the overlay.
    pub fn apply(&mut self, markup: &str, path: &NodePath, action: &Action) -> Result<()> {
        let node = query::node_at(markup, path).ok_or_else(|| Error::Stale(path.to_string()))?;
        match action {
            Action::Fill(value) => {
                self.values.insert(path.clone(), value.clone());
            }
            Action::SetChecked(checked) => {
                if *checked && node.attribute("type") == Some("radio") {
                    self.uncheck_radio_group(markup, &node)?;
                }
                self.checked.insert(path.clone(), *checked);
            }
            Action::SelectOption { option } => {
                let value = self.option_value(markup, path, option)?;
                let multiple = node.attrs.contains_key("multiple");
                let entry = self.selected.entry(path.clone()).or_default();
                if multiple {
                    if !entry.contains(&value) {
                        entry.push(value);
                    }
                } else {
                    *entry = vec![value];
                }
            }
            Action::UnselectOption { option } => {
                if !node.attrs.contains_key("multiple") {
                    return Err(Error::InvalidArgument(
                        "cannot unselect an option from a single select box".to_string(),
                    ));
                }
                let value = self.option_value(markup, path, option)?;
                let entry = self.selected.entry(path.clone()).or_default();
                entry.retain(|v| v != &value);
            }
            Action::AttachFile(file) => {
                self.files.insert(path.clone(), file.clone());
            }
            Action::Click => {
                return Err(Error::InvalidArgument(
                    "clicks are handled by the driver, not the form overlay".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Serializes the successful controls of the form at `form_path`, in
    /// document order, ready for urlencoded submission.
    pub fn form_pairs(
        &self,
        markup: &str,
        form_path: &NodePath,
        submitter: Option<&NodeData>,
    ) -> Result<Vec<(String, String)>> {
        let controls = query::resolve_nodes(
            markup,
            &Selector::css("input, textarea, select"),
            Some(form_path),
        )?;

        let mut pairs = Vec::new();
        for control in controls {
            let Some(name) = control.name().map(str::to_string) else {
                continue;
            };
            if name.is_empty() || control.is_disabled() {
                continue;
            }
            let input_type = control.attribute("type").unwrap_or("text");
            match (control.tag.as_str(), input_type) {
                ("input", "submit" | "button" | "image" | "reset") => {}
                ("input", "checkbox" | "radio") => {
                    let checked = self
                        .checked
                        .get(&control.path)
                        .copied()
                        .or(control.checked)
                        .unwrap_or(false);
                    if checked {
                        pairs.push((name, control.value.clone().unwrap_or_else(|| "on".into())));
                    }
                }
                ("input", "file") => {
                    let file = self
                        .files
                        .get(&control.path)
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    pairs.push((name, file));
                }
                ("input", _) | ("textarea", _) => {
                    let value = self
                        .values
                        .get(&control.path)
                        .cloned()
                        .or(control.value.clone())
                        .unwrap_or_default();
                    pairs.push((name, value));
                }
                ("select", _) => {
                    let selected = match self.selected.get(&control.path) {
                        Some(list) => list.clone(),
                        None => self.default_selected(markup, &control)?,
                    };
                    for value in selected {
                        pairs.push((name.clone(), value));
                    }
                }
                _ => {}
            }
        }

        if let Some(button) = submitter {
            if let Some(name) = button.name() {
                if !name.is_empty() {
                    let value = button
                        .attribute("value")
                        .map(str::to_string)
                        .unwrap_or_default();
                    pairs.push((name.to_string(), value));
                }
            }
        }
        Ok(pairs)
    }

    fn uncheck_radio_group(&mut self, markup: &str, node: &NodeData) -> Result<()> {
        let Some(group) = node.name() else {
            return Ok(());
        };
        let radios = query::resolve_nodes(markup, &Selector::css("input[type=radio]"), None)?;
        for radio in radios {
            if radio.name() == Some(group) {
                self.checked.insert(radio.path.clone(), false);
            }
        }
        Ok(())
    }

    /// Resolves an option by visible text or value, returning its
    /// submitted value.
    fn option_value(&self, markup: &str, select_path: &NodePath, option: &str) -> Result<String> {
        let options = query::resolve_nodes(markup, &Selector::css("option"), Some(select_path))?;
        for candidate in &options {
            let text = collapse(&candidate.text);
            let value = candidate
                .attribute("value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            if text == option || value == option {
                return Ok(value);
            }
        }
        Err(Error::NotFound(format!("option '{option}'")))
    }

    fn default_selected(&self, markup: &str, select: &NodeData) -> Result<Vec<String>> {
        let options = query::resolve_nodes(markup, &Selector::css("option"), Some(&select.path))?;
        let marked: Vec<String> = options
            .iter()
            .filter(|opt| opt.attrs.contains_key("selected"))
            .map(option_submit_value)
            .collect();
        if !marked.is_empty() {
            return Ok(marked);
        }
        if select.attrs.contains_key("multiple") {
            return Ok(Vec::new());
        }
        Ok(options.first().map(option_submit_value).into_iter().collect())
    }
}

fn option_submit_value(opt: &NodeData) -> String {
    opt.attribute("value")
        .map(str::to_string)
        .unwrap_or_else(|| collapse(&opt.text))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
