//! Edit command model.
//!
//! Inline edits made in the editor are expressed as [`EditCommand`]s against
//! nodes addressed by their stable `data-edit-id`. [`EditDocument::apply`] is
//! the only mutation path; it records the inverse of every command so edits
//! can be undone and redone.

use crate::extract::normalize_text;
use crate::{Error, Result};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute carrying the stable id of an editable node.
pub const EDIT_ID_ATTR: &str = "data-edit-id";

/// Which property of a node a command changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum EditProperty {
    Text,
    Style(String),
}

/// One edit: set `property` of `node_id` to `value`.
///
/// For styles an empty value removes the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCommand {
    pub node_id: String,
    pub property: EditProperty,
    pub value: String,
}

impl EditCommand {
    pub fn text(node_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            property: EditProperty::Text,
            value: value.into(),
        }
    }

    pub fn style(node_id: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            node_id: node_id.into(),
            property: EditProperty::Style(style_name(&name)),
            value: value.into(),
        }
    }
}

/// Editable state of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableNode {
    pub text: String,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
}

impl EditableNode {
    /// Render the style map as an inline `style` attribute value.
    pub fn style_attr(&self) -> String {
        self.style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// CSS property names are case-insensitive; the map keys are lowercase.
fn style_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Parse an inline `style` attribute into a property map.
pub fn parse_style(style: &str) -> BTreeMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (style_name(k), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}

/// The editable nodes of a deck plus undo/redo history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditDocument {
    nodes: BTreeMap<String, EditableNode>,
    #[serde(skip)]
    undo_stack: Vec<EditCommand>,
    #[serde(skip)]
    redo_stack: Vec<EditCommand>,
}

impl EditDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `[data-edit-id]` node of an HTML document.
    ///
    /// When an id repeats the first occurrence wins.
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self::new();
        doc.load_html(html);
        doc
    }

    /// Register nodes found in `html` that are not known yet. Returns how many
    /// were added.
    pub fn load_html(&mut self, html: &str) -> usize {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("[data-edit-id]") else {
            return 0;
        };
        let mut added = 0;
        for el in document.select(&selector) {
            let Some(id) = el.value().attr(EDIT_ID_ATTR).map(str::trim).filter(|id| !id.is_empty()) else {
                continue;
            };
            if self.nodes.contains_key(id) {
                continue;
            }
            let node = EditableNode {
                text: normalize_text(&el.text().collect::<String>()),
                style: el.value().attr("style").map(parse_style).unwrap_or_default(),
            };
            self.nodes.insert(id.to_string(), node);
            added += 1;
        }
        added
    }

    pub fn insert(&mut self, id: impl Into<String>, node: EditableNode) {
        self.nodes.insert(id.into(), node);
    }

    pub fn node(&self, id: &str) -> Option<&EditableNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &EditableNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current value of a property; absent styles read as `None`.
    pub fn get(&self, id: &str, property: &EditProperty) -> Option<&str> {
        let node = self.nodes.get(id)?;
        match property {
            EditProperty::Text => Some(node.text.as_str()),
            EditProperty::Style(name) => node.style.get(&style_name(name)).map(String::as_str),
        }
    }

    /// Apply a command, recording its inverse. Clears the redo history.
    pub fn apply(&mut self, command: EditCommand) -> Result<()> {
        let inverse = self.set(&command)?;
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        Ok(())
    }

    /// Revert the most recent command. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.undo_stack.pop() else {
            return false;
        };
        match self.set(&command) {
            Ok(inverse) => {
                self.redo_stack.push(inverse);
                true
            }
            Err(_) => false,
        }
    }

    /// Re-apply the most recently undone command.
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        match self.set(&command) {
            Ok(inverse) => {
                self.undo_stack.push(inverse);
                true
            }
            Err(_) => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // Write the value and return the command that restores the old one.
    fn set(&mut self, command: &EditCommand) -> Result<EditCommand> {
        let node = self
            .nodes
            .get_mut(&command.node_id)
            .ok_or_else(|| Error::UnknownNode(command.node_id.clone()))?;

        let (property, previous) = match &command.property {
            EditProperty::Text => (
                EditProperty::Text,
                std::mem::replace(&mut node.text, command.value.clone()),
            ),
            EditProperty::Style(name) => {
                let name = style_name(name);
                let value = command.value.trim();
                let old = if value.is_empty() {
                    node.style.remove(&name)
                } else {
                    node.style.insert(name.clone(), value.to_string())
                };
                (EditProperty::Style(name), old.unwrap_or_default())
            }
        };

        Ok(EditCommand {
            node_id: command.node_id.clone(),
            property,
            value: previous,
        })
    }
}
