//! computed conditional state for one evaluation pass

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::conditions::Value;

/// per-element outcome of applying every matched rule
///
/// ordered maps keep the serialized form stable for identical inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConditionalState {
    pub field_visibility: BTreeMap<String, bool>,
    pub page_visibility: BTreeMap<String, bool>,
    pub field_enabled: BTreeMap<String, bool>,
    pub field_required: BTreeMap<String, bool>,
    pub field_values: BTreeMap<String, Value>,
    pub skipped_pages: BTreeSet<String>,
    pub additional_validations: BTreeMap<String, Vec<ValidationRule>>,
    pub messages: Vec<Message>,
}

impl FormConditionalState {
    /// fields without an entry are visible
    pub fn is_field_visible(&self, field_id: &str) -> bool {
        self.field_visibility.get(field_id).copied().unwrap_or(true)
    }

    pub fn is_page_visible(&self, page_id: &str) -> bool {
        self.page_visibility.get(page_id).copied().unwrap_or(true)
    }

    pub fn is_page_skipped(&self, page_id: &str) -> bool {
        self.skipped_pages.contains(page_id)
    }

    /// required and visible; hidden fields are never required
    pub fn is_field_required(&self, field_id: &str) -> bool {
        self.field_required.get(field_id).copied().unwrap_or(false)
            && self.is_field_visible(field_id)
    }

    /// field and page visibility in one map
    pub fn element_visibility(&self) -> BTreeMap<String, bool> {
        self.field_visibility
            .iter()
            .chain(self.page_visibility.iter())
            .map(|(id, visible)| (id.clone(), *visible))
            .collect()
    }

    pub fn field_required_state(&self) -> BTreeMap<String, bool> {
        self.field_required
            .keys()
            .map(|id| (id.clone(), self.is_field_required(id)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// extra validation attached to a field by `addValidation`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub validation_type: String,
    pub rule: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// message raised by `showMessage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub target_element: String,
    pub rule_id: String,
}
