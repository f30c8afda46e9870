//! flat snapshot of form answers

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use serde::de::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::conditions::Value;

static NULL: Value = Value::Null;

/// field id -> answer, as posted by the form
///
/// JSON-encoded arrays (multi-select answers) are decoded on the way in;
/// anything that fails to decode is kept as plain text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    values: HashMap<String, Value>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// build from a JSON object of answers
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| anyhow!("form data must be a JSON object"))?;

        Ok(obj
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_form_input(v)))
            .collect())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(s).context("Failed to parse form data")?;
        Self::from_json(&json)
    }

    /// answer for a field; missing keys read as null
    pub fn get(&self, field_id: &str) -> &Value {
        self.values.get(field_id).unwrap_or(&NULL)
    }

    pub fn contains_key(&self, field_id: &str) -> bool {
        self.values.contains_key(field_id)
    }

    pub fn insert(&mut self, field_id: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field_id.into(), value.into());
    }

    /// insert a raw posted string, decoding JSON arrays
    pub fn insert_raw(&mut self, field_id: impl Into<String>, raw: &str) {
        let value = Value::from_form_input(&JsonValue::String(raw.to_string()));
        self.values.insert(field_id.into(), value);
    }

    pub fn with(mut self, field_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field_id, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for FormData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, JsonValue>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, Value::from_form_input(&v)))
            .collect())
    }
}
