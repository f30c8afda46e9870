//! form template: task -> page -> field hierarchy plus conditional rules

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::rules::Rule;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    #[serde(default, alias = "formId")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// pages outside any task; they follow the task pages in navigation order
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub conditional_logic: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "id")]
    pub task_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(alias = "id")]
    pub page_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(alias = "id")]
    pub field_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
}

impl FormTemplate {
    /// template with standalone pages and no rules
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.conditional_logic = rules;
        self
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse form template")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form template: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid form template: {}", path.display()))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.conditional_logic
    }

    /// every page in navigation order
    pub fn pages(&self) -> Vec<&Page> {
        self.tasks
            .iter()
            .flat_map(|t| t.pages.iter())
            .chain(self.pages.iter())
            .collect()
    }

    /// every field in navigation order
    pub fn fields(&self) -> Vec<&Field> {
        self.pages()
            .into_iter()
            .flat_map(|p| p.fields.iter())
            .collect()
    }

    pub fn find_page(&self, page_id: &str) -> Option<&Page> {
        self.pages().into_iter().find(|p| p.page_id == page_id)
    }

    pub fn find_field(&self, field_id: &str) -> Option<&Field> {
        self.fields().into_iter().find(|f| f.field_id == field_id)
    }

    pub fn has_page(&self, page_id: &str) -> bool {
        self.find_page(page_id).is_some()
    }

    pub fn has_field(&self, field_id: &str) -> bool {
        self.find_field(field_id).is_some()
    }
}

impl Page {
    pub fn new(page_id: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            page_id: page_id.into(),
            title: String::new(),
            fields,
        }
    }
}

impl Field {
    pub fn new(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
