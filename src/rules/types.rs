//! rule, affected element and action types

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::conditions::{ConditionGroup, Value};

/// a prioritized condition tree plus the elements it changes
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    /// display name, diagnostics only
    #[serde(default)]
    pub name: Option<String>,
    /// lower runs first
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub condition_group: Option<ConditionGroup>,
    #[serde(default)]
    pub affected_elements: Vec<AffectedElement>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn new(id: impl Into<String>, priority: i32, condition_group: ConditionGroup) -> Self {
        Self {
            id: id.into(),
            name: None,
            priority,
            enabled: true,
            condition_group: Some(condition_group),
            affected_elements: Vec::new(),
        }
    }

    pub fn affecting(mut self, element: AffectedElement) -> Self {
        self.affected_elements.push(element);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// whether any condition within `max_depth` levels reads `field_id`
    pub fn references_field(&self, field_id: &str, max_depth: usize) -> bool {
        self.condition_group
            .as_ref()
            .is_some_and(|g| g.references_field(field_id, max_depth))
    }

    pub fn targets(&self, element_id: &str) -> bool {
        self.affected_elements
            .iter()
            .any(|e| e.element_id == element_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ElementType {
    Field,
    Page,
    Unknown(String),
}

impl ElementType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "field" => ElementType::Field,
            "page" => ElementType::Page,
            _ => ElementType::Unknown(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Field => "field",
            ElementType::Page => "page",
            ElementType::Unknown(s) => s,
        }
    }
}

impl From<String> for ElementType {
    fn from(s: String) -> Self {
        ElementType::parse(&s)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// what a matched rule does to an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ActionKind {
    Show,
    Hide,
    /// pages only
    Skip,
    Require,
    MakeOptional,
    Enable,
    Disable,
    SetValue,
    ClearValue,
    AddValidation,
    RemoveValidation,
    ShowMessage,
    Unknown(String),
}

impl Default for ActionKind {
    fn default() -> Self {
        ActionKind::Unknown(String::new())
    }
}

impl ActionKind {
    pub const KNOWN: &'static [&'static str] = &[
        "show",
        "hide",
        "skip",
        "require",
        "makeOptional",
        "enable",
        "disable",
        "setValue",
        "clearValue",
        "addValidation",
        "removeValidation",
        "showMessage",
    ];

    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "show" => ActionKind::Show,
            "hide" => ActionKind::Hide,
            "skip" => ActionKind::Skip,
            "require" => ActionKind::Require,
            "makeoptional" => ActionKind::MakeOptional,
            "enable" => ActionKind::Enable,
            "disable" => ActionKind::Disable,
            "setvalue" => ActionKind::SetValue,
            "clearvalue" => ActionKind::ClearValue,
            "addvalidation" => ActionKind::AddValidation,
            "removevalidation" => ActionKind::RemoveValidation,
            "showmessage" => ActionKind::ShowMessage,
            _ => ActionKind::Unknown(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Show => "show",
            ActionKind::Hide => "hide",
            ActionKind::Skip => "skip",
            ActionKind::Require => "require",
            ActionKind::MakeOptional => "makeOptional",
            ActionKind::Enable => "enable",
            ActionKind::Disable => "disable",
            ActionKind::SetValue => "setValue",
            ActionKind::ClearValue => "clearValue",
            ActionKind::AddValidation => "addValidation",
            ActionKind::RemoveValidation => "removeValidation",
            ActionKind::ShowMessage => "showMessage",
            ActionKind::Unknown(s) => s,
        }
    }

    /// actions that only make sense on fields
    pub fn is_field_only(&self) -> bool {
        matches!(
            self,
            ActionKind::Require
                | ActionKind::MakeOptional
                | ActionKind::Enable
                | ActionKind::Disable
                | ActionKind::SetValue
                | ActionKind::ClearValue
                | ActionKind::AddValidation
                | ActionKind::RemoveValidation
        )
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        ActionKind::parse(&s)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// a page or field a rule acts on
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedElement {
    #[serde(default)]
    pub element_id: String,
    #[serde(default)]
    pub element_type: Option<ElementType>,
    #[serde(default)]
    pub action: ActionKind,
    #[serde(default)]
    pub action_config: Map<String, JsonValue>,
}

impl AffectedElement {
    pub fn new(element_id: impl Into<String>, element_type: ElementType, action: ActionKind) -> Self {
        Self {
            element_id: element_id.into(),
            element_type: Some(element_type),
            action,
            action_config: Map::new(),
        }
    }

    pub fn page(page_id: impl Into<String>, action: ActionKind) -> Self {
        Self::new(page_id, ElementType::Page, action)
    }

    pub fn field(field_id: impl Into<String>, action: ActionKind) -> Self {
        Self::new(field_id, ElementType::Field, action)
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.action_config.insert(key.into(), value.into());
        self
    }
}

/// one affected element of a matched rule, ready to apply
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub rule_id: String,
    pub priority: i32,
    pub element_id: String,
    pub element_type: Option<ElementType>,
    pub kind: ActionKind,
    pub config: Map<String, JsonValue>,
}

impl Action {
    pub fn from_element(rule: &Rule, element: &AffectedElement) -> Self {
        Self {
            rule_id: rule.id.clone(),
            priority: rule.priority,
            element_id: element.element_id.clone(),
            element_type: element.element_type.clone(),
            kind: element.action.clone(),
            config: element.action_config.clone(),
        }
    }

    pub fn config_value(&self, key: &str) -> Option<Value> {
        self.config.get(key).map(Value::from_json)
    }

    /// config entry in text form; null and missing both read as none
    pub fn config_text(&self, key: &str) -> Option<String> {
        match self.config.get(key) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// outcome of one evaluation pass over a rule set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionalLogicResult {
    /// ids of every rule visited, in evaluation order
    pub evaluated_rules: Vec<String>,
    /// actions of matched rules, priority ordered
    pub actions: Vec<Action>,
    pub errors: Vec<String>,
}

/// authoring-time diagnostics for one rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleValidation {
    pub rule_id: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl RuleValidation {
    pub fn new(rule_id: impl Into<String>, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
