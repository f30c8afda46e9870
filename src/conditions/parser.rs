//! condition parser - converts template JSON to the condition AST
//!
//! template conditions are dual-purpose objects: one carrying a non-empty
//! `conditions` array is a nested group with its own `logicalOperator`,
//! anything else is a leaf with `triggerField`, `operator`, `value` and
//! `dataType`.
//!
//! parsing never fails. malformed pieces are recorded as [`ParseError`]s on
//! the group that holds them, so one bad rule cannot take down a template:
//! rule validation reports the issues and evaluation refuses the group.

use serde::de::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use super::types::{Condition, ConditionGroup, ConditionNode, DataType, LogicalOperator, Operator, Value};

/// a malformed piece of a condition tree, located by its JSON path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub path: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// parse a rule's root `conditionGroup`
pub fn parse_group(json: &JsonValue) -> ConditionGroup {
    parse_group_at(json, "")
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn parse_group_at(json: &JsonValue, path: &str) -> ConditionGroup {
    let mut issues = Vec::new();

    let Some(obj) = json.as_object() else {
        issues.push(ParseError::new(format!("expected object, got {}", json), path));
        return ConditionGroup::default().with_issues(issues);
    };

    let operator = match obj.get("logicalOperator") {
        None | Some(JsonValue::Null) => LogicalOperator::default(),
        Some(JsonValue::String(s)) => LogicalOperator::parse(s).unwrap_or_else(|| {
            issues.push(ParseError::new(
                format!("unknown logicalOperator '{}': use AND, OR or NOT", s),
                join(path, "logicalOperator"),
            ));
            LogicalOperator::default()
        }),
        Some(other) => {
            issues.push(ParseError::new(
                format!("logicalOperator must be a string, got {}", other),
                join(path, "logicalOperator"),
            ));
            LogicalOperator::default()
        }
    };

    let mut conditions = Vec::new();
    match obj.get("conditions") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = join(path, &format!("conditions[{}]", i));
                if let Some(node) = parse_node(item, &item_path, &mut issues) {
                    conditions.push(node);
                }
            }
        }
        Some(_) => issues.push(ParseError::new(
            "'conditions' must be an array",
            join(path, "conditions"),
        )),
    }

    ConditionGroup::new(operator, conditions).with_issues(issues)
}

/// parse one entry of a `conditions` array; non-objects are dropped
fn parse_node(json: &JsonValue, path: &str, issues: &mut Vec<ParseError>) -> Option<ConditionNode> {
    let Some(obj) = json.as_object() else {
        issues.push(ParseError::new(format!("expected object, got {}", json), path));
        return None;
    };

    let nested = obj.get("conditions").and_then(JsonValue::as_array);
    let has_trigger = obj.get("triggerField").is_some_and(|v| !v.is_null());
    let is_group = match nested {
        Some(items) => !items.is_empty() || !has_trigger,
        None => false,
    };

    if is_group {
        Some(ConditionNode::Group(parse_group_at(json, path)))
    } else {
        Some(ConditionNode::Leaf(parse_leaf(obj, path, issues)))
    }
}

fn parse_leaf(obj: &Map<String, JsonValue>, path: &str, issues: &mut Vec<ParseError>) -> Condition {
    let trigger_field = optional_string(obj, "triggerField", path, issues).unwrap_or_default();
    let operator = optional_string(obj, "operator", path, issues)
        .map(|s| Operator::parse(&s))
        .unwrap_or_else(|| Operator::Unsupported(String::new()));

    // unknown types fall back to string; the recorded issue keeps the leaf from running
    let data_type = match optional_string(obj, "dataType", path, issues) {
        None => DataType::default(),
        Some(s) => DataType::parse(&s).unwrap_or_else(|| {
            issues.push(ParseError::new(
                format!(
                    "unknown dataType '{}': use string, number, boolean or date",
                    s
                ),
                join(path, "dataType"),
            ));
            DataType::default()
        }),
    };

    let value = obj.get("value").map(Value::from_json).unwrap_or_default();

    Condition {
        trigger_field,
        operator,
        value,
        data_type,
    }
}

fn optional_string(
    obj: &Map<String, JsonValue>,
    key: &str,
    path: &str,
    issues: &mut Vec<ParseError>,
) -> Option<String> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(other) => {
            issues.push(ParseError::new(
                format!("'{}' must be a string, got {}", key, other),
                join(path, key),
            ));
            None
        }
    }
}

impl<'de> Deserialize<'de> for ConditionGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        Ok(parse_group(&json))
    }
}
