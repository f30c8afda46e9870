//! core types for the condition system

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::parser::ParseError;

/// comparison operators supported in conditions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// equality: equals, eq, ==
    Equals,
    /// inequality: notEquals, ne, !=
    NotEquals,
    /// list membership: in
    In,
    /// negated list membership: notIn
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    /// greater than: greaterThan, gt, >
    GreaterThan,
    /// less than: lessThan, lt, <
    LessThan,
    /// greater than or equal: greaterThanOrEqual, gte, >=
    GreaterThanOrEqual,
    /// less than or equal: lessThanOrEqual, lte, <=
    LessThanOrEqual,
    /// inclusive range: between [min, max]
    Between,
    IsEmpty,
    IsNotEmpty,
    IsTrue,
    IsFalse,
    /// exact character count
    HasLength,
    /// user-authored regex, run behind the pattern guard
    MatchesPattern,
    IsValidEmail,
    IsValidPhone,
    /// anything else; evaluating it is an error
    Unsupported(String),
}

impl Operator {
    /// every operator the evaluator understands, in canonical spelling
    pub const KNOWN: &'static [&'static str] = &[
        "equals",
        "notEquals",
        "in",
        "notIn",
        "contains",
        "startsWith",
        "endsWith",
        "greaterThan",
        "lessThan",
        "greaterThanOrEqual",
        "lessThanOrEqual",
        "between",
        "isEmpty",
        "isNotEmpty",
        "isTrue",
        "isFalse",
        "hasLength",
        "matchesPattern",
        "isValidEmail",
        "isValidPhone",
    ];

    /// parse operator from string (camelCase, snake_case or symbolic form)
    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "equals" | "eq" | "==" => Operator::Equals,
            "notequals" | "ne" | "!=" => Operator::NotEquals,
            "in" => Operator::In,
            "notin" => Operator::NotIn,
            "contains" => Operator::Contains,
            "startswith" => Operator::StartsWith,
            "endswith" => Operator::EndsWith,
            "greaterthan" | "gt" | ">" => Operator::GreaterThan,
            "lessthan" | "lt" | "<" => Operator::LessThan,
            "greaterthanorequal" | "greaterthanorequals" | "gte" | ">=" => {
                Operator::GreaterThanOrEqual
            }
            "lessthanorequal" | "lessthanorequals" | "lte" | "<=" => Operator::LessThanOrEqual,
            "between" => Operator::Between,
            "isempty" => Operator::IsEmpty,
            "isnotempty" => Operator::IsNotEmpty,
            "istrue" => Operator::IsTrue,
            "isfalse" => Operator::IsFalse,
            "haslength" => Operator::HasLength,
            "matchespattern" => Operator::MatchesPattern,
            "isvalidemail" => Operator::IsValidEmail,
            "isvalidphone" => Operator::IsValidPhone,
            _ => Operator::Unsupported(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::GreaterThanOrEqual => "greaterThanOrEqual",
            Operator::LessThanOrEqual => "lessThanOrEqual",
            Operator::Between => "between",
            Operator::IsEmpty => "isEmpty",
            Operator::IsNotEmpty => "isNotEmpty",
            Operator::IsTrue => "isTrue",
            Operator::IsFalse => "isFalse",
            Operator::HasLength => "hasLength",
            Operator::MatchesPattern => "matchesPattern",
            Operator::IsValidEmail => "isValidEmail",
            Operator::IsValidPhone => "isValidPhone",
            Operator::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Operator::Unsupported(_))
    }

    /// whether the operator reads the condition's `value`
    pub fn takes_operand(&self) -> bool {
        !matches!(
            self,
            Operator::IsEmpty
                | Operator::IsNotEmpty
                | Operator::IsTrue
                | Operator::IsFalse
                | Operator::IsValidEmail
                | Operator::IsValidPhone
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// how a condition interprets its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
}

impl DataType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" => Some(DataType::String),
            "number" | "numeric" | "decimal" | "integer" => Some(DataType::Number),
            "boolean" | "bool" => Some(DataType::Boolean),
            "date" | "datetime" => Some(DataType::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
        }
    }
}

/// how a group combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    /// "not all true": the group passes unless every child passes
    Not,
}

impl LogicalOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AND" | "ALL" => Some(LogicalOperator::And),
            "OR" | "ANY" => Some(LogicalOperator::Or),
            "NOT" => Some(LogicalOperator::Not),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
            LogicalOperator::Not => write!(f, "NOT"),
        }
    }
}

/// a form value or condition operand
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// missing or explicitly cleared
    #[default]
    Null,
    String(String),
    Number(Decimal),
    Bool(bool),
    /// multi-select answers, `in` lists and `between` ranges
    List(Vec<Value>),
}

impl Value {
    /// convert a JSON value; objects are kept as their JSON text
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                let text = n.to_string();
                parse_decimal(&text)
                    .map(Value::Number)
                    .unwrap_or(Value::String(text))
            }
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(_) => Value::String(json.to_string()),
        }
    }

    /// like [`Value::from_json`], but strings holding a JSON array (how
    /// multi-select answers are posted) are decoded into a list
    pub fn from_form_input(json: &JsonValue) -> Self {
        match json {
            JsonValue::String(s) => decode_json_array(s).unwrap_or_else(|| Value::String(s.clone())),
            other => Value::from_json(other),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Number(d) => decimal_to_json(d),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /// string form used by text comparisons; null is the empty string
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(d) => d.normalize().to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::as_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// null, all-whitespace string or empty list
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// items of a list operand: a list, a JSON array string or a
    /// comma-separated string
    pub fn list_items(&self) -> Vec<Value> {
        match self {
            Value::Null => Vec::new(),
            Value::List(items) => items.clone(),
            Value::String(s) => {
                if let Some(Value::List(items)) = decode_json_array(s) {
                    return items;
                }
                s.split(',')
                    .map(|part| Value::String(part.trim().to_string()))
                    .collect()
            }
            other => vec![other.clone()],
        }
    }
}

/// parse decimal text, accepting scientific notation
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn decode_json_array(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    match serde_json::from_str::<JsonValue>(trimmed) {
        Ok(json @ JsonValue::Array(_)) => Some(Value::from_json(&json)),
        _ => None,
    }
}

fn decimal_to_json(d: &Decimal) -> JsonValue {
    let d = d.normalize();
    if d.scale() == 0 {
        if let Some(i) = d.to_i64() {
            return JsonValue::from(i);
        }
    }
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(d.to_string()))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Number(d) => write!(f, "{}", d.normalize()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// a single trigger-field comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// form data key the condition reads
    pub trigger_field: String,
    pub operator: Operator,
    /// comparison operand
    pub value: Value,
    pub data_type: DataType,
}

impl Condition {
    pub fn new(trigger_field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            trigger_field: trigger_field.into(),
            operator,
            value,
            data_type: DataType::String,
        }
    }

    /// create an equality condition
    pub fn equals(trigger_field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(trigger_field, Operator::Equals, value.into())
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.takes_operand() {
            write!(f, "{} {} {}", self.trigger_field, self.operator, self.value)
        } else {
            write!(f, "{} {}", self.trigger_field, self.operator)
        }
    }
}

/// a boolean combination of conditions and nested groups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    pub operator: LogicalOperator,
    pub conditions: Vec<ConditionNode>,
    /// problems found while parsing this group or its own leaves
    pub issues: Vec<ParseError>,
}

impl ConditionGroup {
    pub fn new(operator: LogicalOperator, conditions: Vec<ConditionNode>) -> Self {
        Self {
            operator,
            conditions,
            issues: Vec::new(),
        }
    }

    /// create an AND group
    pub fn all(conditions: Vec<ConditionNode>) -> Self {
        Self::new(LogicalOperator::And, conditions)
    }

    /// create an OR group
    pub fn any(conditions: Vec<ConditionNode>) -> Self {
        Self::new(LogicalOperator::Or, conditions)
    }

    /// create a NOT ("not all true") group
    pub fn not_all(conditions: Vec<ConditionNode>) -> Self {
        Self::new(LogicalOperator::Not, conditions)
    }

    pub fn with_issues(mut self, issues: Vec<ParseError>) -> Self {
        self.issues = issues;
        self
    }

    /// check if this group is empty (always true)
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// nesting depth, counting this group as 1
    ///
    /// the walk stops below `limit`, so anything deeper reports `limit + 1`
    pub fn depth(&self, limit: usize) -> usize {
        self.depth_at(1, limit)
    }

    fn depth_at(&self, level: usize, limit: usize) -> usize {
        if level > limit {
            return level;
        }
        self.conditions
            .iter()
            .filter_map(|c| match c {
                ConditionNode::Group(g) => Some(g.depth_at(level + 1, limit)),
                ConditionNode::Leaf(_) => None,
            })
            .max()
            .unwrap_or(level)
    }

    /// whether any leaf within `limit` levels reads `field_id`
    pub fn references_field(&self, field_id: &str, limit: usize) -> bool {
        self.references_field_at(field_id, 1, limit)
    }

    fn references_field_at(&self, field_id: &str, level: usize, limit: usize) -> bool {
        if level > limit {
            return false;
        }
        self.conditions.iter().any(|c| match c {
            ConditionNode::Leaf(leaf) => leaf.trigger_field == field_id,
            ConditionNode::Group(g) => g.references_field_at(field_id, level + 1, limit),
        })
    }

    /// every leaf within `limit` levels, depth-first
    pub fn leaves(&self, limit: usize) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_leaves(1, limit, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, level: usize, limit: usize, out: &mut Vec<&'a Condition>) {
        if level > limit {
            return;
        }
        for c in &self.conditions {
            match c {
                ConditionNode::Leaf(leaf) => out.push(leaf),
                ConditionNode::Group(g) => g.collect_leaves(level + 1, limit, out),
            }
        }
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.operator {
            LogicalOperator::And => "all",
            LogicalOperator::Or => "any",
            LogicalOperator::Not => "not_all",
        };
        write!(f, "{}(", name)?;
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

/// the condition AST
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Leaf(Condition),
    Group(ConditionGroup),
}

impl From<Condition> for ConditionNode {
    fn from(c: Condition) -> Self {
        ConditionNode::Leaf(c)
    }
}

impl From<ConditionGroup> for ConditionNode {
    fn from(g: ConditionGroup) -> Self {
        ConditionNode::Group(g)
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionNode::Leaf(c) => write!(f, "{}", c),
            ConditionNode::Group(g) => write!(f, "{}", g),
        }
    }
}
