//! condition evaluator
//!
//! evaluates condition trees against a snapshot of form answers. leaf
//! failures never escape a group: they are logged and count as false.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use tracing::{debug, warn};

use super::compare::{compare_values, is_truthy, to_decimal, values_equal};
use super::parser::ParseError;
use super::pattern::{PatternError, PatternGuard};
use super::types::{Condition, ConditionGroup, ConditionNode, DataType, LogicalOperator, Operator, Value};
use crate::config::EngineConfig;
use crate::form::FormData;

/// default limit on group nesting
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// error returned by condition evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),
    #[error("cannot read {value} as {data_type}")]
    InvalidOperand {
        value: String,
        data_type: &'static str,
    },
    #[error("operator '{operator}' requires {expected}")]
    MissingOperand {
        operator: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("condition nesting exceeds {max} levels")]
    DepthExceeded { max: usize },
    #[error("malformed condition: {0}")]
    Malformed(ParseError),
}

/// evaluates leaf conditions and condition groups
#[derive(Debug, Clone)]
pub struct ConditionEvaluator {
    patterns: PatternGuard,
    max_depth: usize,
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self {
            patterns: PatternGuard::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConditionEvaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            patterns: PatternGuard::new(config.pattern_timeout()),
            max_depth: config.max_condition_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// evaluate the root group of a rule
    pub fn evaluate_group(&self, group: &ConditionGroup, data: &FormData) -> Result<bool, EvalError> {
        self.evaluate_group_at(group, data, 1)
    }

    fn evaluate_group_at(
        &self,
        group: &ConditionGroup,
        data: &FormData,
        depth: usize,
    ) -> Result<bool, EvalError> {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded {
                max: self.max_depth,
            });
        }

        // a group that did not parse cleanly never runs
        if let Some(issue) = group.issues.first() {
            return Err(EvalError::Malformed(issue.clone()));
        }

        // empty group = true (vacuous truth), whatever the operator
        if group.conditions.is_empty() {
            return Ok(true);
        }

        let mut results = Vec::with_capacity(group.conditions.len());
        for node in &group.conditions {
            let passed = match node {
                ConditionNode::Group(inner) => self.evaluate_group_at(inner, data, depth + 1)?,
                ConditionNode::Leaf(leaf) => self.evaluate_leaf(leaf, data),
            };
            results.push(passed);
        }

        Ok(match group.operator {
            LogicalOperator::And => results.iter().all(|r| *r),
            LogicalOperator::Or => results.iter().any(|r| *r),
            // "not all true", not a per-term negation
            LogicalOperator::Not => !results.iter().all(|r| *r),
        })
    }

    /// evaluate a leaf, recovering any failure to false
    fn evaluate_leaf(&self, condition: &Condition, data: &FormData) -> bool {
        match self.evaluate(condition, data) {
            Ok(passed) => passed,
            Err(e @ EvalError::InvalidOperand { .. }) => {
                debug!(
                    field = %condition.trigger_field,
                    operator = %condition.operator,
                    error = %e,
                    "condition operand not comparable, treating as false"
                );
                false
            }
            Err(e) => {
                warn!(
                    field = %condition.trigger_field,
                    operator = %condition.operator,
                    error = %e,
                    "condition evaluation failed, treating as false"
                );
                false
            }
        }
    }

    /// evaluate one condition against the form data
    pub fn evaluate(&self, condition: &Condition, data: &FormData) -> Result<bool, EvalError> {
        let actual = data.get(&condition.trigger_field);
        let expected = &condition.value;
        let data_type = condition.data_type;

        match &condition.operator {
            Operator::Equals => values_equal(actual, expected, data_type),
            Operator::NotEquals => values_equal(actual, expected, data_type).map(|eq| !eq),
            Operator::In => Ok(is_in(actual, expected, data_type)),
            Operator::NotIn => Ok(!is_in(actual, expected, data_type)),
            Operator::Contains => Ok(contains(actual, expected)),
            Operator::StartsWith => Ok(lower(actual).starts_with(&lower(expected))),
            Operator::EndsWith => Ok(lower(actual).ends_with(&lower(expected))),
            Operator::GreaterThan => {
                Ok(compare_values(actual, expected, data_type)? == Ordering::Greater)
            }
            Operator::LessThan => Ok(compare_values(actual, expected, data_type)? == Ordering::Less),
            Operator::GreaterThanOrEqual => {
                Ok(compare_values(actual, expected, data_type)? != Ordering::Less)
            }
            Operator::LessThanOrEqual => {
                Ok(compare_values(actual, expected, data_type)? != Ordering::Greater)
            }
            Operator::Between => between(actual, expected, data_type),
            Operator::IsEmpty => Ok(actual.is_blank()),
            Operator::IsNotEmpty => Ok(!actual.is_blank()),
            Operator::IsTrue => Ok(is_truthy(actual)),
            Operator::IsFalse => Ok(!is_truthy(actual)),
            Operator::HasLength => has_length(actual, expected),
            Operator::MatchesPattern => {
                let pattern = expected.as_text();
                if pattern.is_empty() {
                    return Err(EvalError::MissingOperand {
                        operator: condition.operator.to_string(),
                        expected: "a pattern",
                    });
                }
                Ok(self.patterns.is_match(&pattern, &actual.as_text())?)
            }
            Operator::IsValidEmail => Ok(self.patterns.is_valid_email(&actual.as_text())?),
            Operator::IsValidPhone => Ok(self.patterns.is_valid_phone(&actual.as_text())?),
            Operator::Unsupported(name) => Err(EvalError::UnsupportedOperator(name.clone())),
        }
    }
}

// ============================================================================
// Operator Helpers
// ============================================================================

fn lower(value: &Value) -> String {
    value.as_text().to_lowercase()
}

/// multi-select answers pass when any selected item is in the list
fn is_in(actual: &Value, expected: &Value, data_type: DataType) -> bool {
    let options = expected.list_items();
    let selected = match actual {
        Value::List(items) => items.clone(),
        other => vec![other.clone()],
    };

    selected.iter().any(|s| {
        options
            .iter()
            .any(|o| values_equal(s, o, data_type).unwrap_or(false))
    })
}

fn contains(actual: &Value, expected: &Value) -> bool {
    let needle = lower(expected);
    match actual {
        Value::List(items) => items.iter().any(|item| lower(item) == needle),
        other => lower(other).contains(&needle),
    }
}

fn between(actual: &Value, expected: &Value, data_type: DataType) -> Result<bool, EvalError> {
    let bounds = expected.list_items();
    let [min, max] = bounds.as_slice() else {
        return Err(EvalError::MissingOperand {
            operator: Operator::Between.to_string(),
            expected: "a [min, max] pair",
        });
    };

    Ok(compare_values(actual, min, data_type)? != Ordering::Less
        && compare_values(actual, max, data_type)? != Ordering::Greater)
}

fn has_length(actual: &Value, expected: &Value) -> Result<bool, EvalError> {
    let length = to_decimal(expected)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_usize())
        .ok_or_else(|| EvalError::InvalidOperand {
            value: expected.to_string(),
            data_type: "length",
        })?;

    Ok(actual.as_text().chars().count() == length)
}
