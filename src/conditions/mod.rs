//! condition evaluation system for form rules
//!
//! provides a condition tree supporting:
//! - logical operators: AND, OR, NOT ("not all true")
//! - equality, list membership and string operators
//! - data-type aware ordering for numbers, booleans and dates
//! - regex operators guarded by a wall-clock timeout
//!
//! conditions are read from a rule's `conditionGroup` in the form template.

mod compare;
mod eval;
mod parser;
mod pattern;
mod types;

pub use compare::{parse_bool, parse_date};
pub use eval::{ConditionEvaluator, EvalError, DEFAULT_MAX_DEPTH};
pub use parser::{parse_group, ParseError};
pub use pattern::{compile as compile_pattern, PatternError, PatternGuard, DEFAULT_PATTERN_TIMEOUT};
pub use types::{Condition, ConditionGroup, ConditionNode, DataType, LogicalOperator, Operator, Value};
