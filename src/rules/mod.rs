//! conditional logic rules and their evaluation

mod engine;
mod types;

pub use engine::{sorted_enabled, RuleEngine, RuleError};
pub use types::{
    Action, ActionKind, AffectedElement, ConditionalLogicResult, ElementType, Rule, RuleValidation,
};
