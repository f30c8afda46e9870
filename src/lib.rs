// library crate for formrules
// conditional logic for multi-step forms: rule evaluation, form state and navigation

pub mod conditions;
pub mod config;
pub mod context;
pub mod form;
pub mod rules;
pub mod state;

pub use config::EngineConfig;
pub use context::ConditionalLogicContext;
pub use form::{FormData, FormTemplate};
pub use rules::{ConditionalLogicResult, Rule, RuleEngine, RuleValidation};
pub use state::{FormConditionalState, StateOrchestrator};
