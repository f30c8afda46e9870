//! form state computed from conditional logic, plus navigation helpers

mod orchestrator;
mod types;

pub use orchestrator::{ActionError, StateOrchestrator};
pub use types::{FormConditionalState, Message, ValidationRule};
