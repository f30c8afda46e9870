//! evaluation context supplied by the caller
//!
//! only recorded in log fields; it never changes an evaluation outcome.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLogicContext {
    #[serde(default)]
    pub current_page_id: Option<String>,
    #[serde(default)]
    pub current_task_id: Option<String>,
    #[serde(default)]
    pub is_client_side: bool,
    /// what prompted the evaluation, e.g. "load" or "change"
    #[serde(default)]
    pub trigger: Option<String>,
}

impl ConditionalLogicContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_page(mut self, page_id: impl Into<String>) -> Self {
        self.current_page_id = Some(page_id.into());
        self
    }

    pub fn with_current_task(mut self, task_id: impl Into<String>) -> Self {
        self.current_task_id = Some(task_id.into());
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn client_side(mut self, is_client_side: bool) -> Self {
        self.is_client_side = is_client_side;
        self
    }

    pub(crate) fn trigger_label(&self) -> &str {
        self.trigger.as_deref().unwrap_or("unspecified")
    }

    pub(crate) fn page_label(&self) -> &str {
        self.current_page_id.as_deref().unwrap_or("-")
    }
}
