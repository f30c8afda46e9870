//! turns rule outcomes into a form state and answers navigation queries
//!
//! every call evaluates from scratch and returns an owned state; nothing
//! is cached between calls.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use thiserror::Error;
use tracing::{debug, debug_span, warn};

use super::types::{FormConditionalState, Message, ValidationRule};
use crate::conditions::Value;
use crate::config::EngineConfig;
use crate::context::ConditionalLogicContext;
use crate::form::{FormData, FormTemplate, Page};
use crate::rules::{
    sorted_enabled, Action, ActionKind, ConditionalLogicResult, ElementType, Rule, RuleEngine,
    RuleValidation,
};

const DEFAULT_MESSAGE_TYPE: &str = "info";

/// failure applying one action; the rest of the pass continues
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("'{action}' applies to {expected} elements only")]
    WrongElementType {
        action: String,
        expected: &'static str,
    },
    #[error("missing actionConfig.{0}")]
    MissingConfig(&'static str),
}

impl ActionError {
    fn fields_only(action: &ActionKind) -> Self {
        Self::WrongElementType {
            action: action.to_string(),
            expected: "field",
        }
    }

    fn pages_only(action: &ActionKind) -> Self {
        Self::WrongElementType {
            action: action.to_string(),
            expected: "page",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateOrchestrator {
    engine: RuleEngine,
}

impl StateOrchestrator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            engine: RuleEngine::new(config),
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// full evaluation of every enabled rule in the template
    pub fn apply_conditional_logic(
        &self,
        template: &FormTemplate,
        data: &FormData,
        ctx: &ConditionalLogicContext,
    ) -> FormConditionalState {
        self.apply_with_diagnostics(template, data, ctx).0
    }

    /// like [`apply_conditional_logic`](Self::apply_conditional_logic), also
    /// returning the evaluation result with action failures in `errors`
    pub fn apply_with_diagnostics(
        &self,
        template: &FormTemplate,
        data: &FormData,
        ctx: &ConditionalLogicContext,
    ) -> (FormConditionalState, ConditionalLogicResult) {
        let rules = template.rules();
        let enabled = sorted_enabled(rules);

        let mut state = FormConditionalState::default();
        declare_template_elements(&mut state, template);
        hide_referenced_elements(&mut state, template, &enabled);

        if rules.is_empty() {
            debug!(template = %template.id, "no conditional logic, using baseline");
            return (state, ConditionalLogicResult::default());
        }

        let mut result = self.engine.evaluate_selected(enabled, data, ctx);
        self.apply_actions(template, &mut state, &mut result);

        debug!(
            template = %template.id,
            rules = result.evaluated_rules.len(),
            actions = result.actions.len(),
            errors = result.errors.len(),
            "conditional logic applied"
        );
        (state, result)
    }

    pub fn get_element_visibility(
        &self,
        state: &FormConditionalState,
    ) -> BTreeMap<String, bool> {
        state.element_visibility()
    }

    pub fn get_field_required_state(
        &self,
        state: &FormConditionalState,
    ) -> BTreeMap<String, bool> {
        state.field_required_state()
    }

    /// first later page the user should land on
    pub fn get_next_page(
        &self,
        template: &FormTemplate,
        data: &FormData,
        current_page_id: &str,
        ctx: &ConditionalLogicContext,
    ) -> Option<String> {
        let pages = template.pages();
        let Some(index) = pages.iter().position(|p| p.page_id == current_page_id) else {
            debug!(page_id = current_page_id, "current page not in template");
            return None;
        };

        let state = self.apply_conditional_logic(template, data, ctx);
        pages[index + 1..]
            .iter()
            .find(|p| is_navigable(&state, p))
            .map(|p| p.page_id.clone())
    }

    /// nearest earlier page the user should land on
    pub fn get_previous_page(
        &self,
        template: &FormTemplate,
        data: &FormData,
        current_page_id: &str,
        ctx: &ConditionalLogicContext,
    ) -> Option<String> {
        let pages = template.pages();
        let Some(index) = pages.iter().position(|p| p.page_id == current_page_id) else {
            debug!(page_id = current_page_id, "current page not in template");
            return None;
        };

        let state = self.apply_conditional_logic(template, data, ctx);
        pages[..index]
            .iter()
            .rev()
            .find(|p| is_navigable(&state, p))
            .map(|p| p.page_id.clone())
    }

    pub fn should_skip_page(
        &self,
        template: &FormTemplate,
        data: &FormData,
        page_id: &str,
        ctx: &ConditionalLogicContext,
    ) -> bool {
        let state = self.apply_conditional_logic(template, data, ctx);
        state.is_page_skipped(page_id) || state.page_visibility.get(page_id) == Some(&false)
    }

    /// re-evaluate the rules reachable from one changed field
    ///
    /// the returned state holds entries only for the elements those rules
    /// target, with values matching what a full evaluation would produce.
    pub fn evaluate_field_change(
        &self,
        template: &FormTemplate,
        data: &FormData,
        changed_field_id: &str,
        ctx: &ConditionalLogicContext,
    ) -> FormConditionalState {
        let span = debug_span!("field_change", field = changed_field_id);
        let _guard = span.enter();

        let triggered = self.engine.triggered_rules(template.rules(), changed_field_id);
        if triggered.is_empty() {
            debug!("no rules read the changed field");
            return FormConditionalState::default();
        }

        let enabled = sorted_enabled(template.rules());
        let mut targets: BTreeSet<&str> = triggered
            .iter()
            .flat_map(|r| r.affected_elements.iter())
            .map(|e| e.element_id.as_str())
            .collect();

        // widen until every rule touching a target is included
        loop {
            let before = targets.len();
            for rule in &enabled {
                if rule
                    .affected_elements
                    .iter()
                    .any(|e| targets.contains(e.element_id.as_str()))
                {
                    targets.extend(rule.affected_elements.iter().map(|e| e.element_id.as_str()));
                }
            }
            if targets.len() == before {
                break;
            }
        }

        let selected: Vec<&Rule> = enabled
            .into_iter()
            .filter(|r| {
                r.affected_elements
                    .iter()
                    .any(|e| targets.contains(e.element_id.as_str()))
            })
            .collect();

        debug!(
            triggered = triggered.len(),
            selected = selected.len(),
            elements = targets.len(),
            "re-evaluating affected rules"
        );

        let mut state = FormConditionalState::default();
        hide_referenced_elements(&mut state, template, &selected);

        let mut result = self.engine.evaluate_selected(selected, data, ctx);
        self.apply_actions(template, &mut state, &mut result);
        state
    }

    /// authoring-time checks for every rule in the template
    pub fn validate_template_rules(&self, template: &FormTemplate) -> Vec<RuleValidation> {
        let mut seen: HashSet<&str> = HashSet::new();

        template
            .rules()
            .iter()
            .map(|rule| {
                let mut validation = self.engine.validate_rule(rule);

                if !rule.id.is_empty() && !seen.insert(rule.id.as_str()) {
                    validation.push_error(format!("duplicate rule id '{}'", rule.id));
                }

                if let Some(group) = &rule.condition_group {
                    let mut reported = HashSet::new();
                    for leaf in group.leaves(self.engine.evaluator().max_depth()) {
                        let field = leaf.trigger_field.as_str();
                        if !field.is_empty()
                            && !template.has_field(field)
                            && reported.insert(field)
                        {
                            validation.push_warning(format!(
                                "triggerField '{}' is not a field in the template",
                                field
                            ));
                        }
                    }
                }

                for (i, element) in rule.affected_elements.iter().enumerate() {
                    let id = element.element_id.as_str();
                    if id.is_empty() {
                        continue;
                    }
                    let declared = match &element.element_type {
                        Some(ElementType::Page) => template.has_page(id),
                        Some(ElementType::Field) => template.has_field(id),
                        _ => template.has_page(id) || template.has_field(id),
                    };
                    if !declared {
                        validation.push_warning(format!(
                            "affectedElements[{}]: '{}' is not declared in the template",
                            i, id
                        ));
                    }
                }

                validation
            })
            .collect()
    }

    fn apply_actions(
        &self,
        template: &FormTemplate,
        state: &mut FormConditionalState,
        result: &mut ConditionalLogicResult,
    ) {
        for action in &result.actions {
            if let Err(e) = apply_action(template, state, action) {
                warn!(
                    rule_id = %action.rule_id,
                    element_id = %action.element_id,
                    action = %action.kind,
                    error = %e,
                    "action skipped"
                );
                result.errors.push(format!(
                    "rule '{}': {} on '{}': {}",
                    action.rule_id, action.kind, action.element_id, e
                ));
            }
        }
    }
}

// ============================================================================
// Baseline
// ============================================================================

/// every declared page and field, visible, with its declared required flag
fn declare_template_elements(state: &mut FormConditionalState, template: &FormTemplate) {
    for page in template.pages() {
        state.page_visibility.insert(page.page_id.clone(), true);
        for field in &page.fields {
            state.field_visibility.insert(field.field_id.clone(), true);
            state.field_enabled.insert(field.field_id.clone(), true);
            state.field_required.insert(field.field_id.clone(), field.required);
        }
    }
}

/// elements targeted by the given rules start hidden until shown
fn hide_referenced_elements(state: &mut FormConditionalState, template: &FormTemplate, rules: &[&Rule]) {
    for element in rules.iter().flat_map(|r| r.affected_elements.iter()) {
        let id = &element.element_id;
        match resolve_element_type(template, element.element_type.as_ref(), id) {
            ElementType::Page => {
                state.page_visibility.insert(id.clone(), false);
            }
            _ => {
                state.field_visibility.insert(id.clone(), false);
                let declared = template.find_field(id).is_some_and(|f| f.required);
                state.field_required.entry(id.clone()).or_insert(declared);
                state.field_enabled.entry(id.clone()).or_insert(true);
            }
        }
    }
}

/// missing or unknown types fall back to what the template declares
fn resolve_element_type(template: &FormTemplate, declared: Option<&ElementType>, id: &str) -> ElementType {
    match declared {
        Some(ElementType::Field) => ElementType::Field,
        Some(ElementType::Page) => ElementType::Page,
        _ if template.has_page(id) => ElementType::Page,
        _ => ElementType::Field,
    }
}

/// a page is reachable when it is neither skipped nor hidden and shows at
/// least one field; a page without fields has nothing to show
fn is_navigable(state: &FormConditionalState, page: &Page) -> bool {
    if state.is_page_skipped(&page.page_id) || !state.is_page_visible(&page.page_id) {
        return false;
    }
    page.fields.iter().any(|f| state.is_field_visible(&f.field_id))
}

// ============================================================================
// Actions
// ============================================================================

fn apply_action(
    template: &FormTemplate,
    state: &mut FormConditionalState,
    action: &Action,
) -> Result<(), ActionError> {
    let id = action.element_id.clone();
    let element_type = resolve_element_type(template, action.element_type.as_ref(), &id);
    let is_page = element_type == ElementType::Page;

    let require_field = || {
        if is_page {
            Err(ActionError::fields_only(&action.kind))
        } else {
            Ok(())
        }
    };

    match &action.kind {
        ActionKind::Show | ActionKind::Hide => {
            let visible = action.kind == ActionKind::Show;
            if is_page {
                state.page_visibility.insert(id, visible);
            } else {
                state.field_visibility.insert(id, visible);
            }
        }
        ActionKind::Skip => {
            if !is_page {
                return Err(ActionError::pages_only(&action.kind));
            }
            state.skipped_pages.insert(id);
        }
        ActionKind::Require | ActionKind::MakeOptional => {
            require_field()?;
            state
                .field_required
                .insert(id, action.kind == ActionKind::Require);
        }
        ActionKind::Enable | ActionKind::Disable => {
            require_field()?;
            state
                .field_enabled
                .insert(id, action.kind == ActionKind::Enable);
        }
        ActionKind::SetValue => {
            require_field()?;
            let value = action
                .config_value("value")
                .ok_or(ActionError::MissingConfig("value"))?;
            state.field_values.insert(id, value);
        }
        ActionKind::ClearValue => {
            require_field()?;
            state.field_values.insert(id, Value::Null);
        }
        ActionKind::AddValidation => {
            require_field()?;
            let validation_type = action
                .config_text("validationType")
                .ok_or(ActionError::MissingConfig("validationType"))?;
            state
                .additional_validations
                .entry(id)
                .or_default()
                .push(ValidationRule {
                    validation_type,
                    rule: action.config_value("rule").unwrap_or_default(),
                    message: action.config_text("message"),
                });
        }
        ActionKind::RemoveValidation => {
            require_field()?;
            let validation_type = action
                .config_text("validationType")
                .ok_or(ActionError::MissingConfig("validationType"))?;
            if let Some(rules) = state.additional_validations.get_mut(&id) {
                rules.retain(|r| !r.validation_type.eq_ignore_ascii_case(&validation_type));
                if rules.is_empty() {
                    state.additional_validations.remove(&id);
                }
            }
        }
        ActionKind::ShowMessage => {
            let text = action
                .config_text("message")
                .ok_or(ActionError::MissingConfig("message"))?;
            state.messages.push(Message {
                text,
                message_type: action
                    .config_text("messageType")
                    .unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string()),
                target_element: id,
                rule_id: action.rule_id.clone(),
            });
        }
        ActionKind::Unknown(name) => {
            warn!(
                rule_id = %action.rule_id,
                element_id = %action.element_id,
                action = %name,
                "unknown action ignored"
            );
        }
    }

    Ok(())
}
