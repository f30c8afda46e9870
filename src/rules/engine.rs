//! rule evaluation and authoring-time validation

use strsim::levenshtein;
use thiserror::Error;
use tracing::{debug, debug_span, warn};

use super::types::{
    Action, ActionKind, AffectedElement, ConditionalLogicResult, ElementType, Rule, RuleValidation,
};
use crate::conditions::{
    compile_pattern, ConditionEvaluator, ConditionGroup, ConditionNode, EvalError, Operator, Value,
};
use crate::config::EngineConfig;
use crate::context::ConditionalLogicContext;
use crate::form::FormData;

/// error returned when a whole rule cannot be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule has no condition group")]
    MissingConditionGroup,
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// evaluates rule sets into priority-ordered actions
#[derive(Debug, Clone)]
pub struct RuleEngine {
    evaluator: ConditionEvaluator,
    suggestion_threshold: usize,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// enabled rules, ascending priority; ties keep declaration order
pub fn sorted_enabled(rules: &[Rule]) -> Vec<&Rule> {
    let mut enabled: Vec<&Rule> = rules.iter().filter(|r| r.enabled).collect();
    enabled.sort_by_key(|r| r.priority);
    enabled
}

impl RuleEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(config),
            suggestion_threshold: config.suggestion_threshold,
        }
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    /// evaluate a single rule's condition tree
    pub fn evaluate_rule(&self, rule: &Rule, data: &FormData) -> Result<bool, RuleError> {
        let group = rule
            .condition_group
            .as_ref()
            .ok_or(RuleError::MissingConditionGroup)?;
        Ok(self.evaluator.evaluate_group(group, data)?)
    }

    pub fn evaluate_rules(
        &self,
        rules: &[Rule],
        data: &FormData,
        ctx: &ConditionalLogicContext,
    ) -> ConditionalLogicResult {
        self.evaluate_selected(sorted_enabled(rules), data, ctx)
    }

    /// evaluate rules already filtered and ordered by the caller
    pub(crate) fn evaluate_selected(
        &self,
        rules: Vec<&Rule>,
        data: &FormData,
        ctx: &ConditionalLogicContext,
    ) -> ConditionalLogicResult {
        let span = debug_span!(
            "evaluate_rules",
            trigger = ctx.trigger_label(),
            page = ctx.page_label(),
            client_side = ctx.is_client_side,
        );
        let _guard = span.enter();

        let mut result = ConditionalLogicResult::default();

        for rule in rules {
            result.evaluated_rules.push(rule.id.clone());

            match self.evaluate_rule(rule, data) {
                Ok(true) => {
                    debug!(rule_id = %rule.id, priority = rule.priority, "rule matched");
                    result.actions.extend(
                        rule.affected_elements
                            .iter()
                            .map(|element| Action::from_element(rule, element)),
                    );
                }
                Ok(false) => debug!(rule_id = %rule.id, "rule did not match"),
                Err(e) => {
                    warn!(rule_id = %rule.id, error = %e, "rule evaluation failed");
                    result.errors.push(format!("rule '{}': {}", rule.id, e));
                }
            }
        }

        // stable: equal priorities keep evaluation order
        result.actions.sort_by_key(|a| a.priority);
        result
    }

    /// enabled rules whose conditions read `field_id`
    pub fn triggered_rules<'a>(&self, rules: &'a [Rule], field_id: &str) -> Vec<&'a Rule> {
        let max_depth = self.evaluator.max_depth();
        rules
            .iter()
            .filter(|r| r.enabled && r.references_field(field_id, max_depth))
            .collect()
    }

    pub fn validate_rule(&self, rule: &Rule) -> RuleValidation {
        let mut validation = RuleValidation::new(rule.id.clone(), Vec::new(), Vec::new());

        if rule.id.trim().is_empty() {
            validation.push_error("id is required");
        }
        if !rule.enabled {
            validation.push_warning("rule is disabled and will not be evaluated");
        }

        match &rule.condition_group {
            None => validation.push_error("conditionGroup is required"),
            Some(group) => {
                if group.is_empty() {
                    validation.push_warning("conditionGroup has no conditions, the rule always matches");
                }
                let max_depth = self.evaluator.max_depth();
                if group.depth(max_depth) > max_depth {
                    validation.push_warning(format!(
                        "conditionGroup nests more than {} levels, evaluation stops there",
                        max_depth
                    ));
                }
                self.validate_group(group, "conditionGroup", 1, &mut validation);
            }
        }

        if rule.affected_elements.is_empty() {
            validation.push_error("affectedElements must not be empty");
        }
        for (i, element) in rule.affected_elements.iter().enumerate() {
            self.validate_element(element, &format!("affectedElements[{}]", i), &mut validation);
        }

        validation
    }

    fn validate_group(
        &self,
        group: &ConditionGroup,
        path: &str,
        level: usize,
        validation: &mut RuleValidation,
    ) {
        // too deep: already reported as a depth warning
        if level > self.evaluator.max_depth() {
            return;
        }

        // issue paths are relative to the root group
        for issue in &group.issues {
            if issue.path.is_empty() {
                validation.push_error(format!("conditionGroup: {}", issue.message));
            } else {
                validation.push_error(format!("conditionGroup.{}", issue));
            }
        }

        for (i, node) in group.conditions.iter().enumerate() {
            let path = format!("{}.conditions[{}]", path, i);
            match node {
                ConditionNode::Group(inner) => {
                    if inner.is_empty() {
                        validation.push_warning(format!("{}: nested group has no conditions", path));
                    }
                    self.validate_group(inner, &path, level + 1, validation);
                }
                ConditionNode::Leaf(leaf) => {
                    if leaf.trigger_field.trim().is_empty() {
                        validation.push_error(format!("{}: triggerField is required", path));
                    }
                    self.validate_operator(&leaf.operator, &leaf.value, &path, validation);
                }
            }
        }
    }

    fn validate_operator(
        &self,
        operator: &Operator,
        value: &Value,
        path: &str,
        validation: &mut RuleValidation,
    ) {
        match operator {
            Operator::Unsupported(name) if name.is_empty() => {
                validation.push_error(format!("{}: operator is required", path));
            }
            Operator::Unsupported(name) => {
                let mut message = format!("{}: unknown operator '{}'", path, name);
                if let Some(hint) = suggest(name, Operator::KNOWN, self.suggestion_threshold) {
                    message.push_str(&format!(", did you mean '{}'?", hint));
                }
                validation.push_error(message);
            }
            Operator::Between => {
                if value.is_null() {
                    validation.push_warning(format!("{}: 'between' has no value", path));
                } else if value.list_items().len() != 2 {
                    validation.push_error(format!("{}: 'between' requires a [min, max] pair", path));
                }
            }
            Operator::MatchesPattern => {
                let pattern = value.as_text();
                if pattern.is_empty() {
                    validation.push_warning(format!("{}: 'matchesPattern' has no pattern", path));
                } else if let Err(e) = compile_pattern(&pattern) {
                    validation.push_error(format!("{}: {}", path, e));
                }
            }
            Operator::In | Operator::NotIn | Operator::HasLength if value.is_null() => {
                validation.push_warning(format!("{}: '{}' has no value", path, operator));
            }
            _ => {}
        }
    }

    fn validate_element(&self, element: &AffectedElement, path: &str, validation: &mut RuleValidation) {
        if element.element_id.trim().is_empty() {
            validation.push_error(format!("{}: elementId is required", path));
        }

        match &element.element_type {
            None => validation.push_error(format!("{}: elementType is required", path)),
            Some(ElementType::Unknown(name)) => validation.push_error(format!(
                "{}: unknown elementType '{}': use field or page",
                path, name
            )),
            Some(ElementType::Page) if element.action.is_field_only() => {
                validation.push_error(format!(
                    "{}: '{}' applies to fields only",
                    path, element.action
                ));
            }
            Some(ElementType::Field) if element.action == ActionKind::Skip => {
                validation.push_error(format!("{}: 'skip' applies to pages only", path));
            }
            Some(_) => {}
        }

        let has = |key: &str| element.action_config.get(key).is_some_and(|v| !v.is_null());

        match &element.action {
            ActionKind::Unknown(name) if name.is_empty() => {
                validation.push_error(format!("{}: action is required", path));
            }
            ActionKind::Unknown(name) => {
                let mut message = format!("{}: unknown action '{}'", path, name);
                if let Some(hint) = suggest(name, ActionKind::KNOWN, self.suggestion_threshold) {
                    message.push_str(&format!(", did you mean '{}'?", hint));
                }
                validation.push_error(message);
            }
            ActionKind::SetValue if !has("value") => {
                validation.push_error(format!("{}: setValue requires actionConfig.value", path));
            }
            ActionKind::AddValidation | ActionKind::RemoveValidation if !has("validationType") => {
                validation.push_error(format!(
                    "{}: {} requires actionConfig.validationType",
                    path, element.action
                ));
            }
            ActionKind::ShowMessage if !has("message") => {
                validation.push_error(format!("{}: showMessage requires actionConfig.message", path));
            }
            _ => {}
        }
    }
}

/// closest known name within the edit-distance threshold
fn suggest<'a>(name: &str, known: &[&'a str], threshold: usize) -> Option<&'a str> {
    let name_lower = name.to_lowercase();
    let mut candidates: Vec<(&str, usize)> = known
        .iter()
        .map(|k| (*k, levenshtein(&name_lower, &k.to_lowercase())))
        .filter(|(_, distance)| *distance <= threshold)
        .collect();

    candidates.sort_by_key(|(_, distance)| *distance);
    candidates.first().map(|(k, _)| *k)
}
