// integration tests for authoring-time rule validation

use formrules::{FormTemplate, StateOrchestrator};
use serde_json::json;

use crate::common::{answers, ctx, pet_licence};

#[test]
fn test_fixture_rules_are_valid() {
    let orchestrator = StateOrchestrator::default();
    let results = orchestrator.validate_template_rules(&pet_licence());

    assert_eq!(results.len(), 5);
    for result in &results {
        assert!(result.is_valid, "{}: {:?}", result.rule_id, result.errors);
    }

    let retired = results.iter().find(|r| r.rule_id == "retired").unwrap();
    assert!(retired.warnings.iter().any(|w| w.contains("disabled")));
    assert!(retired.warnings.iter().any(|w| w.contains("no conditions")));

    let live_warnings: usize = results
        .iter()
        .filter(|r| r.rule_id != "retired")
        .map(|r| r.warnings.len())
        .sum();
    assert_eq!(live_warnings, 0);
}

#[test]
fn test_authoring_mistakes_are_reported() {
    let template = FormTemplate::from_json(
        r#"{
            "pages": [ { "pageId": "P1", "fields": [ { "fieldId": "age" }, { "fieldId": "code" } ] } ],
            "conditionalLogic": [
                {
                    "id": "typos",
                    "conditionGroup": {
                        "logicalOperator": "or",
                        "conditions": [
                            { "triggerField": "age", "operator": "greater_than_or_equals", "value": 18 },
                            { "triggerField": "age", "operator": "betwen", "value": [1, 2] },
                            { "triggerField": "code", "operator": "matchesPattern", "value": "[unclosed" }
                        ]
                    },
                    "affectedElements": [
                        { "elementId": "code", "elementType": "field", "action": "hid" },
                        { "elementId": "P1", "elementType": "page", "action": "setValue" }
                    ]
                },
                {
                    "id": "typos",
                    "conditionGroup": { "conditions": [ { "triggerField": "age", "operator": "isEmpty" } ] },
                    "affectedElements": [ { "elementId": "Ghost", "elementType": "page", "action": "hide" } ]
                }
            ]
        }"#,
    )
    .unwrap();

    let results = StateOrchestrator::default().validate_template_rules(&template);
    let first = results[0].errors.join("\n");

    assert!(!results[0].is_valid);
    assert!(first.contains("unknown operator 'betwen', did you mean 'between'?"));
    assert!(first.contains("invalid pattern"));
    assert!(first.contains("unknown action 'hid', did you mean 'hide'?"));
    assert!(first.contains("'setValue' applies to fields only"));
    // snake_case spellings of known operators are accepted
    assert!(!first.contains("greater_than_or_equals"));

    assert_eq!(results[1].errors, vec!["duplicate rule id 'typos'".to_string()]);
    assert!(results[1].warnings.iter().any(|w| w.contains("'Ghost' is not declared")));
}

#[test]
fn test_malformed_rule_is_reported_while_the_rest_still_run() {
    let template = FormTemplate::from_json(
        r#"{
            "pages": [
                { "pageId": "P1", "fields": [ { "fieldId": "plan" } ] },
                { "pageId": "P2", "fields": [ { "fieldId": "extras" } ] },
                { "pageId": "P3", "fields": [ { "fieldId": "confirm" } ] }
            ],
            "conditionalLogic": [
                {
                    "id": "bad",
                    "conditionGroup": {
                        "conditions": [ { "logicalOperator": "XOR", "conditions": [ { "triggerField": "plan", "operator": "isEmpty" } ] } ]
                    },
                    "affectedElements": [ { "elementId": "confirm", "elementType": "field", "action": "require" } ]
                },
                {
                    "id": "basic-skips-extras",
                    "conditionGroup": { "conditions": [ { "triggerField": "plan", "operator": "equals", "value": "basic" } ] },
                    "affectedElements": [ { "elementId": "P2", "elementType": "page", "action": "skip" } ]
                }
            ]
        }"#,
    )
    .unwrap();
    let orchestrator = StateOrchestrator::default();

    let results = orchestrator.validate_template_rules(&template);
    assert!(!results[0].is_valid);
    assert!(results[0].errors.iter().any(|e| e.contains("conditions[0].logicalOperator") && e.contains("XOR")));
    assert!(results[1].is_valid, "{:?}", results[1].errors);

    let (state, result) = orchestrator.apply_with_diagnostics(&template, &answers(json!({})), &ctx("P1"));
    assert_eq!(state.field_required.get("confirm"), Some(&false));
    assert!(result.errors.iter().any(|e| e.contains("rule 'bad'")));

    let data = answers(json!({ "plan": "basic" }));
    assert_eq!(
        orchestrator.get_next_page(&template, &data, "P1", &ctx("P1")),
        Some("P3".to_string())
    );
}
