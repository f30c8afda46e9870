// integration tests for computed form state

use formrules::conditions::Value;
use formrules::{EngineConfig, FormTemplate, StateOrchestrator};
use serde_json::json;

use crate::common::{answers, ctx, pet_licence};

#[test]
fn test_dog_owner_state() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "yes", "species": "dog", "email": "jo@example.com" }));

    let (state, result) = orchestrator.apply_with_diagnostics(&template, &data, &ctx("pet-details"));

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.evaluated_rules,
        vec!["show-pet-details", "skip-vet-for-fish", "dog-notes", "relax-notes-without-email"]
    );

    assert!(state.is_page_visible("pet-details"));
    assert!(state.is_page_visible("vet"));
    assert!(!state.is_page_skipped("vet"));
    assert!(state.is_field_visible("notes"));
    assert!(state.is_field_required("notes"));

    let validations = &state.additional_validations["notes"];
    assert_eq!(validations.len(), 1);
    assert_eq!(validations[0].validation_type, "maxLength");
    assert_eq!(validations[0].rule, Value::from(500));

    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].message_type, "warning");
    assert_eq!(state.messages[0].rule_id, "dog-notes");
}

#[test]
fn test_declared_defaults_survive_when_nothing_matches() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let state = orchestrator.apply_conditional_logic(&template, &answers(json!({})), &ctx("about-you"));

    // unreferenced elements keep their declared flags
    assert_eq!(state.field_visibility.get("age"), Some(&true));
    assert_eq!(state.field_required.get("age"), Some(&true));
    assert_eq!(state.field_required.get("email"), Some(&false));
    assert_eq!(state.field_enabled.get("vetName"), Some(&true));
    assert_eq!(state.page_visibility.get("declaration"), Some(&true));

    // referenced elements wait for a show
    assert_eq!(state.page_visibility.get("pet-details"), Some(&false));
    assert_eq!(state.field_visibility.get("notes"), Some(&false));

    let required = orchestrator.get_field_required_state(&state);
    assert_eq!(required.get("agree"), Some(&true));
    assert_eq!(required.get("notes"), Some(&false));

    let visibility = orchestrator.get_element_visibility(&state);
    assert_eq!(visibility.get("vet"), Some(&false));
    assert_eq!(visibility.get("petName"), Some(&true));
}

#[test]
fn test_missing_email_relaxes_notes_validation() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "yes", "species": "dog" }));

    let state = orchestrator.apply_conditional_logic(&template, &data, &ctx("pet-details"));

    assert!(state.is_field_required("notes"));
    assert!(!state.additional_validations.contains_key("notes"));
}

#[test]
fn test_repeated_evaluation_serializes_identically() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "yes", "species": "dog" }));

    let first = serde_json::to_string(&orchestrator.apply_conditional_logic(&template, &data, &ctx("a"))).unwrap();
    let second = serde_json::to_string(&orchestrator.apply_conditional_logic(&template, &data, &ctx("b"))).unwrap();

    assert_eq!(first, second);
    assert!(first.contains("\"pageVisibility\""));
    assert!(first.contains("\"additionalValidations\""));
}

#[test]
fn test_species_change_returns_delta() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "yes", "species": "dog", "email": "jo@example.com" }));

    let delta = orchestrator.evaluate_field_change(&template, &data, "species", &ctx("pet-details"));
    let full = orchestrator.apply_conditional_logic(&template, &data, &ctx("pet-details"));

    let pages: Vec<&str> = delta.page_visibility.keys().map(|k| k.as_str()).collect();
    assert_eq!(pages, vec!["pet-details", "vet"]);
    let fields: Vec<&str> = delta.field_visibility.keys().map(|k| k.as_str()).collect();
    assert_eq!(fields, vec!["notes"]);

    for page in &pages {
        assert_eq!(delta.page_visibility.get(*page), full.page_visibility.get(*page));
    }
    assert_eq!(delta.field_required.get("notes"), full.field_required.get("notes"));
    assert_eq!(delta.additional_validations, full.additional_validations);
    assert_eq!(delta.messages, full.messages);
}

#[test]
fn test_change_to_unwatched_field_is_empty() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "vetName": "Dr Who" }));

    let delta = orchestrator.evaluate_field_change(&template, &data, "vetName", &ctx("vet"));
    assert!(delta.is_empty());
}

#[test]
fn test_template_without_tasks_or_rules() {
    let orchestrator = StateOrchestrator::default();
    let template = FormTemplate::from_json(
        r#"{ "pages": [ { "pageId": "only", "fields": [ { "fieldId": "q", "required": true } ] } ] }"#,
    )
    .unwrap();

    let (state, result) = orchestrator.apply_with_diagnostics(&template, &answers(json!({})), &ctx("only"));
    assert!(result.evaluated_rules.is_empty());
    assert!(state.is_page_visible("only"));
    assert!(state.is_field_required("q"));
}

#[test]
fn test_depth_limit_from_config() {
    let config = EngineConfig {
        max_condition_depth: 2,
        ..EngineConfig::default()
    };
    let orchestrator = StateOrchestrator::new(&config);
    let template = FormTemplate::from_json(
        r#"{
            "pages": [ { "pageId": "P1", "fields": [ { "fieldId": "x" } ] } ],
            "conditionalLogic": [
                {
                    "id": "deep",
                    "conditionGroup": { "conditions": [ { "conditions": [ { "conditions": [
                        { "triggerField": "x", "operator": "isNotEmpty" }
                    ] } ] } ] },
                    "affectedElements": [ { "elementId": "P1", "elementType": "page", "action": "show" } ]
                }
            ]
        }"#,
    )
    .unwrap();

    let (state, result) =
        orchestrator.apply_with_diagnostics(&template, &answers(json!({ "x": "1" })), &ctx("P1"));

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("rule 'deep'"));
    assert!(!state.is_page_visible("P1"));
}
