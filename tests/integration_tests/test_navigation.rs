// integration tests for page navigation

use formrules::StateOrchestrator;
use serde_json::json;

use crate::common::{answers, ctx, pet_licence};

#[test]
fn test_owner_walks_every_page() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "yes", "species": "dog", "email": "jo@example.com" }));

    let mut visited = vec!["about-you".to_string()];
    while let Some(next) =
        orchestrator.get_next_page(&template, &data, visited.last().unwrap(), &ctx("about-you"))
    {
        visited.push(next);
    }

    assert_eq!(visited, vec!["about-you", "pet-details", "vet", "declaration"]);
}

#[test]
fn test_fish_owner_skips_vet_both_ways() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": 40, "hasPet": "yes", "species": "fish" }));

    assert_eq!(
        orchestrator.get_next_page(&template, &data, "pet-details", &ctx("pet-details")),
        Some("declaration".to_string())
    );
    assert_eq!(
        orchestrator.get_previous_page(&template, &data, "declaration", &ctx("declaration")),
        Some("pet-details".to_string())
    );
    assert!(orchestrator.should_skip_page(&template, &data, "vet", &ctx("pet-details")));
    assert!(!orchestrator.should_skip_page(&template, &data, "pet-details", &ctx("about-you")));
}

#[test]
fn test_non_owner_goes_straight_to_declaration() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "no" }));

    assert_eq!(
        orchestrator.get_next_page(&template, &data, "about-you", &ctx("about-you")),
        Some("declaration".to_string())
    );
    assert!(orchestrator.should_skip_page(&template, &data, "pet-details", &ctx("about-you")));
    assert!(orchestrator.should_skip_page(&template, &data, "vet", &ctx("about-you")));
    assert!(!orchestrator.should_skip_page(&template, &data, "declaration", &ctx("about-you")));
}

#[test]
fn test_under_age_owner_is_kept_out_of_pet_pages() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();

    for age in ["16", "121", "not a number"] {
        let data = answers(json!({ "age": age, "hasPet": "yes", "species": "cat" }));
        assert_eq!(
            orchestrator.get_next_page(&template, &data, "about-you", &ctx("about-you")),
            Some("declaration".to_string()),
            "age {}",
            age
        );
    }
}

#[test]
fn test_boundary_ages_are_inclusive() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();

    for age in ["18", "120"] {
        let data = answers(json!({ "age": age, "hasPet": "yes", "species": "cat" }));
        assert_eq!(
            orchestrator.get_next_page(&template, &data, "about-you", &ctx("about-you")),
            Some("pet-details".to_string()),
            "age {}",
            age
        );
    }
}

#[test]
fn test_multi_select_answer_posted_as_json_array() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({ "age": "30", "hasPet": "yes", "species": "[\"cat\",\"insect\"]" }));

    assert!(orchestrator.should_skip_page(&template, &data, "vet", &ctx("pet-details")));
}

#[test]
fn test_last_and_unknown_pages() {
    let orchestrator = StateOrchestrator::default();
    let template = pet_licence();
    let data = answers(json!({}));

    assert_eq!(
        orchestrator.get_next_page(&template, &data, "declaration", &ctx("declaration")),
        None
    );
    assert_eq!(
        orchestrator.get_previous_page(&template, &data, "about-you", &ctx("about-you")),
        None
    );
    assert_eq!(
        orchestrator.get_next_page(&template, &data, "missing", &ctx("missing")),
        None
    );
}
