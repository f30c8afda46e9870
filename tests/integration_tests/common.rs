// shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use formrules::{ConditionalLogicContext, FormData, FormTemplate};

/// pet licence application: eligibility, pet details, vet, declaration
pub const PET_LICENCE: &str = r#"{
    "id": "pet-licence",
    "title": "Apply for a pet licence",
    "tasks": [
        {
            "taskId": "eligibility",
            "title": "Check eligibility",
            "pages": [
                {
                    "pageId": "about-you",
                    "fields": [
                        { "fieldId": "age", "type": "number", "required": true },
                        { "fieldId": "hasPet", "type": "radio", "required": true },
                        { "fieldId": "email", "type": "email" }
                    ]
                }
            ]
        },
        {
            "taskId": "your-pet",
            "title": "Tell us about your pet",
            "pages": [
                {
                    "pageId": "pet-details",
                    "fields": [
                        { "fieldId": "petName", "required": true },
                        { "fieldId": "species", "type": "select" },
                        { "fieldId": "notes", "type": "textarea" }
                    ]
                },
                {
                    "pageId": "vet",
                    "fields": [
                        { "fieldId": "vetName" },
                        { "fieldId": "vetPhone" }
                    ]
                }
            ]
        }
    ],
    "pages": [
        { "pageId": "declaration", "fields": [ { "fieldId": "agree", "type": "checkbox", "required": true } ] }
    ],
    "conditionalLogic": [
        {
            "id": "show-pet-details",
            "name": "Only owners describe their pet",
            "priority": 1,
            "conditionGroup": {
                "logicalOperator": "AND",
                "conditions": [
                    { "triggerField": "hasPet", "operator": "equals", "value": "yes" },
                    { "triggerField": "age", "operator": "between", "value": [18, 120], "dataType": "number" }
                ]
            },
            "affectedElements": [
                { "elementId": "pet-details", "elementType": "page", "action": "show" },
                { "elementId": "vet", "elementType": "page", "action": "show" }
            ]
        },
        {
            "id": "skip-vet-for-fish",
            "priority": 2,
            "conditionGroup": {
                "logicalOperator": "OR",
                "conditions": [
                    { "triggerField": "species", "operator": "in", "value": "fish,insect" },
                    { "triggerField": "hasPet", "operator": "notEquals", "value": "yes" }
                ]
            },
            "affectedElements": [
                { "elementId": "vet", "elementType": "page", "action": "skip" }
            ]
        },
        {
            "id": "dog-notes",
            "priority": 3,
            "conditionGroup": {
                "conditions": [
                    { "triggerField": "species", "operator": "equals", "value": "dog" }
                ]
            },
            "affectedElements": [
                { "elementId": "notes", "elementType": "field", "action": "show" },
                { "elementId": "notes", "elementType": "field", "action": "require" },
                { "elementId": "notes", "elementType": "field", "action": "addValidation",
                  "actionConfig": { "validationType": "maxLength", "rule": 500, "message": "Keep it under 500 characters" } },
                { "elementId": "notes", "elementType": "field", "action": "showMessage",
                  "actionConfig": { "message": "Dogs must be microchipped", "messageType": "warning" } }
            ]
        },
        {
            "id": "relax-notes-without-email",
            "priority": 4,
            "conditionGroup": {
                "logicalOperator": "NOT",
                "conditions": [
                    { "triggerField": "email", "operator": "isValidEmail" }
                ]
            },
            "affectedElements": [
                { "elementId": "notes", "elementType": "field", "action": "removeValidation",
                  "actionConfig": { "validationType": "maxLength" } }
            ]
        },
        {
            "id": "retired",
            "priority": 0,
            "enabled": false,
            "conditionGroup": { "conditions": [] },
            "affectedElements": [
                { "elementId": "declaration", "elementType": "page", "action": "hide" }
            ]
        }
    ]
}"#;

pub fn pet_licence() -> FormTemplate {
    FormTemplate::from_json(PET_LICENCE).expect("fixture template should parse")
}

pub fn answers(json: serde_json::Value) -> FormData {
    FormData::from_json(&json).expect("fixture answers should be an object")
}

pub fn ctx(page: &str) -> ConditionalLogicContext {
    ConditionalLogicContext::new()
        .with_current_page(page)
        .with_trigger("navigation")
}

/// write a file into a fresh temporary directory
pub fn write_temp(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}
