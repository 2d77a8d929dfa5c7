//! Integration tests for schema-document analysis.
//!
//! These tests feed whole JSON documents through the public facade and
//! verify which models come out eligible, which cursor each one gets, and
//! why the rest were skipped.

use fieldcrypt::schema::{self, CursorKind, SchemaDocument, SkipReason};

/// Test that a document with marked fields yields an eligible model
#[test]
fn test_analyze_document_with_encrypted_fields() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "User",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "email", "type": "String", "documentation": "@encrypted" },
                        { "name": "phone", "type": "String", "documentation": "@encrypted" },
                        { "name": "name", "type": "String" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");

    assert_eq!(analysis.eligible.len(), 1);
    assert!(analysis.skipped.is_empty());

    let user = &analysis.eligible[0];
    assert_eq!(user.name, "User");
    assert_eq!(user.field_names(), vec!["email", "phone"]);

    let cursor = user.cursor.as_ref().expect("Expected a cursor");
    assert_eq!(cursor.name, "id");
    assert_eq!(cursor.kind, CursorKind::Int);
}

/// Test that models without markers are skipped with a reason
#[test]
fn test_unmarked_models_are_skipped() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Config",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "value", "type": "String" }
                    ]
                },
                {
                    "name": "Secret",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "token", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");

    assert_eq!(analysis.eligible_names(), vec!["Secret"]);
    assert_eq!(analysis.skipped.len(), 1);
    assert_eq!(analysis.skipped[0].name, "Config");
    assert_eq!(analysis.skipped[0].reason, SkipReason::NoEncryptedFields);
}

/// Test that the id field wins over earlier unique fields
#[test]
fn test_id_field_preferred_over_unique() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Account",
                    "fields": [
                        { "name": "handle", "type": "String", "isUnique": true },
                        { "name": "id", "type": "BigInt", "isId": true },
                        { "name": "iban", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");
    let cursor = analysis.eligible[0].cursor.as_ref().expect("Expected a cursor");

    assert_eq!(cursor.name, "id");
    assert_eq!(cursor.kind, CursorKind::Int);
}

/// Test that the first unique sortable field is the fallback cursor
#[test]
fn test_first_unique_field_is_fallback_cursor() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Invite",
                    "fields": [
                        { "name": "note", "type": "String" },
                        { "name": "code", "type": "String", "isUnique": true },
                        { "name": "issuedAt", "type": "DateTime", "isUnique": true },
                        { "name": "email", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");
    let cursor = analysis.eligible[0].cursor.as_ref().expect("Expected a cursor");

    assert_eq!(cursor.name, "code");
    assert_eq!(cursor.kind, CursorKind::Text);
}

/// Test that a DateTime id travels as a text cursor
#[test]
fn test_datetime_cursor_is_text() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Event",
                    "fields": [
                        { "name": "occurredAt", "type": "DateTime", "isId": true },
                        { "name": "payload", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");
    let cursor = analysis.eligible[0].cursor.as_ref().expect("Expected a cursor");

    assert_eq!(cursor.kind, CursorKind::Text);
}

/// Test that marked models without any usable cursor are skipped
#[test]
fn test_model_without_sortable_cursor_is_skipped() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Blob",
                    "fields": [
                        { "name": "data", "type": "Bytes", "isId": true },
                        { "name": "tags", "type": "String", "isList": true, "isUnique": true },
                        { "name": "content", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");

    assert!(analysis.eligible.is_empty());
    assert_eq!(analysis.skipped[0].reason, SkipReason::NoCursor);
}

/// Test that parameterized markers carry their annotation through
#[test]
fn test_parameterized_marker_keeps_annotation() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Patient",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "ssn", "type": "String", "documentation": "@encrypted?mode=strict" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");
    let patient = &analysis.eligible[0];

    assert_eq!(
        patient.fields["ssn"].annotation.as_deref(),
        Some("mode=strict")
    );
}

/// Test that eligible models keep document declaration order
#[test]
fn test_eligible_models_keep_declaration_order() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                {
                    "name": "Zeta",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "a", "type": "String", "documentation": "@encrypted" }
                    ]
                },
                {
                    "name": "Alpha",
                    "fields": [
                        { "name": "id", "type": "Int", "isId": true },
                        { "name": "b", "type": "String", "documentation": "@encrypted" }
                    ]
                }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let analysis = schema::analyze(&document).expect("Failed to analyze document");

    assert_eq!(analysis.eligible_names(), vec!["Zeta", "Alpha"]);
}

/// Test that duplicate model names are rejected
#[test]
fn test_duplicate_model_names_rejected() {
    let document = SchemaDocument::from_json(
        r#"{
            "models": [
                { "name": "User", "fields": [] },
                { "name": "User", "fields": [] }
            ]
        }"#,
    )
    .expect("Failed to parse document");

    let err = schema::analyze(&document).expect_err("Expected duplicate model error");
    assert!(err.to_string().contains("User"));
}

/// Test that an empty document is rejected
#[test]
fn test_empty_document_rejected() {
    let document =
        SchemaDocument::from_json(r#"{ "models": [] }"#).expect("Failed to parse document");

    schema::analyze(&document).expect_err("Expected empty document error");
}
