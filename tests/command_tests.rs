use form_autofill::command::builder::{build_commands, fallback_criteria};
use form_autofill::command::command_model::{CommandEnvelope, Criterion, FillAction, FillCommand};
use form_autofill::command::script::generate_playwright_script;
use form_autofill::mapping::mapping_model::{MappingResult, ValueKind};
use form_autofill::orchestrator::outcome_model::InjectionRequest;
use form_autofill::scan::locator::Locator;

use crate::common::{CONTACT_FORM, field, result, scanned};

mod common;

#[test]
fn one_command_per_valued_result_in_mapping_order() {
    let (_, fields) = scanned(CONTACT_FORM);
    let mapped = vec![
        result("country", Some("united states")),
        result("email", Some("ada@example.com")),
        result("dob", None),
        result("ghost", Some("nobody")),
    ];

    let commands = build_commands(&fields, &mapped);
    let keys: Vec<&str> = commands.iter().map(|c| c.field_key.as_str()).collect();
    assert_eq!(keys, vec!["country", "email"]);

    let email = &commands[1];
    assert_eq!(email.locator, Locator::Id("email".into()));
    assert_eq!(email.value, "ada@example.com");
    assert_eq!(email.label, "Email Address");
    assert_eq!(email.action, FillAction::Fill);
}

#[test]
fn fallbacks_run_from_specific_to_fuzzy() {
    let (_, fields) = scanned(CONTACT_FORM);
    let email = field(&fields, "email");

    let criteria = fallback_criteria(email, Some("input[type=email]"));
    assert_eq!(
        criteria,
        vec![
            Criterion::Selector { selector: "input[type=email]".into() },
            Criterion::Id { id: "email".into() },
            Criterion::Name { name: "email".into() },
            Criterion::AttributeEquals { attribute: "aria-label".into(), value: "Email Address".into() },
            Criterion::AttributeEquals { attribute: "placeholder".into(), value: "Email Address".into() },
            Criterion::AttributeEquals { attribute: "title".into(), value: "Email Address".into() },
            Criterion::LabelText { label: "Email Address".into() },
        ]
    );
}

#[test]
fn empty_criteria_are_not_emitted() {
    let (_, fields) = scanned(r#"<html><body><input type="text"></body></html>"#);
    assert!(fallback_criteria(&fields[0], Some("   ")).is_empty());
    assert!(fallback_criteria(&fields[0], None).is_empty());
}

#[test]
fn file_fields_become_document_commands() {
    let (_, fields) = scanned(CONTACT_FORM);
    let commands = build_commands(&fields, &[result("resume", Some("Dear hiring manager"))]);

    assert_eq!(commands[0].action, FillAction::Document);
    assert!(commands[0].is_document());
}

#[test]
fn document_value_kind_becomes_document_command() {
    let (_, fields) = scanned(CONTACT_FORM);
    let mut mapped = result("message", Some("A long cover letter"));
    mapped.value_kind = ValueKind::Document;

    let commands = build_commands(&fields, &[mapped]);
    assert_eq!(commands[0].action, FillAction::Document);
}

#[test]
fn envelope_carries_metadata_and_survives_transport() {
    let (_, fields) = scanned(CONTACT_FORM);
    let commands = build_commands(
        &fields,
        &[result("email", Some("ada@example.com")), result("message", Some("Hi"))],
    );
    let envelope = CommandEnvelope::new(commands, 4);

    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["metadata"]["totalFields"], 2);
    assert_eq!(json["metadata"]["missingFields"], 4);
    assert_eq!(json["commands"][0]["fieldKey"], "email");
    assert_eq!(json["commands"][0]["locator"], "//*[@id=\"email\"]");
    assert_eq!(json["commands"][0]["fallbackLocators"][0]["strategy"], "id");
    assert_eq!(json["commands"][1]["locator"], "/html[1]/body[1]/form[1]/textarea[1]");

    let back: CommandEnvelope = serde_json::from_value(json).unwrap();
    assert_eq!(back, envelope);
}

#[test]
fn unusable_confidence_does_not_break_the_envelope() {
    let (_, fields) = scanned(CONTACT_FORM);
    let mapped: MappingResult = serde_json::from_str(
        r#"{"fieldId": "email", "mappedValue": "a@b.c", "confidence": "NaN"}"#,
    )
    .unwrap();
    let envelope = CommandEnvelope::new(build_commands(&fields, &[mapped]), 0);

    let wire = serde_json::to_string(&envelope).unwrap();
    assert!(!wire.contains("null"));

    let request: InjectionRequest = serde_json::from_str(&wire).unwrap();
    assert_eq!(request.commands[0].confidence, 0.0);
    assert_eq!(request.commands[0].value, "a@b.c");
}

#[test]
fn command_with_bad_locator_string_is_rejected() {
    let json = r#"{"fieldKey": "x", "locator": "not a locator", "value": "1", "type": "text"}"#;
    assert!(serde_json::from_str::<FillCommand>(json).is_err());
}

#[test]
fn playwright_script_replays_the_fill() {
    let (_, fields) = scanned(CONTACT_FORM);
    let commands = build_commands(
        &fields,
        &[
            result("email", Some("ada@example.com")),
            result("newsletter", Some("Yes")),
            result("country", Some("US")),
            result("message", Some("It's me")),
            result("resume", Some("Dear hiring manager")),
        ],
    );

    let script = generate_playwright_script(&commands, "https://example.com/contact");
    assert!(script.contains("await page.goto('https://example.com/contact');"));
    assert!(script.contains("await page.locator('#email').fill('ada@example.com');"));
    assert!(script.contains("await page.locator('#newsletter').check();"));
    assert!(script.contains("await page.locator('#country').selectOption('US');"));
    assert!(script.contains(
        "await page.locator('xpath=/html[1]/body[1]/form[1]/textarea[1]').fill('It\\'s me');"
    ));
    assert!(!script.contains("Dear hiring manager"), "Document commands are skipped");
}
