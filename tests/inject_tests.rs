use form_autofill::command::command_model::{FillAction, FillCommand};
use form_autofill::dom::events::{EventKind, HighlightKind};
use form_autofill::dom::{Document, NodeId};
use form_autofill::inject::injector::{DOCUMENT_CONTENT_KEY, DOCUMENT_READY_KEY};
use form_autofill::inject::{InjectError, Injected, Injector};
use form_autofill::mapping::mapping_model::ValueKind;
use form_autofill::scan::locator::Locator;
use form_autofill::scan::scan_model::FieldType;

use crate::common::CONTACT_FORM;

mod common;

fn command(id: &str, value: &str) -> FillCommand {
    FillCommand {
        field_key: id.into(),
        locator: Locator::Id(id.into()),
        fallback_locators: vec![],
        value: value.into(),
        value_kind: ValueKind::Text,
        field_type: FieldType::Text,
        label: String::new(),
        confidence: 1.0,
        action: FillAction::Fill,
    }
}

fn document_command(id: &str, label: &str, content: &str) -> FillCommand {
    FillCommand {
        label: label.into(),
        action: FillAction::Document,
        value_kind: ValueKind::Document,
        ..command(id, content)
    }
}

fn node(doc: &Document, id: &str) -> NodeId {
    doc.find_by_id(id).unwrap()
}

fn inject(doc: &mut Document, id: &str, value: &str) -> Result<Injected, InjectError> {
    let target = node(doc, id);
    Injector::default().inject(doc, target, &command(id, value))
}

// =========================================================================
// Checkboxes and radios
// =========================================================================

#[test]
fn checkbox_follows_affirmative_values() {
    let mut doc = Document::parse(CONTACT_FORM);
    let newsletter = node(&doc, "newsletter");

    assert_eq!(inject(&mut doc, "newsletter", "Yes"), Ok(Injected::Checked(true)));
    assert!(doc.checked(newsletter));

    assert_eq!(inject(&mut doc, "newsletter", "no"), Ok(Injected::Checked(false)));
    assert!(!doc.checked(newsletter));
}

#[test]
fn radio_matches_value_or_id() {
    let mut doc = Document::parse(CONTACT_FORM);
    let male = node(&doc, "gender_male");

    assert_eq!(inject(&mut doc, "gender_male", "male"), Ok(Injected::Checked(true)));
    assert!(doc.checked(male), "Id 'gender_male' contains 'male'");

    let female = node(&doc, "gender_female");
    assert!(inject(&mut doc, "gender_female", "F").is_ok());
    assert!(doc.checked(female));
    assert!(!doc.checked(male), "Checking one radio clears its group");
}

#[test]
fn radio_mismatch_is_rejected() {
    let mut doc = Document::parse(CONTACT_FORM);
    let err = inject(&mut doc, "gender_male", "other").unwrap_err();
    assert_eq!(err, InjectError::ValueRejected("radio value mismatch".into()));
    assert!(!doc.checked(node(&doc, "gender_male")));
    assert!(doc.events().is_empty(), "No events for a rejected value");
}

// =========================================================================
// Dates, selects, text
// =========================================================================

#[test]
fn date_input_gets_iso_date() {
    let mut doc = Document::parse(CONTACT_FORM);
    inject(&mut doc, "dob", "2024-3-5").unwrap();
    assert_eq!(doc.value(node(&doc, "dob")), "2024-03-05");
}

#[test]
fn unparseable_date_is_written_verbatim() {
    let mut doc = Document::parse(CONTACT_FORM);
    inject(&mut doc, "dob", "sometime in spring").unwrap();
    assert_eq!(doc.value(node(&doc, "dob")), "sometime in spring");
}

#[test]
fn select_matches_option_text_case_insensitively() {
    let mut doc = Document::parse(CONTACT_FORM);
    assert_eq!(
        inject(&mut doc, "country", "united states"),
        Ok(Injected::Value("US".into()))
    );
    assert_eq!(doc.value(node(&doc, "country")), "US");
}

#[test]
fn select_prefers_exact_option_value() {
    let mut doc = Document::parse(CONTACT_FORM);
    inject(&mut doc, "country", "IN").unwrap();
    assert_eq!(doc.value(node(&doc, "country")), "IN");
}

#[test]
fn select_without_matching_option_is_rejected() {
    let mut doc = Document::parse(CONTACT_FORM);
    let err = inject(&mut doc, "country", "Mars").unwrap_err();
    assert_eq!(err.to_string(), "option not found in select");
    assert_eq!(doc.value(node(&doc, "country")), "", "First option stays selected");
}

#[test]
fn text_and_textarea_take_the_value() {
    let mut doc = Document::parse(CONTACT_FORM);
    inject(&mut doc, "full_name", "Ada Lovelace").unwrap();
    assert_eq!(doc.value(node(&doc, "full_name")), "Ada Lovelace");

    let message = doc.form_controls()[7];
    Injector::default()
        .inject(&mut doc, message, &command("message", "Hello there"))
        .unwrap();
    assert_eq!(doc.value(message), "Hello there");
}

// =========================================================================
// Events and highlights
// =========================================================================

#[test]
fn write_dispatches_framework_visible_events() {
    let mut doc = Document::parse(CONTACT_FORM);
    inject(&mut doc, "email", "ada@example.com").unwrap();

    assert_eq!(
        doc.events_for(node(&doc, "email")),
        vec![
            EventKind::Input,
            EventKind::Change,
            EventKind::Blur,
            EventKind::NativeValueSet,
            EventKind::Input,
        ]
    );
    assert!(doc.events().iter().all(|e| e.bubbles));
}

#[test]
fn highlights_are_cosmetic_and_optional() {
    let mut doc = Document::parse(CONTACT_FORM);
    inject(&mut doc, "email", "ada@example.com").unwrap();
    assert_eq!(doc.highlights().len(), 1);
    assert_eq!(doc.highlights()[0].kind, HighlightKind::Success);

    let mut plain = Document::parse(CONTACT_FORM);
    let email = node(&plain, "email");
    Injector::new(false)
        .inject(&mut plain, email, &command("email", "ada@example.com"))
        .unwrap();
    assert!(plain.highlights().is_empty());
    assert_eq!(plain.value(email), "ada@example.com");
}

// =========================================================================
// Document fields
// =========================================================================

#[test]
fn document_command_attaches_panel_and_dataset() {
    let mut doc = Document::parse(CONTACT_FORM);
    let resume = node(&doc, "resume");
    let cmd = document_command("resume", "Cover Letter", "Dear hiring manager");

    let injected = Injector::default().inject(&mut doc, resume, &cmd).unwrap();
    assert_eq!(injected, Injected::Document);

    assert_eq!(doc.affordances().len(), 1);
    assert_eq!(doc.affordances()[0].title, "Cover Letter");
    assert_eq!(doc.affordances()[0].anchor, resume);
    assert_eq!(
        doc.data(resume, DOCUMENT_CONTENT_KEY).as_deref(),
        Some("Dear hiring manager")
    );
    assert_eq!(doc.data(resume, DOCUMENT_READY_KEY).as_deref(), Some("true"));
    assert_eq!(doc.value(resume), "", "No native value is written");
    assert!(doc.events_for(resume).is_empty());
    assert_eq!(doc.highlights()[0].kind, HighlightKind::Document);
}

#[test]
fn one_panel_per_container() {
    let mut doc = Document::parse(CONTACT_FORM);
    let resume = node(&doc, "resume");
    let email = node(&doc, "email");

    let injector = Injector::default();
    injector
        .inject(&mut doc, resume, &document_command("resume", "", "first"))
        .unwrap();
    injector
        .inject(&mut doc, email, &document_command("email", "", "second"))
        .unwrap();

    assert_eq!(doc.affordances().len(), 1, "Both share the form as parent");
    assert_eq!(doc.affordances()[0].title, "Document");
    assert_eq!(doc.data(email, DOCUMENT_CONTENT_KEY).as_deref(), Some("second"));
}
