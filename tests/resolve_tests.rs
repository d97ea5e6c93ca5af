use form_autofill::command::builder::build_commands;
use form_autofill::command::command_model::{Criterion, FillAction, FillCommand};
use form_autofill::dom::Document;
use form_autofill::mapping::mapping_model::ValueKind;
use form_autofill::resolve::engine::{AttemptOutcome, ResolutionState, Resolver};
use form_autofill::resolve::resolve;
use form_autofill::resolve::strategy::{by_criterion, by_label_text, clean_label};
use form_autofill::scan::scan_model::FieldType;

use crate::common::{ANONYMOUS_FORM, CONTACT_FORM, result, scanned};

mod common;

fn command(locator: &str, fallbacks: Vec<Criterion>) -> FillCommand {
    FillCommand {
        field_key: "target".into(),
        locator: locator.parse().unwrap(),
        fallback_locators: fallbacks,
        value: "v".into(),
        value_kind: ValueKind::Text,
        field_type: FieldType::Text,
        label: String::new(),
        confidence: 1.0,
        action: FillAction::Fill,
    }
}

// =========================================================================
// State machine
// =========================================================================

#[test]
fn scanned_field_resolves_through_primary_locator() {
    let (doc, fields) = scanned(CONTACT_FORM);
    let commands = build_commands(
        &fields,
        &[result("email", Some("a@b.org")), result("message", Some("hi"))],
    );

    for cmd in &commands {
        let resolution = resolve(cmd, &doc);
        assert!(resolution.via_primary(), "{} should resolve by locator", cmd.field_key);
        assert_eq!(resolution.attempts.len(), 1);
    }

    let email = resolve(&commands[0], &doc).node().unwrap();
    assert_eq!(doc.attr(email, "id"), Some("email"));
}

#[test]
fn resolution_is_idempotent() {
    let (doc, _) = scanned(CONTACT_FORM);
    let cmd = command(
        "//*[@id=\"gone\"]",
        vec![Criterion::LabelText { label: "Date of Birth".into() }],
    );

    let first = resolve(&cmd, &doc);
    let second = resolve(&cmd, &doc);
    assert_eq!(first, second);
    assert!(first.node().is_some());
    assert!(doc.events().is_empty(), "Resolution never writes to the document");
}

#[test]
fn invalid_selector_is_a_miss_not_a_fault() {
    let (doc, _) = scanned(CONTACT_FORM);
    let cmd = command(
        "//*[@id=\"gone\"]",
        vec![
            Criterion::Selector { selector: "input[[[".into() },
            Criterion::Name { name: "email".into() },
        ],
    );

    let resolution = resolve(&cmd, &doc);
    assert_eq!(resolution.strategy(), Some(2));
    assert_eq!(resolution.attempts[0].outcome, AttemptOutcome::Miss);
    assert!(matches!(resolution.attempts[1].outcome, AttemptOutcome::Invalid(_)));
    assert_eq!(resolution.attempts[2].outcome, AttemptOutcome::Hit);
}

#[test]
fn unresolvable_command_is_exhausted() {
    let (doc, _) = scanned(CONTACT_FORM);
    let cmd = command(
        "/html[1]/body[1]/form[3]/input[1]",
        vec![Criterion::Id { id: "nope".into() }],
    );

    let resolution = resolve(&cmd, &doc);
    assert_eq!(resolution.state, ResolutionState::Exhausted);
    assert_eq!(resolution.node(), None);
    assert_eq!(resolution.attempts.len(), 2);
}

#[test]
fn stepping_walks_every_strategy_in_order() {
    let (doc, _) = scanned(CONTACT_FORM);
    let cmd = command(
        "//*[@id=\"gone\"]",
        vec![
            Criterion::Id { id: "also_gone".into() },
            Criterion::Id { id: "dob".into() },
        ],
    );

    let mut resolver = Resolver::new(&cmd, &doc);
    assert_eq!(resolver.state(), ResolutionState::NotTried);
    assert_eq!(resolver.step(), ResolutionState::Tried { strategy: 0 });
    assert_eq!(resolver.step(), ResolutionState::Tried { strategy: 1 });

    let resolved = resolver.step();
    assert!(matches!(resolved, ResolutionState::Resolved { strategy: 2, .. }));
    assert_eq!(resolver.step(), resolved, "Terminal states are absorbing");
}

// =========================================================================
// Strategies
// =========================================================================

#[test]
fn attribute_equality_matches_controls_only() {
    let doc = Document::parse(
        r#"<html><body><div title="Email"></div><input title="Email" name="e"></body></html>"#,
    );
    let hit = by_criterion(
        &Criterion::AttributeEquals {
            attribute: "title".into(),
            value: "Email".into(),
        },
        &doc,
    )
    .unwrap()
    .unwrap();
    assert_eq!(doc.tag(hit), "input");
}

#[test]
fn label_search_finds_control_in_following_sibling() {
    let doc = Document::parse(ANONYMOUS_FORM);
    let controls = doc.form_controls();

    assert_eq!(by_label_text("Company Name (required)", &doc), Some(controls[0]));
    assert_eq!(by_label_text("company name", &doc), Some(controls[0]));
}

#[test]
fn label_search_finds_control_inside_label() {
    let doc = Document::parse(ANONYMOUS_FORM);
    let controls = doc.form_controls();
    assert_eq!(by_label_text("Website", &doc), Some(controls[1]));
}

#[test]
fn label_search_falls_back_to_placeholder() {
    let doc = Document::parse(ANONYMOUS_FORM);
    let controls = doc.form_controls();
    assert_eq!(by_label_text("Postal Code", &doc), Some(controls[2]));
}

#[test]
fn label_search_matches_squashed_name() {
    let doc = Document::parse(
        r#"<html><body><input name="nickname"><input name="billingfirstname"></body></html>"#,
    );
    let controls = doc.form_controls();
    assert_eq!(by_label_text("First Name", &doc), Some(controls[1]));
}

#[test]
fn label_search_looks_three_siblings_ahead() {
    let doc = Document::parse(
        r#"<html><body><div>
             <label>Alpha</label><span></span><span></span><input id="a">
           </div></body></html>"#,
    );
    let hit = by_label_text("Alpha", &doc).unwrap();
    assert_eq!(doc.attr(hit, "id"), Some("a"));
}

#[test]
fn label_search_stops_after_three_siblings() {
    let doc = Document::parse(
        r#"<html><body><div>
             <label>Beta</label><span></span><span></span><span></span><input id="b">
           </div></body></html>"#,
    );
    assert_eq!(by_label_text("Beta", &doc), None);
}

#[test]
fn label_search_gives_up_quietly() {
    let doc = Document::parse(ANONYMOUS_FORM);
    assert_eq!(by_label_text("Shoe size", &doc), None);
    assert_eq!(by_label_text("   ", &doc), None);
}

#[test]
fn label_for_target_wins_over_siblings() {
    let doc = Document::parse(CONTACT_FORM);
    let hit = by_label_text("Date of Birth", &doc).unwrap();
    assert_eq!(doc.attr(hit, "id"), Some("dob"));
}

#[test]
fn clean_label_strips_required_markers() {
    assert_eq!(clean_label("Full Name (required)"), "Full Name");
    assert_eq!(clean_label("Phone *"), "Phone");
}
