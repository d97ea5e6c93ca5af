#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use form_autofill::dom::Document;
use form_autofill::mapping::backend::{MappingBackend, MappingError};
use form_autofill::mapping::mapping_model::{
    MappingRequest, MappingResponse, MappingResult, ValueKind,
};
use form_autofill::scan::scan;
use form_autofill::scan::scan_model::CanonicalField;

// =========================================================================
// HTML fixtures
// =========================================================================

pub const CONTACT_FORM: &str = r#"<!DOCTYPE html>
<html><head><title>Contact</title></head>
<body>
  <form id="contact">
    <label for="full_name">Full Name (required)</label>
    <input id="full_name" name="full_name" type="text">

    <label for="email">Email Address</label>
    <input id="email" name="email" type="email">

    <label for="dob">Date of Birth</label>
    <input id="dob" name="dob" type="date">

    <label for="country">Country</label>
    <select id="country" name="country">
      <option value="">Choose one</option>
      <option value="US">United States</option>
      <option value="IN">India</option>
    </select>

    <input type="checkbox" id="newsletter" name="newsletter">
    <label for="newsletter">Subscribe to newsletter</label>

    <input type="radio" id="gender_male" name="gender" value="M">
    <label for="gender_male">Male</label>
    <input type="radio" id="gender_female" name="gender" value="F">
    <label for="gender_female">Female</label>

    <textarea name="message" placeholder="Your message"></textarea>

    <label for="resume">Cover Letter</label>
    <input type="file" id="resume" name="resume">
  </form>
</body></html>"#;

/// Controls without ids or names, reachable only by position or label.
pub const ANONYMOUS_FORM: &str = r#"<html><body>
  <form>
    <div class="row">
      <label>Company Name</label>
      <div class="control"><input type="text"></div>
    </div>
    <div class="row">
      <label>Website <input type="url"></label>
    </div>
    <input type="text" placeholder="Postal code">
  </form>
</body></html>"#;

/// A page with `n` named text inputs, `f01`, `f02`, ...
pub fn text_fields_page(n: usize) -> String {
    let inputs: String = (1..=n)
        .map(|i| format!("<input type=\"text\" name=\"f{:02}\">\n", i))
        .collect();
    format!("<html><body><form>\n{}</form></body></html>", inputs)
}

pub fn scanned(html: &str) -> (Document, Vec<CanonicalField>) {
    let doc = Document::parse(html);
    let (_, fields) = scan(&doc);
    (doc, fields)
}

pub fn field<'a>(fields: &'a [CanonicalField], key: &str) -> &'a CanonicalField {
    fields
        .iter()
        .find(|f| f.field_key == key)
        .unwrap_or_else(|| panic!("no field '{}'", key))
}

// =========================================================================
// Mapping collaborator fakes
// =========================================================================

pub fn result(key: &str, value: Option<&str>) -> MappingResult {
    MappingResult {
        field_key: key.to_string(),
        value: value.map(str::to_string),
        value_kind: ValueKind::Text,
        confidence: 0.9,
        locator_hint: None,
        label: None,
        reasoning: None,
    }
}

/// Maps every requested field to `value for <key>`.
pub fn echo(request: &MappingRequest) -> MappingResponse {
    MappingResponse {
        mapped_fields: request
            .fields
            .keys()
            .map(|k| result(k, Some(&format!("value for {}", k))))
            .collect(),
        ..MappingResponse::default()
    }
}

/// Backend driven by a closure over `(call index, request)`.
///
/// Records the field keys of every request it sees.
pub struct FakeBackend<F> {
    respond: F,
    calls: Cell<usize>,
    pub seen: RefCell<Vec<Vec<String>>>,
}

impl<F> FakeBackend<F>
where
    F: Fn(usize, &MappingRequest) -> Result<MappingResponse, MappingError>,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Cell::new(0),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<F> MappingBackend for FakeBackend<F>
where
    F: Fn(usize, &MappingRequest) -> Result<MappingResponse, MappingError>,
{
    fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse, MappingError> {
        let index = self.calls.get();
        self.calls.set(index + 1);
        self.seen
            .borrow_mut()
            .push(request.fields.keys().cloned().collect());
        (self.respond)(index, request)
    }
}

/// Backend whose every call fails at the transport.
pub fn unreachable_backend() -> FakeBackend<impl Fn(usize, &MappingRequest) -> Result<MappingResponse, MappingError>> {
    FakeBackend::new(|_, _| Err(MappingError::Transport("connection refused".into())))
}
