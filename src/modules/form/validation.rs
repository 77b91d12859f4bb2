//! Field validation rules and inline error display.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::platform::{DomResult, ElementId, Host};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid e-mail regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s()+\-]{10,}$").expect("invalid phone regex"));

/// Why a field failed. The display text is shown next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,
    #[error("Please enter a valid e-mail address")]
    InvalidEmail,
    #[error("Please enter a valid phone number")]
    InvalidPhone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
}

impl FieldKind {
    /// From an input's `type` attribute; anything unrecognised is plain text.
    pub fn from_type(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("email") => FieldKind::Email,
            Some("tel") => FieldKind::Tel,
            _ => FieldKind::Text,
        }
    }
}

/// Validate a raw value. Surrounding whitespace is ignored.
pub fn validate_value(kind: FieldKind, required: bool, raw: &str) -> Result<(), FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return if required {
            Err(FieldError::Required)
        } else {
            Ok(())
        };
    }
    match kind {
        FieldKind::Email if !EMAIL_RE.is_match(value) => Err(FieldError::InvalidEmail),
        FieldKind::Tel if !PHONE_RE.is_match(value) => Err(FieldError::InvalidPhone),
        _ => Ok(()),
    }
}

/// Validate a form control as it currently stands in the page.
pub fn validate_field(host: &dyn Host, field: ElementId) -> DomResult<Result<(), FieldError>> {
    let kind = FieldKind::from_type(host.attr(field, "type")?.as_deref());
    let required = host.attr(field, "required")?.is_some();
    let value = host.value(field)?;
    Ok(validate_value(kind, required, &value))
}

/// Tracks the `.error-message` element inserted after each invalid field.
#[derive(Debug, Default)]
pub struct ErrorDisplay {
    messages: HashMap<ElementId, ElementId>,
}

impl ErrorDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shown(&self, field: ElementId) -> bool {
        self.messages.contains_key(&field)
    }

    /// Make the display match `outcome`.
    pub fn apply(
        &mut self,
        host: &mut dyn Host,
        field: ElementId,
        outcome: Result<(), FieldError>,
    ) -> DomResult<()> {
        match outcome {
            Ok(()) => self.clear(host, field),
            Err(error) => self.show(host, field, error),
        }
    }

    pub fn show(&mut self, host: &mut dyn Host, field: ElementId, error: FieldError) -> DomResult<()> {
        host.add_class(field, "error")?;
        let text = error.to_string();
        if let Some(&message) = self.messages.get(&field)
            && host.is_connected(message)
        {
            return host.set_text(message, &text);
        }

        let message = host.create_element("div");
        host.add_class(message, "error-message")?;
        host.set_text(message, &text)?;
        host.insert_after(field, message)?;
        self.messages.insert(field, message);
        Ok(())
    }

    pub fn clear(&mut self, host: &mut dyn Host, field: ElementId) -> DomResult<()> {
        host.remove_class(field, "error")?;
        if let Some(message) = self.messages.remove(&field)
            && host.is_connected(message)
        {
            host.remove(message)?;
        }
        Ok(())
    }

    pub fn clear_all(&mut self, host: &mut dyn Host) -> DomResult<()> {
        let fields: Vec<ElementId> = self.messages.keys().copied().collect();
        for field in fields {
            self.clear(host, field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Document, Dom, Selector};

    #[test]
    fn email_rules() {
        assert_eq!(validate_value(FieldKind::Email, true, "a@b"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_value(FieldKind::Email, true, "a@b.com"), Ok(()));
        assert_eq!(validate_value(FieldKind::Email, true, "  a@b.com "), Ok(()));
        assert_eq!(validate_value(FieldKind::Email, false, "a b@c.io"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_value(FieldKind::Email, false, ""), Ok(()));
    }

    #[test]
    fn phone_rules() {
        assert_eq!(validate_value(FieldKind::Tel, false, "+1 (555) 123-4567"), Ok(()));
        assert_eq!(validate_value(FieldKind::Tel, false, "555-1234"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_value(FieldKind::Tel, false, "call me maybe"), Err(FieldError::InvalidPhone));
    }

    #[test]
    fn required_empty_fails_for_every_kind() {
        for kind in [FieldKind::Text, FieldKind::Email, FieldKind::Tel] {
            assert_eq!(validate_value(kind, true, "   "), Err(FieldError::Required));
        }
        assert_eq!(FieldError::Required.to_string(), "This field is required");
    }

    #[test]
    fn display_tracks_validity() {
        let mut doc = Document::parse_html(
            r#"<html><body><form><input name="email" type="email" required value="nope"></form></body></html>"#,
            1024.0,
            800.0,
        )
        .unwrap();
        let field = doc.query_first(&Selector::parse("input").unwrap()).unwrap();
        let mut display = ErrorDisplay::new();

        let outcome = validate_field(&doc, field).unwrap();
        display.apply(&mut doc, field, outcome).unwrap();
        display.apply(&mut doc, field, outcome).unwrap();
        assert!(doc.has_class(field, "error").unwrap());
        let messages = doc.query_all(&Selector::parse(".error-message").unwrap());
        assert_eq!(messages.len(), 1, "re-validation reuses the message element");
        assert_eq!(doc.text(messages[0]).unwrap(), "Please enter a valid e-mail address");

        doc.set_value(field, "me@example.org").unwrap();
        let outcome = validate_field(&doc, field).unwrap();
        display.apply(&mut doc, field, outcome).unwrap();
        assert!(!doc.has_class(field, "error").unwrap());
        assert!(doc.query_all(&Selector::parse(".error-message").unwrap()).is_empty());
        assert!(!display.is_shown(field));
    }
}
