//! Pure field validation, run before anything is persisted.

use lazy_static::lazy_static;
use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::tickets::dto::CreateTicketRequest;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9+()\-]+$").unwrap();
}

pub const MAX_TICKET_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// A create request with every field present, trimmed and format-checked.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub ticket_name: String,
    pub description: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub due_date: OffsetDateTime,
}

fn required(field: Option<&str>) -> Result<&str, String> {
    field
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| "All fields are required".to_string())
}

pub fn validate_new_ticket(req: &CreateTicketRequest) -> Result<NewTicket, String> {
    let ticket_name = required(req.ticket_name.as_deref())?;
    let description = required(req.description.as_deref())?;
    let contact_name = required(req.contact_name.as_deref())?;
    let email = required(req.email.as_deref())?;
    let phone = required(req.phone.as_deref())?;
    let due_date = required(req.due_date.as_deref())?;

    // Caps count characters, not bytes
    if ticket_name.chars().count() > MAX_TICKET_NAME_LEN {
        return Err("Ticket name cannot exceed 200 characters".into());
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err("Description cannot exceed 5000 characters".into());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Please provide a valid email".into());
    }
    if !PHONE_RE.is_match(phone) {
        return Err("Please provide a valid phone number".into());
    }
    let due_date = OffsetDateTime::parse(due_date, &Rfc3339)
        .map_err(|_| "Due date must be an RFC 3339 timestamp".to_string())?;

    Ok(NewTicket {
        ticket_name: ticket_name.to_string(),
        description: description.to_string(),
        contact_name: contact_name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        due_date,
    })
}

pub fn validate_message(text: Option<&str>, sender: Option<&str>) -> Result<(String, String), String> {
    let text = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Text and sender are required".to_string())?;
    let sender = sender
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Text and sender are required".to_string())?;
    Ok((text.to_string(), sender.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> CreateTicketRequest {
        CreateTicketRequest {
            ticket_name: Some("Printer on fire".into()),
            description: Some("Smoke coming from the office printer".into()),
            contact_name: Some("Alice".into()),
            email: Some("alice@example.com".into()),
            phone: Some("+1-555-0100".into()),
            due_date: Some("2026-09-01T12:00:00Z".into()),
        }
    }

    #[test]
    fn full_request_passes() {
        let ticket = validate_new_ticket(&full_request()).expect("valid");
        assert_eq!(ticket.ticket_name, "Printer on fire");
        assert_eq!(ticket.due_date.year(), 2026);
    }

    #[test]
    fn each_missing_field_is_rejected() {
        for strip in 0..6 {
            let mut req = full_request();
            match strip {
                0 => req.ticket_name = None,
                1 => req.description = None,
                2 => req.contact_name = None,
                3 => req.email = None,
                4 => req.phone = None,
                _ => req.due_date = None,
            }
            let err = validate_new_ticket(&req).unwrap_err();
            assert_eq!(err, "All fields are required");
        }
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let mut req = full_request();
        req.contact_name = Some("   ".into());
        assert_eq!(validate_new_ticket(&req).unwrap_err(), "All fields are required");
    }

    #[test]
    fn overlong_name_and_description_are_rejected() {
        let mut req = full_request();
        req.ticket_name = Some("x".repeat(MAX_TICKET_NAME_LEN + 1));
        assert!(validate_new_ticket(&req).unwrap_err().contains("200"));

        let mut req = full_request();
        req.description = Some("x".repeat(MAX_DESCRIPTION_LEN + 1));
        assert!(validate_new_ticket(&req).unwrap_err().contains("5000"));
    }

    #[test]
    fn name_cap_counts_characters_not_bytes() {
        // 150 two-byte characters: over 200 bytes but well under the cap
        let mut req = full_request();
        req.ticket_name = Some("é".repeat(150));
        assert!(validate_new_ticket(&req).is_ok());

        let mut req = full_request();
        req.ticket_name = Some("é".repeat(MAX_TICKET_NAME_LEN + 1));
        assert!(validate_new_ticket(&req).unwrap_err().contains("200"));
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut req = full_request();
        req.email = Some("not-an-email".into());
        assert!(validate_new_ticket(&req).unwrap_err().contains("email"));
    }

    #[test]
    fn bad_phone_is_rejected() {
        let mut req = full_request();
        req.phone = Some("call me maybe".into());
        assert!(validate_new_ticket(&req).unwrap_err().contains("phone"));
    }

    #[test]
    fn bad_due_date_is_rejected() {
        let mut req = full_request();
        req.due_date = Some("tomorrow".into());
        assert!(validate_new_ticket(&req).unwrap_err().contains("RFC 3339"));
    }

    #[test]
    fn message_requires_text_and_sender() {
        assert!(validate_message(Some("hi"), Some("Alice")).is_ok());
        assert!(validate_message(None, Some("Alice")).is_err());
        assert!(validate_message(Some("hi"), None).is_err());
        assert!(validate_message(Some("  "), Some("Alice")).is_err());
        assert!(validate_message(Some("hi"), Some("")).is_err());
    }

    #[test]
    fn message_fields_are_trimmed() {
        let (text, sender) = validate_message(Some("  hi  "), Some(" Alice ")).expect("valid");
        assert_eq!(text, "hi");
        assert_eq!(sender, "Alice");
    }
}
