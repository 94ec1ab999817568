//! Client-side form checks. Advisory only: the API performs the authoritative
//! validation, these just avoid a round trip for obviously bad input.

use thiserror::Error;

use crate::domain::ClientDraft;

pub const MIN_PHONE_DIGITS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Full name is required")]
    FullNameRequired,
    #[error("Phone is required")]
    PhoneRequired,
    #[error("Course is required")]
    CourseRequired,
    #[error("Phone is too short")]
    PhoneTooShort,
}

/// Keeps a leading `+` (when the trimmed input starts with one) followed by
/// every digit of the input. Blank input normalizes to an empty string.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut normalized = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        normalized.push('+');
    }
    normalized.extend(trimmed.chars().filter(char::is_ascii_digit));
    normalized
}

pub fn validate_draft(draft: &ClientDraft) -> Result<(), ValidationError> {
    if draft.full_name.trim().is_empty() {
        return Err(ValidationError::FullNameRequired);
    }
    if draft.phone.trim().is_empty() {
        return Err(ValidationError::PhoneRequired);
    }
    if draft.course.trim().is_empty() {
        return Err(ValidationError::CourseRequired);
    }
    let digits = normalize_phone(&draft.phone)
        .chars()
        .filter(char::is_ascii_digit)
        .count();
    if digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::PhoneTooShort);
    }
    Ok(())
}

/// Validates the draft and returns the payload to submit, with the phone
/// normalized. Other fields are sent as entered.
pub fn prepare_draft(draft: &ClientDraft) -> Result<ClientDraft, ValidationError> {
    validate_draft(draft)?;
    Ok(ClientDraft {
        phone: normalize_phone(&draft.phone),
        ..draft.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(full_name: &str, phone: &str, course: &str) -> ClientDraft {
        ClientDraft {
            full_name: full_name.into(),
            phone: phone.into(),
            course: course.into(),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_phone_keeping_single_leading_plus() {
        assert_eq!(normalize_phone(" +998 (90) 123-45-67 "), "+998901234567");
        assert_eq!(normalize_phone("90 123 45 67"), "901234567");
        assert_eq!(normalize_phone("++99 8"), "+998");
        assert_eq!(normalize_phone("9+98"), "998");
        assert_eq!(normalize_phone("   "), "");
    }

    #[test]
    fn rejects_blank_required_fields_in_order() {
        assert_eq!(
            validate_draft(&draft("  ", "", "")),
            Err(ValidationError::FullNameRequired)
        );
        assert_eq!(
            validate_draft(&draft("Ali", " ", "")),
            Err(ValidationError::PhoneRequired)
        );
        assert_eq!(
            validate_draft(&draft("Ali", "901234567", "\t")),
            Err(ValidationError::CourseRequired)
        );
    }

    #[test]
    fn requires_nine_digits_after_normalization() {
        assert_eq!(
            validate_draft(&draft("Ali", "+12-34-56-78", "Frontend")),
            Err(ValidationError::PhoneTooShort)
        );
        assert_eq!(validate_draft(&draft("Ali", "12-34-56-789", "Frontend")), Ok(()));
    }

    #[test]
    fn prepared_payload_carries_normalized_phone() {
        let prepared =
            prepare_draft(&draft("Ali", "+998 90 123 45 67", "Frontend")).expect("valid");
        assert_eq!(prepared.phone, "+998901234567");
        assert_eq!(prepared.full_name, "Ali");
    }
}
