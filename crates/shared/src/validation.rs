//! Form rules applied before anything is sent to the API.
//!
//! Every rule is evaluated independently, so a single pass reports all
//! problems with a field instead of stopping at the first one.

use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::protocol::{EventPayload, LoginRequest, RegisterRequest};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 64;
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()";
pub const TITLE_MIN_LEN: usize = 3;
pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const LOCATION_MIN_LEN: usize = 3;

pub const MSG_INVALID_EMAIL: &str = "Invalid email address";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const MSG_PASSWORD_TOO_LONG: &str = "Password must be less than 64 characters";
pub const MSG_PASSWORD_UPPERCASE: &str = "Password must contain at least one uppercase letter";
pub const MSG_PASSWORD_LOWERCASE: &str = "Password must contain at least one lowercase letter";
pub const MSG_PASSWORD_NUMBER: &str = "Password must contain at least one number";
pub const MSG_PASSWORD_SPECIAL: &str = "Password must contain at least one special character";
pub const MSG_TITLE_TOO_SHORT: &str = "Title must be at least 3 characters";
pub const MSG_DESCRIPTION_TOO_SHORT: &str = "Description must be at least 10 characters";
pub const MSG_LOCATION_TOO_SHORT: &str = "Location must be at least 3 characters";
pub const MSG_INVALID_DATE: &str = "Invalid date format";
pub const MSG_DATE_IN_PAST: &str = "Date cannot be in the past";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

pub fn validate_login(request: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&request.email, &mut errors);
    check_password(&request.password, &mut errors);
    errors
}

pub fn validate_registration(request: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(&request.email, &mut errors);
    check_password(&request.password, &mut errors);
    errors
}

/// Validates an event form against the given calendar day.
pub fn validate_event(payload: &EventPayload, today: NaiveDate) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if char_len(&payload.title) < TITLE_MIN_LEN {
        errors.push(FieldError::new("title", MSG_TITLE_TOO_SHORT));
    }
    if char_len(&payload.description) < DESCRIPTION_MIN_LEN {
        errors.push(FieldError::new("description", MSG_DESCRIPTION_TOO_SHORT));
    }
    match parse_event_date(&payload.date) {
        None => errors.push(FieldError::new("date", MSG_INVALID_DATE)),
        Some(date) if date < today => errors.push(FieldError::new("date", MSG_DATE_IN_PAST)),
        Some(_) => {}
    }
    if char_len(&payload.location) < LOCATION_MIN_LEN {
        errors.push(FieldError::new("location", MSG_LOCATION_TOO_SHORT));
    }

    errors
}

/// Validates an event form against the current local calendar day.
pub fn validate_event_today(payload: &EventPayload) -> Vec<FieldError> {
    validate_event(payload, Local::now().date_naive())
}

/// Parses the date formats the event form produces and reduces them to a
/// local calendar day.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Local).date_naive());
    }
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    .map(|value| value.date())
}

pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && email_pattern().is_match(email)
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", MSG_INVALID_EMAIL));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    let len = char_len(password);
    if len < PASSWORD_MIN_LEN {
        errors.push(FieldError::new("password", MSG_PASSWORD_TOO_SHORT));
    }
    if len > PASSWORD_MAX_LEN {
        errors.push(FieldError::new("password", MSG_PASSWORD_TOO_LONG));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(FieldError::new("password", MSG_PASSWORD_UPPERCASE));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(FieldError::new("password", MSG_PASSWORD_LOWERCASE));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new("password", MSG_PASSWORD_NUMBER));
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        errors.push(FieldError::new("password", MSG_PASSWORD_SPECIAL));
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
            .expect("email pattern compiles")
    })
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
