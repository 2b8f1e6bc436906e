//! Input validation for the console's forms.
//!
//! Validation runs before any network call. Failures are reported per field
//! as `ApiError::Validation` and never reach the auth manager.

use chrono::NaiveDate;

use crate::api::{ApiError, FieldErrors, Registration};
use crate::models::{NewFraudRule, NewTransaction, Role};

const MIN_NAME_LENGTH: usize = 2;
const MIN_PASSWORD_LENGTH: usize = 6;
const MIN_CARD_DIGITS: usize = 13;
const MAX_CARD_DIGITS: usize = 19;
const MAX_DESCRIPTION_LENGTH: usize = 500;
const MIN_RULE_NAME_LENGTH: usize = 3;
const MIN_RULE_REASON_LENGTH: usize = 10;

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, "email", email);
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

/// Fields of the registration and create-client forms.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl RegistrationForm {
    /// Validate and turn into the request body.
    pub fn validate(self) -> Result<Registration, ApiError> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.chars().count() < MIN_NAME_LENGTH {
            errors.add("name", format!("Name must be at least {} characters", MIN_NAME_LENGTH));
        }

        check_email(&mut errors, "email", &self.email);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }

        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        errors.into_result()?;
        Ok(Registration {
            name: name.to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            role: self.role,
        })
    }
}

pub fn validate_transaction(tx: &NewTransaction) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    if !(tx.amount > 0.0) {
        errors.add("amount", "Amount must be greater than 0");
    }

    let digits: String = tx.card_number.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        errors.add("card_number", "Only digits are allowed");
    } else if !(MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len()) {
        errors.add(
            "card_number",
            format!("Invalid card number ({}-{} digits)", MIN_CARD_DIGITS, MAX_CARD_DIGITS),
        );
    }

    if !is_valid_email(&tx.customer_email) {
        errors.add("customer_email", "Invalid email");
    }

    if let Some(ref description) = tx.description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.add(
                "description",
                format!("At most {} characters", MAX_DESCRIPTION_LENGTH),
            );
        }
    }

    errors.into_result()
}

pub fn validate_rule(rule: &NewFraudRule) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    if rule.name.trim().chars().count() < MIN_RULE_NAME_LENGTH {
        errors.add(
            "name",
            format!("Name must be at least {} characters", MIN_RULE_NAME_LENGTH),
        );
    }
    if rule.reason.trim().chars().count() < MIN_RULE_REASON_LENGTH {
        errors.add(
            "reason",
            format!("Reason must be at least {} characters", MIN_RULE_REASON_LENGTH),
        );
    }

    for field in rule.rule_type.required_value_fields() {
        let present = match rule.value.get(*field) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        if !present {
            errors.add(&format!("value.{}", field), format!("{} is required", field));
        }
    }

    if let (Some(from), Some(until)) = (rule.valid_from.as_deref(), rule.valid_until.as_deref()) {
        match (parse_date(from), parse_date(until)) {
            (Some(from), Some(until)) if until <= from => {
                errors.add("valid_until", "End date must be after the start date");
            }
            (None, _) => errors.add("valid_from", "Invalid date"),
            (_, None) => errors.add("valid_until", "Invalid date"),
            _ => {}
        }
    }

    errors.into_result()
}

fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add(field, "Email is required");
    } else if !is_valid_email(email) {
        errors.add(field, "Email is not valid");
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Option<NaiveDate> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())
}
