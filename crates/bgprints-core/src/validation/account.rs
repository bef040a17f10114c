//! Account form validation
//!
//! Predicates for the sign-up, sign-in, confirmation and payment forms. Each
//! takes a value and returns `Ok(())` or the `FieldError` to show next to it.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::FieldError;
use crate::models::PaymentContact;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const LOGIN_PASSWORD_MIN_LENGTH: u64 = 6;
pub const PHONE_NUMBER_DIGITS: usize = 12;
pub const MINIMUM_AGE_YEARS: u32 = 16;
pub const CONFIRMATION_CODE_LENGTH: usize = 6;

/// Special characters a password may (and must at least once) contain.
pub const PASSWORD_SPECIAL_CHARS: &str = "@$!%*?&";

/// Mail providers accepted at sign-up.
pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &["gmail", "outlook", "yahoo", "hotmail"];

/// Validate a username
///
/// Rules:
/// - 3 to 20 characters
/// - letters, digits and underscore only
pub fn validate_username(username: &str) -> Result<(), FieldError> {
    let len = username.chars().count();
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) || !allowed {
        return Err(FieldError::new(
            "username",
            "Username must be 3-20 characters long and can include letters, numbers, or underscores.",
        ));
    }
    Ok(())
}

/// Validate an email address against the accepted providers.
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    let invalid = || FieldError::new("email", "Please enter a valid email address.");
    let pattern = Regex::new(&format!(
        r"^[^\s@]+@({})\.com$",
        ALLOWED_EMAIL_DOMAINS.join("|")
    ))
    .map_err(|_| invalid())?;

    if !pattern.is_match(email) {
        return Err(invalid());
    }
    Ok(())
}

/// Validate a sign-up password
///
/// Rules:
/// - at least 8 characters from `[A-Za-z0-9@$!%*?&]`
/// - at least one lowercase, one uppercase, one digit and one special character
pub fn validate_password(password: &str) -> Result<(), FieldError> {
    let is_special = |c: char| PASSWORD_SPECIAL_CHARS.contains(c);
    let only_allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c));
    let ok = password.chars().count() >= PASSWORD_MIN_LENGTH
        && only_allowed
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special);

    if !ok {
        return Err(FieldError::new(
            "password",
            "Password must be at least 8 characters long, include a number, an uppercase letter, a lowercase letter, and a special character.",
        ));
    }
    Ok(())
}

/// Validate a phone number: exactly 12 digits (country code plus 10-digit
/// number) once spaces, dashes and the leading `+` are stripped.
pub fn validate_phone_number(number: &str) -> Result<(), FieldError> {
    let digits = number.chars().filter(|c| c.is_ascii_digit()).count();
    if digits != PHONE_NUMBER_DIGITS {
        return Err(FieldError::new(
            "phone_number",
            "Phone number must have exactly 12 digits including the country code.",
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.trim().is_empty() {
        return Err(FieldError::new("name", "Please enter your name."));
    }
    Ok(())
}

/// Validate a birthdate: not in the future and at least 16 full years before `today`.
pub fn validate_birthdate(birthdate: NaiveDate, today: NaiveDate) -> Result<(), FieldError> {
    match today.years_since(birthdate) {
        None => Err(FieldError::new(
            "birthdate",
            "Birthdate cannot be in the future.",
        )),
        Some(age) if age < MINIMUM_AGE_YEARS => Err(FieldError::new(
            "birthdate",
            "You must be at least 16 years old to sign up.",
        )),
        Some(_) => Ok(()),
    }
}

/// Validate a sign-up confirmation or MFA code: exactly six digits.
pub fn validate_confirmation_code(code: &str) -> Result<(), FieldError> {
    let code = code.trim();
    if code.len() != CONFIRMATION_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            "code",
            "Enter the 6-digit code we sent you.",
        ));
    }
    Ok(())
}

/// Sign-up form. Unlike sign-in, every field is checked and all failures are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone_number: String,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
}

impl SignupForm {
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<FieldError>> {
        let mut errors: Vec<FieldError> = [
            validate_username(&self.username),
            validate_email(&self.email),
            validate_password(&self.password),
            validate_phone_number(&self.phone_number),
            validate_name(&self.name),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        match self.birthdate {
            Some(date) => {
                if let Err(e) = validate_birthdate(date, today) {
                    errors.push(e);
                }
            }
            None => errors.push(FieldError::new("birthdate", "Please select your birthdate.")),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Sign-in form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username cannot be empty."))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        self.validate()
            .map_err(|e| FieldError::from_validation_errors(&e))
    }
}

/// Payment form: every field is required.
pub fn validate_payment_contact(contact: &PaymentContact) -> Result<(), Vec<FieldError>> {
    let required = [
        ("name", contact.name.as_str()),
        ("email", contact.email.as_str()),
        ("contact", contact.contact.as_str()),
    ];
    let errors: Vec<FieldError> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError::new(*field, "Please fill in all fields to proceed."))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("print_user_42").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("a".repeat(21).as_str()).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("dash-name").is_err());
    }

    #[test]
    fn test_validate_email_providers() {
        assert!(validate_email("asha@gmail.com").is_ok());
        assert!(validate_email("r.k@outlook.com").is_ok());
        assert!(validate_email("someone@example.com").is_err());
        assert!(validate_email("two@@gmail.com").is_err());
        assert!(validate_email("sp ace@gmail.com").is_err());
        assert!(validate_email("asha@gmail.co").is_err());
        assert_eq!(validate_email("").unwrap_err().field, "email");
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secur3@pw").is_ok());
        assert!(validate_password("Sh0rt@").is_err());
        assert!(validate_password("alllower1@").is_err());
        assert!(validate_password("ALLUPPER1@").is_err());
        assert!(validate_password("NoDigits@@").is_err());
        assert!(validate_password("NoSpecial12").is_err());
        assert!(validate_password("Bad#Char12").is_err());
    }

    #[test]
    fn test_validate_phone_number_counts_digits() {
        assert!(validate_phone_number("+91 98765-43210").is_ok());
        assert!(validate_phone_number("9876543210").is_err());
        assert!(validate_phone_number("").is_err());
    }

    #[test]
    fn test_validate_birthdate_minimum_age() {
        let today = date(2024, 6, 15);
        assert!(validate_birthdate(date(2008, 6, 15), today).is_ok());
        assert!(validate_birthdate(date(2008, 6, 16), today).is_err());
        assert!(validate_birthdate(date(2030, 1, 1), today).is_err());
    }

    #[test]
    fn test_validate_confirmation_code() {
        assert!(validate_confirmation_code("123456").is_ok());
        assert!(validate_confirmation_code(" 123456 ").is_ok());
        assert!(validate_confirmation_code("12345").is_err());
        assert!(validate_confirmation_code("12a456").is_err());
    }

    #[test]
    fn test_signup_form_collects_every_error() {
        let form = SignupForm {
            username: "x".to_string(),
            password: "weak".to_string(),
            email: "x@example.com".to_string(),
            phone_number: "123".to_string(),
            name: " ".to_string(),
            birthdate: None,
        };
        let errors = form.validate(date(2024, 1, 1)).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["username", "email", "password", "phone_number", "name", "birthdate"]
        );
    }

    #[test]
    fn test_signup_form_valid() {
        let form = SignupForm {
            username: "asha_k".to_string(),
            password: "Secur3@pw".to_string(),
            email: "asha@gmail.com".to_string(),
            phone_number: "919876543210".to_string(),
            name: "Asha".to_string(),
            birthdate: Some(date(1995, 3, 2)),
        };
        assert!(form.validate(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_login_form() {
        assert!(LoginForm::new("asha", "secret").check().is_ok());

        let errors = LoginForm::new("  ", "12345").check().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["password", "username"]);
        assert!(errors
            .iter()
            .any(|e| e.message == "Password must be at least 6 characters long."));
    }

    #[test]
    fn test_payment_contact_requires_all_fields() {
        let contact = PaymentContact {
            name: "Asha".to_string(),
            email: String::new(),
            contact: "  ".to_string(),
        };
        let errors = validate_payment_contact(&contact).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Please fill in all fields to proceed.");
    }
}
