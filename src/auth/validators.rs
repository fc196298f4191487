// src/auth/validators.rs

use super::models::{LoginRequest, SignupRequest};
use crate::common::{ValidationResult, Validator};

pub struct SignupValidator;

impl Validator<SignupRequest> for SignupValidator {
    fn validate(&self, data: &SignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        validate_name(&mut result, "first_name", &data.first_name);
        validate_name(&mut result, "last_name", &data.last_name);

        if !is_plausible_email(&data.email) {
            result.add_error("email", "A valid email address is required");
        }

        let phone = data.phone.trim();
        if phone.is_empty() {
            result.add_error("phone", "Phone number is required");
        } else if phone.len() > 20
            || !phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
        {
            result.add_error("phone", "Phone number contains invalid characters");
        }

        if data.password.chars().count() < 6 {
            result.add_error("password", "Password must be at least 6 characters");
        } else if data.password.len() > 256 {
            result.add_error("password", "Password must be less than 256 characters");
        }

        result
    }
}

pub struct LoginValidator;

impl Validator<LoginRequest> for LoginValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        }
        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        }

        result
    }
}

fn validate_name(result: &mut ValidationResult, field: &str, value: &str) {
    let len = value.trim().chars().count();
    if len < 2 {
        result.add_error(field, "Must be at least 2 characters");
    } else if len > 100 {
        result.add_error(field, "Must be less than 100 characters");
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.len() > 255 || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn signup() -> SignupRequest {
        SignupRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "a@x.com".to_string(),
            phone: "+1 555-0100".to_string(),
            password: "pw1234".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn test_valid_signup_passes() {
        assert!(SignupValidator.validate(&signup()).is_valid);
    }

    #[test]
    fn test_signup_collects_every_error() {
        let request = SignupRequest {
            first_name: "A".to_string(),
            last_name: "".to_string(),
            email: "not-an-email".to_string(),
            phone: "call me".to_string(),
            password: "123".to_string(),
            role: Role::Admin,
        };
        let result = SignupValidator.validate(&request);
        assert!(!result.is_valid);

        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["first_name", "last_name", "email", "phone", "password"]
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_plausible_email("a@x.com"));
        assert!(!is_plausible_email("a@x"));
        assert!(!is_plausible_email("@x.com"));
        assert!(!is_plausible_email("a@@x.com"));
        assert!(!is_plausible_email("a @x.com"));
        assert!(!is_plausible_email("a@.com"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let result = LoginValidator.validate(&LoginRequest {
            email: " ".to_string(),
            password: String::new(),
        });
        assert_eq!(result.errors.len(), 2);
    }
}
