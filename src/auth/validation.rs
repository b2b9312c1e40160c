//! Structural validation of the login and register payloads.
//!
//! Each validator takes raw JSON and either returns the typed request or the
//! full, ordered list of field violations. Every field is checked before
//! returning.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

/// One failed constraint, addressed by its field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub message: String,
    pub path: Vec<String>,
}

impl Violation {
    pub fn new(message: impl Into<String>, path: &[&str]) -> Self {
        Self {
            message: message.into(),
            path: path.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_login(body: &Value) -> Result<LoginInput, Vec<Violation>> {
    let obj = as_object(body)?;
    let mut violations = Vec::new();

    let email = email_field(obj, &mut violations);
    let password = min_len_field(
        obj,
        "password",
        MIN_PASSWORD_LEN,
        "Password must be at least 6 characters",
        &mut violations,
    );

    match (email, password) {
        (Some(email), Some(password)) if violations.is_empty() => Ok(LoginInput {
            email: email.to_owned(),
            password: password.to_owned(),
        }),
        _ => Err(violations),
    }
}

pub fn validate_register(body: &Value) -> Result<RegisterInput, Vec<Violation>> {
    let obj = as_object(body)?;
    let mut violations = Vec::new();

    let email = email_field(obj, &mut violations);
    let username = min_len_field(
        obj,
        "username",
        MIN_USERNAME_LEN,
        "Username must be at least 3 characters",
        &mut violations,
    );
    let password = min_len_field(
        obj,
        "password",
        MIN_PASSWORD_LEN,
        "Password must be at least 6 characters",
        &mut violations,
    );
    let confirm = min_len_field(
        obj,
        "confirmPassword",
        MIN_PASSWORD_LEN,
        "Password confirmation is required",
        &mut violations,
    );

    // Runs after length failures too, but not when any field is missing or
    // not a string.
    if let (Some(_), Some(_), Some(password), Some(confirm)) = (email, username, password, confirm) {
        if password != confirm {
            violations.push(Violation::new("Passwords do not match", &["confirmPassword"]));
        }
    }

    match (email, username, password) {
        (Some(email), Some(username), Some(password)) if violations.is_empty() => {
            Ok(RegisterInput {
                email: email.to_owned(),
                username: username.to_owned(),
                password: password.to_owned(),
            })
        }
        _ => Err(violations),
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, Vec<Violation>> {
    body.as_object().ok_or_else(|| {
        vec![Violation::new(
            format!("Expected object, received {}", type_name(body)),
            &[],
        )]
    })
}

/// Returns the field as a string, or records why it is not one.
fn string_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<&'a str> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.as_str()),
        None => {
            violations.push(Violation::new("Required", &[key]));
            None
        }
        Some(other) => {
            violations.push(Violation::new(
                format!("Expected string, received {}", type_name(other)),
                &[key],
            ));
            None
        }
    }
}

fn email_field<'a>(obj: &'a Map<String, Value>, violations: &mut Vec<Violation>) -> Option<&'a str> {
    let email = string_field(obj, "email", violations)?;
    if email.is_empty() {
        violations.push(Violation::new("Email is required", &["email"]));
    }
    if !is_valid_email(email) {
        violations.push(Violation::new("Invalid email", &["email"]));
    }
    Some(email)
}

fn min_len_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    min: usize,
    message: &str,
    violations: &mut Vec<Violation>,
) -> Option<&'a str> {
    let value = string_field(obj, key, violations)?;
    if value.chars().count() < min {
        violations.push(Violation::new(message, &[key]));
    }
    Some(value)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
