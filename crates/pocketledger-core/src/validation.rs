//! Form validation before anything is sent to the server.
//!
//! Each validator turns raw form input into the payload type the client
//! sends, or returns the per-field messages shown next to the inputs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CategoryInput, Registration, TransactionInput, TransactionType};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Server message for a duplicate registration
const EMAIL_TAKEN: &str = "Email already registered";

/// Field name to message. Empty means valid.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn check<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

// ============================================================================
// Transactions
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TransactionForm {
    pub kind: TransactionType,
    pub amount: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

pub fn validate_transaction(form: &TransactionForm) -> Result<TransactionInput, FieldErrors> {
    let mut errors = FieldErrors::default();

    let amount = form
        .amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0);
    if amount.is_none() {
        errors.insert("amount", "Please enter a valid amount");
    }

    if form.category.trim().is_empty() {
        errors.insert("category", "Please select a category");
    }

    let date = form.date.trim();
    let parsed_date = if date.is_empty() {
        errors.insert("date", "Please select a date");
        None
    } else {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
        if parsed.is_none() {
            errors.insert("date", "Please enter a date as YYYY-MM-DD");
        }
        parsed
    };

    match (amount, parsed_date) {
        (Some(amount), Some(date)) if errors.is_empty() => Ok(TransactionInput {
            kind: form.kind,
            amount,
            category: form.category.trim().to_string(),
            subcategory: form.subcategory.trim().to_string(),
            description: form.description.trim().to_string(),
            date,
        }),
        _ => Err(errors),
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
    pub kind: TransactionType,
    pub color: String,
    pub icon: String,
}

pub fn validate_category(form: &CategoryForm) -> Result<CategoryInput, FieldErrors> {
    let mut errors = FieldErrors::default();
    if form.name.trim().is_empty() {
        errors.insert("name", "Category name is required");
    }
    if form.color.is_empty() {
        errors.insert("color", "Please select a color");
    }
    if form.icon.is_empty() {
        errors.insert("icon", "Please select an icon");
    }
    errors.check(CategoryInput {
        name: form.name.trim().to_string(),
        kind: form.kind,
        color: form.color.clone(),
        icon: form.icon.clone(),
    })
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Password strength indicators shown while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordChecks {
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_number: bool,
    pub has_length: bool,
}

impl PasswordChecks {
    pub fn of(password: &str) -> Self {
        Self {
            has_upper: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lower: password.chars().any(|c| c.is_ascii_lowercase()),
            has_number: password.chars().any(|c| c.is_ascii_digit()),
            has_length: password.chars().count() >= MIN_PASSWORD_LENGTH,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.has_upper && self.has_lower && self.has_number && self.has_length
    }
}

/// `local@domain.tld` with no whitespace and a single `@`
pub fn is_valid_email(email: &str) -> bool {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
    RE.is_match(email)
}

fn password_error(password: &str) -> Option<&'static str> {
    let checks = PasswordChecks::of(password);
    if password.is_empty() {
        Some("Password is required")
    } else if !checks.has_length {
        Some("Password must be at least 8 characters")
    } else if !checks.has_upper {
        Some("Password must contain at least one uppercase letter (A-Z)")
    } else if !checks.has_lower {
        Some("Password must contain at least one lowercase letter (a-z)")
    } else if !checks.has_number {
        Some("Password must contain at least one number (0-9)")
    } else {
        None
    }
}

pub fn validate_registration(form: &RegistrationForm) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::default();

    if form.name.trim().is_empty() {
        errors.insert("name", "Name is required");
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.insert("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.insert("email", "Please enter a valid email");
    }

    if let Some(message) = password_error(&form.password) {
        errors.insert("password", message);
    }

    if form.confirm_password.is_empty() {
        errors.insert("confirm_password", "Please confirm your password");
    } else if form.password != form.confirm_password {
        errors.insert("confirm_password", "Passwords do not match");
    }

    errors.check(Registration {
        name: form.name.trim().to_string(),
        email: email.to_string(),
        password: form.password.clone(),
    })
}

/// Attach a rejected registration's message to the field it concerns
pub fn registration_failure(message: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if message == EMAIL_TAKEN {
        errors.insert("email", "This email is already registered");
    } else if message.is_empty() {
        errors.insert("global", "Registration failed");
    } else {
        errors.insert("global", message);
    }
    errors
}

pub fn validate_reset_email(email: &str) -> Result<String, FieldErrors> {
    let email = email.trim();
    let mut errors = FieldErrors::default();
    if email.is_empty() {
        errors.insert("email", "Email is required");
    }
    errors.check(email.to_string())
}
