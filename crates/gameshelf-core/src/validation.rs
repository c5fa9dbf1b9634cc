// ── Form validation ──
//
// Client-side checks run before a form reaches the network. Each check
// reports at most one message per field, in the order fields appear on
// the form.

use std::fmt;

pub const COLLECTION_NAME_MIN: usize = 2;
pub const COLLECTION_NAME_MAX: usize = 50;
pub const COLLECTION_DESCRIPTION_MAX: usize = 200;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const RATING_MAX: u8 = 10;
pub const NOTES_MAX: usize = 1000;
pub const STATUS_MAX: usize = 50;

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";

/// Field-scoped validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(&'static str, String)>,
}

impl FieldErrors {
    /// Record `message` for `field` unless the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|(_, m)| m.as_str()).collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for FieldErrors {}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// ── Collections ─────────────────────────────────────────────────────

fn check_collection_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("name", "Name is required");
    } else if char_len(name) < COLLECTION_NAME_MIN {
        errors.add("name", "Name must be at least 2 characters");
    } else if char_len(name) > COLLECTION_NAME_MAX {
        errors.add("name", "Name must be 50 characters or less");
    } else if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        errors.add("name", "Name can only contain letters, numbers, and spaces");
    }
}

fn check_collection_description(errors: &mut FieldErrors, description: &str) {
    if char_len(description) > COLLECTION_DESCRIPTION_MAX {
        errors.add("description", "Description must be 200 characters or less");
    }
}

pub fn validate_collection(name: &str, description: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_collection_name(&mut errors, name);
    check_collection_description(&mut errors, description);
    errors.into_result()
}

/// Same rules as [`validate_collection`], applied only to fields being changed.
pub fn validate_collection_update(name: Option<&str>, description: Option<&str>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if let Some(name) = name {
        check_collection_name(&mut errors, name);
    }
    if let Some(description) = description {
        check_collection_description(&mut errors, description);
    }
    errors.into_result()
}

// ── Accounts ────────────────────────────────────────────────────────

pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn validate_signup(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    let username_len = char_len(username.trim());
    if username_len < USERNAME_MIN {
        errors.add("username", "Username must be at least 3 characters");
    } else if username_len > USERNAME_MAX {
        errors.add("username", "Username must be 50 characters or less");
    }
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    let password_len = char_len(password);
    if password_len < PASSWORD_MIN {
        errors.add("password", "Password must be at least 8 characters");
    } else if password_len > PASSWORD_MAX {
        errors.add("password", "Password must be 128 characters or less");
    }
    if password != confirm_password {
        errors.add("confirm_password", PASSWORDS_DO_NOT_MATCH);
    }
    errors.into_result()
}

// ── Entries ─────────────────────────────────────────────────────────

pub fn validate_entry(rating: Option<u8>, notes: Option<&str>, status: Option<&str>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if rating.is_some_and(|r| r > RATING_MAX) {
        errors.add("rating", "Rating must be between 0 and 10");
    }
    if notes.is_some_and(|n| char_len(n) > NOTES_MAX) {
        errors.add("notes", "Notes must be 1000 characters or less");
    }
    if status.is_some_and(|s| char_len(s) > STATUS_MAX) {
        errors.add("status", "Status must be 50 characters or less");
    }
    errors.into_result()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name_error(name: &str) -> Option<String> {
        validate_collection(name, "")
            .err()
            .and_then(|e| e.get("name").map(str::to_owned))
    }

    #[test]
    fn collection_name_rules_in_order() {
        assert_eq!(name_error("   ").as_deref(), Some("Name is required"));
        assert_eq!(name_error("a").as_deref(), Some("Name must be at least 2 characters"));
        assert_eq!(
            name_error(&"x".repeat(51)).as_deref(),
            Some("Name must be 50 characters or less")
        );
        assert_eq!(
            name_error("RPGs!").as_deref(),
            Some("Name can only contain letters, numbers, and spaces")
        );
        assert_eq!(name_error("Top 10 RPGs"), None);
        assert_eq!(name_error(&"x".repeat(50)), None);
    }

    #[test]
    fn description_limit() {
        let err = validate_collection("Backlog", &"d".repeat(201)).unwrap_err();
        assert_eq!(err.get("description"), Some("Description must be 200 characters or less"));
        assert!(validate_collection("Backlog", &"d".repeat(200)).is_ok());
    }

    #[test]
    fn update_checks_only_changed_fields() {
        assert!(validate_collection_update(None, Some("fine")).is_ok());
        assert!(validate_collection_update(Some("!"), None).is_err());
    }

    #[test]
    fn signup_mismatch_message() {
        let err = validate_signup("player", "p@example.com", "password123", "password124").unwrap_err();
        assert_eq!(err.get("confirm_password"), Some(PASSWORDS_DO_NOT_MATCH));
        assert_eq!(err.to_string(), PASSWORDS_DO_NOT_MATCH);
    }

    #[test]
    fn signup_length_bounds() {
        let err = validate_signup("ab", "", "short", "short").unwrap_err();
        assert_eq!(err.iter().map(|(f, _)| f).collect::<Vec<_>>(), vec!["username", "email", "password"]);
        assert!(validate_signup("abc", "a@b.c", "12345678", "12345678").is_ok());
    }

    #[test]
    fn entry_rating_range() {
        assert!(validate_entry(Some(10), None, None).is_ok());
        assert!(validate_entry(Some(0), None, None).is_ok());
        assert_eq!(
            validate_entry(Some(11), None, None).unwrap_err().get("rating"),
            Some("Rating must be between 0 and 10")
        );
    }
}
