//! Shared helpers for command handlers.

use std::io::IsTerminal;

use gameshelf_core::{CustomTags, Shelf};

use crate::error::CliError;

/// Collections and entries belong to a user; bail early without a session.
pub fn require_login(shelf: &Shelf) -> Result<(), CliError> {
    if shelf.session().is_logged_in() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn)
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()?)
}

/// Parse repeated `--tag key=value` flags. No flags means "leave tags alone".
pub fn parse_tags(raw: &[String]) -> Result<Option<CustomTags>, CliError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.iter()
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| CliError::Validation {
                field: "tag".into(),
                reason: format!("expected KEY=VALUE, got '{pair}'"),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "tag".into(),
                    reason: format!("empty key in '{pair}'"),
                });
            }
            Ok((key.to_owned(), serde_json::Value::String(value.trim().to_owned())))
        })
        .collect::<Result<CustomTags, _>>()
        .map(Some)
}

/// Tag value as shown in a table cell: strings unquoted, anything else
/// as compact JSON.
pub fn tag_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Empty string for `None`, for table cells.
pub fn or_blank<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_into_sorted_map() {
        let tags = parse_tags(&["platform=PC".into(), " mood = cozy ".into()]).unwrap().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["mood"], "cozy");
        assert_eq!(tags["platform"], "PC");
    }

    #[test]
    fn tag_values_render_without_quotes() {
        assert_eq!(tag_value(&serde_json::json!("cozy")), "cozy");
        assert_eq!(tag_value(&serde_json::json!(40)), "40");
        assert_eq!(tag_value(&serde_json::json!(true)), "true");
    }

    #[test]
    fn no_tags_is_none() {
        assert!(parse_tags(&[]).unwrap().is_none());
    }

    #[test]
    fn malformed_tag_is_rejected() {
        let err = parse_tags(&["platform".into()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for tag: expected KEY=VALUE, got 'platform'");
        assert!(parse_tags(&["=x".into()]).is_err());
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("Delete?", true).unwrap());
    }
}
