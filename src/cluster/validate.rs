//! Field validators applied before anything touches a config layer.
//!
//! A single rejected field aborts the whole write. The forbidden characters
//! are the ones that would break the flat KEY=VALUE format: line breaks split
//! the entry, `#` starts a comment, quotes get stripped on the next parse.

use thiserror::Error;

use super::envfile::EnvMap;

pub const MAX_PLAYERS_MIN: i64 = 1;
pub const MAX_PLAYERS_MAX: i64 = 100;
pub const PASSWORD_MAX_LEN: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be an integer")]
    NotAnInteger { field: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must not contain whitespace, line breaks, # or quotes")]
    ForbiddenSecretChars { field: String },

    #[error("{field} must not contain line breaks, # or quotes")]
    ForbiddenOptionChars { field: String },

    #[error("{field} must be a comma separated list of numeric ids")]
    NotIdList { field: String },

    #[error("Map {0} is assigned to more than one server")]
    DuplicateMap(String),

    #[error("Invalid schedule expression '{expression}': {reason}")]
    Schedule { expression: String, reason: String },

    #[error("Player id must be 32 lowercase hex characters")]
    ExternalId,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Command required")]
    EmptyCommand,

    #[error("Config file {0} is not editable")]
    ConfigFile(String),

    #[error("{0} is not an editable key")]
    UnknownKey(String),
}

/// Player slots. Empty input means "unset".
pub fn validate_max_players(value: &str) -> Result<Option<i64>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let n: i64 = value.parse().map_err(|_| ValidationError::NotAnInteger {
        field: "MAX_PLAYERS".to_string(),
    })?;
    if !(MAX_PLAYERS_MIN..=MAX_PLAYERS_MAX).contains(&n) {
        return Err(ValidationError::OutOfRange {
            field: "MAX_PLAYERS".to_string(),
            min: MAX_PLAYERS_MIN,
            max: MAX_PLAYERS_MAX,
        });
    }
    Ok(Some(n))
}

/// Server and admin passwords: symbols allowed, no whitespace, `#` or quotes.
pub fn validate_password(value: &str, field: &str) -> Result<String, ValidationError> {
    if value.chars().count() > PASSWORD_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: PASSWORD_MAX_LEN,
        });
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '\'' | '"'))
    {
        return Err(ValidationError::ForbiddenSecretChars {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Comma separated numeric ids, e.g. `MODS=928708,929420`. Empty is allowed.
pub fn validate_id_list(value: &str, field: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Ok(String::new());
    }
    let well_formed = value
        .split(',')
        .all(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(ValidationError::NotIdList {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Free text launch options: spaces allowed.
pub fn validate_option_text(value: &str, field: &str) -> Result<String, ValidationError> {
    if value.chars().any(|c| matches!(c, '\r' | '\n' | '#' | '\'' | '"')) {
        return Err(ValidationError::ForbiddenOptionChars {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

pub fn validate_external_id(value: &str) -> Result<(), ValidationError> {
    if value.len() == 32 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(ValidationError::ExternalId)
    }
}

/// Each map may be hosted by at most one unit.
pub fn check_unique_maps(env: &EnvMap, map_keys: &[String]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for key in map_keys {
        if let Some(map) = env.get(key).filter(|m| !m.is_empty()) {
            if !seen.insert(map.as_str()) {
                return Err(ValidationError::DuplicateMap(map.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_players_bounds() {
        assert!(validate_max_players("0").is_err());
        assert!(validate_max_players("101").is_err());
        assert_eq!(validate_max_players("1"), Ok(Some(1)));
        assert_eq!(validate_max_players("100"), Ok(Some(100)));
        assert_eq!(validate_max_players(""), Ok(None));
    }

    #[test]
    fn max_players_rejects_non_integers() {
        assert!(matches!(
            validate_max_players("12.5"),
            Err(ValidationError::NotAnInteger { .. })
        ));
        assert!(validate_max_players("ten").is_err());
    }

    #[test]
    fn password_rejects_format_breaking_chars() {
        for bad in ["pass word", "pass#word", "pass'word", "pass\"word", "pass\nword", "pass\tword"] {
            assert!(validate_password(bad, "SERVER_PASSWORD").is_err(), "{bad:?}");
        }
    }

    #[test]
    fn password_length_ceiling() {
        let ok = "a".repeat(32);
        let too_long = "a".repeat(33);
        assert_eq!(validate_password(&ok, "SERVER_PASSWORD"), Ok(ok.clone()));
        assert!(matches!(
            validate_password(&too_long, "SERVER_PASSWORD"),
            Err(ValidationError::TooLong { max: 32, .. })
        ));
        assert!(validate_password("p@ss!w0rd$%", "ARK_ADMIN_PASSWORD").is_ok());
    }

    #[test]
    fn id_lists() {
        assert!(validate_id_list("", "MODS").is_ok());
        assert!(validate_id_list("928708", "MODS").is_ok());
        assert!(validate_id_list("928708,929420", "MODS").is_ok());
        assert!(validate_id_list("928708,", "MODS").is_err());
        assert!(validate_id_list("92 8708", "MODS").is_err());
        assert!(validate_id_list("abc", "MODS").is_err());
    }

    #[test]
    fn option_text_allows_spaces() {
        assert!(validate_option_text("-NoBattlEye -ForceAllowCaveFlyers", "ARK_EXTRA_DASH_OPTS").is_ok());
        assert!(validate_option_text("?ServerPVE=True#", "ARK_EXTRA_OPTS").is_err());
        assert!(validate_option_text("a\r\nb", "ARK_EXTRA_OPTS").is_err());
    }

    #[test]
    fn duplicate_maps_detected() {
        let keys = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let mut env = EnvMap::new();
        env.insert("A".into(), "TheIsland_WP".into());
        env.insert("B".into(), "Ragnarok_WP".into());
        assert!(check_unique_maps(&env, &keys).is_ok());
        env.insert("C".into(), "TheIsland_WP".into());
        assert_eq!(
            check_unique_maps(&env, &keys),
            Err(ValidationError::DuplicateMap("TheIsland_WP".into()))
        );
    }
}
