//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest player name accepted, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 64;

/// Validates a player name as typed at the front desk.
///
/// Blank names pass: adding or renaming with one is a no-op handled by the services.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("김민수") // Ok
/// validate_player_name("")       // Ok - ignored later
/// validate_player_name("a\tb")   // Err - control character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length > MAX_PLAYER_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
