//! Validation helpers for DTOs.

use validator::ValidationError;

/// Length of room codes accepted from clients.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Validates that a room code is exactly six uppercase alphanumeric
/// characters.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("ABC123") // Ok
/// validate_room_code("abc123") // Err - lowercase
/// validate_room_code("AB12")   // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {} characters (got {})",
                ROOM_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message =
            Some("Room code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a caller-supplied user id: non-empty, at most 64 characters, no
/// whitespace.
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > 64 {
        let mut err = ValidationError::new("user_id_length");
        err.message = Some("User id must be between 1 and 64 characters".into());
        return Err(err);
    }

    if id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("user_id_format");
        err.message = Some("User id must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a display name: non-blank, at most 64 characters.
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || name.len() > 64 {
        let mut err = ValidationError::new("username");
        err.message = Some("Username must be between 1 and 64 characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("ABC123").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("000000").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("ABC12").is_err()); // too short
        assert!(validate_room_code("ABC1234").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("abc123").is_err()); // lowercase
        assert!(validate_room_code("ABC-12").is_err()); // punctuation
        assert!(validate_room_code("ABC 12").is_err()); // space
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("user-42").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("has space").is_err());
        assert!(validate_user_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("Priya").is_ok());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }
}
