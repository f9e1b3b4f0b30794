use super::response::ApiError;

pub const MAX_SPACE_NAME_LENGTH: usize = 200;
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Space names are shown in listings and notifications; keep them one
/// printable line.
pub fn validate_space_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("invalid_space_name"));
    }
    if trimmed.len() > MAX_SPACE_NAME_LENGTH {
        return Err(ApiError::bad_request("invalid_space_name"));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ApiError::bad_request("invalid_space_name"));
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() || text.len() > MAX_TEXT_LENGTH {
        return Err(ApiError::bad_request("invalid_text"));
    }
    Ok(())
}

/// Uploaded filenames are stored verbatim in metadata but must never be
/// usable for path traversal.
pub fn validate_filename(name: &str) -> Result<(), ApiError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.chars().any(char::is_control)
    {
        return Err(ApiError::bad_request("invalid_filename"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_name() {
        assert!(validate_space_name("general").is_ok());
        assert!(validate_space_name("  ").is_err());
        assert!(validate_space_name("a\nb").is_err());
        assert!(validate_space_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_filename() {
        assert!(validate_filename("report.pdf").is_ok());
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("a/b").is_err());
        assert!(validate_filename("").is_err());
    }
}
