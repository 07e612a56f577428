use validator::ValidationError;

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let trimmed = password.trim();

    if trimmed.is_empty() || trimmed.len() < 8 {
        return Err(ValidationError::new(
            "Password cannot be empty and must be at least 8 characters long",
        ));
    }

    let has_lowercase = trimmed.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = trimmed.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = trimmed.chars().any(|c| c.is_ascii_digit());
    let has_special = trimmed.chars().any(|c| "!@#$%^&*".contains(c));

    if !(has_lowercase && has_uppercase && has_digit && has_special) {
        return Err(ValidationError::new(
            "Password must contain at least one uppercase letter, one lowercase \
             letter, one digit, and one special character (!@#$%^&*)",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        assert!(validate_password("SecurePass123!").is_ok());
    }

    #[test]
    fn weak_passwords_fail() {
        assert!(validate_password("short1!").is_err());
        assert!(validate_password("nouppercase123!").is_err());
        assert!(validate_password("NOLOWERCASE123!").is_err());
        assert!(validate_password("NoDigitsHere!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
    }
}
