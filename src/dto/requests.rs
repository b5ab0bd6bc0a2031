use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Handles are plain ASCII words so `@handle` mentions and profile paths
/// stay unambiguous.
fn validate_handle(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("handle")
            .with_message("Username may only contain letters, digits and underscores".into()))
    }
}

#[derive(Debug, Validate, Deserialize)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        custom(function = "validate_handle")
    )]
    pub username: String,
    #[validate(length(min = 8, max = 100, message = "Password must be 8-100 characters"))]
    pub password: String,
    #[validate(url(message = "Profile image must be a URL"))]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Content rules (trimming, emptiness, the 280-character bound) live in the
/// post service alone.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str) -> SignupRequest {
        SignupRequest {
            email: "someone@example.com".into(),
            username: username.into(),
            password: "password123".into(),
            profile_image_url: None,
        }
    }

    #[test]
    fn handles_are_ascii_words() {
        assert!(signup("alice_99").validate().is_ok());

        for bad in ["@bob", "/etc", "  al", "al ice", "bob/posts", "ålice"] {
            assert!(signup(bad).validate().is_err(), "{bad:?} should be rejected");
        }
    }
}
