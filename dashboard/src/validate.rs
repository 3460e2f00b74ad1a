//! Pre-request form validation. Everything here runs before any network call;
//! a failure aborts the action without touching the backend.

use crate::errors::{DashboardError, DashboardResult};
use learnhub_client::{CourseDraft, RegisterRequest, VideoUpload};

const MIN_PASSWORD_LEN: usize = 6;
const OTP_LEN: usize = 6;

fn fail(message: &str) -> DashboardError {
    DashboardError::Validation(message.to_string())
}

pub fn validate_registration(request: &RegisterRequest) -> DashboardResult<()> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
        || request.confirm_password.is_empty()
    {
        return Err(fail("Please fill in all fields"));
    }
    if !plausible_email(&request.email) {
        return Err(fail("Please enter a valid email address"));
    }
    if request.password != request.confirm_password {
        return Err(fail("Passwords do not match"));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(fail("Password must be at least 6 characters long"));
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> DashboardResult<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(fail("Please fill in all fields"));
    }
    Ok(())
}

pub fn validate_otp(otp: &str) -> DashboardResult<()> {
    if otp.len() != OTP_LEN || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(fail("OTP must be 6 digits"));
    }
    Ok(())
}

pub fn validate_course(draft: &CourseDraft) -> DashboardResult<()> {
    if draft.title.trim().is_empty()
        || draft.description.trim().is_empty()
        || draft.teacher_id.trim().is_empty()
        || draft.price < 0.0
    {
        return Err(fail("Please fill in all fields correctly"));
    }
    Ok(())
}

pub fn validate_video(upload: &VideoUpload) -> DashboardResult<()> {
    if upload.title.trim().is_empty()
        || upload.description.trim().is_empty()
        || upload.video.bytes.is_empty()
    {
        return Err(fail("Please fill in all fields"));
    }
    if upload.course_id.trim().is_empty() {
        return Err(fail("Invalid course ID"));
    }
    Ok(())
}

/// Good enough for client-side feedback; the backend owns real verification.
#[must_use]
pub fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Score a password 0 to 5 for the registration strength indicator.
#[must_use]
pub fn password_strength(password: &str) -> u8 {
    let mut strength = 0;
    if password.len() >= 8 {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        strength += 1;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        strength += 1;
    }
    strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_client::Role;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            role: Role::Student,
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(validate_registration(&registration()).is_ok());
    }

    #[test]
    fn mismatched_passwords_rejected() {
        let mut request = registration();
        request.confirm_password = "other12".to_string();
        let err = validate_registration(&request).unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn short_password_rejected() {
        let mut request = registration();
        request.password = "abc".to_string();
        request.confirm_password = "abc".to_string();
        assert!(validate_registration(&request).is_err());
    }

    #[test]
    fn otp_must_be_six_digits() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("1234567").is_err());
        assert!(validate_otp("12345a").is_err());
    }

    #[test]
    fn email_plausibility() {
        assert!(plausible_email("a@b.com"));
        assert!(!plausible_email("a.b.com"));
        assert!(!plausible_email("a@bcom"));
        assert!(!plausible_email("a @b.com"));
        assert!(!plausible_email("@b.com"));
    }

    #[test]
    fn password_strength_scores() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abc"), 1);
        assert_eq!(password_strength("Abcdef1!"), 5);
    }
}
