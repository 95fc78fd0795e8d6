use std::time::{Duration, SystemTime};

/// Minimum password length accepted by the sign-up form.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Tokens are refreshed once they are this close to expiring.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: SystemTime,
}

impl Session {
    pub fn needs_refresh(&self, now: SystemTime) -> bool {
        match self.expires_at.duration_since(now) {
            Ok(remaining) => remaining <= TOKEN_REFRESH_MARGIN,
            Err(_) => true, // already expired
        }
    }

    pub fn display_email(&self) -> &str {
        self.email.as_deref().filter(|email| !email.is_empty()).unwrap_or("User")
    }
}

/// Email and password as entered in a form. The email is trimmed, the password is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    pub fn is_valid_for_signup(&self) -> bool {
        self.is_complete() && self.password.chars().count() >= MIN_PASSWORD_LENGTH
    }
}
