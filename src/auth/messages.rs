use log::error;

use crate::error::AuthError;

const GENERIC_DETAIL: &str = "Please check console for details.";

/// Provider error code fragments and the text shown for them.
const AUTH_ERROR_MESSAGES: [(&str, &str); 18] = [
    ("invalid-email", "Please enter a valid email address."),
    ("invalid-credential", "Invalid email or password."),
    ("user-disabled", "This account has been disabled."),
    ("user-not-found", "No account found with this email."),
    ("wrong-password", "Incorrect password."),
    ("email-already-in-use", "An account with this email already exists."),
    ("weak-password", "Password should be at least 6 characters."),
    ("too-many-requests", "Too many failed attempts. Please try again later."),
    ("operation-not-allowed", "This sign-in method is not enabled. Please contact support."),
    ("network-request-failed", "Network error. Please check your internet connection."),
    ("invalid-api-key", "Configuration error. Please contact support."),
    ("app-not-authorized", "App not authorized. Please contact support."),
    ("quota-exceeded", "Service temporarily unavailable. Please try again later."),
    ("credential-already-in-use", "This credential is already associated with a different account."),
    ("account-exists-with-different-credential", "An account already exists with a different sign-in method."),
    ("invalid-argument", "Invalid input. Please check your email and password."),
    ("missing-email", "Please enter an email address."),
    ("missing-password", "Please enter a password."),
];

/// Translates an identity provider error to a short message for the auth forms.
pub fn auth_error_message(err: &AuthError) -> String {
    error!("Identity provider error: {:?}", err);

    let code = match err.code() {
        Some(code) => code,
        None => return format!("Unknown error occurred. {}", GENERIC_DETAIL),
    };
    let message = err.message();
    let lower_message = message.to_lowercase();

    AUTH_ERROR_MESSAGES
        .iter()
        .find(|(key, _)| code.contains(key) || lower_message.contains(key))
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| {
            let detail = if message.is_empty() { GENERIC_DETAIL } else { message.as_str() };
            format!("Error: {}. {}", code, detail)
        })
}
