use std::fmt;

use crate::device::types::DesiredState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Login,
    Signup,
}

impl Tab {
    pub fn from_name(name: &str) -> Option<Tab> {
        match name {
            "login" => Some(Tab::Login),
            "signup" => Some(Tab::Signup),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Login => "login",
            Tab::Signup => "signup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Index,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        };

        write!(f, "{}", result)
    }
}

/// The transient line at the bottom of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        StatusMessage { text: text.into(), severity }
    }
}

/// Feedback shown below the login or signup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessage {
    pub text: String,
    pub severity: Severity,
}

impl FormMessage {
    pub fn error(text: impl Into<String>) -> Self {
        FormMessage { text: text.into(), severity: Severity::Error }
    }

    pub fn success(text: impl Into<String>) -> Self {
        FormMessage { text: text.into(), severity: Severity::Success }
    }
}

/// Everything the user can do in the panel.
///
/// Device and tab names arrive as text, exactly as the view knows them, and are validated by
/// the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SwitchTab(String),
    SubmitLogin { email: String, password: String },
    SubmitSignup { email: String, password: String },
    FederatedLogin,
    SignOut,
    OpenDashboard,
    SetDevice { device: String, desired: DesiredState },
    RefreshStatus,
    SetDeviceAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_names() {
        assert_eq!(Tab::from_name("login"), Some(Tab::Login));
        assert_eq!(Tab::from_name("signup"), Some(Tab::Signup));
        assert_eq!(Tab::from_name("settings"), None);
        assert_eq!(Tab::Signup.name(), "signup");
    }
}
