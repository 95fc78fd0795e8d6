use iced::{Event};

use crate::config::types::Config;
use crate::panel::binding::UiUpdate;
use crate::panel::types::UiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    LoginEmail,
    LoginPassword,
    SignupEmail,
    SignupPassword,
    DeviceAddress,
}

/// Text typed into the panel's inputs, kept until it is submitted.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub login_email: String,
    pub login_password: String,
    pub signup_email: String,
    pub signup_password: String,
    pub device_address: String,
}

impl Inputs {
    pub fn set(&mut self, field: InputField, value: String) {
        let target = match field {
            InputField::LoginEmail => &mut self.login_email,
            InputField::LoginPassword => &mut self.login_password,
            InputField::SignupEmail => &mut self.signup_email,
            InputField::SignupPassword => &mut self.signup_password,
            InputField::DeviceAddress => &mut self.device_address,
        };
        *target = value;
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    ConfigLoadComplete((Config, Option<String>)), // error message if loading failed
    ControllerStarted(()),
    Ui(UiUpdate),
    InputChanged(InputField, String),
    Dispatch(UiEvent),
    DispatchComplete(()),
    NoticeConfirmed,
}
