use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::device::types::{Device, DeviceState, DEVICES};
use crate::panel::binding::{UiBinding, UiUpdate};
use crate::panel::types::{Form, FormMessage, Page, StatusMessage, Tab};

/// Toolkit independent state of everything the panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub page: Page,
    pub auth_card_visible: bool,
    pub app_section_visible: bool,
    pub sign_out_visible: bool,
    pub user_email: String,
    pub active_tab: Tab,
    pub login_message: Option<FormMessage>,
    pub signup_message: Option<FormMessage>,
    pub devices: BTreeMap<Device, DeviceState>,
    pub status_message: Option<StatusMessage>,
    pub address_input_visible: bool,
}

impl Default for PanelView {
    fn default() -> Self {
        PanelView {
            page: Page::Index,
            auth_card_visible: true,
            app_section_visible: false,
            sign_out_visible: false,
            user_email: String::new(),
            active_tab: Tab::Login,
            login_message: None,
            signup_message: None,
            devices: DEVICES.into_iter().map(|device| (device, DeviceState::Unknown)).collect(),
            status_message: None,
            address_input_visible: false,
        }
    }
}

impl PanelView {
    pub fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Session(Some(email)) => {
                self.auth_card_visible = false;
                self.app_section_visible = true;
                self.sign_out_visible = true;
                self.user_email = email;
            },
            UiUpdate::Session(None) => {
                self.auth_card_visible = true;
                self.app_section_visible = false;
                self.sign_out_visible = false;
                self.user_email.clear();
            },
            UiUpdate::ActiveTab(tab) => {
                self.active_tab = tab;
            },
            UiUpdate::FormMessage(Form::Login, message) => {
                self.login_message = message;
            },
            UiUpdate::FormMessage(Form::Signup, message) => {
                self.signup_message = message;
            },
            UiUpdate::DeviceStatus(device, state) => {
                self.devices.insert(device, state);
            },
            UiUpdate::StatusMessage(message) => {
                self.status_message = message;
            },
            UiUpdate::Navigate(page) => {
                self.page = page;
            },
            UiUpdate::AddressInputVisible(visible) => {
                self.address_input_visible = visible;
            },
        }
    }

    pub fn panel_visible(&self, tab: Tab) -> bool {
        self.active_tab == tab
    }

    pub fn form_message(&self, form: Form) -> Option<&FormMessage> {
        match form {
            Form::Login => self.login_message.as_ref(),
            Form::Signup => self.signup_message.as_ref(),
        }
    }

    pub fn device_state(&self, device: Device) -> DeviceState {
        self.devices.get(&device).copied().unwrap_or_default()
    }

    pub fn indicator_text(&self, device: Device) -> String {
        self.device_state(device).indicator_text()
    }
}

/// A binding that applies updates to a [`PanelView`] in place. Used for headless operation
/// and in tests.
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    view: Arc<Mutex<PanelView>>,
}

impl SharedView {
    pub fn snapshot(&self) -> PanelView {
        self.view.lock().expect("Failed to lock PanelView").clone()
    }
}

impl UiBinding for SharedView {
    fn apply(&self, update: UiUpdate) {
        self.view.lock().expect("Failed to lock PanelView").apply(update);
    }
}
