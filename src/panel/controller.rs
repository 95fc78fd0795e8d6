use std::sync::{Arc, Mutex};
use futures::StreamExt;
use log::{error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::auth::messages::auth_error_message;
use crate::auth::provider::IdentityProvider;
use crate::auth::types::{Credentials, Session};
use crate::config::io::ConfigIO;
use crate::config::types::TransportKind;
use crate::device::adapter::{DeviceAddress, DeviceSyncAdapter};
use crate::device::constants::RESUBSCRIBE_DELAY;
use crate::device::types::{DesiredState, Device};
use crate::error::DeviceError;
use crate::panel::binding::{UiBinding, UiUpdate};
use crate::panel::status::{StatusNotifier, STATUS_MESSAGE_DURATION};
use crate::panel::types::{Form, FormMessage, Page, Severity, Tab, UiEvent};

const LOGIN_INCOMPLETE: &str = "Please enter email and password.";
const SIGNUP_INVALID: &str = "Use a valid email and 6+ character password.";
const LOGIN_SUCCESS: &str = "Logged in successfully.";
const SIGNUP_SUCCESS: &str = "Account created. You are now signed in.";

/// Connects user interface events to the identity provider and the device transport.
///
/// All failures end up as a form message or a status message; nothing is returned to the
/// caller.
pub struct PanelController {
    identity: Arc<dyn IdentityProvider>,
    adapter: Option<Arc<dyn DeviceSyncAdapter>>,
    ui: Arc<dyn UiBinding>,
    status: StatusNotifier,
    address: DeviceAddress,
    config_io: Option<ConfigIO>,
    page: Mutex<Page>,
    mirror: Mutex<Option<JoinHandle<()>>>,
}

impl PanelController {
    /// `adapter` is `None` when no transport has been configured; device commands then report
    /// an error.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        adapter: Option<Arc<dyn DeviceSyncAdapter>>,
        ui: Arc<dyn UiBinding>,
        address: DeviceAddress,
    ) -> Self {
        PanelController {
            identity,
            adapter,
            status: StatusNotifier::new(ui.clone(), STATUS_MESSAGE_DURATION),
            ui,
            address,
            config_io: None,
            page: Mutex::new(Page::Index),
            mirror: Mutex::new(None),
        }
    }

    /// Persist the device address through `config_io` whenever it changes.
    pub fn with_config_io(mut self, config_io: ConfigIO) -> Self {
        self.config_io = Some(config_io);
        self
    }

    pub fn current_page(&self) -> Page {
        *self.page.lock().expect("Failed to lock page")
    }

    /// Starts following session changes until `cancel` is cancelled.
    pub fn start(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let sessions = self.identity.sessions();
        tokio::spawn(self.clone().watch_sessions(sessions, cancel))
    }

    /// Stops background work that outlives a single event.
    pub fn shutdown(&self) {
        self.stop_mirror();
    }

    pub async fn dispatch(self: &Arc<Self>, event: UiEvent) {
        match event {
            UiEvent::SwitchTab(name) => self.switch_tab(&name),
            UiEvent::SubmitLogin { email, password } => self.login(&email, &password).await,
            UiEvent::SubmitSignup { email, password } => self.signup(&email, &password).await,
            UiEvent::FederatedLogin => self.login_with_federated_provider().await,
            UiEvent::SignOut => self.sign_out().await,
            UiEvent::OpenDashboard => self.open_dashboard().await,
            UiEvent::SetDevice { device, desired } => self.set_device_state(&device, desired).await,
            UiEvent::RefreshStatus => self.refresh_status().await,
            UiEvent::SetDeviceAddress(address) => self.set_device_address(&address).await,
        }
    }

    pub fn switch_tab(&self, name: &str) {
        match Tab::from_name(name) {
            Some(tab) => self.ui.apply(UiUpdate::ActiveTab(tab)),
            None => warn!("Ignoring unknown tab {:?}", name),
        }
    }

    fn set_form_message(&self, form: Form, message: Option<FormMessage>) {
        self.ui.apply(UiUpdate::FormMessage(form, message));
    }

    pub async fn login(self: &Arc<Self>, email: &str, password: &str) {
        let credentials = Credentials::new(email, password);
        self.set_form_message(Form::Login, None);

        if !credentials.is_complete() {
            self.set_form_message(Form::Login, Some(FormMessage::error(LOGIN_INCOMPLETE)));
            return;
        }

        match self.identity.sign_in(&credentials).await {
            Ok(session) => {
                self.set_form_message(Form::Login, Some(FormMessage::success(LOGIN_SUCCESS)));
                self.apply_session(Some(&session)).await;
                self.navigate(Page::Dashboard).await;
            },
            Err(err) => {
                error!("Login error: {:?}", err);
                self.set_form_message(Form::Login, Some(FormMessage::error(auth_error_message(&err))));
            },
        }
    }

    pub async fn signup(self: &Arc<Self>, email: &str, password: &str) {
        let credentials = Credentials::new(email, password);
        self.set_form_message(Form::Signup, None);

        if !credentials.is_valid_for_signup() {
            self.set_form_message(Form::Signup, Some(FormMessage::error(SIGNUP_INVALID)));
            return;
        }

        match self.identity.sign_up(&credentials).await {
            Ok(session) => {
                info!("Account created: {}", session.uid);
                self.set_form_message(Form::Signup, Some(FormMessage::success(SIGNUP_SUCCESS)));
                self.apply_session(Some(&session)).await;
                self.navigate(Page::Dashboard).await;
            },
            Err(err) => {
                error!("Signup error: {:?}", err);
                self.set_form_message(Form::Signup, Some(FormMessage::error(auth_error_message(&err))));
            },
        }
    }

    pub async fn login_with_federated_provider(self: &Arc<Self>) {
        match self.identity.sign_in_federated().await {
            Ok(session) => {
                self.apply_session(Some(&session)).await;
                self.navigate(Page::Dashboard).await;
            },
            Err(err) => {
                error!("Federated login error: {:?}", err);
                self.set_form_message(Form::Login, Some(FormMessage::error(auth_error_message(&err))));
            },
        }
    }

    pub async fn sign_out(self: &Arc<Self>) {
        if let Err(err) = self.identity.sign_out().await {
            error!("Sign out error: {:?}", err);
            return;
        }

        self.apply_session(None).await;
        if self.current_page() != Page::Index {
            self.navigate(Page::Index).await;
        }
    }

    pub async fn open_dashboard(self: &Arc<Self>) {
        if self.identity.sessions().borrow().is_none() {
            warn!("Not signed in, staying on the sign-in page");
            return;
        }
        self.navigate(Page::Dashboard).await;
    }

    /// Shows or hides the signed-in sections. Losing the session while on the dashboard
    /// returns to the sign-in page.
    pub async fn apply_session(self: &Arc<Self>, session: Option<&Session>) {
        match session {
            Some(session) => {
                self.ui.apply(UiUpdate::Session(Some(session.display_email().to_string())));
            },
            None => {
                self.ui.apply(UiUpdate::Session(None));
                if self.current_page() == Page::Dashboard {
                    self.navigate(Page::Index).await;
                }
            },
        }
    }

    async fn navigate(self: &Arc<Self>, page: Page) {
        *self.page.lock().expect("Failed to lock page") = page;

        // like a page load, a navigation starts with empty messages
        self.set_form_message(Form::Login, None);
        self.set_form_message(Form::Signup, None);
        self.status.clear();
        self.ui.apply(UiUpdate::Navigate(page));

        match page {
            Page::Dashboard => {
                let direct = self.adapter.as_ref().map(|adapter| adapter.kind()) == Some(TransportKind::DirectHttp);
                self.ui.apply(UiUpdate::AddressInputVisible(direct));
                self.start_mirror();
                self.refresh_status().await;
            },
            Page::Index => self.stop_mirror(),
        }
    }

    fn adapter(&self) -> Result<&Arc<dyn DeviceSyncAdapter>, DeviceError> {
        self.adapter.as_ref().ok_or(DeviceError::NotConfigured)
    }

    fn report(&self, context: &str, err: &DeviceError) {
        error!("{}: {}", context, err);
        self.status.show(err.user_message(), Severity::Error);
    }

    /// Sends `desired` for the device called `name`. Unknown names are reported and change
    /// nothing.
    pub async fn set_device_state(&self, name: &str, desired: DesiredState) {
        let device = match name.parse::<Device>() {
            Ok(device) => device,
            Err(err) => {
                self.report("Unknown device for control", &err);
                return;
            },
        };

        let result = match self.adapter() {
            Ok(adapter) => adapter.set_device_state(device, desired).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(state) => {
                self.status.show(format!("{} turned {}", device.display_name(), desired.as_str()), Severity::Success);
                self.ui.apply(UiUpdate::DeviceStatus(device, state));
            },
            Err(err) => self.report("Device control error", &err),
        }
    }

    pub async fn refresh_status(&self) {
        let result = match self.adapter() {
            Ok(adapter) => adapter.fetch_all_states().await,
            Err(err) => Err(err),
        };

        match result {
            Ok(states) => {
                for (device, state) in states {
                    self.ui.apply(UiUpdate::DeviceStatus(device, state));
                }
                self.status.show("Status updated", Severity::Success);
            },
            Err(err) => self.report("Status refresh error", &err),
        }
    }

    pub async fn set_device_address(&self, address: &str) {
        let address = address.trim();
        if address.is_empty() {
            self.status.show(DeviceError::MissingAddress.user_message(), Severity::Error);
            return;
        }

        self.address.set(Some(address.to_string()));
        info!("Device address set to {}", address);

        if let Some(config_io) = &self.config_io {
            let saved = match config_io.read().await {
                Ok(mut config) => {
                    config.device_address = Some(address.to_string());
                    config_io.save(&config).await
                },
                Err(err) => Err(err),
            };

            if let Err(err) = saved {
                error!("Failed to save device address: {:?}", err);
                self.status.show(format!("Failed to save device address: {}", err), Severity::Error);
                return;
            }
        }

        self.status.show("Device address saved", Severity::Info);
    }

    fn start_mirror(self: &Arc<Self>) {
        let adapter = match &self.adapter {
            Some(adapter) => adapter.clone(),
            None => return,
        };

        let mut mirror = self.mirror.lock().expect("Failed to lock mirror");
        if mirror.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        *mirror = Some(tokio::spawn(mirror_states(adapter, self.ui.clone())));
    }

    fn stop_mirror(&self) {
        if let Some(task) = self.mirror.lock().expect("Failed to lock mirror").take() {
            task.abort();
        }
    }

    async fn watch_sessions(self: Arc<Self>, mut sessions: watch::Receiver<Option<Session>>, cancel: CancellationToken) {
        loop {
            let session = sessions.borrow_and_update().clone();
            self.apply_session(session.as_ref()).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
            }
        }

        self.shutdown();
        info!("Stopped watching the session");
    }
}

// Copies pushed state changes into the UI until aborted. Transports without push support end
// this immediately.
async fn mirror_states(adapter: Arc<dyn DeviceSyncAdapter>, ui: Arc<dyn UiBinding>) {
    loop {
        let mut updates = match adapter.watch_states() {
            Some(updates) => updates,
            None => return,
        };

        while let Some(update) = updates.next().await {
            match update {
                Ok((device, state)) => ui.apply(UiUpdate::DeviceStatus(device, state)),
                Err(err) => {
                    warn!("State subscription failed: {}", err);
                    break;
                },
            }
        }

        sleep(Duration::from_millis(RESUBSCRIBE_DELAY)).await;
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        self.stop_mirror();
    }
}
