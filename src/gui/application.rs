use futures::channel::mpsc::{unbounded, UnboundedSender};
use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::theme::{self, Theme};
use iced::widget::{
    Column, Row, Space, button, column, container, horizontal_rule, row, text, text_input,
};
use std::sync::{Arc, Mutex};
use log::{error, info, warn};
use tokio_util::sync::{CancellationToken};

use crate::auth::firebase::FirebaseIdentity;
use crate::auth::provider::IdentityProvider;
use crate::config::io::{ConfigIO};
use crate::config::types::{Config, TransportKind};
use crate::device::adapter::{build_adapter, DeviceAddress};
use crate::device::types::{DesiredState, Device, DEVICES};
use crate::error::AppRunError;
use crate::gui::style::{severity_color, state_color, FlatButtonStyleSheet};
use crate::gui::types::{InputField, Inputs, Message};
use crate::gui::updates::{ui_update_subscription, SharedReceiver};
use crate::panel::binding::{ChannelBinding, UiUpdate};
use crate::panel::controller::PanelController;
use crate::panel::types::{Form, FormMessage, Page, Tab, UiEvent};
use crate::panel::view::PanelView;
use crate::RunOptions;

const USER_AGENT: &str = concat!("cash-panel/", env!("CARGO_PKG_VERSION"));

pub struct ApplicationFlags {
    config_io: ConfigIO,
    transport_override: Option<TransportKind>,
    client: reqwest::Client,
}

/// The one HTTP client shared by the identity provider and the device transports.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
}

pub struct PanelApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    config_io: ConfigIO,
    transport_override: Option<TransportKind>,
    client: reqwest::Client,

    // the controller talks to the view through this channel
    ui_sender: UnboundedSender<UiUpdate>,
    ui_receiver: SharedReceiver,

    // created once the config has been loaded
    controller: Option<Arc<PanelController>>,

    view: PanelView,
    inputs: Inputs,
}

impl PanelApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
        if let Some(controller) = &self.controller {
            controller.shutdown();
        }
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    let mut error_message: Option<String> = None;

                    if err.is_file_not_found_error() {
                        info!("Config file not found, using defaults");
                    } else {
                        error!("Failed to load config: {:?}", &err);
                        error_message = Some(format!("Failed to load config: {}", &err));
                    }
                    (Config::default(), error_message)
                }
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn start_controller(&mut self, config: Config) -> Command<Message> {
        let identity: Arc<dyn IdentityProvider> = Arc::new(
            FirebaseIdentity::new(self.client.clone(), config.identity.clone())
        );
        let address = DeviceAddress::new(config.device_address.clone());
        self.inputs.device_address = config.device_address.clone().unwrap_or_default();

        let adapter = match self.transport_override.or(config.transport) {
            Some(kind) => {
                info!("Using the {} transport", kind);
                Some(build_adapter(kind, &config, self.client.clone(), identity.clone(), address.clone()))
            },
            None => {
                warn!("No transport configured");
                self.notices.push(format!(
                    "No device transport is configured. Set \"transport\" to \"remote-store\" or \
\"direct-http\" in {}, or start the panel with --transport.",
                    self.config_io.path().to_string_lossy(),
                ));
                None
            },
        };

        let controller = Arc::new(
            PanelController::new(
                identity,
                adapter,
                Arc::new(ChannelBinding::new(self.ui_sender.clone())),
                address,
            ).with_config_io(self.config_io.clone())
        );
        self.controller = Some(controller.clone());

        let cancel = self.app_cancel.clone();
        let fut = async move {
            // spawned from within the executor so that it runs on the tokio runtime
            controller.start(cancel);
        };

        Command::perform(fut, Message::ControllerStarted)
    }

    fn dispatch(&self, event: UiEvent) -> Command<Message> {
        let controller = match &self.controller {
            Some(controller) => controller.clone(),
            None => {
                warn!("Ignoring {:?}, the panel is still starting", event);
                return Command::none();
            },
        };

        Command::perform(async move { controller.dispatch(event).await }, Message::DispatchComplete)
    }

    fn header(&self) -> Element<Message> {
        let mut header = Row::new()
            .push(text("CASH Panel").size(24))
            .push(Space::with_width(Length::Fill))
            .align_items(Alignment::Center)
            .spacing(10);

        if !self.view.user_email.is_empty() {
            header = header.push(text(&self.view.user_email));
        }

        if self.view.sign_out_visible {
            header = header.push(
                button(text("Sign out"))
                    .style(theme::Button::Secondary)
                    .on_press(Message::Dispatch(UiEvent::SignOut))
            );
        }

        header.into()
    }

    fn form_message(&self, form: Form) -> Element<Message> {
        match self.view.form_message(form) {
            Some(FormMessage { text: message, severity }) => text(message)
                .style(theme::Text::Color(severity_color(*severity)))
                .into(),
            None => text("").into(),
        }
    }

    fn tab_button(&self, tab: Tab, label: &'static str) -> Element<Message> {
        let style = if self.view.panel_visible(tab) {
            theme::Button::Primary
        } else {
            theme::Button::Custom(Box::new(FlatButtonStyleSheet))
        };

        button(text(label))
            .style(style)
            .on_press(Message::Dispatch(UiEvent::SwitchTab(tab.name().to_string())))
            .into()
    }

    fn login_panel(&self) -> Element<Message> {
        let submit = Message::Dispatch(UiEvent::SubmitLogin {
            email: self.inputs.login_email.clone(),
            password: self.inputs.login_password.clone(),
        });

        column![
            text_input("Email", &self.inputs.login_email)
                .on_input(|value| Message::InputChanged(InputField::LoginEmail, value))
                .on_submit(submit.clone()),
            text_input("Password", &self.inputs.login_password)
                .secure(true)
                .on_input(|value| Message::InputChanged(InputField::LoginPassword, value))
                .on_submit(submit.clone()),
            button(text("Log in")).on_press(submit),
            button(text("Sign in with Google"))
                .style(theme::Button::Secondary)
                .on_press(Message::Dispatch(UiEvent::FederatedLogin)),
            self.form_message(Form::Login),
        ]
        .spacing(10)
        .into()
    }

    fn signup_panel(&self) -> Element<Message> {
        let submit = Message::Dispatch(UiEvent::SubmitSignup {
            email: self.inputs.signup_email.clone(),
            password: self.inputs.signup_password.clone(),
        });

        column![
            text_input("Email", &self.inputs.signup_email)
                .on_input(|value| Message::InputChanged(InputField::SignupEmail, value))
                .on_submit(submit.clone()),
            text_input("Password (6+ characters)", &self.inputs.signup_password)
                .secure(true)
                .on_input(|value| Message::InputChanged(InputField::SignupPassword, value))
                .on_submit(submit.clone()),
            button(text("Create account")).on_press(submit),
            self.form_message(Form::Signup),
        ]
        .spacing(10)
        .into()
    }

    fn index_page(&self) -> Element<Message> {
        if !self.view.auth_card_visible {
            return column![
                text(format!("Signed in as {}", self.view.user_email)),
                button(text("Go to dashboard"))
                    .style(theme::Button::Positive)
                    .on_press(Message::Dispatch(UiEvent::OpenDashboard)),
            ]
            .spacing(20)
            .into();
        }

        let panel = if self.view.panel_visible(Tab::Signup) {
            self.signup_panel()
        } else {
            self.login_panel()
        };

        column![
            row![
                self.tab_button(Tab::Login, "Login"),
                self.tab_button(Tab::Signup, "Sign up"),
            ].spacing(10),
            panel,
        ]
        .spacing(20)
        .into()
    }

    fn device_card(&self, device: Device) -> Element<Message> {
        let state = self.view.device_state(device);
        let command = |desired: DesiredState| Message::Dispatch(UiEvent::SetDevice {
            device: device.id().to_string(),
            desired,
        });

        row![
            column![
                text(device.display_name()).size(18),
                text(state.indicator_text()).style(theme::Text::Color(state_color(state))),
            ].spacing(4),
            Space::with_width(Length::Fill),
            button(text("Turn On"))
                .style(theme::Button::Positive)
                .on_press(command(DesiredState::On)),
            button(text("Turn Off"))
                .style(theme::Button::Destructive)
                .on_press(command(DesiredState::Off)),
        ]
        .align_items(Alignment::Center)
        .spacing(10)
        .into()
    }

    fn dashboard_page(&self) -> Element<Message> {
        let mut page = Column::with_children(
            DEVICES
                .into_iter()
                .map(|device| self.device_card(device))
        )
        .spacing(20);

        if self.view.address_input_visible {
            let save = Message::Dispatch(UiEvent::SetDeviceAddress(self.inputs.device_address.clone()));
            page = page.push(
                row![
                    text_input("Device IP address", &self.inputs.device_address)
                        .on_input(|value| Message::InputChanged(InputField::DeviceAddress, value))
                        .on_submit(save.clone()),
                    button(text("Save")).on_press(save),
                ].spacing(10)
            );
        }

        page
            .push(
                button(text("Refresh status"))
                    .style(theme::Button::Secondary)
                    .on_press(Message::Dispatch(UiEvent::RefreshStatus))
            )
            .into()
    }

    fn status_line(&self) -> Element<Message> {
        match &self.view.status_message {
            Some(message) => text(&message.text)
                .style(theme::Text::Color(severity_color(message.severity)))
                .into(),
            None => text("").into(),
        }
    }
}

impl Application for PanelApplication {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (PanelApplication, Command<Self::Message>) {
        let (ui_sender, ui_receiver) = unbounded();

        let app = PanelApplication {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            transport_override: flags.transport_override,
            client: flags.client,
            ui_sender,
            ui_receiver: Arc::new(Mutex::new(Some(ui_receiver))),
            controller: None,
            view: PanelView::default(),
            inputs: Inputs::default(),
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("CASH Panel ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }
                return self.start_controller(config);
            },
            Message::ControllerStarted(()) => {
                info!("Panel controller started");
            },
            Message::Ui(update) => {
                self.view.apply(update);
            },
            Message::InputChanged(field, value) => {
                self.inputs.set(field, value);
            },
            Message::Dispatch(event) => {
                return self.dispatch(event);
            },
            Message::DispatchComplete(()) => {},
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },
            Message::EventOccurred(_) => {},
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen().map(Message::EventOccurred),
            ui_update_subscription(self.ui_receiver.clone()).map(Message::Ui),
        ])
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let page = match self.view.page {
            Page::Index => self.index_page(),
            Page::Dashboard => self.dashboard_page(),
        };

        container(
            column![
                self.header(),
                horizontal_rule(10),
                column![page]
                    .width(Length::Fill)
                    .height(Length::Fill),
                self.status_line(),
            ]
            .spacing(20),
        )
        .width(Length::Fill)
        .padding(20)
        .into()
    }
}

pub fn run_application(options: RunOptions) -> Result<(), AppRunError> {
    let config_io = ConfigIO::new_sync(options.config_path)?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags {
        config_io,
        transport_override: options.transport,
        client: http_client()?,
    };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("cash-panel".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(560.0, 640.0);

    // this function will call process::exit() unless there was a startup error
    PanelApplication::run(settings)?;
    Ok(())
}
