use futures::channel::mpsc::UnboundedSender;
use log::debug;

use crate::device::types::{Device, DeviceState};
use crate::panel::types::{Form, FormMessage, Page, StatusMessage, Tab};

/// A change the controller makes to what is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// `Some(email)` shows the signed-in sections, `None` the sign-in form.
    Session(Option<String>),
    ActiveTab(Tab),
    FormMessage(Form, Option<FormMessage>),
    DeviceStatus(Device, DeviceState),
    StatusMessage(Option<StatusMessage>),
    Navigate(Page),
    AddressInputVisible(bool),
}

/// The seam between the controller and whatever renders the panel.
pub trait UiBinding: Send + Sync {
    fn apply(&self, update: UiUpdate);
}

/// Forwards updates to the GUI event loop.
pub struct ChannelBinding {
    sender: UnboundedSender<UiUpdate>,
}

impl ChannelBinding {
    pub fn new(sender: UnboundedSender<UiUpdate>) -> Self {
        ChannelBinding { sender }
    }
}

impl UiBinding for ChannelBinding {
    fn apply(&self, update: UiUpdate) {
        if let Err(err) = self.sender.unbounded_send(update) {
            // the window is gone
            debug!("Dropping UI update: {:?}", err.into_inner());
        }
    }
}
