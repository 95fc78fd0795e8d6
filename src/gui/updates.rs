use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use futures::channel::mpsc::UnboundedReceiver;
use futures::{future, SinkExt, StreamExt};
use iced::subscription::{self, Subscription};
use log::warn;

use crate::panel::binding::UiUpdate;

pub type SharedReceiver = Arc<Mutex<Option<UnboundedReceiver<UiUpdate>>>>;

/// Feeds the updates the controller sends through a `ChannelBinding` into the iced update loop.
pub fn ui_update_subscription(receiver: SharedReceiver) -> Subscription<UiUpdate> {
    struct UiUpdates;

    subscription::channel(
        std::any::TypeId::of::<UiUpdates>(),
        64,
        move |mut output| async move {
            // the receiver can only be taken once, iced keeps this future alive for as long as the
            // subscription is returned from `subscription()`
            let receiver = receiver.lock().ok().and_then(|mut receiver| receiver.take());

            if let Some(mut receiver) = receiver {
                while let Some(update) = receiver.next().await {
                    if let Err(err) = output.send(update).await {
                        warn!("Failed to forward UI update: {:?}", err);
                        break;
                    }
                }
            }

            warn!("UI update channel closed");
            future::pending::<Infallible>().await
        },
    )
}
