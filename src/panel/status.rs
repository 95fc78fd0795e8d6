use std::sync::{Arc, Mutex};
use std::time::Duration;
use log::debug;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::panel::binding::{UiBinding, UiUpdate};
use crate::panel::types::{Severity, StatusMessage};

/// How long a status message stays on screen.
pub const STATUS_MESSAGE_DURATION: Duration = Duration::from_secs(3);

#[derive(Default)]
struct PendingHide {
    // bumped for every message so that a late hide task can tell it is stale
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Shows one status message at a time and hides it after a while. A new message replaces the
/// old one and restarts the timer.
pub struct StatusNotifier {
    ui: Arc<dyn UiBinding>,
    display_for: Duration,
    pending: Arc<Mutex<PendingHide>>,
}

impl StatusNotifier {
    pub fn new(ui: Arc<dyn UiBinding>, display_for: Duration) -> Self {
        StatusNotifier {
            ui,
            display_for,
            pending: Arc::new(Mutex::new(PendingHide::default())),
        }
    }

    pub fn show(&self, text: impl Into<String>, severity: Severity) {
        let mut pending = self.pending.lock().expect("Failed to lock PendingHide");
        pending.generation += 1;
        if let Some(task) = pending.task.take() {
            task.abort();
        }

        let text = text.into();
        debug!("Status message ({}): {}", severity, text);
        self.ui.apply(UiUpdate::StatusMessage(Some(StatusMessage::new(text, severity))));

        let generation = pending.generation;
        let ui = self.ui.clone();
        let shared = self.pending.clone();
        let display_for = self.display_for;

        pending.task = Some(tokio::spawn(async move {
            sleep(display_for).await;

            let pending = shared.lock().expect("Failed to lock PendingHide");
            if pending.generation == generation {
                ui.apply(UiUpdate::StatusMessage(None));
            }
        }));
    }

    pub fn clear(&self) {
        let mut pending = self.pending.lock().expect("Failed to lock PendingHide");
        pending.generation += 1;
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        self.ui.apply(UiUpdate::StatusMessage(None));
    }
}

impl Drop for StatusNotifier {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(task) = pending.task.take() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::view::SharedView;

    fn notifier() -> (SharedView, StatusNotifier) {
        let view = SharedView::default();
        let notifier = StatusNotifier::new(Arc::new(view.clone()), STATUS_MESSAGE_DURATION);
        (view, notifier)
    }

    fn visible_text(view: &SharedView) -> Option<String> {
        view.snapshot().status_message.map(|message| message.text)
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_hides_after_window() {
        let (view, notifier) = notifier();
        notifier.show("Status updated", Severity::Success);
        assert_eq!(visible_text(&view).as_deref(), Some("Status updated"));

        sleep(Duration::from_millis(2900)).await;
        assert_eq!(visible_text(&view).as_deref(), Some("Status updated"));

        sleep(Duration::from_millis(200)).await;
        assert_eq!(visible_text(&view), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_message_resets_timer() {
        let (view, notifier) = notifier();
        notifier.show("first", Severity::Success);
        sleep(Duration::from_secs(2)).await;

        notifier.show("second", Severity::Error);
        let message = view.snapshot().status_message.unwrap();
        assert_eq!(message.text, "second");
        assert_eq!(message.severity, Severity::Error);

        // the first message's hide would have fired here
        sleep(Duration::from_secs(2)).await;
        assert_eq!(visible_text(&view).as_deref(), Some("second"));

        sleep(Duration::from_millis(1100)).await;
        assert_eq!(visible_text(&view), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let (view, notifier) = notifier();
        notifier.show("first", Severity::Info);
        notifier.clear();
        assert_eq!(visible_text(&view), None);

        notifier.show("second", Severity::Info);
        sleep(Duration::from_secs(4)).await;
        assert_eq!(visible_text(&view), None);
    }
}
