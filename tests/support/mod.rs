//! Test doubles for the identity provider and the device transport.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::future::BoxFuture;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;
use wiremock::{Request, Respond, ResponseTemplate};

use cash_panel::auth::provider::IdentityProvider;
use cash_panel::auth::types::{Credentials, Session};
use cash_panel::config::types::TransportKind;
use cash_panel::device::adapter::{DeviceAddress, DeviceStates, DeviceSyncAdapter, StateUpdates};
use cash_panel::device::types::{DesiredState, Device, DeviceState, DEVICES};
use cash_panel::error::{AuthError, DeviceError};
use cash_panel::panel::controller::PanelController;
use cash_panel::panel::view::{PanelView, SharedView};

pub fn session(email: &str) -> Session {
    Session {
        uid: format!("uid-{}", email),
        email: Some(email.to_string()),
        id_token: "id-token".to_string(),
        refresh_token: "refresh-token".to_string(),
        expires_at: SystemTime::now() + Duration::from_secs(3600),
    }
}

pub struct FakeIdentity {
    sessions: watch::Sender<Option<Session>>,
    failure: Option<(&'static str, &'static str)>,
    pub calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(None);
        FakeIdentity { sessions, failure: None, calls: AtomicUsize::new(0) }
    }

    /// Every sign-in attempt fails with this provider code and message.
    pub fn failing(code: &'static str, message: &'static str) -> Self {
        FakeIdentity { failure: Some((code, message)), ..FakeIdentity::new() }
    }

    pub fn signed_in(email: &str) -> Self {
        let identity = FakeIdentity::new();
        identity.sessions.send_replace(Some(session(email)));
        identity
    }

    /// Ends the session as if it expired on the provider's side.
    pub fn expire(&self) {
        self.sessions.send_replace(None);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn attempt(&self, email: &str) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((code, message)) = self.failure {
            return Err(AuthError::provider(code, message));
        }
        let session = session(email);
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }
}

impl IdentityProvider for FakeIdentity {
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Session, AuthError>> {
        Box::pin(async move { self.attempt(&credentials.email) })
    }

    fn sign_up<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Session, AuthError>> {
        Box::pin(async move { self.attempt(&credentials.email) })
    }

    fn sign_in_federated(&self) -> BoxFuture<'_, Result<Session, AuthError>> {
        Box::pin(async move { self.attempt("cat@gmail.com") })
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(async move {
            self.sessions.send_replace(None);
            Ok(())
        })
    }

    fn id_token(&self) -> BoxFuture<'_, Result<Option<String>, AuthError>> {
        Box::pin(async move {
            Ok(self.sessions.borrow().as_ref().map(|session| session.id_token.clone()))
        })
    }

    fn sessions(&self) -> watch::Receiver<Option<Session>> {
        self.sessions.subscribe()
    }
}

/// An in-memory transport. Pushed updates are fed through the sender returned by
/// [`FakeAdapter::push_channel`].
pub struct FakeAdapter {
    kind: TransportKind,
    states: Mutex<DeviceStates>,
    updates: Mutex<Option<UnboundedReceiver<Result<(Device, DeviceState), DeviceError>>>>,
    pub calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn new(kind: TransportKind) -> Self {
        FakeAdapter {
            kind,
            states: Mutex::new(DEVICES.into_iter().map(|device| (device, DeviceState::Off)).collect()),
            updates: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push_channel(&self) -> UnboundedSender<Result<(Device, DeviceState), DeviceError>> {
        let (sender, receiver) = unbounded();
        *self.updates.lock().unwrap() = Some(receiver);
        sender
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DeviceSyncAdapter for FakeAdapter {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn set_device_state(&self, device: Device, desired: DesiredState) -> BoxFuture<'_, Result<DeviceState, DeviceError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.states.lock().unwrap().insert(device, desired.into());
            Ok(desired.into())
        })
    }

    fn fetch_all_states(&self) -> BoxFuture<'_, Result<DeviceStates, DeviceError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.states.lock().unwrap().clone())
        })
    }

    fn watch_states(&self) -> Option<StateUpdates> {
        self.updates.lock().unwrap().take().map(|receiver| receiver.boxed())
    }
}

pub struct Harness {
    pub controller: Arc<PanelController>,
    pub view: SharedView,
}

impl Harness {
    pub fn new(identity: Arc<dyn IdentityProvider>, adapter: Option<Arc<dyn DeviceSyncAdapter>>, address: DeviceAddress) -> Self {
        let view = SharedView::default();
        let controller = Arc::new(PanelController::new(identity, adapter, Arc::new(view.clone()), address));
        Harness { controller, view }
    }

    pub fn snapshot(&self) -> PanelView {
        self.view.snapshot()
    }

    pub fn status_text(&self) -> Option<String> {
        self.snapshot().status_message.map(|message| message.text)
    }

    /// Polls the view until `predicate` holds or a second has passed.
    pub async fn wait_for(&self, predicate: impl Fn(&PanelView) -> bool) -> bool {
        self.wait_for_within(Duration::from_secs(1), predicate).await
    }

    pub async fn wait_for_within(&self, timeout: Duration, predicate: impl Fn(&PanelView) -> bool) -> bool {
        let poll = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while waited < timeout {
            if predicate(&self.snapshot()) {
                return true;
            }
            tokio::time::sleep(poll).await;
            waited += poll;
        }
        predicate(&self.snapshot())
    }
}

/// A realtime database kept in memory. `PUT` stores the JSON body under the request path,
/// `GET` returns it, and event-stream requests get a single `put` event before the stream
/// closes.
#[derive(Clone, Default)]
pub struct FakeStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl FakeStore {
    pub fn value(&self, path: &str) -> Value {
        self.values.lock().unwrap().get(path).cloned().unwrap_or(Value::Null)
    }
}

impl Respond for FakeStore {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();

        if request.method.as_str() == "PUT" {
            let value: Value = match serde_json::from_slice(&request.body) {
                Ok(value) => value,
                Err(_) => return ResponseTemplate::new(400).set_body_string(r#"{"error" : "Invalid data"}"#),
            };
            self.values.lock().unwrap().insert(path, value.clone());
            return ResponseTemplate::new(200).set_body_json(value);
        }

        let value = self.value(&path);
        let streaming = request.headers
            .get("accept")
            .is_some_and(|accept| accept.as_bytes() == b"text/event-stream");

        if streaming {
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(format!("event: put\ndata: {}\n\n", serde_json::json!({ "path": "/", "data": value })))
        } else {
            ResponseTemplate::new(200).set_body_json(value)
        }
    }
}
