use std::sync::Arc;
use eventsource_stream::Eventsource;
use futures::future::{self, BoxFuture};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::provider::IdentityProvider;
use crate::config::types::TransportKind;
use crate::device::adapter::{DeviceStates, DeviceSyncAdapter, StateUpdates};
use crate::device::types::{DesiredState, Device, DeviceState, DEVICES};
use crate::error::DeviceError;

#[derive(Debug, Deserialize)]
struct PutEvent {
    path: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    error: String,
}

/// Interprets one server-sent event of a realtime database subscription on a single value.
///
/// Returns `Ok(None)` for events that do not change the value (keep-alives, patches of
/// child paths).
pub fn parse_store_event(event: &str, data: &str) -> Result<Option<DeviceState>, DeviceError> {
    match event {
        "put" => {
            let put: PutEvent = serde_json::from_str(data)
                .map_err(|err| DeviceError::Protocol(format!("{} in {:?}", err, data)))?;

            if put.path == "/" {
                Ok(Some(DeviceState::from_store_value(&put.data)))
            } else {
                Ok(None)
            }
        },
        "cancel" => Err(DeviceError::Subscription(format!("cancelled by the remote store: {}", data))),
        "auth_revoked" => Err(DeviceError::Subscription("authorization revoked".to_string())),
        other => {
            debug!("Ignoring remote store event {:?}", other);
            Ok(None)
        },
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DeviceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    let message = serde_json::from_str::<StoreErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or(body);

    Err(DeviceError::Rejected { status: status.as_u16().to_string(), message })
}

async fn authorize(identity: &dyn IdentityProvider, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, DeviceError> {
    Ok(match identity.id_token().await? {
        Some(token) => request.query(&[("auth", token)]),
        None => request,
    })
}

/// Writes integer flags to a realtime database that the device polls.
pub struct RemoteStoreAdapter {
    client: reqwest::Client,
    database_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl RemoteStoreAdapter {
    pub fn new(client: reqwest::Client, database_url: &str, identity: Arc<dyn IdentityProvider>) -> Self {
        RemoteStoreAdapter {
            client,
            database_url: database_url.trim().trim_end_matches('/').to_string(),
            identity,
        }
    }

    fn value_url(&self, device: Device) -> Result<String, DeviceError> {
        if self.database_url.is_empty() {
            return Err(DeviceError::NotConfigured);
        }
        Ok(format!("{}/{}.json", self.database_url, device.store_path()))
    }

    async fn write(&self, device: Device, desired: DesiredState) -> Result<DeviceState, DeviceError> {
        let request = self.client
            .put(self.value_url(device)?)
            .json(&desired.store_value());
        let request = authorize(self.identity.as_ref(), request).await?;

        check_status(request.send().await?).await?;
        info!("Wrote {} to {}", desired.store_value(), device.store_path());
        Ok(desired.into())
    }

    async fn read(&self, device: Device) -> Result<DeviceState, DeviceError> {
        let request = authorize(self.identity.as_ref(), self.client.get(self.value_url(device)?)).await?;
        let response = check_status(request.send().await?).await?;

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|err| DeviceError::Protocol(format!("{} in {:?}", err, body)))?;
        Ok(DeviceState::from_store_value(&value))
    }

    async fn read_all(&self) -> Result<DeviceStates, DeviceError> {
        let mut states = DeviceStates::new();
        for device in DEVICES {
            states.insert(device, self.read(device).await?);
        }
        Ok(states)
    }

    fn subscribe(&self, device: Device) -> StateUpdates {
        let client = self.client.clone();
        let identity = self.identity.clone();
        let url = self.value_url(device);

        let connect = async move {
            let url = url?;
            let request = client.get(&url).header(ACCEPT, "text/event-stream");
            let request = authorize(identity.as_ref(), request).await?;
            let response = check_status(request.send().await?).await?;
            info!("Subscribed to {}", device.store_path());

            let updates = response
                .bytes_stream()
                .eventsource()
                .map(move |event| match event {
                    Ok(event) => parse_store_event(&event.event, &event.data)
                        .map(|state| state.map(|state| (device, state))),
                    Err(err) => Err(DeviceError::Subscription(err.to_string())),
                })
                .filter_map(|update| future::ready(update.transpose()));

            Ok::<_, DeviceError>(updates)
        };

        // a closed subscription ends with an error so that the caller subscribes again, even
        // while the subscriptions of other devices stay open
        let closed = stream::once(future::ready(Err(DeviceError::Subscription(
            format!("{} subscription closed", device.store_path()),
        ))));

        stream::once(connect).try_flatten().chain(closed).boxed()
    }
}

impl DeviceSyncAdapter for RemoteStoreAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::RemoteStore
    }

    fn set_device_state(&self, device: Device, desired: DesiredState) -> BoxFuture<'_, Result<DeviceState, DeviceError>> {
        Box::pin(self.write(device, desired))
    }

    fn fetch_all_states(&self) -> BoxFuture<'_, Result<DeviceStates, DeviceError>> {
        Box::pin(self.read_all())
    }

    fn watch_states(&self) -> Option<StateUpdates> {
        let subscriptions = DEVICES.into_iter().map(|device| self.subscribe(device));
        Some(stream::select_all(subscriptions).boxed())
    }
}
