use std::collections::HashMap;
use futures::future::BoxFuture;
use log::{debug, info};
use serde::Deserialize;

use crate::config::types::TransportKind;
use crate::device::adapter::{DeviceAddress, DeviceStates, DeviceSyncAdapter, StateUpdates};
use crate::device::constants::{STATUS_ENDPOINT, STATUS_SUCCESS};
use crate::device::types::{DesiredState, Device, DeviceState, DEVICES};
use crate::error::DeviceError;

/// Body returned by the toggle endpoints, e.g.
/// `{"status":"success","device":"heating_pad","state":"on"}` or
/// `{"status":"error","message":"Endpoint not found"}`.
#[derive(Debug, Deserialize)]
pub struct ToggleResponse {
    pub status: String,
    pub device: Option<String>,
    pub state: Option<String>,
    pub message: Option<String>,
}

/// Talks to the web server running on the device itself.
pub struct DirectHttpAdapter {
    client: reqwest::Client,
    address: DeviceAddress,
}

impl DirectHttpAdapter {
    pub fn new(client: reqwest::Client, address: DeviceAddress) -> Self {
        DirectHttpAdapter { client, address }
    }

    fn url(&self, path: &str) -> Result<String, DeviceError> {
        let address = self.address.get().ok_or(DeviceError::MissingAddress)?;
        Ok(format!("http://{}/{}", address, path))
    }

    // the firmware answers unknown paths with a 404 and a JSON body, so the body is read
    // regardless of the HTTP status
    async fn get_body(&self, path: &str) -> Result<String, DeviceError> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        debug!("{} responded with {}", url, response.status());
        Ok(response.text().await?)
    }

    async fn toggle(&self, device: Device, desired: DesiredState) -> Result<DeviceState, DeviceError> {
        let body = self.get_body(&format!("{}/{}", device.pin(), desired.as_str())).await?;
        let state = parse_toggle_response(&body)?;
        info!("{} reported {}", device, state);
        Ok(state)
    }

    async fn status(&self) -> Result<DeviceStates, DeviceError> {
        let body = self.get_body(STATUS_ENDPOINT).await?;
        parse_status_response(&body)
    }
}

pub fn parse_toggle_response(body: &str) -> Result<DeviceState, DeviceError> {
    let response: ToggleResponse = serde_json::from_str(body)
        .map_err(|err| DeviceError::Protocol(format!("{} in {:?}", err, body.trim())))?;

    if response.status != STATUS_SUCCESS {
        return Err(DeviceError::Rejected {
            status: response.status,
            message: response.message.unwrap_or_else(|| "no details".to_string()),
        });
    }

    match response.state {
        Some(state) => Ok(DeviceState::from_reported(&state)),
        None => Err(DeviceError::Protocol("response has no state".to_string())),
    }
}

/// `{"heating_pad":"on","temperature_sensor":"off"}`; devices that are not listed are unknown.
pub fn parse_status_response(body: &str) -> Result<DeviceStates, DeviceError> {
    let reported: HashMap<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|err| DeviceError::Protocol(format!("{} in {:?}", err, body.trim())))?;

    if let Some(status) = reported.get("status").and_then(|status| status.as_str()) {
        if status != STATUS_SUCCESS {
            let message = reported.get("message").and_then(|message| message.as_str()).unwrap_or("no details");
            return Err(DeviceError::Rejected { status: status.to_string(), message: message.to_string() });
        }
    }

    Ok(DEVICES
        .into_iter()
        .map(|device| {
            let state = reported
                .get(device.id())
                .and_then(|state| state.as_str())
                .map(DeviceState::from_reported)
                .unwrap_or_default();
            (device, state)
        })
        .collect())
}

impl DeviceSyncAdapter for DirectHttpAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::DirectHttp
    }

    fn set_device_state(&self, device: Device, desired: DesiredState) -> BoxFuture<'_, Result<DeviceState, DeviceError>> {
        Box::pin(self.toggle(device, desired))
    }

    fn fetch_all_states(&self) -> BoxFuture<'_, Result<DeviceStates, DeviceError>> {
        Box::pin(self.status())
    }

    fn watch_states(&self) -> Option<StateUpdates> {
        // the device cannot push changes
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle_response() {
        let state = parse_toggle_response(r#"{"status":"success","device":"heating_pad","state":"on"}"#).unwrap();
        assert_eq!(state, DeviceState::On);

        let err = parse_toggle_response(r#"{"status":"error","message":"Endpoint not found"}"#).unwrap_err();
        assert!(matches!(err, DeviceError::Rejected { status, message } if status == "error" && message == "Endpoint not found"));

        assert!(matches!(parse_toggle_response("<html></html>"), Err(DeviceError::Protocol(_))));
        assert!(matches!(parse_toggle_response(r#"{"status":"success"}"#), Err(DeviceError::Protocol(_))));
    }

    #[test]
    fn test_parse_status_response() {
        let states = parse_status_response("{\"heating_pad\":\"on\",\"temperature_sensor\":\"off\"}\r\n").unwrap();
        assert_eq!(states[&Device::HeatingPad], DeviceState::On);
        assert_eq!(states[&Device::TemperatureSensor], DeviceState::Off);

        let states = parse_status_response(r#"{"heating_pad":"off"}"#).unwrap();
        assert_eq!(states[&Device::TemperatureSensor], DeviceState::Unknown);

        assert!(matches!(
            parse_status_response(r#"{"status":"error","message":"Endpoint not found"}"#),
            Err(DeviceError::Rejected { .. }),
        ));
        assert!(matches!(parse_status_response("[]"), Err(DeviceError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_missing_address() {
        let adapter = DirectHttpAdapter::new(reqwest::Client::new(), DeviceAddress::default());
        let err = adapter.set_device_state(Device::HeatingPad, DesiredState::On).await.unwrap_err();
        assert!(matches!(err, DeviceError::MissingAddress));
    }
}
