use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::auth::provider::IdentityProvider;
use crate::config::types::{Config, TransportKind};
use crate::device::direct_http::DirectHttpAdapter;
use crate::device::remote_store::RemoteStoreAdapter;
use crate::device::types::{DesiredState, Device, DeviceState};
use crate::error::DeviceError;

pub type DeviceStates = BTreeMap<Device, DeviceState>;

pub type StateUpdates = BoxStream<'static, Result<(Device, DeviceState), DeviceError>>;

/// Moves device states between the panel and the heating pad controller.
pub trait DeviceSyncAdapter: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Requests `desired` and returns the state the transport confirmed.
    fn set_device_state(&self, device: Device, desired: DesiredState) -> BoxFuture<'_, Result<DeviceState, DeviceError>>;

    fn fetch_all_states(&self) -> BoxFuture<'_, Result<DeviceStates, DeviceError>>;

    /// Changes made elsewhere (including by the device itself), if the transport can push them.
    fn watch_states(&self) -> Option<StateUpdates>;
}

/// The manually entered network address of the device, shared between the panel and the
/// direct HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct DeviceAddress {
    inner: Arc<RwLock<Option<String>>>,
}

impl DeviceAddress {
    pub fn new(address: Option<String>) -> Self {
        let shared = DeviceAddress::default();
        shared.set(address);
        shared
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().ok().and_then(|address| address.clone())
    }

    pub fn set(&self, address: Option<String>) {
        let address = address
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty());

        if let Ok(mut inner) = self.inner.write() {
            *inner = address;
        }
    }
}

/// Builds the transport selected by `kind`.
pub fn build_adapter(
    kind: TransportKind,
    config: &Config,
    client: reqwest::Client,
    identity: Arc<dyn IdentityProvider>,
    address: DeviceAddress,
) -> Arc<dyn DeviceSyncAdapter> {
    match kind {
        TransportKind::RemoteStore => Arc::new(RemoteStoreAdapter::new(
            client,
            &config.remote_store.database_url,
            identity,
        )),
        TransportKind::DirectHttp => Arc::new(DirectHttpAdapter::new(client, address)),
    }
}
