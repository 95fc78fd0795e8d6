use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::constants::{HEATING_PAD_PIN, STORE_VALUE_OFF, STORE_VALUE_ON, TEMPERATURE_SENSOR_PIN};
use crate::error::DeviceError;

pub const DEVICES: [Device; 2] = [Device::HeatingPad, Device::TemperatureSensor];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    HeatingPad,
    TemperatureSensor,
}

impl Device {
    pub fn id(&self) -> &'static str {
        match self {
            Device::HeatingPad => "heating_pad",
            Device::TemperatureSensor => "temperature_sensor",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Device::HeatingPad => "Heating pad",
            Device::TemperatureSensor => "Temperature sensor",
        }
    }

    /// Key of the integer flag in the remote store.
    pub fn store_path(&self) -> String {
        format!("{}/state", self.id())
    }

    /// GPIO number the device's web server uses in its toggle endpoints.
    pub fn pin(&self) -> u8 {
        match self {
            Device::HeatingPad => HEATING_PAD_PIN,
            Device::TemperatureSensor => TEMPERATURE_SENSOR_PIN,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Device {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DEVICES
            .into_iter()
            .find(|device| device.id() == s)
            .ok_or_else(|| DeviceError::UnknownDevice(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    On,
    Off,
}

impl DesiredState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::On => "on",
            DesiredState::Off => "off",
        }
    }

    pub fn store_value(&self) -> i64 {
        match self {
            DesiredState::On => STORE_VALUE_ON,
            DesiredState::Off => STORE_VALUE_OFF,
        }
    }
}

impl From<DesiredState> for DeviceState {
    fn from(desired: DesiredState) -> Self {
        match desired {
            DesiredState::On => DeviceState::On,
            DesiredState::Off => DeviceState::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    On,
    Off,
    #[default]
    Unknown,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::On => "on",
            DeviceState::Off => "off",
            DeviceState::Unknown => "unknown",
        }
    }

    /// Parses a state reported by the device; anything unrecognised is `Unknown`.
    pub fn from_reported(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "on" => DeviceState::On,
            "off" => DeviceState::Off,
            _ => DeviceState::Unknown,
        }
    }

    /// Decodes a remote store value: absent is unknown, `1` is on, anything else is off.
    pub fn from_store_value(value: &Value) -> Self {
        match value {
            Value::Null => DeviceState::Unknown,
            Value::Number(number) if number.as_f64() == Some(STORE_VALUE_ON as f64) => DeviceState::On,
            _ => DeviceState::Off,
        }
    }

    pub fn indicator_text(&self) -> String {
        format!("Status: {}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
