//! Smart-home device controller contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Desired device state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    On,
    Off,
    /// Brightness level in percent (1-100)
    Dim(u8),
}

impl DeviceState {
    pub fn as_event_name(&self) -> &'static str {
        match self {
            DeviceState::On => "device_on",
            DeviceState::Off => "device_off",
            DeviceState::Dim(_) => "device_dim",
        }
    }
}

/// A discovered device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable device identifier (e.g. "living-room-light")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Room the device is placed in, lowercased
    pub room: String,
}

/// Device discovery and control.
///
/// The discovery/control wire protocol lives behind this trait; the
/// handler only sees descriptors and state changes.
#[async_trait]
pub trait DeviceController: Send + Sync {
    /// Enumerate known devices
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Apply the desired state to a device
    async fn set_state(&self, device_id: &str, state: DeviceState) -> Result<()>;
}
