//! Reference collaborators for the external contracts
//!
//! Working implementations for the simple I/O seams: a config-driven
//! device table and thin HTTP fetchers. Real protocol clients (smart-plug
//! discovery, a production news API) slot in behind the same traits.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use pocket_core::{
    DeviceController, DeviceDescriptor, DeviceState, Error, Result as CoreResult, SearchBackend,
    SearchHit, BriefingSource, Story,
};

/// Device controller over a fixed, configured device table.
///
/// State changes are tracked in memory and logged; the actual plug
/// protocol is out of scope and replaced by this reference behavior.
pub struct StaticDeviceController {
    devices: Vec<DeviceDescriptor>,
    states: RwLock<HashMap<String, DeviceState>>,
}

impl StaticDeviceController {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Last state applied to a device, if any
    pub fn state_of(&self, device_id: &str) -> Option<DeviceState> {
        self.states.read().get(device_id).copied()
    }
}

#[async_trait]
impl DeviceController for StaticDeviceController {
    async fn discover(&self) -> CoreResult<Vec<DeviceDescriptor>> {
        Ok(self.devices.clone())
    }

    async fn set_state(&self, device_id: &str, state: DeviceState) -> CoreResult<()> {
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(Error::Device(format!("unknown device '{}'", device_id)));
        }

        self.states.write().insert(device_id.to_string(), state);
        tracing::info!(device = device_id, ?state, "Device state applied");
        Ok(())
    }
}

/// JSON briefing fetcher.
///
/// Expects `GET {endpoint}?category={category}` to return
/// `{"stories": [{"title", "summary", "source"}]}`.
pub struct HttpBriefingSource {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct BriefingResponse {
    stories: Vec<Story>,
}

impl HttpBriefingSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl BriefingSource for HttpBriefingSource {
    async fn top_stories(&self, category: &str) -> CoreResult<Vec<Story>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("category", category)])
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "briefing feed returned {}",
                response.status()
            )));
        }

        let parsed: BriefingResponse = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("bad briefing payload: {}", e)))?;

        Ok(parsed.stories)
    }
}

/// JSON search fetcher.
///
/// Expects `GET {endpoint}?q={query}` to return
/// `{"results": [{"title", "url", "snippet"}]}`.
pub struct HttpSearchBackend {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

impl HttpSearchBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> CoreResult<Vec<SearchHit>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "search backend returned {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("bad search payload: {}", e)))?;

        Ok(parsed.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> DeviceDescriptor {
        DeviceDescriptor {
            id: "desk-lamp".to_string(),
            name: "Desk Lamp".to_string(),
            room: "office".to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_controller_tracks_state() {
        let controller = StaticDeviceController::new(vec![lamp()]);

        assert!(controller.state_of("desk-lamp").is_none());
        controller
            .set_state("desk-lamp", DeviceState::Dim(30))
            .await
            .unwrap();
        assert_eq!(controller.state_of("desk-lamp"), Some(DeviceState::Dim(30)));
    }

    #[tokio::test]
    async fn test_static_controller_rejects_unknown_device() {
        let controller = StaticDeviceController::new(vec![lamp()]);
        let err = controller
            .set_state("bedroom-light", DeviceState::On)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Device(_)));
    }

    #[tokio::test]
    async fn test_discover_returns_configured_devices() {
        let controller = StaticDeviceController::new(vec![lamp()]);
        let devices = controller.discover().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "desk-lamp");
    }
}
