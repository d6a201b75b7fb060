//! Home-automation handler
//!
//! Parses device commands ("turn on the living room light", "dim the
//! kitchen lamp to 40") and drives the device controller. The result is
//! reported as a structured tool event, not speakable text.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use pocket_core::{
    ChunkStream, DeviceController, DeviceDescriptor, DeviceState, ExecutionRequest, Handler,
    StreamChunk,
};

use crate::backend_error_chunk;

static ON_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:turn|switch)\s+on\b|\bon\b").unwrap());
static OFF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:turn|switch)\s+off\b|\boff\b").unwrap());
static DIM_LEVEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdim\b.*?\b(\d{1,3})\b").unwrap());
static DIM_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdim\b").unwrap());

/// Parsed device command
#[derive(Debug, Clone, PartialEq)]
struct DeviceCommand {
    state: DeviceState,
}

/// Extract the desired state from the utterance. Off is checked before on
/// so "turn off" is not shadowed by the bare "on" inside it.
fn parse_command(text: &str) -> Option<DeviceCommand> {
    if DIM_PATTERN.is_match(text) {
        let level = DIM_LEVEL_PATTERN
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .unwrap_or(50)
            .clamp(1, 100);
        return Some(DeviceCommand {
            state: DeviceState::Dim(level),
        });
    }
    if OFF_PATTERN.is_match(text) {
        return Some(DeviceCommand {
            state: DeviceState::Off,
        });
    }
    if ON_PATTERN.is_match(text) {
        return Some(DeviceCommand {
            state: DeviceState::On,
        });
    }
    None
}

/// Pick the device whose room or name appears in the utterance; with a
/// single known device, an unqualified command targets it.
fn match_device<'a>(text: &str, devices: &'a [DeviceDescriptor]) -> Option<&'a DeviceDescriptor> {
    let lower = text.to_lowercase();

    devices
        .iter()
        .find(|d| lower.contains(&d.room) || lower.contains(&d.name.to_lowercase()))
        .or(if devices.len() == 1 {
            devices.first()
        } else {
            None
        })
}

/// Smart-home device handler
pub struct HomeAutomationHandler {
    devices: Arc<dyn DeviceController>,
}

impl HomeAutomationHandler {
    pub fn new(devices: Arc<dyn DeviceController>) -> Self {
        Self { devices }
    }
}

impl Handler for HomeAutomationHandler {
    fn name(&self) -> &'static str {
        "home"
    }

    fn run(&self, request: ExecutionRequest) -> ChunkStream {
        let controller = Arc::clone(&self.devices);
        let text = request.utterance.text.clone();
        let cancel = request.cancel;

        Box::pin(async_stream::stream! {
            let Some(command) = parse_command(&text) else {
                yield StreamChunk::text(
                    "I couldn't tell what to do with your devices. \
                     Try something like \"turn on the living room light\".",
                );
                yield StreamChunk::Done;
                return;
            };

            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            let devices = match controller.discover().await {
                Ok(devices) => devices,
                Err(err) => {
                    yield backend_error_chunk("home", err);
                    return;
                }
            };

            let Some(device) = match_device(&text, &devices) else {
                yield StreamChunk::text("I don't know a device matching that request.");
                yield StreamChunk::Done;
                return;
            };

            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            match controller.set_state(&device.id, command.state).await {
                Ok(()) => {
                    let mut payload = serde_json::json!({
                        "id": device.id,
                        "room": device.room,
                    });
                    if let DeviceState::Dim(level) = command.state {
                        payload["level"] = serde_json::json!(level);
                    }
                    yield StreamChunk::tool_event(command.state.as_event_name(), payload);
                    yield StreamChunk::Done;
                }
                Err(err) => {
                    yield backend_error_chunk("home", err);
                }
            }
        })
    }
}
