//! WebSocket message codec for the bridge protocol.
//!
//! All frames are JSON over WebSocket text frames. This module provides
//! encoding of outbound samples and tolerant decoding of inbound commands.

use magbridge_core::{CommandAction, Sample};
use thiserror::Error;

use crate::messages::{BroadcastMessage, CommandMessage, DeviceMessage, SensorDataMessage};

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame is not valid JSON for the expected message.
    #[error("Invalid JSON message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a sample as a client-role `sensor_data` frame.
pub fn encode_sensor_data(sample: &Sample) -> Result<String, CodecError> {
    serde_json::to_string(&SensorDataMessage::from(sample)).map_err(CodecError::from)
}

/// Encode a sample as a server-role broadcast frame.
pub fn encode_broadcast(sample: &Sample) -> Result<String, CodecError> {
    serde_json::to_string(&BroadcastMessage::from(sample)).map_err(CodecError::from)
}

/// Decode a command frame received over WebSocket.
pub fn decode_command(text: &str) -> Result<CommandMessage, CodecError> {
    serde_json::from_str(text).map_err(CodecError::from)
}

/// Decode a frame emitted by a device in either role.
pub fn decode_device_message(text: &str) -> Result<DeviceMessage, CodecError> {
    serde_json::from_str(text).map_err(CodecError::from)
}

/// Map an inbound text frame to the action it requests.
///
/// Frames that are not JSON, are not an object with a string `command`, or
/// name an unknown command all yield [`CommandAction::Noop`].
pub fn dispatch_frame(text: &str) -> CommandAction {
    match decode_command(text) {
        Ok(msg) => msg.action(),
        Err(_) => CommandAction::Noop,
    }
}
