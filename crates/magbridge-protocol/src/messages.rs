//! Protocol message types for WebSocket communication.
//!
//! This module defines all message types exchanged over the bridge socket:
//! - Device → Peer: SensorData (client role), Broadcast (server role)
//! - Peer → Device: Command
//!
//! Messages are serialized as JSON over WebSocket text frames.

use serde::{Deserialize, Serialize};

use magbridge_core::{CommandAction, Heading, Sample};

// ============================================================================
// Sensor data (Device → Peer, client role)
// ============================================================================

/// Discriminator carried in the `type` field of client frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "sensor_data")]
    SensorData,
}

/// Sensor frame streamed by the device client.
///
/// # Example
/// ```json
/// {
///   "type": "sensor_data",
///   "field_strength": 42.3,
///   "current_direction": "Northeast",
///   "field_direction": [0.2, 0.9, 0.3]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDataMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,

    /// Field magnitude in µT.
    pub field_strength: f32,

    /// Compass label of the horizontal field.
    pub current_direction: Heading,

    /// Unit vector along the field.
    pub field_direction: [f32; 3],
}

impl From<&Sample> for SensorDataMessage {
    fn from(sample: &Sample) -> Self {
        Self {
            message_type: MessageType::SensorData,
            field_strength: sample.field_strength,
            current_direction: sample.heading,
            field_direction: sample.direction_vector,
        }
    }
}

// ============================================================================
// Broadcast (Server → Clients, server role)
// ============================================================================

/// Frame broadcast by the server role. Same logical fields, no `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub field_strength: f32,
    pub current_direction: Heading,
    pub field_direction: [f32; 3],
}

impl From<&Sample> for BroadcastMessage {
    fn from(sample: &Sample) -> Self {
        Self {
            field_strength: sample.field_strength,
            current_direction: sample.heading,
            field_direction: sample.direction_vector,
        }
    }
}

// ============================================================================
// Command (Peer → Device)
// ============================================================================

/// Inbound command frame: `{ "command": "LED_ON" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl CommandMessage {
    /// Action requested by this frame. Unknown or missing tokens are no-ops.
    pub fn action(&self) -> CommandAction {
        magbridge_core::dispatch_token(self.command.as_deref())
    }
}

// ============================================================================
// Unified Message Enum
// ============================================================================

/// Any frame a device may emit.
///
/// Uses untagged deserialization; frames with `"type": "sensor_data"` match
/// `SensorData`, everything else with the three data fields is `Broadcast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceMessage {
    SensorData(SensorDataMessage),
    Broadcast(BroadcastMessage),
}

impl DeviceMessage {
    pub fn field_strength(&self) -> f32 {
        match self {
            DeviceMessage::SensorData(msg) => msg.field_strength,
            DeviceMessage::Broadcast(msg) => msg.field_strength,
        }
    }

    pub fn current_direction(&self) -> Heading {
        match self {
            DeviceMessage::SensorData(msg) => msg.current_direction,
            DeviceMessage::Broadcast(msg) => msg.current_direction,
        }
    }

    pub fn field_direction(&self) -> [f32; 3] {
        match self {
            DeviceMessage::SensorData(msg) => msg.field_direction,
            DeviceMessage::Broadcast(msg) => msg.field_direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magbridge_core::{HeadingReference, MagReading};

    #[test]
    fn test_sensor_data_has_exact_keys() {
        let sample = Sample::from_reading(MagReading::new(0.0, 30.0, -40.0), HeadingReference::Compass);
        let value = serde_json::to_value(SensorDataMessage::from(&sample)).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["current_direction", "field_direction", "field_strength", "type"]
        );
        assert_eq!(value["type"], "sensor_data");
        assert_eq!(value["current_direction"], "North");
        assert_eq!(value["field_strength"], 50.0);
        assert_eq!(value["field_direction"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_broadcast_omits_type() {
        let sample = Sample::from_reading(MagReading::new(10.0, 0.0, 0.0), HeadingReference::Compass);
        let value = serde_json::to_value(BroadcastMessage::from(&sample)).unwrap();
        assert!(value.get("type").is_none());
        assert_eq!(value["current_direction"], "East");
    }

    #[test]
    fn test_command_deserialization() {
        let msg: CommandMessage = serde_json::from_str(r#"{"command":"LED_ON"}"#).unwrap();
        assert_eq!(msg.action(), CommandAction::SetIndicator(true));

        let msg: CommandMessage = serde_json::from_str(r#"{"other":1}"#).unwrap();
        assert_eq!(msg.command, None);
        assert_eq!(msg.action(), CommandAction::Noop);
    }

    #[test]
    fn test_device_message_untagged() {
        let msg: DeviceMessage = serde_json::from_str(
            r#"{"type":"sensor_data","field_strength":1.5,"current_direction":"West","field_direction":[-1.0,0.0,0.0]}"#,
        )
        .unwrap();
        assert!(matches!(msg, DeviceMessage::SensorData(_)));
        assert_eq!(msg.current_direction(), Heading::West);

        let msg: DeviceMessage = serde_json::from_str(
            r#"{"field_strength":2.0,"current_direction":"South","field_direction":[0.0,-1.0,0.0]}"#,
        )
        .unwrap();
        assert!(matches!(msg, DeviceMessage::Broadcast(_)));
        assert_eq!(msg.field_strength(), 2.0);
    }
}
