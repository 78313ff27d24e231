//! Device client: streams samples to a peer and obeys its commands.
//!
//! This module provides the client-role event loop that handles:
//! - Connection lifecycle with timed reconnect
//! - Time-gated sensor read, encode and transmit
//! - Inbound command dispatch (indicator, calibration, restart)

use std::time::Instant;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use magbridge_core::{
    ClientConfig, CommandAction, HardIronCalibrator, Indicator, Magnetometer, Sample, SendCadence,
};
use magbridge_protocol::{dispatch_frame, encode_sensor_data, CodecError};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why [`DeviceClient::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    /// The peer sent RESET; the connection was closed and the caller
    /// should restart the device.
    RestartRequested,
}

/// Errors that abort the client loop.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to encode sample: {0}")]
    Codec(#[from] CodecError),
}

/// How a single connected session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Disconnected,
    Restart,
}

type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The device side of the bridge.
pub struct DeviceClient<M, I> {
    config: ClientConfig,
    sensor: M,
    indicator: I,
    calibrator: HardIronCalibrator,
    cadence: SendCadence,
    state_tx: watch::Sender<ConnectionState>,
}

impl<M: Magnetometer, I: Indicator> DeviceClient<M, I> {
    /// Create a client. The sensor must already be initialized.
    pub fn new(config: ClientConfig, sensor: M, indicator: I) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            calibrator: HardIronCalibrator::new(config.calibration_samples),
            cadence: SendCadence::new(config.send_interval()),
            config,
            sensor,
            indicator,
            state_tx,
        }
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn calibrator(&self) -> &HardIronCalibrator {
        &self.calibrator
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    /// Run until a restart is requested.
    ///
    /// Connection failures, handshake timeouts and losses never end the
    /// loop; the client waits the reconnect interval and tries again.
    pub async fn run(&mut self) -> Result<ClientExit, ClientError> {
        let url = self.config.url();

        loop {
            self.set_state(ConnectionState::Connecting);
            debug!("Connecting to {}", url);

            let attempt = tokio::time::timeout(
                self.config.connect_timeout(),
                tokio_tungstenite::connect_async(url.as_str()),
            )
            .await;

            match attempt {
                Ok(Ok((ws_stream, _))) => {
                    self.set_state(ConnectionState::Connected);
                    info!("[WS] Connected to {}", url);

                    let end = self.run_session(ws_stream).await?;
                    self.set_state(ConnectionState::Disconnected);

                    if end == SessionEnd::Restart {
                        return Ok(ClientExit::RestartRequested);
                    }
                    info!("[WS] Disconnected");
                }
                Ok(Err(e)) => {
                    self.set_state(ConnectionState::Disconnected);
                    warn!("Connection to {} failed: {}", url, e);
                }
                Err(_) => {
                    self.set_state(ConnectionState::Disconnected);
                    warn!(
                        "Connection to {} timed out after {:?}",
                        url,
                        self.config.connect_timeout()
                    );
                }
            }

            tokio::time::sleep(self.config.reconnect_interval()).await;
        }
    }

    async fn run_session(&mut self, ws_stream: ClientStream) -> Result<SessionEnd, ClientError> {
        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        loop {
            let due = tokio::time::Instant::from_std(self.cadence.next_due(Instant::now()));

            tokio::select! {
                // Handle incoming frames from the peer
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if self.handle_frame(&text) == CommandAction::RequestRestart {
                                tokio::time::sleep(self.config.restart_delay()).await;
                                if let Err(e) = ws_tx.close().await {
                                    debug!("Close before restart failed: {}", e);
                                }
                                return Ok(SessionEnd::Restart);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if ws_tx.send(Message::Pong(data)).await.is_err() {
                                return Ok(SessionEnd::Disconnected);
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Peer closed connection");
                            return Ok(SessionEnd::Disconnected);
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            return Ok(SessionEnd::Disconnected);
                        }
                        None => return Ok(SessionEnd::Disconnected),
                        _ => {} // Ignore other message types
                    }
                }

                // Sample and transmit on cadence
                _ = tokio::time::sleep_until(due) => {
                    if !self.cadence.try_fire(Instant::now()) {
                        continue;
                    }
                    if let Some(frame) = self.next_frame()? {
                        if let Err(e) = ws_tx.send(Message::Text(frame)).await {
                            warn!("Failed to send sample: {}", e);
                            return Ok(SessionEnd::Disconnected);
                        }
                    }
                }
            }
        }
    }

    /// Read the sensor and encode one frame. A failed read skips the cycle.
    fn next_frame(&mut self) -> Result<Option<String>, ClientError> {
        let raw = match self.sensor.read() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Sensor read failed: {}", e);
                return Ok(None);
            }
        };

        if let Some(offset) = self.calibrator.observe(raw) {
            info!(
                "Calibration complete: offsets x={:.2} y={:.2} z={:.2} µT",
                offset.x, offset.y, offset.z
            );
        }

        let sample = Sample::from_reading(self.calibrator.apply(raw), self.config.heading_reference);
        let frame = encode_sensor_data(&sample)?;
        debug!("B={:.2} µT dir={}", sample.field_strength, sample.heading);
        Ok(Some(frame))
    }

    /// Dispatch one inbound frame and perform its local side effect.
    ///
    /// Restart is left to the caller; it needs the connection.
    fn handle_frame(&mut self, text: &str) -> CommandAction {
        let action = dispatch_frame(text);

        match action {
            CommandAction::Noop => {
                debug!("Ignoring frame: {}", text);
            }
            CommandAction::SetIndicator(on) => {
                info!("[CMD] {}", if on { "LED_ON" } else { "LED_OFF" });
                self.indicator.set(on);
            }
            CommandAction::RequestCalibration => {
                info!("[CMD] CALIBRATE");
                if self.calibrator.start() {
                    info!(
                        "Calibrating sensor: rotate the device, capturing {} readings",
                        self.config.calibration_samples
                    );
                } else {
                    info!("Calibrating sensor...");
                }
            }
            CommandAction::RequestRestart => {
                info!("[CMD] RESET");
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magbridge_core::{
        CalibrationStatus, Heading, MagReading, SensorError, SharedIndicator,
        SimulatedMagnetometer,
    };
    use magbridge_protocol::decode_device_message;

    /// Sensor returning a fixed reading.
    struct FixedSensor(MagReading);

    impl Magnetometer for FixedSensor {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn read(&mut self) -> Result<MagReading, SensorError> {
            Ok(self.0)
        }
    }

    fn client_with(reading: MagReading) -> DeviceClient<FixedSensor, SharedIndicator> {
        DeviceClient::new(
            ClientConfig::default(),
            FixedSensor(reading),
            SharedIndicator::new(),
        )
    }

    #[test]
    fn test_led_on_then_off() {
        let mut client = client_with(MagReading::new(0.0, 20.0, 0.0));
        let led = client.indicator().clone();

        client.handle_frame(r#"{"command":"LED_ON"}"#);
        assert!(led.is_on());
        client.handle_frame(r#"{"command":"LED_OFF"}"#);
        assert!(!led.is_on());
    }

    #[test]
    fn test_garbage_frames_change_nothing() {
        let mut client = client_with(MagReading::new(0.0, 20.0, 0.0));
        client.handle_frame(r#"{"command":"LED_ON"}"#);

        for frame in ["not json", "{}", r#"{"command":"FLASH"}"#, r#"{"command":7}"#] {
            assert_eq!(client.handle_frame(frame), CommandAction::Noop);
        }
        assert!(client.indicator().is_on());
        assert_eq!(client.calibrator().status(), CalibrationStatus::Idle);
    }

    #[test]
    fn test_reset_is_reported_not_performed() {
        let mut client = client_with(MagReading::new(0.0, 20.0, 0.0));
        assert_eq!(
            client.handle_frame(r#"{"command":"RESET"}"#),
            CommandAction::RequestRestart
        );
    }

    #[test]
    fn test_frame_shape() {
        let mut client = client_with(MagReading::new(20.0, 0.0, 0.0));
        let frame = client.next_frame().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(value["type"], "sensor_data");
        assert_eq!(value["field_strength"], 20.0);
        assert_eq!(value["current_direction"], "East");
        assert_eq!(value["field_direction"], serde_json::json!([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_calibrate_applies_offsets() {
        let config = ClientConfig {
            calibration_samples: 3,
            ..Default::default()
        };
        let mut client = DeviceClient::new(
            config,
            FixedSensor(MagReading::new(5.0, 25.0, 0.0)),
            SharedIndicator::new(),
        );

        client.handle_frame(r#"{"command":"CALIBRATE"}"#);
        assert!(matches!(
            client.calibrator().status(),
            CalibrationStatus::Capturing { collected: 0, target: 3 }
        ));

        for _ in 0..3 {
            client.next_frame().unwrap();
        }
        assert_eq!(client.calibrator().status(), CalibrationStatus::Idle);
        assert_eq!(client.calibrator().offset(), MagReading::new(5.0, 25.0, 0.0));

        // Every axis is now fully offset, leaving a zero field.
        let frame = client.next_frame().unwrap().unwrap();
        let msg = decode_device_message(&frame).unwrap();
        assert_eq!(msg.current_direction(), Heading::Unknown);
        assert_eq!(msg.field_strength(), 0.0);
    }

    #[test]
    fn test_sensor_error_skips_cycle() {
        let mut client = DeviceClient::new(
            ClientConfig::default(),
            SimulatedMagnetometer::default(), // never initialized
            SharedIndicator::new(),
        );
        assert!(client.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let client = client_with(MagReading::new(0.0, 20.0, 0.0));
        assert_eq!(*client.state().borrow(), ConnectionState::Disconnected);
    }
}
