//! Broadcast server implementation.
//!
//! This module provides the server-role WebSocket endpoint that handles:
//! - Client connections on a single path
//! - Synthetic sample generation
//! - Frame broadcasting to every connected client

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use magbridge_core::{HeadingReference, MagReading, Sample, ServerConfig};
use magbridge_protocol::encode_broadcast;

/// Frames buffered per client before it starts skipping.
const FRAME_BUFFER: usize = 1024;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Placeholder sample generator for the server role.
///
/// Field strength swings between 25 and 65 µT while the direction stays
/// fixed along normalize(0.2, 1, 0).
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    tick: u64,
}

impl SyntheticSource {
    const MEAN_UT: f32 = 45.0;
    const SWING_UT: f32 = 20.0;
    const PHASE_STEP: f32 = 0.05;
    const DIRECTION: [f32; 3] = [0.2, 1.0, 0.0];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sample(&mut self) -> Sample {
        let phase = (self.tick % 1_000_000) as f32 * Self::PHASE_STEP;
        self.tick = self.tick.wrapping_add(1);

        let strength = Self::MEAN_UT + Self::SWING_UT * phase.sin();
        let [dx, dy, dz] = MagReading::new(Self::DIRECTION[0], Self::DIRECTION[1], Self::DIRECTION[2])
            .unit_vector();

        Sample::from_reading(
            MagReading::new(dx * strength, dy * strength, dz * strength),
            HeadingReference::Compass,
        )
    }
}

/// The server-role WebSocket endpoint.
pub struct BroadcastServer {
    config: ServerConfig,
    /// Channel for broadcasting frames to all connection handlers.
    frame_tx: broadcast::Sender<String>,
    /// Wakes the producer when the first client arrives.
    client_joined: Arc<Notify>,
}

impl BroadcastServer {
    /// Create a new broadcast server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let (frame_tx, _) = broadcast::channel(FRAME_BUFFER);
        Self {
            config,
            frame_tx,
            client_joined: Arc::new(Notify::new()),
        }
    }

    /// Run the server, listening for WebSocket connections.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(
            "Broadcast server listening on ws://{}{}",
            listener.local_addr()?,
            self.config.path
        );

        // Spawn the frame producer
        let frame_tx = self.frame_tx.clone();
        let client_joined = self.client_joined.clone();
        let interval = self.config.broadcast_interval();
        tokio::spawn(async move {
            produce_frames(frame_tx, client_joined, interval).await;
        });

        // Accept connections
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let path = self.config.path.clone();
                    let frame_rx = self.frame_tx.subscribe();
                    self.client_joined.notify_one();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, path, frame_rx).await {
                            error!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Synthesize and broadcast one frame per iteration.
async fn produce_frames(
    frame_tx: broadcast::Sender<String>,
    client_joined: Arc<Notify>,
    interval: Option<std::time::Duration>,
) {
    let mut source = SyntheticSource::new();

    loop {
        if frame_tx.receiver_count() == 0 {
            client_joined.notified().await;
            continue;
        }

        let sample = source.next_sample();
        match encode_broadcast(&sample) {
            Ok(frame) => {
                // No receivers left is fine; the next loop parks.
                let _ = frame_tx.send(frame);
            }
            Err(e) => error!("Failed to encode broadcast: {}", e),
        }

        match interval {
            Some(period) => tokio::time::sleep(period).await,
            None => tokio::task::yield_now().await,
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    path: String,
    mut frame_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    debug!("New connection from {}", addr);

    // Refuse any path other than the configured one
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, move |req: &Request, resp: Response| {
        if req.uri().path() == path {
            return Ok(resp);
        }
        warn!("Refusing {} on path {}", addr, req.uri().path());
        let mut refusal = ErrorResponse::new(Some("Not Found".to_string()));
        *refusal.status_mut() = StatusCode::NOT_FOUND;
        Err(refusal)
    })
    .await?;

    info!("Client {} connected", addr);
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Ignoring frame from {}: {}", addr, text);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} closed connection", addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_tx.send(Message::Pong(data)).await?;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    _ => {} // Ignore other message types
                }
            }

            // Forward broadcast frames
            frame = frame_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if let Err(e) = ws_tx.send(Message::Text(frame)).await {
                            debug!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Client {} skipped {} frames", addr, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use magbridge_core::Heading;

    #[test]
    fn test_synthetic_strength_range() {
        let mut source = SyntheticSource::new();
        for _ in 0..500 {
            let sample = source.next_sample();
            assert!(sample.field_strength >= 24.99 && sample.field_strength <= 65.01);
        }
    }

    #[test]
    fn test_synthetic_direction_is_fixed() {
        let mut source = SyntheticSource::new();
        let expected = MagReading::new(0.2, 1.0, 0.0).unit_vector();
        for _ in 0..10 {
            let sample = source.next_sample();
            for (got, want) in sample.direction_vector.iter().zip(expected.iter()) {
                assert!((got - want).abs() < 1e-5);
            }
            assert_eq!(sample.heading, Heading::North);
        }
    }
}
