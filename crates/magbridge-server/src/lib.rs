//! # magbridge-server
//!
//! Both bridge roles on an async runtime.
//!
//! - [`client::DeviceClient`] samples a magnetometer, streams frames to a
//!   peer and obeys its commands.
//! - [`server::BroadcastServer`] accepts clients and broadcasts synthetic
//!   samples to all of them.
//!
//! Enable features based on target platform:
//! - `tokio-runtime` (default) - For Linux/desktop

pub use magbridge_core::{BridgeConfig, ClientConfig, Sample, ServerConfig};

#[cfg(feature = "tokio-runtime")]
pub mod client;
#[cfg(feature = "tokio-runtime")]
pub mod network;
#[cfg(feature = "tokio-runtime")]
pub mod server;
#[cfg(feature = "tokio-runtime")]
pub mod startup;

#[cfg(feature = "tokio-runtime")]
pub use client::{ClientError, ClientExit, ConnectionState, DeviceClient};
#[cfg(feature = "tokio-runtime")]
pub use network::{join_network, JoinInfo, NetworkError};
#[cfg(feature = "tokio-runtime")]
pub use server::{BroadcastServer, ServerError, SyntheticSource};
#[cfg(feature = "tokio-runtime")]
pub use startup::{init_sensor, join_with_retry, retry};
