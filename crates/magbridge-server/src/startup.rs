//! Startup preconditions with caller-chosen retry.
//!
//! Sensor detection and network join must succeed before the client loop
//! starts. Each step is attempted under a [`RetryPolicy`]; when the policy
//! is exhausted the last error is returned to the caller.

use std::fmt::Display;
use std::future::Future;

use tracing::{info, warn};

use magbridge_core::{ClientConfig, Magnetometer, NetworkConfig, RetryPolicy, SensorError};

use crate::network::{join_network, JoinInfo, NetworkError};

/// Run `op` until it succeeds or `policy` runs out of attempts.
pub async fn retry<T, E, F, Fut>(what: &str, policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded after {} attempts", what, attempt);
                }
                return Ok(value);
            }
            Err(e) if policy.allows_retry_after(attempt) => {
                warn!("{} failed (attempt {}): {}", what, attempt, e);
                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{} failed (attempt {}), giving up: {}", what, attempt, e);
                return Err(e);
            }
        }
    }
}

/// Probe the magnetometer until it answers.
pub async fn init_sensor<M: Magnetometer>(
    sensor: &mut M,
    policy: &RetryPolicy,
) -> Result<(), SensorError> {
    retry("Sensor init", policy, || std::future::ready(sensor.init())).await?;
    info!("Magnetometer ready");
    Ok(())
}

/// Join the network until an address is acquired.
pub async fn join_with_retry(
    network: &NetworkConfig,
    client: &ClientConfig,
    policy: &RetryPolicy,
) -> Result<JoinInfo, NetworkError> {
    retry("Network join", policy, move || join_network(network, client)).await
}
